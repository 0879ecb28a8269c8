use crate::domain::ports::{Job, TaskDispatcher};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, warn};

/// A job handed to the queue, with its earliest run time if scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub run_at: Option<DateTime<Utc>>,
    pub job: Job,
}

/// Task dispatcher backed by an unbounded tokio channel.
///
/// Sending never blocks. If the consumer has gone away the job is dropped
/// with a warning; callers are not told.
#[derive(Clone)]
pub struct ChannelDispatcher {
    sender: UnboundedSender<Dispatch>,
}

impl ChannelDispatcher {
    pub fn new() -> (Self, UnboundedReceiver<Dispatch>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }

    fn send(&self, dispatch: Dispatch) {
        debug!(job = dispatch.job.name(), run_at = ?dispatch.run_at, "dispatching job");
        if let Err(err) = self.sender.send(dispatch) {
            warn!(job = err.0.job.name(), "task queue closed, job dropped");
        }
    }
}

impl TaskDispatcher for ChannelDispatcher {
    fn enqueue(&self, job: Job) {
        self.send(Dispatch { run_at: None, job });
    }

    fn schedule_at(&self, at: DateTime<Utc>, job: Job) {
        self.send(Dispatch {
            run_at: Some(at),
            job,
        });
    }
}

/// Drains everything currently queued without waiting.
pub fn drain(receiver: &mut UnboundedReceiver<Dispatch>) -> Vec<Dispatch> {
    let mut dispatched = Vec::new();
    while let Ok(dispatch) = receiver.try_recv() {
        dispatched.push(dispatch);
    }
    dispatched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::offer::OfferId;

    #[test]
    fn test_enqueue_and_schedule() {
        let (dispatcher, mut receiver) = ChannelDispatcher::new();
        let at = Utc::now();
        let job = Job::RecordSalesTax {
            line_item_id: "li1".to_string(),
        };

        dispatcher.enqueue(job.clone());
        dispatcher.schedule_at(
            at,
            Job::PostOfferNotification {
                offer_id: OfferId("of1".to_string()),
                actor_id: "u1".to_string(),
            },
        );

        let dispatched = drain(&mut receiver);
        assert_eq!(dispatched.len(), 2);
        assert_eq!(dispatched[0], Dispatch { run_at: None, job });
        assert_eq!(dispatched[1].run_at, Some(at));
    }

    #[test]
    fn test_closed_queue_does_not_panic() {
        let (dispatcher, receiver) = ChannelDispatcher::new();
        drop(receiver);
        dispatcher.enqueue(Job::RecordSalesTax {
            line_item_id: "li1".to_string(),
        });
    }
}
