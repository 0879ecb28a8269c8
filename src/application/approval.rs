use super::locks::OrderLocks;
use super::payment::PaymentService;
use super::Collaborators;
use crate::config::Expirations;
use crate::domain::order::{Order, OrderId, OrderState};
use crate::domain::ports::Job;
use crate::error::{ExchangeError, ProcessingCode, Result, ValidationCode};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Approves submitted orders by capturing their authorized charge.
pub struct OrderApprovalService {
    collaborators: Collaborators,
    locks: Arc<OrderLocks>,
    payments: PaymentService,
    expirations: Expirations,
}

impl OrderApprovalService {
    pub fn new(
        collaborators: Collaborators,
        locks: Arc<OrderLocks>,
        payments: PaymentService,
        expirations: Expirations,
    ) -> Self {
        Self {
            collaborators,
            locks,
            payments,
            expirations,
        }
    }

    /// Captures payment and moves the order to `approved`.
    ///
    /// The capture transaction is appended to the ledger whether or not the
    /// capture succeeded. A failed capture leaves the order in its prior state
    /// and is reported as `capture_failed` even if the ledger write also fails.
    pub async fn approve(&self, order_id: &OrderId, actor_id: &str) -> Result<Order> {
        let order = {
            let _guard = self.locks.lock(order_id).await;
            let mut order = self.collaborators.load_order(order_id).await?;
            if !order.state.can_transition_to(OrderState::Approved) {
                return Err(ExchangeError::validation(ValidationCode::InvalidState));
            }
            let charge_id = order
                .external_charge_id
                .clone()
                .ok_or_else(|| ExchangeError::validation(ValidationCode::MissingChargeId))?;

            let transaction = self.payments.capture_authorized_charge(&charge_id).await?;
            let failure = transaction.failed().then(|| transaction.failure_data());
            let recorded = self.collaborators.ledger.append(order_id, transaction).await;

            if let Some(failure) = failure {
                if let Err(err) = &recorded {
                    error!(%order_id, %err, "failed to record declined capture");
                }
                warn!(%order_id, ?failure, "capture failed, order not approved");
                return Err(ExchangeError::Processing {
                    code: ProcessingCode::CaptureFailed,
                    failure,
                });
            }

            recorded?;

            let expires_at = self.collaborators.clock.now() + self.expirations.approved;
            if !order.transition_to(OrderState::Approved, expires_at) {
                return Err(ExchangeError::validation(ValidationCode::InvalidState));
            }
            self.collaborators.orders.store(order.clone()).await?;
            info!(%order_id, "order approved");
            order
        };

        self.post_process(&order, actor_id);
        Ok(order)
    }

    fn post_process(&self, order: &Order, actor_id: &str) {
        self.record_stats(order);

        let dispatcher = &self.collaborators.dispatcher;
        for line_item in &order.line_items {
            dispatcher.enqueue(Job::RecordSalesTax {
                line_item_id: line_item.id.clone(),
            });
        }
        dispatcher.enqueue(Job::PostOrderNotification {
            order_id: order.id.clone(),
            state: OrderState::Approved,
            actor_id: actor_id.to_string(),
        });
        if let Some(expires_at) = order.state_expires_at {
            dispatcher.schedule_at(
                expires_at,
                Job::OrderFollowUp {
                    order_id: order.id.clone(),
                    state: order.state,
                },
            );
            dispatcher.schedule_at(
                expires_at - self.expirations.reminder_lead,
                Job::ReminderFollowUp {
                    order_id: order.id.clone(),
                    state: order.state,
                },
            );
        }
    }

    fn record_stats(&self, order: &Order) {
        let metrics = &self.collaborators.metrics;
        metrics.increment("order.approve");
        if let Some(totals) = &order.totals {
            metrics.count("order.money_collected", totals.buyer_total_cents);
            metrics.count("order.commission_collected", totals.commission_fee_cents);
        }
    }
}
