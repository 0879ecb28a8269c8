use crate::domain::order::OrderId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockTable = Mutex<HashMap<OrderId, Arc<AsyncMutex<()>>>>;

/// Per-order mutual exclusion for read-modify-write on an order.
///
/// Guards are released on drop, so every exit path (including `?`) unlocks.
/// Orders never contend with each other. An order's entry lives only while
/// someone holds or waits for its lock.
#[derive(Default)]
pub struct OrderLocks {
    table: Arc<LockTable>,
}

/// Exclusive access to one order until dropped.
pub struct OrderGuard {
    table: Arc<LockTable>,
    order_id: OrderId,
    guard: OwnedMutexGuard<()>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, order_id: &OrderId) -> OrderGuard {
        let lock = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            table.entry(order_id.clone()).or_default().clone()
        };
        OrderGuard {
            table: self.table.clone(),
            order_id: order_id.clone(),
            guard: lock.lock_owned().await,
        }
    }

    /// Number of orders currently locked or awaited.
    pub fn tracked(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Drop for OrderGuard {
    fn drop(&mut self) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the table and this guard hold the mutex: nobody is waiting.
        if Arc::strong_count(OwnedMutexGuard::mutex(&self.guard)) == 2 {
            table.remove(&self.order_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_order_is_exclusive() {
        let locks = Arc::new(OrderLocks::new());
        let order_id = OrderId::new("o1");

        let guard = locks.lock(&order_id).await;
        let contender = {
            let locks = locks.clone();
            let order_id = order_id.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(&order_id).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_orders_do_not_contend() {
        let locks = OrderLocks::new();
        let _first = locks.lock(&OrderId::new("o1")).await;
        let second = tokio::time::timeout(
            Duration::from_millis(100),
            locks.lock(&OrderId::new("o2")),
        )
        .await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_released_locks_are_evicted() {
        let locks = Arc::new(OrderLocks::new());
        for id in ["o1", "o2", "o3"] {
            let _guard = locks.lock(&OrderId::new(id)).await;
            assert_eq!(locks.tracked(), 1);
        }
        assert_eq!(locks.tracked(), 0);

        let order_id = OrderId::new("o1");
        let guard = locks.lock(&order_id).await;
        let contender = {
            let locks = locks.clone();
            let order_id = order_id.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(&order_id).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The waiter keeps the entry alive past the first release.
        drop(guard);
        contender.await.unwrap();
        assert_eq!(locks.tracked(), 0);
    }
}
