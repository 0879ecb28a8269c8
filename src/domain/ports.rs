use super::gateway::{Charge, GatewayResult, PaymentIntent, PaymentIntentRequest, Refund};
use super::offer::{Offer, OfferId};
use super::order::{Order, OrderId, OrderState};
use super::transaction::Transaction;
use crate::error::{CredentialDefect, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn store(&self, order: Order) -> Result<()>;
    async fn get(&self, order_id: &OrderId) -> Result<Option<Order>>;
    async fn get_all(&self) -> Result<Vec<Order>>;
}

#[async_trait]
pub trait OfferStore: Send + Sync {
    async fn store(&self, offer: Offer) -> Result<()>;
    async fn get(&self, offer_id: &OfferId) -> Result<Option<Offer>>;
    async fn for_order(&self, order_id: &OrderId) -> Result<Vec<Offer>>;
}

/// Append-only record of gateway outcomes per order.
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    async fn append(&self, order_id: &OrderId, transaction: Transaction) -> Result<()>;
    async fn for_order(&self, order_id: &OrderId) -> Result<Vec<Transaction>>;
}

/// Raw payment processor API.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    async fn create_payment_intent(&self, request: PaymentIntentRequest)
    -> GatewayResult<PaymentIntent>;
    async fn retrieve_payment_intent(&self, id: &str) -> GatewayResult<PaymentIntent>;
    async fn capture_payment_intent(&self, id: &str) -> GatewayResult<PaymentIntent>;
    async fn retrieve_charge(&self, id: &str) -> GatewayResult<Charge>;
    async fn capture_charge(&self, id: &str) -> GatewayResult<Charge>;
    async fn create_refund(&self, charge_id: &str, reverse_transfer: bool)
    -> GatewayResult<Refund>;
}

/// Background work handed to the task queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    OrderFollowUp {
        order_id: OrderId,
        state: OrderState,
    },
    ReminderFollowUp {
        order_id: OrderId,
        state: OrderState,
    },
    OfferRespondReminder {
        order_id: OrderId,
        offer_id: OfferId,
    },
    PostOfferNotification {
        offer_id: OfferId,
        actor_id: String,
    },
    PostOrderNotification {
        order_id: OrderId,
        state: OrderState,
        actor_id: String,
    },
    RecordSalesTax {
        line_item_id: String,
    },
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::OrderFollowUp { .. } => "order_follow_up",
            Job::ReminderFollowUp { .. } => "reminder_follow_up",
            Job::OfferRespondReminder { .. } => "offer_respond_reminder",
            Job::PostOfferNotification { .. } => "post_offer_notification",
            Job::PostOrderNotification { .. } => "post_order_notification",
            Job::RecordSalesTax { .. } => "record_sales_tax",
        }
    }
}

/// Fire-and-forget task queue. Delivery is at-least-once; failures are not
/// reported back to the caller.
pub trait TaskDispatcher: Send + Sync {
    fn enqueue(&self, job: Job);
    fn schedule_at(&self, at: DateTime<Utc>, job: Job);
}

pub trait MetricsSink: Send + Sync {
    fn increment(&self, name: &str);
    fn count(&self, name: &str, value: i64);
}

#[async_trait]
pub trait InventoryCheck: Send + Sync {
    async fn has_inventory(&self, order: &Order) -> bool;
}

/// Order-level checks required before an order can be committed.
#[async_trait]
pub trait CommitReadiness: Send + Sync {
    async fn can_commit(&self, order: &Order) -> bool;
    async fn valid_artwork_version(&self, order: &Order) -> bool;
    async fn credit_card_defect(&self, order: &Order) -> Option<CredentialDefect>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type OrderStoreRef = Arc<dyn OrderStore>;
pub type OfferStoreRef = Arc<dyn OfferStore>;
pub type TransactionLedgerRef = Arc<dyn TransactionLedger>;
pub type GatewayClientRef = Arc<dyn GatewayClient>;
pub type TaskDispatcherRef = Arc<dyn TaskDispatcher>;
pub type MetricsSinkRef = Arc<dyn MetricsSink>;
pub type InventoryCheckRef = Arc<dyn InventoryCheck>;
pub type CommitReadinessRef = Arc<dyn CommitReadiness>;
pub type ClockRef = Arc<dyn Clock>;
