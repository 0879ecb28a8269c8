//! Application layer orchestrating offers, approval and payment capture.
//!
//! Services are stateless apart from their injected collaborators and share a
//! single [`OrderLocks`] so that every order mutation is serialized per order.

pub mod approval;
pub mod locks;
pub mod offers;
pub mod payment;

pub use locks::OrderLocks;

use crate::domain::offer::{Offer, OfferId};
use crate::domain::order::{Order, OrderId};
use crate::domain::ports::{
    ClockRef, CommitReadinessRef, InventoryCheckRef, MetricsSinkRef, OfferStoreRef,
    OrderStoreRef, TaskDispatcherRef, TransactionLedgerRef,
};
use crate::error::{ExchangeError, Result};

/// External collaborators shared by the services.
#[derive(Clone)]
pub struct Collaborators {
    pub orders: OrderStoreRef,
    pub offers: OfferStoreRef,
    pub ledger: TransactionLedgerRef,
    pub dispatcher: TaskDispatcherRef,
    pub metrics: MetricsSinkRef,
    pub inventory: InventoryCheckRef,
    pub readiness: CommitReadinessRef,
    pub clock: ClockRef,
}

impl Collaborators {
    pub(crate) async fn load_order(&self, order_id: &OrderId) -> Result<Order> {
        self.orders
            .get(order_id)
            .await?
            .ok_or_else(|| ExchangeError::OrderNotFound(order_id.clone()))
    }

    pub(crate) async fn load_offer(&self, offer_id: &OfferId) -> Result<Offer> {
        self.offers
            .get(offer_id)
            .await?
            .ok_or_else(|| ExchangeError::OfferNotFound(offer_id.clone()))
    }
}
