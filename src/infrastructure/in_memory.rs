use crate::domain::offer::{Offer, OfferId};
use crate::domain::order::{Order, OrderId};
use crate::domain::ports::{MetricsSink, OfferStore, OrderStore, TransactionLedger};
use crate::domain::transaction::Transaction;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::RwLock;
use tracing::debug;

/// A thread-safe in-memory store for orders.
///
/// Uses `Arc<RwLock<HashMap<OrderId, Order>>>` to allow shared concurrent access.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn store(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id.clone(), order);
        Ok(())
    }

    async fn get(&self, order_id: &OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(order_id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut all: Vec<Order> = orders.values().cloned().collect();
        all.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(all)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryOfferStore {
    offers: Arc<RwLock<HashMap<OfferId, Offer>>>,
}

impl InMemoryOfferStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OfferStore for InMemoryOfferStore {
    async fn store(&self, offer: Offer) -> Result<()> {
        let mut offers = self.offers.write().await;
        offers.insert(offer.id.clone(), offer);
        Ok(())
    }

    async fn get(&self, offer_id: &OfferId) -> Result<Option<Offer>> {
        let offers = self.offers.read().await;
        Ok(offers.get(offer_id).cloned())
    }

    async fn for_order(&self, order_id: &OrderId) -> Result<Vec<Offer>> {
        let offers = self.offers.read().await;
        Ok(offers
            .values()
            .filter(|offer| &offer.order_id == order_id)
            .cloned()
            .collect())
    }
}

/// Append-only ledger. Entries are never replaced or removed.
#[derive(Default, Clone)]
pub struct InMemoryTransactionLedger {
    entries: Arc<RwLock<HashMap<OrderId, Vec<Transaction>>>>,
}

impl InMemoryTransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionLedger for InMemoryTransactionLedger {
    async fn append(&self, order_id: &OrderId, transaction: Transaction) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.entry(order_id.clone()).or_default().push(transaction);
        Ok(())
    }

    async fn for_order(&self, order_id: &OrderId) -> Result<Vec<Transaction>> {
        let entries = self.entries.read().await;
        Ok(entries.get(order_id).cloned().unwrap_or_default())
    }
}

/// Counters kept in memory, also traced at debug level.
#[derive(Default, Clone)]
pub struct InMemoryMetrics {
    counters: Arc<Mutex<HashMap<String, i64>>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, name: &str) -> i64 {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        counters.get(name).copied().unwrap_or(0)
    }
}

impl MetricsSink for InMemoryMetrics {
    fn increment(&self, name: &str) {
        self.count(name, 1);
    }

    fn count(&self, name: &str, value: i64) {
        debug!(metric = name, value, "metric");
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        *counters.entry(name.to_string()).or_insert(0) += value;
    }
}
