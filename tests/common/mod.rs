#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use exchange::application::approval::OrderApprovalService;
use exchange::application::offers::OfferService;
use exchange::application::payment::PaymentService;
use exchange::application::{Collaborators, OrderLocks};
use exchange::config::Settings;
use exchange::domain::offer::{Actor, Offer};
use exchange::domain::order::{LineItem, Order, OrderId, OrderMode};
use exchange::domain::ports::{OfferStore, OrderStore, TransactionLedgerRef};
use exchange::infrastructure::checks::{FixedClock, StaticOrderChecks};
use exchange::infrastructure::dispatch::{ChannelDispatcher, Dispatch, drain};
use exchange::infrastructure::in_memory::{
    InMemoryMetrics, InMemoryOfferStore, InMemoryOrderStore, InMemoryTransactionLedger,
};
use exchange::infrastructure::simulated_gateway::SimulatedGateway;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

pub const CHARGE_ID: &str = "ch_test";

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

/// Services wired to in-memory infrastructure, with handles for inspection.
pub struct Harness {
    pub settings: Settings,
    pub orders: InMemoryOrderStore,
    pub offer_store: InMemoryOfferStore,
    pub ledger: InMemoryTransactionLedger,
    pub metrics: InMemoryMetrics,
    pub checks: Arc<StaticOrderChecks>,
    pub clock: Arc<FixedClock>,
    pub gateway: SimulatedGateway,
    pub offers: Arc<OfferService>,
    pub approvals: Arc<OrderApprovalService>,
    pub payments: PaymentService,
    jobs: UnboundedReceiver<Dispatch>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Same wiring, but services record transactions into `ledger`.
    pub fn with_ledger(ledger: TransactionLedgerRef) -> Self {
        Self::build(Some(ledger))
    }

    fn build(ledger_override: Option<TransactionLedgerRef>) -> Self {
        let settings = Settings::default();
        let orders = InMemoryOrderStore::new();
        let offer_store = InMemoryOfferStore::new();
        let ledger = InMemoryTransactionLedger::new();
        let metrics = InMemoryMetrics::new();
        let checks = Arc::new(StaticOrderChecks::new());
        let clock = Arc::new(FixedClock::new(start_time()));
        let gateway = SimulatedGateway::new();
        let (dispatcher, jobs) = ChannelDispatcher::new();

        let collaborators = Collaborators {
            orders: Arc::new(orders.clone()),
            offers: Arc::new(offer_store.clone()),
            ledger: ledger_override.unwrap_or_else(|| Arc::new(ledger.clone())),
            dispatcher: Arc::new(dispatcher),
            metrics: Arc::new(metrics.clone()),
            inventory: checks.clone(),
            readiness: checks.clone(),
            clock: clock.clone(),
        };
        let locks = Arc::new(OrderLocks::new());
        let payments = PaymentService::new(Arc::new(gateway.clone()));

        let offers = Arc::new(OfferService::new(
            collaborators.clone(),
            locks.clone(),
            settings.calculator(),
            settings.expirations().unwrap(),
        ));
        let approvals = Arc::new(OrderApprovalService::new(
            collaborators,
            locks,
            payments.clone(),
            settings.expirations().unwrap(),
        ));

        Self {
            settings,
            orders,
            offer_store,
            ledger,
            metrics,
            checks,
            clock,
            gateway,
            offers,
            approvals,
            payments,
            jobs,
        }
    }

    /// Stores a pending offer-mode order with one line item and an authorized charge.
    pub async fn offer_order(&self, id: &str) -> Order {
        let mut order = Order::new(OrderId::new(id), OrderMode::Offer);
        order.shipping_quote_cents = 2000;
        order.tax_rate_basis_points = 625;
        order.external_charge_id = Some(CHARGE_ID.to_string());
        order.line_items.push(LineItem {
            id: format!("li_{id}"),
            artwork_id: "artwork1".to_string(),
            artwork_version_id: "v1".to_string(),
            quantity: 1,
            list_price_cents: 12000,
        });
        self.gateway
            .authorize_charge(CHARGE_ID, 12625, "pm_buyer", "acct_seller")
            .await;
        self.orders.store(order.clone()).await.unwrap();
        order
    }

    pub async fn order(&self, id: &str) -> Order {
        self.orders.get(&OrderId::new(id)).await.unwrap().unwrap()
    }

    pub async fn reload(&self, offer: &Offer) -> Offer {
        self.offer_store.get(&offer.id).await.unwrap().unwrap()
    }

    /// Creates a buyer offer and submits the order with it.
    pub async fn submitted_order(&self, id: &str, amount_cents: i64) -> (Order, Offer) {
        let order = self.offer_order(id).await;
        let offer = self
            .offers
            .create_pending_offer(&order, amount_cents, Actor::buyer("buyer1"), "buyer1", None)
            .await
            .unwrap();
        let order = self
            .offers
            .submit_order_with_offer(&offer, "buyer1")
            .await
            .unwrap();
        (order, self.reload(&offer).await)
    }

    pub fn jobs(&mut self) -> Vec<Dispatch> {
        drain(&mut self.jobs)
    }
}
