//! Replays scenario commands against in-process infrastructure.

use crate::application::approval::OrderApprovalService;
use crate::application::offers::OfferService;
use crate::application::payment::PaymentService;
use crate::application::{Collaborators, OrderLocks};
use crate::config::Settings;
use crate::domain::gateway::GatewayError;
use crate::domain::offer::{Actor, Offer, OfferId, Side};
use crate::domain::order::{LineItem, Order, OrderId, OrderMode};
use crate::error::{ExchangeError, Result};
use crate::infrastructure::checks::{StaticOrderChecks, SystemClock};
use crate::infrastructure::dispatch::{ChannelDispatcher, Dispatch};
use crate::infrastructure::in_memory::{
    InMemoryMetrics, InMemoryOfferStore, InMemoryOrderStore, InMemoryTransactionLedger,
};
use crate::infrastructure::simulated_gateway::SimulatedGateway;
use crate::interfaces::csv::command_reader::{Command, CommandKind};
use crate::interfaces::csv::order_writer::OrderRow;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

pub struct Scenario {
    settings: Settings,
    collaborators: Collaborators,
    gateway: SimulatedGateway,
    offers: OfferService,
    approvals: OrderApprovalService,
    offer_ids: HashMap<String, OfferId>,
    offer_names: HashMap<OfferId, String>,
}

impl Scenario {
    /// Builds a scenario and the receiving end of its task queue.
    pub fn new(settings: Settings) -> Result<(Self, UnboundedReceiver<Dispatch>)> {
        let expirations = settings.expirations()?;
        let (dispatcher, jobs) = ChannelDispatcher::new();
        let checks = Arc::new(StaticOrderChecks::new());
        let gateway = SimulatedGateway::new();
        let collaborators = Collaborators {
            orders: Arc::new(InMemoryOrderStore::new()),
            offers: Arc::new(InMemoryOfferStore::new()),
            ledger: Arc::new(InMemoryTransactionLedger::new()),
            dispatcher: Arc::new(dispatcher),
            metrics: Arc::new(InMemoryMetrics::new()),
            inventory: checks.clone(),
            readiness: checks,
            clock: Arc::new(SystemClock),
        };
        let locks = Arc::new(OrderLocks::new());

        let offers = OfferService::new(
            collaborators.clone(),
            locks.clone(),
            settings.calculator(),
            expirations,
        );
        let approvals = OrderApprovalService::new(
            collaborators.clone(),
            locks,
            PaymentService::new(Arc::new(gateway.clone())),
            expirations,
        );

        let scenario = Self {
            settings,
            collaborators,
            gateway,
            offers,
            approvals,
            offer_ids: HashMap::new(),
            offer_names: HashMap::new(),
        };
        Ok((scenario, jobs))
    }

    pub async fn apply(&mut self, command: Command) -> Result<()> {
        let order_id = OrderId::new(command.order.clone());
        match command.command {
            CommandKind::Order => self.open_order(order_id, &command).await,
            CommandKind::Decline => {
                let order = self.collaborators.load_order(&order_id).await?;
                let charge_id = order.external_charge_id.ok_or_else(|| {
                    ExchangeError::InvalidCommand(format!("order {order_id} has no charge"))
                })?;
                self.gateway
                    .decline_charge(
                        &charge_id,
                        GatewayError {
                            code: Some("card_declined".to_string()),
                            message: Some("Your card was declined.".to_string()),
                            decline_code: Some("generic_decline".to_string()),
                            charge: None,
                        },
                    )
                    .await;
                Ok(())
            }
            CommandKind::Offer => {
                let order = self.collaborators.load_order(&order_id).await?;
                let name = required(command.offer.as_deref(), "offer")?;
                let actor = command_actor(&command)?;
                let creator_id = actor.id.clone();
                let offer = self
                    .offers
                    .create_pending_offer(
                        &order,
                        required(command.amount, "amount")?,
                        actor,
                        &creator_id,
                        None,
                    )
                    .await?;
                self.name_offer(name, offer.id);
                Ok(())
            }
            CommandKind::Counter => {
                let name = required(command.offer.as_deref(), "offer")?;
                let responds_to = self
                    .load_named_offer(required(command.responds_to.as_deref(), "responds_to")?)
                    .await?;
                let actor = command_actor(&command)?;
                let creator_id = actor.id.clone();
                let offer = self
                    .offers
                    .create_pending_counter_offer(
                        &responds_to,
                        required(command.amount, "amount")?,
                        actor,
                        &creator_id,
                    )
                    .await?;
                self.name_offer(name, offer.id);
                Ok(())
            }
            CommandKind::SubmitOffer => {
                let offer = self
                    .load_named_offer(required(command.offer.as_deref(), "offer")?)
                    .await?;
                self.offers.submit_pending_offer(&offer).await?;
                Ok(())
            }
            CommandKind::SubmitOrder => {
                let offer = self
                    .load_named_offer(required(command.offer.as_deref(), "offer")?)
                    .await?;
                let actor_id = required(command.actor.as_deref(), "actor")?;
                self.offers.submit_order_with_offer(&offer, actor_id).await?;
                Ok(())
            }
            CommandKind::Approve => {
                let actor_id = required(command.actor.as_deref(), "actor")?;
                self.approvals.approve(&order_id, actor_id).await?;
                Ok(())
            }
        }
    }

    /// Summary rows for every order, sorted by order id.
    pub async fn rows(&self) -> Result<Vec<OrderRow>> {
        let mut rows = Vec::new();
        for order in self.collaborators.orders.get_all().await? {
            let last_offer = order
                .last_offer_id
                .as_ref()
                .map(|id| self.offer_names.get(id).cloned().unwrap_or_else(|| id.0.clone()));
            let transactions = self.collaborators.ledger.for_order(&order.id).await?.len();
            rows.push(OrderRow::new(&order, last_offer, transactions));
        }
        Ok(rows)
    }

    async fn open_order(&self, order_id: OrderId, command: &Command) -> Result<()> {
        if self.collaborators.orders.get(&order_id).await?.is_some() {
            return Err(ExchangeError::InvalidCommand(format!(
                "order {order_id} already exists"
            )));
        }
        let list_price_cents = required(command.amount, "amount")?;
        let buyer_id = required(command.actor.as_deref(), "actor")?;
        let charge_id = format!("ch_{order_id}");

        let mut order = Order::new(order_id.clone(), OrderMode::Offer);
        order.shipping_quote_cents = self.settings.shipping_cents;
        order.tax_rate_basis_points = self.settings.tax_rate_bps;
        order.external_charge_id = Some(charge_id.clone());
        order.line_items.push(LineItem {
            id: format!("li_{order_id}"),
            artwork_id: format!("artwork_{order_id}"),
            artwork_version_id: "v1".to_string(),
            quantity: 1,
            list_price_cents,
        });

        self.gateway
            .authorize_charge(
                &charge_id,
                list_price_cents,
                &format!("pm_{buyer_id}"),
                &format!("acct_{order_id}"),
            )
            .await;
        self.collaborators.orders.store(order).await
    }

    fn name_offer(&mut self, name: &str, offer_id: OfferId) {
        self.offer_names.insert(offer_id.clone(), name.to_string());
        self.offer_ids.insert(name.to_string(), offer_id);
    }

    async fn load_named_offer(&self, name: &str) -> Result<Offer> {
        let offer_id = self
            .offer_ids
            .get(name)
            .ok_or_else(|| ExchangeError::InvalidCommand(format!("unknown offer {name}")))?;
        self.collaborators.load_offer(offer_id).await
    }
}

fn required<T>(value: Option<T>, column: &str) -> Result<T> {
    value.ok_or_else(|| ExchangeError::InvalidCommand(format!("missing {column}")))
}

fn command_actor(command: &Command) -> Result<Actor> {
    Ok(Actor {
        id: required(command.actor.clone(), "actor")?,
        side: command.side.unwrap_or(Side::Buyer),
    })
}
