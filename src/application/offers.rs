use super::locks::OrderLocks;
use super::Collaborators;
use crate::config::Expirations;
use crate::domain::offer::{Actor, Offer, OfferId, OfferState};
use crate::domain::order::{Order, OrderMode, OrderState};
use crate::domain::ports::Job;
use crate::domain::totals::TotalsCalculator;
use crate::error::{ExchangeError, ProcessingCode, Result, ValidationCode};
use std::sync::Arc;
use tracing::info;

/// Offer creation, counter-offers and submission.
pub struct OfferService {
    collaborators: Collaborators,
    locks: Arc<OrderLocks>,
    calculator: TotalsCalculator,
    expirations: Expirations,
}

impl OfferService {
    pub fn new(
        collaborators: Collaborators,
        locks: Arc<OrderLocks>,
        calculator: TotalsCalculator,
        expirations: Expirations,
    ) -> Self {
        Self {
            collaborators,
            locks,
            calculator,
            expirations,
        }
    }

    pub async fn create_pending_offer(
        &self,
        order: &Order,
        amount_cents: i64,
        from: Actor,
        creator_id: &str,
        responds_to: Option<OfferId>,
    ) -> Result<Offer> {
        if order.mode != OrderMode::Offer {
            return Err(ExchangeError::validation(ValidationCode::CannotOffer));
        }
        if amount_cents <= 0 {
            return Err(ExchangeError::validation(ValidationCode::InvalidAmountCents));
        }

        let totals = self.calculator.offer_totals(order, amount_cents)?;
        let offer = Offer {
            id: OfferId::generate(),
            order_id: order.id.clone(),
            amount_cents,
            from,
            creator_id: creator_id.to_string(),
            responds_to,
            state: OfferState::Pending,
            totals,
        };
        self.collaborators.offers.store(offer.clone()).await?;
        info!(order_id = %order.id, offer_id = %offer.id, amount_cents, "created pending offer");
        Ok(offer)
    }

    pub async fn create_pending_counter_offer(
        &self,
        responds_to: &Offer,
        amount_cents: i64,
        from: Actor,
        creator_id: &str,
    ) -> Result<Offer> {
        let order = self.collaborators.load_order(&responds_to.order_id).await?;
        if order.state != OrderState::Submitted {
            return Err(ExchangeError::validation(ValidationCode::InvalidState));
        }
        if !order.is_last_offer(&responds_to.id) {
            return Err(ExchangeError::validation(ValidationCode::NotLastOffer));
        }

        self.create_pending_offer(
            &order,
            amount_cents,
            from,
            creator_id,
            Some(responds_to.id.clone()),
        )
        .await
    }

    pub async fn submit_pending_offer(&self, offer: &Offer) -> Result<Offer> {
        if offer.is_submitted() {
            return Err(ExchangeError::validation(ValidationCode::InvalidOffer));
        }
        let order = self.collaborators.load_order(&offer.order_id).await?;
        if !self.collaborators.inventory.has_inventory(&order).await {
            return Err(ExchangeError::processing(
                ProcessingCode::InsufficientInventory,
            ));
        }

        let (order, offer) = {
            let _guard = self.locks.lock(&offer.order_id).await;
            self.submit_locked(&offer.id, None).await?
        };
        self.post_submit_offer(&order, &offer);
        Ok(offer)
    }

    /// Submits the order itself together with the offer that sets its terms.
    pub async fn submit_order_with_offer(&self, offer: &Offer, actor_id: &str) -> Result<Order> {
        let order = self.collaborators.load_order(&offer.order_id).await?;
        self.validate_order_submission(&order).await?;
        if offer.is_submitted() {
            return Err(ExchangeError::validation(ValidationCode::InvalidOffer));
        }
        if !self.collaborators.inventory.has_inventory(&order).await {
            return Err(ExchangeError::processing(
                ProcessingCode::InsufficientInventory,
            ));
        }

        let (order, offer) = {
            let _guard = self.locks.lock(&offer.order_id).await;
            self.submit_locked(&offer.id, Some(OrderState::Submitted))
                .await?
        };
        self.post_submit_offer(&order, &offer);

        self.collaborators.metrics.increment("order.submit");
        self.collaborators.dispatcher.enqueue(Job::PostOrderNotification {
            order_id: order.id.clone(),
            state: OrderState::Submitted,
            actor_id: actor_id.to_string(),
        });
        Ok(order)
    }

    /// Read-modify-write of offer and order. Caller must hold the order lock.
    ///
    /// Everything is validated before the first write so a rejected submission
    /// leaves both records unchanged.
    async fn submit_locked(
        &self,
        offer_id: &OfferId,
        order_transition: Option<OrderState>,
    ) -> Result<(Order, Offer)> {
        let mut offer = self.collaborators.load_offer(offer_id).await?;
        if offer.is_submitted() {
            return Err(ExchangeError::validation(ValidationCode::InvalidOffer));
        }
        let mut order = self.collaborators.load_order(&offer.order_id).await?;
        let now = self.collaborators.clock.now();
        let expires_at = now + self.expirations.offer;

        if let Some(target) = order_transition
            && !order.transition_to(target, expires_at)
        {
            return Err(ExchangeError::validation(ValidationCode::InvalidState));
        }

        let totals = self.calculator.order_totals(&order, &offer)?;
        offer.state = OfferState::Submitted { at: now };
        order.totals = Some(totals);
        order.last_offer_id = Some(offer.id.clone());
        order.state_expires_at = Some(expires_at);

        self.collaborators.offers.store(offer.clone()).await?;
        self.collaborators.orders.store(order.clone()).await?;
        info!(order_id = %order.id, offer_id = %offer.id, state = %order.state, "submitted offer");
        Ok((order, offer))
    }

    fn post_submit_offer(&self, order: &Order, offer: &Offer) {
        let dispatcher = &self.collaborators.dispatcher;
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
                Job::OfferRespondReminder {
                    order_id: order.id.clone(),
                    offer_id: offer.id.clone(),
                },
            );
        }
        dispatcher.enqueue(Job::PostOfferNotification {
            offer_id: offer.id.clone(),
            actor_id: offer.creator_id.clone(),
        });
        self.collaborators.metrics.increment("offer.submit");
    }

    async fn validate_order_submission(&self, order: &Order) -> Result<()> {
        let readiness = &self.collaborators.readiness;
        if order.mode != OrderMode::Offer {
            return Err(ExchangeError::validation(ValidationCode::CantSubmit));
        }
        if !readiness.can_commit(order).await {
            return Err(ExchangeError::validation(ValidationCode::MissingRequiredInfo));
        }
        if !readiness.valid_artwork_version(order).await {
            self.collaborators
                .metrics
                .increment("submit.artwork_version_mismatch");
            return Err(ExchangeError::processing(
                ProcessingCode::ArtworkVersionMismatch,
            ));
        }
        if let Some(defect) = readiness.credit_card_defect(order).await {
            return Err(ExchangeError::validation(ValidationCode::CreditCard(defect)));
        }
        Ok(())
    }
}
