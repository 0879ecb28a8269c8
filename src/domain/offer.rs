use super::order::OrderId;
use super::totals::Totals;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfferId(pub String);

impl OfferId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side of the negotiation an actor acts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buyer,
    Seller,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub side: Side,
}

impl Actor {
    pub fn buyer(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            side: Side::Buyer,
        }
    }

    pub fn seller(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            side: Side::Seller,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum OfferState {
    Pending,
    Submitted { at: DateTime<Utc> },
}

/// A proposed price for an order, optionally countering an earlier offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub order_id: OrderId,
    pub amount_cents: i64,
    pub from: Actor,
    pub creator_id: String,
    pub responds_to: Option<OfferId>,
    pub state: OfferState,
    /// Estimate captured at creation; never recomputed.
    pub totals: Totals,
}

impl Offer {
    pub fn is_submitted(&self) -> bool {
        matches!(self.state, OfferState::Submitted { .. })
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            OfferState::Pending => None,
            OfferState::Submitted { at } => Some(at),
        }
    }
}
