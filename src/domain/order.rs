use super::offer::OfferId;
use super::totals::Totals;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderMode {
    Buy,
    Offer,
}

/// Order lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    Pending,
    Submitted,
    Approved,
    Fulfilled,
    Canceled,
    Refunded,
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Pending => "pending",
            OrderState::Submitted => "submitted",
            OrderState::Approved => "approved",
            OrderState::Fulfilled => "fulfilled",
            OrderState::Canceled => "canceled",
            OrderState::Refunded => "refunded",
        }
    }

    pub fn can_transition_to(&self, target: OrderState) -> bool {
        use OrderState::*;

        matches!(
            (self, target),
            (Pending, Submitted)
                | (Pending, Canceled)
                | (Submitted, Approved)
                | (Submitted, Canceled)
                | (Approved, Fulfilled)
                | (Approved, Canceled)
                | (Approved, Refunded)
                | (Fulfilled, Refunded)
        )
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub artwork_id: String,
    pub artwork_version_id: String,
    pub quantity: u32,
    pub list_price_cents: i64,
}

/// The aggregate being negotiated and settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub mode: OrderMode,
    pub state: OrderState,
    pub state_expires_at: Option<DateTime<Utc>>,
    pub last_offer_id: Option<OfferId>,
    /// Monetary snapshot, replaced as a whole on offer submission.
    pub totals: Option<Totals>,
    pub external_charge_id: Option<String>,
    pub currency_code: String,
    /// Shipping quoted for the selected fulfillment.
    pub shipping_quote_cents: i64,
    pub tax_rate_basis_points: u32,
    /// Whether the platform, not the seller, remits sales tax.
    pub remit_sales_tax: bool,
    pub line_items: Vec<LineItem>,
}

impl Order {
    pub fn new(id: OrderId, mode: OrderMode) -> Self {
        Self {
            id,
            mode,
            state: OrderState::Pending,
            state_expires_at: None,
            last_offer_id: None,
            totals: None,
            external_charge_id: None,
            currency_code: "USD".to_string(),
            shipping_quote_cents: 0,
            tax_rate_basis_points: 0,
            remit_sales_tax: false,
            line_items: Vec::new(),
        }
    }

    /// Moves the order to `target` if the state machine allows it.
    ///
    /// Returns `false` and leaves the order untouched otherwise.
    pub fn transition_to(&mut self, target: OrderState, expires_at: DateTime<Utc>) -> bool {
        if !self.state.can_transition_to(target) {
            return false;
        }
        self.state = target;
        self.state_expires_at = Some(expires_at);
        true
    }

    pub fn is_last_offer(&self, offer_id: &OfferId) -> bool {
        self.last_offer_id.as_ref() == Some(offer_id)
    }
}
