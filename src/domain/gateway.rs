//! Records exchanged with the external payment processor.
//!
//! These mirror the processor's API shapes; normalization into
//! [`Transaction`](super::transaction::Transaction) happens in the payment service.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Error payload reported by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GatewayError {
    pub code: Option<String>,
    pub message: Option<String>,
    pub decline_code: Option<String>,
    /// Charge the error relates to, when the processor reports one.
    pub charge: Option<String>,
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}",
            self.code.as_deref().unwrap_or("unknown"),
            self.message.as_deref().unwrap_or("")
        )
    }
}

impl std::error::Error for GatewayError {}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMethod {
    Automatic,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferData {
    pub destination: String,
    pub amount: i64,
}

/// Create-authorization request. Confirmation is attempted immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntentRequest {
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub payment_method: String,
    pub customer: String,
    pub on_behalf_of: String,
    pub transfer_data: TransferData,
    pub metadata: BTreeMap<String, String>,
    pub capture_method: CaptureMethod,
}

/// Authorization record. `status` is kept as the processor's raw string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    pub status: String,
    pub payment_method: Option<String>,
    pub transfer_data: Option<TransferData>,
    pub last_payment_error: Option<GatewayError>,
    pub charges: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charge {
    pub id: String,
    pub amount: i64,
    pub payment_method: Option<String>,
    pub destination: Option<String>,
    pub captured: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub charge: String,
}
