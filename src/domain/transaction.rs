use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Hold,
    Capture,
    Refund,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Success,
    Failure,
    RequiresCapture,
}

/// Kind of gateway object the transaction was recorded against.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ExternalType {
    Charge,
    PaymentIntent,
    Refund,
}

/// Gateway-reported failure details.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
pub struct FailureData {
    pub failure_code: Option<String>,
    pub failure_message: Option<String>,
    pub decline_code: Option<String>,
}

/// Immutable record of one payment gateway operation's outcome.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub external_id: Option<String>,
    pub external_type: Option<ExternalType>,
    pub source_id: Option<String>,
    pub destination_id: Option<String>,
    pub amount_cents: Option<i64>,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub failure: Option<FailureData>,
    /// Raw gateway response kept for audit.
    pub payload: Option<serde_json::Value>,
}

impl Transaction {
    pub fn new(transaction_type: TransactionType, status: TransactionStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            external_id: None,
            external_type: None,
            source_id: None,
            destination_id: None,
            amount_cents: None,
            transaction_type,
            status,
            failure: None,
            payload: None,
        }
    }

    pub fn failed(&self) -> bool {
        self.status == TransactionStatus::Failure
    }

    pub fn failure_data(&self) -> Option<FailureData> {
        self.failure.clone()
    }
}
