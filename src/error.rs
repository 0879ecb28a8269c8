use crate::domain::offer::OfferId;
use crate::domain::order::OrderId;
use crate::domain::transaction::FailureData;
use std::fmt;
use thiserror::Error;

/// Defect reported by the payment credential check on order submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialDefect {
    MissingExternalId,
    MissingCustomer,
    Deactivated,
    Expired,
}

impl CredentialDefect {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialDefect::MissingExternalId => "credit_card_missing_external_id",
            CredentialDefect::MissingCustomer => "credit_card_missing_customer",
            CredentialDefect::Deactivated => "credit_card_deactivated",
            CredentialDefect::Expired => "credit_card_expired",
        }
    }
}

/// Caller or input defects. Always raised before anything is mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    CannotOffer,
    InvalidAmountCents,
    InvalidState,
    NotLastOffer,
    InvalidOffer,
    CantSubmit,
    MissingRequiredInfo,
    MissingChargeId,
    CreditCard(CredentialDefect),
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::CannotOffer => "cannot_offer",
            ValidationCode::InvalidAmountCents => "invalid_amount_cents",
            ValidationCode::InvalidState => "invalid_state",
            ValidationCode::NotLastOffer => "not_last_offer",
            ValidationCode::InvalidOffer => "invalid_offer",
            ValidationCode::CantSubmit => "cant_submit",
            ValidationCode::MissingRequiredInfo => "missing_required_info",
            ValidationCode::MissingChargeId => "missing_charge_id",
            ValidationCode::CreditCard(defect) => defect.as_str(),
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Business rule or external dependency failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingCode {
    InsufficientInventory,
    ArtworkVersionMismatch,
    CaptureFailed,
    CannotCapture,
}

impl ProcessingCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingCode::InsufficientInventory => "insufficient_inventory",
            ProcessingCode::ArtworkVersionMismatch => "artwork_version_mismatch",
            ProcessingCode::CaptureFailed => "capture_failed",
            ProcessingCode::CannotCapture => "cannot_capture",
        }
    }
}

impl fmt::Display for ProcessingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Validation error: {0}")]
    Validation(ValidationCode),
    #[error("Processing error: {code}")]
    Processing {
        code: ProcessingCode,
        failure: Option<FailureData>,
    },
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),
    #[error("Offer not found: {0}")]
    OfferNotFound(OfferId),
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExchangeError {
    pub fn validation(code: ValidationCode) -> Self {
        ExchangeError::Validation(code)
    }

    pub fn processing(code: ProcessingCode) -> Self {
        ExchangeError::Processing {
            code,
            failure: None,
        }
    }

    /// Machine-readable reason code for validation and processing errors.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            ExchangeError::Validation(code) => Some(code.as_str()),
            ExchangeError::Processing { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExchangeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes_are_snake_case() {
        let err = ExchangeError::validation(ValidationCode::NotLastOffer);
        assert_eq!(err.code(), Some("not_last_offer"));
        assert_eq!(err.to_string(), "Validation error: not_last_offer");

        let err = ExchangeError::processing(ProcessingCode::CaptureFailed);
        assert_eq!(err.code(), Some("capture_failed"));
    }

    #[test]
    fn test_credit_card_defect_code() {
        let code = ValidationCode::CreditCard(CredentialDefect::Deactivated);
        assert_eq!(code.as_str(), "credit_card_deactivated");
    }

    #[test]
    fn test_internal_errors_have_no_reason_code() {
        let err = ExchangeError::Internal("boom".to_string());
        assert_eq!(err.code(), None);
    }
}
