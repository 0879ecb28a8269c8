use crate::domain::gateway::{
    CaptureMethod, GatewayError, PaymentIntent, PaymentIntentRequest, TransferData,
};
use crate::domain::ports::GatewayClientRef;
use crate::domain::transaction::{
    ExternalType, FailureData, Transaction, TransactionStatus, TransactionType,
};
use crate::error::{ExchangeError, ProcessingCode, Result};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Buyer's stored card as known to the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditCard {
    pub external_id: String,
    pub customer_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentParams {
    pub credit_card: CreditCard,
    pub buyer_amount: i64,
    pub seller_amount: i64,
    pub merchant_account_id: String,
    pub currency_code: String,
    pub description: String,
    pub metadata: BTreeMap<String, String>,
}

/// Normalizes processor calls into [`Transaction`] outcomes.
///
/// Processor-reported failures come back as `Failure` transactions, never as
/// errors. Errors are reserved for non-capturable authorizations and contract
/// violations such as an unknown authorization status.
#[derive(Clone)]
pub struct PaymentService {
    gateway: GatewayClientRef,
}

impl PaymentService {
    pub fn new(gateway: GatewayClientRef) -> Self {
        Self { gateway }
    }

    pub async fn hold_payment(&self, params: PaymentParams) -> Result<Transaction> {
        self.create_payment_intent(params, CaptureMethod::Manual)
            .await
    }

    pub async fn immediate_capture_payment(&self, params: PaymentParams) -> Result<Transaction> {
        self.create_payment_intent(params, CaptureMethod::Automatic)
            .await
    }

    /// Legacy single-step capture of an authorized charge.
    pub async fn capture_authorized_charge(&self, charge_id: &str) -> Result<Transaction> {
        let captured = match self.gateway.retrieve_charge(charge_id).await {
            Ok(charge) => self.gateway.capture_charge(&charge.id).await,
            Err(err) => Err(err),
        };
        match captured {
            Ok(charge) => {
                info!(charge_id = %charge.id, "captured charge");
                let mut transaction =
                    Transaction::new(TransactionType::Capture, TransactionStatus::Success);
                transaction.external_id = Some(charge.id);
                transaction.external_type = Some(ExternalType::Charge);
                transaction.source_id = charge.payment_method;
                transaction.destination_id = charge.destination;
                transaction.amount_cents = Some(charge.amount);
                Ok(transaction)
            }
            Err(err) => Ok(transaction_from_error(
                err,
                TransactionType::Capture,
                Some(charge_id),
            )),
        }
    }

    pub async fn capture_authorized_payment(&self, payment_intent_id: &str) -> Result<Transaction> {
        let payment_intent = match self.gateway.retrieve_payment_intent(payment_intent_id).await {
            Ok(payment_intent) => payment_intent,
            Err(err) => {
                return Ok(transaction_from_error(
                    err,
                    TransactionType::Capture,
                    Some(payment_intent_id),
                ));
            }
        };
        if payment_intent.status != "requires_capture" {
            return Err(ExchangeError::processing(ProcessingCode::CannotCapture));
        }

        match self.gateway.capture_payment_intent(&payment_intent.id).await {
            Ok(captured) => {
                let mut transaction = transaction_for_intent(&captured, TransactionType::Capture)?;
                transaction.destination_id = captured.transfer_data.map(|t| t.destination);
                Ok(transaction)
            }
            Err(err) => Ok(transaction_from_error(
                err,
                TransactionType::Capture,
                Some(payment_intent_id),
            )),
        }
    }

    pub async fn refund_charge(&self, charge_id: &str) -> Result<Transaction> {
        Ok(self.refund(charge_id, charge_id).await)
    }

    /// Refunds the first charge of a payment intent.
    pub async fn refund_payment(&self, payment_intent_id: &str) -> Result<Transaction> {
        let payment_intent = match self.gateway.retrieve_payment_intent(payment_intent_id).await {
            Ok(payment_intent) => payment_intent,
            Err(err) => {
                return Ok(transaction_from_error(
                    err,
                    TransactionType::Refund,
                    Some(payment_intent_id),
                ));
            }
        };
        let charge_id = payment_intent.charges.first().ok_or_else(|| {
            ExchangeError::Internal(format!(
                "payment intent {payment_intent_id} has no charges to refund"
            ))
        })?;
        Ok(self.refund(charge_id, payment_intent_id).await)
    }

    async fn refund(&self, charge_id: &str, external_id: &str) -> Transaction {
        match self.gateway.create_refund(charge_id, true).await {
            Ok(refund) => {
                info!(refund_id = %refund.id, charge_id, "refunded charge");
                let mut transaction =
                    Transaction::new(TransactionType::Refund, TransactionStatus::Success);
                transaction.external_id = Some(refund.id);
                transaction.external_type = Some(ExternalType::Refund);
                transaction
            }
            Err(err) => transaction_from_error(err, TransactionType::Refund, Some(external_id)),
        }
    }

    async fn create_payment_intent(
        &self,
        params: PaymentParams,
        capture_method: CaptureMethod,
    ) -> Result<Transaction> {
        let transaction_type = match capture_method {
            CaptureMethod::Automatic => TransactionType::Capture,
            CaptureMethod::Manual => TransactionType::Hold,
        };
        let destination = params.merchant_account_id.clone();
        let request = PaymentIntentRequest {
            amount: params.buyer_amount,
            currency: params.currency_code,
            description: params.description,
            payment_method: params.credit_card.external_id,
            customer: params.credit_card.customer_id,
            on_behalf_of: params.merchant_account_id.clone(),
            transfer_data: TransferData {
                destination: params.merchant_account_id,
                amount: params.seller_amount,
            },
            metadata: params.metadata,
            capture_method,
        };

        match self.gateway.create_payment_intent(request).await {
            Ok(payment_intent) => {
                let mut transaction = transaction_for_intent(&payment_intent, transaction_type)?;
                transaction.destination_id = Some(destination);
                Ok(transaction)
            }
            Err(err) => Ok(transaction_from_error(err, transaction_type, None)),
        }
    }
}

/// Builds a transaction from an authorization, mapping its status.
fn transaction_for_intent(
    payment_intent: &PaymentIntent,
    transaction_type: TransactionType,
) -> Result<Transaction> {
    let (status, failure) = map_intent_status(payment_intent)?;
    let mut transaction = Transaction::new(transaction_type, status);
    transaction.external_id = Some(payment_intent.id.clone());
    transaction.external_type = Some(ExternalType::PaymentIntent);
    transaction.source_id = payment_intent.payment_method.clone();
    transaction.amount_cents = Some(payment_intent.amount);
    transaction.failure = failure;
    transaction.payload = serde_json::to_value(payment_intent).ok();
    Ok(transaction)
}

/// Authorization status to transaction status. Unknown statuses are fatal.
pub fn map_intent_status(
    payment_intent: &PaymentIntent,
) -> Result<(TransactionStatus, Option<FailureData>)> {
    match payment_intent.status.as_str() {
        "requires_capture" => Ok((TransactionStatus::RequiresCapture, None)),
        "succeeded" => Ok((TransactionStatus::Success, None)),
        "requires_payment_method" => {
            let error = payment_intent.last_payment_error.clone().unwrap_or_default();
            Ok((
                TransactionStatus::Failure,
                Some(FailureData {
                    failure_code: error.code,
                    failure_message: error.message,
                    decline_code: error.decline_code,
                }),
            ))
        }
        other => Err(ExchangeError::Internal(format!(
            "Unsupported payment_intent status: {other}"
        ))),
    }
}

fn transaction_from_error(
    err: GatewayError,
    transaction_type: TransactionType,
    external_id: Option<&str>,
) -> Transaction {
    warn!(
        code = err.code.as_deref().unwrap_or("unknown"),
        ?transaction_type,
        "gateway reported failure"
    );
    let mut transaction = Transaction::new(transaction_type, TransactionStatus::Failure);
    transaction.payload = serde_json::to_value(&err).ok();
    transaction.external_id = external_id.map(str::to_string).or(err.charge);
    transaction.failure = Some(FailureData {
        failure_code: err.code,
        failure_message: err.message,
        decline_code: err.decline_code,
    });
    transaction
}
