use exchange::application::payment::{CreditCard, PaymentParams, PaymentService};
use exchange::domain::gateway::GatewayError;
use exchange::domain::ports::GatewayClient;
use exchange::domain::transaction::{ExternalType, TransactionStatus, TransactionType};
use exchange::error::{ExchangeError, ProcessingCode};
use exchange::infrastructure::simulated_gateway::SimulatedGateway;
use std::collections::BTreeMap;
use std::sync::Arc;

fn service() -> (PaymentService, SimulatedGateway) {
    let gateway = SimulatedGateway::new();
    (PaymentService::new(Arc::new(gateway.clone())), gateway)
}

fn params() -> PaymentParams {
    PaymentParams {
        credit_card: CreditCard {
            external_id: "pm_card".to_string(),
            customer_id: "cus_1".to_string(),
        },
        buyer_amount: 12625,
        seller_amount: 11429,
        merchant_account_id: "acct_seller".to_string(),
        currency_code: "usd".to_string(),
        description: "Offer order o1".to_string(),
        metadata: BTreeMap::from([("order_id".to_string(), "o1".to_string())]),
    }
}

fn card_declined() -> GatewayError {
    GatewayError {
        code: Some("card_declined".to_string()),
        message: Some("Your card was declined.".to_string()),
        decline_code: Some("do_not_honor".to_string()),
        charge: None,
    }
}

#[tokio::test]
async fn test_capture_charge_success() {
    let (payments, gateway) = service();
    gateway.authorize_charge("ch_1", 5000, "pm_card", "acct_seller").await;

    let transaction = payments.capture_authorized_charge("ch_1").await.unwrap();

    assert_eq!(transaction.status, TransactionStatus::Success);
    assert_eq!(transaction.transaction_type, TransactionType::Capture);
    assert_eq!(transaction.amount_cents, Some(5000));
    assert_eq!(transaction.source_id.as_deref(), Some("pm_card"));
    assert_eq!(transaction.destination_id.as_deref(), Some("acct_seller"));
}

#[tokio::test]
async fn test_declined_capture_becomes_failure_transaction() {
    let (payments, gateway) = service();
    gateway.authorize_charge("ch_1", 5000, "pm_card", "acct_seller").await;
    gateway.decline_charge("ch_1", card_declined()).await;

    let transaction = payments.capture_authorized_charge("ch_1").await.unwrap();

    assert_eq!(transaction.status, TransactionStatus::Failure);
    assert_eq!(transaction.external_id.as_deref(), Some("ch_1"));
    let failure = transaction.failure.unwrap();
    assert_eq!(failure.failure_code.as_deref(), Some("card_declined"));
    assert_eq!(failure.decline_code.as_deref(), Some("do_not_honor"));
    assert!(transaction.payload.is_some());
}

#[tokio::test]
async fn test_missing_charge_becomes_failure_transaction() {
    let (payments, _) = service();

    let transaction = payments.capture_authorized_charge("ch_404").await.unwrap();

    assert_eq!(transaction.status, TransactionStatus::Failure);
    assert_eq!(transaction.external_id.as_deref(), Some("ch_404"));
    assert_eq!(
        transaction.failure.unwrap().failure_code.as_deref(),
        Some("resource_missing")
    );
}

#[tokio::test]
async fn test_hold_then_capture_payment() {
    let (payments, _) = service();

    let hold = payments.hold_payment(params()).await.unwrap();
    assert_eq!(hold.transaction_type, TransactionType::Hold);
    assert_eq!(hold.status, TransactionStatus::RequiresCapture);
    assert_eq!(hold.external_type, Some(ExternalType::PaymentIntent));
    assert_eq!(hold.destination_id.as_deref(), Some("acct_seller"));
    assert_eq!(hold.amount_cents, Some(12625));
    assert!(hold.payload.is_some());

    let intent_id = hold.external_id.unwrap();
    let capture = payments.capture_authorized_payment(&intent_id).await.unwrap();
    assert_eq!(capture.transaction_type, TransactionType::Capture);
    assert_eq!(capture.status, TransactionStatus::Success);
    assert_eq!(capture.destination_id.as_deref(), Some("acct_seller"));

    let err = payments
        .capture_authorized_payment(&intent_id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ExchangeError::Processing {
            code: ProcessingCode::CannotCapture,
            ..
        }
    ));
}

#[tokio::test]
async fn test_immediate_capture_payment() {
    let (payments, _) = service();

    let transaction = payments.immediate_capture_payment(params()).await.unwrap();

    assert_eq!(transaction.transaction_type, TransactionType::Capture);
    assert_eq!(transaction.status, TransactionStatus::Success);
}

#[tokio::test]
async fn test_declined_payment_method_maps_to_failure() {
    let (payments, gateway) = service();
    gateway.decline_payment_method("pm_card", card_declined()).await;

    let transaction = payments.hold_payment(params()).await.unwrap();

    assert_eq!(transaction.transaction_type, TransactionType::Hold);
    assert_eq!(transaction.status, TransactionStatus::Failure);
    let failure = transaction.failure.unwrap();
    assert_eq!(failure.failure_code.as_deref(), Some("card_declined"));
    assert_eq!(
        failure.failure_message.as_deref(),
        Some("Your card was declined.")
    );
    assert_eq!(failure.decline_code.as_deref(), Some("do_not_honor"));
}

#[tokio::test]
async fn test_unknown_authorization_status_is_fatal() {
    let (payments, gateway) = service();
    gateway.override_intent_status(Some("processing")).await;

    let err = payments.hold_payment(params()).await.unwrap_err();
    assert!(matches!(err, ExchangeError::Internal(_)));
}

#[tokio::test]
async fn test_refunds() {
    let (payments, gateway) = service();
    let hold = payments.immediate_capture_payment(params()).await.unwrap();
    let intent_id = hold.external_id.unwrap();

    let refund = payments.refund_payment(&intent_id).await.unwrap();
    assert_eq!(refund.transaction_type, TransactionType::Refund);
    assert_eq!(refund.status, TransactionStatus::Success);
    assert_eq!(refund.external_type, Some(ExternalType::Refund));

    let intent = gateway.retrieve_payment_intent(&intent_id).await.unwrap();
    let refund = payments.refund_charge(&intent.charges[0]).await.unwrap();
    assert_eq!(refund.status, TransactionStatus::Success);

    gateway.fail_refunds(Some(card_declined())).await;
    let refund = payments.refund_charge(&intent.charges[0]).await.unwrap();
    assert_eq!(refund.status, TransactionStatus::Failure);
    assert_eq!(refund.external_id, Some(intent.charges[0].clone()));

    let refund = payments.refund_payment("pi_missing").await.unwrap();
    assert_eq!(refund.status, TransactionStatus::Failure);
    assert_eq!(refund.external_id.as_deref(), Some("pi_missing"));
}
