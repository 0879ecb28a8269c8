mod common;

use chrono::Duration;
use common::{CHARGE_ID, Harness, start_time};
use exchange::domain::gateway::GatewayError;
use exchange::domain::order::OrderState;
use async_trait::async_trait;
use exchange::domain::order::OrderId;
use exchange::domain::ports::{Job, OrderStore, TransactionLedger};
use exchange::domain::transaction::{Transaction, TransactionStatus, TransactionType};
use exchange::error::{ExchangeError, ProcessingCode, Result, ValidationCode};
use std::io;
use std::sync::Arc;

/// Ledger whose writes always fail.
struct UnavailableLedger;

#[async_trait]
impl TransactionLedger for UnavailableLedger {
    async fn append(&self, _order_id: &OrderId, _transaction: Transaction) -> Result<()> {
        Err(io::Error::other("ledger unavailable").into())
    }

    async fn for_order(&self, _order_id: &OrderId) -> Result<Vec<Transaction>> {
        Ok(Vec::new())
    }
}

fn card_declined() -> GatewayError {
    GatewayError {
        code: Some("card_declined".to_string()),
        message: Some("Your card was declined.".to_string()),
        decline_code: Some("insufficient_funds".to_string()),
        charge: None,
    }
}

#[tokio::test]
async fn test_approve_captures_and_records() {
    let mut h = Harness::new();
    let (order, _) = h.submitted_order("o1", 10000).await;
    h.jobs();
    h.clock.advance(Duration::hours(1));

    let approved = h.approvals.approve(&order.id, "seller1").await.unwrap();

    assert_eq!(approved.state, OrderState::Approved);
    assert_eq!(
        approved.state_expires_at,
        Some(start_time() + Duration::hours(1) + Duration::hours(168))
    );
    assert_eq!(h.order("o1").await, approved);

    let transactions = h.ledger.for_order(&order.id).await.unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].transaction_type, TransactionType::Capture);
    assert_eq!(transactions[0].status, TransactionStatus::Success);
    assert_eq!(transactions[0].external_id.as_deref(), Some(CHARGE_ID));
    assert!(h.gateway.charge(CHARGE_ID).await.unwrap().captured);

    let totals = approved.totals.unwrap();
    assert_eq!(h.metrics.value("order.approve"), 1);
    assert_eq!(
        h.metrics.value("order.money_collected"),
        totals.buyer_total_cents
    );
    assert_eq!(
        h.metrics.value("order.commission_collected"),
        totals.commission_fee_cents
    );

    let jobs = h.jobs();
    assert!(jobs.iter().any(|d| d.job
        == Job::RecordSalesTax {
            line_item_id: "li_o1".to_string()
        }));
    assert!(jobs.iter().any(|d| d.job
        == Job::PostOrderNotification {
            order_id: order.id.clone(),
            state: OrderState::Approved,
            actor_id: "seller1".to_string(),
        }));
    let reminder = jobs
        .iter()
        .find(|d| matches!(d.job, Job::ReminderFollowUp { .. }))
        .unwrap();
    assert_eq!(
        reminder.run_at,
        approved.state_expires_at.map(|at| at - Duration::hours(5))
    );
}

#[tokio::test]
async fn test_failed_capture_aborts_approval_but_is_recorded() {
    let mut h = Harness::new();
    let (order, _) = h.submitted_order("o1", 10000).await;
    h.jobs();
    h.gateway.decline_charge(CHARGE_ID, card_declined()).await;

    let err = h.approvals.approve(&order.id, "seller1").await.unwrap_err();
    match err {
        ExchangeError::Processing { code, failure } => {
            assert_eq!(code, ProcessingCode::CaptureFailed);
            let failure = failure.unwrap();
            assert_eq!(failure.failure_code.as_deref(), Some("card_declined"));
            assert_eq!(failure.decline_code.as_deref(), Some("insufficient_funds"));
        }
        other => panic!("expected capture_failed, got {other:?}"),
    }

    assert_eq!(h.order("o1").await, order);
    let transactions = h.ledger.for_order(&order.id).await.unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].status, TransactionStatus::Failure);
    assert_eq!(transactions[0].transaction_type, TransactionType::Capture);

    assert_eq!(h.metrics.value("order.approve"), 0);
    assert!(h.jobs().is_empty());
}

#[tokio::test]
async fn test_pending_order_cannot_be_approved() {
    let h = Harness::new();
    let order = h.offer_order("o1").await;

    let err = h.approvals.approve(&order.id, "seller1").await.unwrap_err();
    assert!(matches!(
        err,
        ExchangeError::Validation(ValidationCode::InvalidState)
    ));
    assert!(h.ledger.for_order(&order.id).await.unwrap().is_empty());
    assert!(!h.gateway.charge(CHARGE_ID).await.unwrap().captured);
}

#[tokio::test]
async fn test_approval_requires_charge() {
    let h = Harness::new();
    let (mut order, _) = h.submitted_order("o1", 10000).await;
    order.external_charge_id = None;
    h.orders.store(order.clone()).await.unwrap();

    let err = h.approvals.approve(&order.id, "seller1").await.unwrap_err();
    assert!(matches!(
        err,
        ExchangeError::Validation(ValidationCode::MissingChargeId)
    ));
    assert!(h.ledger.for_order(&order.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_second_approval_is_rejected() {
    let h = Harness::new();
    let (order, _) = h.submitted_order("o1", 10000).await;

    h.approvals.approve(&order.id, "seller1").await.unwrap();
    let err = h.approvals.approve(&order.id, "seller1").await.unwrap_err();

    assert!(matches!(
        err,
        ExchangeError::Validation(ValidationCode::InvalidState)
    ));
    assert_eq!(h.ledger.for_order(&order.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_approvals_capture_once() {
    let h = Harness::new();
    let (order, _) = h.submitted_order("o1", 10000).await;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let approvals = h.approvals.clone();
            let order_id = order.id.clone();
            tokio::spawn(async move { approvals.approve(&order_id, "seller1").await })
        })
        .collect();

    let mut approved = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            approved += 1;
        }
    }
    assert_eq!(approved, 1);
    assert_eq!(h.ledger.for_order(&order.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_declined_capture_is_reported_when_ledger_fails() {
    let h = Harness::with_ledger(Arc::new(UnavailableLedger));
    let (order, _) = h.submitted_order("o1", 10000).await;
    h.gateway.decline_charge(CHARGE_ID, card_declined()).await;

    let err = h.approvals.approve(&order.id, "seller1").await.unwrap_err();
    match err {
        ExchangeError::Processing { code, failure } => {
            assert_eq!(code, ProcessingCode::CaptureFailed);
            assert_eq!(
                failure.unwrap().failure_code.as_deref(),
                Some("card_declined")
            );
        }
        other => panic!("expected capture_failed, got {other:?}"),
    }
    assert_eq!(h.order("o1").await, order);
}

#[tokio::test]
async fn test_ledger_failure_blocks_successful_approval() {
    let h = Harness::with_ledger(Arc::new(UnavailableLedger));
    let (order, _) = h.submitted_order("o1", 10000).await;

    let err = h.approvals.approve(&order.id, "seller1").await.unwrap_err();
    assert!(matches!(err, ExchangeError::Io(_)));
    assert_eq!(h.order("o1").await.state, OrderState::Submitted);
}
