use super::offer::Offer;
use super::order::Order;
use crate::error::{ExchangeError, Result, ValidationCode};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

const BASIS_POINTS: Decimal = dec!(10000);

/// Monetary breakdown of an order at a given amount, all in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub items_total_cents: i64,
    pub shipping_total_cents: i64,
    pub tax_total_cents: i64,
    pub should_remit_sales_tax: bool,
    pub buyer_total_cents: i64,
    pub commission_rate_basis_points: u32,
    pub commission_fee_cents: i64,
    pub transaction_fee_cents: i64,
    pub seller_total_cents: i64,
}

/// Processing fee charged on the buyer total: a rate plus a fixed amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionFeePolicy {
    pub rate_basis_points: u32,
    pub fixed_cents: i64,
}

/// Pure computation of order and offer totals.
///
/// The commission rate is injected at construction so the same inputs always
/// produce the same breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TotalsCalculator {
    commission_rate_basis_points: u32,
    transaction_fee: TransactionFeePolicy,
}

impl TotalsCalculator {
    pub fn new(commission_rate_basis_points: u32, transaction_fee: TransactionFeePolicy) -> Self {
        Self {
            commission_rate_basis_points,
            transaction_fee,
        }
    }

    /// Estimate for a candidate offer amount against the order's context.
    ///
    /// Amounts whose breakdown does not fit in `i64` cents are rejected with
    /// `invalid_amount_cents`.
    pub fn offer_totals(&self, order: &Order, amount_cents: i64) -> Result<Totals> {
        let items = Decimal::from(amount_cents);
        let shipping = Decimal::from(order.shipping_quote_cents);
        let tax = apply_basis_points(items, order.tax_rate_basis_points)?;
        let buyer = items + shipping + tax;

        let commission = apply_basis_points(items, self.commission_rate_basis_points)?;
        let transaction_fee = apply_basis_points(buyer, self.transaction_fee.rate_basis_points)?
            + Decimal::from(self.transaction_fee.fixed_cents);
        let seller = buyer - commission - transaction_fee;

        Ok(Totals {
            items_total_cents: amount_cents,
            shipping_total_cents: order.shipping_quote_cents,
            tax_total_cents: to_cents(tax)?,
            should_remit_sales_tax: order.remit_sales_tax,
            buyer_total_cents: to_cents(buyer)?,
            commission_rate_basis_points: self.commission_rate_basis_points,
            commission_fee_cents: to_cents(commission)?,
            transaction_fee_cents: to_cents(transaction_fee)?,
            seller_total_cents: to_cents(seller)?,
        })
    }

    /// Binding totals for an order whose terms are set by `offer`.
    pub fn order_totals(&self, order: &Order, offer: &Offer) -> Result<Totals> {
        self.offer_totals(order, offer.amount_cents)
    }
}

fn out_of_range() -> ExchangeError {
    ExchangeError::validation(ValidationCode::InvalidAmountCents)
}

/// Applies a basis-point rate, rounding half away from zero.
fn apply_basis_points(amount: Decimal, basis_points: u32) -> Result<Decimal> {
    let scaled = amount
        .checked_mul(Decimal::from(basis_points))
        .ok_or_else(out_of_range)?
        / BASIS_POINTS;
    Ok(scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
}

fn to_cents(amount: Decimal) -> Result<i64> {
    amount.to_i64().ok_or_else(out_of_range)
}
