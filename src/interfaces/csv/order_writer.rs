use crate::domain::order::{Order, OrderState};
use crate::domain::totals::Totals;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// Final summary of one order as written to the output CSV.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct OrderRow {
    pub order: String,
    pub state: OrderState,
    pub last_offer: Option<String>,
    pub items_total: Option<i64>,
    pub shipping_total: Option<i64>,
    pub tax_total: Option<i64>,
    pub buyer_total: Option<i64>,
    pub commission_fee: Option<i64>,
    pub transaction_fee: Option<i64>,
    pub seller_total: Option<i64>,
    pub transactions: usize,
}

impl OrderRow {
    pub fn new(order: &Order, last_offer: Option<String>, transactions: usize) -> Self {
        let totals = order.totals.as_ref();
        let field = |f: fn(&Totals) -> i64| totals.map(f);
        Self {
            order: order.id.to_string(),
            state: order.state,
            last_offer,
            items_total: field(|t| t.items_total_cents),
            shipping_total: field(|t| t.shipping_total_cents),
            tax_total: field(|t| t.tax_total_cents),
            buyer_total: field(|t| t.buyer_total_cents),
            commission_fee: field(|t| t.commission_fee_cents),
            transaction_fee: field(|t| t.transaction_fee_cents),
            seller_total: field(|t| t.seller_total_cents),
            transactions,
        }
    }
}

pub struct OrderWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OrderWriter<W> {
    pub fn new(destination: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(destination),
        }
    }

    pub fn write_orders(&mut self, rows: impl IntoIterator<Item = OrderRow>) -> Result<()> {
        for row in rows {
            self.writer.serialize(row)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
