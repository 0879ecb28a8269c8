use crate::domain::totals::{TotalsCalculator, TransactionFeePolicy};
use crate::error::{ExchangeError, Result};
use chrono::Duration;
use clap::Args;

/// Upper bound for any expiration window or reminder lead: ten years.
pub const MAX_WINDOW_HOURS: u32 = 24 * 366 * 10;

/// Platform policy knobs. Every flag can also be set through its environment variable.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Commission charged on the items total, in basis points
    #[arg(long, env = "EXCHANGE_COMMISSION_RATE_BPS", default_value_t = 800)]
    pub commission_rate_bps: u32,

    /// Processing fee rate charged on the buyer total, in basis points
    #[arg(long, env = "EXCHANGE_TRANSACTION_FEE_BPS", default_value_t = 290)]
    pub transaction_fee_bps: u32,

    /// Fixed processing fee per transaction, in cents
    #[arg(long, env = "EXCHANGE_TRANSACTION_FEE_FIXED_CENTS", default_value_t = 30)]
    pub transaction_fee_fixed_cents: i64,

    /// How long a submitted offer stays open
    #[arg(
        long,
        env = "EXCHANGE_OFFER_EXPIRATION_HOURS",
        default_value_t = 48,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_WINDOW_HOURS))
    )]
    pub offer_expiration_hours: u32,

    /// How long an approved order waits for fulfillment
    #[arg(
        long,
        env = "EXCHANGE_APPROVED_EXPIRATION_HOURS",
        default_value_t = 168,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_WINDOW_HOURS))
    )]
    pub approved_expiration_hours: u32,

    /// Lead time of reminders before a state expires
    #[arg(
        long,
        env = "EXCHANGE_REMINDER_LEAD_HOURS",
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_WINDOW_HOURS))
    )]
    pub reminder_lead_hours: u32,

    /// Shipping quote applied to replayed orders, in cents
    #[arg(long, env = "EXCHANGE_SHIPPING_CENTS", default_value_t = 0)]
    pub shipping_cents: i64,

    /// Sales tax rate applied to replayed orders, in basis points
    #[arg(long, env = "EXCHANGE_TAX_RATE_BPS", default_value_t = 0)]
    pub tax_rate_bps: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            commission_rate_bps: 800,
            transaction_fee_bps: 290,
            transaction_fee_fixed_cents: 30,
            offer_expiration_hours: 48,
            approved_expiration_hours: 168,
            reminder_lead_hours: 5,
            shipping_cents: 0,
            tax_rate_bps: 0,
        }
    }
}

/// Windows applied to `state_expires_at` on transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expirations {
    pub offer: Duration,
    pub approved: Duration,
    pub reminder_lead: Duration,
}

impl Settings {
    pub fn calculator(&self) -> TotalsCalculator {
        TotalsCalculator::new(
            self.commission_rate_bps,
            TransactionFeePolicy {
                rate_basis_points: self.transaction_fee_bps,
                fixed_cents: self.transaction_fee_fixed_cents,
            },
        )
    }

    /// Fails when a window is zero or any value exceeds [`MAX_WINDOW_HOURS`].
    pub fn expirations(&self) -> Result<Expirations> {
        if self.offer_expiration_hours == 0 || self.approved_expiration_hours == 0 {
            return Err(ExchangeError::Config(
                "expiration windows must be at least one hour".to_string(),
            ));
        }
        Ok(Expirations {
            offer: window_hours("offer_expiration_hours", self.offer_expiration_hours)?,
            approved: window_hours("approved_expiration_hours", self.approved_expiration_hours)?,
            reminder_lead: window_hours("reminder_lead_hours", self.reminder_lead_hours)?,
        })
    }
}

fn window_hours(name: &str, hours: u32) -> Result<Duration> {
    if hours > MAX_WINDOW_HOURS {
        return Err(ExchangeError::Config(format!(
            "{name} must not exceed {MAX_WINDOW_HOURS} hours"
        )));
    }
    Duration::try_hours(i64::from(hours))
        .ok_or_else(|| ExchangeError::Config(format!("{name} is out of range")))
}
