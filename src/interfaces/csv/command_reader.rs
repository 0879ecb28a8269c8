use crate::domain::offer::Side;
use crate::error::{ExchangeError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Open an offer-mode order with an authorized charge of `amount`.
    Order,
    /// Make captures of the order's charge fail with `card_declined`.
    Decline,
    Offer,
    Counter,
    SubmitOffer,
    SubmitOrder,
    Approve,
}

/// One scenario row. Offers are referred to by names local to the scenario.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
pub struct Command {
    pub command: CommandKind,
    pub order: String,
    pub offer: Option<String>,
    pub responds_to: Option<String>,
    pub actor: Option<String>,
    pub side: Option<Side>,
    pub amount: Option<i64>,
}

/// Reads scenario commands from a CSV source.
///
/// Whitespace is trimmed and short rows are accepted, missing trailing
/// columns read as empty.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes commands, one result per row.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(ExchangeError::from))
    }
}
