//! Offer negotiation and settlement core for a negotiated marketplace.
//!
//! Buyers and sellers exchange offers on an order; one offer is submitted and
//! locks in the order's monetary snapshot, and approval captures payment through
//! the payment gateway, recording every outcome in the transaction ledger.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
pub mod scenario;
