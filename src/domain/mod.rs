//! Domain types, the order state machine, totals and the port traits the
//! application layer depends on. Nothing here performs I/O.

pub mod gateway;
pub mod offer;
pub mod order;
pub mod ports;
pub mod totals;
pub mod transaction;
