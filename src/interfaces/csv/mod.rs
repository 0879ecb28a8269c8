//! CSV adapters for scenario replay.

pub mod command_reader;
pub mod order_writer;
