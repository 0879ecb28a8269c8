//! Adapters implementing the domain ports in-process.

pub mod checks;
pub mod dispatch;
pub mod in_memory;
pub mod simulated_gateway;
