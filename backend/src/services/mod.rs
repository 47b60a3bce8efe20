//! Business logic services for the pharmacy stock dashboard

pub mod board;
pub mod stock;

#[cfg(test)]
pub(crate) mod testing;

pub use board::StockBoard;
pub use stock::{LoadReport, StockService};
