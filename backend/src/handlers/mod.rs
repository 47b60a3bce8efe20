//! HTTP request handlers

pub mod health;
pub mod stock;

pub use health::health_check;
pub use stock::{get_stock_item, list_alerts, list_stock, refresh_stock};
