//! Dashboard KPIs over classified stock

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Rotation, StockItem, StockStatus};

/// Counters shown on the stock dashboard cards
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockSummary {
    pub total_products: u64,
    pub available: u64,
    pub normal: u64,
    pub low: u64,
    pub critical: u64,
    pub out_of_stock: u64,
    pub overstock: u64,
    pub fast_movers: u64,
    pub slow_movers: u64,
    pub total_value: Decimal,
}

impl StockSummary {
    pub fn from_items(items: &[StockItem]) -> Self {
        items.iter().fold(Self::default(), |mut acc, item| {
            acc.total_products += 1;
            if item.current_stock > 0 {
                acc.available += 1;
            }
            match item.status {
                StockStatus::Normal => acc.normal += 1,
                StockStatus::Low => acc.low += 1,
                StockStatus::Critical => acc.critical += 1,
                StockStatus::OutOfStock => acc.out_of_stock += 1,
                StockStatus::Overstock => acc.overstock += 1,
            }
            match item.rotation {
                Rotation::Fast => acc.fast_movers += 1,
                Rotation::Slow => acc.slow_movers += 1,
                Rotation::Normal => {}
            }
            acc.total_value += item.stock_value;
            acc
        })
    }
}

/// Items needing a reorder, out-of-stock first, then critical, then low
pub fn alert_items(items: &[StockItem]) -> Vec<StockItem> {
    let mut alerts: Vec<StockItem> = items
        .iter()
        .filter(|item| item.status.needs_attention())
        .cloned()
        .collect();
    alerts.sort_by_key(|item| item.status.severity());
    alerts
}
