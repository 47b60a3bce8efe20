//! In-memory stock store for service and router tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    parse_category_threshold, parse_lookup, parse_lot, parse_movement, parse_product, parse_rows,
    CategoryThreshold, LotBalance, Lookup, Movement, Parsed, Product, RawCategoryThreshold,
    RawLookup, RawLot, RawMovement, RawProduct, TenantContext,
};

use crate::error::{AppError, AppResult};
use crate::external::StockStore;

/// Raw rows served for every tenant
#[derive(Default)]
pub struct MemoryData {
    pub products: Vec<RawProduct>,
    pub categories: Vec<RawLookup>,
    pub locations: Vec<RawLookup>,
    pub thresholds: Vec<RawCategoryThreshold>,
    pub lots: Vec<RawLot>,
    pub movements: Vec<RawMovement>,
}

#[derive(Default)]
pub struct MemoryStockStore {
    pub data: Mutex<MemoryData>,
    /// Fail every product fetch with `StoreUnavailable`
    pub fail: AtomicBool,
    /// Delay applied to the product fetch of each load
    pub delay_ms: AtomicUsize,
    /// Number of product fetches started
    pub loads: AtomicUsize,
}

pub fn product(id: &str, name: &str, category_id: Option<&str>) -> RawProduct {
    RawProduct {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        code: Some(format!("CIP-{}", id)),
        category_id: category_id.map(str::to_string),
        location_id: None,
        purchase_price: Some(Decimal::new(250, 2)),
        sale_tariff: Some(Decimal::new(390, 2)),
        lower_bound: None,
        upper_bound: None,
    }
}

pub fn lot(product_id: &str, remaining: i64) -> RawLot {
    RawLot {
        product_id: Some(product_id.to_string()),
        remaining_quantity: Some(remaining),
    }
}

pub fn movement(product_id: &str, kind: &str, quantity: i64, days_ago: i64) -> RawMovement {
    RawMovement {
        product_id: Some(product_id.to_string()),
        kind: Some(kind.to_string()),
        quantity: Some(quantity),
        occurred_at: Some(Utc::now() - chrono::Duration::days(days_ago)),
    }
}

#[async_trait]
impl StockStore for MemoryStockStore {
    async fn fetch_products(&self, _ctx: &TenantContext) -> AppResult<Parsed<Product>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable("memory store offline".to_string()));
        }
        let rows = self.data.lock().unwrap().products.clone();
        Ok(parse_rows(rows, parse_product))
    }

    async fn fetch_categories(&self, _ctx: &TenantContext) -> AppResult<Parsed<Lookup>> {
        let rows = self.data.lock().unwrap().categories.clone();
        Ok(parse_rows(rows, |raw| parse_lookup("familles", raw)))
    }

    async fn fetch_locations(&self, _ctx: &TenantContext) -> AppResult<Parsed<Lookup>> {
        let rows = self.data.lock().unwrap().locations.clone();
        Ok(parse_rows(rows, |raw| parse_lookup("rayons", raw)))
    }

    async fn fetch_category_thresholds(
        &self,
        _ctx: &TenantContext,
    ) -> AppResult<Parsed<CategoryThreshold>> {
        let rows = self.data.lock().unwrap().thresholds.clone();
        Ok(parse_rows(rows, parse_category_threshold))
    }

    async fn fetch_active_lots(&self, _ctx: &TenantContext) -> AppResult<Parsed<LotBalance>> {
        let rows: Vec<RawLot> = self
            .data
            .lock()
            .unwrap()
            .lots
            .iter()
            .filter(|l| l.remaining_quantity.unwrap_or(0) > 0)
            .cloned()
            .collect();
        Ok(parse_rows(rows, parse_lot))
    }

    async fn fetch_movements(
        &self,
        _ctx: &TenantContext,
        since: DateTime<Utc>,
    ) -> AppResult<Parsed<Movement>> {
        let rows: Vec<RawMovement> = self
            .data
            .lock()
            .unwrap()
            .movements
            .iter()
            .filter(|m| m.occurred_at.map_or(true, |at| at >= since))
            .cloned()
            .collect();
        Ok(parse_rows(rows, parse_movement))
    }

    async fn ping(&self) -> bool {
        !self.fail.load(Ordering::SeqCst)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
