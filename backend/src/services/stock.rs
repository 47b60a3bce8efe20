//! Stock snapshot loader
//!
//! Fetches every row set a tenant's stock table needs, concurrently, and
//! classifies the products once all fetches have succeeded.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use shared::{build_stock_items, Parsed, RowError, StockItem, StockSnapshot, TenantContext};
use uuid::Uuid;

use crate::config::StockConfig;
use crate::error::AppResult;
use crate::external::StockStore;

/// Loader for classified stock snapshots
#[derive(Clone)]
pub struct StockService {
    store: Arc<dyn StockStore>,
    settings: StockConfig,
}

/// Metadata about one completed load cycle
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LoadReport {
    pub tenant_id: Uuid,
    pub store: &'static str,
    pub products: usize,
    pub categories: usize,
    pub locations: usize,
    pub thresholds: usize,
    pub lots: usize,
    pub movements: usize,
    pub rejected_rows: usize,
    pub movements_since: DateTime<Utc>,
    pub loaded_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Classified stock for one tenant
#[derive(Debug, Clone)]
pub struct LoadedStock {
    pub items: Vec<StockItem>,
    pub report: LoadReport,
}

fn log_rejections(ctx: &TenantContext, rejected: &[RowError]) {
    for error in rejected {
        tracing::warn!(tenant_id = %ctx.tenant_id, "Skipping stock row: {}", error);
    }
}

/// Keep the good rows, log the rejected ones and count them
fn accept<T>(ctx: &TenantContext, parsed: Parsed<T>, rejected_rows: &mut usize) -> Vec<T> {
    log_rejections(ctx, &parsed.rejected);
    *rejected_rows += parsed.rejected.len();
    parsed.rows
}

impl StockService {
    pub fn new(store: Arc<dyn StockStore>, settings: StockConfig) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &Arc<dyn StockStore> {
        &self.store
    }

    /// Start of the rotation window for a load starting at `now`
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.settings.rotation_window_days.max(0))
    }

    /// Run one load cycle. Any failed fetch fails the whole cycle.
    pub async fn load(&self, ctx: &TenantContext) -> AppResult<LoadedStock> {
        let started = Instant::now();
        let since = self.window_start(Utc::now());

        tracing::debug!(
            tenant_id = %ctx.tenant_id,
            store = self.store.name(),
            "Loading stock snapshot"
        );

        let (products, categories, locations, thresholds, lots, movements) = tokio::try_join!(
            self.store.fetch_products(ctx),
            self.store.fetch_categories(ctx),
            self.store.fetch_locations(ctx),
            self.store.fetch_category_thresholds(ctx),
            self.store.fetch_active_lots(ctx),
            self.store.fetch_movements(ctx, since),
        )?;

        let mut rejected_rows = 0;
        let snapshot = StockSnapshot {
            products: accept(ctx, products, &mut rejected_rows),
            categories: accept(ctx, categories, &mut rejected_rows),
            locations: accept(ctx, locations, &mut rejected_rows),
            thresholds: accept(ctx, thresholds, &mut rejected_rows),
            lots: accept(ctx, lots, &mut rejected_rows),
            movements: accept(ctx, movements, &mut rejected_rows),
        };

        let items = build_stock_items(&snapshot, &self.settings.classifier_defaults());

        let report = LoadReport {
            tenant_id: ctx.tenant_id,
            store: self.store.name(),
            products: snapshot.products.len(),
            categories: snapshot.categories.len(),
            locations: snapshot.locations.len(),
            thresholds: snapshot.thresholds.len(),
            lots: snapshot.lots.len(),
            movements: snapshot.movements.len(),
            rejected_rows,
            movements_since: since,
            loaded_at: Utc::now(),
            duration_ms: started.elapsed().as_millis() as u64,
        };

        tracing::info!(
            tenant_id = %ctx.tenant_id,
            products = report.products,
            lots = report.lots,
            movements = report.movements,
            rejected_rows = report.rejected_rows,
            duration_ms = report.duration_ms,
            "Stock snapshot loaded"
        );

        Ok(LoadedStock { items, report })
    }
}
