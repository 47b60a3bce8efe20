//! External store integrations
//!
//! The stock dashboard never owns its data: products, lots, movements and
//! thresholds are read from the tenant's store, either straight from
//! Postgres or through the backend-as-a-service REST interface.

pub mod postgres;
pub mod rest;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{CategoryThreshold, LotBalance, Lookup, Movement, Parsed, Product, TenantContext};

use crate::error::AppResult;

pub use postgres::PgStockStore;
pub use rest::RestStockStore;

/// Read-only, tenant-scoped access to the rows the classifier needs.
///
/// Implementations parse rows at the boundary: malformed rows come back in
/// [`Parsed::rejected`], transport failures as errors.
#[async_trait]
pub trait StockStore: Send + Sync {
    async fn fetch_products(&self, ctx: &TenantContext) -> AppResult<Parsed<Product>>;

    async fn fetch_categories(&self, ctx: &TenantContext) -> AppResult<Parsed<Lookup>>;

    async fn fetch_locations(&self, ctx: &TenantContext) -> AppResult<Parsed<Lookup>>;

    async fn fetch_category_thresholds(
        &self,
        ctx: &TenantContext,
    ) -> AppResult<Parsed<CategoryThreshold>>;

    /// Lots with a remaining quantity above zero
    async fn fetch_active_lots(&self, ctx: &TenantContext) -> AppResult<Parsed<LotBalance>>;

    /// Movements recorded at or after `since`
    async fn fetch_movements(
        &self,
        ctx: &TenantContext,
        since: DateTime<Utc>,
    ) -> AppResult<Parsed<Movement>>;

    /// Connectivity check for the health endpoint
    async fn ping(&self) -> bool;

    /// Short name for logs
    fn name(&self) -> &'static str;
}
