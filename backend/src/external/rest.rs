//! REST client for the backend-as-a-service data API
//!
//! Tables are read through the PostgREST interface of the hosted project.
//! Columns are aliased in the `select` parameter so each row deserializes
//! straight into the matching raw row type. The server caps every response,
//! so tables are read page by page in a stable order until the exact row
//! count reported in `Content-Range` has been received.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{header::CONTENT_RANGE, Client};
use shared::{
    parse_category_threshold, parse_json_rows, parse_lookup, parse_lot, parse_movement,
    parse_product, CategoryThreshold, LotBalance, Lookup, Movement, Parsed, Product,
    RawCategoryThreshold, RawLookup, RawLot, RawMovement, RawProduct, TenantContext,
};

use super::StockStore;
use crate::error::{AppError, AppResult};

const PRODUCT_SELECT: &str = "id,name:libelle_produit,code:code_cip,category_id:famille_id,\
location_id:rayon_id,purchase_price:prix_achat,sale_tariff:tarif_vente,\
lower_bound:stock_limite,upper_bound:stock_alerte";

/// Rows requested per page; servers with a lower cap return shorter pages
const PAGE_SIZE: usize = 1000;

/// Stock store backed by the hosted REST API
#[derive(Clone)]
pub struct RestStockStore {
    client: Client,
    api_key: String,
    base_url: String,
}

impl RestStockStore {
    /// Create a new RestStockStore for a project URL
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("REST client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
        })
    }

    /// Create a new RestStockStore with custom base URL (for testing)
    #[cfg(test)]
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }

    /// Build the request URL for a tenant-scoped table read
    fn table_url(&self, table: &str, select: &str, ctx: &TenantContext, filters: &[String]) -> String {
        let mut url = format!(
            "{}/{}?select={}&tenant_id=eq.{}",
            self.base_url, table, select, ctx.tenant_id
        );
        for filter in filters {
            url.push('&');
            url.push_str(filter);
        }
        url
    }

    /// Build the request URL for one page of a table read
    fn page_url(
        &self,
        table: &str,
        select: &str,
        ctx: &TenantContext,
        filters: &[String],
        offset: usize,
    ) -> String {
        format!(
            "{}&limit={}&offset={}",
            self.table_url(table, select, ctx, filters),
            PAGE_SIZE,
            offset
        )
    }

    /// Fetch all rows of a table as loose JSON values
    async fn get_rows(
        &self,
        table: &str,
        select: &str,
        ctx: &TenantContext,
        filters: &[String],
    ) -> AppResult<Vec<serde_json::Value>> {
        let mut rows = Vec::new();

        loop {
            let url = self.page_url(table, select, ctx, filters, rows.len());

            let response = self
                .client
                .get(&url)
                .header("apikey", &self.api_key)
                .header("Prefer", "count=exact")
                .bearer_auth(&self.api_key)
                .send()
                .await
                .map_err(|e| AppError::StoreUnavailable(format!("{} request failed: {}", table, e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::StoreUnavailable(format!(
                    "{} returned {} - {}",
                    table, status, body
                )));
            }

            let total = response
                .headers()
                .get(CONTENT_RANGE)
                .and_then(|value| value.to_str().ok())
                .and_then(content_range_total);

            let page: Vec<serde_json::Value> = response.json().await.map_err(|e| {
                AppError::StoreUnavailable(format!("Failed to parse {} rows: {}", table, e))
            })?;
            let received = page.len();
            rows.extend(page);

            if !needs_next_page(table, rows.len(), received, total)? {
                break;
            }
        }

        tracing::debug!(table, rows = rows.len(), "Fetched REST rows");
        Ok(rows)
    }
}

/// Total row count from a `Content-Range` header such as `0-999/2500`.
/// An unknown total (`*`) yields `None`.
fn content_range_total(header: &str) -> Option<usize> {
    let (_, total) = header.rsplit_once('/')?;
    total.trim().parse().ok()
}

/// Decide whether another page must be read after receiving `received`
/// rows, `collected` in total so far. A reported total that cannot be
/// reached is an error rather than a silently truncated table.
fn needs_next_page(
    table: &str,
    collected: usize,
    received: usize,
    total: Option<usize>,
) -> AppResult<bool> {
    match total {
        Some(total) if collected >= total => Ok(false),
        Some(total) if received == 0 => Err(AppError::StoreUnavailable(format!(
            "{} returned {} of {} rows",
            table, collected, total
        ))),
        Some(_) => Ok(true),
        None => Ok(received > 0),
    }
}

/// PostgREST timestamps filter on RFC 3339 with an explicit UTC offset
fn since_filter(since: DateTime<Utc>) -> String {
    format!(
        "date_mouvement=gte.{}",
        since
            .to_rfc3339_opts(SecondsFormat::Secs, true)
            .replace('+', "%2B")
    )
}

#[async_trait]
impl StockStore for RestStockStore {
    async fn fetch_products(&self, ctx: &TenantContext) -> AppResult<Parsed<Product>> {
        let rows = self
            .get_rows(
                "produits",
                PRODUCT_SELECT,
                ctx,
                &["is_active=eq.true".to_string(), "order=libelle_produit,id".to_string()],
            )
            .await?;
        Ok(parse_json_rows::<RawProduct, _, _>("produits", rows, parse_product))
    }

    async fn fetch_categories(&self, ctx: &TenantContext) -> AppResult<Parsed<Lookup>> {
        let rows = self
            .get_rows("familles", "id,label:libelle_famille", ctx, &["order=id".to_string()])
            .await?;
        Ok(parse_json_rows::<RawLookup, _, _>("familles", rows, |raw| {
            parse_lookup("familles", raw)
        }))
    }

    async fn fetch_locations(&self, ctx: &TenantContext) -> AppResult<Parsed<Lookup>> {
        let rows = self
            .get_rows("rayons", "id,label:libelle_rayon", ctx, &["order=id".to_string()])
            .await?;
        Ok(parse_json_rows::<RawLookup, _, _>("rayons", rows, |raw| {
            parse_lookup("rayons", raw)
        }))
    }

    async fn fetch_category_thresholds(
        &self,
        ctx: &TenantContext,
    ) -> AppResult<Parsed<CategoryThreshold>> {
        let rows = self
            .get_rows(
                "alert_thresholds_by_category",
                "category,threshold,enabled",
                ctx,
                &["enabled=eq.true".to_string(), "order=created_at,id".to_string()],
            )
            .await?;
        Ok(parse_json_rows::<RawCategoryThreshold, _, _>(
            "alert_thresholds_by_category",
            rows,
            parse_category_threshold,
        ))
    }

    async fn fetch_active_lots(&self, ctx: &TenantContext) -> AppResult<Parsed<LotBalance>> {
        let rows = self
            .get_rows(
                "lots",
                "product_id:produit_id,remaining_quantity:quantite_restante",
                ctx,
                &["quantite_restante=gt.0".to_string(), "order=id".to_string()],
            )
            .await?;
        Ok(parse_json_rows::<RawLot, _, _>("lots", rows, parse_lot))
    }

    async fn fetch_movements(
        &self,
        ctx: &TenantContext,
        since: DateTime<Utc>,
    ) -> AppResult<Parsed<Movement>> {
        let rows = self
            .get_rows(
                "mouvements_lots",
                "product_id:produit_id,kind:type_mouvement,quantity:quantite_mouvement,occurred_at:date_mouvement",
                ctx,
                &[since_filter(since), "order=id".to_string()],
            )
            .await?;
        Ok(parse_json_rows::<RawMovement, _, _>(
            "mouvements_lots",
            rows,
            parse_movement,
        ))
    }

    async fn ping(&self) -> bool {
        let url = format!("{}/", self.base_url);
        match self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!("REST store ping failed: {}", e);
                false
            }
        }
    }

    fn name(&self) -> &'static str {
        "rest"
    }
}
