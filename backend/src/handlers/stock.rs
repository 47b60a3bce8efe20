//! HTTP handlers for the stock dashboard endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{
    alert_items, apply_query, Language, PaginationMeta, SortKey, SortOrder, StockItem, StockQuery,
    StockStateFilter, StockSummary,
};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{STOCK_READ, STOCK_REFRESH};
use crate::middleware::CurrentUser;
use crate::services::LoadReport;
use crate::AppState;

/// Query string of `GET /stock`
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct StockQueryParams {
    #[validate(length(max = 200))]
    pub search: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub stock_state: Option<StockStateFilter>,
    pub sort_by: Option<SortKey>,
    pub order: Option<SortOrder>,
    pub page: Option<u32>,
    /// Force a new load cycle before answering
    pub refresh: bool,
    pub lang: Option<Language>,
}

impl StockQueryParams {
    pub fn to_query(&self) -> StockQuery {
        let defaults = StockQuery::default();
        StockQuery {
            search: self.search.clone(),
            category: self.category.clone(),
            location: self.location.clone(),
            stock_state: self.stock_state.unwrap_or(defaults.stock_state),
            sort_by: self.sort_by.unwrap_or(defaults.sort_by),
            order: self.order.unwrap_or(defaults.order),
            page: self.page.unwrap_or(defaults.page),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LanguageParams {
    pub lang: Option<Language>,
}

/// Classified item with its dashboard labels
#[derive(Debug, Serialize)]
pub struct StockRow {
    #[serde(flatten)]
    pub item: StockItem,
    pub status_label: &'static str,
    pub rotation_label: &'static str,
}

impl StockRow {
    fn new(item: StockItem, language: Language) -> Self {
        Self {
            status_label: item.status.label(language),
            rotation_label: item.rotation.label(language),
            item,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StockListResponse {
    pub data: Vec<StockRow>,
    pub pagination: PaginationMeta,
    pub summary: StockSummary,
    pub load: LoadReport,
}

#[derive(Debug, Serialize)]
pub struct StockAlertsResponse {
    pub data: Vec<StockRow>,
    pub total: usize,
    pub load: LoadReport,
}

/// List the tenant's classified stock, one page at a time
pub async fn list_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(params): Query<StockQueryParams>,
) -> AppResult<Json<StockListResponse>> {
    current_user.0.require(STOCK_READ)?;
    if params.refresh {
        current_user.0.require(STOCK_REFRESH)?;
    }
    params.validate()?;

    let ctx = current_user.0.tenant();
    let loaded = state.board.ensure_loaded(&ctx, params.refresh).await?;

    let language = params.lang.unwrap_or_default();
    let page = apply_query(&loaded.items, &params.to_query());

    Ok(Json(StockListResponse {
        data: page
            .data
            .into_iter()
            .map(|item| StockRow::new(item, language))
            .collect(),
        pagination: page.pagination,
        summary: StockSummary::from_items(&loaded.items),
        load: loaded.report.clone(),
    }))
}

/// Force a new load cycle for the tenant
pub async fn refresh_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<LoadReport>> {
    current_user.0.require(STOCK_REFRESH)?;

    let ctx = current_user.0.tenant();
    let loaded = state.board.refresh(&ctx).await?;
    Ok(Json(loaded.report.clone()))
}

/// Products needing a reorder, most severe first
pub async fn list_alerts(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(params): Query<LanguageParams>,
) -> AppResult<Json<StockAlertsResponse>> {
    current_user.0.require(STOCK_READ)?;

    let ctx = current_user.0.tenant();
    let loaded = state.board.ensure_loaded(&ctx, false).await?;
    let language = params.lang.unwrap_or_default();

    let data: Vec<StockRow> = alert_items(&loaded.items)
        .into_iter()
        .map(|item| StockRow::new(item, language))
        .collect();

    Ok(Json(StockAlertsResponse {
        total: data.len(),
        data,
        load: loaded.report.clone(),
    }))
}

/// Get one classified product
pub async fn get_stock_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<String>,
    Query(params): Query<LanguageParams>,
) -> AppResult<Json<StockRow>> {
    current_user.0.require(STOCK_READ)?;

    let ctx = current_user.0.tenant();
    let loaded = state.board.ensure_loaded(&ctx, false).await?;

    let item = loaded
        .items
        .iter()
        .find(|item| item.product_id == product_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Product {}", product_id)))?;

    Ok(Json(StockRow::new(item, params.lang.unwrap_or_default())))
}
