//! Route definitions for the pharmacy stock service

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - stock dashboard
        .nest("/stock", stock_routes(state))
}

/// Stock dashboard routes (protected)
fn stock_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_stock))
        .route("/refresh", post(handlers::refresh_stock))
        .route("/alerts", get(handlers::list_alerts))
        .route("/:product_id", get(handlers::get_stock_item))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
