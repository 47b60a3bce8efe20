//! Pharmacy Stock Dashboard - Backend Server
//!
//! Classifies each pharmacy's stock by status and rotation speed and serves
//! the filtered, sorted and paginated stock table to the dashboard.

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod external;
mod handlers;
mod middleware;
mod routes;
mod services;

pub use crate::config::Config;

use crate::config::StoreKind;
use external::{PgStockStore, RestStockStore, StockStore};
use services::{StockBoard, StockService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub board: StockBoard,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pharma_stock_server=debug,tower_http=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Pharmacy Stock Server");
    tracing::info!("Environment: {}", config.environment);

    let store = connect_store(&config).await?;
    tracing::info!("Using {} stock store", store.name());

    // Create application state
    let loader = StockService::new(store, config.stock.clone());
    let state = AppState {
        board: StockBoard::new(loader),
        config: Arc::new(config.clone()),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the configured stock store
async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn StockStore>> {
    match config.store.kind {
        StoreKind::Postgres => {
            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
                .connect(&config.database.url)
                .await?;

            tracing::info!("Database connection established");

            // Run migrations in development
            if config.environment == "development" {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(&db_pool).await?;
                tracing::info!("Migrations completed");
            }

            Ok(Arc::new(PgStockStore::new(db_pool)))
        }
        StoreKind::Rest => {
            if config.store.rest_url.is_empty() {
                anyhow::bail!("store.rest_url must be set for the REST stock store");
            }
            let store = RestStockStore::new(
                config.store.rest_url.clone(),
                config.store.api_key.clone(),
                Duration::from_secs(config.store.request_timeout_secs),
            )?;
            Ok(Arc::new(store))
        }
    }
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Pharmacy Stock Dashboard API v1.0"
}
