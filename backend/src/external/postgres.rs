//! Postgres-backed stock store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    parse_category_threshold, parse_lookup, parse_lot, parse_movement, parse_product, parse_rows,
    CategoryThreshold, LotBalance, Lookup, Movement, Parsed, Product, RawCategoryThreshold,
    RawLookup, RawLot, RawMovement, RawProduct, TenantContext,
};
use sqlx::{FromRow, PgPool};

use super::StockStore;
use crate::error::AppResult;

/// Stock store reading the tenant tables directly
#[derive(Clone)]
pub struct PgStockStore {
    db: PgPool,
}

/// Row for product query
#[derive(Debug, FromRow)]
struct ProductRecord {
    id: Option<String>,
    name: Option<String>,
    code: Option<String>,
    category_id: Option<String>,
    location_id: Option<String>,
    purchase_price: Option<Decimal>,
    sale_tariff: Option<Decimal>,
    lower_bound: Option<i64>,
    upper_bound: Option<i64>,
}

impl From<ProductRecord> for RawProduct {
    fn from(r: ProductRecord) -> Self {
        RawProduct {
            id: r.id,
            name: r.name,
            code: r.code,
            category_id: r.category_id,
            location_id: r.location_id,
            purchase_price: r.purchase_price,
            sale_tariff: r.sale_tariff,
            lower_bound: r.lower_bound,
            upper_bound: r.upper_bound,
        }
    }
}

/// Row for threshold query
#[derive(Debug, FromRow)]
struct ThresholdRecord {
    category: Option<String>,
    threshold: Option<i64>,
    enabled: Option<bool>,
}

/// Row for movement query
#[derive(Debug, FromRow)]
struct MovementRecord {
    product_id: Option<String>,
    kind: Option<String>,
    quantity: Option<i64>,
    occurred_at: Option<DateTime<Utc>>,
}

impl PgStockStore {
    /// Create a new PgStockStore instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn fetch_lookup(
        &self,
        table: &'static str,
        sql: &'static str,
        ctx: &TenantContext,
    ) -> AppResult<Parsed<Lookup>> {
        let rows = sqlx::query_as::<_, (Option<String>, Option<String>)>(sql)
            .bind(ctx.tenant_id)
            .fetch_all(&self.db)
            .await?;

        Ok(parse_rows(rows, |(id, label)| {
            parse_lookup(table, RawLookup { id, label })
        }))
    }
}

#[async_trait]
impl StockStore for PgStockStore {
    async fn fetch_products(&self, ctx: &TenantContext) -> AppResult<Parsed<Product>> {
        let rows = sqlx::query_as::<_, ProductRecord>(
            r#"
            SELECT id::text AS id,
                   libelle_produit AS name,
                   code_cip AS code,
                   famille_id::text AS category_id,
                   rayon_id::text AS location_id,
                   prix_achat AS purchase_price,
                   tarif_vente AS sale_tariff,
                   stock_limite::bigint AS lower_bound,
                   stock_alerte::bigint AS upper_bound
            FROM produits
            WHERE tenant_id = $1 AND is_active = true
            ORDER BY libelle_produit
            "#,
        )
        .bind(ctx.tenant_id)
        .fetch_all(&self.db)
        .await?;

        Ok(parse_rows(rows, |r| parse_product(r.into())))
    }

    async fn fetch_categories(&self, ctx: &TenantContext) -> AppResult<Parsed<Lookup>> {
        self.fetch_lookup(
            "familles",
            "SELECT id::text, libelle_famille FROM familles WHERE tenant_id = $1",
            ctx,
        )
        .await
    }

    async fn fetch_locations(&self, ctx: &TenantContext) -> AppResult<Parsed<Lookup>> {
        self.fetch_lookup(
            "rayons",
            "SELECT id::text, libelle_rayon FROM rayons WHERE tenant_id = $1",
            ctx,
        )
        .await
    }

    async fn fetch_category_thresholds(
        &self,
        ctx: &TenantContext,
    ) -> AppResult<Parsed<CategoryThreshold>> {
        let rows = sqlx::query_as::<_, ThresholdRecord>(
            r#"
            SELECT category, threshold::bigint AS threshold, enabled
            FROM alert_thresholds_by_category
            WHERE tenant_id = $1 AND enabled = true
            ORDER BY created_at
            "#,
        )
        .bind(ctx.tenant_id)
        .fetch_all(&self.db)
        .await?;

        Ok(parse_rows(rows, |r| {
            parse_category_threshold(RawCategoryThreshold {
                category: r.category,
                threshold: r.threshold,
                enabled: r.enabled,
            })
        }))
    }

    async fn fetch_active_lots(&self, ctx: &TenantContext) -> AppResult<Parsed<LotBalance>> {
        let rows = sqlx::query_as::<_, (Option<String>, Option<i64>)>(
            r#"
            SELECT produit_id::text, quantite_restante::bigint
            FROM lots
            WHERE tenant_id = $1 AND quantite_restante > 0
            "#,
        )
        .bind(ctx.tenant_id)
        .fetch_all(&self.db)
        .await?;

        Ok(parse_rows(rows, |(product_id, remaining_quantity)| {
            parse_lot(RawLot {
                product_id,
                remaining_quantity,
            })
        }))
    }

    async fn fetch_movements(
        &self,
        ctx: &TenantContext,
        since: DateTime<Utc>,
    ) -> AppResult<Parsed<Movement>> {
        let rows = sqlx::query_as::<_, MovementRecord>(
            r#"
            SELECT produit_id::text AS product_id,
                   type_mouvement AS kind,
                   quantite_mouvement::bigint AS quantity,
                   date_mouvement AS occurred_at
            FROM mouvements_lots
            WHERE tenant_id = $1 AND date_mouvement >= $2
            "#,
        )
        .bind(ctx.tenant_id)
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        Ok(parse_rows(rows, |r| {
            parse_movement(RawMovement {
                product_id: r.product_id,
                kind: r.kind,
                quantity: r.quantity,
                occurred_at: r.occurred_at,
            })
        }))
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.db).await.is_ok()
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
