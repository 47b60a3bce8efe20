//! Boundary parsing for rows coming from the external store
//!
//! Raw rows are loosely typed. Each is either turned into its typed
//! counterpart or rejected with a [`RowError`]; nothing downstream sees an
//! unset identifier. Missing quantities become zero, negative quantities
//! are clamped to zero, and missing or negative thresholds are left unset
//! so the classifier defaults apply.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::{
    CategoryThreshold, LotBalance, Lookup, Movement, MovementKind, Product, RawCategoryThreshold,
    RawLookup, RawLot, RawMovement, RawProduct,
};

/// Why a row was rejected at the boundary
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("{table}: missing required field `{field}`")]
    MissingField {
        table: &'static str,
        field: &'static str,
    },

    #[error("{table}: field `{field}` must not be negative (got {value})")]
    Negative {
        table: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{table}: malformed row: {reason}")]
    Malformed { table: &'static str, reason: String },
}

/// Rows that survived parsing, plus the rejections
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub rows: Vec<T>,
    pub rejected: Vec<RowError>,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

// ============================================================================
// Field helpers
// ============================================================================

fn required_text(
    table: &'static str,
    field: &'static str,
    value: Option<String>,
) -> Result<String, RowError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(RowError::MissingField { table, field }),
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn price(table: &'static str, field: &'static str, value: Option<Decimal>) -> Result<Decimal, RowError> {
    let value = value.unwrap_or(Decimal::ZERO);
    if value < Decimal::ZERO {
        return Err(RowError::Negative {
            table,
            field,
            value: value.to_string(),
        });
    }
    Ok(value)
}

/// Null quantities read as zero, negatives are clamped
pub fn clamp_quantity(value: Option<i64>) -> i64 {
    value.unwrap_or(0).max(0)
}

/// Null or negative thresholds read as unset
pub fn threshold_or_unset(value: Option<i64>) -> Option<i64> {
    value.filter(|v| *v >= 0)
}

// ============================================================================
// Row parsers
// ============================================================================

pub fn parse_product(raw: RawProduct) -> Result<Product, RowError> {
    const TABLE: &str = "produits";
    let id = required_text(TABLE, "id", raw.id)?;
    let name = required_text(TABLE, "name", raw.name)?;

    Ok(Product {
        id,
        name,
        code: optional_text(raw.code).unwrap_or_default(),
        category_id: optional_text(raw.category_id),
        location_id: optional_text(raw.location_id),
        purchase_price: price(TABLE, "purchase_price", raw.purchase_price)?,
        sale_tariff: price(TABLE, "sale_tariff", raw.sale_tariff)?,
        lower_bound: threshold_or_unset(raw.lower_bound),
        upper_bound: threshold_or_unset(raw.upper_bound),
    })
}

pub fn parse_lookup(table: &'static str, raw: RawLookup) -> Result<Lookup, RowError> {
    let id = required_text(table, "id", raw.id)?;
    let label = optional_text(raw.label).unwrap_or_else(|| id.clone());
    Ok(Lookup { id, label })
}

/// Thresholds without a usable value are rejected: an enabled row with no
/// quantity cannot override anything.
pub fn parse_category_threshold(raw: RawCategoryThreshold) -> Result<CategoryThreshold, RowError> {
    const TABLE: &str = "alert_thresholds_by_category";
    let category = required_text(TABLE, "category", raw.category)?;
    let threshold = threshold_or_unset(raw.threshold).ok_or(RowError::MissingField {
        table: TABLE,
        field: "threshold",
    })?;

    Ok(CategoryThreshold {
        category,
        threshold,
        enabled: raw.enabled.unwrap_or(false),
    })
}

pub fn parse_lot(raw: RawLot) -> Result<LotBalance, RowError> {
    const TABLE: &str = "lots";
    Ok(LotBalance {
        product_id: required_text(TABLE, "product_id", raw.product_id)?,
        remaining_quantity: clamp_quantity(raw.remaining_quantity),
    })
}

pub fn parse_movement(raw: RawMovement) -> Result<Movement, RowError> {
    const TABLE: &str = "mouvements_lots";
    let product_id = required_text(TABLE, "product_id", raw.product_id)?;
    let kind = required_text(TABLE, "kind", raw.kind)?;
    let occurred_at = raw.occurred_at.ok_or(RowError::MissingField {
        table: TABLE,
        field: "occurred_at",
    })?;

    Ok(Movement {
        product_id,
        kind: MovementKind::from_store(&kind),
        quantity: clamp_quantity(raw.quantity),
        occurred_at,
    })
}

// ============================================================================
// Batch helpers
// ============================================================================

/// Parse already-shaped raw rows, keeping the rejections
pub fn parse_rows<R, T, F>(rows: Vec<R>, parse: F) -> Parsed<T>
where
    F: Fn(R) -> Result<T, RowError>,
{
    rows.into_iter().fold(Parsed::default(), |mut acc, row| {
        match parse(row) {
            Ok(parsed) => acc.rows.push(parsed),
            Err(err) => acc.rejected.push(err),
        }
        acc
    })
}

/// Parse untyped JSON rows one by one so a single bad row does not fail
/// the whole result set.
pub fn parse_json_rows<R, T, F>(table: &'static str, rows: Vec<serde_json::Value>, parse: F) -> Parsed<T>
where
    R: DeserializeOwned,
    F: Fn(R) -> Result<T, RowError>,
{
    parse_rows(rows, |value| {
        let raw: R = serde_json::from_value(value).map_err(|e| RowError::Malformed {
            table,
            reason: e.to_string(),
        })?;
        parse(raw)
    })
}
