//! Product catalogue rows and lookup tables

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product row as returned by the external store, before parsing.
///
/// Every field is optional: the store gives no guarantee on shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProduct {
    pub id: Option<String>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub category_id: Option<String>,
    pub location_id: Option<String>,
    pub purchase_price: Option<Decimal>,
    pub sale_tariff: Option<Decimal>,
    /// Product-level "stock_limite"
    pub lower_bound: Option<i64>,
    /// Product-level "stock_alerte"
    pub upper_bound: Option<i64>,
}

/// A parsed product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub code: String,
    pub category_id: Option<String>,
    pub location_id: Option<String>,
    pub purchase_price: Decimal,
    pub sale_tariff: Decimal,
    /// `None` when unset; the classifier default applies
    pub lower_bound: Option<i64>,
    /// `None` when unset; the classifier default applies
    pub upper_bound: Option<i64>,
}

/// Category ("famille") or location ("rayon") row before parsing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLookup {
    pub id: Option<String>,
    pub label: Option<String>,
}

/// Id/label pair for categories and locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lookup {
    pub id: String,
    pub label: String,
}
