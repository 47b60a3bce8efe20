//! Stock posture classification
//!
//! Derives a status and a rotation category for every product from the
//! lot quantities, the configured thresholds and the trailing 30-day
//! movements. Results are recomputed on every load and never persisted.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CategoryThreshold, LotBalance, Lookup, Movement, MovementSummary, Product};
use crate::types::Language;

/// Product-level lower bound when "stock_limite" is unset
pub const DEFAULT_LOWER_BOUND: i64 = 0;
/// Product-level upper bound when "stock_alerte" is unset
pub const DEFAULT_UPPER_BOUND: i64 = 100;
/// Length of the movement window used for rotation
pub const ROTATION_WINDOW_DAYS: i64 = 30;
/// Velocity at or above which a product rotates fast
pub const FAST_VELOCITY: f64 = 2.0;
/// Velocity below which a product rotates slowly
pub const SLOW_VELOCITY: f64 = 0.5;

/// Stock status of a product
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    Normal,
    Low,
    Critical,
    OutOfStock,
    Overstock,
}

impl StockStatus {
    pub fn label(&self, language: Language) -> &'static str {
        match (self, language) {
            (StockStatus::Normal, _) => "Normal",
            (StockStatus::Low, Language::French) => "Faible",
            (StockStatus::Low, Language::English) => "Low",
            (StockStatus::Critical, Language::French) => "Critique",
            (StockStatus::Critical, Language::English) => "Critical",
            (StockStatus::OutOfStock, Language::French) => "Rupture",
            (StockStatus::OutOfStock, Language::English) => "Out of stock",
            (StockStatus::Overstock, Language::French) => "Surstock",
            (StockStatus::Overstock, Language::English) => "Overstock",
        }
    }

    /// Whether the status calls for reordering
    pub fn needs_attention(&self) -> bool {
        matches!(
            self,
            StockStatus::Low | StockStatus::Critical | StockStatus::OutOfStock
        )
    }

    /// Ordering key for alert listings, most severe first
    pub fn severity(&self) -> u8 {
        match self {
            StockStatus::OutOfStock => 0,
            StockStatus::Critical => 1,
            StockStatus::Low => 2,
            StockStatus::Overstock => 3,
            StockStatus::Normal => 4,
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label(Language::French))
    }
}

/// Rotation speed over the movement window
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    Fast,
    Normal,
    Slow,
}

impl Rotation {
    /// Sort ordinal: fast=3, normal=2, slow=1
    pub fn ordinal(&self) -> u8 {
        match self {
            Rotation::Fast => 3,
            Rotation::Normal => 2,
            Rotation::Slow => 1,
        }
    }

    pub fn label(&self, language: Language) -> &'static str {
        match (self, language) {
            (Rotation::Fast, Language::French) => "Rapide",
            (Rotation::Fast, Language::English) => "Fast",
            (Rotation::Normal, Language::French) => "Normale",
            (Rotation::Normal, Language::English) => "Normal",
            (Rotation::Slow, Language::French) => "Lente",
            (Rotation::Slow, Language::English) => "Slow",
        }
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label(Language::French))
    }
}

/// Which configuration produced the thresholds of a stock item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdSource {
    Category,
    Product,
    Default,
}

/// Fallback bounds for products without their own configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassifierDefaults {
    pub lower_bound: i64,
    pub upper_bound: i64,
}

impl Default for ClassifierDefaults {
    fn default() -> Self {
        Self {
            lower_bound: DEFAULT_LOWER_BOUND,
            upper_bound: DEFAULT_UPPER_BOUND,
        }
    }
}

/// Already-defaulted inputs for one product
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierInput {
    pub current_stock: i64,
    /// Present only when the category has an enabled threshold row
    pub category_threshold: Option<i64>,
    pub lower_bound: i64,
    pub upper_bound: i64,
    /// `None` when the product has no movement in the window
    pub movements: Option<MovementSummary>,
}

/// Status, rotation and the velocity behind it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub status: StockStatus,
    pub rotation: Rotation,
    pub velocity: f64,
}

/// `value <= limit * 0.5`, evaluated exactly on integers
fn at_most_half(value: i64, limit: i64) -> bool {
    value.saturating_mul(2) <= limit
}

/// Classify the stock status.
///
/// A category threshold, when configured, fully replaces the product's
/// lower bound; the upper bound still decides overstock.
pub fn classify_status(input: &ClassifierInput) -> StockStatus {
    let stock = input.current_stock;
    if stock == 0 {
        return StockStatus::OutOfStock;
    }

    match input.category_threshold {
        Some(threshold) => {
            if at_most_half(stock, threshold) {
                StockStatus::Critical
            } else if stock <= threshold {
                StockStatus::Low
            } else if stock >= input.upper_bound {
                StockStatus::Overstock
            } else {
                StockStatus::Normal
            }
        }
        None => {
            if stock <= input.lower_bound {
                if at_most_half(stock, input.lower_bound) {
                    StockStatus::Critical
                } else {
                    StockStatus::Low
                }
            } else if stock >= input.upper_bound {
                StockStatus::Overstock
            } else {
                StockStatus::Normal
            }
        }
    }
}

/// Ratio of window outflow to average stock level.
///
/// The opening stock is reconstructed as `current + outflow - inflow`.
/// A non-positive average yields 0.
pub fn rotation_velocity(current_stock: i64, movements: MovementSummary) -> f64 {
    let opening = current_stock
        .saturating_add(movements.outflow)
        .saturating_sub(movements.inflow);
    let average = (opening as f64 + current_stock as f64) / 2.0;
    if average > 0.0 && movements.outflow > 0 {
        let velocity = movements.outflow as f64 / average;
        if velocity.is_finite() {
            return velocity;
        }
    }
    0.0
}

/// Classify rotation speed, returning the velocity used
pub fn classify_rotation(current_stock: i64, movements: Option<MovementSummary>) -> (Rotation, f64) {
    match movements {
        Some(summary) if current_stock > 0 => {
            let velocity = rotation_velocity(current_stock, summary);
            let rotation = if velocity >= FAST_VELOCITY {
                Rotation::Fast
            } else if velocity < SLOW_VELOCITY {
                Rotation::Slow
            } else {
                Rotation::Normal
            };
            (rotation, velocity)
        }
        // Zero stock never reaches the velocity branch and stays normal,
        // even with an all-zero outflow record.
        _ => (Rotation::Normal, 0.0),
    }
}

/// Full classification of one product
pub fn classify(input: &ClassifierInput) -> Classification {
    let (rotation, velocity) = classify_rotation(input.current_stock, input.movements);
    Classification {
        status: classify_status(input),
        rotation,
        velocity,
    }
}

/// One product's point-in-time stock posture
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockItem {
    pub product_id: String,
    pub name: String,
    pub code: String,
    pub category_id: Option<String>,
    pub category_label: Option<String>,
    pub location_id: Option<String>,
    pub location_label: Option<String>,
    pub current_stock: i64,
    pub purchase_price: Decimal,
    pub sale_tariff: Decimal,
    pub stock_value: Decimal,
    pub lower_threshold: i64,
    pub upper_threshold: i64,
    pub threshold_source: ThresholdSource,
    pub status: StockStatus,
    pub rotation: Rotation,
    pub velocity: f64,
    pub movements: Option<MovementSummary>,
}

/// Parsed rows of one load cycle for one tenant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub products: Vec<Product>,
    pub categories: Vec<Lookup>,
    pub locations: Vec<Lookup>,
    pub thresholds: Vec<CategoryThreshold>,
    pub lots: Vec<LotBalance>,
    pub movements: Vec<Movement>,
}

impl StockSnapshot {
    /// Enabled threshold per category; the first enabled row wins
    pub fn category_thresholds(&self) -> HashMap<&str, i64> {
        let mut map = HashMap::new();
        for row in self.thresholds.iter().filter(|t| t.enabled) {
            map.entry(row.category.as_str()).or_insert(row.threshold);
        }
        map
    }

    /// Sum of remaining quantity over active lots, per product
    pub fn stock_by_product(&self) -> HashMap<&str, i64> {
        let mut map: HashMap<&str, i64> = HashMap::new();
        for lot in self.lots.iter().filter(|l| l.is_active()) {
            let total = map.entry(lot.product_id.as_str()).or_default();
            *total = total.saturating_add(lot.remaining_quantity);
        }
        map
    }

    /// Outflow/inflow totals per product with at least one outflow-like or
    /// inflow-like movement. Other kinds do not count as movement history.
    pub fn movements_by_product(&self) -> HashMap<&str, MovementSummary> {
        let mut map: HashMap<&str, MovementSummary> = HashMap::new();
        for movement in self
            .movements
            .iter()
            .filter(|m| m.kind.is_outflow() || m.kind.is_inflow())
        {
            map.entry(movement.product_id.as_str())
                .or_default()
                .record(movement);
        }
        map
    }
}

/// Aggregate the snapshot and classify every product, in product order
pub fn build_stock_items(snapshot: &StockSnapshot, defaults: &ClassifierDefaults) -> Vec<StockItem> {
    let thresholds = snapshot.category_thresholds();
    let stock = snapshot.stock_by_product();
    let movements = snapshot.movements_by_product();
    let categories: HashMap<&str, &str> = snapshot
        .categories
        .iter()
        .map(|c| (c.id.as_str(), c.label.as_str()))
        .collect();
    let locations: HashMap<&str, &str> = snapshot
        .locations
        .iter()
        .map(|l| (l.id.as_str(), l.label.as_str()))
        .collect();

    snapshot
        .products
        .iter()
        .map(|product| {
            let current_stock = stock.get(product.id.as_str()).copied().unwrap_or(0).max(0);
            let category_threshold = product
                .category_id
                .as_deref()
                .and_then(|c| thresholds.get(c).copied());
            let lower_bound = product.lower_bound.unwrap_or(defaults.lower_bound);
            let upper_bound = product.upper_bound.unwrap_or(defaults.upper_bound);
            let product_movements = movements.get(product.id.as_str()).copied();

            let input = ClassifierInput {
                current_stock,
                category_threshold,
                lower_bound,
                upper_bound,
                movements: product_movements,
            };
            let classification = classify(&input);

            let threshold_source = if category_threshold.is_some() {
                ThresholdSource::Category
            } else if product.lower_bound.is_some() || product.upper_bound.is_some() {
                ThresholdSource::Product
            } else {
                ThresholdSource::Default
            };

            StockItem {
                product_id: product.id.clone(),
                name: product.name.clone(),
                code: product.code.clone(),
                category_id: product.category_id.clone(),
                category_label: product
                    .category_id
                    .as_deref()
                    .and_then(|c| categories.get(c))
                    .map(|l| l.to_string()),
                location_id: product.location_id.clone(),
                location_label: product
                    .location_id
                    .as_deref()
                    .and_then(|l| locations.get(l))
                    .map(|l| l.to_string()),
                current_stock,
                purchase_price: product.purchase_price,
                sale_tariff: product.sale_tariff,
                stock_value: Decimal::from(current_stock) * product.purchase_price,
                lower_threshold: category_threshold.unwrap_or(lower_bound),
                upper_threshold: upper_bound,
                threshold_source,
                status: classification.status,
                rotation: classification.rotation,
                velocity: classification.velocity,
                movements: product_movements,
            }
        })
        .collect()
}
