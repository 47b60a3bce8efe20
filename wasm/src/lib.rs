//! WebAssembly module for the pharmacy stock dashboard
//!
//! Provides client-side computation for:
//! - Stock status and rotation classification
//! - Filtering, sorting and paging of the stock table
//! - Dashboard summary counters and reorder alerts
//! - Search input debouncing

use chrono::{DateTime, TimeZone, Utc};
use serde::{de::DeserializeOwned, Serialize};
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::pipeline::*;
pub use shared::types::*;

fn language(code: &str) -> Language {
    match code.trim().to_lowercase().as_str() {
        "en" | "english" => Language::English,
        _ => Language::French,
    }
}

fn from_json<T: DeserializeOwned>(what: &str, json: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(|e| {
        let message = format!("Invalid {} JSON: {}", what, e);
        #[cfg(target_arch = "wasm32")]
        web_sys::console::warn_1(&JsValue::from_str(&message));
        JsValue::from_str(&message)
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn millis(ms: f64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms as i64)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Classify stock status, returning its dashboard label
#[wasm_bindgen]
pub fn classify_stock_status(
    current_stock: i32,
    category_threshold: Option<i32>,
    lower_bound: i32,
    upper_bound: i32,
    lang: &str,
) -> String {
    let input = ClassifierInput {
        current_stock: i64::from(current_stock.max(0)),
        category_threshold: category_threshold.map(i64::from),
        lower_bound: i64::from(lower_bound),
        upper_bound: i64::from(upper_bound),
        movements: None,
    };
    classify_status(&input).label(language(lang)).to_string()
}

/// 30-day rotation velocity from window totals
#[wasm_bindgen]
pub fn stock_rotation_velocity(current_stock: i32, outflow: i32, inflow: i32) -> f64 {
    rotation_velocity(
        i64::from(current_stock.max(0)),
        MovementSummary {
            outflow: i64::from(outflow.max(0)),
            inflow: i64::from(inflow.max(0)),
        },
    )
}

/// Classify rotation speed, returning its dashboard label.
///
/// Pass no totals for a product without movement history.
#[wasm_bindgen]
pub fn classify_stock_rotation(
    current_stock: i32,
    outflow: Option<i32>,
    inflow: Option<i32>,
    lang: &str,
) -> String {
    let movements = match (outflow, inflow) {
        (None, None) => None,
        (outflow, inflow) => Some(MovementSummary {
            outflow: i64::from(outflow.unwrap_or(0).max(0)),
            inflow: i64::from(inflow.unwrap_or(0).max(0)),
        }),
    };
    let (rotation, _) = classify_rotation(i64::from(current_stock.max(0)), movements);
    rotation.label(language(lang)).to_string()
}

/// Filter, sort and page classified items.
///
/// Takes a JSON array of stock items and a JSON stock query; returns a
/// JSON page with its pagination metadata.
#[wasm_bindgen]
pub fn query_stock(items_json: &str, query_json: &str) -> Result<String, JsValue> {
    let items: Vec<StockItem> = from_json("stock items", items_json)?;
    let query: StockQuery = from_json("stock query", query_json)?;
    to_json(&apply_query(&items, &query))
}

/// Dashboard counters for classified items
#[wasm_bindgen]
pub fn summarize_stock(items_json: &str) -> Result<String, JsValue> {
    let items: Vec<StockItem> = from_json("stock items", items_json)?;
    to_json(&StockSummary::from_items(&items))
}

/// Items needing a reorder, most severe first
#[wasm_bindgen]
pub fn stock_alerts(items_json: &str) -> Result<String, JsValue> {
    let items: Vec<StockItem> = from_json("stock items", items_json)?;
    to_json(&alert_items(&items))
}

/// Debounced search box state for the stock toolbar
#[wasm_bindgen]
pub struct SearchDebouncer {
    inner: shared::Debouncer<String>,
}

#[wasm_bindgen]
impl SearchDebouncer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> SearchDebouncer {
        SearchDebouncer {
            inner: shared::Debouncer::for_search(),
        }
    }

    /// Record a keystroke at the current time
    pub fn push(&mut self, value: String) {
        self.push_at(value, js_sys::Date::now());
    }

    /// Settled search term, if the window elapsed since the last keystroke
    pub fn poll(&mut self) -> Option<String> {
        self.poll_at(js_sys::Date::now())
    }

    /// Record a keystroke at `now_ms` (milliseconds since the epoch)
    pub fn push_at(&mut self, value: String, now_ms: f64) {
        self.inner.push(value, millis(now_ms));
    }

    pub fn poll_at(&mut self, now_ms: f64) -> Option<String> {
        self.inner.poll(millis(now_ms))
    }

    /// Milliseconds since the epoch at which the pending term settles
    pub fn deadline_ms(&self) -> Option<f64> {
        self.inner
            .deadline()
            .map(|deadline| deadline.timestamp_millis() as f64)
    }

    pub fn is_pending(&self) -> bool {
        self.inner.is_pending()
    }
}

impl Default for SearchDebouncer {
    fn default() -> Self {
        Self::new()
    }
}
