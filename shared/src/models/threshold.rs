//! Category alert thresholds

use serde::{Deserialize, Serialize};

/// Row of "alert_thresholds_by_category" before parsing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCategoryThreshold {
    pub category: Option<String>,
    pub threshold: Option<i64>,
    pub enabled: Option<bool>,
}

/// Alert quantity configured for a product category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryThreshold {
    pub category: String,
    pub threshold: i64,
    pub enabled: bool,
}
