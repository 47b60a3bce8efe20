//! Lot models

use serde::{Deserialize, Serialize};

/// Lot row before parsing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLot {
    pub product_id: Option<String>,
    /// "quantite_restante"
    pub remaining_quantity: Option<i64>,
}

/// Remaining quantity of one received batch of a product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LotBalance {
    pub product_id: String,
    pub remaining_quantity: i64,
}

impl LotBalance {
    /// Lots that still hold stock count towards the product's current stock
    pub fn is_active(&self) -> bool {
        self.remaining_quantity > 0
    }
}
