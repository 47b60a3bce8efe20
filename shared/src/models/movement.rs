//! Stock movement models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kinds of lot movements recorded by the point of sale and the back office
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Goods received from a supplier ("entree", "reception")
    Receipt,
    /// Manual withdrawal ("sortie")
    Withdrawal,
    /// Counter sale ("vente")
    Sale,
    Adjustment,
    Transfer,
    Return,
    Other,
}

impl MovementKind {
    /// Map the store's free-text movement type onto a kind
    pub fn from_store(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "entree" | "entrée" | "reception" | "réception" => MovementKind::Receipt,
            "sortie" => MovementKind::Withdrawal,
            "vente" => MovementKind::Sale,
            "ajustement" => MovementKind::Adjustment,
            "transfert" => MovementKind::Transfer,
            "retour" => MovementKind::Return,
            _ => MovementKind::Other,
        }
    }

    pub fn is_outflow(&self) -> bool {
        matches!(self, MovementKind::Withdrawal | MovementKind::Sale)
    }

    pub fn is_inflow(&self) -> bool {
        matches!(self, MovementKind::Receipt)
    }
}

/// Movement row before parsing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMovement {
    pub product_id: Option<String>,
    pub kind: Option<String>,
    pub quantity: Option<i64>,
    pub occurred_at: Option<DateTime<Utc>>,
}

/// A parsed movement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Movement {
    pub product_id: String,
    pub kind: MovementKind,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Outflow and inflow totals of one product over the rotation window
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovementSummary {
    pub outflow: i64,
    pub inflow: i64,
}

impl MovementSummary {
    /// Fold one movement into the totals; kinds that are neither
    /// outflow-like nor inflow-like leave them untouched.
    pub fn record(&mut self, movement: &Movement) {
        if movement.kind.is_outflow() {
            self.outflow = self.outflow.saturating_add(movement.quantity);
        } else if movement.kind.is_inflow() {
            self.inflow = self.inflow.saturating_add(movement.quantity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movement(kind: MovementKind, quantity: i64) -> Movement {
        Movement {
            product_id: "p1".to_string(),
            kind,
            quantity,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn test_store_kinds_mapping() {
        assert_eq!(MovementKind::from_store("vente"), MovementKind::Sale);
        assert_eq!(MovementKind::from_store(" Sortie "), MovementKind::Withdrawal);
        assert_eq!(MovementKind::from_store("entree"), MovementKind::Receipt);
        assert_eq!(MovementKind::from_store("réception"), MovementKind::Receipt);
        assert_eq!(MovementKind::from_store("inventaire"), MovementKind::Other);
    }

    #[test]
    fn test_summary_ignores_neutral_kinds() {
        let mut summary = MovementSummary::default();
        summary.record(&movement(MovementKind::Sale, 10));
        summary.record(&movement(MovementKind::Withdrawal, 5));
        summary.record(&movement(MovementKind::Receipt, 40));
        summary.record(&movement(MovementKind::Adjustment, 99));
        summary.record(&movement(MovementKind::Transfer, 7));

        assert_eq!(summary, MovementSummary { outflow: 15, inflow: 40 });
    }

    #[test]
    fn test_summary_saturates() {
        let mut summary = MovementSummary::default();
        summary.record(&movement(MovementKind::Sale, i64::MAX));
        summary.record(&movement(MovementKind::Sale, 1));

        assert_eq!(summary.outflow, i64::MAX);
    }
}
