//! Filter, sort and paginate classified stock
//!
//! Pure in-memory transform producing the exact slice the stock table
//! renders for a given filter/sort/page state.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{StockItem, StockStatus};
use crate::types::{PaginatedResponse, PaginationMeta};

/// Rows per page of the stock table
pub const STOCK_PAGE_SIZE: u32 = 50;

/// Category/location filter value that disables the filter
pub const ALL: &str = "all";

/// Stock-state filter of the table toolbar
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StockStateFilter {
    #[default]
    All,
    /// Any stock on hand
    Available,
    Low,
    Out,
    Critical,
}

impl StockStateFilter {
    pub fn matches(&self, item: &StockItem) -> bool {
        match self {
            StockStateFilter::All => true,
            StockStateFilter::Available => item.current_stock > 0,
            StockStateFilter::Low => item.status == StockStatus::Low,
            StockStateFilter::Out => item.status == StockStatus::OutOfStock,
            StockStateFilter::Critical => item.status == StockStatus::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Name,
    Quantity,
    Value,
    Rotation,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Filter, sort and page state of the stock table
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
#[serde(default)]
pub struct StockQuery {
    /// Settled search term, matched against name and code
    #[validate(length(max = 200))]
    pub search: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub stock_state: StockStateFilter,
    pub sort_by: SortKey,
    pub order: SortOrder,
    /// 1-indexed
    pub page: u32,
}

impl Default for StockQuery {
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            location: None,
            stock_state: StockStateFilter::All,
            sort_by: SortKey::Name,
            order: SortOrder::Asc,
            page: 1,
        }
    }
}

fn selects(filter: &Option<String>, value: &Option<String>) -> bool {
    match filter.as_deref().map(str::trim) {
        None | Some("") | Some(ALL) => true,
        Some(wanted) => value.as_deref() == Some(wanted),
    }
}

fn matches_search(item: &StockItem, needle: &str) -> bool {
    item.name.to_lowercase().contains(needle) || item.code.to_lowercase().contains(needle)
}

impl StockQuery {
    /// True when the item passes every active filter
    pub fn matches(&self, item: &StockItem) -> bool {
        let search_ok = match self.search.as_deref() {
            Some(term) if !term.trim().is_empty() => matches_search(item, &term.to_lowercase()),
            _ => true,
        };

        search_ok
            && selects(&self.category, &item.category_id)
            && selects(&self.location, &item.location_id)
            && self.stock_state.matches(item)
    }
}

/// Fold case and French diacritics so "Éfferalgan" sorts next to "efferalgan"
pub fn collation_key(value: &str) -> String {
    let mut key = String::with_capacity(value.len());
    for c in value.chars().flat_map(char::to_lowercase) {
        match c {
            'à' | 'â' | 'ä' | 'á' | 'ã' => key.push('a'),
            'é' | 'è' | 'ê' | 'ë' => key.push('e'),
            'î' | 'ï' | 'í' | 'ì' => key.push('i'),
            'ô' | 'ö' | 'ó' | 'ò' | 'õ' => key.push('o'),
            'ù' | 'û' | 'ü' | 'ú' => key.push('u'),
            'ç' => key.push('c'),
            'ÿ' => key.push('y'),
            'ñ' => key.push('n'),
            'œ' => key.push_str("oe"),
            'æ' => key.push_str("ae"),
            other => key.push(other),
        }
    }
    key
}

fn compare(key: SortKey, a: &StockItem, b: &StockItem) -> Ordering {
    match key {
        SortKey::Name => collation_key(&a.name)
            .cmp(&collation_key(&b.name))
            .then_with(|| a.name.cmp(&b.name)),
        SortKey::Quantity => a.current_stock.cmp(&b.current_stock),
        SortKey::Value => a.stock_value.cmp(&b.stock_value),
        SortKey::Rotation => a.rotation.ordinal().cmp(&b.rotation.ordinal()),
    }
}

pub fn filter_items(items: &[StockItem], query: &StockQuery) -> Vec<StockItem> {
    items.iter().filter(|item| query.matches(item)).cloned().collect()
}

/// Stable sort: equal keys keep their relative order in both directions
pub fn sort_items(items: &mut [StockItem], key: SortKey, order: SortOrder) {
    items.sort_by(|a, b| match order {
        SortOrder::Asc => compare(key, a, b),
        SortOrder::Desc => compare(key, b, a),
    });
}

/// Slice `[(page-1)*per_page, page*per_page)`; out-of-range pages are empty
pub fn paginate<T: Clone>(items: &[T], page: u32, per_page: u32) -> Vec<T> {
    if page == 0 || per_page == 0 {
        return Vec::new();
    }
    let start = (page as usize - 1).saturating_mul(per_page as usize);
    if start >= items.len() {
        return Vec::new();
    }
    let end = start.saturating_add(per_page as usize).min(items.len());
    items[start..end].to_vec()
}

/// Run the whole pipeline with the fixed table page size
pub fn apply_query(items: &[StockItem], query: &StockQuery) -> PaginatedResponse<StockItem> {
    apply_query_with_page_size(items, query, STOCK_PAGE_SIZE)
}

pub fn apply_query_with_page_size(
    items: &[StockItem],
    query: &StockQuery,
    per_page: u32,
) -> PaginatedResponse<StockItem> {
    let mut filtered = filter_items(items, query);
    sort_items(&mut filtered, query.sort_by, query.order);
    let data = paginate(&filtered, query.page, per_page);

    PaginatedResponse {
        data,
        pagination: PaginationMeta::new(query.page, per_page, filtered.len() as u64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collation_key_folds_accents() {
        assert_eq!(collation_key("Éfferalgan"), "efferalgan");
        assert_eq!(collation_key("Cœur"), "coeur");
        assert_eq!(collation_key("ÇA"), "ca");
    }

    #[test]
    fn test_paginate_bounds() {
        let items: Vec<u32> = (0..120).collect();
        assert_eq!(paginate(&items, 1, 50), (0..50).collect::<Vec<_>>());
        assert_eq!(paginate(&items, 3, 50), (100..120).collect::<Vec<_>>());
        assert!(paginate(&items, 4, 50).is_empty());
        assert!(paginate(&items, 0, 50).is_empty());
        assert!(paginate(&items, u32::MAX, 50).is_empty());
    }

    #[test]
    fn test_all_bypasses_filter() {
        assert!(selects(&Some("all".into()), &None));
        assert!(selects(&None, &Some("f1".into())));
        assert!(selects(&Some("f1".into()), &Some("f1".into())));
        assert!(!selects(&Some("f1".into()), &Some("f2".into())));
        assert!(!selects(&Some("f1".into()), &None));
    }

    #[test]
    fn test_query_validation_limits_search_length() {
        let query = StockQuery {
            search: Some("x".repeat(201)),
            ..Default::default()
        };
        assert!(query.validate().is_err());
        assert!(StockQuery::default().validate().is_ok());
    }
}
