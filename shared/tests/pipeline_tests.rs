//! Filter/sort/paginate tests over classified stock

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    apply_query, apply_query_with_page_size, filter_items, paginate, sort_items, Rotation,
    SortKey, SortOrder, StockItem, StockQuery, StockStateFilter, StockStatus, ThresholdSource,
    STOCK_PAGE_SIZE,
};

fn item(id: &str, name: &str, stock: i64, status: StockStatus, rotation: Rotation) -> StockItem {
    let price = Decimal::new(150, 2);
    StockItem {
        product_id: id.to_string(),
        name: name.to_string(),
        code: format!("CIP{}", id),
        category_id: Some(if stock % 2 == 0 { "f1" } else { "f2" }.to_string()),
        category_label: None,
        location_id: Some("r1".to_string()),
        location_label: None,
        current_stock: stock,
        purchase_price: price,
        sale_tariff: price,
        stock_value: Decimal::from(stock) * price,
        lower_threshold: 0,
        upper_threshold: 100,
        threshold_source: ThresholdSource::Default,
        status,
        rotation,
        velocity: 0.0,
        movements: None,
    }
}

fn catalogue() -> Vec<StockItem> {
    vec![
        item("1", "Doliprane 1000mg", 120, StockStatus::Overstock, Rotation::Fast),
        item("2", "Éfferalgan 500mg", 0, StockStatus::OutOfStock, Rotation::Normal),
        item("3", "Amoxicilline 1g", 8, StockStatus::Critical, Rotation::Slow),
        item("4", "advil 200mg", 30, StockStatus::Low, Rotation::Normal),
        item("5", "Spasfon", 55, StockStatus::Normal, Rotation::Fast),
        item("6", "Dafalgan", 55, StockStatus::Normal, Rotation::Slow),
    ]
}

fn ids(items: &[StockItem]) -> Vec<&str> {
    items.iter().map(|i| i.product_id.as_str()).collect()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_search_matches_name_or_code_case_insensitive() {
        let query = StockQuery { search: Some("DOLI".into()), ..Default::default() };
        assert_eq!(ids(&filter_items(&catalogue(), &query)), vec!["1"]);

        let query = StockQuery { search: Some("cip3".into()), ..Default::default() };
        assert_eq!(ids(&filter_items(&catalogue(), &query)), vec!["3"]);

        let query = StockQuery { search: Some("   ".into()), ..Default::default() };
        assert_eq!(filter_items(&catalogue(), &query).len(), 6);
    }

    #[test]
    fn test_search_keeps_surrounding_spaces() {
        let query = StockQuery { search: Some("amoxicilline ".into()), ..Default::default() };
        assert_eq!(ids(&filter_items(&catalogue(), &query)), vec!["3"]);

        let query = StockQuery { search: Some("500mg ".into()), ..Default::default() };
        assert!(filter_items(&catalogue(), &query).is_empty());
    }

    #[test]
    fn test_category_filter_and_all_bypass() {
        let query = StockQuery { category: Some("f2".into()), ..Default::default() };
        assert_eq!(ids(&filter_items(&catalogue(), &query)), vec!["5", "6"]);

        let query = StockQuery { category: Some("all".into()), ..Default::default() };
        assert_eq!(filter_items(&catalogue(), &query).len(), 6);
    }

    #[test]
    fn test_location_filter() {
        let query = StockQuery { location: Some("r2".into()), ..Default::default() };
        assert!(filter_items(&catalogue(), &query).is_empty());
    }

    #[test]
    fn test_stock_state_filters() {
        let by_state = |state| {
            let query = StockQuery { stock_state: state, ..Default::default() };
            filter_items(&catalogue(), &query)
        };
        assert_eq!(ids(&by_state(StockStateFilter::Available)), vec!["1", "3", "4", "5", "6"]);
        assert_eq!(ids(&by_state(StockStateFilter::Low)), vec!["4"]);
        assert_eq!(ids(&by_state(StockStateFilter::Out)), vec!["2"]);
        assert_eq!(ids(&by_state(StockStateFilter::Critical)), vec!["3"]);
    }

    #[test]
    fn test_filters_combine() {
        let query = StockQuery {
            search: Some("mg".into()),
            stock_state: StockStateFilter::Available,
            category: Some("f1".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_items(&catalogue(), &query)), vec!["1", "4"]);
    }

    #[test]
    fn test_name_sort_is_accent_and_case_insensitive() {
        let mut items = catalogue();
        sort_items(&mut items, SortKey::Name, SortOrder::Asc);
        assert_eq!(ids(&items), vec!["4", "3", "6", "1", "2", "5"]);
    }

    #[test]
    fn test_quantity_sort_desc_keeps_tie_order() {
        let mut items = catalogue();
        sort_items(&mut items, SortKey::Quantity, SortOrder::Desc);
        assert_eq!(ids(&items), vec!["1", "5", "6", "4", "3", "2"]);
    }

    #[test]
    fn test_rotation_sort_uses_ordinal() {
        let mut items = catalogue();
        sort_items(&mut items, SortKey::Rotation, SortOrder::Desc);
        assert_eq!(ids(&items), vec!["1", "5", "2", "4", "3", "6"]);
    }

    #[test]
    fn test_value_sort() {
        let mut items = catalogue();
        sort_items(&mut items, SortKey::Value, SortOrder::Asc);
        assert_eq!(ids(&items), vec!["2", "3", "4", "5", "6", "1"]);
    }

    #[test]
    fn test_out_of_range_page_is_empty() {
        let query = StockQuery { page: 2, ..Default::default() };
        let page = apply_query(&catalogue(), &query);
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.total_items, 6);
        assert_eq!(page.pagination.total_pages, 1);
        assert_eq!(page.pagination.per_page, STOCK_PAGE_SIZE);
    }

    #[test]
    fn test_page_zero_is_empty() {
        let query = StockQuery { page: 0, ..Default::default() };
        assert!(apply_query(&catalogue(), &query).data.is_empty());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn status_strategy() -> impl Strategy<Value = StockStatus> {
        prop_oneof![
            Just(StockStatus::Normal),
            Just(StockStatus::Low),
            Just(StockStatus::Critical),
            Just(StockStatus::Overstock),
        ]
    }

    fn rotation_strategy() -> impl Strategy<Value = Rotation> {
        prop_oneof![Just(Rotation::Fast), Just(Rotation::Normal), Just(Rotation::Slow)]
    }

    fn items_strategy() -> impl Strategy<Value = Vec<StockItem>> {
        prop::collection::vec(
            ("[a-cA-Cé]{1,3}", 0i64..20, status_strategy(), rotation_strategy()),
            0..160,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (name, stock, status, rotation))| {
                    let status = if stock == 0 { StockStatus::OutOfStock } else { status };
                    item(&i.to_string(), &name, stock, status, rotation)
                })
                .collect()
        })
    }

    fn key_strategy() -> impl Strategy<Value = SortKey> {
        prop_oneof![
            Just(SortKey::Name),
            Just(SortKey::Quantity),
            Just(SortKey::Value),
            Just(SortKey::Rotation),
        ]
    }

    fn order_strategy() -> impl Strategy<Value = SortOrder> {
        prop_oneof![Just(SortOrder::Asc), Just(SortOrder::Desc)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Sorting an already sorted list changes nothing
        #[test]
        fn prop_sort_idempotent(items in items_strategy(), key in key_strategy(), order in order_strategy()) {
            let mut once = items.clone();
            sort_items(&mut once, key, order);
            let mut twice = once.clone();
            sort_items(&mut twice, key, order);
            prop_assert_eq!(ids(&once), ids(&twice));
        }

        /// Concatenating every page rebuilds the filtered, sorted list
        #[test]
        fn prop_pages_reconstruct_list(
            items in items_strategy(),
            key in key_strategy(),
            order in order_strategy(),
            per_page in 1u32..60
        ) {
            let base = StockQuery { sort_by: key, order, ..Default::default() };
            let mut expected = filter_items(&items, &base);
            sort_items(&mut expected, key, order);

            let total_pages = apply_query_with_page_size(&items, &base, per_page).pagination.total_pages;
            let mut rebuilt = Vec::new();
            for page in 1..=total_pages {
                let query = StockQuery { page, ..base.clone() };
                rebuilt.extend(apply_query_with_page_size(&items, &query, per_page).data);
            }
            prop_assert_eq!(ids(&rebuilt), ids(&expected));

            let beyond = StockQuery { page: total_pages + 1, ..base };
            prop_assert!(apply_query_with_page_size(&items, &beyond, per_page).data.is_empty());
        }

        /// Every page but the last is full
        #[test]
        fn prop_page_sizes(items in items_strategy(), page in 1u32..6) {
            let slice = paginate(&items, page, STOCK_PAGE_SIZE);
            let start = (page as usize - 1) * STOCK_PAGE_SIZE as usize;
            let expected = items.len().saturating_sub(start).min(STOCK_PAGE_SIZE as usize);
            prop_assert_eq!(slice.len(), expected);
        }

        /// Filtering never invents or reorders rows
        #[test]
        fn prop_filter_is_order_preserving_subset(items in items_strategy(), state in prop_oneof![
            Just(StockStateFilter::All),
            Just(StockStateFilter::Available),
            Just(StockStateFilter::Low),
            Just(StockStateFilter::Out),
            Just(StockStateFilter::Critical),
        ]) {
            let query = StockQuery { stock_state: state, ..Default::default() };
            let kept = filter_items(&items, &query);
            let positions: Vec<usize> = kept
                .iter()
                .map(|k| items.iter().position(|i| i.product_id == k.product_id).unwrap())
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
            if state == StockStateFilter::Available {
                prop_assert!(kept.iter().all(|i| i.current_stock > 0));
            }
        }
    }
}
