//! Analytics dashboard tests

mod support;

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use stockpilot_backend::error::AppError;
use stockpilot_backend::services::analytics::{
    inventory_status, restock_demand_comparison, status_distribution, top_restocked,
    AnalyticsService,
};
use stockpilot_backend::services::demand::{aggregate_by_product, ActivityRecord};
use support::{admin, dec, end_user, manager, product, warehouse, MemoryStore};

fn analytics_service(store: &Arc<MemoryStore>) -> AnalyticsService {
    AnalyticsService::new(store.clone(), store.clone(), store.clone())
}

fn record(product_id: i64, source_id: i64, quantity: i64) -> ActivityRecord {
    ActivityRecord {
        product_id,
        product_name: format!("Product {}", product_id),
        product_sku: format!("SKU-{:04}", product_id),
        source_id,
        quantity,
        amount: Decimal::from(quantity),
        occurred_at: Utc::now(),
    }
}

mod unit_tests {
    use super::*;

    #[test]
    fn inventory_status_counts_the_stock_positions() {
        let mut healthy = product(1, 1);
        healthy.current_stock = 100;
        healthy.reorder_level = 10;
        let mut low = product(2, 1);
        low.current_stock = 5;
        low.reorder_level = 10;
        low.auto_restock_enabled = true;
        let mut out = product(3, 1);
        out.current_stock = 0;

        let summary = inventory_status(&[healthy, low, out]);
        assert_eq!(summary.total_products, 3);
        assert_eq!(summary.total_units, 105);
        assert_eq!(summary.low_stock_products, 1);
        assert_eq!(summary.out_of_stock_products, 1);
        assert_eq!(summary.auto_restock_enabled_products, 1);
    }

    #[test]
    fn status_distribution_has_three_fixed_slices() {
        let mut healthy = product(1, 1);
        healthy.current_stock = 100;
        let mut low = product(2, 1);
        low.current_stock = 5;
        let mut out = product(3, 1);
        out.current_stock = 0;

        let slices = status_distribution(&[healthy, low, out]);
        let labels: Vec<&str> = slices.iter().map(|slice| slice.label.as_str()).collect();
        assert_eq!(labels, vec!["Healthy", "Low Stock", "Out of Stock"]);
        assert_eq!(slices[0].units, 100);
        assert_eq!(slices[1].units, 5);
        // Out-of-stock products hold no units by definition
        assert_eq!(slices[2].units, 0);
        assert_eq!(slices[2].products, 1);
    }

    #[test]
    fn top_restocked_keeps_the_five_biggest() {
        let rows: Vec<ActivityRecord> = (1..=7)
            .map(|product_id| record(product_id, product_id * 100, product_id * 10))
            .collect();
        let aggregates = aggregate_by_product(&rows);

        let top = top_restocked(&aggregates);
        assert_eq!(top.len(), 5);
        // Largest quantities first: products 7, 6, 5, 4, 3
        let ids: Vec<i64> = top.iter().map(|item| item.product_id).collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
        assert_eq!(top[0].total_quantity, 70);
        assert_eq!(top[0].order_count, 1);
    }

    #[test]
    fn comparison_joins_the_streams_without_merging_them() {
        // Product 1 only restocked, product 2 only sold, product 3 both
        let restock = aggregate_by_product(&[record(1, 100, 30), record(3, 101, 5)]);
        let sales = aggregate_by_product(&[record(2, 200, 20), record(3, 201, 8)]);

        let points = restock_demand_comparison(&restock, &sales);
        assert_eq!(points.len(), 3);

        let by_id = |id: i64| points.iter().find(|p| p.product_id == id).unwrap();
        assert_eq!(by_id(1).restocked_quantity, 30);
        assert_eq!(by_id(1).sold_quantity, 0);
        assert_eq!(by_id(2).restocked_quantity, 0);
        assert_eq!(by_id(2).sold_quantity, 20);
        assert_eq!(by_id(3).restocked_quantity, 5);
        assert_eq!(by_id(3).sold_quantity, 8);

        // Sorted by combined activity: 1 (30), 2 (20), 3 (13)
        let ids: Vec<i64> = points.iter().map(|p| p.product_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn comparison_caps_at_seven_products() {
        let restock_rows: Vec<ActivityRecord> = (1..=10)
            .map(|product_id| record(product_id, product_id * 100, product_id))
            .collect();
        let restock = aggregate_by_product(&restock_rows);
        let sales = aggregate_by_product(&[]);

        let points = restock_demand_comparison(&restock, &sales);
        assert_eq!(points.len(), 7);
    }
}

mod service_tests {
    use super::*;

    fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.add_warehouse(warehouse(1, "North", "NOR"));
        store.add_warehouse(warehouse(2, "South", "SOU"));
        store
    }

    #[tokio::test]
    async fn dashboard_covers_six_months_and_both_streams() {
        let store = seeded_store();
        let sold = product(1, 1);
        store.add_product(sold.clone());
        let restocked = product(2, 1);
        store.add_product(restocked.clone());

        store.add_sale_at(&sold, 5, Utc::now() - Duration::days(5));
        store.add_restock_order_at(&[(&restocked, 20)], Utc::now() - Duration::days(10));

        let dashboard = analytics_service(&store)
            .build_dashboard(&admin(), None)
            .await
            .unwrap();

        assert_eq!(dashboard.monthly_quantity_trend.len(), 6);
        assert_eq!(dashboard.monthly_financials.len(), 6);

        let total_sold: i64 = dashboard
            .monthly_quantity_trend
            .iter()
            .map(|point| point.sold_quantity)
            .sum();
        let total_restocked: i64 = dashboard
            .monthly_quantity_trend
            .iter()
            .map(|point| point.restocked_quantity)
            .sum();
        assert_eq!(total_sold, 5);
        assert_eq!(total_restocked, 20);

        // The streams stay separate per product
        let sold_point = dashboard
            .restock_demand_comparison
            .iter()
            .find(|point| point.product_id == 1)
            .unwrap();
        assert_eq!(sold_point.sold_quantity, 5);
        assert_eq!(sold_point.restocked_quantity, 0);

        assert_eq!(dashboard.top_restocked_items.len(), 1);
        assert_eq!(dashboard.top_restocked_items[0].product_id, 2);
        assert_eq!(dashboard.scope_label, "All Warehouses");
    }

    #[tokio::test]
    async fn scoped_dashboard_labels_the_warehouse() {
        let store = seeded_store();
        store.add_product(product(1, 1));

        let dashboard = analytics_service(&store)
            .build_dashboard(&admin(), Some(1))
            .await
            .unwrap();
        assert_eq!(dashboard.scope_label, "North (NOR)");
    }

    #[tokio::test]
    async fn manager_dashboard_is_pinned_to_their_warehouse() {
        let store = seeded_store();
        let foreign = product(1, 2);
        store.add_product(foreign.clone());
        store.add_sale_at(&foreign, 9, Utc::now() - Duration::days(3));

        let dashboard = analytics_service(&store)
            .build_dashboard(&manager(1), None)
            .await
            .unwrap();
        let total_sold: i64 = dashboard
            .monthly_quantity_trend
            .iter()
            .map(|point| point.sold_quantity)
            .sum();
        assert_eq!(total_sold, 0);

        let err = analytics_service(&store)
            .build_dashboard(&manager(1), Some(2))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn end_users_cannot_see_the_dashboard() {
        let store = seeded_store();
        let err = analytics_service(&store)
            .build_dashboard(&end_user(5), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientPermissions));
    }

    #[tokio::test]
    async fn csv_export_renders_the_monthly_tables() {
        let store = seeded_store();
        let sold = product(1, 1);
        store.add_product(sold.clone());
        store.add_sale_at(&sold, 5, Utc::now() - Duration::days(5));

        let export = analytics_service(&store)
            .export_csv(&admin(), None)
            .await
            .unwrap();

        assert!(export.filename.starts_with("analytics-dashboard-all-warehouses-"));
        assert!(export.filename.ends_with(".csv"));

        let lines: Vec<&str> = export.content.trim_end().lines().collect();
        assert_eq!(lines.len(), 7); // header + six months
        assert_eq!(
            lines[0],
            "month,restocked_quantity,sold_quantity,restock_spend,sales_revenue"
        );

        let sold_total: i64 = lines[1..]
            .iter()
            .map(|line| line.split(',').nth(2).unwrap().parse::<i64>().unwrap())
            .sum();
        assert_eq!(sold_total, 5);
    }

    #[tokio::test]
    async fn csv_export_revenue_column_reflects_sales() {
        let store = seeded_store();
        let mut sold = product(1, 1);
        sold.price = dec("10.00");
        store.add_product(sold.clone());
        store.add_sale_at(&sold, 3, Utc::now() - Duration::days(2));

        let export = analytics_service(&store)
            .export_csv(&admin(), None)
            .await
            .unwrap();
        assert!(export.content.contains("30.00"));
    }
}
