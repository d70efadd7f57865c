//! Sales service tests

mod support;

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;

use stockpilot_backend::error::AppError;
use stockpilot_backend::models::Role;
use stockpilot_backend::services::sales::{RecordSaleInput, SalesService};
use support::{admin, at, dec, end_user, manager, product, user, warehouse, MemoryStore};

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.add_warehouse(warehouse(1, "North", "NOR"));
    store.add_warehouse(warehouse(2, "South", "SOU"));
    store.add_user(user(1, Role::Admin, None));
    store.add_user(user(2, Role::Manager, Some(1)));
    store.add_user(user(5, Role::User, Some(1)));
    let mut p = product(10, 1);
    p.current_stock = 50;
    p.price = dec("12.50");
    store.add_product(p);
    store
}

fn sales_service(store: &Arc<MemoryStore>) -> SalesService {
    SalesService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    )
}

mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn a_sale_decrements_stock_and_snapshots_the_product() {
        let store = seeded_store();
        let sale = sales_service(&store)
            .record_sale(
                &end_user(5),
                RecordSaleInput {
                    product_id: 10,
                    quantity: 4,
                },
            )
            .await
            .unwrap();

        assert_eq!(sale.quantity, 4);
        assert_eq!(sale.unit_price, dec("12.50"));
        assert_eq!(sale.total_price, dec("50.00"));
        assert_eq!(sale.product_sku, "SKU-0010");
        assert_eq!(sale.warehouse_name, "North");
        assert_eq!(sale.warehouse_code, "NOR");

        assert_eq!(store.product_by_id(10).unwrap().current_stock, 46);
    }

    #[tokio::test]
    async fn insufficient_stock_rejects_the_sale_without_mutation() {
        let store = seeded_store();
        let err = sales_service(&store)
            .record_sale(
                &end_user(5),
                RecordSaleInput {
                    product_id: 10,
                    quantity: 51,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InsufficientStock(_)));
        assert_eq!(store.product_by_id(10).unwrap().current_stock, 50);
        assert!(store.sales.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn exactly_the_remaining_stock_can_be_sold() {
        let store = seeded_store();
        sales_service(&store)
            .record_sale(
                &end_user(5),
                RecordSaleInput {
                    product_id: 10,
                    quantity: 50,
                },
            )
            .await
            .unwrap();
        assert_eq!(store.product_by_id(10).unwrap().current_stock, 0);
    }

    #[tokio::test]
    async fn only_end_users_can_purchase() {
        let store = seeded_store();
        let input = RecordSaleInput {
            product_id: 10,
            quantity: 1,
        };
        for caller in [admin(), manager(1)] {
            let err = sales_service(&store)
                .record_sale(&caller, input.clone())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() {
        let store = seeded_store();
        let err = sales_service(&store)
            .record_sale(
                &end_user(5),
                RecordSaleInput {
                    product_id: 10,
                    quantity: 0,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let store = seeded_store();
        let err = sales_service(&store)
            .record_sale(
                &end_user(5),
                RecordSaleInput {
                    product_id: 999,
                    quantity: 1,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn history_totals_the_user_spend() {
        let store = seeded_store();
        let service = sales_service(&store);
        for quantity in [2, 3] {
            service
                .record_sale(
                    &end_user(5),
                    RecordSaleInput {
                        product_id: 10,
                        quantity,
                    },
                )
                .await
                .unwrap();
        }

        let history = service.history(&end_user(5)).await.unwrap();
        assert_eq!(history.items.len(), 2);
        assert_eq!(history.total_spend, dec("62.50")); // (2 + 3) * 12.50
    }

    #[tokio::test]
    async fn summary_scopes_to_the_requested_warehouse() {
        let store = seeded_store();
        let mut southern = product(20, 2);
        southern.price = dec("1.00");
        store.add_product(southern.clone());
        store.add_sale_at(&store.product_by_id(10).unwrap(), 5, at(2025, 1, 10));
        store.add_sale_at(&southern, 2, at(2025, 1, 11));

        let service = sales_service(&store);
        let all = service.summary(&admin(), None).await.unwrap();
        assert_eq!(all.total_orders, 2);
        assert_eq!(all.total_items, 7);

        let north_only = service.summary(&admin(), Some(1)).await.unwrap();
        assert_eq!(north_only.total_orders, 1);
        assert_eq!(north_only.total_items, 5);
        assert_eq!(north_only.total_revenue, dec("62.50"));
    }

    #[tokio::test]
    async fn manager_summary_is_pinned_to_their_warehouse() {
        let store = seeded_store();
        let service = sales_service(&store);

        let err = service.summary(&manager(1), Some(2)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let own = service.summary(&manager(1), None).await.unwrap();
        assert_eq!(own.total_orders, 0);
        assert_eq!(own.total_revenue, Decimal::ZERO);
    }

    #[tokio::test]
    async fn warehouse_report_returns_recent_sales_and_totals() {
        let store = seeded_store();
        store.add_sale_at(&store.product_by_id(10).unwrap(), 1, at(2025, 3, 1));
        store.add_sale_at(&store.product_by_id(10).unwrap(), 2, at(2025, 3, 2));

        let report = sales_service(&store)
            .warehouse_report(&manager(1))
            .await
            .unwrap();
        assert_eq!(report.items.len(), 2);
        // Newest first
        assert_eq!(report.items[0].quantity, 2);
        assert_eq!(report.totals.total_items, 3);
    }
}

mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// Selling never drives stock negative, whatever the requested
        /// quantity
        #[test]
        fn stock_never_goes_negative(initial in 0i64..100, requested in 1i64..200) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            runtime.block_on(async {
                let store = Arc::new(MemoryStore::new());
                store.add_warehouse(warehouse(1, "North", "NOR"));
                store.add_user(user(5, Role::User, Some(1)));
                let mut p = product(10, 1);
                p.current_stock = initial;
                store.add_product(p);

                let result = sales_service(&store)
                    .record_sale(
                        &end_user(5),
                        RecordSaleInput {
                            product_id: 10,
                            quantity: requested,
                        },
                    )
                    .await;

                let remaining = store.product_by_id(10).unwrap().current_stock;
                prop_assert!(remaining >= 0);
                if requested <= initial {
                    prop_assert!(result.is_ok());
                    prop_assert_eq!(remaining, initial - requested);
                } else {
                    prop_assert!(result.is_err());
                    prop_assert_eq!(remaining, initial);
                }
                Ok(())
            })?;
        }
    }
}
