//! Analytics dashboard
//!
//! Joins the sales and restock activity streams into a six-month dashboard:
//! inventory status, monthly quantity and financial trends, top restocked
//! items and a restock-vs-demand comparison. The two streams stay separate
//! all the way down; only the presentation rows put them side by side.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::authz::{resolve_warehouse_scope, WarehouseScope};
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{Product, StockStatus};
use crate::services::demand::{
    aggregate_by_month, aggregate_by_product, MonthWindow, ProductDemandAggregate,
};
use crate::store::{DemandAggregateStore, ProductStore, WarehouseStore};

const MONTH_WINDOW: u32 = 6;
const TOP_RESTOCKED_LIMIT: usize = 5;
const COMPARISON_LIMIT: usize = 7;

/// Headline inventory counts for the scope
#[derive(Debug, Clone, Serialize)]
pub struct InventoryStatusSummary {
    pub total_products: i64,
    pub total_units: i64,
    pub low_stock_products: i64,
    pub out_of_stock_products: i64,
    pub auto_restock_enabled_products: i64,
}

/// One slice of the stock status distribution
#[derive(Debug, Clone, Serialize)]
pub struct StatusSlice {
    pub label: String,
    pub products: i64,
    pub units: i64,
}

/// Restocked vs sold quantities for one month
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyQuantityPoint {
    pub year: i32,
    pub month: u32,
    pub restocked_quantity: i64,
    pub sold_quantity: i64,
}

/// Restock spend vs sales revenue for one month
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyFinancialPoint {
    pub year: i32,
    pub month: u32,
    pub restock_spend: Decimal,
    pub sales_revenue: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopRestockedItem {
    pub product_id: i64,
    pub product_name: String,
    pub product_sku: String,
    pub total_quantity: i64,
    pub order_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestockDemandPoint {
    pub product_id: i64,
    pub product_name: String,
    pub product_sku: String,
    pub restocked_quantity: i64,
    pub sold_quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub inventory_status: InventoryStatusSummary,
    pub status_distribution: Vec<StatusSlice>,
    pub monthly_quantity_trend: Vec<MonthlyQuantityPoint>,
    pub monthly_financials: Vec<MonthlyFinancialPoint>,
    pub top_restocked_items: Vec<TopRestockedItem>,
    pub restock_demand_comparison: Vec<RestockDemandPoint>,
    pub scope_label: String,
    pub generated_at: DateTime<Utc>,
}

/// A rendered CSV export with its suggested filename
#[derive(Debug)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
}

#[derive(Clone)]
pub struct AnalyticsService {
    products: Arc<dyn ProductStore>,
    warehouses: Arc<dyn WarehouseStore>,
    demand: Arc<dyn DemandAggregateStore>,
}

impl AnalyticsService {
    pub fn new(
        products: Arc<dyn ProductStore>,
        warehouses: Arc<dyn WarehouseStore>,
        demand: Arc<dyn DemandAggregateStore>,
    ) -> Self {
        Self {
            products,
            warehouses,
            demand,
        }
    }

    /// Build the dashboard for the caller's scope
    pub async fn build_dashboard(
        &self,
        current_user: &AuthUser,
        requested_warehouse_id: Option<i64>,
    ) -> AppResult<Dashboard> {
        let scope = resolve_warehouse_scope(current_user, requested_warehouse_id)?;
        let now = Utc::now();
        let window = MonthWindow::trailing(MONTH_WINDOW, now);

        let products = self.products.list_products(&scope).await?;
        let sales_rows = self
            .demand
            .sales_between(window.start_at(), window.end_at(), &scope)
            .await?;
        let restock_rows = self
            .demand
            .restock_items_between(window.start_at(), window.end_at(), &scope)
            .await?;

        let monthly_sales = aggregate_by_month(&sales_rows, &window);
        let monthly_restock = aggregate_by_month(&restock_rows, &window);
        let sales_by_product = aggregate_by_product(&sales_rows);
        let restock_by_product = aggregate_by_product(&restock_rows);

        let monthly_quantity_trend = monthly_restock
            .iter()
            .zip(monthly_sales.iter())
            .map(|(restock, sales)| MonthlyQuantityPoint {
                year: restock.year,
                month: restock.month,
                restocked_quantity: restock.total_quantity,
                sold_quantity: sales.total_quantity,
            })
            .collect();
        let monthly_financials = monthly_restock
            .iter()
            .zip(monthly_sales.iter())
            .map(|(restock, sales)| MonthlyFinancialPoint {
                year: restock.year,
                month: restock.month,
                restock_spend: restock.total_amount,
                sales_revenue: sales.total_amount,
            })
            .collect();

        Ok(Dashboard {
            inventory_status: inventory_status(&products),
            status_distribution: status_distribution(&products),
            monthly_quantity_trend,
            monthly_financials,
            top_restocked_items: top_restocked(&restock_by_product),
            restock_demand_comparison: restock_demand_comparison(
                &restock_by_product,
                &sales_by_product,
            ),
            scope_label: self.scope_label(&scope).await?,
            generated_at: now,
        })
    }

    /// Render the dashboard's monthly tables to CSV
    pub async fn export_csv(
        &self,
        current_user: &AuthUser,
        requested_warehouse_id: Option<i64>,
    ) -> AppResult<CsvExport> {
        let dashboard = self
            .build_dashboard(current_user, requested_warehouse_id)
            .await?;

        let mut writer = csv::Writer::from_writer(vec![]);
        writer
            .write_record([
                "month",
                "restocked_quantity",
                "sold_quantity",
                "restock_spend",
                "sales_revenue",
            ])
            .map_err(|err| AppError::Internal(err.into()))?;
        for (quantity, financial) in dashboard
            .monthly_quantity_trend
            .iter()
            .zip(dashboard.monthly_financials.iter())
        {
            writer
                .write_record([
                    format!("{}-{:02}", quantity.year, quantity.month),
                    quantity.restocked_quantity.to_string(),
                    quantity.sold_quantity.to_string(),
                    financial.restock_spend.to_string(),
                    financial.sales_revenue.to_string(),
                ])
                .map_err(|err| AppError::Internal(err.into()))?;
        }
        let content = String::from_utf8(
            writer
                .into_inner()
                .map_err(|err| AppError::Internal(anyhow::anyhow!("{}", err)))?,
        )
        .map_err(|err| AppError::Internal(err.into()))?;

        let now = Utc::now();
        let filename = format!(
            "analytics-dashboard-{}-{}-{:02}.csv",
            scope_slug(&dashboard.scope_label),
            now.year(),
            now.month()
        );
        Ok(CsvExport { filename, content })
    }

    async fn scope_label(&self, scope: &WarehouseScope) -> AppResult<String> {
        match scope {
            WarehouseScope::All => Ok("All Warehouses".to_string()),
            WarehouseScope::Warehouse(id) => {
                match self.warehouses.find_warehouse(*id).await? {
                    Some(warehouse) => {
                        Ok(format!("{} ({})", warehouse.name, warehouse.location_code))
                    }
                    None => Ok(format!("Warehouse {}", id)),
                }
            }
        }
    }
}

/// Headline counts over a product set
pub fn inventory_status(products: &[Product]) -> InventoryStatusSummary {
    InventoryStatusSummary {
        total_products: products.len() as i64,
        total_units: products.iter().map(|product| product.current_stock).sum(),
        low_stock_products: products
            .iter()
            .filter(|product| product.stock_status() == StockStatus::LowStock)
            .count() as i64,
        out_of_stock_products: products
            .iter()
            .filter(|product| product.stock_status() == StockStatus::OutOfStock)
            .count() as i64,
        auto_restock_enabled_products: products
            .iter()
            .filter(|product| product.auto_restock_enabled)
            .count() as i64,
    }
}

/// Healthy / low / out-of-stock slices over a product set
pub fn status_distribution(products: &[Product]) -> Vec<StatusSlice> {
    let mut healthy = (0i64, 0i64);
    let mut low = (0i64, 0i64);
    let mut out_products = 0i64;
    for product in products {
        match product.stock_status() {
            StockStatus::OutOfStock => out_products += 1,
            StockStatus::LowStock => {
                low.0 += 1;
                low.1 += product.current_stock;
            }
            StockStatus::InStock => {
                healthy.0 += 1;
                healthy.1 += product.current_stock;
            }
        }
    }
    vec![
        StatusSlice {
            label: "Healthy".to_string(),
            products: healthy.0,
            units: healthy.1,
        },
        StatusSlice {
            label: "Low Stock".to_string(),
            products: low.0,
            units: low.1,
        },
        StatusSlice {
            label: "Out of Stock".to_string(),
            products: out_products,
            units: 0,
        },
    ]
}

/// The most restocked products in the window, by quantity
pub fn top_restocked(
    restock_by_product: &BTreeMap<i64, ProductDemandAggregate>,
) -> Vec<TopRestockedItem> {
    let mut items: Vec<TopRestockedItem> = restock_by_product
        .values()
        .map(|aggregate| TopRestockedItem {
            product_id: aggregate.product_id,
            product_name: aggregate.product_name.clone(),
            product_sku: aggregate.product_sku.clone(),
            total_quantity: aggregate.total_quantity,
            order_count: aggregate.total_orders,
        })
        .collect();
    items.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
    items.truncate(TOP_RESTOCKED_LIMIT);
    items
}

/// Side-by-side restocked and sold quantities per product, busiest first
pub fn restock_demand_comparison(
    restock_by_product: &BTreeMap<i64, ProductDemandAggregate>,
    sales_by_product: &BTreeMap<i64, ProductDemandAggregate>,
) -> Vec<RestockDemandPoint> {
    let mut product_ids: Vec<i64> = restock_by_product
        .keys()
        .chain(sales_by_product.keys())
        .copied()
        .collect();
    product_ids.sort_unstable();
    product_ids.dedup();

    let mut points: Vec<RestockDemandPoint> = product_ids
        .into_iter()
        .map(|product_id| {
            let restock = restock_by_product.get(&product_id);
            let sales = sales_by_product.get(&product_id);
            let name = restock
                .map(|aggregate| aggregate.product_name.clone())
                .or_else(|| sales.map(|aggregate| aggregate.product_name.clone()))
                .unwrap_or_else(|| "Unknown".to_string());
            let sku = restock
                .map(|aggregate| aggregate.product_sku.clone())
                .or_else(|| sales.map(|aggregate| aggregate.product_sku.clone()))
                .unwrap_or_else(|| "--".to_string());
            RestockDemandPoint {
                product_id,
                product_name: name,
                product_sku: sku,
                restocked_quantity: restock.map(|a| a.total_quantity).unwrap_or(0),
                sold_quantity: sales.map(|a| a.total_quantity).unwrap_or(0),
            }
        })
        .collect();

    points.sort_by(|a, b| {
        (b.restocked_quantity + b.sold_quantity).cmp(&(a.restocked_quantity + a.sold_quantity))
    });
    points.truncate(COMPARISON_LIMIT);
    points
}

fn scope_slug(scope_label: &str) -> String {
    let mut slug = String::new();
    for c in scope_label.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "all".to_string()
    } else {
        slug
    }
}
