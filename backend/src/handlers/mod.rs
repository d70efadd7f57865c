//! HTTP handlers

pub mod analytics;
pub mod auth;
pub mod forecast;
pub mod products;
pub mod purchase_orders;
pub mod restock;
pub mod sales;
pub mod warehouses;

pub use analytics::{analytics_dashboard, export_analytics_csv};
pub use auth::{login, register};
pub use forecast::demand_forecast;
pub use products::{create_product, get_product, list_products, update_product};
pub use purchase_orders::{create_purchase_order, list_purchase_orders};
pub use restock::restock_recommendations;
pub use sales::{my_purchase_history, purchase_product, sales_summary, warehouse_sales_report};
pub use warehouses::{create_warehouse, list_warehouses};
