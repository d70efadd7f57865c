//! Business logic services for the StockPilot platform

pub mod analytics;
pub mod auth;
pub mod demand;
pub mod forecast;
pub mod product;
pub mod purchase_order;
pub mod restock;
pub mod sales;
pub mod warehouse;

pub use analytics::AnalyticsService;
pub use auth::AuthService;
pub use forecast::ForecastService;
pub use product::ProductService;
pub use purchase_order::PurchaseOrderService;
pub use restock::RestockService;
pub use sales::SalesService;
pub use warehouse::WarehouseService;
