//! Persistence seam
//!
//! The services talk to storage through these traits only. The production
//! implementation lives in [`postgres`]; tests drive the services through
//! in-memory fakes.

pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::authz::WarehouseScope;
use crate::error::AppResult;
use crate::models::{Product, PurchaseOrder, PurchaseOrderStatus, Sale, User, Warehouse};
use crate::services::demand::{ActivityRecord, ProductDemandAggregate};

pub use postgres::PgStore;

/// Input for creating a product
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub vendor: String,
    pub current_stock: i64,
    pub reorder_level: i64,
    pub max_stock_level: i64,
    pub price: Decimal,
    pub auto_restock_enabled: bool,
    pub warehouse_id: i64,
}

/// Input for creating a warehouse
#[derive(Debug, Clone)]
pub struct NewWarehouse {
    pub name: String,
    pub location_code: String,
}

/// Input for creating a user account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: crate::models::Role,
    pub warehouse_id: Option<i64>,
}

/// Input for recording a sale
#[derive(Debug, Clone)]
pub struct NewSale {
    pub user_id: i64,
    pub product_id: i64,
    pub warehouse_id: i64,
    pub product_name: String,
    pub product_sku: String,
    pub warehouse_name: String,
    pub warehouse_code: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Aggregate sales totals for a scope
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SalesTotals {
    pub total_orders: i64,
    pub total_items: i64,
    pub total_revenue: Decimal,
}

/// Input for persisting a purchase order with its items
#[derive(Debug, Clone)]
pub struct NewPurchaseOrder {
    pub reference: String,
    pub status: PurchaseOrderStatus,
    pub vendor_name: String,
    pub vendor_email: Option<String>,
    pub vendor_phone: Option<String>,
    pub vendor_contact_preference: Option<String>,
    pub notes: Option<String>,
    pub warehouse_id: i64,
    pub warehouse_name: String,
    pub created_by: i64,
    pub created_by_name: String,
    pub expected_delivery_date: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
    pub subtotal_amount: Decimal,
    pub tax_amount: Decimal,
    pub shipping_amount: Decimal,
    pub total_amount: Decimal,
    pub items: Vec<NewPurchaseOrderItem>,
}

/// Line item input belonging to a [`NewPurchaseOrder`]
#[derive(Debug, Clone)]
pub struct NewPurchaseOrderItem {
    pub product_id: i64,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn list_products(&self, scope: &WarehouseScope) -> AppResult<Vec<Product>>;
    async fn find_product(&self, id: i64) -> AppResult<Option<Product>>;
    async fn sku_exists(&self, sku: &str) -> AppResult<bool>;
    async fn insert_product(&self, new: NewProduct) -> AppResult<Product>;
    async fn update_product(&self, product: &Product) -> AppResult<()>;
}

#[async_trait]
pub trait WarehouseStore: Send + Sync {
    async fn list_warehouses(&self) -> AppResult<Vec<Warehouse>>;
    async fn find_warehouse(&self, id: i64) -> AppResult<Option<Warehouse>>;
    async fn warehouse_exists(&self, name: &str, location_code: &str) -> AppResult<bool>;
    async fn insert_warehouse(&self, new: NewWarehouse) -> AppResult<Warehouse>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: i64) -> AppResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn email_exists(&self, email: &str) -> AppResult<bool>;
    async fn insert_user(&self, new: NewUser) -> AppResult<User>;
}

#[async_trait]
pub trait SaleStore: Send + Sync {
    /// Record a sale and decrement the product's stock as one atomic unit.
    /// Fails with `InsufficientStock` when the decrement would drive stock
    /// negative; nothing is persisted in that case.
    async fn record_sale(&self, new: NewSale) -> AppResult<Sale>;
    async fn sales_for_user(&self, user_id: i64) -> AppResult<Vec<Sale>>;
    async fn sales_summary(&self, scope: &WarehouseScope) -> AppResult<SalesTotals>;
    async fn recent_sales(&self, warehouse_id: i64, limit: i64) -> AppResult<Vec<Sale>>;
}

#[async_trait]
pub trait DemandAggregateStore: Send + Sync {
    /// All-time per-product sales aggregates for a scope
    async fn product_demand_totals(
        &self,
        scope: &WarehouseScope,
    ) -> AppResult<Vec<ProductDemandAggregate>>;

    /// Raw sale activity inside `[start, end)`
    async fn sales_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        scope: &WarehouseScope,
    ) -> AppResult<Vec<ActivityRecord>>;

    /// Raw restock line-item activity inside `[start, end)`, bucketed by the
    /// owning order's submission time
    async fn restock_items_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        scope: &WarehouseScope,
    ) -> AppResult<Vec<ActivityRecord>>;
}

#[async_trait]
pub trait PurchaseOrderStore: Send + Sync {
    /// Persist an order together with its items in one transaction
    async fn save_order(&self, new: NewPurchaseOrder) -> AppResult<PurchaseOrder>;
    async fn update_order_status(
        &self,
        order_id: i64,
        status: PurchaseOrderStatus,
        notes: Option<&str>,
    ) -> AppResult<()>;
    async fn reference_exists(&self, reference: &str) -> AppResult<bool>;
    async fn list_orders(&self, scope: &WarehouseScope) -> AppResult<Vec<PurchaseOrder>>;
}
