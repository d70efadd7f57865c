//! Domain entities and shared value types for the StockPilot platform

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User roles recognised by the access-control policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::User => "USER",
        }
    }
}

/// Purchase order lifecycle states.
///
/// `Draft` exists for completeness but the creation path never persists it:
/// a new order starts at `PendingVendorApproval` and moves to either
/// `SentToVendor` or `NotificationFailed` once dispatch has been attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "purchase_order_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseOrderStatus {
    Draft,
    PendingVendorApproval,
    SentToVendor,
    NotificationFailed,
}

/// Stock level classification derived from current stock vs reorder level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    InStock,
}

impl StockStatus {
    /// Classify a stock position against its reorder level
    pub fn of(current_stock: i64, reorder_level: i64) -> Self {
        if current_stock == 0 {
            StockStatus::OutOfStock
        } else if current_stock <= reorder_level {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }
}

/// Warehouse record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Warehouse {
    pub id: i64,
    pub name: String,
    pub location_code: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Product record owned by exactly one warehouse
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub category: String,
    pub vendor: String,
    pub current_stock: i64,
    pub reorder_level: i64,
    /// 0 means "unset"; use [`Product::resolved_max_stock_level`] for the
    /// effective restock ceiling.
    pub max_stock_level: i64,
    pub price: Decimal,
    pub auto_restock_enabled: bool,
    pub warehouse_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Effective restock ceiling: the configured max stock level when set,
    /// otherwise twice the reorder level, falling back to 50 units.
    pub fn resolved_max_stock_level(&self) -> i64 {
        if self.max_stock_level > 0 {
            return self.max_stock_level;
        }
        if self.reorder_level > 0 {
            self.reorder_level * 2
        } else {
            50
        }
    }

    pub fn stock_status(&self) -> StockStatus {
        StockStatus::of(self.current_stock, self.reorder_level)
    }
}

/// User account record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub warehouse_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A completed end-user purchase of a product (a sale from the warehouse's
/// point of view). Product and warehouse fields are snapshotted so history
/// survives later edits.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Sale {
    pub id: i64,
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
    pub purchased_at: DateTime<Utc>,
}

/// Restocking purchase order sent to a vendor
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseOrder {
    pub id: i64,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub subtotal_amount: Decimal,
    pub tax_amount: Decimal,
    pub shipping_amount: Decimal,
    pub total_amount: Decimal,
    #[sqlx(skip)]
    pub items: Vec<PurchaseOrderItem>,
}

/// Line item owned exclusively by a purchase order. Product name, SKU and
/// price are snapshotted at order time.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseOrderItem {
    pub id: i64,
    pub purchase_order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}
