//! Sales service: end-user purchases and sales reporting
//!
//! A sale decrements product stock and records the transaction as one
//! atomic unit of work; either both happen or neither does.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::authz::resolve_warehouse_scope;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{Role, Sale};
use crate::store::{NewSale, ProductStore, SaleStore, SalesTotals, UserStore, WarehouseStore};

const RECENT_SALES_LIMIT: i64 = 50;

/// Request payload for purchasing a product
#[derive(Debug, Clone, Deserialize)]
pub struct RecordSaleInput {
    pub product_id: i64,
    pub quantity: i64,
}

/// A user's purchase history with their total spend
#[derive(Debug, Serialize)]
pub struct SaleHistory {
    pub items: Vec<Sale>,
    pub total_spend: Decimal,
}

/// Recent activity and totals for one warehouse
#[derive(Debug, Serialize)]
pub struct WarehouseSalesReport {
    pub items: Vec<Sale>,
    pub totals: SalesTotals,
}

#[derive(Clone)]
pub struct SalesService {
    sales: Arc<dyn SaleStore>,
    products: Arc<dyn ProductStore>,
    users: Arc<dyn UserStore>,
    warehouses: Arc<dyn WarehouseStore>,
}

impl SalesService {
    pub fn new(
        sales: Arc<dyn SaleStore>,
        products: Arc<dyn ProductStore>,
        users: Arc<dyn UserStore>,
        warehouses: Arc<dyn WarehouseStore>,
    ) -> Self {
        Self {
            sales,
            products,
            users,
            warehouses,
        }
    }

    /// Purchase a product as an end user, decrementing its stock
    pub async fn record_sale(
        &self,
        current_user: &AuthUser,
        input: RecordSaleInput,
    ) -> AppResult<Sale> {
        if current_user.role != Role::User {
            return Err(AppError::Validation(
                "Only end users can purchase products".to_string(),
            ));
        }
        if input.quantity < 1 {
            return Err(AppError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let user = self
            .users
            .find_user(current_user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;
        let product = self
            .products
            .find_product(input.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        if product.current_stock < input.quantity {
            return Err(AppError::InsufficientStock(
                "Insufficient stock for this product".to_string(),
            ));
        }

        let warehouse = self
            .warehouses
            .find_warehouse(product.warehouse_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))?;

        let unit_price = product.price;
        let total_price = unit_price * Decimal::from(input.quantity);

        // The store re-checks the stock level inside the transaction; a
        // concurrent sale that empties the shelf first surfaces as the same
        // insufficient-stock error.
        self.sales
            .record_sale(NewSale {
                user_id: user.id,
                product_id: product.id,
                warehouse_id: product.warehouse_id,
                product_name: product.name.clone(),
                product_sku: product.sku.clone(),
                warehouse_name: warehouse.name.clone(),
                warehouse_code: warehouse.location_code.clone(),
                quantity: input.quantity,
                unit_price,
                total_price,
            })
            .await
    }

    /// The calling user's purchase history, newest first, with total spend
    pub async fn history(&self, current_user: &AuthUser) -> AppResult<SaleHistory> {
        let items = self.sales.sales_for_user(current_user.id).await?;
        let total_spend = items.iter().map(|sale| sale.total_price).sum();
        Ok(SaleHistory { items, total_spend })
    }

    /// Sales totals for the caller's scope
    pub async fn summary(
        &self,
        current_user: &AuthUser,
        requested_warehouse_id: Option<i64>,
    ) -> AppResult<SalesTotals> {
        let scope = resolve_warehouse_scope(current_user, requested_warehouse_id)?;
        self.sales.sales_summary(&scope).await
    }

    /// Recent sales plus totals for a manager's assigned warehouse
    pub async fn warehouse_report(
        &self,
        current_user: &AuthUser,
    ) -> AppResult<WarehouseSalesReport> {
        let scope = resolve_warehouse_scope(current_user, None)?;
        let warehouse_id = scope.warehouse_id().ok_or_else(|| {
            AppError::Validation("A warehouse id must be provided".to_string())
        })?;
        let items = self
            .sales
            .recent_sales(warehouse_id, RECENT_SALES_LIMIT)
            .await?;
        let totals = self.sales.sales_summary(&scope).await?;
        Ok(WarehouseSalesReport { items, totals })
    }
}
