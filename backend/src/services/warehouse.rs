//! Warehouse management

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::authz::resolve_warehouse_scope;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{Role, StockStatus, Warehouse};
use crate::store::{NewWarehouse, ProductStore, WarehouseStore};

/// Request payload for creating a warehouse
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateWarehouseInput {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 30))]
    pub location_code: String,
}

/// A warehouse with its stock position
#[derive(Debug, Serialize)]
pub struct WarehouseSummary {
    #[serde(flatten)]
    pub warehouse: Warehouse,
    pub total_products: i64,
    pub total_units: i64,
    pub low_stock_products: i64,
    pub out_of_stock_products: i64,
}

#[derive(Clone)]
pub struct WarehouseService {
    warehouses: Arc<dyn WarehouseStore>,
    products: Arc<dyn ProductStore>,
}

impl WarehouseService {
    pub fn new(warehouses: Arc<dyn WarehouseStore>, products: Arc<dyn ProductStore>) -> Self {
        Self {
            warehouses,
            products,
        }
    }

    /// List warehouses visible to the caller with their stock summaries
    pub async fn list(&self, current_user: &AuthUser) -> AppResult<Vec<WarehouseSummary>> {
        let scope = resolve_warehouse_scope(current_user, None)?;
        let warehouses = self.warehouses.list_warehouses().await?;
        let products = self.products.list_products(&scope).await?;

        let mut summaries = Vec::new();
        for warehouse in warehouses {
            if let Some(visible) = scope.warehouse_id() {
                if warehouse.id != visible {
                    continue;
                }
            }
            let owned: Vec<_> = products
                .iter()
                .filter(|product| product.warehouse_id == warehouse.id)
                .collect();
            summaries.push(WarehouseSummary {
                total_products: owned.len() as i64,
                total_units: owned.iter().map(|product| product.current_stock).sum(),
                low_stock_products: owned
                    .iter()
                    .filter(|product| product.stock_status() == StockStatus::LowStock)
                    .count() as i64,
                out_of_stock_products: owned
                    .iter()
                    .filter(|product| product.stock_status() == StockStatus::OutOfStock)
                    .count() as i64,
                warehouse,
            });
        }
        Ok(summaries)
    }

    /// Create a warehouse (admins only)
    pub async fn create(
        &self,
        current_user: &AuthUser,
        input: CreateWarehouseInput,
    ) -> AppResult<Warehouse> {
        if current_user.role != Role::Admin {
            return Err(AppError::InsufficientPermissions);
        }
        input
            .validate()
            .map_err(|err| AppError::Validation(err.to_string()))?;

        let name = input.name.trim().to_string();
        let location_code = input.location_code.trim().to_uppercase();
        if self.warehouses.warehouse_exists(&name, &location_code).await? {
            return Err(AppError::DuplicateEntry("warehouse".to_string()));
        }

        self.warehouses
            .insert_warehouse(NewWarehouse {
                name,
                location_code,
            })
            .await
    }
}
