//! Product catalog management

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::authz::{require_single_warehouse, resolve_warehouse_scope};
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{Product, StockStatus};
use crate::store::{NewProduct, ProductStore, WarehouseStore};

/// Request payload for creating a product
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 60))]
    pub sku: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 80))]
    pub category: String,
    #[validate(length(min = 1, max = 120))]
    pub vendor: String,
    pub current_stock: i64,
    pub reorder_level: i64,
    #[serde(default)]
    pub max_stock_level: i64,
    pub price: Decimal,
    #[serde(default)]
    pub auto_restock_enabled: bool,
    pub warehouse_id: Option<i64>,
}

/// Request payload for updating a product; absent fields keep their value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub vendor: Option<String>,
    pub current_stock: Option<i64>,
    pub reorder_level: Option<i64>,
    pub max_stock_level: Option<i64>,
    pub price: Option<Decimal>,
    pub auto_restock_enabled: Option<bool>,
}

/// Optional list filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub warehouse_id: Option<i64>,
    pub category: Option<String>,
    pub stock_status: Option<StockStatus>,
}

#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductStore>,
    warehouses: Arc<dyn WarehouseStore>,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductStore>, warehouses: Arc<dyn WarehouseStore>) -> Self {
        Self {
            products,
            warehouses,
        }
    }

    /// List products visible to the caller, optionally filtered
    pub async fn list(
        &self,
        current_user: &AuthUser,
        query: &ProductQuery,
    ) -> AppResult<Vec<Product>> {
        let scope = resolve_warehouse_scope(current_user, query.warehouse_id)?;
        let mut products = self.products.list_products(&scope).await?;

        if let Some(category) = query.category.as_deref().map(str::trim) {
            if !category.is_empty() {
                products.retain(|product| {
                    product.category.to_lowercase() == category.to_lowercase()
                });
            }
        }
        if let Some(status) = query.stock_status {
            products.retain(|product| product.stock_status() == status);
        }

        Ok(products)
    }

    /// Fetch a product by id, honouring the caller's warehouse scope
    pub async fn get(&self, current_user: &AuthUser, product_id: i64) -> AppResult<Product> {
        let scope = resolve_warehouse_scope(current_user, None)?;
        let product = self
            .products
            .find_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        if let Some(warehouse_id) = scope.warehouse_id() {
            if product.warehouse_id != warehouse_id {
                return Err(AppError::NotFound("Product".to_string()));
            }
        }
        Ok(product)
    }

    /// Create a product in the caller's warehouse
    pub async fn create(
        &self,
        current_user: &AuthUser,
        input: CreateProductInput,
    ) -> AppResult<Product> {
        input
            .validate()
            .map_err(|err| AppError::Validation(err.to_string()))?;
        validate_stock_fields(
            input.current_stock,
            input.reorder_level,
            input.max_stock_level,
            input.price,
        )?;

        let scope = resolve_warehouse_scope(current_user, input.warehouse_id)?;
        let warehouse_id = require_single_warehouse(scope)?;
        if self.warehouses.find_warehouse(warehouse_id).await?.is_none() {
            return Err(AppError::NotFound("Warehouse".to_string()));
        }

        let sku = input.sku.trim().to_string();
        if self.products.sku_exists(&sku).await? {
            return Err(AppError::DuplicateEntry("sku".to_string()));
        }

        self.products
            .insert_product(NewProduct {
                sku,
                name: input.name.trim().to_string(),
                category: input.category.trim().to_string(),
                vendor: input.vendor.trim().to_string(),
                current_stock: input.current_stock,
                reorder_level: input.reorder_level,
                max_stock_level: input.max_stock_level,
                price: input.price,
                auto_restock_enabled: input.auto_restock_enabled,
                warehouse_id,
            })
            .await
    }

    /// Update a product, preserving the stock invariants
    pub async fn update(
        &self,
        current_user: &AuthUser,
        product_id: i64,
        input: UpdateProductInput,
    ) -> AppResult<Product> {
        let mut product = self.get(current_user, product_id).await?;

        if let Some(name) = input.name {
            product.name = name.trim().to_string();
        }
        if let Some(category) = input.category {
            product.category = category.trim().to_string();
        }
        if let Some(vendor) = input.vendor {
            product.vendor = vendor.trim().to_string();
        }
        if let Some(current_stock) = input.current_stock {
            product.current_stock = current_stock;
        }
        if let Some(reorder_level) = input.reorder_level {
            product.reorder_level = reorder_level;
        }
        if let Some(max_stock_level) = input.max_stock_level {
            product.max_stock_level = max_stock_level;
        }
        if let Some(price) = input.price {
            product.price = price;
        }
        if let Some(auto_restock_enabled) = input.auto_restock_enabled {
            product.auto_restock_enabled = auto_restock_enabled;
        }

        validate_stock_fields(
            product.current_stock,
            product.reorder_level,
            product.max_stock_level,
            product.price,
        )?;

        self.products.update_product(&product).await?;
        Ok(product)
    }
}

fn validate_stock_fields(
    current_stock: i64,
    reorder_level: i64,
    max_stock_level: i64,
    price: Decimal,
) -> AppResult<()> {
    if current_stock < 0 {
        return Err(AppError::Validation(
            "Current stock cannot be negative".to_string(),
        ));
    }
    if reorder_level < 0 {
        return Err(AppError::Validation(
            "Reorder level cannot be negative".to_string(),
        ));
    }
    if max_stock_level < 0 {
        return Err(AppError::Validation(
            "Max stock level cannot be negative".to_string(),
        ));
    }
    if max_stock_level > 0 && max_stock_level < reorder_level {
        return Err(AppError::Validation(
            "Max stock level must be at least the reorder level".to_string(),
        ));
    }
    if price < Decimal::ZERO {
        return Err(AppError::Validation(
            "Price cannot be negative".to_string(),
        ));
    }
    Ok(())
}
