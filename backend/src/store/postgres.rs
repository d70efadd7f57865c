//! PostgreSQL store implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::authz::WarehouseScope;
use crate::error::{AppError, AppResult};
use crate::models::{Product, PurchaseOrder, PurchaseOrderItem, PurchaseOrderStatus, Sale, User, Warehouse};
use crate::services::demand::{ActivityRecord, ProductDemandAggregate};

use super::{
    DemandAggregateStore, NewProduct, NewPurchaseOrder, NewSale, NewUser, NewWarehouse,
    ProductStore, PurchaseOrderStore, SaleStore, SalesTotals, UserStore, WarehouseStore,
};

const PRODUCT_COLUMNS: &str = "id, sku, name, category, vendor, current_stock, reorder_level, \
     max_stock_level, price, auto_restock_enabled, warehouse_id, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, reference, status, vendor_name, vendor_email, vendor_phone, \
     vendor_contact_preference, notes, warehouse_id, warehouse_name, created_by, created_by_name, \
     expected_delivery_date, submitted_at, created_at, updated_at, subtotal_amount, tax_amount, \
     shipping_amount, total_amount";

const SALE_COLUMNS: &str = "id, user_id, product_id, warehouse_id, product_name, product_sku, \
     warehouse_name, warehouse_code, quantity, unit_price, total_price, purchased_at";

/// Store backed by a PostgreSQL connection pool
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn list_products(&self, scope: &WarehouseScope) -> AppResult<Vec<Product>> {
        let products = match scope {
            WarehouseScope::All => {
                sqlx::query_as::<_, Product>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name"
                ))
                .fetch_all(&self.db)
                .await?
            }
            WarehouseScope::Warehouse(id) => {
                sqlx::query_as::<_, Product>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE warehouse_id = $1 ORDER BY name"
                ))
                .bind(id)
                .fetch_all(&self.db)
                .await?
            }
        };
        Ok(products)
    }

    async fn find_product(&self, id: i64) -> AppResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(product)
    }

    async fn sku_exists(&self, sku: &str) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE lower(sku) = lower($1))",
        )
        .bind(sku)
        .fetch_one(&self.db)
        .await?;
        Ok(exists)
    }

    async fn insert_product(&self, new: NewProduct) -> AppResult<Product> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (
                sku, name, category, vendor, current_stock, reorder_level,
                max_stock_level, price, auto_restock_enabled, warehouse_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&new.sku)
        .bind(&new.name)
        .bind(&new.category)
        .bind(&new.vendor)
        .bind(new.current_stock)
        .bind(new.reorder_level)
        .bind(new.max_stock_level)
        .bind(new.price)
        .bind(new.auto_restock_enabled)
        .bind(new.warehouse_id)
        .fetch_one(&self.db)
        .await
        .map_err(|err| map_unique_violation(err, "sku"))?;
        Ok(product)
    }

    async fn update_product(&self, product: &Product) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE products
            SET name = $1, category = $2, vendor = $3, current_stock = $4,
                reorder_level = $5, max_stock_level = $6, price = $7,
                auto_restock_enabled = $8, updated_at = NOW()
            WHERE id = $9
            "#,
        )
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.vendor)
        .bind(product.current_stock)
        .bind(product.reorder_level)
        .bind(product.max_stock_level)
        .bind(product.price)
        .bind(product.auto_restock_enabled)
        .bind(product.id)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl WarehouseStore for PgStore {
    async fn list_warehouses(&self) -> AppResult<Vec<Warehouse>> {
        let warehouses = sqlx::query_as::<_, Warehouse>(
            "SELECT id, name, location_code, active, created_at FROM warehouses ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(warehouses)
    }

    async fn find_warehouse(&self, id: i64) -> AppResult<Option<Warehouse>> {
        let warehouse = sqlx::query_as::<_, Warehouse>(
            "SELECT id, name, location_code, active, created_at FROM warehouses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(warehouse)
    }

    async fn warehouse_exists(&self, name: &str, location_code: &str) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM warehouses \
             WHERE lower(name) = lower($1) OR lower(location_code) = lower($2))",
        )
        .bind(name)
        .bind(location_code)
        .fetch_one(&self.db)
        .await?;
        Ok(exists)
    }

    async fn insert_warehouse(&self, new: NewWarehouse) -> AppResult<Warehouse> {
        let warehouse = sqlx::query_as::<_, Warehouse>(
            r#"
            INSERT INTO warehouses (name, location_code)
            VALUES ($1, $2)
            RETURNING id, name, location_code, active, created_at
            "#,
        )
        .bind(&new.name)
        .bind(&new.location_code)
        .fetch_one(&self.db)
        .await
        .map_err(|err| map_unique_violation(err, "warehouse"))?;
        Ok(warehouse)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, full_name, email, password_hash, role, warehouse_id, created_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, full_name, email, password_hash, role, warehouse_id, created_at \
             FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE lower(email) = lower($1))",
        )
        .bind(email)
        .fetch_one(&self.db)
        .await?;
        Ok(exists)
    }

    async fn insert_user(&self, new: NewUser) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (full_name, email, password_hash, role, warehouse_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, full_name, email, password_hash, role, warehouse_id, created_at
            "#,
        )
        .bind(&new.full_name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role)
        .bind(new.warehouse_id)
        .fetch_one(&self.db)
        .await
        .map_err(|err| map_unique_violation(err, "email"))?;
        Ok(user)
    }
}

#[async_trait]
impl SaleStore for PgStore {
    async fn record_sale(&self, new: NewSale) -> AppResult<Sale> {
        let mut tx = self.db.begin().await?;

        // Conditional decrement: zero rows affected means a concurrent sale
        // drained the stock first, and nothing is committed.
        let updated = sqlx::query(
            "UPDATE products SET current_stock = current_stock - $1, updated_at = NOW() \
             WHERE id = $2 AND current_stock >= $1",
        )
        .bind(new.quantity)
        .bind(new.product_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::InsufficientStock(
                "Insufficient stock for this product".to_string(),
            ));
        }

        let sale = sqlx::query_as::<_, Sale>(&format!(
            r#"
            INSERT INTO sales (
                user_id, product_id, warehouse_id, product_name, product_sku,
                warehouse_name, warehouse_code, quantity, unit_price, total_price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(new.product_id)
        .bind(new.warehouse_id)
        .bind(&new.product_name)
        .bind(&new.product_sku)
        .bind(&new.warehouse_name)
        .bind(&new.warehouse_code)
        .bind(new.quantity)
        .bind(new.unit_price)
        .bind(new.total_price)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(sale)
    }

    async fn sales_for_user(&self, user_id: i64) -> AppResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE user_id = $1 ORDER BY purchased_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(sales)
    }

    async fn sales_summary(&self, scope: &WarehouseScope) -> AppResult<SalesTotals> {
        let totals = match scope {
            WarehouseScope::All => {
                sqlx::query_as::<_, SalesTotals>(
                    "SELECT COUNT(id) AS total_orders, \
                            COALESCE(SUM(quantity), 0)::BIGINT AS total_items, \
                            COALESCE(SUM(total_price), 0) AS total_revenue \
                     FROM sales",
                )
                .fetch_one(&self.db)
                .await?
            }
            WarehouseScope::Warehouse(id) => {
                sqlx::query_as::<_, SalesTotals>(
                    "SELECT COUNT(id) AS total_orders, \
                            COALESCE(SUM(quantity), 0)::BIGINT AS total_items, \
                            COALESCE(SUM(total_price), 0) AS total_revenue \
                     FROM sales WHERE warehouse_id = $1",
                )
                .bind(id)
                .fetch_one(&self.db)
                .await?
            }
        };
        Ok(totals)
    }

    async fn recent_sales(&self, warehouse_id: i64, limit: i64) -> AppResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE warehouse_id = $1 \
             ORDER BY purchased_at DESC LIMIT $2"
        ))
        .bind(warehouse_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        Ok(sales)
    }
}

#[async_trait]
impl DemandAggregateStore for PgStore {
    async fn product_demand_totals(
        &self,
        scope: &WarehouseScope,
    ) -> AppResult<Vec<ProductDemandAggregate>> {
        let base = "SELECT s.product_id, s.product_name, s.product_sku, \
                           COALESCE(SUM(s.quantity), 0)::BIGINT AS total_quantity, \
                           COUNT(s.id) AS total_orders, \
                           COALESCE(SUM(s.total_price), 0) AS total_amount, \
                           MIN(s.purchased_at) AS earliest, \
                           MAX(s.purchased_at) AS latest \
                    FROM sales s";
        let tail = "GROUP BY s.product_id, s.product_name, s.product_sku \
                    ORDER BY total_quantity DESC";
        let aggregates = match scope {
            WarehouseScope::All => {
                sqlx::query_as::<_, ProductDemandAggregate>(&format!("{base} {tail}"))
                    .fetch_all(&self.db)
                    .await?
            }
            WarehouseScope::Warehouse(id) => {
                sqlx::query_as::<_, ProductDemandAggregate>(&format!(
                    "{base} WHERE s.warehouse_id = $1 {tail}"
                ))
                .bind(id)
                .fetch_all(&self.db)
                .await?
            }
        };
        Ok(aggregates)
    }

    async fn sales_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        scope: &WarehouseScope,
    ) -> AppResult<Vec<ActivityRecord>> {
        let base = "SELECT product_id, product_name, product_sku, id AS source_id, \
                           quantity, total_price AS amount, purchased_at AS occurred_at \
                    FROM sales WHERE purchased_at >= $1 AND purchased_at < $2";
        let rows = match scope {
            WarehouseScope::All => {
                sqlx::query_as::<_, ActivityRecord>(base)
                    .bind(start)
                    .bind(end)
                    .fetch_all(&self.db)
                    .await?
            }
            WarehouseScope::Warehouse(id) => {
                sqlx::query_as::<_, ActivityRecord>(&format!("{base} AND warehouse_id = $3"))
                    .bind(start)
                    .bind(end)
                    .bind(id)
                    .fetch_all(&self.db)
                    .await?
            }
        };
        Ok(rows)
    }

    async fn restock_items_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        scope: &WarehouseScope,
    ) -> AppResult<Vec<ActivityRecord>> {
        let base = "SELECT i.product_id, i.product_name, i.product_sku, \
                           i.purchase_order_id AS source_id, i.quantity, \
                           i.line_total AS amount, o.submitted_at AS occurred_at \
                    FROM purchase_order_items i \
                    JOIN purchase_orders o ON o.id = i.purchase_order_id \
                    WHERE o.submitted_at >= $1 AND o.submitted_at < $2";
        let rows = match scope {
            WarehouseScope::All => {
                sqlx::query_as::<_, ActivityRecord>(base)
                    .bind(start)
                    .bind(end)
                    .fetch_all(&self.db)
                    .await?
            }
            WarehouseScope::Warehouse(id) => {
                sqlx::query_as::<_, ActivityRecord>(&format!("{base} AND o.warehouse_id = $3"))
                    .bind(start)
                    .bind(end)
                    .bind(id)
                    .fetch_all(&self.db)
                    .await?
            }
        };
        Ok(rows)
    }
}

#[async_trait]
impl PurchaseOrderStore for PgStore {
    async fn save_order(&self, new: NewPurchaseOrder) -> AppResult<PurchaseOrder> {
        let mut tx = self.db.begin().await?;

        let mut order = sqlx::query_as::<_, PurchaseOrder>(&format!(
            r#"
            INSERT INTO purchase_orders (
                reference, status, vendor_name, vendor_email, vendor_phone,
                vendor_contact_preference, notes, warehouse_id, warehouse_name,
                created_by, created_by_name, expected_delivery_date, submitted_at,
                subtotal_amount, tax_amount, shipping_amount, total_amount
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(&new.reference)
        .bind(new.status)
        .bind(&new.vendor_name)
        .bind(&new.vendor_email)
        .bind(&new.vendor_phone)
        .bind(&new.vendor_contact_preference)
        .bind(&new.notes)
        .bind(new.warehouse_id)
        .bind(&new.warehouse_name)
        .bind(new.created_by)
        .bind(&new.created_by_name)
        .bind(new.expected_delivery_date)
        .bind(new.submitted_at)
        .bind(new.subtotal_amount)
        .bind(new.tax_amount)
        .bind(new.shipping_amount)
        .bind(new.total_amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| map_unique_violation(err, "reference"))?;

        for item in &new.items {
            let saved_item = sqlx::query_as::<_, PurchaseOrderItem>(
                r#"
                INSERT INTO purchase_order_items (
                    purchase_order_id, product_id, product_name, product_sku,
                    quantity, unit_price, line_total
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, purchase_order_id, product_id, product_name, product_sku,
                          quantity, unit_price, line_total
                "#,
            )
            .bind(order.id)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(&item.product_sku)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.line_total)
            .fetch_one(&mut *tx)
            .await?;
            order.items.push(saved_item);
        }

        tx.commit().await?;
        Ok(order)
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        status: PurchaseOrderStatus,
        notes: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE purchase_orders SET status = $1, notes = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(status)
        .bind(notes)
        .bind(order_id)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn reference_exists(&self, reference: &str) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM purchase_orders WHERE upper(reference) = upper($1))",
        )
        .bind(reference)
        .fetch_one(&self.db)
        .await?;
        Ok(exists)
    }

    async fn list_orders(&self, scope: &WarehouseScope) -> AppResult<Vec<PurchaseOrder>> {
        let mut orders = match scope {
            WarehouseScope::All => {
                sqlx::query_as::<_, PurchaseOrder>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM purchase_orders ORDER BY created_at DESC"
                ))
                .fetch_all(&self.db)
                .await?
            }
            WarehouseScope::Warehouse(id) => {
                sqlx::query_as::<_, PurchaseOrder>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM purchase_orders \
                     WHERE warehouse_id = $1 ORDER BY created_at DESC"
                ))
                .bind(id)
                .fetch_all(&self.db)
                .await?
            }
        };

        if orders.is_empty() {
            return Ok(orders);
        }

        let order_ids: Vec<i64> = orders.iter().map(|order| order.id).collect();
        let items = sqlx::query_as::<_, PurchaseOrderItem>(
            "SELECT id, purchase_order_id, product_id, product_name, product_sku, \
                    quantity, unit_price, line_total \
             FROM purchase_order_items WHERE purchase_order_id = ANY($1) ORDER BY id",
        )
        .bind(&order_ids)
        .fetch_all(&self.db)
        .await?;

        for item in items {
            if let Some(order) = orders
                .iter_mut()
                .find(|order| order.id == item.purchase_order_id)
            {
                order.items.push(item);
            }
        }

        Ok(orders)
    }
}

/// Translate a unique-index violation into the conflict error for `field`,
/// passing every other database error through untouched.
fn map_unique_violation(err: sqlx::Error, field: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AppError::DuplicateEntry(field.to_string());
        }
    }
    AppError::Database(err)
}
