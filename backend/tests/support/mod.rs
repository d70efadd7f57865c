//! In-memory store fakes and fixtures shared by the integration tests
#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use stockpilot_backend::authz::WarehouseScope;
use stockpilot_backend::error::{AppError, AppResult};
use stockpilot_backend::external::{DispatchOptions, DispatchReport, VendorDispatcher};
use stockpilot_backend::middleware::AuthUser;
use stockpilot_backend::models::{
    Product, PurchaseOrder, PurchaseOrderItem, Role, Sale, User, Warehouse,
};
use stockpilot_backend::services::demand::{
    aggregate_by_product, ActivityRecord, ProductDemandAggregate,
};
use stockpilot_backend::store::{
    DemandAggregateStore, NewProduct, NewPurchaseOrder, NewSale, NewUser, NewWarehouse,
    ProductStore, PurchaseOrderStore, SaleStore, SalesTotals, UserStore, WarehouseStore,
};

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub fn admin() -> AuthUser {
    AuthUser {
        id: 1,
        role: Role::Admin,
        warehouse_id: None,
    }
}

pub fn manager(warehouse_id: i64) -> AuthUser {
    AuthUser {
        id: 2,
        role: Role::Manager,
        warehouse_id: Some(warehouse_id),
    }
}

pub fn end_user(id: i64) -> AuthUser {
    AuthUser {
        id,
        role: Role::User,
        warehouse_id: None,
    }
}

pub fn warehouse(id: i64, name: &str, code: &str) -> Warehouse {
    Warehouse {
        id,
        name: name.to_string(),
        location_code: code.to_string(),
        active: true,
        created_at: at(2024, 1, 1),
    }
}

pub fn user(id: i64, role: Role, warehouse_id: Option<i64>) -> User {
    User {
        id,
        full_name: format!("Test User {}", id),
        email: format!("user{}@example.com", id),
        password_hash: String::new(),
        role,
        warehouse_id,
        created_at: at(2024, 1, 1),
    }
}

pub fn product(id: i64, warehouse_id: i64) -> Product {
    Product {
        id,
        sku: format!("SKU-{:04}", id),
        name: format!("Product {}", id),
        category: "General".to_string(),
        vendor: "Acme Supply".to_string(),
        current_stock: 100,
        reorder_level: 10,
        max_stock_level: 0,
        price: dec("10.00"),
        auto_restock_enabled: false,
        warehouse_id,
        created_at: at(2024, 1, 1),
        updated_at: at(2024, 1, 1),
    }
}

/// In-memory implementation of all store traits
#[derive(Default)]
pub struct MemoryStore {
    pub warehouses: Mutex<Vec<Warehouse>>,
    pub users: Mutex<Vec<User>>,
    pub products: Mutex<Vec<Product>>,
    pub sales: Mutex<Vec<Sale>>,
    pub orders: Mutex<Vec<PurchaseOrder>>,
    next_id: Mutex<i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(1000),
            ..Default::default()
        }
    }

    fn allocate_id(&self) -> i64 {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        *next
    }

    pub fn add_warehouse(&self, warehouse: Warehouse) {
        self.warehouses.lock().unwrap().push(warehouse);
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub fn add_product(&self, product: Product) {
        self.products.lock().unwrap().push(product);
    }

    /// Record a historical sale without touching stock
    pub fn add_sale_at(&self, product: &Product, quantity: i64, occurred_at: DateTime<Utc>) {
        let id = self.allocate_id();
        self.sales.lock().unwrap().push(Sale {
            id,
            user_id: 1,
            product_id: product.id,
            warehouse_id: product.warehouse_id,
            product_name: product.name.clone(),
            product_sku: product.sku.clone(),
            warehouse_name: "Warehouse".to_string(),
            warehouse_code: "WH".to_string(),
            quantity,
            unit_price: product.price,
            total_price: product.price * Decimal::from(quantity),
            purchased_at: occurred_at,
        });
    }

    /// Record a historical restock order directly, bypassing pricing
    pub fn add_restock_order_at(
        &self,
        lines: &[(&Product, i64)],
        submitted_at: DateTime<Utc>,
    ) {
        let order_id = self.allocate_id();
        let items: Vec<PurchaseOrderItem> = lines
            .iter()
            .map(|(product, quantity)| PurchaseOrderItem {
                id: self.allocate_id(),
                purchase_order_id: order_id,
                product_id: product.id,
                product_name: product.name.clone(),
                product_sku: product.sku.clone(),
                quantity: *quantity,
                unit_price: product.price,
                line_total: product.price * Decimal::from(*quantity),
            })
            .collect();
        let subtotal: Decimal = items.iter().map(|item| item.line_total).sum();
        self.orders.lock().unwrap().push(PurchaseOrder {
            id: order_id,
            reference: format!("PO-{:08X}", order_id),
            status: stockpilot_backend::models::PurchaseOrderStatus::SentToVendor,
            vendor_name: "Acme Supply".to_string(),
            vendor_email: None,
            vendor_phone: None,
            vendor_contact_preference: None,
            notes: None,
            warehouse_id: lines
                .first()
                .map(|(product, _)| product.warehouse_id)
                .unwrap_or(1),
            warehouse_name: "Warehouse".to_string(),
            created_by: 1,
            created_by_name: "Test User 1".to_string(),
            expected_delivery_date: None,
            submitted_at,
            created_at: submitted_at,
            updated_at: submitted_at,
            subtotal_amount: subtotal,
            tax_amount: Decimal::ZERO,
            shipping_amount: Decimal::ZERO,
            total_amount: subtotal,
            items,
        });
    }

    pub fn product_by_id(&self, id: i64) -> Option<Product> {
        self.products
            .lock()
            .unwrap()
            .iter()
            .find(|product| product.id == id)
            .cloned()
    }

    pub fn order_by_id(&self, id: i64) -> Option<PurchaseOrder> {
        self.orders
            .lock()
            .unwrap()
            .iter()
            .find(|order| order.id == id)
            .cloned()
    }

    fn in_scope(warehouse_id: i64, scope: &WarehouseScope) -> bool {
        match scope {
            WarehouseScope::All => true,
            WarehouseScope::Warehouse(id) => warehouse_id == *id,
        }
    }

    fn sale_activity(&self, scope: &WarehouseScope) -> Vec<ActivityRecord> {
        self.sales
            .lock()
            .unwrap()
            .iter()
            .filter(|sale| Self::in_scope(sale.warehouse_id, scope))
            .map(|sale| ActivityRecord {
                product_id: sale.product_id,
                product_name: sale.product_name.clone(),
                product_sku: sale.product_sku.clone(),
                source_id: sale.id,
                quantity: sale.quantity,
                amount: sale.total_price,
                occurred_at: sale.purchased_at,
            })
            .collect()
    }

    fn restock_activity(&self, scope: &WarehouseScope) -> Vec<ActivityRecord> {
        self.orders
            .lock()
            .unwrap()
            .iter()
            .filter(|order| Self::in_scope(order.warehouse_id, scope))
            .flat_map(|order| {
                order
                    .items
                    .iter()
                    .map(|item| ActivityRecord {
                        product_id: item.product_id,
                        product_name: item.product_name.clone(),
                        product_sku: item.product_sku.clone(),
                        source_id: order.id,
                        quantity: item.quantity,
                        amount: item.line_total,
                        occurred_at: order.submitted_at,
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list_products(&self, scope: &WarehouseScope) -> AppResult<Vec<Product>> {
        let mut products: Vec<Product> = self
            .products
            .lock()
            .unwrap()
            .iter()
            .filter(|product| Self::in_scope(product.warehouse_id, scope))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn find_product(&self, id: i64) -> AppResult<Option<Product>> {
        Ok(self.product_by_id(id))
    }

    async fn sku_exists(&self, sku: &str) -> AppResult<bool> {
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .any(|product| product.sku.eq_ignore_ascii_case(sku)))
    }

    async fn insert_product(&self, new: NewProduct) -> AppResult<Product> {
        let product = Product {
            id: self.allocate_id(),
            sku: new.sku,
            name: new.name,
            category: new.category,
            vendor: new.vendor,
            current_stock: new.current_stock,
            reorder_level: new.reorder_level,
            max_stock_level: new.max_stock_level,
            price: new.price,
            auto_restock_enabled: new.auto_restock_enabled,
            warehouse_id: new.warehouse_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.products.lock().unwrap().push(product.clone());
        Ok(product)
    }

    async fn update_product(&self, updated: &Product) -> AppResult<()> {
        let mut products = self.products.lock().unwrap();
        if let Some(existing) = products.iter_mut().find(|p| p.id == updated.id) {
            *existing = updated.clone();
        }
        Ok(())
    }
}

#[async_trait]
impl WarehouseStore for MemoryStore {
    async fn list_warehouses(&self) -> AppResult<Vec<Warehouse>> {
        Ok(self.warehouses.lock().unwrap().clone())
    }

    async fn find_warehouse(&self, id: i64) -> AppResult<Option<Warehouse>> {
        Ok(self
            .warehouses
            .lock()
            .unwrap()
            .iter()
            .find(|warehouse| warehouse.id == id)
            .cloned())
    }

    async fn warehouse_exists(&self, name: &str, location_code: &str) -> AppResult<bool> {
        Ok(self.warehouses.lock().unwrap().iter().any(|warehouse| {
            warehouse.name.eq_ignore_ascii_case(name)
                || warehouse.location_code.eq_ignore_ascii_case(location_code)
        }))
    }

    async fn insert_warehouse(&self, new: NewWarehouse) -> AppResult<Warehouse> {
        let warehouse = Warehouse {
            id: self.allocate_id(),
            name: new.name,
            location_code: new.location_code,
            active: true,
            created_at: Utc::now(),
        };
        self.warehouses.lock().unwrap().push(warehouse.clone());
        Ok(warehouse)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.id == id)
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        Ok(self.find_user_by_email(email).await?.is_some())
    }

    async fn insert_user(&self, new: NewUser) -> AppResult<User> {
        let user = User {
            id: self.allocate_id(),
            full_name: new.full_name,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            warehouse_id: new.warehouse_id,
            created_at: Utc::now(),
        };
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl SaleStore for MemoryStore {
    async fn record_sale(&self, new: NewSale) -> AppResult<Sale> {
        let mut products = self.products.lock().unwrap();
        let product = products
            .iter_mut()
            .find(|product| product.id == new.product_id)
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        if product.current_stock < new.quantity {
            return Err(AppError::InsufficientStock(
                "Insufficient stock for this product".to_string(),
            ));
        }
        product.current_stock -= new.quantity;
        drop(products);

        let sale = Sale {
            id: self.allocate_id(),
            user_id: new.user_id,
            product_id: new.product_id,
            warehouse_id: new.warehouse_id,
            product_name: new.product_name,
            product_sku: new.product_sku,
            warehouse_name: new.warehouse_name,
            warehouse_code: new.warehouse_code,
            quantity: new.quantity,
            unit_price: new.unit_price,
            total_price: new.total_price,
            purchased_at: Utc::now(),
        };
        self.sales.lock().unwrap().push(sale.clone());
        Ok(sale)
    }

    async fn sales_for_user(&self, user_id: i64) -> AppResult<Vec<Sale>> {
        let mut sales: Vec<Sale> = self
            .sales
            .lock()
            .unwrap()
            .iter()
            .filter(|sale| sale.user_id == user_id)
            .cloned()
            .collect();
        sales.sort_by(|a, b| b.purchased_at.cmp(&a.purchased_at));
        Ok(sales)
    }

    async fn sales_summary(&self, scope: &WarehouseScope) -> AppResult<SalesTotals> {
        let sales = self.sales.lock().unwrap();
        let scoped: Vec<&Sale> = sales
            .iter()
            .filter(|sale| Self::in_scope(sale.warehouse_id, scope))
            .collect();
        Ok(SalesTotals {
            total_orders: scoped.len() as i64,
            total_items: scoped.iter().map(|sale| sale.quantity).sum(),
            total_revenue: scoped.iter().map(|sale| sale.total_price).sum(),
        })
    }

    async fn recent_sales(&self, warehouse_id: i64, limit: i64) -> AppResult<Vec<Sale>> {
        let mut sales: Vec<Sale> = self
            .sales
            .lock()
            .unwrap()
            .iter()
            .filter(|sale| sale.warehouse_id == warehouse_id)
            .cloned()
            .collect();
        sales.sort_by(|a, b| b.purchased_at.cmp(&a.purchased_at));
        sales.truncate(limit as usize);
        Ok(sales)
    }
}

#[async_trait]
impl DemandAggregateStore for MemoryStore {
    async fn product_demand_totals(
        &self,
        scope: &WarehouseScope,
    ) -> AppResult<Vec<ProductDemandAggregate>> {
        let rows = self.sale_activity(scope);
        let mut totals: Vec<ProductDemandAggregate> =
            aggregate_by_product(&rows).into_values().collect();
        totals.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
        Ok(totals)
    }

    async fn sales_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        scope: &WarehouseScope,
    ) -> AppResult<Vec<ActivityRecord>> {
        Ok(self
            .sale_activity(scope)
            .into_iter()
            .filter(|row| row.occurred_at >= start && row.occurred_at < end)
            .collect())
    }

    async fn restock_items_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        scope: &WarehouseScope,
    ) -> AppResult<Vec<ActivityRecord>> {
        Ok(self
            .restock_activity(scope)
            .into_iter()
            .filter(|row| row.occurred_at >= start && row.occurred_at < end)
            .collect())
    }
}

#[async_trait]
impl PurchaseOrderStore for MemoryStore {
    async fn save_order(&self, new: NewPurchaseOrder) -> AppResult<PurchaseOrder> {
        if self.reference_exists(&new.reference).await? {
            return Err(AppError::DuplicateEntry("reference".to_string()));
        }
        let order_id = self.allocate_id();
        let items = new
            .items
            .into_iter()
            .map(|item| PurchaseOrderItem {
                id: self.allocate_id(),
                purchase_order_id: order_id,
                product_id: item.product_id,
                product_name: item.product_name,
                product_sku: item.product_sku,
                quantity: item.quantity,
                unit_price: item.unit_price,
                line_total: item.line_total,
            })
            .collect();
        let order = PurchaseOrder {
            id: order_id,
            reference: new.reference,
            status: new.status,
            vendor_name: new.vendor_name,
            vendor_email: new.vendor_email,
            vendor_phone: new.vendor_phone,
            vendor_contact_preference: new.vendor_contact_preference,
            notes: new.notes,
            warehouse_id: new.warehouse_id,
            warehouse_name: new.warehouse_name,
            created_by: new.created_by,
            created_by_name: new.created_by_name,
            expected_delivery_date: new.expected_delivery_date,
            submitted_at: new.submitted_at,
            created_at: new.submitted_at,
            updated_at: new.submitted_at,
            subtotal_amount: new.subtotal_amount,
            tax_amount: new.tax_amount,
            shipping_amount: new.shipping_amount,
            total_amount: new.total_amount,
            items,
        };
        self.orders.lock().unwrap().push(order.clone());
        Ok(order)
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        status: stockpilot_backend::models::PurchaseOrderStatus,
        notes: Option<&str>,
    ) -> AppResult<()> {
        let mut orders = self.orders.lock().unwrap();
        if let Some(order) = orders.iter_mut().find(|order| order.id == order_id) {
            order.status = status;
            order.notes = notes.map(|n| n.to_string());
        }
        Ok(())
    }

    async fn reference_exists(&self, reference: &str) -> AppResult<bool> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .any(|order| order.reference.eq_ignore_ascii_case(reference)))
    }

    async fn list_orders(&self, scope: &WarehouseScope) -> AppResult<Vec<PurchaseOrder>> {
        let mut orders: Vec<PurchaseOrder> = self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|order| Self::in_scope(order.warehouse_id, scope))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

/// Dispatcher stub returning a preconfigured report
pub struct StubDispatcher {
    pub report: DispatchReport,
    pub calls: Mutex<Vec<DispatchOptions>>,
}

impl StubDispatcher {
    pub fn new(report: DispatchReport) -> Self {
        Self {
            report,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(DispatchReport {
            email_dispatched: true,
            sms_dispatched: false,
            failure_message: None,
        })
    }

    pub fn failing(message: &str) -> Self {
        Self::new(DispatchReport {
            email_dispatched: false,
            sms_dispatched: false,
            failure_message: Some(message.to_string()),
        })
    }
}

#[async_trait]
impl VendorDispatcher for StubDispatcher {
    async fn dispatch(&self, _order: &PurchaseOrder, options: DispatchOptions) -> DispatchReport {
        self.calls.lock().unwrap().push(options);
        self.report.clone()
    }
}
