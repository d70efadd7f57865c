//! Purchase order lifecycle
//!
//! Creation prices the line items, generates a unique reference, persists
//! the order at `PENDING_VENDOR_APPROVAL`, then attempts vendor dispatch on
//! the requested channels. Any successful channel moves the order to
//! `SENT_TO_VENDOR`; any failed channel moves it to `NOTIFICATION_FAILED`
//! and appends a note. Failure assignment happens second, so it wins when
//! the channels disagree. The order itself is created either way.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::authz::{require_single_warehouse, resolve_warehouse_scope};
use crate::error::{AppError, AppResult};
use crate::external::{DispatchOptions, VendorDispatcher};
use crate::middleware::AuthUser;
use crate::models::{PurchaseOrder, PurchaseOrderStatus};
use crate::store::{
    NewPurchaseOrder, NewPurchaseOrderItem, ProductStore, PurchaseOrderStore, UserStore,
    WarehouseStore,
};

/// Request payload for creating a purchase order
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePurchaseOrderInput {
    pub warehouse_id: Option<i64>,
    #[validate(length(min = 1, max = 150))]
    pub vendor_name: String,
    #[validate(email)]
    pub vendor_email: Option<String>,
    pub vendor_phone: Option<String>,
    pub vendor_contact_preference: Option<String>,
    #[validate(length(max = 250))]
    pub notes: Option<String>,
    pub expected_delivery_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub send_email: bool,
    #[serde(default)]
    pub send_sms: bool,
    pub items: Vec<PurchaseOrderItemInput>,
}

/// One requested line item
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseOrderItemInput {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Decimal,
}

#[derive(Clone)]
pub struct PurchaseOrderService {
    orders: Arc<dyn PurchaseOrderStore>,
    products: Arc<dyn ProductStore>,
    warehouses: Arc<dyn WarehouseStore>,
    users: Arc<dyn UserStore>,
    dispatcher: Arc<dyn VendorDispatcher>,
}

impl PurchaseOrderService {
    pub fn new(
        orders: Arc<dyn PurchaseOrderStore>,
        products: Arc<dyn ProductStore>,
        warehouses: Arc<dyn WarehouseStore>,
        users: Arc<dyn UserStore>,
        dispatcher: Arc<dyn VendorDispatcher>,
    ) -> Self {
        Self {
            orders,
            products,
            warehouses,
            users,
            dispatcher,
        }
    }

    /// List purchase orders visible to the caller, newest first
    pub async fn list(
        &self,
        current_user: &AuthUser,
        warehouse_id: Option<i64>,
    ) -> AppResult<Vec<PurchaseOrder>> {
        let scope = resolve_warehouse_scope(current_user, warehouse_id)?;
        self.orders.list_orders(&scope).await
    }

    /// Create a purchase order and dispatch it to the vendor.
    ///
    /// Validation failures reject the whole request before anything is
    /// persisted. Dispatch failures do not: the order is saved first and the
    /// failure is recorded on it as a status change plus a note.
    pub async fn create(
        &self,
        current_user: &AuthUser,
        input: CreatePurchaseOrderInput,
    ) -> AppResult<PurchaseOrder> {
        input
            .validate()
            .map_err(|err| AppError::Validation(err.to_string()))?;

        if input.items.is_empty() {
            return Err(AppError::Validation(
                "At least one item is required for a purchase order".to_string(),
            ));
        }

        let vendor_name = input.vendor_name.trim().to_string();
        if vendor_name.is_empty() {
            return Err(AppError::Validation("Vendor name is required".to_string()));
        }

        let now = Utc::now();
        if let Some(delivery) = input.expected_delivery_date {
            if delivery.date_naive() < now.date_naive() {
                return Err(AppError::Validation(
                    "Expected delivery date must not be in the past".to_string(),
                ));
            }
        }

        let scope = resolve_warehouse_scope(current_user, input.warehouse_id)?;
        let warehouse_id = require_single_warehouse(scope)?;
        let warehouse = self
            .warehouses
            .find_warehouse(warehouse_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))?;
        let creator = self
            .users
            .find_user(current_user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        let mut items = Vec::with_capacity(input.items.len());
        let mut subtotal = Decimal::ZERO;
        for item_input in &input.items {
            if item_input.quantity < 1 {
                return Err(AppError::Validation(
                    "Item quantity must be at least 1".to_string(),
                ));
            }
            if item_input.unit_price <= Decimal::ZERO {
                return Err(AppError::Validation(
                    "Item unit price must be positive".to_string(),
                ));
            }
            let product = self
                .products
                .find_product(item_input.product_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
            if product.warehouse_id != warehouse.id {
                return Err(AppError::Validation(
                    "Product does not belong to the selected warehouse".to_string(),
                ));
            }

            let unit_price = round_money(item_input.unit_price);
            let line_total = round_money(unit_price * Decimal::from(item_input.quantity));
            subtotal += line_total;
            items.push(NewPurchaseOrderItem {
                product_id: product.id,
                product_name: product.name.clone(),
                product_sku: product.sku.clone(),
                quantity: item_input.quantity,
                unit_price,
                line_total,
            });
        }
        let subtotal = round_money(subtotal);

        let reference = self.generate_reference().await?;
        let new_order = NewPurchaseOrder {
            reference,
            status: PurchaseOrderStatus::PendingVendorApproval,
            vendor_name,
            vendor_email: trimmed(input.vendor_email),
            vendor_phone: trimmed(input.vendor_phone),
            vendor_contact_preference: trimmed(input.vendor_contact_preference),
            notes: trimmed(input.notes),
            warehouse_id: warehouse.id,
            warehouse_name: warehouse.name.clone(),
            created_by: creator.id,
            created_by_name: creator.full_name.clone(),
            expected_delivery_date: input.expected_delivery_date,
            submitted_at: now,
            subtotal_amount: subtotal,
            tax_amount: Decimal::ZERO,
            shipping_amount: Decimal::ZERO,
            total_amount: subtotal,
            items,
        };

        let mut saved = self.orders.save_order(new_order).await?;

        let report = self
            .dispatcher
            .dispatch(
                &saved,
                DispatchOptions {
                    email_requested: input.send_email,
                    sms_requested: input.send_sms,
                },
            )
            .await;

        if report.email_dispatched || report.sms_dispatched {
            saved.status = PurchaseOrderStatus::SentToVendor;
        }
        if let Some(failure) = &report.failure_message {
            saved.status = PurchaseOrderStatus::NotificationFailed;
            saved.notes = Some(append_failure_note(saved.notes.as_deref(), failure));
        }

        self.orders
            .update_order_status(saved.id, saved.status, saved.notes.as_deref())
            .await?;

        Ok(saved)
    }

    /// Generate a reference of the form `PO-XXXXXXXX`, regenerating until it
    /// does not collide with a stored one. The unique index on the reference
    /// column remains the final arbiter against concurrent creators.
    async fn generate_reference(&self) -> AppResult<String> {
        loop {
            let hex = Uuid::new_v4().simple().to_string();
            let candidate = format!("PO-{}", hex[..8].to_uppercase());
            if !self.orders.reference_exists(&candidate).await? {
                return Ok(candidate);
            }
            tracing::debug!(candidate, "purchase order reference collision, regenerating");
        }
    }
}

/// Round a monetary amount to two decimal places, half-up
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Append a dispatch failure to the order notes, preserving what was there
pub fn append_failure_note(existing: Option<&str>, failure_message: &str) -> String {
    let message = format!("Notification failed: {}", failure_message);
    match existing {
        Some(existing) if !existing.trim().is_empty() => format!("{} | {}", existing, message),
        _ => message,
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
