//! Vendor notification dispatch
//!
//! Sends purchase orders to vendors over email and/or SMS. Each requested
//! channel is attempted independently; failures are reported back to the
//! caller in the [`DispatchReport`], never raised.

use async_trait::async_trait;
use serde_json::json;

use crate::config::NotificationConfig;
use crate::models::PurchaseOrder;

/// Which channels the caller asked for
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchOptions {
    pub email_requested: bool,
    pub sms_requested: bool,
}

/// Outcome of a dispatch attempt across the requested channels
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub email_dispatched: bool,
    pub sms_dispatched: bool,
    pub failure_message: Option<String>,
}

impl DispatchReport {
    pub fn has_failure(&self) -> bool {
        self.failure_message.is_some()
    }
}

/// Vendor notification collaborator. Implementations must attempt every
/// requested channel and must not error; failures come back in the report.
#[async_trait]
pub trait VendorDispatcher: Send + Sync {
    async fn dispatch(&self, order: &PurchaseOrder, options: DispatchOptions) -> DispatchReport;
}

/// SMS delivery seam
#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send_sms(&self, to: &str, body: &str) -> Result<(), String>;
}

/// Development SMS gateway: logs the message instead of sending it
pub struct LoggingSmsGateway;

#[async_trait]
impl SmsGateway for LoggingSmsGateway {
    async fn send_sms(&self, to: &str, body: &str) -> Result<(), String> {
        tracing::info!(to, body, "SMS gateway (logging mode)");
        Ok(())
    }
}

/// HTTP email gateway client
#[derive(Clone)]
pub struct HttpEmailGateway {
    endpoint: String,
    api_key: String,
    sender: String,
    http_client: reqwest::Client,
}

impl HttpEmailGateway {
    pub fn new(endpoint: String, api_key: String, sender: String) -> Self {
        Self {
            endpoint,
            api_key,
            sender,
            http_client: reqwest::Client::new(),
        }
    }

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.sender,
                "to": to,
                "subject": subject,
                "body": body,
            }))
            .send()
            .await
            .map_err(|err| err.to_string())?;

        if !response.status().is_success() {
            return Err(format!("email gateway returned {}", response.status()));
        }
        Ok(())
    }
}

/// Default dispatcher: optional email gateway plus optional SMS gateway
pub struct DefaultVendorDispatcher {
    email: Option<HttpEmailGateway>,
    sms: Option<Box<dyn SmsGateway>>,
}

impl DefaultVendorDispatcher {
    pub fn new(email: Option<HttpEmailGateway>, sms: Option<Box<dyn SmsGateway>>) -> Self {
        Self { email, sms }
    }

    /// Wire the dispatcher from configuration
    pub fn from_config(config: &NotificationConfig) -> Self {
        let email = match (&config.email_endpoint, &config.email_api_key) {
            (Some(endpoint), Some(api_key)) => Some(HttpEmailGateway::new(
                endpoint.clone(),
                api_key.clone(),
                config.email_from.clone(),
            )),
            _ => None,
        };
        let sms: Option<Box<dyn SmsGateway>> = match config.sms_gateway.as_str() {
            "logging" => Some(Box::new(LoggingSmsGateway)),
            _ => None,
        };
        Self::new(email, sms)
    }

    async fn send_order_email(&self, order: &PurchaseOrder) -> Outcome {
        let Some(email) = order.vendor_email.as_deref().filter(|e| !e.trim().is_empty()) else {
            return Outcome::failed("Vendor email address is missing");
        };
        let Some(gateway) = &self.email else {
            tracing::warn!(
                reference = %order.reference,
                "email dispatch requested but no email gateway configured"
            );
            return Outcome::failed("Email gateway not configured");
        };

        let subject = format!("Purchase Order {}", order.reference);
        let body = build_email_body(order);
        match gateway.send_email(email, &subject, &body).await {
            Ok(()) => {
                tracing::info!(reference = %order.reference, to = email, "purchase order emailed");
                Outcome::success()
            }
            Err(err) => {
                tracing::error!(reference = %order.reference, error = %err, "email dispatch failed");
                Outcome::failed(&format!("Email dispatch failed: {}", err))
            }
        }
    }

    async fn send_order_sms(&self, order: &PurchaseOrder) -> Outcome {
        let Some(phone) = order.vendor_phone.as_deref().filter(|p| !p.trim().is_empty()) else {
            return Outcome::failed("Vendor phone number is missing");
        };
        let Some(gateway) = &self.sms else {
            tracing::warn!(
                reference = %order.reference,
                "SMS dispatch requested but no SMS gateway configured"
            );
            return Outcome::failed("SMS gateway not configured");
        };

        let body = build_sms_body(order);
        match gateway.send_sms(phone, &body).await {
            Ok(()) => {
                tracing::info!(reference = %order.reference, to = phone, "purchase order SMS sent");
                Outcome::success()
            }
            Err(err) => {
                tracing::error!(reference = %order.reference, error = %err, "SMS dispatch failed");
                Outcome::failed(&format!("SMS dispatch failed: {}", err))
            }
        }
    }
}

#[async_trait]
impl VendorDispatcher for DefaultVendorDispatcher {
    async fn dispatch(&self, order: &PurchaseOrder, options: DispatchOptions) -> DispatchReport {
        let mut report = DispatchReport::default();

        if options.email_requested {
            let outcome = self.send_order_email(order).await;
            report.email_dispatched = outcome.dispatched;
            report.failure_message = merge_failure(report.failure_message, outcome.error);
        }

        if options.sms_requested {
            let outcome = self.send_order_sms(order).await;
            report.sms_dispatched = outcome.dispatched;
            report.failure_message = merge_failure(report.failure_message, outcome.error);
        }

        report
    }
}

struct Outcome {
    dispatched: bool,
    error: Option<String>,
}

impl Outcome {
    fn success() -> Self {
        Self {
            dispatched: true,
            error: None,
        }
    }

    fn failed(message: &str) -> Self {
        Self {
            dispatched: false,
            error: Some(message.to_string()),
        }
    }
}

fn merge_failure(existing: Option<String>, addition: Option<String>) -> Option<String> {
    match (existing, addition) {
        (None, addition) => addition,
        (existing, None) => existing,
        (Some(existing), Some(addition)) => Some(format!("{}; {}", existing, addition)),
    }
}

fn build_email_body(order: &PurchaseOrder) -> String {
    let mut body = String::new();
    body.push_str(&format!("Hello {},\n\n", order.vendor_name));
    body.push_str(&format!(
        "Please review purchase order {} for warehouse {}.\n\nItems:\n",
        order.reference, order.warehouse_name
    ));
    for item in &order.items {
        body.push_str(&format!(
            " - {} (SKU: {}) -> {} @ {} = {}\n",
            item.product_name, item.product_sku, item.quantity, item.unit_price, item.line_total
        ));
    }
    body.push_str(&format!("\nSubtotal: {}\n", order.subtotal_amount));
    body.push_str(&format!("Total: {}\n", order.total_amount));
    if let Some(delivery) = order.expected_delivery_date {
        body.push_str(&format!(
            "Requested delivery by: {}\n",
            delivery.format("%Y-%m-%d")
        ));
    }
    body.push_str(&format!(
        "\nNotes: {}\n\n",
        order
            .notes
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("N/A")
    ));
    body.push_str("Thank you,\nStockPilot Inventory Team\n");
    body
}

fn build_sms_body(order: &PurchaseOrder) -> String {
    let mut items: Vec<String> = order
        .items
        .iter()
        .take(3)
        .map(|item| format!("{} x{}", item.product_name, item.quantity))
        .collect();
    if order.items.len() > 3 {
        items.push("...".to_string());
    }
    let mut body = format!(
        "PO {} total {}. Items: {}",
        order.reference,
        order.total_amount,
        items.join(", ")
    );
    if let Some(delivery) = order.expected_delivery_date {
        body.push_str(&format!(". Deliver by {}", delivery.format("%Y-%m-%d")));
    }
    body
}
