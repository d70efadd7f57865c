//! Restock recommendation engine
//!
//! Projects average daily demand and days-until-stockout per product, then
//! recommends reorder quantities for products that are below their reorder
//! level, close to stockout, or flagged for automatic restocking.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::authz::resolve_warehouse_scope;
use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::models::{Product, StockStatus};
use crate::services::demand::ProductDemandAggregate;
use crate::store::{DemandAggregateStore, ProductStore, WarehouseStore};

/// Floor for the demand estimate when history is missing or empty
fn minimum_daily_demand() -> Decimal {
    Decimal::new(1, 1) // 0.1
}

/// The demand history span is stretched to at least this many days
const FORECAST_WINDOW_DAYS: i64 = 30;

/// Products projected to run out within this many days are urgent
const STOCKOUT_SOON_DAYS: i64 = 7;

/// Sentinel runway for products with no measurable demand
const FAR_FUTURE_DAYS: i64 = 90;

/// Optional filters for a recommendation query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestockQuery {
    pub warehouse_id: Option<i64>,
    pub category: Option<String>,
    pub auto_restock_only: Option<bool>,
    pub stock_status: Option<StockStatus>,
}

/// A single restock recommendation. Derived data, recomputed per request.
#[derive(Debug, Clone, Serialize)]
pub struct RestockRecommendation {
    pub product_id: i64,
    pub product_name: String,
    pub product_sku: String,
    pub category: String,
    pub vendor: String,
    pub warehouse_id: i64,
    pub warehouse_name: String,
    pub current_stock: i64,
    pub reorder_level: i64,
    pub max_stock_level: i64,
    pub auto_restock_enabled: bool,
    pub price: Decimal,
    pub average_daily_demand: Decimal,
    pub projected_days_until_stockout: Decimal,
    pub suggested_reorder_quantity: i64,
    pub reason: String,
}

#[derive(Clone)]
pub struct RestockService {
    products: Arc<dyn ProductStore>,
    demand: Arc<dyn DemandAggregateStore>,
    warehouses: Arc<dyn WarehouseStore>,
}

impl RestockService {
    pub fn new(
        products: Arc<dyn ProductStore>,
        demand: Arc<dyn DemandAggregateStore>,
        warehouses: Arc<dyn WarehouseStore>,
    ) -> Self {
        Self {
            products,
            demand,
            warehouses,
        }
    }

    /// Compute restock recommendations for the caller's visible products,
    /// most urgent first (shortest projected runway, then largest suggested
    /// quantity).
    pub async fn recommend(
        &self,
        current_user: &AuthUser,
        query: &RestockQuery,
    ) -> AppResult<Vec<RestockRecommendation>> {
        let scope = resolve_warehouse_scope(current_user, query.warehouse_id)?;

        let candidates = self.products.list_products(&scope).await?;
        let filtered: Vec<&Product> = candidates
            .iter()
            .filter(|product| matches_filters(product, query))
            .collect();
        if filtered.is_empty() {
            return Ok(Vec::new());
        }

        let aggregates = self.demand.product_demand_totals(&scope).await?;
        let aggregate_by_product: HashMap<i64, &ProductDemandAggregate> = aggregates
            .iter()
            .map(|aggregate| (aggregate.product_id, aggregate))
            .collect();

        let warehouse_names: HashMap<i64, String> = self
            .warehouses
            .list_warehouses()
            .await?
            .into_iter()
            .map(|warehouse| (warehouse.id, warehouse.name))
            .collect();

        let mut recommendations = Vec::new();
        for product in filtered {
            let aggregate = aggregate_by_product.get(&product.id).copied();
            let Some(recommendation) = evaluate_product(product, aggregate, &warehouse_names)
            else {
                continue;
            };
            recommendations.push(recommendation);
        }

        recommendations.sort_by(|a, b| {
            a.projected_days_until_stockout
                .cmp(&b.projected_days_until_stockout)
                .then(b.suggested_reorder_quantity.cmp(&a.suggested_reorder_quantity))
        });

        Ok(recommendations)
    }
}

fn matches_filters(product: &Product, query: &RestockQuery) -> bool {
    if let Some(category) = query.category.as_deref() {
        let requested = category.trim();
        if !requested.is_empty()
            && !product.category.to_lowercase().eq(&requested.to_lowercase())
        {
            return false;
        }
    }
    if query.auto_restock_only == Some(true) && !product.auto_restock_enabled {
        return false;
    }
    if let Some(status) = query.stock_status {
        if product.stock_status() != status {
            return false;
        }
    }
    true
}

/// Evaluate one product; `None` means it needs no restocking right now.
pub fn evaluate_product(
    product: &Product,
    aggregate: Option<&ProductDemandAggregate>,
    warehouse_names: &HashMap<i64, String>,
) -> Option<RestockRecommendation> {
    let daily_demand = average_daily_demand(aggregate);
    let days_until_stockout = days_until_stockout(product.current_stock, daily_demand);
    let suggested = suggested_quantity(product, daily_demand);
    if suggested <= 0 {
        return None;
    }

    let below_reorder = product.current_stock <= product.reorder_level;
    let near_stockout = days_until_stockout <= Decimal::from(STOCKOUT_SOON_DAYS);
    let auto_restock = product.auto_restock_enabled;

    if !below_reorder && !near_stockout && !auto_restock {
        return None;
    }

    Some(RestockRecommendation {
        product_id: product.id,
        product_name: product.name.clone(),
        product_sku: product.sku.clone(),
        category: product.category.clone(),
        vendor: product.vendor.clone(),
        warehouse_id: product.warehouse_id,
        warehouse_name: warehouse_names
            .get(&product.warehouse_id)
            .cloned()
            .unwrap_or_default(),
        current_stock: product.current_stock,
        reorder_level: product.reorder_level,
        max_stock_level: product.resolved_max_stock_level(),
        auto_restock_enabled: product.auto_restock_enabled,
        price: product.price,
        average_daily_demand: daily_demand,
        projected_days_until_stockout: days_until_stockout,
        suggested_reorder_quantity: suggested,
        reason: build_reason(below_reorder, near_stockout, auto_restock),
    })
}

/// Average units sold per day over the observed history span, stretched to
/// at least thirty days, floored at 0.1. Four decimal places, half-up.
pub fn average_daily_demand(aggregate: Option<&ProductDemandAggregate>) -> Decimal {
    let Some(aggregate) = aggregate else {
        return minimum_daily_demand();
    };
    if aggregate.total_quantity <= 0 {
        return minimum_daily_demand();
    }
    let (Some(start), Some(end)) = (aggregate.earliest, aggregate.latest) else {
        return minimum_daily_demand();
    };
    let days = (end - start).num_days().max(1);
    let span = days.max(FORECAST_WINDOW_DAYS);
    let raw_average = (Decimal::from(aggregate.total_quantity) / Decimal::from(span))
        .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);
    raw_average.max(minimum_daily_demand())
}

/// Projected days of runway at the current demand rate. Zero when already
/// out of stock; 90 days when demand sits at the floor.
pub fn days_until_stockout(current_stock: i64, daily_demand: Decimal) -> Decimal {
    if current_stock <= 0 {
        return Decimal::ZERO;
    }
    if daily_demand <= minimum_daily_demand() {
        return Decimal::from(FAR_FUTURE_DAYS);
    }
    (Decimal::from(current_stock) / daily_demand)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Units needed to reach the restock target: the resolved max stock level,
/// or the reorder level plus fourteen days of demand cover if that is
/// higher. Never negative.
pub fn suggested_quantity(product: &Product, daily_demand: Decimal) -> i64 {
    let target_level = product.resolved_max_stock_level();
    let fourteen_day_demand = daily_demand * Decimal::from(14);
    let demand_cover_target = fourteen_day_demand.ceil().to_i64().unwrap_or(0);
    let baseline_target = target_level.max(product.reorder_level + demand_cover_target);
    (baseline_target - product.current_stock).max(0)
}

/// Comma-joined labels, always in the same order
pub fn build_reason(below_reorder: bool, near_stockout: bool, auto_restock: bool) -> String {
    let mut reasons = Vec::new();
    if below_reorder {
        reasons.push("Below reorder level");
    }
    if near_stockout {
        reasons.push("Projected stockout within a week");
    }
    if auto_restock {
        reasons.push("Auto-restock enabled");
    }
    reasons.join(", ")
}
