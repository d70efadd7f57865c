//! Demand forecast engine
//!
//! Produces a ranked, deterministic demand estimate for every product in the
//! caller's visible catalog, together with a synthetic trailing weekly
//! history series for charting. The model is a heuristic over aggregated
//! sales history, not a trained forecaster.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc, Weekday};
use serde::Serialize;

use crate::authz::resolve_warehouse_scope;
use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::models::Product;
use crate::services::demand::ProductDemandAggregate;
use crate::store::{DemandAggregateStore, ProductStore};

const HISTORY_POINTS: i64 = 6;

/// One point of the synthetic weekly demand series
#[derive(Debug, Clone, Serialize)]
pub struct SeriesPoint {
    pub week_start: DateTime<Utc>,
    pub quantity: i64,
}

/// Forecast output for a single product
#[derive(Debug, Clone, Serialize)]
pub struct ForecastItem {
    pub product_id: i64,
    pub product_name: String,
    pub product_sku: String,
    pub current_stock: i64,
    pub reorder_level: i64,
    pub forecast_quantity: f64,
    pub at_risk: bool,
    pub recommended_reorder: i64,
    pub action: String,
    pub history: Vec<SeriesPoint>,
}

#[derive(Clone)]
pub struct ForecastService {
    products: Arc<dyn ProductStore>,
    demand: Arc<dyn DemandAggregateStore>,
}

impl ForecastService {
    pub fn new(products: Arc<dyn ProductStore>, demand: Arc<dyn DemandAggregateStore>) -> Self {
        Self { products, demand }
    }

    /// Forecast demand for every product visible to the caller.
    ///
    /// An empty catalog yields the fixed illustrative sample set rather than
    /// an empty list, so empty-state dashboards have something to render.
    pub async fn forecast(
        &self,
        current_user: &AuthUser,
        requested_warehouse_id: Option<i64>,
    ) -> AppResult<Vec<ForecastItem>> {
        let scope = resolve_warehouse_scope(current_user, requested_warehouse_id)?;
        let products = self.products.list_products(&scope).await?;
        let base_week_start = base_week_start(Utc::now());

        if products.is_empty() {
            return Ok(sample_forecast_items(base_week_start));
        }

        let aggregates = self.demand.product_demand_totals(&scope).await?;
        Ok(build_forecast(&products, &aggregates, base_week_start))
    }
}

/// The most recent Monday at 00:00 UTC, the anchor for the weekly series
pub fn base_week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .week(Weekday::Mon)
        .first_day()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
}

/// Build ranked forecast items from products and their sales aggregates.
///
/// Deterministic for fixed inputs: the history series is a function of
/// baseline, relative demand and week offset only.
pub fn build_forecast(
    products: &[Product],
    aggregates: &[ProductDemandAggregate],
    base_week_start: DateTime<Utc>,
) -> Vec<ForecastItem> {
    let aggregate_by_product: HashMap<i64, &ProductDemandAggregate> = aggregates
        .iter()
        .map(|aggregate| (aggregate.product_id, aggregate))
        .collect();

    let max_quantity = aggregates
        .iter()
        .map(|aggregate| aggregate.total_quantity as f64)
        .filter(|quantity| *quantity > 0.0)
        .fold(0.0_f64, f64::max);

    let mut ranked: Vec<(f64, ForecastItem)> = Vec::with_capacity(products.len());

    for product in products {
        let aggregate = aggregate_by_product.get(&product.id).copied();
        let total_sold = aggregate.map(|a| a.total_quantity as f64).unwrap_or(0.0);

        let relative_demand = if max_quantity > 0.0 && total_sold > 0.0 {
            total_sold / max_quantity
        } else {
            0.0
        };
        let weekly_run_rate = weekly_run_rate(aggregate, total_sold);
        let baseline = if weekly_run_rate > 0.0 {
            weekly_run_rate
        } else {
            f64::max(1.0, product.reorder_level as f64 / 2.0)
        };
        let forecast = f64::max(1.0, baseline * (1.0 + 0.75 * relative_demand));
        let forecast = (forecast * 10.0).round() / 10.0;

        let rounded_forecast = forecast.ceil() as i64;
        let current_stock = product.current_stock;
        let shortfall = (rounded_forecast - current_stock).max(0);
        let mut at_risk = shortfall > 0;
        if !at_risk && (current_stock - rounded_forecast) <= product.reorder_level {
            at_risk = true;
        }

        let mut recommended_reorder = 0;
        let action = if shortfall > 0 {
            recommended_reorder = shortfall;
            if relative_demand >= 0.7 {
                format!("High demand - reorder {} units", shortfall)
            } else {
                format!("Reorder {} units", shortfall)
            }
        } else if aggregate.is_none() || total_sold == 0.0 {
            "No sales yet".to_string()
        } else if (current_stock - rounded_forecast) <= product.reorder_level {
            recommended_reorder =
                (product.reorder_level + rounded_forecast - current_stock).max(0);
            if relative_demand >= 0.7 {
                "Top seller - keep buffer".to_string()
            } else {
                "Top up safety stock".to_string()
            }
        } else if relative_demand >= 0.8 {
            "Top demand product - monitor closely".to_string()
        } else if relative_demand >= 0.5 {
            "Healthy demand".to_string()
        } else {
            "Sufficient".to_string()
        };

        let history = build_history(base_week_start, baseline, relative_demand);

        ranked.push((
            total_sold,
            ForecastItem {
                product_id: product.id,
                product_name: product.name.clone(),
                product_sku: product.sku.clone(),
                current_stock,
                reorder_level: product.reorder_level,
                forecast_quantity: forecast,
                at_risk,
                recommended_reorder,
                action,
                history,
            },
        ));
    }

    ranked.sort_by(|(sold_a, item_a), (sold_b, item_b)| {
        sold_b
            .total_cmp(sold_a)
            .then(item_b.forecast_quantity.total_cmp(&item_a.forecast_quantity))
            .then_with(|| item_a.product_name.cmp(&item_b.product_name))
    });

    ranked.into_iter().map(|(_, item)| item).collect()
}

fn weekly_run_rate(aggregate: Option<&ProductDemandAggregate>, total_sold: f64) -> f64 {
    let Some(aggregate) = aggregate else {
        return 0.0;
    };
    if total_sold <= 0.0 {
        return 0.0;
    }
    let (Some(start), Some(end)) = (aggregate.earliest, aggregate.latest) else {
        return total_sold;
    };
    let days = ((end - start).num_days() + 1).max(1);
    let weeks = f64::max(1.0, days as f64 / 7.0);
    total_sold / weeks
}

/// Synthetic trailing series: baseline plus a demand-weighted trend ramp and
/// a small seasonal wobble. Illustrative data, not measurement.
fn build_history(
    base_week_start: DateTime<Utc>,
    baseline: f64,
    relative_demand: f64,
) -> Vec<SeriesPoint> {
    let mut history = Vec::with_capacity(HISTORY_POINTS as usize);
    for offset in (1..=HISTORY_POINTS).rev() {
        let week_start = base_week_start - Duration::weeks(offset);
        let progress = (HISTORY_POINTS - offset) as f64 / HISTORY_POINTS as f64;
        let trend = baseline * relative_demand * 0.6 * progress;
        let seasonal = (offset as f64).sin() * baseline * 0.12;
        let value = f64::max(1.0, baseline + trend + seasonal);
        history.push(SeriesPoint {
            week_start,
            quantity: value.round() as i64,
        });
    }
    history
}

/// Fixed sample items served when the catalog is empty, so empty-state UIs
/// still have a series to draw. The negative ids mark them as synthetic.
pub fn sample_forecast_items(base_week_start: DateTime<Utc>) -> Vec<ForecastItem> {
    struct SampleProduct {
        id: i64,
        name: &'static str,
        sku: &'static str,
        stock: i64,
        reorder: i64,
        forecast: f64,
        at_risk: bool,
        reorder_suggestion: i64,
        relative_demand: f64,
    }

    let templates = [
        SampleProduct {
            id: -1,
            name: "Alpha Widgets",
            sku: "SKU-ALPHA",
            stock: 42,
            reorder: 15,
            forecast: 32.5,
            at_risk: false,
            reorder_suggestion: 0,
            relative_demand: 0.9,
        },
        SampleProduct {
            id: -2,
            name: "Beta Casing",
            sku: "SKU-BETA",
            stock: 8,
            reorder: 12,
            forecast: 18.0,
            at_risk: true,
            reorder_suggestion: 10,
            relative_demand: 0.7,
        },
        SampleProduct {
            id: -3,
            name: "Gamma Sensors",
            sku: "SKU-GAMMA",
            stock: 5,
            reorder: 8,
            forecast: 12.0,
            at_risk: true,
            reorder_suggestion: 8,
            relative_demand: 0.5,
        },
    ];

    templates
        .iter()
        .map(|template| {
            let baseline = f64::max(6.0, template.forecast * 0.6);
            let history = build_history(base_week_start, baseline, template.relative_demand);
            let action = if template.at_risk {
                format!("High demand - reorder {} units", template.reorder_suggestion)
            } else {
                "Sufficient".to_string()
            };
            ForecastItem {
                product_id: template.id,
                product_name: template.name.to_string(),
                product_sku: template.sku.to_string(),
                current_stock: template.stock,
                reorder_level: template.reorder,
                forecast_quantity: template.forecast,
                at_risk: template.at_risk,
                recommended_reorder: template.reorder_suggestion,
                action,
                history,
            }
        })
        .collect()
}
