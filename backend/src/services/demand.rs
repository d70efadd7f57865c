//! Demand aggregation
//!
//! Pure reductions that turn raw activity rows (sales, restock line items)
//! into the per-product and per-month aggregates consumed by the forecast,
//! recommendation and analytics paths. Sales and restocks are always
//! reduced separately; the two streams are never merged into one count.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// One unit of activity against a product: a sale, or a restock order line.
#[derive(Debug, Clone, FromRow)]
pub struct ActivityRecord {
    pub product_id: i64,
    pub product_name: String,
    pub product_sku: String,
    /// Id of the owning transaction (sale id or purchase-order id), used to
    /// count distinct orders.
    pub source_id: i64,
    pub quantity: i64,
    pub amount: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Per-product demand aggregate. Derived data: recomputed per request,
/// never persisted.
#[derive(Debug, Clone, FromRow)]
pub struct ProductDemandAggregate {
    pub product_id: i64,
    pub product_name: String,
    pub product_sku: String,
    pub total_quantity: i64,
    pub total_orders: i64,
    pub total_amount: Decimal,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}

/// Per-calendar-month aggregate over one activity stream
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyAggregate {
    pub year: i32,
    pub month: u32,
    pub total_quantity: i64,
    pub total_amount: Decimal,
}

/// A half-open window of whole calendar months `[start, end)`
#[derive(Debug, Clone, Copy)]
pub struct MonthWindow {
    start: NaiveDate,
    months: u32,
}

impl MonthWindow {
    /// The `months` calendar months ending with the month containing `now`
    pub fn trailing(months: u32, now: DateTime<Utc>) -> Self {
        let current = now.date_naive().with_day(1).expect("day 1 is always valid");
        let start = current - Months::new(months.saturating_sub(1));
        Self { start, months }
    }

    pub fn start_at(&self) -> DateTime<Utc> {
        self.start
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid")
            .and_utc()
    }

    pub fn end_at(&self) -> DateTime<Utc> {
        (self.start + Months::new(self.months))
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid")
            .and_utc()
    }

    /// The (year, month) pairs covered by the window, in order
    pub fn months(&self) -> impl Iterator<Item = (i32, u32)> + '_ {
        (0..self.months).map(|offset| {
            let date = self.start + Months::new(offset);
            (date.year(), date.month())
        })
    }
}

/// Reduce activity rows to per-product aggregates.
///
/// Returns an empty map (not an error) when there is no activity.
pub fn aggregate_by_product(rows: &[ActivityRecord]) -> BTreeMap<i64, ProductDemandAggregate> {
    let mut aggregates: BTreeMap<i64, ProductDemandAggregate> = BTreeMap::new();
    let mut sources: BTreeMap<i64, HashSet<i64>> = BTreeMap::new();

    for row in rows {
        let entry = aggregates
            .entry(row.product_id)
            .or_insert_with(|| ProductDemandAggregate {
                product_id: row.product_id,
                product_name: row.product_name.clone(),
                product_sku: row.product_sku.clone(),
                total_quantity: 0,
                total_orders: 0,
                total_amount: Decimal::ZERO,
                earliest: None,
                latest: None,
            });

        entry.total_quantity += row.quantity;
        entry.total_amount += row.amount;
        entry.earliest = Some(match entry.earliest {
            Some(existing) => existing.min(row.occurred_at),
            None => row.occurred_at,
        });
        entry.latest = Some(match entry.latest {
            Some(existing) => existing.max(row.occurred_at),
            None => row.occurred_at,
        });

        sources
            .entry(row.product_id)
            .or_default()
            .insert(row.source_id);
    }

    for (product_id, distinct) in sources {
        if let Some(entry) = aggregates.get_mut(&product_id) {
            entry.total_orders = distinct.len() as i64;
        }
    }

    aggregates
}

/// Reduce activity rows to calendar-month buckets over a window.
///
/// Months with no activity are zero-filled so the result always has exactly
/// one point per month in the window. Rows outside the window are ignored.
pub fn aggregate_by_month(rows: &[ActivityRecord], window: &MonthWindow) -> Vec<MonthlyAggregate> {
    let mut buckets: BTreeMap<(i32, u32), (i64, Decimal)> = BTreeMap::new();

    for row in rows {
        if row.occurred_at < window.start_at() || row.occurred_at >= window.end_at() {
            continue;
        }
        let key = (row.occurred_at.year(), row.occurred_at.month());
        let bucket = buckets.entry(key).or_insert((0, Decimal::ZERO));
        bucket.0 += row.quantity;
        bucket.1 += row.amount;
    }

    window
        .months()
        .map(|(year, month)| {
            let (total_quantity, total_amount) = buckets
                .get(&(year, month))
                .copied()
                .unwrap_or((0, Decimal::ZERO));
            MonthlyAggregate {
                year,
                month,
                total_quantity,
                total_amount,
            }
        })
        .collect()
}
