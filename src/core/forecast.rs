//! Forecast math and service-breakdown normalization.
//!
//! The linear forecast assumes uniform daily spend across the billing period.
//! It is a deliberate approximation used where a vendor has no native
//! forecast API, not a regression.

use chrono::{Datelike, NaiveDate};

use crate::core::models::ServiceCost;

/// Maximum service lines retained in a breakdown.
pub const TOP_SERVICES: usize = 5;

/// Project spend for the full period: `(total / days_elapsed) * days_in_period`.
///
/// Returns 0 when no days have elapsed yet.
#[must_use]
pub fn linear_forecast(total_so_far: f64, days_elapsed: u32, days_in_period: u32) -> f64 {
    if days_elapsed == 0 {
        return 0.0;
    }
    (total_so_far / f64::from(days_elapsed)) * f64::from(days_in_period)
}

/// Days elapsed and total days for the month containing `date`.
#[must_use]
pub fn month_progress(date: NaiveDate) -> (u32, u32) {
    (date.day(), days_in_month(date))
}

/// Number of days in the month containing `date`.
#[must_use]
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (next_year, next_month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(30, |d| d.day())
}

/// Normalize a raw service breakdown: group by name, sum amounts, drop
/// non-positive entries, sort descending, keep the top five.
#[must_use]
pub fn normalize_services(raw: Vec<ServiceCost>) -> Vec<ServiceCost> {
    let mut grouped: Vec<ServiceCost> = Vec::new();
    for item in raw {
        match grouped.iter_mut().find(|s| s.name == item.name) {
            Some(existing) => existing.amount += item.amount,
            None => grouped.push(item),
        }
    }

    grouped.retain(|s| s.amount > 0.0);
    grouped.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    grouped.truncate(TOP_SERVICES);
    grouped
}
