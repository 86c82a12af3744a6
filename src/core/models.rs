//! Core data models.
//!
//! Normalized shapes shared by all provider adapters, the aggregation engine,
//! and the persisted snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::providers::Provider;

// =============================================================================
// Service / History Entries
// =============================================================================

/// One service line in a provider's cost breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCost {
    pub name: String,
    /// Month-to-date spend in the provider's raw currency (USD).
    pub amount: f64,
}

impl ServiceCost {
    /// Create a new service cost entry.
    #[must_use]
    pub fn new(name: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

/// One day of spend in a rolling history window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyCost {
    /// `YYYY-MM-DD` as reported by the vendor.
    pub date: String,
    pub cost: f64,
}

impl DailyCost {
    /// Create a new daily cost entry.
    #[must_use]
    pub fn new(date: impl Into<String>, cost: f64) -> Self {
        Self {
            date: date.into(),
            cost,
        }
    }
}

// =============================================================================
// Anomaly
// =============================================================================

/// A detected cost spike: today's spend against the trailing average.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub is_anomaly: bool,
    /// Latest day's spend.
    pub today_cost: f64,
    /// Mean of the preceding days.
    pub average: f64,
}

// =============================================================================
// Provider Report
// =============================================================================

/// Normalized result of one provider fetch. Immutable after construction.
///
/// A failed fetch still produces a report: `error` carries the message and
/// the numeric fields default to zero so aggregation never sees NaN or null.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderReport {
    pub provider: Provider,

    /// Whether credentials were present for this provider this cycle.
    pub configured: bool,

    /// Month-to-date spend in the provider's raw currency (USD).
    pub total_cost: f64,

    /// Projected spend for the full billing period (USD).
    pub forecast: f64,

    /// Top services by spend, descending, at most five.
    #[serde(default)]
    pub services: Vec<ServiceCost>,

    /// Rolling daily-cost window, oldest first. Empty when the vendor
    /// supplies none.
    #[serde(default)]
    pub history: Vec<DailyCost>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<Anomaly>,

    /// Set when the critical sub-fetch failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderReport {
    /// A successful report with no data yet attached.
    #[must_use]
    pub fn success(provider: Provider) -> Self {
        Self {
            provider,
            configured: true,
            total_cost: 0.0,
            forecast: 0.0,
            services: Vec::new(),
            history: Vec::new(),
            anomaly: None,
            error: None,
        }
    }

    /// Report for a provider whose fetch failed.
    #[must_use]
    pub fn failure(provider: Provider, message: impl Into<String>) -> Self {
        Self {
            provider,
            configured: true,
            total_cost: 0.0,
            forecast: 0.0,
            services: Vec::new(),
            history: Vec::new(),
            anomaly: None,
            error: Some(message.into()),
        }
    }

    /// Report for a provider that was skipped for lack of credentials.
    #[must_use]
    pub fn not_configured(provider: Provider) -> Self {
        Self {
            configured: false,
            ..Self::success(provider)
        }
    }

    /// Whether this report contributes cost data.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        self.configured && self.error.is_none()
    }
}

// =============================================================================
// Alerts
// =============================================================================

/// Alert classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Budget,
    Anomaly,
    Forecast,
    AllProvidersDown,
    ProviderError,
}

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARN",
            Self::Critical => "CRIT",
        }
    }
}

/// One evaluated alert attached to a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
}

impl Alert {
    /// Create a new alert.
    #[must_use]
    pub fn new(kind: AlertKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
        }
    }
}

// =============================================================================
// Aggregated Snapshot
// =============================================================================

/// The single combined, alert-annotated result of one refresh cycle.
///
/// Exactly one snapshot exists at rest; each cycle overwrites it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedSnapshot {
    /// Per-provider reports keyed by provider tag (stable order).
    pub per_provider: BTreeMap<Provider, ProviderReport>,

    /// Sum of healthy providers' totals, converted at `rate`.
    pub total_global: f64,

    /// Sum of forecasts in raw USD (convert with `rate` for display).
    pub total_forecast: f64,

    /// Active display currency code.
    pub currency: String,

    /// Conversion rate from USD into `currency`.
    pub rate: f64,

    /// Budget ceiling in raw USD.
    pub budget_limit: f64,

    /// Budget consumption percentage; may exceed 100.
    pub budget_used_pct: f64,

    #[serde(default)]
    pub alerts: Vec<Alert>,

    /// Set when the cycle aborted because no credentials exist.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub not_configured: bool,

    /// Set when the cycle aborted because the credential blob would not
    /// decrypt.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub decryption_error: bool,

    /// User-facing remediation message for aborted cycles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,

    pub last_updated: DateTime<Utc>,
}

impl AggregatedSnapshot {
    /// An empty snapshot shell for a failure state.
    #[must_use]
    pub fn empty(currency: impl Into<String>, rate: f64, budget_limit: f64) -> Self {
        Self {
            per_provider: BTreeMap::new(),
            total_global: 0.0,
            total_forecast: 0.0,
            currency: currency.into(),
            rate,
            budget_limit,
            budget_used_pct: 0.0,
            alerts: Vec::new(),
            not_configured: false,
            decryption_error: false,
            remediation: None,
            last_updated: Utc::now(),
        }
    }

    /// Budget percentage clamped to [0, 100] for gauge rendering. The raw
    /// `budget_used_pct` may exceed 100.
    #[must_use]
    pub fn display_budget_pct(&self) -> f64 {
        self.budget_used_pct.clamp(0.0, 100.0)
    }

    /// Forecast total converted into the display currency.
    #[must_use]
    pub fn display_forecast(&self) -> f64 {
        self.total_forecast * self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_report_defaults_cost_to_zero() {
        let report = ProviderReport::failure(Provider::Azure, "boom");
        assert_eq!(report.total_cost, 0.0);
        assert!(!report.is_healthy());
        assert_eq!(report.error.as_deref(), Some("boom"));
    }

    #[test]
    fn not_configured_is_not_an_error() {
        let report = ProviderReport::not_configured(Provider::Gcp);
        assert!(!report.configured);
        assert!(report.error.is_none());
    }

    #[test]
    fn display_budget_pct_clamps() {
        let mut snapshot = AggregatedSnapshot::empty("USD", 1.0, 1000.0);
        snapshot.budget_used_pct = 134.2;
        assert!((snapshot.display_budget_pct() - 100.0).abs() < f64::EPSILON);
        snapshot.budget_used_pct = 42.0;
        assert!((snapshot.display_budget_pct() - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn snapshot_serializes_provider_keys_lowercase() {
        let mut snapshot = AggregatedSnapshot::empty("USD", 1.0, 1000.0);
        snapshot
            .per_provider
            .insert(Provider::Aws, ProviderReport::success(Provider::Aws));
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"aws\""));
        assert!(!json.contains("notConfigured"));
    }
}
