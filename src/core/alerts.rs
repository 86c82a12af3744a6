//! Alert evaluation over an aggregated snapshot.
//!
//! A pure, deterministic pass: every matching rule fires, in priority order.
//! Budget first, then anomaly, forecast overrun, total outage, and finally
//! per-provider errors.

use crate::core::models::{AggregatedSnapshot, Alert, AlertKind, Severity};

/// Default budget warning threshold (percent used).
pub const DEFAULT_WARN_PCT: f64 = 80.0;

/// Forecast overrun margin: alert when the forecast exceeds the budget by
/// this factor.
const FORECAST_MARGIN: f64 = 1.1;

/// Evaluate all alert rules against `snapshot`.
///
/// `warn_pct` is the budget warning threshold (default 80). The critical
/// threshold is fixed at 100.
#[must_use]
pub fn evaluate(snapshot: &AggregatedSnapshot, warn_pct: f64) -> Vec<Alert> {
    let mut alerts = Vec::new();

    // Budget: critical at 100, warning at the configurable threshold.
    let pct = snapshot.budget_used_pct;
    if pct >= 100.0 {
        alerts.push(Alert::new(
            AlertKind::Budget,
            Severity::Critical,
            format!("Budget exceeded: {pct:.0}% of limit used"),
        ));
    } else if pct >= warn_pct {
        alerts.push(Alert::new(
            AlertKind::Budget,
            Severity::Warning,
            format!("Budget near limit: {pct:.0}% of limit used"),
        ));
    }

    // Anomaly: any provider report carrying a flagged spike.
    for report in snapshot.per_provider.values() {
        if let Some(anomaly) = report.anomaly.filter(|a| a.is_anomaly) {
            alerts.push(Alert::new(
                AlertKind::Anomaly,
                Severity::Critical,
                format!(
                    "Unusual spend on {}: ${:.2} today vs ${:.2} daily average",
                    report.provider.display_name(),
                    anomaly.today_cost,
                    anomaly.average
                ),
            ));
        }
    }

    // Forecast overrun.
    if snapshot.total_forecast > snapshot.budget_limit * FORECAST_MARGIN {
        alerts.push(Alert::new(
            AlertKind::Forecast,
            Severity::Warning,
            format!(
                "Forecast ${:.2} exceeds budget ${:.2}",
                snapshot.total_forecast, snapshot.budget_limit
            ),
        ));
    }

    // Total outage: every configured provider errored and nothing summed.
    // Unconfigured providers never count toward this rule.
    let configured: Vec<_> = snapshot
        .per_provider
        .values()
        .filter(|r| r.configured)
        .collect();
    let all_down = !configured.is_empty()
        && configured.iter().all(|r| r.error.is_some())
        && snapshot.total_global == 0.0;

    if all_down {
        alerts.push(Alert::new(
            AlertKind::AllProvidersDown,
            Severity::Warning,
            "No cost data available: every configured provider failed",
        ));
    } else {
        // Per-provider errors, only when the outage rule did not already
        // cover them.
        for report in configured {
            if let Some(message) = &report.error {
                alerts.push(Alert::new(
                    AlertKind::ProviderError,
                    Severity::Warning,
                    format!("{}: {}", report.provider.display_name(), message),
                ));
            }
        }
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Anomaly, ProviderReport};
    use crate::providers::Provider;

    fn snapshot_with(reports: Vec<ProviderReport>) -> AggregatedSnapshot {
        let mut snapshot = AggregatedSnapshot::empty("USD", 1.0, 1000.0);
        for report in reports {
            snapshot.per_provider.insert(report.provider, report);
        }
        snapshot
    }

    #[test]
    fn budget_critical_and_anomaly_fire_in_order() {
        let mut aws = ProviderReport::success(Provider::Aws);
        aws.anomaly = Some(Anomaly {
            is_anomaly: true,
            today_cost: 10.0,
            average: 1.0,
        });
        let mut snapshot = snapshot_with(vec![aws]);
        snapshot.budget_used_pct = 105.0;
        snapshot.total_global = 1050.0;

        let alerts = evaluate(&snapshot, DEFAULT_WARN_PCT);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].kind, AlertKind::Budget);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[1].kind, AlertKind::Anomaly);
        assert_eq!(alerts[1].severity, Severity::Critical);
    }

    #[test]
    fn budget_warning_below_critical() {
        let mut snapshot = snapshot_with(vec![ProviderReport::success(Provider::Aws)]);
        snapshot.budget_used_pct = 85.0;
        snapshot.total_global = 850.0;

        let alerts = evaluate(&snapshot, DEFAULT_WARN_PCT);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Warning);
    }

    #[test]
    fn forecast_overrun_fires_above_margin() {
        let mut snapshot = snapshot_with(vec![ProviderReport::success(Provider::Aws)]);
        snapshot.total_forecast = 1200.0;

        let alerts = evaluate(&snapshot, DEFAULT_WARN_PCT);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Forecast);
    }

    #[test]
    fn all_down_fires_when_every_configured_provider_errors() {
        let snapshot = snapshot_with(vec![
            ProviderReport::failure(Provider::Azure, "token rejected"),
            ProviderReport::failure(Provider::Gcp, "timeout"),
            ProviderReport::not_configured(Provider::Aws),
        ]);

        let alerts = evaluate(&snapshot, DEFAULT_WARN_PCT);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::AllProvidersDown);
    }

    #[test]
    fn all_down_suppressed_when_one_provider_is_healthy() {
        let mut healthy = ProviderReport::success(Provider::Aws);
        healthy.total_cost = 12.0;
        let mut snapshot = snapshot_with(vec![
            healthy,
            ProviderReport::failure(Provider::Azure, "token rejected"),
        ]);
        snapshot.total_global = 12.0;

        let alerts = evaluate(&snapshot, DEFAULT_WARN_PCT);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::ProviderError);
        assert!(alerts[0].message.contains("Azure"));
        assert!(alerts[0].message.contains("token rejected"));
    }

    #[test]
    fn unconfigured_providers_do_not_trigger_anything() {
        let snapshot = snapshot_with(vec![
            ProviderReport::not_configured(Provider::Aws),
            ProviderReport::not_configured(Provider::Azure),
            ProviderReport::not_configured(Provider::Gcp),
        ]);
        assert!(evaluate(&snapshot, DEFAULT_WARN_PCT).is_empty());
    }

    #[test]
    fn quiet_snapshot_yields_no_alerts() {
        let mut report = ProviderReport::success(Provider::Aws);
        report.total_cost = 50.0;
        let mut snapshot = snapshot_with(vec![report]);
        snapshot.total_global = 50.0;
        snapshot.budget_used_pct = 5.0;
        assert!(evaluate(&snapshot, DEFAULT_WARN_PCT).is_empty());
    }
}
