//! Human-readable terminal output.
//!
//! Renders the aggregated snapshot as a dashboard: global totals, a budget
//! gauge, per-provider panels with service breakdowns, and the alert list.
//! Colors come from `colored` and are suppressed wholesale by `no_color`.

use colored::Colorize;

use crate::core::currency::symbol_for;
use crate::core::engine::ConnectionTest;
use crate::core::models::{AggregatedSnapshot, ProviderReport, Severity};

/// Width of the budget gauge in characters.
const GAUGE_WIDTH: usize = 30;

/// Render the full snapshot dashboard.
#[must_use]
pub fn render_snapshot(snapshot: &AggregatedSnapshot, no_color: bool) -> String {
    let mut out = String::new();

    if snapshot.not_configured {
        out.push_str(&paint("No cloud providers configured.", no_color, |s| {
            s.yellow().bold()
        }));
        out.push('\n');
        if let Some(remediation) = &snapshot.remediation {
            out.push_str(remediation);
            out.push('\n');
        }
        return out;
    }
    if snapshot.decryption_error {
        out.push_str(&paint(
            "Stored credentials could not be decrypted.",
            no_color,
            |s| s.red().bold(),
        ));
        out.push('\n');
        if let Some(remediation) = &snapshot.remediation {
            out.push_str(remediation);
            out.push('\n');
        }
        return out;
    }

    let symbol = symbol_for(&snapshot.currency);

    out.push_str(&paint("CloudSight", no_color, |s| s.cyan().bold()));
    out.push_str(&format!(
        "  ({} as of {})\n\n",
        snapshot.currency,
        snapshot.last_updated.format("%Y-%m-%d %H:%M UTC")
    ));

    out.push_str(&format!(
        "Month-to-date: {}\n",
        paint(
            &format!("{symbol}{:.2}", snapshot.total_global),
            no_color,
            |s| s.bold()
        )
    ));
    out.push_str(&format!(
        "Forecast:      {symbol}{:.2}\n",
        snapshot.display_forecast()
    ));

    out.push_str(&render_budget_gauge(snapshot, no_color));
    out.push('\n');

    for report in snapshot.per_provider.values() {
        out.push_str(&render_provider(report, symbol, snapshot.rate, no_color));
    }

    if !snapshot.alerts.is_empty() {
        out.push('\n');
        out.push_str(&paint("Alerts", no_color, |s| s.bold()));
        out.push('\n');
        for alert in &snapshot.alerts {
            let label = severity_label(alert.severity, no_color);
            out.push_str(&format!("  [{label}] {}\n", alert.message));
        }
    }

    out
}

/// Render connection test results, one line per provider.
#[must_use]
pub fn render_tests(results: &[ConnectionTest], no_color: bool) -> String {
    let mut out = String::new();
    for result in results {
        let status = if !result.configured {
            paint("SKIP", no_color, |s| s.dimmed())
        } else if result.ok {
            paint("PASS", no_color, |s| s.green().bold())
        } else {
            paint("FAIL", no_color, |s| s.red().bold())
        };
        out.push_str(&format!(
            "{status}  {}",
            result.provider.display_name()
        ));
        if let Some(error) = &result.error {
            out.push_str(&format!("  ({error})"));
        } else if !result.configured {
            out.push_str("  (no credentials)");
        }
        out.push('\n');
    }
    out
}

fn render_provider(report: &ProviderReport, symbol: &str, rate: f64, no_color: bool) -> String {
    let mut out = String::new();
    let name = paint(report.provider.display_name(), no_color, |s| s.bold());

    if !report.configured {
        out.push_str(&format!(
            "{name}: {}\n",
            paint("not configured", no_color, |s| s.dimmed())
        ));
        return out;
    }
    if let Some(error) = &report.error {
        out.push_str(&format!(
            "{name}: {} {error}\n",
            paint("error:", no_color, |s| s.red())
        ));
        return out;
    }

    out.push_str(&format!(
        "{name}: {symbol}{:.2}",
        report.total_cost * rate
    ));
    if report.forecast > 0.0 {
        out.push_str(&format!("  (forecast {symbol}{:.2})", report.forecast * rate));
    }
    if let Some(anomaly) = &report.anomaly {
        if anomaly.is_anomaly {
            out.push_str(&format!(
                "  {}",
                paint(
                    &format!(
                        "spike: {symbol}{:.2} vs avg {symbol}{:.2}",
                        anomaly.today_cost * rate,
                        anomaly.average * rate
                    ),
                    no_color,
                    |s| s.red()
                )
            ));
        }
    }
    out.push('\n');

    for service in &report.services {
        out.push_str(&format!(
            "    {:<30} {symbol}{:.2}\n",
            service.name,
            service.amount * rate
        ));
    }
    out
}

fn render_budget_gauge(snapshot: &AggregatedSnapshot, no_color: bool) -> String {
    let pct = snapshot.display_budget_pct();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let filled = ((pct / 100.0) * GAUGE_WIDTH as f64).round() as usize;
    let filled = filled.min(GAUGE_WIDTH);

    let bar: String = "█".repeat(filled) + &"░".repeat(GAUGE_WIDTH - filled);
    let bar = if no_color {
        bar
    } else if snapshot.budget_used_pct >= 100.0 {
        bar.red().to_string()
    } else if snapshot.budget_used_pct >= 80.0 {
        bar.yellow().to_string()
    } else {
        bar.green().to_string()
    };

    let symbol = symbol_for(&snapshot.currency);
    format!(
        "Budget:        {bar} {:.1}% of {symbol}{:.2}\n",
        snapshot.budget_used_pct,
        snapshot.budget_limit * snapshot.rate
    )
}

fn severity_label(severity: Severity, no_color: bool) -> String {
    let label = severity.label();
    if no_color {
        return label.to_string();
    }
    match severity {
        Severity::Critical => label.red().bold().to_string(),
        Severity::Warning => label.yellow().to_string(),
        Severity::Info => label.cyan().to_string(),
    }
}

fn paint(text: &str, no_color: bool, style: impl Fn(&str) -> colored::ColoredString) -> String {
    if no_color {
        text.to_string()
    } else {
        style(text).to_string()
    }
}
