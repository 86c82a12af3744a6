//! Aggregation engine: one refresh cycle end to end.
//!
//! A cycle resolves credentials (plaintext, else encrypted blob), fans out to
//! every configured provider concurrently, combines the tagged reports into
//! one snapshot, evaluates alerts, and overwrites the persisted snapshot
//! slot. Only credential resolution can abort the cycle — and even then a
//! snapshot describing the failure is persisted so the presentation layer
//! never has to infer cause from absence of data. Provider failures are
//! contained to that provider's report.

use std::sync::Arc;

use chrono::Utc;
use futures::future::BoxFuture;
use reqwest::Client;
use serde::Serialize;
use tokio::time::timeout;

use crate::core::alerts;
use crate::core::currency;
use crate::core::models::{AggregatedSnapshot, ProviderReport};
use crate::error::{CloudSightError, Result};
use crate::providers::aws::AwsAdapter;
use crate::providers::azure::AzureAdapter;
use crate::providers::gcp::GcpAdapter;
use crate::providers::{CredentialSet, Provider};
use crate::storage::{PersistedState, StateStore};
use crate::vault::CredentialVault;

// =============================================================================
// Adapters
// =============================================================================

/// The three vendor adapters behind one handle.
pub struct Adapters {
    pub aws: AwsAdapter,
    pub azure: AzureAdapter,
    pub gcp: GcpAdapter,
}

impl Adapters {
    /// Adapters against the real vendor endpoints, sharing one HTTP client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            aws: AwsAdapter::new(client.clone()),
            azure: AzureAdapter::new(client.clone()),
            gcp: GcpAdapter::new(client),
        }
    }
}

// =============================================================================
// Connection Test
// =============================================================================

/// Per-provider outcome of a `test connection` run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTest {
    pub provider: Provider,
    pub configured: bool,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// =============================================================================
// Engine
// =============================================================================

/// Orchestrates refresh cycles against a state store and a set of adapters.
pub struct AggregationEngine {
    store: Arc<StateStore>,
    vault: CredentialVault,
    adapters: Adapters,
}

impl AggregationEngine {
    /// Create an engine over the given store and adapters.
    #[must_use]
    pub fn new(store: Arc<StateStore>, adapters: Adapters) -> Self {
        let vault = CredentialVault::new(store.clone());
        Self {
            store,
            vault,
            adapters,
        }
    }

    /// Run one refresh cycle and persist the resulting snapshot.
    ///
    /// Always returns a snapshot: credential-resolution failures produce a
    /// snapshot carrying `not_configured` or `decryption_error` rather than
    /// an `Err`. Only storage failures surface as errors.
    pub async fn refresh(&self) -> Result<AggregatedSnapshot> {
        let state = self.store.load().await?;
        let rate = currency::rate_for(&state.currency);

        let creds = match self.resolve_credentials(&state).await {
            Ok(creds) => creds,
            Err(e) => {
                let snapshot = failure_snapshot(&state, rate, &e);
                tracing::warn!(error = %e, "refresh aborted during credential resolution");
                self.store.save_snapshot(snapshot.clone()).await?;
                return Ok(snapshot);
            }
        };

        let reports = self.fetch_all(&creds).await;
        let snapshot = combine(
            reports,
            &state.currency,
            rate,
            state.budget_limit,
            state.budget_warn_pct,
        );

        self.store.save_snapshot(snapshot.clone()).await?;
        tracing::info!(
            total = snapshot.total_global,
            alerts = snapshot.alerts.len(),
            "refresh complete"
        );
        Ok(snapshot)
    }

    /// Run the provider fan-out against supplied, unsaved credentials and
    /// report per-provider success/failure. Persists nothing.
    pub async fn test_connection(&self, creds: &CredentialSet) -> Vec<ConnectionTest> {
        let reports = self.fetch_all(creds).await;
        reports
            .into_iter()
            .map(|report| ConnectionTest {
                provider: report.provider,
                configured: report.configured,
                ok: report.is_healthy(),
                error: report.error,
            })
            .collect()
    }

    async fn resolve_credentials(&self, state: &PersistedState) -> Result<CredentialSet> {
        if let Some(plain) = &state.credential_plaintext {
            return Ok(plain.clone());
        }
        if let Some(blob) = &state.credential_encrypted {
            return self.vault.decrypt(blob).await;
        }
        Err(CloudSightError::NotConfigured)
    }

    /// Fan out to every provider concurrently. Each task is tagged with its
    /// provider inside the report, bounded by that provider's timeout, and
    /// captured individually — one provider's failure or slowness never
    /// blocks or fails the others.
    async fn fetch_all(&self, creds: &CredentialSet) -> Vec<ProviderReport> {
        let tasks: Vec<BoxFuture<'_, ProviderReport>> = Provider::ALL
            .iter()
            .map(|&provider| self.provider_task(provider, creds))
            .collect();

        futures::future::join_all(tasks).await
    }

    fn provider_task<'a>(
        &'a self,
        provider: Provider,
        creds: &'a CredentialSet,
    ) -> BoxFuture<'a, ProviderReport> {
        Box::pin(async move {
            if !creds.is_configured(provider) {
                tracing::debug!(provider = %provider, "skipping unconfigured provider");
                return ProviderReport::not_configured(provider);
            }

            let limit = provider.default_timeout();
            let started = std::time::Instant::now();
            let result = timeout(limit, self.dispatch(provider, creds)).await;
            let duration_ms = started.elapsed().as_millis();

            match result {
                Ok(Ok(report)) => {
                    tracing::info!(provider = %provider, duration_ms, "fetch succeeded");
                    report
                }
                Ok(Err(e)) => {
                    tracing::warn!(provider = %provider, duration_ms, error = %e, "fetch failed");
                    ProviderReport::failure(provider, e.to_string())
                }
                Err(_) => {
                    let e = CloudSightError::Timeout {
                        provider: provider.cli_name().to_string(),
                        seconds: limit.as_secs(),
                    };
                    tracing::warn!(provider = %provider, "fetch timed out");
                    ProviderReport::failure(provider, e.to_string())
                }
            }
        })
    }

    async fn dispatch(&self, provider: Provider, creds: &CredentialSet) -> Result<ProviderReport> {
        match provider {
            Provider::Aws => {
                let aws_creds = creds.aws.as_ref().ok_or(CloudSightError::NotConfigured)?;
                self.adapters.aws.fetch(aws_creds).await
            }
            Provider::Azure => {
                let azure_creds = creds.azure.as_ref().ok_or(CloudSightError::NotConfigured)?;
                self.adapters.azure.fetch(azure_creds).await
            }
            Provider::Gcp => {
                let gcp_creds = creds.gcp.as_ref().ok_or(CloudSightError::NotConfigured)?;
                self.adapters.gcp.fetch(gcp_creds).await
            }
        }
    }
}

// =============================================================================
// Combine
// =============================================================================

/// Combine tagged provider reports into one snapshot and evaluate alerts.
///
/// Pure over its inputs. Reports are matched by their embedded provider tag,
/// never by position. Failed providers contribute zero to the total.
#[must_use]
pub fn combine(
    reports: Vec<ProviderReport>,
    currency_code: &str,
    rate: f64,
    budget_limit: f64,
    warn_pct: f64,
) -> AggregatedSnapshot {
    let mut snapshot = AggregatedSnapshot::empty(currency_code, rate, budget_limit);

    let mut total_raw = 0.0;
    let mut total_forecast = 0.0;
    for report in reports {
        if report.is_healthy() {
            total_raw += report.total_cost;
            total_forecast += report.forecast;
        }
        snapshot.per_provider.insert(report.provider, report);
    }

    snapshot.total_global = rate * total_raw;
    snapshot.total_forecast = total_forecast;

    let converted_limit = budget_limit * rate;
    snapshot.budget_used_pct = if converted_limit > 0.0 {
        snapshot.total_global / converted_limit * 100.0
    } else {
        0.0
    };

    snapshot.last_updated = Utc::now();
    snapshot.alerts = alerts::evaluate(&snapshot, warn_pct);
    snapshot
}

/// Snapshot describing a cycle aborted during credential resolution.
fn failure_snapshot(
    state: &PersistedState,
    rate: f64,
    error: &CloudSightError,
) -> AggregatedSnapshot {
    let mut snapshot = AggregatedSnapshot::empty(&state.currency, rate, state.budget_limit);
    match error {
        CloudSightError::NotConfigured => snapshot.not_configured = true,
        _ => snapshot.decryption_error = true,
    }
    // A malformed blob gets the same hint as a failed tag check: re-enter
    // the credentials.
    snapshot.remediation = error
        .remediation()
        .or_else(|| CloudSightError::Decryption.remediation())
        .map(ToString::to_string);
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::AlertKind;

    #[test]
    fn combine_isolates_failed_providers() {
        let mut aws = ProviderReport::success(Provider::Aws);
        aws.total_cost = 100.0;
        let azure = ProviderReport::failure(Provider::Azure, "boom");
        let mut gcp = ProviderReport::success(Provider::Gcp);
        gcp.total_cost = 50.0;

        let snapshot = combine(vec![aws, azure, gcp], "USD", 1.0, 1000.0, 80.0);
        assert!((snapshot.total_global - 150.0).abs() < f64::EPSILON);
        assert!(snapshot.per_provider[&Provider::Azure].error.is_some());
        assert!(snapshot.per_provider[&Provider::Aws].error.is_none());
        assert!(
            snapshot
                .alerts
                .iter()
                .any(|a| a.kind == AlertKind::ProviderError)
        );
    }

    #[test]
    fn combine_applies_rate_once_after_summing() {
        let mut aws = ProviderReport::success(Provider::Aws);
        aws.total_cost = 100.0;
        let mut azure = ProviderReport::success(Provider::Azure);
        azure.total_cost = 60.0;

        let snapshot = combine(vec![aws, azure], "EUR", 0.92, 1000.0, 80.0);
        assert!((snapshot.total_global - 160.0 * 0.92).abs() < 1e-9);
        // rate cancels out of the percentage
        assert!((snapshot.budget_used_pct - 16.0).abs() < 1e-9);
    }

    #[test]
    fn combine_matches_reports_by_tag_regardless_of_order() {
        let mut gcp = ProviderReport::success(Provider::Gcp);
        gcp.total_cost = 5.0;
        let mut aws = ProviderReport::success(Provider::Aws);
        aws.total_cost = 7.0;

        let snapshot = combine(vec![gcp, aws], "USD", 1.0, 1000.0, 80.0);
        assert!((snapshot.per_provider[&Provider::Gcp].total_cost - 5.0).abs() < f64::EPSILON);
        assert!((snapshot.per_provider[&Provider::Aws].total_cost - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn combine_handles_zero_budget() {
        let snapshot = combine(Vec::new(), "USD", 1.0, 0.0, 80.0);
        assert!((snapshot.budget_used_pct).abs() < f64::EPSILON);
    }

    #[test]
    fn failure_snapshot_shapes_are_distinguishable() {
        let state = PersistedState::default();
        let nc = failure_snapshot(&state, 1.0, &CloudSightError::NotConfigured);
        assert!(nc.not_configured);
        assert!(!nc.decryption_error);

        let de = failure_snapshot(&state, 1.0, &CloudSightError::Decryption);
        assert!(de.decryption_error);
        assert!(!de.not_configured);
        assert!(de.remediation.is_some());
    }
}
