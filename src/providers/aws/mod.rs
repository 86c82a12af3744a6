//! AWS Cost Explorer adapter.
//!
//! Three sub-fetches against the Cost Explorer JSON API, each a signed POST:
//!
//! - `GetCostAndUsage` (monthly, grouped by service) — critical; its failure
//!   fails the adapter call.
//! - `GetCostForecast` — best-effort; accounts with too little history get a
//!   zero forecast, not a failure.
//! - `GetCostAndUsage` (daily, trailing window) — best-effort; feeds the
//!   anomaly detector and the dashboard chart.

pub mod sigv4;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::core::anomaly;
use crate::core::forecast::normalize_services;
use crate::core::models::{DailyCost, ProviderReport, ServiceCost};
use crate::error::{CloudSightError, Result};
use crate::providers::{AwsCredentials, Provider};
use sigv4::Signer;

/// Cost Explorer is a global service served out of us-east-1.
pub const DEFAULT_ENDPOINT: &str = "https://ce.us-east-1.amazonaws.com";

const REGION: &str = "us-east-1";
const SERVICE: &str = "ce";
const TARGET_PREFIX: &str = "AWSInsightsIndexService";

/// Length of the daily history window fed to the anomaly detector.
const HISTORY_DAYS: i64 = 14;

/// AWS adapter with an overridable endpoint (tests point it at a mock).
pub struct AwsAdapter {
    client: Client,
    endpoint: String,
}

// =============================================================================
// Response shapes
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CostAndUsageResponse {
    #[serde(default)]
    results_by_time: Vec<ResultByTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResultByTime {
    time_period: Option<TimePeriod>,
    total: Option<MetricMap>,
    #[serde(default)]
    groups: Vec<Group>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TimePeriod {
    start: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Group {
    #[serde(default)]
    keys: Vec<String>,
    metrics: Option<MetricMap>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MetricMap {
    unblended_cost: Option<MetricValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MetricValue {
    amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ForecastResponse {
    total: Option<MetricValue>,
}

impl MetricMap {
    fn amount(&self) -> Option<f64> {
        self.unblended_cost
            .as_ref()
            .and_then(|v| v.amount.parse().ok())
    }
}

// =============================================================================
// Adapter
// =============================================================================

impl AwsAdapter {
    /// Adapter against the real Cost Explorer endpoint.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_endpoint(client, DEFAULT_ENDPOINT)
    }

    /// Adapter with an explicit endpoint.
    #[must_use]
    pub fn with_endpoint(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Fetch the normalized cost report for this account.
    pub async fn fetch(&self, creds: &AwsCredentials) -> Result<ProviderReport> {
        self.fetch_at(creds, Utc::now()).await
    }

    /// Fetch with an explicit clock (kept separate for deterministic tests).
    pub async fn fetch_at(
        &self,
        creds: &AwsCredentials,
        now: DateTime<Utc>,
    ) -> Result<ProviderReport> {
        creds.validate()?;

        let signer = Signer {
            access_key_id: creds.access_key_id.clone(),
            secret_access_key: creds.secret_access_key.clone(),
            region: REGION.to_string(),
            service: SERVICE.to_string(),
        };
        let today = now.date_naive();

        // Critical: month-to-date total and service breakdown.
        let (total, raw_services) = self.month_to_date(&signer, today, now).await?;

        // Best-effort: native forecast. Insufficient account history is not
        // a hard failure.
        let forecast = match self.forecast(&signer, today, now).await {
            Ok(amount) => amount,
            Err(e) => {
                tracing::debug!(error = %e, "AWS forecast unavailable, defaulting to 0");
                0.0
            }
        };

        // Best-effort: trailing daily history.
        let history = match self.daily_history(&signer, today, now).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(error = %e, "AWS daily history unavailable");
                Vec::new()
            }
        };

        let mut report = ProviderReport::success(Provider::Aws);
        report.total_cost = total;
        report.forecast = forecast;
        report.services = normalize_services(raw_services);
        report.anomaly = anomaly::detect(&history);
        report.history = history;
        Ok(report)
    }

    async fn month_to_date(
        &self,
        signer: &Signer,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<(f64, Vec<ServiceCost>)> {
        let first_day = today.with_day(1).unwrap_or(today);
        let tomorrow = today + Duration::days(1);

        let payload = json!({
            "TimePeriod": { "Start": first_day.to_string(), "End": tomorrow.to_string() },
            "Granularity": "MONTHLY",
            "Metrics": ["UnblendedCost"],
            "GroupBy": [{ "Type": "DIMENSION", "Key": "SERVICE" }]
        });
        let body: CostAndUsageResponse = self
            .post_target(signer, "GetCostAndUsage", &payload, now)
            .await?;

        let mut total = 0.0;
        let mut services = Vec::new();
        if let Some(result) = body.results_by_time.first() {
            for group in &result.groups {
                let name = group.keys.first();
                let amount = group.metrics.as_ref().and_then(MetricMap::amount);
                if let (Some(name), Some(amount)) = (name, amount) {
                    total += amount;
                    services.push(ServiceCost::new(name, amount));
                }
            }
        }
        Ok((total, services))
    }

    async fn forecast(
        &self,
        signer: &Signer,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<f64> {
        let tomorrow = today + Duration::days(1);
        let month_end = crate::core::forecast::days_in_month(today);
        let last_day = today.with_day(month_end).unwrap_or(today);

        let payload = json!({
            "TimePeriod": { "Start": tomorrow.to_string(), "End": last_day.to_string() },
            "Metric": "UNBLENDED_COST",
            "Granularity": "MONTHLY"
        });
        let body: ForecastResponse = self
            .post_target(signer, "GetCostForecast", &payload, now)
            .await?;

        Ok(body
            .total
            .and_then(|v| v.amount.parse().ok())
            .unwrap_or(0.0))
    }

    async fn daily_history(
        &self,
        signer: &Signer,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<DailyCost>> {
        let start = today - Duration::days(HISTORY_DAYS);
        let tomorrow = today + Duration::days(1);

        let payload = json!({
            "TimePeriod": { "Start": start.to_string(), "End": tomorrow.to_string() },
            "Granularity": "DAILY",
            "Metrics": ["UnblendedCost"]
        });
        let body: CostAndUsageResponse = self
            .post_target(signer, "GetCostAndUsage", &payload, now)
            .await?;

        let mut history: Vec<DailyCost> = body
            .results_by_time
            .iter()
            .filter_map(|result| {
                let date = result.time_period.as_ref()?.start.clone();
                let cost = result.total.as_ref().and_then(MetricMap::amount)?;
                Some(DailyCost::new(date, cost))
            })
            .collect();
        history.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(history)
    }

    async fn post_target<T: serde::de::DeserializeOwned>(
        &self,
        signer: &Signer,
        operation: &str,
        payload: &serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<T> {
        let body = serde_json::to_vec(payload)?;
        let target = format!("{TARGET_PREFIX}.{operation}");
        let host = host_of(&self.endpoint)?;
        let signed = signer.sign(&host, &target, &body, now);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/x-amz-json-1.1")
            .header("X-Amz-Target", &target)
            .header("X-Amz-Date", &signed.amz_date)
            .header("Authorization", &signed.authorization)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(CloudSightError::Authentication {
                provider: "aws".to_string(),
                message: "request signature rejected (check access key and secret)".to_string(),
            });
        }
        if !status.is_success() {
            return Err(CloudSightError::ProviderApi {
                provider: "aws".to_string(),
                status_code: Some(status.as_u16()),
                message: format!("{operation} failed"),
            });
        }

        response
            .json()
            .await
            .map_err(|e| CloudSightError::ParseResponse(e.to_string()))
    }
}

/// Host header value (including any port) for an endpoint URL.
fn host_of(endpoint: &str) -> Result<String> {
    let url = reqwest::Url::parse(endpoint)
        .map_err(|e| CloudSightError::Network(format!("bad endpoint {endpoint}: {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| CloudSightError::Network(format!("endpoint {endpoint} has no host")))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_of_strips_scheme_and_keeps_port() {
        assert_eq!(
            host_of("https://ce.us-east-1.amazonaws.com").unwrap(),
            "ce.us-east-1.amazonaws.com"
        );
        assert_eq!(host_of("http://127.0.0.1:18443").unwrap(), "127.0.0.1:18443");
        assert!(host_of("not a url").is_err());
    }

    #[test]
    fn metric_amounts_parse_from_strings() {
        let body: CostAndUsageResponse = serde_json::from_value(json!({
            "ResultsByTime": [{
                "TimePeriod": { "Start": "2025-06-01", "End": "2025-06-11" },
                "Groups": [
                    { "Keys": ["Amazon EC2"], "Metrics": { "UnblendedCost": { "Amount": "42.5", "Unit": "USD" } } },
                    { "Keys": ["Amazon S3"], "Metrics": { "UnblendedCost": { "Amount": "not-a-number", "Unit": "USD" } } }
                ]
            }]
        }))
        .unwrap();

        let result = &body.results_by_time[0];
        assert_eq!(result.groups.len(), 2);
        assert_eq!(
            result.groups[0].metrics.as_ref().unwrap().amount(),
            Some(42.5)
        );
        assert_eq!(result.groups[1].metrics.as_ref().unwrap().amount(), None);
    }

    #[tokio::test]
    async fn unconfigured_credentials_fail_before_any_request() {
        let adapter = AwsAdapter::with_endpoint(Client::new(), "http://127.0.0.1:1");
        let err = adapter.fetch(&AwsCredentials::default()).await.unwrap_err();
        assert!(err.is_configuration());
    }
}
