//! Azure Cost Management adapter.
//!
//! Two dependent calls: an OAuth2 client-credentials token from the tenant's
//! login endpoint, then an ActualCost query against the subscription, grouped
//! by service name. Both belong to the critical sub-fetch — without them
//! there is no cost figure. Azure has no native forecast API wired here, so
//! the forecast is the linear month-end projection. No daily history.

use chrono::{Datelike, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::core::forecast::{linear_forecast, month_progress, normalize_services};
use crate::core::models::{ProviderReport, ServiceCost};
use crate::error::{CloudSightError, Result};
use crate::providers::{AzureCredentials, Provider};

/// Default Azure AD login endpoint.
pub const DEFAULT_LOGIN_BASE: &str = "https://login.microsoftonline.com";

/// Default ARM management endpoint.
pub const DEFAULT_MANAGEMENT_BASE: &str = "https://management.azure.com";

const COST_API_VERSION: &str = "2021-10-01";

/// Azure adapter with overridable endpoints (tests point these at a mock).
pub struct AzureAdapter {
    client: Client,
    login_base: String,
    management_base: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    properties: QueryProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryProperties {
    #[serde(default)]
    columns: Vec<QueryColumn>,
    #[serde(default)]
    rows: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryColumn {
    name: String,
}

impl AzureAdapter {
    /// Adapter against the real Azure endpoints.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_endpoints(client, DEFAULT_LOGIN_BASE, DEFAULT_MANAGEMENT_BASE)
    }

    /// Adapter with explicit endpoints.
    #[must_use]
    pub fn with_endpoints(
        client: Client,
        login_base: impl Into<String>,
        management_base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            login_base: login_base.into(),
            management_base: management_base.into(),
        }
    }

    /// Fetch the normalized cost report for this subscription.
    pub async fn fetch(&self, creds: &AzureCredentials) -> Result<ProviderReport> {
        self.fetch_at(creds, Utc::now().date_naive()).await
    }

    /// Fetch with an explicit "today" (kept separate for deterministic tests).
    pub async fn fetch_at(
        &self,
        creds: &AzureCredentials,
        today: NaiveDate,
    ) -> Result<ProviderReport> {
        creds.validate()?;

        let token = self.fetch_token(creds).await?;
        let (total, raw_services) = self.fetch_costs(creds, &token, today).await?;

        let (days_elapsed, days_in_month) = month_progress(today);
        let mut report = ProviderReport::success(Provider::Azure);
        report.total_cost = total;
        report.forecast = linear_forecast(total, days_elapsed, days_in_month);
        report.services = normalize_services(raw_services);
        Ok(report)
    }

    async fn fetch_token(&self, creds: &AzureCredentials) -> Result<String> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_base, creds.tenant_id
        );
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
            ("scope", "https://management.azure.com/.default"),
        ];

        let response = self.client.post(&url).form(&form).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::BAD_REQUEST
        {
            return Err(CloudSightError::Authentication {
                provider: "azure".to_string(),
                message: format!("token request rejected (HTTP {})", status.as_u16()),
            });
        }
        if !status.is_success() {
            return Err(CloudSightError::ProviderApi {
                provider: "azure".to_string(),
                status_code: Some(status.as_u16()),
                message: "token endpoint error".to_string(),
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CloudSightError::ParseResponse(e.to_string()))?;
        Ok(token.access_token)
    }

    async fn fetch_costs(
        &self,
        creds: &AzureCredentials,
        token: &str,
        today: NaiveDate,
    ) -> Result<(f64, Vec<ServiceCost>)> {
        let url = format!(
            "{}/subscriptions/{}/providers/Microsoft.CostManagement/query?api-version={}",
            self.management_base, creds.subscription_id, COST_API_VERSION
        );

        let first_day = today.with_day(1).unwrap_or(today);
        let query = json!({
            "type": "ActualCost",
            "dataSet": {
                "granularity": "None",
                "aggregation": {
                    "totalCost": { "name": "Cost", "function": "Sum" }
                },
                "grouping": [{ "type": "Dimension", "name": "ServiceName" }]
            },
            "timePeriod": {
                "from": format!("{first_day}T00:00:00Z"),
                "to": format!("{today}T23:59:59Z")
            }
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CloudSightError::ProviderApi {
                provider: "azure".to_string(),
                status_code: Some(status.as_u16()),
                message: "cost query failed".to_string(),
            });
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| CloudSightError::ParseResponse(e.to_string()))?;
        Ok(parse_rows(&body.properties))
    }
}

/// Extract (total, services) from a query result. Rows are positional;
/// columns tell us which index holds the cost and which the service name
/// (the documented default order is [Cost, ServiceName, Currency]).
fn parse_rows(properties: &QueryProperties) -> (f64, Vec<ServiceCost>) {
    let cost_idx = column_index(&properties.columns, "Cost").unwrap_or(0);
    let name_idx = column_index(&properties.columns, "ServiceName").unwrap_or(1);

    let mut total = 0.0;
    let mut services = Vec::new();
    for row in &properties.rows {
        let cost = row.get(cost_idx).and_then(serde_json::Value::as_f64);
        let name = row.get(name_idx).and_then(serde_json::Value::as_str);
        if let (Some(cost), Some(name)) = (cost, name) {
            total += cost;
            services.push(ServiceCost::new(name, cost));
        }
    }
    (total, services)
}

fn column_index(columns: &[QueryColumn], name: &str) -> Option<usize> {
    columns.iter().position(|c| c.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties(columns: &[&str], rows: Vec<Vec<serde_json::Value>>) -> QueryProperties {
        QueryProperties {
            columns: columns
                .iter()
                .map(|n| QueryColumn {
                    name: (*n).to_string(),
                })
                .collect(),
            rows,
        }
    }

    #[test]
    fn parse_rows_sums_and_collects() {
        let props = properties(
            &["Cost", "ServiceName", "Currency"],
            vec![
                vec![json!(10.5), json!("Virtual Machines"), json!("USD")],
                vec![json!(2.0), json!("Storage"), json!("USD")],
            ],
        );
        let (total, services) = parse_rows(&props);
        assert!((total - 12.5).abs() < f64::EPSILON);
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].name, "Virtual Machines");
    }

    #[test]
    fn parse_rows_honors_column_order() {
        let props = properties(
            &["ServiceName", "Cost"],
            vec![vec![json!("App Service"), json!(7.0)]],
        );
        let (total, services) = parse_rows(&props);
        assert!((total - 7.0).abs() < f64::EPSILON);
        assert_eq!(services[0].name, "App Service");
    }

    #[test]
    fn parse_rows_skips_malformed_entries() {
        let props = properties(
            &["Cost", "ServiceName"],
            vec![
                vec![json!("not-a-number"), json!("Broken")],
                vec![json!(3.0), json!("Functions")],
            ],
        );
        let (total, services) = parse_rows(&props);
        assert!((total - 3.0).abs() < f64::EPSILON);
        assert_eq!(services.len(), 1);
    }

    #[tokio::test]
    async fn unconfigured_credentials_fail_before_any_request() {
        // Adapter pointed at an unroutable endpoint: a network attempt would error
        // differently than the configuration check we expect here.
        let adapter = AzureAdapter::with_endpoints(
            Client::new(),
            "http://127.0.0.1:1",
            "http://127.0.0.1:1",
        );
        let err = adapter
            .fetch(&AzureCredentials::default())
            .await
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
