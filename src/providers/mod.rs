//! Provider descriptors and credential records.
//!
//! Defines the three supported cloud vendors and the credential shapes each
//! one needs. The wire adapters live in the per-provider submodules.

pub mod aws;
pub mod azure;
pub mod gcp;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CloudSightError, Result};

// =============================================================================
// Provider Enum
// =============================================================================

/// Supported cloud providers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aws,
    Azure,
    Gcp,
}

impl Provider {
    /// All providers in display order.
    pub const ALL: &'static [Self] = &[Self::Aws, Self::Azure, Self::Gcp];

    /// CLI name for this provider.
    #[must_use]
    pub const fn cli_name(self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Azure => "azure",
            Self::Gcp => "gcp",
        }
    }

    /// Display name for human output.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Aws => "AWS",
            Self::Azure => "Azure",
            Self::Gcp => "GCP",
        }
    }

    /// Parse from CLI argument.
    pub fn from_cli_name(name: &str) -> Result<Self> {
        let lower = name.to_lowercase();
        Self::ALL
            .iter()
            .find(|p| p.cli_name() == lower)
            .copied()
            .ok_or_else(|| CloudSightError::ConfigInvalid {
                key: "provider".to_string(),
                message: format!("unknown provider '{name}'"),
            })
    }

    /// Default timeout for one adapter call (covers all sub-fetches).
    #[must_use]
    pub const fn default_timeout(self) -> Duration {
        match self {
            // GCP needs a token exchange before the billing call
            Self::Gcp => Duration::from_secs(20),
            Self::Aws | Self::Azure => Duration::from_secs(15),
        }
    }

    /// Whether this provider supplies a daily cost history (the anomaly
    /// detector only runs where one exists).
    #[must_use]
    pub const fn supports_history(self) -> bool {
        matches!(self, Self::Aws)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cli_name())
    }
}

// =============================================================================
// Credential Records
// =============================================================================

/// AWS access key pair for Cost Explorer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl AwsCredentials {
    /// Check that all required fields are populated.
    pub fn validate(&self) -> Result<()> {
        let missing = if self.access_key_id.trim().is_empty() {
            Some("accessKeyId")
        } else if self.secret_access_key.trim().is_empty() {
            Some("secretAccessKey")
        } else {
            None
        };
        match missing {
            Some(field) => Err(CloudSightError::CredentialsMissing {
                provider: "aws".to_string(),
                field: field.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Azure service principal (client credentials) plus target subscription.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AzureCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub subscription_id: String,
}

impl AzureCredentials {
    /// Check that all required fields are populated.
    pub fn validate(&self) -> Result<()> {
        let missing = if self.tenant_id.trim().is_empty() {
            Some("tenantId")
        } else if self.client_id.trim().is_empty() {
            Some("clientId")
        } else if self.client_secret.trim().is_empty() {
            Some("clientSecret")
        } else if self.subscription_id.trim().is_empty() {
            Some("subscriptionId")
        } else {
            None
        };
        match missing {
            Some(field) => Err(CloudSightError::CredentialsMissing {
                provider: "azure".to_string(),
                field: field.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// GCP service-account key JSON plus billing account id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GcpCredentials {
    /// Raw service-account key JSON as downloaded from the console.
    pub service_account_json: String,
    pub billing_account_id: String,
}

impl GcpCredentials {
    /// Check that all required fields are populated.
    pub fn validate(&self) -> Result<()> {
        let missing = if self.service_account_json.trim().is_empty() {
            Some("serviceAccountJson")
        } else if self.billing_account_id.trim().is_empty() {
            Some("billingAccountId")
        } else {
            None
        };
        match missing {
            Some(field) => Err(CloudSightError::CredentialsMissing {
                provider: "gcp".to_string(),
                field: field.to_string(),
            }),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Credential Set
// =============================================================================

/// The full credential record: one optional sub-record per provider.
///
/// Exists only in memory or in encrypted form; never logged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsCredentials>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzureCredentials>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcp: Option<GcpCredentials>,
}

impl CredentialSet {
    /// Whether any provider has a populated sub-record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configured_providers().is_empty()
    }

    /// Providers whose sub-record is present and minimally populated.
    #[must_use]
    pub fn configured_providers(&self) -> Vec<Provider> {
        let mut configured = Vec::new();
        if self.aws.as_ref().is_some_and(|c| c.validate().is_ok()) {
            configured.push(Provider::Aws);
        }
        if self.azure.as_ref().is_some_and(|c| c.validate().is_ok()) {
            configured.push(Provider::Azure);
        }
        if self.gcp.as_ref().is_some_and(|c| c.validate().is_ok()) {
            configured.push(Provider::Gcp);
        }
        configured
    }

    /// Whether the given provider is configured.
    #[must_use]
    pub fn is_configured(&self, provider: Provider) -> bool {
        self.configured_providers().contains(&provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_cli_name() {
        assert_eq!(Provider::from_cli_name("aws").unwrap(), Provider::Aws);
        assert_eq!(Provider::from_cli_name("AZURE").unwrap(), Provider::Azure);
        assert!(Provider::from_cli_name("oracle").is_err());
    }

    #[test]
    fn empty_fields_fail_validation() {
        let creds = AwsCredentials {
            access_key_id: "AKIA123".to_string(),
            secret_access_key: "  ".to_string(),
        };
        let err = creds.validate().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn configured_providers_skips_partial_records() {
        let set = CredentialSet {
            aws: Some(AwsCredentials {
                access_key_id: "AKIA123".to_string(),
                secret_access_key: "secret".to_string(),
            }),
            azure: Some(AzureCredentials::default()),
            gcp: None,
        };
        assert_eq!(set.configured_providers(), vec![Provider::Aws]);
        assert!(set.is_configured(Provider::Aws));
        assert!(!set.is_configured(Provider::Azure));
    }

    #[test]
    fn default_set_is_empty() {
        assert!(CredentialSet::default().is_empty());
    }
}
