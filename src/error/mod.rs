//! Error types for cloudsight.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! - **Configuration**: credentials absent or malformed; never retried,
//!   surfaced as "not configured".
//! - **Authentication**: vault decryption tag mismatch or vendor auth
//!   rejection; retrying cannot fix a bad key or secret.
//! - **Transient**: network/rate-limit/timeout on a best-effort sub-fetch;
//!   swallowed with a zero or empty default.
//! - **Critical provider**: the mandatory cost sub-fetch failed; surfaced on
//!   that provider's report without aborting the others.
//! - **Format**: a malformed persisted blob.

use thiserror::Error;

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CloudSightError>;

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// Unexpected failure.
    GeneralError = 1,
    /// Credentials absent or unusable.
    NotConfigured = 2,
    /// Parse/format errors.
    ParseError = 3,
    /// Timeout.
    Timeout = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

// =============================================================================
// Error Type
// =============================================================================

/// Main error type for cloudsight operations.
#[derive(Error, Debug)]
pub enum CloudSightError {
    // ==========================================================================
    // Configuration
    // ==========================================================================
    /// No credentials stored in any representation.
    #[error("no cloud credentials configured; run `cloudsight creds` to add some")]
    NotConfigured,

    /// A provider's credential sub-record is missing required fields.
    #[error("credentials for {provider} are missing {field}")]
    CredentialsMissing { provider: String, field: String },

    /// Invalid value in stored settings.
    #[error("invalid config value for '{key}': {message}")]
    ConfigInvalid { key: String, message: String },

    // ==========================================================================
    // Vault
    // ==========================================================================
    /// The persisted blob is not the expected iv:ciphertext structure.
    #[error("credential blob is malformed: {0}")]
    BlobFormat(String),

    /// Authenticated decryption failed (wrong key or tampered data).
    #[error("credential decryption failed: wrong key or corrupted data")]
    Decryption,

    /// Cipher setup or encryption failure.
    #[error("encryption error: {0}")]
    Crypto(String),

    // ==========================================================================
    // Network / provider
    // ==========================================================================
    /// Vendor rejected our credentials.
    #[error("authentication rejected by {provider}: {message}")]
    Authentication { provider: String, message: String },

    /// Request timed out.
    #[error("request timeout after {seconds}s for {provider}")]
    Timeout { provider: String, seconds: u64 },

    /// Generic network failure.
    #[error("network error: {0}")]
    Network(String),

    /// Provider API returned an error response.
    #[error("provider {provider} API error: {message}")]
    ProviderApi {
        provider: String,
        status_code: Option<u16>,
        message: String,
    },

    /// Response body did not match the expected shape.
    #[error("failed to parse provider response: {0}")]
    ParseResponse(String),

    // ==========================================================================
    // Storage
    // ==========================================================================
    /// State file read/write failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CloudSightError {
    /// Exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::NotConfigured | Self::CredentialsMissing { .. } => ExitCode::NotConfigured,
            Self::Timeout { .. } => ExitCode::Timeout,
            Self::BlobFormat(_) | Self::ParseResponse(_) | Self::Serialization(_) => {
                ExitCode::ParseError
            }
            _ => ExitCode::GeneralError,
        }
    }

    /// Whether this error is a "not configured" condition rather than a
    /// runtime failure. Unconfigured providers are skipped, not reported as
    /// errors.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NotConfigured | Self::CredentialsMissing { .. } | Self::ConfigInvalid { .. }
        )
    }

    /// Whether a retry could plausibly succeed. Authentication and
    /// configuration failures are never retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Network(_))
    }

    /// Remediation hint for user-facing failure snapshots.
    #[must_use]
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            Self::Decryption => Some(
                "Stored credentials could not be decrypted. Re-enter them with `cloudsight creds`.",
            ),
            Self::NotConfigured => Some(
                "Add provider credentials with `cloudsight creds set-aws` (or set-azure/set-gcp).",
            ),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CloudSightError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout {
                provider: "unknown".to_string(),
                seconds: 0,
            }
        } else if e.is_decode() {
            Self::ParseResponse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<std::io::Error> for CloudSightError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_not_transient() {
        let err = CloudSightError::CredentialsMissing {
            provider: "aws".to_string(),
            field: "secret_access_key".to_string(),
        };
        assert!(err.is_configuration());
        assert!(!err.is_transient());
    }

    #[test]
    fn timeout_is_transient() {
        let err = CloudSightError::Timeout {
            provider: "azure".to_string(),
            seconds: 10,
        };
        assert!(err.is_transient());
        assert_eq!(err.exit_code(), ExitCode::Timeout);
    }

    #[test]
    fn decryption_carries_remediation() {
        assert!(CloudSightError::Decryption.remediation().is_some());
    }

    #[test]
    fn exit_code_mapping() {
        assert_eq!(
            CloudSightError::NotConfigured.exit_code(),
            ExitCode::NotConfigured
        );
        assert_eq!(
            CloudSightError::BlobFormat("no delimiter".to_string()).exit_code(),
            ExitCode::ParseError
        );
    }
}
