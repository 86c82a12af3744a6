//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CloudSight - multi-cloud cost aggregation and alerting.
#[derive(Parser, Debug)]
#[command(name = "cloudsight")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    // === Global flags ===
    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log level
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve the effective output format.
    #[must_use]
    pub const fn effective_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable dashboard
    Human,
    /// JSON
    Json,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch fresh cost data from every configured provider
    Refresh,

    /// Refresh continuously at a fixed interval
    Watch(WatchArgs),

    /// Display the last persisted snapshot without fetching
    Show,

    /// Verify stored credentials against each provider's API
    Test,

    /// Manage provider credentials
    #[command(subcommand)]
    Creds(CredsCommand),

    /// View or change display and budget settings
    Config(ConfigArgs),
}

/// Arguments for the `watch` command.
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Seconds between refresh cycles
    #[arg(long, short = 'i', default_value = "300")]
    pub interval: u64,
}

impl WatchArgs {
    /// Validate argument combinations.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.interval == 0 {
            return Err(crate::error::CloudSightError::ConfigInvalid {
                key: "interval".to_string(),
                message: "watch interval must be greater than 0 seconds".to_string(),
            });
        }
        Ok(())
    }
}

/// Credential subcommands.
#[derive(Subcommand, Debug)]
pub enum CredsCommand {
    /// Store AWS credentials
    SetAws {
        /// IAM access key ID
        #[arg(long, env = "AWS_ACCESS_KEY_ID")]
        access_key_id: String,

        /// IAM secret access key
        #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
        secret_access_key: String,
    },

    /// Store Azure service-principal credentials
    SetAzure {
        /// Azure AD tenant ID
        #[arg(long, env = "AZURE_TENANT_ID")]
        tenant_id: String,

        /// Application (client) ID
        #[arg(long, env = "AZURE_CLIENT_ID")]
        client_id: String,

        /// Client secret
        #[arg(long, env = "AZURE_CLIENT_SECRET", hide_env_values = true)]
        client_secret: String,

        /// Subscription to query
        #[arg(long, env = "AZURE_SUBSCRIPTION_ID")]
        subscription_id: String,
    },

    /// Store GCP service-account credentials
    SetGcp {
        /// Path to the service-account key JSON file
        #[arg(long, value_name = "FILE")]
        key_file: PathBuf,

        /// Billing account ID (e.g. 012345-6789AB-CDEF01)
        #[arg(long)]
        billing_account_id: String,
    },

    /// Seal stored credentials with AES-256-GCM
    Encrypt,

    /// Remove all stored credentials
    Clear,
}

/// Arguments for the `config` command. With no flags, prints the current
/// settings.
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Display currency code (USD, EUR, GBP, INR, JPY, CAD, AUD)
    #[arg(long)]
    pub currency: Option<String>,

    /// Monthly budget ceiling in USD
    #[arg(long)]
    pub budget: Option<f64>,

    /// Budget warning threshold as a percentage
    #[arg(long, value_name = "PCT")]
    pub warn_pct: Option<f64>,
}
