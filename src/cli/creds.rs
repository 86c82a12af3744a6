//! The `creds` command family: store, seal, and clear provider credentials.
//!
//! `set-*` merges one provider's credentials into the stored record without
//! touching the others, preserving the at-rest representation: if the record
//! is currently sealed it is re-sealed after the change. Secret values are
//! never echoed or logged.

use std::sync::Arc;

use crate::cli::args::CredsCommand;
use crate::error::{CloudSightError, Result};
use crate::providers::{AwsCredentials, AzureCredentials, CredentialSet, GcpCredentials};
use crate::storage::StateStore;
use crate::vault::CredentialVault;

/// Execute a creds subcommand.
pub async fn execute(cmd: CredsCommand) -> Result<()> {
    let store = crate::cli::open_store();

    match cmd {
        CredsCommand::SetAws {
            access_key_id,
            secret_access_key,
        } => {
            let creds = AwsCredentials {
                access_key_id,
                secret_access_key,
            };
            creds.validate()?;
            merge(&store, |set| set.aws = Some(creds)).await?;
            println!("AWS credentials saved.");
        }

        CredsCommand::SetAzure {
            tenant_id,
            client_id,
            client_secret,
            subscription_id,
        } => {
            let creds = AzureCredentials {
                tenant_id,
                client_id,
                client_secret,
                subscription_id,
            };
            creds.validate()?;
            merge(&store, |set| set.azure = Some(creds)).await?;
            println!("Azure credentials saved.");
        }

        CredsCommand::SetGcp {
            key_file,
            billing_account_id,
        } => {
            let service_account_json = std::fs::read_to_string(&key_file).map_err(|e| {
                CloudSightError::ConfigInvalid {
                    key: "gcp.keyFile".to_string(),
                    message: format!("cannot read {}: {e}", key_file.display()),
                }
            })?;
            // Catch obviously wrong files before they fail at fetch time
            serde_json::from_str::<serde_json::Value>(&service_account_json).map_err(|e| {
                CloudSightError::ConfigInvalid {
                    key: "gcp.keyFile".to_string(),
                    message: format!("{} is not valid JSON: {e}", key_file.display()),
                }
            })?;

            let creds = GcpCredentials {
                service_account_json,
                billing_account_id,
            };
            creds.validate()?;
            merge(&store, |set| set.gcp = Some(creds)).await?;
            println!("GCP credentials saved.");
        }

        CredsCommand::Encrypt => {
            let state = store.load().await?;
            if state.credential_encrypted.is_some() {
                println!("Credentials are already encrypted.");
                return Ok(());
            }
            let Some(plain) = state.credential_plaintext else {
                return Err(CloudSightError::NotConfigured);
            };

            let vault = CredentialVault::new(store.clone());
            let blob = vault.encrypt(&plain).await?;
            store.save_encrypted_credentials(blob).await?;
            println!("Credentials sealed with AES-256-GCM.");
        }

        CredsCommand::Clear => {
            store.clear_credentials().await?;
            println!("All stored credentials removed.");
        }
    }

    Ok(())
}

/// Apply `mutate` to the stored credential record, preserving its at-rest
/// representation.
async fn merge<F>(store: &Arc<StateStore>, mutate: F) -> Result<()>
where
    F: FnOnce(&mut CredentialSet),
{
    let state = store.load().await?;

    if let Some(blob) = &state.credential_encrypted {
        let vault = CredentialVault::new(store.clone());
        let mut set = vault.decrypt(blob).await?;
        mutate(&mut set);
        let sealed = vault.encrypt(&set).await?;
        store.save_encrypted_credentials(sealed).await?;
    } else {
        let mut set = state.credential_plaintext.unwrap_or_default();
        mutate(&mut set);
        store.save_plaintext_credentials(set).await?;
    }

    Ok(())
}
