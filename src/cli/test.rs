//! The `test` command: verify stored credentials against the live APIs.
//!
//! Runs the same per-provider fan-out as a refresh but persists nothing and
//! reports pass/fail per provider.

use crate::cli::args::OutputFormat;
use crate::error::{CloudSightError, Result};
use crate::render;
use crate::vault::CredentialVault;

/// Execute the test command.
pub async fn execute(format: OutputFormat, pretty: bool, no_color: bool) -> Result<()> {
    let store = crate::cli::open_store();
    let state = store.load().await?;

    let creds = if let Some(plain) = state.credential_plaintext {
        plain
    } else if let Some(blob) = &state.credential_encrypted {
        CredentialVault::new(store.clone()).decrypt(blob).await?
    } else {
        return Err(CloudSightError::NotConfigured);
    };

    let engine = crate::cli::build_engine(store)?;
    let results = engine.test_connection(&creds).await;
    println!("{}", render::render_tests(&results, format, pretty, no_color)?);
    Ok(())
}
