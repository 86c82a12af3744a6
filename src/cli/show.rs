//! The `show` command: display the last persisted snapshot without fetching.

use crate::cli::args::OutputFormat;
use crate::error::{CloudSightError, Result};
use crate::render;

/// Execute the show command.
pub async fn execute(format: OutputFormat, pretty: bool, no_color: bool) -> Result<()> {
    let store = crate::cli::open_store();
    let state = store.load().await?;

    let Some(snapshot) = state.snapshot else {
        return Err(CloudSightError::Storage(
            "no snapshot yet; run `cloudsight refresh` first".to_string(),
        ));
    };

    println!("{}", render::render_snapshot(&snapshot, format, pretty, no_color)?);
    Ok(())
}
