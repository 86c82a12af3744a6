//! The `refresh` command: one fetch-aggregate-persist cycle.

use crate::cli::args::OutputFormat;
use crate::error::Result;
use crate::render;

/// Execute the refresh command.
pub async fn execute(format: OutputFormat, pretty: bool, no_color: bool) -> Result<()> {
    let store = crate::cli::open_store();
    let engine = crate::cli::build_engine(store)?;

    let snapshot = engine.refresh().await?;
    println!("{}", render::render_snapshot(&snapshot, format, pretty, no_color)?);
    Ok(())
}
