//! Output rendering for human and robot modes.

pub mod human;
pub mod robot;

use crate::cli::args::OutputFormat;
use crate::core::engine::ConnectionTest;
use crate::core::models::AggregatedSnapshot;
use crate::error::Result;

/// Render a snapshot.
pub fn render_snapshot(
    snapshot: &AggregatedSnapshot,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_snapshot(snapshot, no_color)),
        OutputFormat::Json => robot::render_json(snapshot, pretty),
    }
}

/// Render connection test results.
pub fn render_tests(
    results: &[ConnectionTest],
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_tests(results, no_color)),
        OutputFormat::Json => robot::render_json(results, pretty),
    }
}
