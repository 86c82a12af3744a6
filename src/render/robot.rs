//! Machine-readable JSON output.

use serde::Serialize;

use crate::error::Result;

/// Serialize any payload as JSON, optionally pretty-printed.
pub fn render_json<T: Serialize + ?Sized>(payload: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(payload)?
    } else {
        serde_json::to_string(payload)?
    };
    Ok(json)
}
