//! CLI argument parsing and command dispatch.

pub mod args;
pub mod config;
pub mod creds;
pub mod refresh;
pub mod show;
pub mod test;
pub mod watch;

pub use args::{Cli, Commands, OutputFormat};

use std::sync::Arc;

use crate::core::engine::{Adapters, AggregationEngine};
use crate::core::http;
use crate::error::Result;
use crate::storage::{AppPaths, StateStore};

/// Open the state store at the platform data directory.
#[must_use]
pub fn open_store() -> Arc<StateStore> {
    Arc::new(StateStore::new(AppPaths::new().state_file()))
}

/// Build an engine over the default adapters and the given store.
pub fn build_engine(store: Arc<StateStore>) -> Result<AggregationEngine> {
    let client = http::default_client()?;
    Ok(AggregationEngine::new(store, Adapters::new(client)))
}
