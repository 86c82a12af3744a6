//! Storage for settings, credentials, and the latest snapshot.

pub mod paths;
pub mod store;

pub use paths::AppPaths;
pub use store::{DEFAULT_BUDGET_LIMIT, PersistedState, StateStore};
