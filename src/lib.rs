//! cloudsight - multi-cloud cost aggregation and alerting.
//!
//! Fetches billing data from AWS, Azure, and GCP, normalizes it into one
//! snapshot, evaluates budget/anomaly/forecast alerts, and keeps credentials
//! encrypted at rest.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod core;
pub mod error;
pub mod providers;
pub mod render;
pub mod storage;
pub mod vault;

pub use error::{CloudSightError, ExitCode, Result};
