//! Core domain logic: models, detection, aggregation, and shared plumbing.

pub mod alerts;
pub mod anomaly;
pub mod currency;
pub mod engine;
pub mod forecast;
pub mod http;
pub mod logging;
pub mod models;
