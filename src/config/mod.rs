// src/config/mod.rs
pub mod dashboard;
pub mod sources;

pub use dashboard::{DashboardConfig, FetcherConfig, MapConfig};
pub use sources::SourceTable;
