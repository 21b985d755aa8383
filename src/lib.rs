// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod geo;
pub mod ingest;
pub mod metrics;
pub mod render;

pub use crate::api::router;

use tracing::info;

/// Build the full in-process app from configuration (env overrides + files).
///
/// Used by the Shuttle entrypoint and by tests that want the real wiring:
/// ```ignore
/// let router = open_data_dashboard::app().await?;
/// ```
pub async fn app() -> anyhow::Result<axum::Router> {
    let dashboard = config::DashboardConfig::load_default()?;
    let sources = config::SourceTable::load_default()?;
    info!(
        service = %dashboard.fetcher.service,
        sources = sources.sources.len(),
        data_dir = %sources.data_dir.display(),
        "dashboard config loaded"
    );
    let state = api::state_from_config(&dashboard, sources)?;
    Ok(router(state))
}
