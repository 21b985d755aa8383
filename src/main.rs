//! Open-data dashboard: binary entrypoint
//! Boots the Axum HTTP server with the record table and facility map views.
//!
//! See `README.md` for configuration.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing logs. `RUST_LOG` wins over the built-in filter.
/// A subscriber installed by the runtime is left in place.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("open_data_dashboard=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // This enables SEOUL_OPEN_API_KEY / DASHBOARD_CONFIG_PATH from .env.
    let _ = dotenvy::dotenv();

    init_tracing();

    let router = open_data_dashboard::app().await?;
    Ok(router.into())
}
