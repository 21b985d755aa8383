use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Process-wide Prometheus handle. The recorder is installed on first use;
/// if another recorder already owns the global slot we render an empty one.
pub fn handle() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(error = %e, "prometheus: global recorder already installed");
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}

/// Returns a router exposing `/metrics` with the Prometheus exposition format.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let handle = handle();
    Router::new().route(
        "/metrics",
        get(move || {
            let h = handle.clone();
            async move { h.render() }
        }),
    )
}
