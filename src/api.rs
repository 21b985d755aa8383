use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::geo::{self, Aggregation, DirectionsLink, MapView, SourceDefinition, TableLoader};
use crate::ingest::{FetchError, FetchOutcome, FetchWindow, RecordSource};
use crate::render::{self, RecordsView};

pub const DEFAULT_START: u32 = 1;
/// Rows per page when the request names no end, capped by the window limit.
pub const DEFAULT_ROWS: u32 = 20;

/// First page as linked from the index.
pub fn default_window(max_window: u32) -> FetchWindow {
    FetchWindow::leading(DEFAULT_ROWS.min(max_window))
}

/// Shared, read-only state. Every request runs a fresh pipeline pass.
#[derive(Clone)]
pub struct AppState {
    pub records: Arc<dyn RecordSource>,
    pub fields: Arc<[String]>,
    pub max_window: u32,
    pub sources: Arc<[SourceDefinition]>,
    pub loader: Arc<dyn TableLoader>,
    pub links: DirectionsLink,
    pub view: MapView,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/", get(index))
        .route("/records", get(records_page))
        .route("/api/records", get(records_json))
        .route("/map", get(map_page))
        .route("/api/markers", get(markers_json))
        .merge(crate::metrics::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, serde::Deserialize)]
pub struct WindowQuery {
    #[serde(default)]
    start: Option<u32>,
    #[serde(default)]
    end: Option<u32>,
}

impl WindowQuery {
    fn window(&self, max_window: u32) -> Result<FetchWindow, FetchError> {
        let rows = DEFAULT_ROWS.min(max_window).max(1);
        let start = self.start.unwrap_or(DEFAULT_START);
        let end = self.end.unwrap_or_else(|| start.saturating_add(rows - 1));
        FetchWindow::new(start, end, max_window)
    }
}

fn error_status(e: &FetchError) -> StatusCode {
    match e {
        FetchError::InvalidWindow { .. } => StatusCode::BAD_REQUEST,
        FetchError::Transport(err) if err.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    }
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render::render_index_page(default_window(state.max_window)))
}

type Fetched = Result<(FetchWindow, FetchOutcome), (Option<FetchWindow>, FetchError)>;

async fn fetch(state: &AppState, q: &WindowQuery) -> Fetched {
    let window = q.window(state.max_window).map_err(|e| (None, e))?;
    match state.records.fetch_window(window).await {
        Ok(outcome) => Ok((window, outcome)),
        Err(e) => Err((Some(window), e)),
    }
}

async fn records_page(State(state): State<AppState>, Query(q): Query<WindowQuery>) -> Response {
    match fetch(&state, &q).await {
        Ok((window, outcome)) => Html(render::render_records_page(&RecordsView::Fetched {
            window,
            fields: &state.fields,
            outcome: &outcome,
        }))
        .into_response(),
        Err((window, error)) => {
            let page = render::render_records_page(&RecordsView::Failed {
                window,
                error: &error,
            });
            (error_status(&error), Html(page)).into_response()
        }
    }
}

async fn records_json(State(state): State<AppState>, Query(q): Query<WindowQuery>) -> Response {
    match fetch(&state, &q).await {
        Ok((window, FetchOutcome::Records(set))) => Json(json!({
            "status": "ok",
            "window": window,
            "total_count": set.total_count,
            "fetched_at": set.fetched_at,
            "records": set.records,
        }))
        .into_response(),
        Ok((window, FetchOutcome::NoData)) => {
            Json(json!({ "status": "no_data", "window": window })).into_response()
        }
        Err((_, error)) => (
            error_status(&error),
            Json(json!({
                "status": "error",
                "error": error.to_string(),
                "http_status": error.status(),
            })),
        )
            .into_response(),
    }
}

/// Aggregation reads files, so it runs on the blocking pool.
async fn run_aggregation(state: &AppState) -> Result<Aggregation, StatusCode> {
    let sources = state.sources.clone();
    let loader = state.loader.clone();
    let links = state.links.clone();
    tokio::task::spawn_blocking(move || geo::aggregate(&sources, loader.as_ref(), &links))
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "aggregation task failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

async fn map_page(State(state): State<AppState>) -> Response {
    match run_aggregation(&state).await {
        Ok(agg) => Html(render::render_map_page(&state.view, &agg)).into_response(),
        Err(status) => status.into_response(),
    }
}

async fn markers_json(State(state): State<AppState>) -> Response {
    match run_aggregation(&state).await {
        Ok(agg) => Json(json!({
            "markers": agg.markers().collect::<Vec<_>>(),
            "errors": agg.failures(),
            "skipped_rows": agg.skipped_rows(),
        }))
        .into_response(),
        Err(status) => status.into_response(),
    }
}

/// State wired from configuration files and the real Open API / file loaders.
pub fn state_from_config(
    dashboard: &crate::config::DashboardConfig,
    sources: crate::config::SourceTable,
) -> anyhow::Result<AppState> {
    let fetcher = crate::ingest::RecordFetcher::from_config(&dashboard.fetcher)?;
    Ok(AppState {
        fields: dashboard.fetcher.fields.clone().into(),
        max_window: dashboard.fetcher.max_window,
        records: Arc::new(fetcher),
        sources: sources.sources.into(),
        loader: Arc::new(geo::FileTableLoader::new(sources.data_dir)),
        links: dashboard.map.directions(),
        view: dashboard.map.view(),
    })
}
