// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot, with a stub
// record source and an in-memory table loader.
//
// Covered:
// - GET /health
// - GET /records, /api/records (records, no data, upstream failure, bad window)
// - GET /map, /api/markers (per-source failure isolation)
// - GET /metrics after a map request
// - default window and index link under a small window limit
// - upstream timeout through the real fetcher (504, key not echoed)

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use open_data_dashboard::api::{self, AppState};
use open_data_dashboard::config::FetcherConfig;
use open_data_dashboard::geo::{DirectionsLink, MapView, SourceDefinition, Table, TableLoader};
use open_data_dashboard::ingest::{
    FetchError, FetchOutcome, FetchWindow, Record, RecordFetcher, RecordSet, RecordSource,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BODY_LIMIT: usize = 1024 * 1024;

/// Answers by window start: 1 → two records, 900 → no data, 500 → HTTP 500.
struct StubSource;

#[async_trait]
impl RecordSource for StubSource {
    async fn fetch_window(&self, window: FetchWindow) -> Result<FetchOutcome, FetchError> {
        match window.start() {
            1 => {
                let records = (1..=2)
                    .map(|n| {
                        let mut raw = HashMap::new();
                        raw.insert("NUM".to_string(), n.to_string());
                        raw.insert("FAC_NAME".to_string(), format!("<b>Hall</b> {n}"));
                        Record::from_fields(&["NUM", "FAC_NAME", "ADDR"], raw)
                    })
                    .collect();
                Ok(FetchOutcome::Records(RecordSet {
                    total_count: Some(2),
                    fetched_at: Utc::now(),
                    records,
                }))
            }
            900 => Ok(FetchOutcome::NoData),
            _ => Err(FetchError::Status { status: 500 }),
        }
    }
}

/// Only "ok.csv" exists.
struct StubLoader;

impl TableLoader for StubLoader {
    fn load(&self, source: &SourceDefinition) -> anyhow::Result<Table> {
        if source.name != "ok.csv" {
            return Err(anyhow!("reading data/{}: No such file or directory", source.name));
        }
        Ok(Table {
            headers: vec!["name".into(), "lat".into(), "lon".into()],
            rows: vec![
                vec![Some("a".into()), Some("37.5".into()), Some("127.0".into())],
                vec![Some("b".into()), None, None],
            ],
        })
    }
}

fn test_router() -> Router {
    router_with(Arc::new(StubSource), 1000)
}

fn router_with(records: Arc<dyn RecordSource>, max_window: u32) -> Router {
    let state = AppState {
        records,
        fields: vec!["NUM".to_string(), "FAC_NAME".to_string(), "ADDR".to_string()].into(),
        max_window,
        sources: vec![
            SourceDefinition::new("missing.csv", "lat", "lon"),
            SourceDefinition::new("ok.csv", "lat", "lon").with_style("red", "home"),
        ]
        .into(),
        loader: Arc::new(StubLoader),
        links: DirectionsLink::default(),
        view: MapView::default(),
    };
    api::router(state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, String::from_utf8(bytes).expect("utf8"))
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let (status, body) = get(test_router(), "/health").await;
    assert_eq!(status, StatusCode::OK, "health should be 200");
    assert_eq!(body.trim(), "OK", "health body should be 'OK'");
}

#[tokio::test]
async fn records_json_keeps_every_key() {
    let (status, body) = get(test_router(), "/api/records?start=1&end=2").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_str(&body).expect("json");
    assert_eq!(v["status"], "ok");
    assert_eq!(v["window"]["start"], 1);
    let records = v["records"].as_array().expect("records array");
    assert_eq!(records.len(), 2);
    for r in records {
        assert_eq!(r.as_object().expect("object").len(), 3);
        assert!(r["ADDR"].is_null());
    }
    assert_eq!(records[1]["FAC_NAME"], "Hall 2");

    // Value sorts keys, so check field order on the raw body
    let num = body.find("\"NUM\"").expect("NUM");
    let name = body.find("\"FAC_NAME\"").expect("FAC_NAME");
    let addr = body.find("\"ADDR\"").expect("ADDR");
    assert!(num < name && name < addr);
}

#[tokio::test]
async fn records_page_renders_table_or_no_data() {
    let (status, body) = get(test_router(), "/records").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<th>FAC_NAME</th>"));
    assert!(body.contains("<td>Hall 1</td>"));

    let (status, body) = get(test_router(), "/records?start=900&end=910").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No data for rows 900–910"));
    assert!(!body.contains("<table>"));

    let (_, v) = get(test_router(), "/api/records?start=900&end=910").await;
    let v: Json = serde_json::from_str(&v).expect("json");
    assert_eq!(v["status"], "no_data");
}

#[tokio::test]
async fn upstream_failure_surfaces_status_code() {
    let (status, body) = get(test_router(), "/records?start=500&end=510").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("HTTP 500"));
    assert!(!body.contains("No data"));

    let (status, body) = get(test_router(), "/api/records?start=500&end=510").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let v: Json = serde_json::from_str(&body).expect("json");
    assert_eq!(v["status"], "error");
    assert_eq!(v["http_status"], 500);
}

#[tokio::test]
async fn invalid_window_is_a_client_error() {
    let (status, body) = get(test_router(), "/api/records?start=0&end=5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let v: Json = serde_json::from_str(&body).expect("json");
    assert!(v["http_status"].is_null());

    let (status, _) = get(test_router(), "/records?start=10&end=2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn markers_json_isolates_failed_sources() {
    let (status, body) = get(test_router(), "/api/markers").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_str(&body).expect("json");

    let markers = v["markers"].as_array().expect("markers");
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0]["style"]["color"], "red");
    assert_eq!(markers[0]["label"], "ok");

    let errors = v["errors"].as_array().expect("errors");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["source"], "missing.csv");
    assert_eq!(v["skipped_rows"], 1);
}

#[tokio::test]
async fn map_page_and_metrics() {
    let (status, body) = get(test_router(), "/map").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"<div id="map""#));
    assert!(body.contains("markerClusterGroup"));
    assert!(body.contains("missing.csv"));

    let (status, text) = get(test_router(), "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    for needle in [
        "dashboard_sources_loaded_total",
        "dashboard_source_errors_total",
        "dashboard_markers_total",
    ] {
        assert!(text.contains(needle), "missing {needle} in /metrics:\n{text}");
    }
}

#[tokio::test]
async fn default_window_fits_a_small_row_limit() {
    let app = router_with(Arc::new(StubSource), 5);

    let (status, body) = get(app.clone(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("/records?start=1&amp;end=5"));

    let (status, body) = get(app.clone(), "/api/records").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_str(&body).expect("json");
    assert_eq!(v["window"]["start"], 1);
    assert_eq!(v["window"]["end"], 5);

    // the next page keeps the same size
    let (status, body) = get(app, "/api/records?start=6").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("\"status\":\"error\""));

    let (_, index) = get(test_router(), "/").await;
    assert!(index.contains("/records?start=1&amp;end=20"));
}

#[tokio::test]
async fn upstream_timeout_is_504_and_never_echoes_the_key() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let cfg = FetcherConfig {
        base_url: server.uri(),
        api_key: "SECRETKEY123".into(),
        timeout_secs: 1,
        ..FetcherConfig::default()
    };
    let fetcher = RecordFetcher::from_config(&cfg).expect("fetcher");
    let app = router_with(Arc::new(fetcher), 1000);

    let (status, body) = get(app.clone(), "/api/records?start=1&end=5").await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    let v: Json = serde_json::from_str(&body).expect("json");
    assert_eq!(v["status"], "error");
    assert!(!body.contains("SECRETKEY123"), "key leaked: {body}");

    let (status, page) = get(app, "/records?start=1&end=5").await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(!page.contains("SECRETKEY123"));
}
