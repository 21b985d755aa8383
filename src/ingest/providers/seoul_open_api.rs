// src/ingest/providers/seoul_open_api.rs
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use metrics::{counter, histogram};
use reqwest::StatusCode;
use url::Url;

use crate::config::FetcherConfig;
use crate::ingest::types::{FetchError, FetchOutcome, FetchWindow, RecordSet, RecordSource};
use crate::ingest::xml::{parse_document, ParsedDocument};

/// `BASE/{key}/{format}/{service}/{start}/{end}/`
#[derive(Debug, Clone)]
pub struct Endpoint {
    base: Url,
    api_key: String,
    format: String,
    service: String,
}

impl Endpoint {
    pub fn new(base_url: &str, api_key: &str, format: &str, service: &str) -> Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("parsing base URL {base_url}"))?;
        if base.cannot_be_a_base() {
            bail!("base URL {base_url} cannot carry path segments");
        }
        Ok(Self {
            base,
            api_key: api_key.to_string(),
            format: format.to_string(),
            service: service.to_string(),
        })
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Request URL for one window. Segments are percent-encoded.
    pub fn url_for(&self, window: FetchWindow) -> Url {
        let start = window.start().to_string();
        let end = window.end().to_string();
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                self.api_key.as_str(),
                self.format.as_str(),
                self.service.as_str(),
                start.as_str(),
                end.as_str(),
                "",
            ]);
        }
        url
    }
}

/// Seoul Open API record fetcher.
///
/// One GET per call, bounded by the configured timeout. No retries: a failed
/// window is reported to the caller as-is.
pub struct RecordFetcher {
    endpoint: Endpoint,
    client: reqwest::Client,
    row_tag: String,
    fields: Vec<String>,
}

impl RecordFetcher {
    pub fn from_config(cfg: &FetcherConfig) -> Result<Self> {
        let endpoint = Endpoint::new(&cfg.base_url, &cfg.api_key, &cfg.format, &cfg.service)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building Open API http client")?;
        Ok(Self {
            endpoint,
            client,
            row_tag: cfg.row_tag.clone(),
            fields: cfg.fields.clone(),
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    async fn fetch_inner(&self, window: FetchWindow) -> Result<FetchOutcome, FetchError> {
        let resp = self.client.get(self.endpoint.url_for(window)).send().await?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        let body = resp.text().await?;
        classify(parse_document(&body, &self.row_tag, &self.fields)?)
    }
}

/// Turn a parsed 200 response into records, "no data", or a service error.
pub fn classify(doc: ParsedDocument) -> Result<FetchOutcome, FetchError> {
    if !doc.records.is_empty() {
        return Ok(FetchOutcome::Records(RecordSet {
            total_count: doc.total_count,
            fetched_at: Utc::now(),
            records: doc.records,
        }));
    }
    match doc.result {
        Some(r) if !r.is_ok() => Err(FetchError::Service {
            code: r.code,
            message: r.message,
        }),
        _ => Ok(FetchOutcome::NoData),
    }
}

#[async_trait]
impl RecordSource for RecordFetcher {
    async fn fetch_window(&self, window: FetchWindow) -> Result<FetchOutcome, FetchError> {
        crate::ingest::ensure_metrics_described();
        counter!("dashboard_fetch_requests_total").increment(1);

        let t0 = Instant::now();
        let res = self.fetch_inner(window).await;
        histogram!("dashboard_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        // The key lives in the URL path, so only the window is logged.
        match &res {
            Ok(FetchOutcome::Records(set)) => {
                counter!("dashboard_fetch_records_total").increment(set.records.len() as u64);
                tracing::info!(
                    service = self.endpoint.service(),
                    start = window.start(),
                    end = window.end(),
                    rows = set.records.len(),
                    total = ?set.total_count,
                    "open api window fetched"
                );
            }
            Ok(FetchOutcome::NoData) => {
                tracing::info!(
                    service = self.endpoint.service(),
                    start = window.start(),
                    end = window.end(),
                    "open api window empty"
                );
            }
            Err(e) => {
                counter!("dashboard_fetch_errors_total").increment(1);
                tracing::warn!(
                    service = self.endpoint.service(),
                    start = window.start(),
                    end = window.end(),
                    error = %e,
                    "open api fetch failed"
                );
            }
        }
        res
    }
}
