// src/ingest/mod.rs
pub mod providers;
pub mod types;
pub mod xml;

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

pub use crate::ingest::providers::seoul_open_api::{Endpoint, RecordFetcher};
pub use crate::ingest::types::{
    FetchError, FetchOutcome, FetchWindow, Record, RecordSet, RecordSource,
};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "dashboard_fetch_requests_total",
            "Open API requests issued."
        );
        describe_counter!(
            "dashboard_fetch_errors_total",
            "Open API requests that ended in a fetch error."
        );
        describe_counter!(
            "dashboard_fetch_records_total",
            "Records parsed from Open API responses."
        );
        describe_histogram!("dashboard_fetch_ms", "Open API round trip + parse in milliseconds.");
    });
}

/// Clean a record value: decode entities, strip markup, collapse whitespace.
///
/// Facility descriptions in the Open API carry editor HTML (`<p>`, `<br>`).
pub fn clean_text(s: &str) -> String {
    // 1) HTML entity decode
    let out = html_escape::decode_html_entities(s);

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[a-z!][^>]*>").unwrap());
    let out = re_tags.replace_all(&out, " ");

    // 3) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}
