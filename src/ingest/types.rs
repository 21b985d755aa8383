// src/ingest/types.rs
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

/// One flattened facility row from the Open API.
///
/// Every record carries every configured field key, in configured order.
/// Missing or blank values are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, Option<String>>,
}

impl Record {
    /// Project raw child values onto the fixed field list.
    /// A name listed twice keeps its first position and its value.
    pub fn from_fields<S: AsRef<str>>(
        fields: &[S],
        raw: std::collections::HashMap<String, String>,
    ) -> Self {
        let mut out = IndexMap::with_capacity(fields.len());
        for f in fields {
            let key = f.as_ref();
            if out.contains_key(key) {
                continue;
            }
            let value = raw
                .get(key)
                .map(|v| crate::ingest::clean_text(v))
                .filter(|v| !v.is_empty());
            out.insert(key.to_string(), value);
        }
        Self { fields: out }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|v| v.as_deref())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = Option<&str>> {
        self.fields.values().map(|v| v.as_deref())
    }

}

#[derive(Debug, Clone, Serialize)]
pub struct RecordSet {
    /// `list_total_count` as reported by the service, if present.
    pub total_count: Option<u64>,
    pub fetched_at: DateTime<Utc>,
    pub records: Vec<Record>,
}

/// Successful fetch result. An empty window is not an error.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Records(RecordSet),
    NoData,
}

/// Validated 1-based inclusive request window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchWindow {
    start: u32,
    end: u32,
}

impl FetchWindow {
    pub fn new(start: u32, end: u32, max_len: u32) -> Result<Self, FetchError> {
        let reason = if start == 0 {
            Some("start index is 1-based")
        } else if end < start {
            Some("end must not be before start")
        } else if end - start + 1 > max_len {
            Some("window exceeds the service row limit")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(FetchError::InvalidWindow { start, end, reason }),
            None => Ok(Self { start, end }),
        }
    }

    /// Rows `1..=rows`; at least one row.
    pub fn leading(rows: u32) -> Self {
        Self {
            start: 1,
            end: rows.max(1),
        }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn row_count(&self) -> u32 {
        self.end - self.start + 1
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid window {start}..={end}: {reason}")]
    InvalidWindow {
        start: u32,
        end: u32,
        reason: &'static str,
    },
    #[error("Open API responded with HTTP {status}")]
    Status { status: u16 },
    /// Carries no URL: the API key is a path segment.
    #[error("Open API request failed: {0}")]
    Transport(reqwest::Error),
    #[error("malformed Open API response: {0}")]
    Parse(String),
    #[error("Open API service error {code}: {message}")]
    Service { code: String, message: String },
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transport(e.without_url())
    }
}

impl FetchError {
    /// Observed HTTP status for non-200 responses.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status } => Some(*status),
            _ => None,
        }
    }
}

/// Anything that can serve a window of records.
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_window(&self, window: FetchWindow) -> Result<FetchOutcome, FetchError>;
}
