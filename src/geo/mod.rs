// src/geo/mod.rs
//! Geospatial aggregation: tabular sources → styled map markers.
//!
//! Each source is processed on its own. A source that fails to load or parse
//! becomes a [`SourceOutcome::Failed`] and the loop moves on, so one broken
//! file never hides the markers of the others.

pub mod loader;
pub mod marker;
pub mod source;

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::Serialize;

pub use crate::geo::loader::{FileTableLoader, Table, TableLoader};
pub use crate::geo::marker::{is_null_cell, DirectionsLink, Marker};
pub use crate::geo::source::{MarkerStyle, SourceDefinition, SourceKind};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("dashboard_sources_loaded_total", "Sources turned into markers.");
        describe_counter!(
            "dashboard_source_errors_total",
            "Sources that failed to load or parse."
        );
        describe_counter!("dashboard_markers_total", "Markers produced.");
        describe_counter!(
            "dashboard_rows_skipped_total",
            "Rows skipped for missing coordinates."
        );
    });
}

/// Failures inside a loaded table.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("column '{column}' not found (have: {available})")]
    MissingColumn { column: String, available: String },
    #[error("row {row}: column '{column}' holds non-numeric coordinate '{value}'")]
    MalformedCoordinate {
        row: usize,
        column: String,
        value: String,
    },
}

impl SourceError {
    pub fn malformed(row: usize, column: &str, value: &str) -> Self {
        Self::MalformedCoordinate {
            row,
            column: column.to_string(),
            value: value.to_string(),
        }
    }
}

/// Per-source result of one aggregation pass.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Loaded {
        source: String,
        markers: Vec<Marker>,
        skipped_rows: usize,
    },
    Failed {
        source: String,
        reason: String,
    },
}

impl SourceOutcome {
    pub fn source(&self) -> &str {
        match self {
            SourceOutcome::Loaded { source, .. } | SourceOutcome::Failed { source, .. } => source,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Aggregation {
    pub outcomes: Vec<SourceOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure<'a> {
    pub source: &'a str,
    pub reason: &'a str,
}

impl Aggregation {
    /// All markers of all loaded sources, in source order: the cluster contents.
    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.outcomes.iter().flat_map(|o| match o {
            SourceOutcome::Loaded { markers, .. } => markers.as_slice(),
            SourceOutcome::Failed { .. } => &[],
        })
    }

    pub fn failures(&self) -> Vec<SourceFailure<'_>> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                SourceOutcome::Failed { source, reason } => Some(SourceFailure { source, reason }),
                SourceOutcome::Loaded { .. } => None,
            })
            .collect()
    }

    pub fn skipped_rows(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                SourceOutcome::Loaded { skipped_rows, .. } => *skipped_rows,
                SourceOutcome::Failed { .. } => 0,
            })
            .sum()
    }
}

/// Turn one loaded table into markers. Rows with a null coordinate are skipped.
pub fn markers_from_table(
    source: &SourceDefinition,
    table: &Table,
    links: &DirectionsLink,
) -> Result<(Vec<Marker>, usize), SourceError> {
    let missing = |column: &str| SourceError::MissingColumn {
        column: column.to_string(),
        available: table.headers.join(", "),
    };
    let lat_idx = table
        .column(&source.lat_column)
        .ok_or_else(|| missing(&source.lat_column))?;
    let lon_idx = table
        .column(&source.lon_column)
        .ok_or_else(|| missing(&source.lon_column))?;

    let mut markers = Vec::with_capacity(table.rows.len());
    let mut skipped = 0usize;
    for (i, row) in table.rows.iter().enumerate() {
        let lat = row.get(lat_idx).and_then(|c| c.as_deref());
        let lon = row.get(lon_idx).and_then(|c| c.as_deref());
        match (lat, lon) {
            (Some(lat), Some(lon)) if !is_null_cell(Some(lat)) && !is_null_cell(Some(lon)) => {
                markers.push(Marker::from_raw(source, i + 1, lat, lon, links)?);
            }
            _ => {
                tracing::debug!(source = %source.name, row = i + 1, "row without coordinates skipped");
                skipped += 1;
            }
        }
    }
    Ok((markers, skipped))
}

/// Run one aggregation pass over `sources`, isolating failures per source.
pub fn aggregate(
    sources: &[SourceDefinition],
    loader: &dyn TableLoader,
    links: &DirectionsLink,
) -> Aggregation {
    ensure_metrics_described();

    let mut outcomes = Vec::with_capacity(sources.len());
    for source in sources {
        let result = loader
            .load(source)
            .and_then(|table| Ok(markers_from_table(source, &table, links)?));
        let outcome = match result {
            Ok((markers, skipped_rows)) => {
                counter!("dashboard_sources_loaded_total").increment(1);
                counter!("dashboard_markers_total").increment(markers.len() as u64);
                counter!("dashboard_rows_skipped_total").increment(skipped_rows as u64);
                tracing::info!(
                    source = %source.name,
                    markers = markers.len(),
                    skipped = skipped_rows,
                    "source loaded"
                );
                SourceOutcome::Loaded {
                    source: source.name.clone(),
                    markers,
                    skipped_rows,
                }
            }
            Err(e) => {
                let reason = format!("{e:#}");
                counter!("dashboard_source_errors_total").increment(1);
                tracing::warn!(source = %source.name, error = %reason, "source failed");
                SourceOutcome::Failed {
                    source: source.name.clone(),
                    reason,
                }
            }
        };
        outcomes.push(outcome);
    }
    Aggregation { outcomes }
}

/// Fixed viewport handed to the map renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    pub center: (f64, f64),
    pub zoom: u8,
    pub width: u32,
    pub height: u32,
}

impl Default for MapView {
    fn default() -> Self {
        // Seoul City Hall
        Self {
            center: (37.5665, 126.9780),
            zoom: 11,
            width: 1200,
            height: 700,
        }
    }
}
