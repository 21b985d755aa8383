// src/geo/marker.rs
use serde::Serialize;
use url::form_urlencoded::byte_serialize;

use crate::geo::source::{MarkerStyle, SourceDefinition};
use crate::geo::SourceError;

/// One map point derived from a row with both coordinates present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    /// Coordinates exactly as they appeared in the source row.
    pub raw_lat: String,
    pub raw_lon: String,
    pub label: String,
    /// HTML anchor pointing at the directions service.
    pub popup: String,
    pub style: MarkerStyle,
}

/// Builds "get directions" links for marker popups.
#[derive(Debug, Clone)]
pub struct DirectionsLink {
    base: String,
    text: String,
}

impl DirectionsLink {
    pub fn new(base: &str, text: &str) -> Self {
        Self {
            base: base.to_string(),
            text: text.to_string(),
        }
    }

    /// `{base}?api=1&destination={lat},{lon}`. Each coordinate is encoded on
    /// its own so the comma separator stays readable.
    pub fn url(&self, raw_lat: &str, raw_lon: &str) -> String {
        let lat: String = byte_serialize(raw_lat.as_bytes()).collect();
        let lon: String = byte_serialize(raw_lon.as_bytes()).collect();
        let sep = if self.base.contains('?') { '&' } else { '?' };
        format!("{}{sep}api=1&destination={lat},{lon}", self.base)
    }

    pub fn anchor(&self, raw_lat: &str, raw_lon: &str) -> String {
        let href = self.url(raw_lat, raw_lon);
        format!(
            r#"<a href="{}" target="_blank" rel="noopener">{}</a>"#,
            html_escape::encode_double_quoted_attribute(&href),
            html_escape::encode_text(&self.text)
        )
    }
}

impl Default for DirectionsLink {
    fn default() -> Self {
        Self::new("https://www.google.com/maps/dir/", "길찾기")
    }
}

/// pandas-style null: blank, or one of the usual NA spellings.
pub fn is_null_cell(cell: Option<&str>) -> bool {
    match cell.map(str::trim) {
        None => true,
        Some(c) => {
            c.is_empty()
                || ["nan", "-nan", "null", "none", "na", "n/a", "#n/a"]
                    .iter()
                    .any(|t| c.eq_ignore_ascii_case(t))
        }
    }
}

impl Marker {
    /// Build a marker from raw cells of data row `row` (1-based, header excluded).
    /// Callers filter null cells first; anything left must parse as a number.
    pub fn from_raw(
        source: &SourceDefinition,
        row: usize,
        raw_lat: &str,
        raw_lon: &str,
        links: &DirectionsLink,
    ) -> Result<Self, SourceError> {
        let raw_lat = raw_lat.trim();
        let raw_lon = raw_lon.trim();
        let lat = parse_coord(raw_lat)
            .ok_or_else(|| SourceError::malformed(row, &source.lat_column, raw_lat))?;
        let lon = parse_coord(raw_lon)
            .ok_or_else(|| SourceError::malformed(row, &source.lon_column, raw_lon))?;
        Ok(Self {
            lat,
            lon,
            raw_lat: raw_lat.to_string(),
            raw_lon: raw_lon.to_string(),
            label: source.label().to_string(),
            popup: links.anchor(raw_lat, raw_lon),
            style: source.style.clone(),
        })
    }
}

fn parse_coord(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}
