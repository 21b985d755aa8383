// src/geo/source.rs
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Marker color + glyph, in Leaflet.awesome-markers terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub color: String,
    pub icon: String,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            color: "gray".to_string(),
            icon: "info-sign".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// CSV / TSV text.
    Delimited,
    /// xlsx / xls / ods workbook.
    Spreadsheet,
}

impl SourceKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Some(Self::Delimited),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Spreadsheet),
            _ => None,
        }
    }
}

/// One tabular origin: where its coordinates live and how its markers look.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceDefinition {
    /// File name, extension included. Also the key in error reports.
    pub name: String,
    pub lat_column: String,
    pub lon_column: String,
    pub style: MarkerStyle,
    pub kind: SourceKind,
    /// Text encoding label for delimited files (`euc-kr`, `utf-8`, ...).
    pub encoding: Option<String>,
    pub delimiter: Option<u8>,
    /// Worksheet for spreadsheets; first sheet when unset.
    pub sheet: Option<String>,
}

impl SourceDefinition {
    /// Minimal definition; kind from the extension, default style.
    pub fn new(name: &str, lat_column: &str, lon_column: &str) -> Self {
        Self {
            name: name.to_string(),
            lat_column: lat_column.to_string(),
            lon_column: lon_column.to_string(),
            style: MarkerStyle::default(),
            kind: SourceKind::from_name(name).unwrap_or(SourceKind::Delimited),
            encoding: None,
            delimiter: None,
            sheet: None,
        }
    }

    pub fn with_style(mut self, color: &str, icon: &str) -> Self {
        self.style = MarkerStyle {
            color: color.to_string(),
            icon: icon.to_string(),
        };
        self
    }

    /// Display label: the file name without its extension.
    pub fn label(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }
}
