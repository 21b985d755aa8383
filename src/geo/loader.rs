// src/geo/loader.rs
//! Tabular source loading: CSV/TSV text and spreadsheet workbooks.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use encoding_rs::{Encoding, EUC_KR, UTF_8};

use crate::geo::source::{SourceDefinition, SourceKind};

/// A whole source read into memory. Cells are raw strings; `None` is an empty cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    /// Index of a header, ignoring surrounding whitespace.
    pub fn column(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers.iter().position(|h| h.trim() == name)
    }
}

/// Loads the table behind a source definition.
pub trait TableLoader: Send + Sync {
    fn load(&self, source: &SourceDefinition) -> Result<Table>;
}

/// Reads sources from files under `data_dir`, one file per source name.
#[derive(Debug, Clone)]
pub struct FileTableLoader {
    data_dir: PathBuf,
}

impl FileTableLoader {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn path_for(&self, source: &SourceDefinition) -> PathBuf {
        self.data_dir.join(&source.name)
    }
}

impl TableLoader for FileTableLoader {
    fn load(&self, source: &SourceDefinition) -> Result<Table> {
        let path = self.path_for(source);
        match source.kind {
            SourceKind::Delimited => {
                let bytes =
                    fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
                let text = decode_text(&bytes, source.encoding.as_deref())?;
                let delimiter = source.delimiter.unwrap_or_else(|| default_delimiter(&path));
                parse_delimited(&text, delimiter)
            }
            SourceKind::Spreadsheet => read_spreadsheet(&path, source.sheet.as_deref()),
        }
    }
}

fn default_delimiter(path: &Path) -> u8 {
    let is_tsv = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tsv"));
    if is_tsv {
        b'\t'
    } else {
        b','
    }
}

/// Decode file bytes. Without an explicit label: UTF-8 (BOM stripped), then EUC-KR.
pub fn decode_text<'a>(bytes: &'a [u8], label: Option<&str>) -> Result<Cow<'a, str>> {
    let encoding = match label {
        // cp949 is what most Korean tooling writes; WHATWG folds it into EUC-KR
        Some(l) => Encoding::for_label(l.trim().as_bytes())
            .or_else(|| l.trim().eq_ignore_ascii_case("cp949").then_some(EUC_KR))
            .ok_or_else(|| anyhow!("unknown text encoding '{l}'"))?,
        None => match UTF_8.decode_without_bom_handling_and_without_replacement(
            bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes),
        ) {
            Some(text) => return Ok(text),
            None => EUC_KR,
        },
    };
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(anyhow!("text is not valid {}", encoding.name()));
    }
    Ok(text)
}

/// Parse delimited text with the first record as header. Short rows are padded.
pub fn parse_delimited(text: &str, delimiter: u8) -> Result<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = rdr
        .headers()
        .context("reading header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for (i, rec) in rdr.records().enumerate() {
        // header is line 1
        let rec = rec.with_context(|| format!("reading row {}", i + 2))?;
        let mut row = rec
            .iter()
            .map(|c| Some(c.to_string()).filter(|c| !c.trim().is_empty()))
            .collect::<Vec<_>>();
        row.resize(headers.len().max(row.len()), None);
        rows.push(row);
    }
    Ok(Table { headers, rows })
}

fn read_spreadsheet(path: &Path, sheet: Option<&str>) -> Result<Table> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("opening {}", path.display()))?;
    let sheet = match sheet {
        Some(s) => s.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("{} has no worksheets", path.display()))?,
    };
    let range = workbook
        .worksheet_range(&sheet)
        .with_context(|| format!("reading sheet '{sheet}'"))?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|r| r.iter().map(|c| cell_text(c).unwrap_or_default()).collect())
        .unwrap_or_default();
    let rows = rows
        .map(|r| r.iter().map(cell_text).collect())
        .collect();
    Ok(Table { headers, rows })
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.trim().is_empty() => None,
        Data::String(s) => Some(s.trim().to_string()),
        Data::Float(f) => Some(format_float(*f)),
        Data::Int(i) => Some(i.to_string()),
        other => Some(other.to_string()),
    }
}

/// Integral floats keep one decimal (`127.0`) so links read like the sheet did.
pub fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}
