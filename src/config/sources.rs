// src/config/sources.rs
//! Source definitions: one table holding coordinate columns, style and loader
//! hints per file, so a style can never drift away from its column mapping.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::{env, fs, path::Path, path::PathBuf};

use crate::geo::{MarkerStyle, SourceDefinition, SourceKind};

pub const DEFAULT_SOURCES_PATH: &str = "config/sources.toml";
pub const ENV_SOURCES_PATH: &str = "DASHBOARD_SOURCES_PATH";
pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Deserialize)]
struct SourcesFile {
    #[serde(default)]
    data_dir: Option<PathBuf>,
    #[serde(default)]
    default_style: Option<StyleEntry>,
    #[serde(default, rename = "source")]
    sources: Vec<SourceEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct StyleEntry {
    color: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SourceEntry {
    name: String,
    lat_column: String,
    lon_column: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    kind: Option<SourceKind>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    delimiter: Option<char>,
    #[serde(default)]
    sheet: Option<String>,
}

/// All configured sources plus the directory their files live in.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub data_dir: PathBuf,
    pub sources: Vec<SourceDefinition>,
}

impl SourceTable {
    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading sources from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let file: SourcesFile = if ext == "json" {
            serde_json::from_str(&content).context("parsing sources json")?
        } else {
            toml::from_str(&content).context("parsing sources toml")?
        };
        Self::build(file)
    }

    /// Load using env var + fallbacks:
    /// 1) $DASHBOARD_SOURCES_PATH
    /// 2) config/sources.toml
    /// 3) config/sources.json
    /// 4) built-in seed
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_SOURCES_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            } else {
                return Err(anyhow!("{ENV_SOURCES_PATH} points to non-existent path"));
            }
        }
        let toml_p = PathBuf::from(DEFAULT_SOURCES_PATH);
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        let json_p = PathBuf::from("config/sources.json");
        if json_p.exists() {
            return Self::load_from(&json_p);
        }
        Ok(Self::default_seed())
    }

    fn build(file: SourcesFile) -> Result<Self> {
        let base = MarkerStyle::default();
        let fallback = file.default_style.unwrap_or_default();
        let default_style = MarkerStyle {
            color: fallback.color.unwrap_or(base.color),
            icon: fallback.icon.unwrap_or(base.icon),
        };

        let mut seen = HashSet::new();
        let mut sources = Vec::with_capacity(file.sources.len());
        for e in file.sources {
            let name = e.name.trim().to_string();
            if name.is_empty() {
                bail!("source with empty name");
            }
            if !seen.insert(name.clone()) {
                bail!("source '{name}' is defined more than once");
            }
            let lat_column = e.lat_column.trim().to_string();
            let lon_column = e.lon_column.trim().to_string();
            if lat_column.is_empty() || lon_column.is_empty() {
                bail!("source '{name}' needs both lat_column and lon_column");
            }
            let kind = match e.kind.or_else(|| SourceKind::from_name(&name)) {
                Some(k) => k,
                None => bail!("source '{name}': cannot tell file kind, set kind = \"delimited\" or \"spreadsheet\""),
            };
            let delimiter = match e.delimiter {
                Some(c) if c.is_ascii() => Some(c as u8),
                Some(c) => bail!("source '{name}': delimiter {c:?} is not a single-byte character"),
                None => None,
            };
            sources.push(SourceDefinition {
                name,
                lat_column,
                lon_column,
                style: MarkerStyle {
                    color: e.color.unwrap_or_else(|| default_style.color.clone()),
                    icon: e.icon.unwrap_or_else(|| default_style.icon.clone()),
                },
                kind,
                encoding: e.encoding,
                delimiter,
                sheet: e.sheet,
            });
        }

        Ok(Self {
            data_dir: file
                .data_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            sources,
        })
    }

    /// Built-in Seoul sources, used when no sources file is present.
    pub fn default_seed() -> Self {
        let sources = vec![
            SourceDefinition::new("서울시 무더위쉼터.csv", "위도", "경도").with_style("red", "fire"),
            SourceDefinition::new("서울시 공중화장실 위치정보.csv", "y좌표", "x좌표")
                .with_style("blue", "tint"),
            SourceDefinition::new("서울시 공공와이파이 서비스 위치 정보.csv", "LAT", "LNT")
                .with_style("green", "signal"),
            SourceDefinition::new("서울시 전기차 충전소 현황.xlsx", "위도", "경도")
                .with_style("orange", "flash"),
        ];
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            sources,
        }
    }
}
