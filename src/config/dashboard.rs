// src/config/dashboard.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::{env, fs, path::Path, path::PathBuf};

use crate::geo::{DirectionsLink, MapView};

pub const DEFAULT_DASHBOARD_CONFIG_PATH: &str = "config/dashboard.toml";
pub const ENV_DASHBOARD_CONFIG_PATH: &str = "DASHBOARD_CONFIG_PATH";
pub const ENV_API_KEY: &str = "SEOUL_OPEN_API_KEY";

/// Public demo key of the Seoul Open API.
pub const SAMPLE_API_KEY: &str = "sample";
/// Rows the sample key answers per call.
pub const SAMPLE_MAX_WINDOW: u32 = 5;

pub const DEFAULT_FIELDS: [&str; 25] = [
    "NUM", "SUBJCODE", "FAC_NAME", "ADDR", "X_COORD", "Y_COORD", "PHNE", "FAX", "HOMEPAGE",
    "OPENHOUR", "ENTR_FEE", "CLOSEDAY", "OPEN_DAY", "SEAT_CNT", "MAIN_IMG", "ETC_DESC",
    "FAC_DESC", "ENTRFREE", "SUBWAY", "BUSSTOP", "YELLOW", "GREEN", "BLUE", "RED", "AIRPORT",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub fetcher: FetcherConfig,
    pub map: MapConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    pub base_url: String,
    /// "ENV" means: read from SEOUL_OPEN_API_KEY
    pub api_key: String,
    pub format: String,
    pub service: String,
    pub row_tag: String,
    pub fields: Vec<String>,
    pub timeout_secs: u64,
    /// Largest window one request may ask for.
    pub max_window: u32,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: "http://openapi.seoul.go.kr:8088".to_string(),
            api_key: "ENV".to_string(),
            format: "xml".to_string(),
            service: "culturalSpaceInfo".to_string(),
            row_tag: "row".to_string(),
            fields: DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
            timeout_secs: 10,
            max_window: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// [lat, lon]
    pub center: [f64; 2],
    pub zoom: u8,
    pub width: u32,
    pub height: u32,
    pub directions_url: String,
    pub link_text: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        let view = MapView::default();
        Self {
            center: [view.center.0, view.center.1],
            zoom: view.zoom,
            width: view.width,
            height: view.height,
            directions_url: "https://www.google.com/maps/dir/".to_string(),
            link_text: "길찾기".to_string(),
        }
    }
}

impl MapConfig {
    pub fn view(&self) -> MapView {
        MapView {
            center: (self.center[0], self.center[1]),
            zoom: self.zoom,
            width: self.width,
            height: self.height,
        }
    }

    pub fn directions(&self) -> DirectionsLink {
        DirectionsLink::new(&self.directions_url, &self.link_text)
    }
}

impl DashboardConfig {
    /// Load from an explicit path (TOML, or JSON by extension).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading dashboard config from {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let cfg: Self = if is_json {
            serde_json::from_str(&content).context("parsing dashboard config json")?
        } else {
            toml::from_str(&content).context("parsing dashboard config toml")?
        };
        cfg.resolve()
    }

    /// Load using env var + fallbacks:
    /// 1) $DASHBOARD_CONFIG_PATH
    /// 2) config/dashboard.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_DASHBOARD_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_DASHBOARD_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let p = PathBuf::from(DEFAULT_DASHBOARD_CONFIG_PATH);
        if p.exists() {
            return Self::load_from(&p);
        }
        Self::default().resolve()
    }

    /// Resolve the API key and sanitize limits.
    pub fn resolve(mut self) -> Result<Self> {
        let f = &mut self.fetcher;
        if f.api_key.trim().eq_ignore_ascii_case("env") {
            f.api_key = match env::var(ENV_API_KEY) {
                Ok(k) if !k.trim().is_empty() => k.trim().to_string(),
                _ => {
                    tracing::warn!(
                        "{ENV_API_KEY} not set; using the public sample key (5 rows per request)"
                    );
                    SAMPLE_API_KEY.to_string()
                }
            };
        }
        if f.fields.is_empty() {
            bail!("fetcher.fields must name at least one field");
        }
        let mut seen = HashSet::new();
        if let Some(dup) = f
            .fields
            .iter()
            .map(|name| name.trim())
            .find(|name| !seen.insert(*name))
        {
            bail!("fetcher.fields lists '{dup}' more than once");
        }
        if f.row_tag.trim().is_empty() {
            bail!("fetcher.row_tag must not be empty");
        }
        if f.timeout_secs == 0 {
            f.timeout_secs = FetcherConfig::default().timeout_secs;
        }
        if f.max_window == 0 {
            f.max_window = FetcherConfig::default().max_window;
        }
        if f.api_key == SAMPLE_API_KEY && f.max_window > SAMPLE_MAX_WINDOW {
            f.max_window = SAMPLE_MAX_WINDOW;
        }

        let m = &mut self.map;
        m.zoom = m.zoom.min(18);
        if !(-90.0..=90.0).contains(&m.center[0]) || !(-180.0..=180.0).contains(&m.center[1]) {
            bail!("map.center {:?} is not a valid [lat, lon]", m.center);
        }
        Ok(self)
    }
}
