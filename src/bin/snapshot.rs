//! Writes one records page and one map page to disk for offline viewing.
//!
//! Usage: `snapshot [start] [end] [out_dir]`
//! (defaults: the first page the server links to, ./snapshot)

use std::path::PathBuf;

use anyhow::{Context, Result};
use open_data_dashboard::{
    api::default_window,
    config::{DashboardConfig, SourceTable},
    geo::{self, FileTableLoader},
    ingest::{FetchWindow, RecordFetcher, RecordSource},
    render::{self, RecordsView},
};

fn arg_u32(args: &[String], idx: usize, default: u32) -> Result<u32> {
    match args.get(idx) {
        Some(s) => s
            .parse()
            .with_context(|| format!("argument {idx} ('{s}') is not a row number")),
        None => Ok(default),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let dashboard = DashboardConfig::load_default()?;
    let sources = SourceTable::load_default()?;

    let first = default_window(dashboard.fetcher.max_window);
    let args: Vec<String> = std::env::args().collect();
    let start = arg_u32(&args, 1, first.start())?;
    let end = arg_u32(&args, 2, start.saturating_add(first.row_count() - 1))?;
    let out_dir = args
        .get(3)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("snapshot"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let fetcher = RecordFetcher::from_config(&dashboard.fetcher)?;
    let records_html = match FetchWindow::new(start, end, dashboard.fetcher.max_window) {
        Ok(window) => match fetcher.fetch_window(window).await {
            Ok(outcome) => render::render_records_page(&RecordsView::Fetched {
                window,
                fields: &dashboard.fetcher.fields,
                outcome: &outcome,
            }),
            Err(error) => render::render_records_page(&RecordsView::Failed {
                window: Some(window),
                error: &error,
            }),
        },
        Err(error) => render::render_records_page(&RecordsView::Failed {
            window: None,
            error: &error,
        }),
    };
    let records_path = out_dir.join("records.html");
    std::fs::write(&records_path, records_html)
        .with_context(|| format!("writing {}", records_path.display()))?;

    let loader = FileTableLoader::new(sources.data_dir.clone());
    let agg = geo::aggregate(&sources.sources, &loader, &dashboard.map.directions());
    let map_path = out_dir.join("map.html");
    std::fs::write(&map_path, render::render_map_page(&dashboard.map.view(), &agg))
        .with_context(|| format!("writing {}", map_path.display()))?;

    println!(
        "snapshot written to {} ({} markers, {} failed sources)",
        out_dir.display(),
        agg.markers().count(),
        agg.failures().len()
    );
    Ok(())
}
