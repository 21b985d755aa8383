// src/render/table.rs
use html_escape::encode_text;

use crate::ingest::{FetchError, FetchOutcome, FetchWindow};
use crate::render::{notice, page};

/// What the records page shows for one request.
pub enum RecordsView<'a> {
    Fetched {
        window: FetchWindow,
        fields: &'a [String],
        outcome: &'a FetchOutcome,
    },
    Failed {
        window: Option<FetchWindow>,
        error: &'a FetchError,
    },
}

pub fn render_records_page(view: &RecordsView<'_>) -> String {
    let body = match view {
        RecordsView::Fetched {
            window,
            fields,
            outcome: FetchOutcome::Records(set),
        } => {
            let mut s = String::new();
            let total = set
                .total_count
                .map(|t| format!(" of {t}"))
                .unwrap_or_default();
            s.push_str(&notice(
                "info",
                &format!(
                    "Rows {}–{}{total}, fetched {}",
                    window.start(),
                    window.end(),
                    set.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
                ),
            ));
            s.push_str(&window_nav(*window));
            s.push_str("<table>\n<thead><tr>");
            for f in fields.iter() {
                s.push_str(&format!("<th>{}</th>", encode_text(f)));
            }
            s.push_str("</tr></thead>\n<tbody>\n");
            for r in &set.records {
                s.push_str("<tr>");
                for v in r.values() {
                    s.push_str(&format!("<td>{}</td>", encode_text(v.unwrap_or_default())));
                }
                s.push_str("</tr>\n");
            }
            s.push_str("</tbody>\n</table>");
            s
        }
        RecordsView::Fetched {
            window,
            outcome: FetchOutcome::NoData,
            ..
        } => format!(
            "{}{}",
            notice(
                "info",
                &format!("No data for rows {}–{}.", window.start(), window.end())
            ),
            window_nav(*window)
        ),
        RecordsView::Failed { window, error } => {
            let msg = match error.status() {
                Some(status) => format!("Fetch failed: the Open API answered HTTP {status}."),
                None => format!("Fetch failed: {error}"),
            };
            let retry = window
                .as_ref()
                .map(|w| {
                    format!(
                        r#"<p><a href="/records?start={}&amp;end={}">retry</a></p>"#,
                        w.start(),
                        w.end()
                    )
                })
                .unwrap_or_default();
            notice("error", &msg) + &retry
        }
    };
    page("Cultural spaces", "", &body)
}

fn window_nav(window: FetchWindow) -> String {
    let n = window.row_count();
    let mut links = Vec::new();
    if window.start() > 1 {
        let start = window.start().saturating_sub(n).max(1);
        links.push(format!(
            r#"<a href="/records?start={start}&amp;end={}">&larr; previous</a>"#,
            start + n - 1
        ));
    }
    links.push(format!(
        r#"<a href="/records?start={}&amp;end={}">next &rarr;</a>"#,
        window.end().saturating_add(1),
        window.end().saturating_add(n)
    ));
    format!("<p>{}</p>\n", links.join(" | "))
}
