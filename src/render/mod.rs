// src/render/mod.rs
//! HTML views for the dashboard: record table, marker map, index.

pub mod map;
pub mod table;

pub use map::render_map_page;
pub use table::{render_records_page, RecordsView};

use html_escape::encode_text;

use crate::ingest::FetchWindow;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 1.5rem; color: #222; }
nav a { margin-right: 1rem; }
table { border-collapse: collapse; font-size: 0.85rem; }
th, td { border: 1px solid #ccc; padding: 0.25rem 0.5rem; vertical-align: top; }
th { background: #f3f3f3; position: sticky; top: 0; }
.notice { padding: 0.5rem 0.75rem; border-radius: 4px; margin: 0.75rem 0; }
.info { background: #eef5ff; }
.error { background: #fdecea; color: #8a1c12; }
"#;

/// Shared page chrome. `body` is inserted as-is; `head_extra` goes into `<head>`.
pub(crate) fn page(title: &str, head_extra: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ko">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{STYLE}</style>
{head_extra}
</head>
<body>
<nav><a href="/">Home</a><a href="/records">Records</a><a href="/map">Map</a></nav>
<h1>{title}</h1>
{body}
</body>
</html>
"#,
        title = encode_text(title),
    )
}

pub(crate) fn notice(class: &str, message: &str) -> String {
    format!(r#"<p class="notice {class}">{}</p>"#, encode_text(message))
}

pub fn render_index_page(first: FetchWindow) -> String {
    page(
        "Seoul open data dashboard",
        "",
        &format!(
            r#"<ul>
<li><a href="/records?start={}&amp;end={}">Cultural spaces (Open API)</a></li>
<li><a href="/map">Facility map (local sources)</a></li>
</ul>"#,
            first.start(),
            first.end()
        ),
    )
}
