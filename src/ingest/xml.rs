// src/ingest/xml.rs
//! Streaming row extraction for Open API XML documents.
//!
//! The Seoul Open API answers with
//! `<Service><list_total_count/><RESULT><CODE/><MESSAGE/></RESULT><row>..</row>*</Service>`,
//! or with a bare `<RESULT>` document when the request itself is rejected.

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::ingest::types::{FetchError, Record};

pub const CODE_OK: &str = "INFO-000";
pub const CODE_NO_DATA: &str = "INFO-200";

/// `<RESULT>` block of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResult {
    pub code: String,
    pub message: String,
}

impl ServiceResult {
    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK || self.code == CODE_NO_DATA
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pub total_count: Option<u64>,
    pub result: Option<ServiceResult>,
    pub records: Vec<Record>,
}

/// A row element being filled. `depth` is its index in the element stack.
struct OpenRow {
    depth: usize,
    values: HashMap<String, String>,
}

impl OpenRow {
    /// The row's direct child on the current path. Markup nested inside a
    /// field still counts for that field.
    fn field<'s>(&self, stack: &'s [String]) -> Option<&'s String> {
        stack.get(self.depth + 1)
    }

    fn push_text(&mut self, field: &str, text: &str) {
        let slot = self.values.entry(field.to_string()).or_default();
        if !slot.is_empty() {
            slot.push(' ');
        }
        slot.push_str(text);
    }
}

/// Parse every `row_tag` element into a [`Record`] over `fields`.
pub fn parse_document<S: AsRef<str>>(
    xml: &str,
    row_tag: &str,
    fields: &[S],
) -> Result<ParsedDocument, FetchError> {
    let xml = scrub_html_entities_for_xml(xml);
    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(true);

    let mut doc = ParsedDocument::default();
    let mut stack: Vec<String> = Vec::new();
    let mut row: Option<OpenRow> = None;
    let mut result: (Option<String>, Option<String>) = (None, None);

    loop {
        let event = reader.read_event().map_err(|e| {
            FetchError::Parse(format!("at byte {}: {e}", reader.buffer_position()))
        })?;
        match event {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if row.is_none() && name == row_tag {
                    row = Some(OpenRow {
                        depth: stack.len(),
                        values: HashMap::new(),
                    });
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if let Some(r) = row.as_mut() {
                    // `<ADDR/>` directly in a row: present but blank.
                    // Deeper (`<br/>` inside a field) adds nothing.
                    if stack.len() == r.depth + 1 {
                        r.values.entry(name).or_default();
                    }
                } else if name == row_tag {
                    doc.records.push(Record::from_fields(fields, HashMap::new()));
                }
            }
            Event::End(_) => {
                stack.pop();
                if row.as_ref().is_some_and(|r| stack.len() == r.depth) {
                    if let Some(r) = row.take() {
                        doc.records.push(Record::from_fields(fields, r.values));
                    }
                }
            }
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map_err(|e| FetchError::Parse(format!("bad text node: {e}")))?;
                on_text(&stack, &text, &mut row, &mut doc, &mut result);
            }
            Event::CData(c) => {
                let raw = c.into_inner();
                let text = String::from_utf8_lossy(&raw);
                on_text(&stack, &text, &mut row, &mut doc, &mut result);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if row.is_some() {
        return Err(FetchError::Parse(format!("unterminated <{row_tag}> element")));
    }

    if let (Some(code), message) = result {
        doc.result = Some(ServiceResult {
            code,
            message: message.unwrap_or_default(),
        });
    }
    Ok(doc)
}

fn on_text(
    stack: &[String],
    text: &str,
    row: &mut Option<OpenRow>,
    doc: &mut ParsedDocument,
    result: &mut (Option<String>, Option<String>),
) {
    let Some(current) = stack.last() else {
        return;
    };

    if let Some(r) = row.as_mut() {
        // text sitting directly on the row element is not a field
        if let Some(field) = r.field(stack) {
            r.push_text(field, text);
        }
        return;
    }

    let parent = stack.len().checked_sub(2).and_then(|i| stack.get(i));
    match (parent.map(String::as_str), current.as_str()) {
        (Some("RESULT"), "CODE") => result.0 = Some(text.trim().to_string()),
        (Some("RESULT"), "MESSAGE") => result.1 = Some(text.trim().to_string()),
        (_, "list_total_count") => doc.total_count = text.trim().parse().ok(),
        _ => {}
    }
}

/// The API passes through HTML entities from facility descriptions; XML only
/// knows the five predefined ones.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&middot;", "·")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
