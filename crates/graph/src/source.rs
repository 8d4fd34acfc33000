//! Document sources: turn a document on disk into an ordered list of labeled segments.
//!
//! PDF conversion itself happens upstream (docling); these sources read its exports.

use crate::error::{GraphError, Result};
use crate::segment::{Segment, SegmentKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

static ATX_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ {0,3}#{1,6}(?:[ \t]+(.*?))?(?:[ \t]+#+)?[ \t]*$").expect("valid heading regex")
});

/// Parser collaborator producing segments for a document path
pub trait DocumentSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Parse the document into segments in reading order
    fn segments(&self, path: &Path) -> Result<Vec<Segment>>;
}

/// Pick a source based on the file extension
pub fn source_for_path(path: &Path) -> Result<Box<dyn DocumentSource>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "json" => Ok(Box::new(DoclingJsonSource)),
        "md" | "markdown" | "txt" => Ok(Box::new(MarkdownSource)),
        "pdf" => Err(GraphError::UnsupportedFormat(format!(
            "{} (export it to docling JSON or Markdown first)",
            path.display()
        ))),
        _ => Err(GraphError::UnsupportedFormat(path.display().to_string())),
    }
}

fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => GraphError::DocumentNotFound(path.to_path_buf()),
        _ => GraphError::DocumentAccess {
            path: path.to_path_buf(),
            reason: err.to_string(),
        },
    })
}

/// Docling document export (`{"texts": [...]}`) or a bare segment array
#[derive(Debug, Clone, Copy, Default)]
pub struct DoclingJsonSource;

#[derive(Deserialize)]
#[serde(untagged)]
enum SegmentPayload {
    Docling { texts: Vec<Segment> },
    Segments(Vec<Segment>),
}

impl DoclingJsonSource {
    pub fn parse_str(&self, raw: &str) -> serde_json::Result<Vec<Segment>> {
        let payload: SegmentPayload = serde_json::from_str(raw)?;
        Ok(match payload {
            SegmentPayload::Docling { texts } => texts,
            SegmentPayload::Segments(segments) => segments,
        })
    }
}

impl DocumentSource for DoclingJsonSource {
    fn name(&self) -> &'static str {
        "docling-json"
    }

    fn segments(&self, path: &Path) -> Result<Vec<Segment>> {
        let raw = read_document(path)?;
        self.parse_str(&raw).map_err(|err| GraphError::DocumentAccess {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }
}

/// Markdown export: ATX headings and blank-line separated paragraphs
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownSource;

#[derive(Default)]
struct MarkdownState {
    segments: Vec<Segment>,
    paragraph: Vec<String>,
    table: Vec<String>,
    code: Option<(String, Vec<String>)>,
}

impl MarkdownState {
    fn flush_paragraph(&mut self) {
        if !self.paragraph.is_empty() {
            let text = self.paragraph.join(" ");
            self.paragraph.clear();
            self.segments.push(Segment::text(text));
        }
    }

    fn flush_table(&mut self) {
        if !self.table.is_empty() {
            let rows = self.table.join("\n");
            self.table.clear();
            self.segments.push(Segment::other("table", rows));
        }
    }

    fn flush_blocks(&mut self) {
        self.flush_paragraph();
        self.flush_table();
    }
}

impl MarkdownSource {
    #[must_use]
    pub fn parse_str(&self, raw: &str) -> Vec<Segment> {
        let mut state = MarkdownState::default();

        for line in raw.lines() {
            let trimmed = line.trim();

            if let Some((fence, mut body)) = state.code.take() {
                if trimmed.starts_with(fence.as_str()) {
                    state.segments.push(Segment::other("code", body.join("\n")));
                } else {
                    body.push(line.to_string());
                    state.code = Some((fence, body));
                }
                continue;
            }

            if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
                state.flush_blocks();
                state.code = Some((trimmed[..3].to_string(), Vec::new()));
                continue;
            }

            if trimmed.is_empty() {
                state.flush_blocks();
                continue;
            }

            if let Some(caps) = ATX_HEADING.captures(line) {
                state.flush_blocks();
                let heading = caps.get(1).map_or("", |m| m.as_str());
                state.segments.push(Segment::section_header(heading));
                continue;
            }

            if trimmed.starts_with('|') {
                state.flush_paragraph();
                state.table.push(trimmed.to_string());
                continue;
            }

            state.flush_table();
            state.paragraph.push(trimmed.to_string());
        }

        if let Some((_, body)) = state.code.take() {
            state.segments.push(Segment::other("code", body.join("\n")));
        }
        state.flush_blocks();
        state.segments
    }
}

impl DocumentSource for MarkdownSource {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn segments(&self, path: &Path) -> Result<Vec<Segment>> {
        let raw = read_document(path)?;
        Ok(self.parse_str(&raw))
    }
}
