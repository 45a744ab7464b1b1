//! Structural model of a slicer G-code file.
//!
//! A BambuStudio plate G-code is a flat sequence of three delimited blocks:
//! - `; HEADER_BLOCK_START` .. `; HEADER_BLOCK_END` with summary metadata
//! - `; CONFIG_BLOCK_START` .. `; CONFIG_BLOCK_END` with `; key = value` settings
//! - `; EXECUTABLE_BLOCK_START` .. `; EXECUTABLE_BLOCK_END` with the command stream
//!
//! Parsing is total: any text yields a [`Document`]. Structural problems are left
//! for [`crate::validation`] to report.

pub mod header;
pub mod labels;
pub mod params;

use std::collections::BTreeMap;

use serde::Serialize;

pub use header::{parse_duration, Header};
pub use labels::{LabelProblem, ObjectLabel};
pub use params::{ConfigEntry, MalformedEntry, SlicerConfig};

use crate::parser::{self, ParsedLine};
use labels::LabelTracker;

/// The three delimited blocks of a slicer file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Header,
    Config,
    Executable,
}

impl BlockKind {
    pub fn label(self) -> &'static str {
        match self {
            BlockKind::Header => "HEADER_BLOCK",
            BlockKind::Config => "CONFIG_BLOCK",
            BlockKind::Executable => "EXECUTABLE_BLOCK",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Start,
    End,
}

/// A `; <KIND>_START` or `; <KIND>_END` delimiter line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockMarker {
    pub kind: BlockKind,
    pub edge: Edge,
    pub line: usize,
}

/// Which block a line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Outside,
    Header,
    Config,
    Executable,
}

impl From<BlockKind> for Section {
    fn from(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Header => Section::Header,
            BlockKind::Config => Section::Config,
            BlockKind::Executable => Section::Executable,
        }
    }
}

/// Line range covered by one block, delimiters included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockSpan {
    pub kind: BlockKind,
    pub start_line: usize,
    pub end_line: Option<usize>,
}

/// One physical line of the file
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// 1-based line number
    pub number: usize,
    /// Text as read, including a trailing `\r` for CRLF files
    pub raw: String,
    pub section: Section,
    pub parsed: ParsedLine,
}

impl Line {
    /// Text without the line terminator
    pub fn text(&self) -> &str {
        self.raw.strip_suffix('\r').unwrap_or(&self.raw)
    }
}

/// A parsed slicer G-code file
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub header: Header,
    pub config: SlicerConfig,
    pub lines: Vec<Line>,
    pub labels: Vec<ObjectLabel>,
    pub label_problems: Vec<LabelProblem>,
    pub markers: Vec<BlockMarker>,
    pub blocks: Vec<BlockSpan>,
    trailing_newline: bool,
}

impl Document {
    pub fn parse(text: &str) -> Self {
        let trailing_newline = text.ends_with('\n');
        let body = text.strip_suffix('\n').unwrap_or(text);

        let mut header = Header::default();
        let mut config = SlicerConfig::default();
        let mut lines = Vec::new();
        let mut markers = Vec::new();
        let mut blocks: Vec<BlockSpan> = Vec::new();
        let mut tracker = LabelTracker::default();
        let mut current: Option<BlockKind> = None;

        let raw_lines: Box<dyn Iterator<Item = &str>> = if text.is_empty() {
            Box::new(std::iter::empty())
        } else {
            Box::new(body.split('\n'))
        };

        for (idx, raw) in raw_lines.enumerate() {
            let number = idx + 1;
            let parsed = parser::parse_line(raw);
            let marker = parsed
                .as_comment_only()
                .and_then(|c| block_marker(&c.text, number));

            let section = match marker {
                Some(marker) => {
                    markers.push(marker);
                    match (marker.edge, current) {
                        (Edge::Start, None) => {
                            current = Some(marker.kind);
                            blocks.push(BlockSpan {
                                kind: marker.kind,
                                start_line: number,
                                end_line: None,
                            });
                            Section::from(marker.kind)
                        }
                        (Edge::End, Some(open)) if open == marker.kind => {
                            current = None;
                            if let Some(span) = blocks.last_mut() {
                                span.end_line = Some(number);
                            }
                            Section::from(marker.kind)
                        }
                        (_, open) => open.map_or(Section::Outside, Section::from),
                    }
                }
                None => {
                    let section = current.map_or(Section::Outside, Section::from);
                    match (&parsed, section) {
                        (ParsedLine::Comment(c), Section::Header) => header.push_comment(&c.text),
                        (ParsedLine::Comment(c), Section::Config) => {
                            config.push_comment(number, &c.text)
                        }
                        _ => {}
                    }
                    section
                }
            };

            if let Some(cmd) = parsed.as_command() {
                if cmd.mnemonic() == "M624" {
                    tracker.tag(number);
                }
            }
            if let Some(label_marker) = parsed
                .comment()
                .filter(|_| matches!(section, Section::Executable | Section::Outside))
                .and_then(|c| labels::classify_comment(&c.text))
            {
                tracker.marker(number, label_marker);
            }

            lines.push(Line {
                number,
                raw: raw.to_string(),
                section,
                parsed,
            });
        }

        let (labels, label_problems) = tracker.finish();

        log::debug!(
            "parsed {} lines: {} config entries, {} header entries, {} labels",
            lines.len(),
            config.len(),
            header.entries.len(),
            labels.len()
        );

        Self {
            header,
            config,
            lines,
            labels,
            label_problems,
            markers,
            blocks,
            trailing_newline,
        }
    }

    /// Reassemble the file text; untouched input round-trips byte for byte.
    pub fn to_text(&self) -> String {
        let mut text = self
            .lines
            .iter()
            .map(|l| l.raw.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        if self.trailing_newline {
            text.push('\n');
        }
        text
    }

    pub fn has_blocks(&self) -> bool {
        !self.markers.is_empty()
    }

    pub fn line(&self, number: usize) -> Option<&Line> {
        number.checked_sub(1).and_then(|idx| self.lines.get(idx))
    }

    pub fn block(&self, kind: BlockKind) -> Option<&BlockSpan> {
        self.blocks.iter().find(|b| b.kind == kind)
    }

    /// Lines carrying machine commands: the executable block, or every line
    /// when the file has no block delimiters at all.
    pub fn program_lines(&self) -> impl Iterator<Item = &Line> {
        let whole_file = !self.has_blocks();
        self.lines.iter().filter(move |l| {
            l.section == Section::Executable || (whole_file && l.section == Section::Outside)
        })
    }

    /// Objects whose labelled run includes this line
    pub fn labels_for_line(&self, number: usize) -> Vec<&ObjectLabel> {
        self.labels.iter().filter(|l| l.contains(number)).collect()
    }

    pub fn summary(&self) -> DocumentSummary {
        let mut command_counts = BTreeMap::new();
        for line in self.program_lines() {
            if let Some(cmd) = line.parsed.as_command() {
                *command_counts.entry(cmd.mnemonic()).or_insert(0) += 1;
            }
        }

        DocumentSummary {
            line_count: self.lines.len(),
            blocks: self.blocks.clone(),
            header: self.header.entries.clone(),
            generator: self.header.generator().map(str::to_string),
            parameter_count: self.config.len(),
            duplicate_parameters: self
                .config
                .duplicates()
                .into_iter()
                .map(|(key, _)| key.to_string())
                .collect(),
            command_counts,
            labels: self.labels.clone(),
        }
    }
}

/// Overview printed by `inspect`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub line_count: usize,
    pub blocks: Vec<BlockSpan>,
    pub header: Vec<(String, String)>,
    pub generator: Option<String>,
    pub parameter_count: usize,
    pub duplicate_parameters: Vec<String>,
    pub command_counts: BTreeMap<String, usize>,
    pub labels: Vec<ObjectLabel>,
}

fn block_marker(comment: &str, line: usize) -> Option<BlockMarker> {
    let text = comment.trim();
    let (name, edge) = if let Some(name) = text.strip_suffix("_START") {
        (name, Edge::Start)
    } else if let Some(name) = text.strip_suffix("_END") {
        (name, Edge::End)
    } else {
        return None;
    };

    let kind = match name {
        "HEADER_BLOCK" => BlockKind::Header,
        "CONFIG_BLOCK" => BlockKind::Config,
        "EXECUTABLE_BLOCK" => BlockKind::Executable,
        _ => return None,
    };
    Some(BlockMarker { kind, edge, line })
}
