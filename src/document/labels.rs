//! Object label markers.
//!
//! Runs of commands belonging to one printed object are bracketed by comments the
//! printer uses for its exclude-object feature. BambuStudio writes
//!
//! ```text
//! M624 AQAAAAAAAAA=
//! ; start printing object, unique label id: 15
//! ...
//! ; stop printing object, unique label id: 15
//! M625
//! ```
//!
//! while older and Orca-derived output uses `; printing object NAME` /
//! `; stop printing object NAME`.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static UNIQUE_LABEL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"unique label id:\s*(\S+)").expect("valid label regex"));

/// One labelled run of commands
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectLabel {
    pub id: String,
    /// 1-based line of the start marker
    pub start_line: usize,
    /// 1-based line of the stop marker, if the run was closed
    pub end_line: Option<usize>,
    /// Line of the `M624` tag issued just before the start marker
    pub tag_line: Option<usize>,
}

impl ObjectLabel {
    pub fn contains(&self, line: usize) -> bool {
        line > self.start_line && self.end_line.is_none_or(|end| line < end)
    }
}

/// Structural problems found while pairing label markers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LabelProblem {
    /// A start marker while another object is still open
    NestedStart {
        line: usize,
        open: String,
        id: String,
    },
    /// A stop marker with no open object
    UnmatchedStop { line: usize, id: String },
    /// A stop marker naming a different object than the open one
    MismatchedStop {
        line: usize,
        open: String,
        id: String,
    },
    /// An object still open at end of file
    Unclosed { line: usize, id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Marker {
    Start(String),
    Stop(String),
}

/// Classify a comment as a label marker.
pub(crate) fn classify_comment(comment: &str) -> Option<Marker> {
    let text = comment.trim();

    if let Some(rest) = text.strip_prefix("stop printing object") {
        return Some(Marker::Stop(label_id(rest)));
    }
    if let Some(rest) = text
        .strip_prefix("start printing object")
        .or_else(|| text.strip_prefix("printing object"))
    {
        return Some(Marker::Start(label_id(rest)));
    }
    None
}

fn label_id(rest: &str) -> String {
    match UNIQUE_LABEL_ID.captures(rest) {
        Some(caps) => caps[1].to_string(),
        None => rest.trim_start_matches(',').trim().to_string(),
    }
}

/// Pairs start/stop markers as lines stream past.
#[derive(Debug, Default)]
pub(crate) struct LabelTracker {
    labels: Vec<ObjectLabel>,
    problems: Vec<LabelProblem>,
    open: Option<usize>,
    pending_tag: Option<usize>,
}

impl LabelTracker {
    /// Note an `M624` object tag; it attaches to the next start marker.
    pub fn tag(&mut self, line: usize) {
        self.pending_tag = Some(line);
    }

    pub fn marker(&mut self, line: usize, marker: Marker) {
        match marker {
            Marker::Start(id) => {
                if let Some(open) = self.open.take() {
                    self.problems.push(LabelProblem::NestedStart {
                        line,
                        open: self.labels[open].id.clone(),
                        id: id.clone(),
                    });
                }
                self.labels.push(ObjectLabel {
                    id,
                    start_line: line,
                    end_line: None,
                    tag_line: self.pending_tag.take(),
                });
                self.open = Some(self.labels.len() - 1);
            }
            Marker::Stop(id) => match self.open.take() {
                Some(open) => {
                    let label = &mut self.labels[open];
                    if label.id != id {
                        self.problems.push(LabelProblem::MismatchedStop {
                            line,
                            open: label.id.clone(),
                            id,
                        });
                    }
                    label.end_line = Some(line);
                }
                None => self.problems.push(LabelProblem::UnmatchedStop { line, id }),
            },
        }
    }

    pub fn finish(mut self) -> (Vec<ObjectLabel>, Vec<LabelProblem>) {
        if let Some(open) = self.open.take() {
            let label = &self.labels[open];
            self.problems.push(LabelProblem::Unclosed {
                line: label.start_line,
                id: label.id.clone(),
            });
        }
        (self.labels, self.problems)
    }
}
