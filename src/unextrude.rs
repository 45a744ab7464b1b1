//! Neutralise extrusion in the print body of a plate G-code.
//!
//! The print body is everything between the end of the machine start script and
//! the beginning of the machine end script. Within it, every move that travels in
//! X/Y while extruding has its `E` field replaced by `E0`, so the printer runs the
//! full toolpath without laying down filament. The second-to-last such move keeps
//! a small residual extrusion instead.

use serde::Serialize;

use crate::document::{Document, Line};
use crate::error::{Error, Result};
use crate::parser::{Command, Parameter};

pub const DEFAULT_START_MARKER: &str = "; MACHINE_START_GCODE_END";
pub const DEFAULT_END_MARKER: &str = "; MACHINE_END_GCODE_START";
pub const DEFAULT_RESIDUAL_EXTRUSION: &str = ".01";

#[derive(Debug, Clone, PartialEq)]
pub struct UnextrudeOptions {
    /// Substring identifying the line just before the print body
    pub start_marker: String,
    /// Substring identifying the line just after the print body
    pub end_marker: String,
    /// `E` value written on the second-to-last extrusion move
    pub residual_extrusion: String,
}

impl Default for UnextrudeOptions {
    fn default() -> Self {
        Self {
            start_marker: DEFAULT_START_MARKER.to_string(),
            end_marker: DEFAULT_END_MARKER.to_string(),
            residual_extrusion: DEFAULT_RESIDUAL_EXTRUSION.to_string(),
        }
    }
}

/// One rewritten line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChange {
    /// 1-based line number
    pub line: usize,
    pub original: String,
    pub replacement: String,
}

/// The changes an un-extrude pass would make
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnextrudePlan {
    /// First and last line (1-based, inclusive) of the print body
    pub body: (usize, usize),
    pub changes: Vec<LineChange>,
}

/// Whether a command is an X/Y move that extrudes
pub fn is_extrusion_move(cmd: &Command) -> bool {
    let is_g = cmd.name.starts_with('G')
        && cmd.name[1..].chars().all(|c| c.is_ascii_digit() || c == '.');
    let numeric = |letter| cmd.get(letter).is_some_and(Parameter::is_numeric);

    is_g && (numeric('X') || numeric('Y')) && numeric('E')
}

/// Find the print body as a range of indices into `doc.lines`
fn find_body(doc: &Document, options: &UnextrudeOptions) -> Result<std::ops::Range<usize>> {
    let not_found = || Error::MarkersNotFound {
        start: options.start_marker.clone(),
        end: options.end_marker.clone(),
    };

    let start = doc
        .lines
        .iter()
        .position(|l| l.raw.contains(&options.start_marker))
        .ok_or_else(not_found)?;
    let end = doc.lines[start + 1..]
        .iter()
        .position(|l| l.raw.contains(&options.end_marker))
        .map(|offset| start + 1 + offset)
        .ok_or_else(not_found)?;

    Ok(start + 1..end)
}

/// Compute the rewrite without applying it
pub fn plan(doc: &Document, options: &UnextrudeOptions) -> Result<UnextrudePlan> {
    let body = find_body(doc, options)?;
    let body_lines = (body.start + 1, body.end);

    let moves: Vec<(&Line, &Parameter)> = doc.lines[body]
        .iter()
        .filter_map(|line| {
            let cmd = line.parsed.as_command()?;
            if !is_extrusion_move(cmd) {
                return None;
            }
            Some((line, cmd.get('E')?))
        })
        .collect();

    if moves.is_empty() {
        return Err(Error::NothingToModify);
    }

    let residual_index = moves.len().checked_sub(2);
    let changes = moves
        .iter()
        .enumerate()
        .map(|(i, (line, e_field))| {
            let amount = if Some(i) == residual_index {
                options.residual_extrusion.as_str()
            } else {
                "0"
            };
            LineChange {
                line: line.number,
                original: line.text().to_string(),
                replacement: format!("{}E{}", &line.text()[..e_field.start], amount),
            }
        })
        .collect::<Vec<_>>();

    log::debug!(
        "print body spans lines {}..={}, {} extrusion moves",
        body_lines.0,
        body_lines.1,
        changes.len()
    );

    Ok(UnextrudePlan {
        body: body_lines,
        changes,
    })
}

/// Apply a plan to the document text. Lines keep their original terminators.
pub fn apply(doc: &Document, plan: &UnextrudePlan) -> String {
    let mut rewritten = doc.clone();
    for change in &plan.changes {
        if let Some(line) = rewritten.lines.get_mut(change.line - 1) {
            let crlf = line.raw.ends_with('\r');
            line.raw = change.replacement.clone();
            if crlf {
                line.raw.push('\r');
            }
        }
    }
    rewritten.to_text()
}

/// Parse, plan and apply in one step
pub fn unextrude(text: &str, options: &UnextrudeOptions) -> Result<(String, UnextrudePlan)> {
    let doc = Document::parse(text);
    let plan = plan(&doc, options)?;
    Ok((apply(&doc, &plan), plan))
}
