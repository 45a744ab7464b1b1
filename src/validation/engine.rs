//! Validation Engine
//!
//! Checks a parsed [`Document`] against the block structure of slicer output
//! and the command definitions of the active dialect. Never mutates the document.

use std::collections::HashSet;

use serde::Serialize;

use crate::dialect::DialectRegistry;
use crate::document::{BlockKind, Document, Edge, LabelProblem};
use crate::parser::{Command, ParsedLine};

/// Severity of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A diagnostic message for a validation issue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub line: usize,
    pub message: String,
    pub severity: Severity,
}

/// Result of validating a document or line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add_error(&mut self, line: usize, message: String) {
        self.push(line, message, Severity::Error);
    }

    pub fn add_warning(&mut self, line: usize, message: String) {
        self.push(line, message, Severity::Warning);
    }

    pub fn add_info(&mut self, line: usize, message: String) {
        self.push(line, message, Severity::Info);
    }

    fn push(&mut self, line: usize, message: String, severity: Severity) {
        self.diagnostics.push(Diagnostic {
            line,
            message,
            severity,
        });
    }

    pub fn is_valid(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.with_severity(Severity::Warning)
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.severity == severity)
    }

    fn sort(&mut self) {
        self.diagnostics
            .sort_by(|a, b| a.line.cmp(&b.line).then(a.severity.cmp(&b.severity)));
    }
}

/// Validate a single line of GCode
pub fn validate_line(
    line_num: usize,
    parsed: &ParsedLine,
    dialect: &DialectRegistry,
) -> ValidationResult {
    let mut result = ValidationResult::new();

    match parsed {
        ParsedLine::Command(cmd) => {
            validate_command(line_num, cmd, dialect, &mut result);
        }
        ParsedLine::Comment(_) | ParsedLine::Empty => {
            // Comments and empty lines are always valid
        }
    }

    result
}

/// Parse and validate raw text
pub fn validate_text(content: &str, dialect: &DialectRegistry) -> ValidationResult {
    validate_document(&Document::parse(content), dialect)
}

/// Validate an entire document
pub fn validate_document(doc: &Document, dialect: &DialectRegistry) -> ValidationResult {
    let mut result = ValidationResult::new();

    validate_blocks(doc, &mut result);
    validate_config(doc, &mut result);

    for line in doc.program_lines() {
        let line_result = validate_line(line.number, &line.parsed, dialect);
        result.diagnostics.extend(line_result.diagnostics);
    }

    validate_labels(doc, &mut result);

    result.sort();
    log::debug!(
        "validation produced {} diagnostics ({} errors)",
        result.diagnostics.len(),
        result.errors().count()
    );
    result
}

/// Block delimiters: each block once, started before ended, never nested
fn validate_blocks(doc: &Document, result: &mut ValidationResult) {
    let mut open: Option<(BlockKind, usize)> = None;
    let mut seen = HashSet::new();

    for marker in &doc.markers {
        let name = marker.kind.label();
        match marker.edge {
            Edge::Start => {
                if let Some((outer, _)) = open {
                    result.add_error(
                        marker.line,
                        format!("{name}_START inside {} (missing {}_END)", outer.label(), outer.label()),
                    );
                    continue;
                }
                if !seen.insert(marker.kind) {
                    result.add_error(marker.line, format!("{name} appears more than once"));
                }
                open = Some((marker.kind, marker.line));
            }
            Edge::End => match open {
                Some((kind, _)) if kind == marker.kind => open = None,
                Some((kind, _)) => result.add_error(
                    marker.line,
                    format!("{name}_END while {} is open", kind.label()),
                ),
                None => result.add_error(marker.line, format!("{name}_END without {name}_START")),
            },
        }
    }

    if let Some((kind, line)) = open {
        result.add_error(line, format!("{} is never closed", kind.label()));
    }

    if doc.has_blocks() && doc.block(BlockKind::Executable).is_none() {
        result.add_warning(1, "file has no EXECUTABLE_BLOCK".to_string());
    }
}

/// Config block: `; key = value` lines only, keys unique
fn validate_config(doc: &Document, result: &mut ValidationResult) {
    for malformed in &doc.config.malformed {
        result.add_error(
            malformed.line,
            format!("Config line is not 'key = value': '{}'", malformed.text),
        );
    }

    for (key, lines) in doc.config.duplicates() {
        for &line in &lines[1..] {
            result.add_warning(
                line,
                format!("Duplicate parameter '{}' (first set on line {})", key, lines[0]),
            );
        }
    }
}

fn validate_labels(doc: &Document, result: &mut ValidationResult) {
    for problem in &doc.label_problems {
        match problem {
            LabelProblem::NestedStart { line, open, id } => result.add_error(
                *line,
                format!("Object '{id}' starts while object '{open}' is still being printed"),
            ),
            LabelProblem::UnmatchedStop { line, id } => {
                result.add_error(*line, format!("Stop marker for object '{id}' without a start"))
            }
            LabelProblem::MismatchedStop { line, open, id } => result.add_error(
                *line,
                format!("Stop marker for object '{id}' while object '{open}' is open"),
            ),
            LabelProblem::Unclosed { line, id } => {
                result.add_error(*line, format!("Object '{id}' is never stopped"))
            }
        }
    }
}

/// Validate a command using the dialect registry
fn validate_command(
    line_num: usize,
    cmd: &Command,
    dialect: &DialectRegistry,
    result: &mut ValidationResult,
) {
    let Some(command_def) = dialect.get_command(&cmd.name) else {
        result.add_warning(line_num, format!("Unknown command '{}'", cmd.name));
        return;
    };

    // Movement commands without any field do nothing
    let mnemonic = cmd.mnemonic();
    if (mnemonic == "G0" || mnemonic == "G1") && cmd.parameters.is_empty() {
        result.add_warning(
            line_num,
            format!("Movement command '{}' has no parameters", cmd.name),
        );
    }

    let Some(expected_params) = &command_def.parameters else {
        // Vendor commands with free-form arguments
        return;
    };

    for expected_param in expected_params.iter().filter(|p| p.required) {
        let found = cmd
            .parameters
            .iter()
            .any(|p| expected_param.matches_name(&p.letter.to_string()));
        if !found {
            result.add_error(
                line_num,
                format!(
                    "Missing required parameter '{}' for command '{}'",
                    expected_param.name, cmd.name
                ),
            );
        }
    }

    for actual_param in &cmd.parameters {
        let param_name = actual_param.letter.to_ascii_uppercase().to_string();
        match command_def.find_parameter(&param_name) {
            Some(def) => {
                if let Err(message) = def.validate(&actual_param.value) {
                    result.add_error(line_num, message);
                }
            }
            None => result.add_warning(
                line_num,
                format!(
                    "Unknown parameter '{}' for command '{}'",
                    param_name, cmd.name
                ),
            ),
        }
    }
}
