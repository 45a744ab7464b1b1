//! GCode Un-Extruder
//!
//! Turns a sliced BambuStudio plate into a "dry run" of itself: the printer
//! travels the whole toolpath of the print body with extrusion set to zero.
//!
//! This library provides:
//! - G-code line parsing and the block structure of BambuStudio plate files
//! - Header statistics, slicer parameters and object labels
//! - Dialect-based command validation
//! - The un-extrude rewrite, on plain G-code or inside `.3mf` archives
//! - Configuration management and the command-line front end

pub mod archive;
pub mod cli;
pub mod config;
pub mod dialect;
pub mod document;
pub mod error;
pub mod job;
pub mod parser;
pub mod unextrude;
pub mod validation;

// Re-exports for a compact public API
pub use config::Config;
pub use dialect::{Dialect, DialectRegistry};
pub use document::Document;
pub use error::{Error, Result};
pub use parser::{parse_line, ParsedLine};
pub use unextrude::{unextrude, UnextrudeOptions, UnextrudePlan};
pub use validation::{validate_document, Diagnostic};
