//! Validation Engine
//!
//! Clean separation of validation logic from parsing and CLI concerns.

pub mod engine;

pub use engine::{validate_document, validate_line, validate_text, Diagnostic, Severity};

// Re-export common types
pub use engine::ValidationResult;
