//! Firmware dialects: which commands exist and what parameters they take.

pub mod registry;
pub mod schema;

pub use registry::{DialectRegistry, BUILTIN_DIALECT, DIALECT_FILE_SUFFIX};
pub use schema::{CommandDef, Dialect, ParameterConstraints, ParameterDef, ParameterType};
