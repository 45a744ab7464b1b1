//! Error types for reading, rewriting and saving plate G-code.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from document and archive operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The 3MF container could not be read or written.
    #[error("3MF archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The archive has no entry with the requested name.
    #[error("archive has no entry '{0}'")]
    MissingEntry(String),

    /// Neither a `.3mf` archive nor a plain `.gcode` file.
    #[error("'{0}' is not a .3mf or .gcode file")]
    UnsupportedFile(PathBuf),

    /// The machine start/end markers delimiting the print body were not found.
    #[error("could not find '{start}' followed by '{end}' in the G-code")]
    MarkersNotFound { start: String, end: String },

    /// The print body contains no extruding moves.
    #[error("no extrusion moves found between the start and end markers")]
    NothingToModify,

    /// A dialect file could not be loaded.
    #[error("dialect '{name}': {reason}")]
    Dialect { name: String, reason: String },

    /// Writing the rewritten file failed; the temporary file is kept.
    #[error("failed to save {path}: {source} (temporary file kept at {temp_path})")]
    Save {
        path: PathBuf,
        temp_path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

/// Result type for library operations.
pub type Result<T> = std::result::Result<T, Error>;
