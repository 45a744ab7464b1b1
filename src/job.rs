//! One un-extrude run over a file on disk.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::archive::GcodeSource;
use crate::document::Document;
use crate::error::Result;
use crate::unextrude::{self, LineChange, UnextrudeOptions};

/// Settings shared by every file processed in one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct JobSettings {
    /// Archive entry holding the plate G-code
    pub plate_entry: String,
    pub options: UnextrudeOptions,
    /// Plan only; leave the file untouched
    pub dry_run: bool,
}

/// What a run did to one file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobReport {
    pub path: PathBuf,
    pub body: (usize, usize),
    pub changes: Vec<LineChange>,
    pub written: bool,
}

/// Read, un-extrude and (unless dry-running) save one file
pub fn run(path: &Path, settings: &JobSettings) -> Result<JobReport> {
    let source = GcodeSource::detect(path, &settings.plate_entry)?;
    log::info!("processing {}", path.display());

    let text = source.read()?;
    let doc = Document::parse(&text);
    let plan = unextrude::plan(&doc, &settings.options)?;
    log::info!(
        "found {} extrusion moves in {}",
        plan.changes.len(),
        path.display()
    );

    let written = if settings.dry_run {
        false
    } else {
        source.write(&unextrude::apply(&doc, &plan))?;
        true
    };

    Ok(JobReport {
        path: path.to_path_buf(),
        body: plan.body,
        changes: plan.changes,
        written,
    })
}
