//! Reading and rewriting plate G-code inside 3MF project archives.
//!
//! BambuStudio stores sliced plates as `Metadata/plate_<n>.gcode` inside the
//! `.3mf` (or `.gcode.3mf`) zip container. Rewrites copy every other entry
//! untouched and replace the original file only once the new archive is complete.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::{Error, Result};

pub const DEFAULT_PLATE_ENTRY: &str = "Metadata/plate_1.gcode";

/// Archive entry name for a plate number
pub fn plate_entry(plate: u32) -> String {
    format!("Metadata/plate_{plate}.gcode")
}

/// Name of the MD5 sidecar the slicer stores next to a plate entry
pub fn checksum_entry(entry: &str) -> String {
    format!("{entry}.md5")
}

/// Where a plate G-code is read from and written back to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GcodeSource {
    /// A zip-based 3MF project and the entry holding the G-code
    Archive { path: PathBuf, entry: String },
    /// A bare `.gcode` file
    Plain(PathBuf),
}

impl GcodeSource {
    /// Choose the source kind from the file extension
    pub fn detect(path: &Path, entry: &str) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if name.ends_with(".3mf") {
            Ok(GcodeSource::Archive {
                path: path.to_path_buf(),
                entry: entry.to_string(),
            })
        } else if name.ends_with(".gcode") {
            Ok(GcodeSource::Plain(path.to_path_buf()))
        } else {
            Err(Error::UnsupportedFile(path.to_path_buf()))
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            GcodeSource::Archive { path, .. } | GcodeSource::Plain(path) => path,
        }
    }

    pub fn read(&self) -> Result<String> {
        match self {
            GcodeSource::Archive { path, entry } => read_plate_gcode(path, entry),
            GcodeSource::Plain(path) => {
                let bytes = fs::read(path)?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
        }
    }

    pub fn write(&self, text: &str) -> Result<()> {
        match self {
            GcodeSource::Archive { path, entry } => write_plate_gcode(path, entry, text),
            GcodeSource::Plain(path) => {
                replace_via_temp(path, |temp| Ok(fs::write(temp, text.as_bytes())?))
            }
        }
    }
}

/// Read a G-code entry, replacing invalid UTF-8 sequences
pub fn read_plate_gcode(path: &Path, entry: &str) -> Result<String> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let mut file = archive.by_name(entry).map_err(|e| missing_entry(e, entry))?;

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    log::debug!("read {} bytes from {}:{}", bytes.len(), path.display(), entry);
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Replace one entry of the archive at `path` with `text`.
///
/// The new archive is written next to the original as `<name>.tmp` and renamed
/// over it. If writing fails the temporary file is kept and reported.
pub fn write_plate_gcode(path: &Path, entry: &str, text: &str) -> Result<()> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    if archive.index_for_name(entry).is_none() {
        return Err(Error::MissingEntry(entry.to_string()));
    }
    let checksum = checksum_entry(entry);
    if archive.index_for_name(&checksum).is_some() {
        log::warn!(
            "{} in {} still describes the original G-code",
            checksum,
            path.display()
        );
    }

    replace_via_temp(path, |temp| {
        let mut writer = ZipWriter::new(File::create(temp)?);

        for index in 0..archive.len() {
            let file = archive.by_index_raw(index)?;
            if file.name() == entry {
                let options = SimpleFileOptions::default().compression_method(file.compression());
                drop(file);
                writer.start_file(entry, options)?;
                writer.write_all(text.as_bytes())?;
            } else {
                writer.raw_copy_file(file)?;
            }
        }

        writer.finish()?;
        Ok(())
    })
}

/// List entry names, mainly for diagnostics
pub fn entry_names(path: &Path) -> Result<Vec<String>> {
    let archive = ZipArchive::new(File::open(path)?)?;
    Ok(archive.file_names().map(str::to_string).collect())
}

/// Temporary path used while rewriting `path`
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn replace_via_temp(path: &Path, write: impl FnOnce(&Path) -> Result<()>) -> Result<()> {
    let temp = temp_path(path);

    if let Err(source) = write(&temp).and_then(|()| Ok(fs::rename(&temp, path)?)) {
        return Err(Error::Save {
            path: path.to_path_buf(),
            temp_path: temp,
            source: Box::new(source),
        });
    }

    log::debug!("replaced {}", path.display());
    Ok(())
}

fn missing_entry(error: ZipError, entry: &str) -> Error {
    match error {
        ZipError::FileNotFound => Error::MissingEntry(entry.to_string()),
        other => Error::Zip(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_source_kind() {
        let archive = GcodeSource::detect(Path::new("/tmp/Cube.gcode.3mf"), DEFAULT_PLATE_ENTRY);
        assert!(matches!(archive, Ok(GcodeSource::Archive { .. })));

        let upper = GcodeSource::detect(Path::new("CUBE.3MF"), DEFAULT_PLATE_ENTRY);
        assert!(matches!(upper, Ok(GcodeSource::Archive { .. })));

        let plain = GcodeSource::detect(Path::new("plate_1.gcode"), DEFAULT_PLATE_ENTRY);
        assert_eq!(plain.unwrap(), GcodeSource::Plain(PathBuf::from("plate_1.gcode")));

        let other = GcodeSource::detect(Path::new("model.stl"), DEFAULT_PLATE_ENTRY);
        assert!(matches!(other, Err(Error::UnsupportedFile(_))));
    }

    #[test]
    fn test_plate_entry_and_temp_path() {
        assert_eq!(plate_entry(3), "Metadata/plate_3.gcode");
        assert_eq!(temp_path(Path::new("a/b.3mf")), PathBuf::from("a/b.3mf.tmp"));
        assert_eq!(checksum_entry(&plate_entry(2)), "Metadata/plate_2.gcode.md5");
    }
}
