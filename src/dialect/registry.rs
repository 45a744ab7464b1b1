//! Dialect Registry
//!
//! In-memory registry of firmware dialects with one active dialect.

use super::schema::{CommandDef, Dialect, DialectFile};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// File suffix for dialect definitions
pub const DIALECT_FILE_SUFFIX: &str = ".gcode-dialect.toml";

/// Name of the dialect compiled into the binary
pub const BUILTIN_DIALECT: &str = "bambu";

/// Simple in-memory dialect registry
#[derive(Debug, Clone)]
pub struct DialectRegistry {
    dialects: HashMap<String, Dialect>,
    active_dialect: Option<String>,
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DialectRegistry {
    pub fn new() -> Self {
        Self {
            dialects: HashMap::new(),
            active_dialect: None,
        }
    }

    /// Registry holding the embedded Bambu dialect, already active
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.add_embedded_bambu_dialect();
        registry.set_active_dialect(BUILTIN_DIALECT);
        registry
    }

    /// Add a dialect; a dialect with an existing name overlays its commands
    pub fn add_dialect(&mut self, dialect: Dialect) {
        match self.dialects.get_mut(&dialect.name) {
            Some(existing) => existing.extend(dialect),
            None => {
                self.dialects.insert(dialect.name.clone(), dialect);
            }
        }
    }

    /// Set the active dialect
    pub fn set_active_dialect(&mut self, name: &str) -> bool {
        if self.dialects.contains_key(name) {
            self.active_dialect = Some(name.to_string());
            true
        } else {
            false
        }
    }

    /// Get the currently active dialect
    pub fn get_active_dialect(&self) -> Option<&Dialect> {
        self.active_dialect
            .as_ref()
            .and_then(|name| self.dialects.get(name))
    }

    /// List all available dialects
    pub fn list_dialects(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.dialects.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Get command definition from active dialect
    ///
    /// Tool selections (`T0`, `T1000`) resolve to a generic `T` entry.
    pub fn get_command(&self, name: &str) -> Option<&CommandDef> {
        let commands = &self.get_active_dialect()?.commands;
        let name = name.to_ascii_uppercase();

        commands.get(&name).or_else(|| {
            let digits = name.strip_prefix('T')?;
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                commands.get("T")
            } else {
                None
            }
        })
    }

    /// Parse dialect TOML and register it, returning its name
    pub fn add_dialect_toml(&mut self, content: &str, origin: &str) -> Result<String> {
        let file: DialectFile = toml::from_str(content).map_err(|e| Error::Dialect {
            name: origin.to_string(),
            reason: e.to_string(),
        })?;
        let dialect = Dialect::from(file);
        let name = dialect.name.clone();
        self.add_dialect(dialect);
        Ok(name)
    }

    /// Add the Bambu dialect shipped with the crate
    pub fn add_embedded_bambu_dialect(&mut self) {
        let embedded_toml = include_str!("../../resources/dialects/bambu.gcode-dialect.toml");

        if let Err(e) = self.add_dialect_toml(embedded_toml, BUILTIN_DIALECT) {
            log::warn!("{}. Using minimal fallback.", e);
            self.add_minimal_bambu_dialect();
        }
    }

    /// Add minimal fallback dialect in case embedded TOML parsing fails
    fn add_minimal_bambu_dialect(&mut self) {
        let commands = ["G0", "G1", "G28", "G90", "G91", "G92", "M83", "M104", "M106", "M109", "M140"]
            .into_iter()
            .map(|name| {
                (
                    name.to_string(),
                    CommandDef {
                        name: name.to_string(),
                        description_short: None,
                        description_long: None,
                        parameters: None,
                    },
                )
            })
            .collect();

        self.add_dialect(Dialect {
            name: BUILTIN_DIALECT.to_string(),
            version: Some("minimal-fallback".to_string()),
            description: Some("Minimal fallback Bambu dialect".to_string()),
            commands,
        });
    }

    /// Load every `*.gcode-dialect.toml` in a directory.
    ///
    /// A missing directory is not an error. Returns the names loaded.
    pub fn load_dir(&mut self, dir: &Path) -> Result<Vec<String>> {
        if !dir.is_dir() {
            log::debug!("dialect directory {} not present", dir.display());
            return Ok(Vec::new());
        }

        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(DIALECT_FILE_SUFFIX))
            })
            .collect();
        paths.sort();

        let mut loaded = Vec::new();
        for path in paths {
            let content = fs::read_to_string(&path)?;
            let name = self.add_dialect_toml(&content, &path.display().to_string())?;
            log::info!("loaded dialect '{}' from {}", name, path.display());
            loaded.push(name);
        }
        Ok(loaded)
    }
}
