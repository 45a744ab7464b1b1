//! Configuration management for the un-extruder.
//!
//! Handles:
//! - Command-line argument parsing
//! - The optional `unextruder.toml` settings file
//! - Dialect directory configuration
//!
//! Precedence: command line > settings file > built-in defaults.

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::archive::{self, DEFAULT_PLATE_ENTRY};
use crate::dialect::BUILTIN_DIALECT;
use crate::job::JobSettings;
use crate::unextrude::UnextrudeOptions;

/// Settings file looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = "unextruder.toml";

/// Application directory under the user's config dir
pub const APP_DIR: &str = "gcode-unextruder";

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "gcode-unextruder")]
#[command(about = "Strip extrusion from the print body of BambuStudio plate G-code")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    // Files given without a subcommand are un-extruded (drag & drop)
    #[command(flatten)]
    pub unextrude: UnextrudeArgs,

    /// Log level
    #[arg(
        long,
        global = true,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,

    /// Settings file to use instead of the default lookup
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Extra directory containing *.gcode-dialect.toml files
    #[arg(long, global = true)]
    pub dialect_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rewrite extrusion moves to E0 (prompts for a path when none is given)
    Unextrude(UnextrudeArgs),
    /// Show header statistics, parameter count, commands and object labels
    Inspect {
        file: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
        #[arg(long)]
        plate: Option<u32>,
    },
    /// Check block structure, config entries and commands
    Validate {
        file: PathBuf,
        #[arg(long, help = "Dialect to validate against (e.g., 'bambu')")]
        dialect: Option<String>,
        #[arg(long)]
        plate: Option<u32>,
    },
    /// Un-extrude every .3mf file created or modified in a directory
    Watch { dir: PathBuf },
}

#[derive(Debug, Clone, Default, ClapArgs)]
pub struct UnextrudeArgs {
    /// .3mf, .gcode.3mf or .gcode files
    pub files: Vec<PathBuf>,

    /// Show the changes without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Plate number inside the archive (Metadata/plate_N.gcode)
    #[arg(long)]
    pub plate: Option<u32>,

    /// E value left on the second-to-last extrusion move
    #[arg(long)]
    pub residual: Option<String>,
}

/// Contents of `unextruder.toml`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub dialect: Option<String>,
    pub plate_entry: Option<String>,
    pub start_marker: Option<String>,
    pub end_marker: Option<String>,
    pub residual_extrusion: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("parsing settings file {}", path.display()))
    }
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    /// Dialect name, CLI or settings file, else the built-in one
    pub dialect: String,
    /// Directories searched for dialect files
    pub dialect_dirs: Vec<PathBuf>,
    pub plate_entry: String,
    pub options: UnextrudeOptions,
    /// Settings file that was loaded, if any
    pub config_path: Option<PathBuf>,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<(Self, Args)> {
        let args = Args::parse();
        let config = Self::from_args(&args)?;
        Ok((config, args))
    }

    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: &Args) -> Result<Self> {
        let config_path = match &args.config {
            Some(path) => Some(path.clone()),
            None => default_config_path(),
        };
        let file = match &config_path {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::merge(args, file, config_path))
    }

    fn merge(args: &Args, file: FileConfig, config_path: Option<PathBuf>) -> Self {
        let mut dialect_dirs = Vec::new();
        if let Some(custom_dir) = &args.dialect_dir {
            dialect_dirs.push(custom_dir.clone());
        }
        if let Some(config_dir) = dirs::config_dir() {
            dialect_dirs.push(config_dir.join(APP_DIR).join("dialects"));
        }

        let cli_dialect = match &args.command {
            Some(Command::Validate { dialect, .. }) => dialect.clone(),
            _ => None,
        };

        let defaults = UnextrudeOptions::default();
        let plate_entry = args
            .plate()
            .map(archive::plate_entry)
            .or(file.plate_entry)
            .unwrap_or_else(|| DEFAULT_PLATE_ENTRY.to_string());

        Config {
            log_level: args.log_level.clone(),
            dialect: cli_dialect
                .or(file.dialect)
                .unwrap_or_else(|| BUILTIN_DIALECT.to_string()),
            dialect_dirs,
            plate_entry,
            options: UnextrudeOptions {
                start_marker: file.start_marker.unwrap_or(defaults.start_marker),
                end_marker: file.end_marker.unwrap_or(defaults.end_marker),
                residual_extrusion: args
                    .unextrude_args()
                    .and_then(|u| u.residual.clone())
                    .or(file.residual_extrusion)
                    .unwrap_or(defaults.residual_extrusion),
            },
            config_path,
        }
    }

    /// Settings for processing files
    pub fn job_settings(&self, dry_run: bool) -> JobSettings {
        JobSettings {
            plate_entry: self.plate_entry.clone(),
            options: self.options.clone(),
            dry_run,
        }
    }
}

impl Args {
    /// The un-extrude arguments in effect, whether given via subcommand or bare files
    pub fn unextrude_args(&self) -> Option<&UnextrudeArgs> {
        match &self.command {
            None => Some(&self.unextrude),
            Some(Command::Unextrude(args)) => Some(args),
            Some(_) => None,
        }
    }

    fn plate(&self) -> Option<u32> {
        match &self.command {
            Some(Command::Inspect { plate, .. }) | Some(Command::Validate { plate, .. }) => *plate,
            _ => self.unextrude_args().and_then(|u| u.plate),
        }
    }
}

/// `./unextruder.toml`, else `<config dir>/gcode-unextruder/config.toml`, if present
fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(PROJECT_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join("config.toml"))
        .filter(|path| path.is_file())
}
