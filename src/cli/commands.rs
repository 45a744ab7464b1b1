use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};

use crate::archive::GcodeSource;
use crate::cli::interactive;
use crate::config::{Config, UnextrudeArgs};
use crate::dialect::DialectRegistry;
use crate::document::Document;
use crate::job::{self, JobReport, JobSettings};
use crate::validation::validate_document;

const BANNER_RULE: &str = "============================================================";

/// Un-extrude the given files in parallel, or prompt for paths when there are none
pub async fn unextrude(config: &Config, args: UnextrudeArgs) -> Result<ExitCode> {
    let settings = config.job_settings(args.dry_run);

    if args.files.is_empty() {
        return tokio::task::spawn_blocking(move || run_interactive(&settings))
            .await
            .context("interactive session panicked")?;
    }

    let handles: Vec<_> = unique_files(args.files)
        .into_iter()
        .map(|path| {
            let settings = settings.clone();
            tokio::task::spawn_blocking(move || {
                let result = job::run(&path, &settings);
                (path, result)
            })
        })
        .collect();

    let mut failures = 0;
    for handle in handles {
        let (path, result) = handle.await.context("worker task panicked")?;
        println!("\nProcessing: {}", path.display());
        match result {
            Ok(report) => print_report(&report),
            Err(e) => {
                failures += 1;
                eprintln!("Error: {e}");
            }
        }
    }

    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Drop repeated paths, comparing canonical forms, so no two jobs rewrite the
/// same file through the same temporary path. Paths that cannot be resolved
/// are kept as given and fail later with a proper error.
fn unique_files(files: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    files
        .into_iter()
        .filter(|path| {
            let key = path.canonicalize().unwrap_or_else(|_| path.clone());
            let first = seen.insert(key);
            if !first {
                log::warn!("skipping {}: already listed", path.display());
            }
            first
        })
        .collect()
}

fn run_interactive(settings: &JobSettings) -> Result<ExitCode> {
    println!("{BANNER_RULE}");
    println!("GcodeUnExtruder - 3MF G-code Modifier");
    println!("{BANNER_RULE}");
    println!("\nNo file provided. Please enter the file path:");
    println!("(You can drag & drop the file into this window, or type the path)\n");

    let mut input = io::stdin().lock();
    let mut output = io::stdout();
    interactive::prompt_loop(&mut input, &mut output, |path| {
        println!("\nProcessing: {}", path.display());
        match job::run(path, settings) {
            Ok(report) => {
                print_report(&report);
                true
            }
            Err(e) => {
                eprintln!("Error: {e}");
                false
            }
        }
    })?;
    interactive::pause_before_exit(&mut input, &mut output)?;
    Ok(ExitCode::SUCCESS)
}

fn print_report(report: &JobReport) {
    println!("Found {} lines to modify", report.changes.len());
    println!("\nModified lines:");
    for change in &report.changes {
        println!("[Line {}] {}", change.line, change.replacement);
    }

    if report.written {
        println!(
            "\n\u{2713} Original file updated successfully: {}",
            report.path.display()
        );
    } else {
        println!("\nDry run: {} left unchanged", report.path.display());
    }
}

fn load_document(config: &Config, file: &Path) -> Result<Document> {
    let source = GcodeSource::detect(file, &config.plate_entry)?;
    let text = source
        .read()
        .with_context(|| format!("reading {}", file.display()))?;
    Ok(Document::parse(&text))
}

/// Print an overview of the file
pub fn inspect(config: &Config, file: &Path, json: bool) -> Result<ExitCode> {
    let summary = load_document(config, file)?.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", file.display());
    if let Some(generator) = &summary.generator {
        println!("  generator: {generator}");
    }
    println!("  lines: {}", summary.line_count);
    for block in &summary.blocks {
        let end = block
            .end_line
            .map_or_else(|| "unterminated".to_string(), |l| l.to_string());
        println!("  {}: lines {}..{}", block.kind.label(), block.start_line, end);
    }
    for (key, value) in &summary.header {
        println!("  {key}: {value}");
    }
    println!("  parameters: {}", summary.parameter_count);
    if !summary.duplicate_parameters.is_empty() {
        println!("  duplicate parameters: {}", summary.duplicate_parameters.join(", "));
    }
    println!("  commands:");
    for (name, count) in &summary.command_counts {
        println!("    {name:<8} {count}");
    }
    println!("  objects: {}", summary.labels.len());
    for label in &summary.labels {
        match label.end_line {
            Some(end) => println!("    {} (lines {}..{})", label.id, label.start_line, end),
            None => println!("    {} (from line {}, never stopped)", label.id, label.start_line),
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Print diagnostics; fails when any error is found
pub fn validate(config: &Config, file: &Path) -> Result<ExitCode> {
    let registry = build_registry(config)?;
    let doc = load_document(config, file)?;
    let result = validate_document(&doc, &registry);

    for diagnostic in &result.diagnostics {
        println!(
            "{}:{}: {:?}: {}",
            file.display(),
            diagnostic.line,
            diagnostic.severity,
            diagnostic.message
        );
    }
    println!(
        "{} errors, {} warnings",
        result.errors().count(),
        result.warnings().count()
    );

    Ok(if result.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Built-in dialect plus any user dialect files, with the configured one active
pub fn build_registry(config: &Config) -> Result<DialectRegistry> {
    let mut registry = DialectRegistry::with_builtin();
    for dir in &config.dialect_dirs {
        registry
            .load_dir(dir)
            .with_context(|| format!("loading dialects from {}", dir.display()))?;
    }

    if !registry.set_active_dialect(&config.dialect) {
        bail!(
            "unknown dialect '{}' (available: {})",
            config.dialect,
            registry.list_dialects().join(", ")
        );
    }
    Ok(registry)
}
