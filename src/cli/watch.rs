//! Un-extrude project files as they appear in a directory.
//!
//! Slicers write a `.3mf` in several steps, so a file is only processed once it
//! has been quiet for [`QUIET_PERIOD`]. Our own rewrite triggers events too;
//! those are ignored for the same period after a job finishes.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::job;

pub const QUIET_PERIOD: Duration = Duration::from_secs(2);
const TICK: Duration = Duration::from_millis(250);

enum WatchEvent {
    Changed(PathBuf),
    Error(notify::Error),
}

/// `.3mf` and `.gcode.3mf` files, case-insensitively
pub fn is_project_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.to_ascii_lowercase().ends_with(".3mf"))
}

/// Tracks which changed files have settled and are ready to process
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    pending: HashMap<PathBuf, Instant>,
    in_flight: HashSet<PathBuf>,
    finished: HashMap<PathBuf, Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: HashMap::new(),
            in_flight: HashSet::new(),
            finished: HashMap::new(),
        }
    }

    /// Record a change event
    pub fn touch(&mut self, path: PathBuf, now: Instant) {
        if self.in_flight.contains(&path) {
            return;
        }
        if let Some(done) = self.finished.get(&path) {
            if now.duration_since(*done) < self.quiet {
                return;
            }
            self.finished.remove(&path);
        }
        self.pending.insert(path, now);
    }

    /// Files quiet for long enough; they count as in flight until [`Self::finish`]
    pub fn ready(&mut self, now: Instant) -> Vec<PathBuf> {
        let quiet = self.quiet;
        let mut ready: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, last)| now.duration_since(**last) >= quiet)
            .map(|(path, _)| path.clone())
            .collect();
        ready.sort();

        for path in &ready {
            self.pending.remove(path);
            self.in_flight.insert(path.clone());
        }
        ready
    }

    /// A job for `path` completed, successfully or not
    pub fn finish(&mut self, path: PathBuf, now: Instant) {
        self.in_flight.remove(&path);
        self.finished.insert(path, now);
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.in_flight.is_empty()
    }
}

/// Watch `dir` until Ctrl-C, un-extruding settled project files
pub async fn watch(config: &Config, dir: &Path) -> Result<ExitCode> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let EventKind::Create(_) | EventKind::Modify(_) = event.kind {
                    for path in event.paths {
                        if is_project_file(&path) {
                            let _ = tx.send(WatchEvent::Changed(path));
                        }
                    }
                }
            }
            Err(e) => {
                let _ = tx.send(WatchEvent::Error(e));
            }
        },
        notify::Config::default(),
    )
    .context("creating file watcher")?;
    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("watching {}", dir.display()))?;
    log::info!("watching {} for .3mf files (Ctrl-C to stop)", dir.display());

    let settings = config.job_settings(false);
    let mut debouncer = Debouncer::new(QUIET_PERIOD);
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<PathBuf>();
    let mut tick = tokio::time::interval(TICK);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                log::info!("stopping watcher");
                break;
            }
            Some(event) = rx.recv() => match event {
                WatchEvent::Changed(path) => {
                    log::debug!("change event for {}", path.display());
                    debouncer.touch(path, Instant::now());
                }
                WatchEvent::Error(e) => log::warn!("file watcher error: {e}"),
            },
            Some(path) = done_rx.recv() => debouncer.finish(path, Instant::now()),
            _ = tick.tick() => {
                for path in debouncer.ready(Instant::now()) {
                    let settings = settings.clone();
                    let done = done_tx.clone();
                    tokio::task::spawn_blocking(move || {
                        match job::run(&path, &settings) {
                            Ok(report) => log::info!(
                                "un-extruded {} ({} moves)",
                                path.display(),
                                report.changes.len()
                            ),
                            Err(e) => log::error!("{}: {e}", path.display()),
                        }
                        let _ = done.send(path);
                    });
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
