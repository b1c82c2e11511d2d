//! Watch mode: source changes routed to per-task dispatchers.
//!
//! ```text
//! notify (debounced) → WatchRoutes::route(path) → Dispatcher::request(task)
//!                                                    │
//!                               one worker thread per task, coalescing
//! ```
//!
//! Each watched task has a worker thread fed by a channel of requests. The
//! worker drains whatever piled up before it starts a run, so a burst of
//! changes costs one run, and a change that lands mid-run costs exactly one
//! more. Runs of the same task never overlap; different tasks run
//! concurrently.

use crate::paths::PathRegistry;
use crate::task::TaskKind;
use glob::{MatchOptions, Pattern};
use notify::RecursiveMode;
use notify_debouncer_mini::{DebouncedEventKind, new_debouncer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize file watcher: {0}")]
    Init(#[source] notify::Error),
    #[error("Failed to watch {path}: {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("Invalid watch glob {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },
    #[error("Watch channel closed: {0}")]
    Channel(String),
}

// ============================================================================
// Routing
// ============================================================================

/// Maps changed paths to the tasks that consume them.
#[derive(Debug, Clone)]
pub struct WatchRoutes {
    routes: Vec<(TaskKind, Pattern)>,
}

impl WatchRoutes {
    /// Routes for `kinds`, using each task category's watch glob. Tasks
    /// whose category is not watched are skipped.
    pub fn new(registry: &PathRegistry, kinds: &[TaskKind]) -> Result<Self, WatchError> {
        let mut routes = Vec::new();
        for &kind in kinds {
            let Some(glob) = registry.watch_glob(kind.category()) else {
                continue;
            };
            let pattern = Pattern::new(&glob).map_err(|e| WatchError::Pattern {
                pattern: glob.clone(),
                message: e.to_string(),
            })?;
            routes.push((kind, pattern));
        }
        Ok(Self { routes })
    }

    pub fn tasks(&self) -> Vec<TaskKind> {
        self.routes.iter().map(|(kind, _)| *kind).collect()
    }

    /// Tasks to re-run for a change to `path`.
    pub fn route(&self, path: &Path) -> Vec<TaskKind> {
        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::new()
        };
        self.routes
            .iter()
            .filter(|(_, pattern)| pattern.matches_path_with(path, options))
            .map(|(kind, _)| *kind)
            .collect()
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// One coalescing worker thread per task.
pub struct Dispatcher {
    senders: BTreeMap<TaskKind, Sender<()>>,
    workers: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    /// Start a worker for every kind; `run` is called on the worker thread.
    pub fn start<F>(kinds: &[TaskKind], run: F) -> Self
    where
        F: Fn(TaskKind) + Send + Sync + 'static,
    {
        let run = Arc::new(run);
        let mut senders = BTreeMap::new();
        let mut workers = Vec::new();
        for &kind in kinds {
            if senders.contains_key(&kind) {
                continue;
            }
            let (tx, rx) = mpsc::channel::<()>();
            let run = Arc::clone(&run);
            workers.push(thread::spawn(move || {
                while rx.recv().is_ok() {
                    // Coalesce everything queued so far into this run
                    while rx.try_recv().is_ok() {}
                    run(kind);
                }
            }));
            senders.insert(kind, tx);
        }
        Self { senders, workers }
    }

    /// Ask for a run of `kind`. Returns `false` when no worker handles it.
    pub fn request(&self, kind: TaskKind) -> bool {
        self.senders
            .get(&kind)
            .is_some_and(|tx| tx.send(()).is_ok())
    }

    /// Finish queued runs, then stop every worker.
    pub fn shutdown(self) {
        drop(self.senders);
        for worker in self.workers {
            let _ = worker.join();
        }
    }
}

// ============================================================================
// Watching
// ============================================================================

/// Watch `source_dir` recursively and call `on_change` for every debounced
/// change that routes to at least one task.
///
/// Blocks until the watcher's channel closes.
pub fn watch_sources<F>(
    source_dir: &Path,
    debounce: Duration,
    routes: &WatchRoutes,
    mut on_change: F,
) -> Result<(), WatchError>
where
    F: FnMut(&Path, &[TaskKind]),
{
    if !source_dir.is_dir() {
        return Err(WatchError::SourceNotFound(source_dir.to_path_buf()));
    }

    let (tx, rx) = mpsc::channel();
    let mut debouncer = new_debouncer(debounce, tx).map_err(WatchError::Init)?;
    debouncer
        .watcher()
        .watch(source_dir, RecursiveMode::Recursive)
        .map_err(|source| WatchError::Path {
            path: source_dir.to_path_buf(),
            source,
        })?;

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                for event in events {
                    if !matches!(event.kind, DebouncedEventKind::Any) {
                        continue;
                    }
                    let tasks = routes.route(&event.path);
                    if !tasks.is_empty() {
                        on_change(&event.path, &tasks);
                    }
                }
            }
            Ok(Err(error)) => {
                eprintln!("Watch error: {error}");
            }
            Err(e) => return Err(WatchError::Channel(e.to_string())),
        }
    }
}
