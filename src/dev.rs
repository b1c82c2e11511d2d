//! Development mode: build once, then serve and rebuild on change.
//!
//! ```text
//! dev pipeline ─▶ server (build/) ─▶ watch src/ ─▶ dispatcher ─▶ task
//!                      ▲                                          │
//!                      └──────────── ReloadHub::notify ◀──────────┘
//! ```
//!
//! A failing initial build does not stop the session: the watcher starts
//! anyway so fixing the source recovers without a restart. Only successful
//! rebuilds notify browsers.

use crate::output;
use crate::pipeline::{self, PipelineError, PipelineEvent, PipelineName, PipelineReport};
use crate::reload::{ReloadHub, ReloadKind};
use crate::server::{DevServer, ServeError};
use crate::task::{self, BuildContext, TaskKind, TaskReport};
use crate::watch::{self, Dispatcher, WatchError, WatchRoutes};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Serve(#[from] ServeError),
    #[error(transparent)]
    Watch(#[from] WatchError),
}

/// Which browser action a successful rebuild calls for.
pub fn reload_kind(task: TaskKind) -> ReloadKind {
    match task {
        TaskKind::Styles => ReloadKind::Css,
        _ => ReloadKind::Full,
    }
}

/// Run `name` with progress streamed to a printer thread.
pub fn run_with_printer(
    name: PipelineName,
    ctx: &BuildContext,
) -> Result<PipelineReport, PipelineError> {
    let started = Instant::now();
    let root = ctx.registry.root().to_path_buf();
    let (tx, rx) = mpsc::channel::<PipelineEvent>();
    let printer = thread::spawn(move || {
        for event in rx {
            output::print_pipeline_event(&event, &root);
        }
    });
    let result = pipeline::run(name, ctx, Some(&tx));
    drop(tx);
    let _ = printer.join();
    let report = result?;
    output::print_summary(name, &report, started.elapsed());
    Ok(report)
}

/// Run one task for the watcher and notify browsers when it succeeded.
pub fn rebuild(kind: TaskKind, ctx: &BuildContext, hub: &ReloadHub) -> TaskReport {
    let report = task::run(kind, ctx);
    if report.succeeded() {
        hub.notify(reload_kind(kind));
    }
    report
}

/// Initial build, server, watcher. Blocks until the watcher fails.
pub fn serve(ctx: BuildContext) -> Result<(), DevError> {
    let ctx = Arc::new(ctx);
    let initial = run_with_printer(PipelineName::Dev, &ctx)?;
    if !initial.succeeded() {
        println!("Initial build had failures; watching for fixes");
    }

    let tree = ctx.registry.tree().to_path_buf();
    std::fs::create_dir_all(&tree)?;
    let hub = Arc::new(ReloadHub::new());
    let server = DevServer::bind(
        &ctx.config.server.host,
        ctx.config.server.port,
        tree.clone(),
        Arc::clone(&hub),
    )?;
    match server.local_addr() {
        Some(addr) => println!("==> Serving {} at http://{addr}/", tree.display()),
        None => println!("==> Serving {}", tree.display()),
    }
    let server = server.spawn();

    let kinds = pipeline::definition(PipelineName::Dev, &ctx).tasks();
    let routes = WatchRoutes::new(&ctx.registry, &kinds)?;
    let dispatcher = {
        let ctx = Arc::clone(&ctx);
        let hub = Arc::clone(&hub);
        Dispatcher::start(&routes.tasks(), move |kind| {
            let report = rebuild(kind, &ctx, &hub);
            output::print_rebuild(&report, ctx.registry.root());
        })
    };

    println!("==> Watching {} for changes", ctx.registry.source_dir().display());
    let root = ctx.registry.root().to_path_buf();
    let result = watch::watch_sources(
        ctx.registry.source_dir(),
        Duration::from_millis(ctx.config.watch.debounce_ms),
        &routes,
        |path, tasks| {
            output::print_change(path, &root, tasks);
            for &kind in tasks {
                dispatcher.request(kind);
            }
        },
    );

    dispatcher.shutdown();
    server.shutdown();
    result.map_err(DevError::from)
}
