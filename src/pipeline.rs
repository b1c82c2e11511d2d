//! Pipeline composition: cleans and tasks arranged in series and parallel.
//!
//! Every named pipeline is a [`Step`] tree built from the path registry and
//! the `[pipeline]` config section:
//!
//! ```text
//! dev     clean(html, css, js) → parallel{templates, styles, scripts?}
//! dist    clean(tree) → parallel{templates, styles, scripts?, raster ×3,
//!                                vector ×2, sprite, woff, woff2, web fonts}
//! img     clean(image dirs) → parallel{raster ×3, vector ×2}
//! sprite  clean(sprite dir) → sprite
//! font    parallel{woff, woff2, web fonts}
//! js      clean(js) → scripts
//! ```
//!
//! Series steps are barriers. Parallel branches run on the rayon pool and
//! all of them settle before the parallel step finishes; their failures are
//! collected, never fail-fast. A failed clean aborts the rest of its series.
//!
//! Trees are checked before running: no clean may remove a directory that
//! an earlier step of the same series, or a sibling parallel branch, writes.

use crate::clean::{self, CleanReport, CleanTarget};
use crate::paths::Category;
use crate::task::{self, BuildContext, Mode, TaskKind, TaskReport};
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Clean of {target} would remove output of '{task}' written before it")]
    CleanAfterWrite { target: PathBuf, task: TaskKind },
    #[error("Clean of {target} runs in parallel with '{task}', which writes there")]
    CleanAlongsideWrite { target: PathBuf, task: TaskKind },
}

/// One node of a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Clean(Vec<CleanTarget>),
    Task(TaskKind),
    Series(Vec<Step>),
    Parallel(Vec<Step>),
}

impl Step {
    /// Tasks the step schedules, in definition order.
    pub fn tasks(&self) -> Vec<TaskKind> {
        match self {
            Step::Clean(_) => Vec::new(),
            Step::Task(kind) => vec![*kind],
            Step::Series(steps) | Step::Parallel(steps) => {
                steps.iter().flat_map(Step::tasks).collect()
            }
        }
    }
}

/// The pipelines the CLI can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineName {
    Dev,
    Img,
    Sprite,
    Font,
    Js,
    Dist,
}

impl PipelineName {
    pub fn name(self) -> &'static str {
        match self {
            PipelineName::Dev => "dev",
            PipelineName::Img => "img",
            PipelineName::Sprite => "sprite",
            PipelineName::Font => "font",
            PipelineName::Js => "js",
            PipelineName::Dist => "dist",
        }
    }

    /// Only `dist` builds the release tree.
    pub fn mode(self) -> Mode {
        match self {
            PipelineName::Dist => Mode::Release,
            _ => Mode::Development,
        }
    }
}

impl fmt::Display for PipelineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Clean targets for several categories, without duplicate directories.
fn clean_step(ctx: &BuildContext, categories: &[Category]) -> Step {
    let mut targets: Vec<CleanTarget> = Vec::new();
    for &category in categories {
        let target = ctx.registry.clean_target(category);
        if !targets.contains(&target) {
            targets.push(target);
        }
    }
    Step::Clean(targets)
}

fn tasks(kinds: &[TaskKind]) -> Vec<Step> {
    kinds.iter().copied().map(Step::Task).collect()
}

/// Build the step tree of a named pipeline.
pub fn definition(name: PipelineName, ctx: &BuildContext) -> Step {
    let flags = &ctx.config.pipeline;
    match name {
        PipelineName::Dev => {
            let mut branches = vec![TaskKind::Templates, TaskKind::Styles];
            if flags.dev_scripts {
                branches.push(TaskKind::Scripts);
            }
            Step::Series(vec![
                clean_step(
                    ctx,
                    &[Category::Templates, Category::Styles, Category::Scripts],
                ),
                Step::Parallel(tasks(&branches)),
            ])
        }
        PipelineName::Dist => {
            let branches = TaskKind::ALL
                .iter()
                .copied()
                .filter(|&k| k != TaskKind::Scripts || flags.dist_scripts)
                .map(Step::Task)
                .collect();
            Step::Series(vec![
                Step::Clean(vec![ctx.registry.tree_clean_target()]),
                Step::Parallel(branches),
            ])
        }
        PipelineName::Img => Step::Series(vec![
            clean_step(
                ctx,
                &[
                    Category::BackgroundImages,
                    Category::ContentImages,
                    Category::ContentModernImages,
                    Category::BackgroundVectors,
                    Category::ContentVectors,
                ],
            ),
            Step::Parallel(tasks(&[
                TaskKind::BackgroundRaster,
                TaskKind::ContentRaster,
                TaskKind::ContentPassthrough,
                TaskKind::BackgroundVector,
                TaskKind::ContentVector,
            ])),
        ]),
        PipelineName::Sprite => Step::Series(vec![
            clean_step(ctx, &[Category::SpriteIcons]),
            Step::Task(TaskKind::Sprite),
        ]),
        PipelineName::Font => Step::Parallel(tasks(&[
            TaskKind::TtfToWoff,
            TaskKind::TtfToWoff2,
            TaskKind::CopyWebFonts,
        ])),
        PipelineName::Js => Step::Series(vec![
            clean_step(ctx, &[Category::Scripts]),
            Step::Task(TaskKind::Scripts),
        ]),
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Directories a step writes and targets it cleans.
#[derive(Default)]
struct Effects {
    writes: Vec<(TaskKind, PathBuf)>,
    cleans: Vec<CleanTarget>,
}

impl Effects {
    fn extend(&mut self, other: Effects) {
        self.writes.extend(other.writes);
        self.cleans.extend(other.cleans);
    }

    fn first_write_covered_by(&self, target: &CleanTarget) -> Option<TaskKind> {
        self.writes
            .iter()
            .find(|(_, dir)| target.covers(dir))
            .map(|(kind, _)| *kind)
    }
}

fn effects(step: &Step, ctx: &BuildContext) -> Result<Effects, PipelineError> {
    match step {
        Step::Clean(targets) => Ok(Effects {
            writes: Vec::new(),
            cleans: targets.clone(),
        }),
        Step::Task(kind) => Ok(Effects {
            writes: vec![(*kind, output_dir(*kind, ctx).to_path_buf())],
            cleans: Vec::new(),
        }),
        Step::Series(steps) => {
            let mut done = Effects::default();
            for step in steps {
                let next = effects(step, ctx)?;
                for target in &next.cleans {
                    if let Some(task) = done.first_write_covered_by(target) {
                        return Err(PipelineError::CleanAfterWrite {
                            target: target.dir.clone(),
                            task,
                        });
                    }
                }
                done.extend(next);
            }
            Ok(done)
        }
        Step::Parallel(steps) => {
            let branches = steps
                .iter()
                .map(|s| effects(s, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            for (i, branch) in branches.iter().enumerate() {
                for (j, other) in branches.iter().enumerate() {
                    if i == j {
                        continue;
                    }
                    for target in &branch.cleans {
                        if let Some(task) = other.first_write_covered_by(target) {
                            return Err(PipelineError::CleanAlongsideWrite {
                                target: target.dir.clone(),
                                task,
                            });
                        }
                    }
                }
            }
            let mut all = Effects::default();
            for branch in branches {
                all.extend(branch);
            }
            Ok(all)
        }
    }
}

fn output_dir(kind: TaskKind, ctx: &BuildContext) -> &Path {
    &ctx.registry.entry(kind.category()).output
}

/// Check that no clean can remove another step's output.
pub fn validate(step: &Step, ctx: &BuildContext) -> Result<(), PipelineError> {
    effects(step, ctx).map(|_| ())
}

// ============================================================================
// Execution
// ============================================================================

/// Progress events, sent as each clean and task completes.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    Cleaned(CleanReport),
    TaskFinished(TaskReport),
    /// A clean failed; the rest of its series was skipped.
    Aborted { message: String },
}

/// Everything a pipeline run did.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub tasks: Vec<TaskReport>,
    pub cleaned: Vec<CleanReport>,
    pub aborted: Vec<String>,
}

impl PipelineReport {
    pub fn succeeded(&self) -> bool {
        self.aborted.is_empty() && self.tasks.iter().all(TaskReport::succeeded)
    }

    /// Failed files across all tasks plus aborted series.
    pub fn failure_count(&self) -> usize {
        self.aborted.len() + self.tasks.iter().map(|t| t.failures.len()).sum::<usize>()
    }

    pub fn written_count(&self) -> usize {
        self.tasks.iter().map(|t| t.written.len()).sum()
    }

    fn merge(&mut self, other: PipelineReport) {
        self.tasks.extend(other.tasks);
        self.cleaned.extend(other.cleaned);
        self.aborted.extend(other.aborted);
    }
}

fn emit(events: Option<&Sender<PipelineEvent>>, event: PipelineEvent) {
    if let Some(tx) = events {
        // A closed printer only loses output
        let _ = tx.send(event);
    }
}

/// Run one step. Returns `false` when a clean failed somewhere inside it.
fn execute(
    step: &Step,
    ctx: &BuildContext,
    events: Option<&Sender<PipelineEvent>>,
    report: &mut PipelineReport,
) -> bool {
    match step {
        Step::Clean(targets) => {
            for target in targets {
                match clean::clean(target) {
                    Ok(cleaned) => {
                        emit(events, PipelineEvent::Cleaned(cleaned.clone()));
                        report.cleaned.push(cleaned);
                    }
                    Err(e) => {
                        let message = e.to_string();
                        emit(events, PipelineEvent::Aborted { message: message.clone() });
                        report.aborted.push(message);
                        return false;
                    }
                }
            }
            true
        }
        Step::Task(kind) => {
            let task_report = task::run(*kind, ctx);
            emit(events, PipelineEvent::TaskFinished(task_report.clone()));
            report.tasks.push(task_report);
            true
        }
        Step::Series(steps) => steps.iter().all(|s| execute(s, ctx, events, report)),
        Step::Parallel(steps) => {
            let branches: Vec<(bool, PipelineReport)> = steps
                .par_iter()
                .map(|s| {
                    let mut branch = PipelineReport::default();
                    let ok = execute(s, ctx, events, &mut branch);
                    (ok, branch)
                })
                .collect();
            let mut all_ok = true;
            for (ok, branch) in branches {
                all_ok &= ok;
                report.merge(branch);
            }
            all_ok
        }
    }
}

/// Validate and run a step tree.
pub fn run_step(
    step: &Step,
    ctx: &BuildContext,
    events: Option<&Sender<PipelineEvent>>,
) -> Result<PipelineReport, PipelineError> {
    validate(step, ctx)?;
    let mut report = PipelineReport::default();
    execute(step, ctx, events, &mut report);
    Ok(report)
}

/// Run a named pipeline.
pub fn run(
    name: PipelineName,
    ctx: &BuildContext,
    events: Option<&Sender<PipelineEvent>>,
) -> Result<PipelineReport, PipelineError> {
    run_step(&definition(name, ctx), ctx, events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectConfig;
    use crate::test_helpers::*;
    use std::fs;
    use std::sync::mpsc;
    use tempfile::TempDir;

    fn context(root: &Path, name: PipelineName) -> BuildContext {
        BuildContext::new(root, ProjectConfig::default(), name.mode())
    }

    // =========================================================================
    // Definitions
    // =========================================================================

    #[test]
    fn every_named_pipeline_validates() {
        let tmp = TempDir::new().unwrap();
        for name in [
            PipelineName::Dev,
            PipelineName::Img,
            PipelineName::Sprite,
            PipelineName::Font,
            PipelineName::Js,
            PipelineName::Dist,
        ] {
            let ctx = context(tmp.path(), name);
            validate(&definition(name, &ctx), &ctx).unwrap_or_else(|e| panic!("{name}: {e}"));
        }
    }

    #[test]
    fn dist_runs_every_task_in_release() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path(), PipelineName::Dist);
        let step = definition(PipelineName::Dist, &ctx);

        assert_eq!(step.tasks(), TaskKind::ALL.to_vec());
        assert!(ctx.mode.is_release());
        let Step::Series(steps) = &step else {
            panic!("dist should be a series");
        };
        assert_eq!(steps[0], Step::Clean(vec![CleanTarget::all(tmp.path().join("dist"))]));
    }

    #[test]
    fn script_flags_control_inclusion() {
        let tmp = TempDir::new().unwrap();
        let mut config = ProjectConfig::default();
        config.pipeline.dev_scripts = false;
        config.pipeline.dist_scripts = false;

        let dev = BuildContext::new(tmp.path(), config.clone(), Mode::Development);
        let dist = BuildContext::new(tmp.path(), config, Mode::Release);

        assert!(!definition(PipelineName::Dev, &dev).tasks().contains(&TaskKind::Scripts));
        assert!(!definition(PipelineName::Dist, &dist).tasks().contains(&TaskKind::Scripts));
        // The js pipeline runs scripts regardless
        assert_eq!(definition(PipelineName::Js, &dev).tasks(), vec![TaskKind::Scripts]);
    }

    #[test]
    fn dev_cleans_only_html_at_tree_root() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path(), PipelineName::Dev);
        let Step::Series(steps) = definition(PipelineName::Dev, &ctx) else {
            panic!("dev should be a series");
        };
        let Step::Clean(targets) = &steps[0] else {
            panic!("dev should start with a clean");
        };
        let build = tmp.path().join("build");
        assert_eq!(targets[0], CleanTarget::matching(build.clone(), "*.html"));
        assert_eq!(targets[1], CleanTarget::all(build.join("css")));
        assert_eq!(targets[2], CleanTarget::all(build.join("js")));
    }

    #[test]
    fn img_cleans_shared_content_dir_once() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path(), PipelineName::Img);
        let Step::Series(steps) = definition(PipelineName::Img, &ctx) else {
            panic!("img should be a series");
        };
        let Step::Clean(targets) = &steps[0] else {
            panic!("img should start with a clean");
        };
        assert_eq!(targets.len(), 4);
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn clean_after_write_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path(), PipelineName::Dev);
        let step = Step::Series(vec![
            Step::Task(TaskKind::Styles),
            Step::Clean(vec![ctx.registry.tree_clean_target()]),
        ]);

        assert_eq!(
            validate(&step, &ctx),
            Err(PipelineError::CleanAfterWrite {
                target: tmp.path().join("build"),
                task: TaskKind::Styles,
            })
        );
    }

    #[test]
    fn clean_alongside_write_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path(), PipelineName::Dev);
        let step = Step::Parallel(vec![
            Step::Clean(vec![ctx.registry.clean_target(Category::Scripts)]),
            Step::Task(TaskKind::Scripts),
        ]);

        assert!(matches!(
            validate(&step, &ctx),
            Err(PipelineError::CleanAlongsideWrite { task: TaskKind::Scripts, .. })
        ));
    }

    #[test]
    fn html_clean_does_not_cover_subdirectories() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path(), PipelineName::Dev);
        let step = Step::Series(vec![
            Step::Task(TaskKind::Styles),
            Step::Clean(vec![ctx.registry.clean_target(Category::Templates)]),
        ]);
        assert_eq!(validate(&step, &ctx), Ok(()));
    }

    // =========================================================================
    // Execution
    // =========================================================================

    #[test]
    fn clean_removes_stale_files_before_tasks() {
        let tmp = TempDir::new().unwrap();
        let js_out = tmp.path().join("build/js");
        fs::create_dir_all(&js_out).unwrap();
        fs::write(js_out.join("stale.js"), "old").unwrap();
        fs::create_dir_all(tmp.path().join("src/js")).unwrap();
        fs::write(tmp.path().join("src/js/app.js"), "let a = 1;").unwrap();
        let ctx = context(tmp.path(), PipelineName::Js);

        let report = run(PipelineName::Js, &ctx, None).unwrap();

        assert!(report.succeeded());
        assert_eq!(report.cleaned[0].removed_files, 1);
        assert!(!js_out.join("stale.js").exists());
        assert!(js_out.join("app.min.js").exists());
    }

    #[test]
    fn failed_clean_aborts_rest_of_series() {
        let tmp = TempDir::new().unwrap();
        // A file where the js output directory should be
        fs::create_dir_all(tmp.path().join("build")).unwrap();
        fs::write(tmp.path().join("build/js"), "not a dir").unwrap();
        let ctx = context(tmp.path(), PipelineName::Js);

        let report = run(PipelineName::Js, &ctx, None).unwrap();

        assert!(!report.succeeded());
        assert_eq!(report.aborted.len(), 1);
        assert!(report.tasks.is_empty());
    }

    #[test]
    fn parallel_branches_all_settle_and_report() {
        let tmp = TempDir::new().unwrap();
        let fonts = tmp.path().join("src/fonts");
        fs::create_dir_all(&fonts).unwrap();
        fs::write(fonts.join("broken.ttf"), "nope").unwrap();
        fs::write(fonts.join("ready.woff2"), "wOF2").unwrap();
        let ctx = context(tmp.path(), PipelineName::Font);
        let (tx, rx) = mpsc::channel();

        let report = run(PipelineName::Font, &ctx, Some(&tx)).unwrap();
        drop(tx);

        assert_eq!(report.tasks.len(), 3);
        assert_eq!(report.failure_count(), 2);
        assert_eq!(report.written_count(), 1);
        let finished = rx
            .iter()
            .filter(|e| matches!(e, PipelineEvent::TaskFinished(_)))
            .count();
        assert_eq!(finished, 3);
    }

    // =========================================================================
    // Fixture project
    // =========================================================================

    #[test]
    fn dev_builds_fixture_pages_styles_and_scripts() {
        let tmp = setup_project();
        let ctx = dev_context(tmp.path());

        let report = run(PipelineName::Dev, &ctx, None).unwrap();

        assert!(report.succeeded(), "{:?}", report.tasks);
        assert_written(
            tmp.path(),
            &[
                "build/index.html",
                "build/about.html",
                "build/css/style.min.css",
                "build/js/menu.min.js",
            ],
        );
        assert!(!tmp.path().join("build/_base.html").exists());
        // Development output is neither purified nor busted
        assert!(read(tmp.path(), "build/css/style.min.css").contains(".legacy-banner"));
        assert!(read(tmp.path(), "build/index.html").contains(r#"href="css/style.min.css""#));
    }

    #[test]
    fn img_pipeline_leaves_other_outputs_alone() {
        let tmp = setup_project();
        let ctx = dev_context(tmp.path());
        run(PipelineName::Dev, &ctx, None).unwrap();

        let report = run(PipelineName::Img, &ctx, None).unwrap();

        assert!(report.succeeded(), "{:?}", report.tasks);
        assert_written(
            tmp.path(),
            &[
                "build/index.html",
                "build/img/content_img/photo.png",
                "build/img/content_img/photo.avif",
                "build/img/content_img/poster.webp",
                "build/img/background_img/noise.png",
                "build/img/content_svg/logo.svg",
                "build/img/background_svg/waves.svg",
            ],
        );
    }
}
