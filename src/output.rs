//! CLI output formatting for pipeline runs and watch mode.
//!
//! # Output Format
//!
//! ## Pipeline run
//!
//! ```text
//! Cleaned dist (14 files)
//! ok   styles → 1 file (38ms)
//! ok   content images → 6 files (1.24s)
//! FAIL woff2 → 1 file, 1 failed (4ms)
//!     src/fonts/broken.ttf: Malformed font: truncated font header
//!
//! dist: 12 tasks, 31 files written, 1 failure (1.31s)
//! ```
//!
//! ## Watch mode
//!
//! ```text
//! [14:02:11] Changed: src/styles/global/_buttons.scss
//! [14:02:11] ok   styles → 1 file (41ms)
//! ```
//!
//! # Architecture
//!
//! Every message has a `format_*` function (returns `Vec<String>`) for
//! testability and, where the CLI needs it, a `print_*` wrapper that writes
//! to stdout. Format functions are pure: no I/O, no clock reads except
//! [`timestamp`].

use crate::pipeline::{PipelineEvent, PipelineName, PipelineReport};
use crate::task::{TaskKind, TaskReport};
use std::path::Path;
use std::time::{Duration, SystemTime};

// ============================================================================
// Shared helpers
// ============================================================================

/// Path relative to the project root when possible.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{millis}ms")
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

/// Wall-clock `HH:MM:SS` (UTC) for watch-mode lines.
pub fn timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    format_clock(now.as_secs())
}

fn format_clock(epoch_secs: u64) -> String {
    let secs = epoch_secs % 86_400;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

// ============================================================================
// Pipeline runs
// ============================================================================

/// One task result: status line plus an indented line per failed file.
pub fn format_task_report(report: &TaskReport, root: &Path) -> Vec<String> {
    let status = if report.succeeded() { "ok  " } else { "FAIL" };
    let mut detail = plural(report.written.len(), "file");
    if !report.failures.is_empty() {
        detail.push_str(&format!(", {} failed", report.failures.len()));
    }
    let mut lines = vec![format!(
        "{status} {} → {detail} ({})",
        report.task,
        format_duration(report.duration)
    )];
    for failure in &report.failures {
        lines.push(format!(
            "    {}: {}",
            display_path(&failure.path, root),
            failure.message
        ));
    }
    lines
}

pub fn format_pipeline_event(event: &PipelineEvent, root: &Path) -> Vec<String> {
    match event {
        PipelineEvent::Cleaned(report) => vec![format!(
            "Cleaned {} ({})",
            display_path(&report.dir, root),
            plural(report.removed_files, "file")
        )],
        PipelineEvent::TaskFinished(report) => format_task_report(report, root),
        PipelineEvent::Aborted { message } => vec![format!("Aborted: {message}")],
    }
}

/// Closing line after every branch settled.
pub fn format_summary(name: PipelineName, report: &PipelineReport, elapsed: Duration) -> String {
    format!(
        "{name}: {}, {} written, {} ({})",
        plural(report.tasks.len(), "task"),
        plural(report.written_count(), "file"),
        plural(report.failure_count(), "failure"),
        format_duration(elapsed)
    )
}

pub fn print_pipeline_event(event: &PipelineEvent, root: &Path) {
    for line in format_pipeline_event(event, root) {
        println!("{line}");
    }
}

pub fn print_summary(name: PipelineName, report: &PipelineReport, elapsed: Duration) {
    println!();
    println!("{}", format_summary(name, report, elapsed));
}

// ============================================================================
// Watch mode
// ============================================================================

pub fn format_change(path: &Path, root: &Path, tasks: &[TaskKind], clock: &str) -> String {
    let names: Vec<&str> = tasks.iter().map(|t| t.name()).collect();
    format!(
        "[{clock}] Changed: {} → {}",
        display_path(path, root),
        names.join(", ")
    )
}

pub fn format_rebuild(report: &TaskReport, root: &Path, clock: &str) -> Vec<String> {
    let mut lines = format_task_report(report, root);
    if let Some(first) = lines.first_mut() {
        *first = format!("[{clock}] {first}");
    }
    lines
}

pub fn print_change(path: &Path, root: &Path, tasks: &[TaskKind]) {
    println!("{}", format_change(path, root, tasks, &timestamp()));
}

pub fn print_rebuild(report: &TaskReport, root: &Path) {
    for line in format_rebuild(report, root, &timestamp()) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::CleanReport;
    use crate::task::FileFailure;
    use std::path::PathBuf;

    fn report(task: TaskKind, written: usize, failures: Vec<FileFailure>) -> TaskReport {
        TaskReport {
            task,
            written: (0..written).map(|i| PathBuf::from(format!("/site/dist/{i}"))).collect(),
            failures,
            duration: Duration::from_millis(38),
        }
    }

    #[test]
    fn duration_switches_to_seconds() {
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
        assert_eq!(format_duration(Duration::from_millis(1240)), "1.24s");
    }

    #[test]
    fn clock_is_hours_minutes_seconds() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(86_400 + 14 * 3600 + 2 * 60 + 11), "14:02:11");
        assert_eq!(timestamp().len(), 8);
    }

    #[test]
    fn successful_task_is_one_line() {
        let lines = format_task_report(&report(TaskKind::Styles, 1, vec![]), Path::new("/site"));
        assert_eq!(lines, vec!["ok   styles → 1 file (38ms)"]);
    }

    #[test]
    fn failed_files_are_listed_relative_to_root() {
        let failures = vec![FileFailure::new("/site/src/fonts/broken.ttf", "Malformed font: x")];
        let lines = format_task_report(&report(TaskKind::TtfToWoff2, 2, failures), Path::new("/site"));
        assert_eq!(
            lines,
            vec![
                "FAIL woff2 → 2 files, 1 failed (38ms)",
                "    src/fonts/broken.ttf: Malformed font: x",
            ]
        );
    }

    #[test]
    fn clean_and_abort_events() {
        let root = Path::new("/site");
        let cleaned = PipelineEvent::Cleaned(CleanReport {
            dir: PathBuf::from("/site/dist"),
            removed_files: 14,
        });
        assert_eq!(format_pipeline_event(&cleaned, root), vec!["Cleaned dist (14 files)"]);

        let aborted = PipelineEvent::Aborted {
            message: "Refusing to clean x: not a directory".into(),
        };
        assert_eq!(
            format_pipeline_event(&aborted, root),
            vec!["Aborted: Refusing to clean x: not a directory"]
        );
    }

    #[test]
    fn summary_counts_everything() {
        let summary = PipelineReport {
            tasks: vec![
                report(TaskKind::Styles, 1, vec![]),
                report(TaskKind::Sprite, 2, vec![FileFailure::new("/site/src/img/sprite/x.svg", "bad")]),
            ],
            cleaned: vec![],
            aborted: vec![],
        };
        assert_eq!(
            format_summary(PipelineName::Dist, &summary, Duration::from_millis(1310)),
            "dist: 2 tasks, 3 files written, 1 failure (1.31s)"
        );
    }

    #[test]
    fn watch_lines_carry_clock() {
        let root = Path::new("/site");
        assert_eq!(
            format_change(
                Path::new("/site/src/styles/_a.scss"),
                root,
                &[TaskKind::Styles],
                "14:02:11"
            ),
            "[14:02:11] Changed: src/styles/_a.scss → styles"
        );
        let lines = format_rebuild(&report(TaskKind::Styles, 1, vec![]), root, "14:02:11");
        assert_eq!(lines, vec!["[14:02:11] ok   styles → 1 file (38ms)"]);
    }
}
