//! Run command: execute tasks and everything they depend on

use std::sync::Arc;

use clap::Args;
use console::style;
use tracing::info;

use girder_tasks::{
    ExecutorOptions, TaskDag, TaskEvent, TaskExecutor, TaskReporter, TaskReporterRegistry,
    TaskResult, TaskStatus,
};

use crate::cli::{output, Cli};

/// Returned when at least one task failed
#[derive(Debug, thiserror::Error)]
#[error("{0} task{} failed", if *.0 == 1 { "" } else { "s" })]
pub struct TasksFailed(pub usize);

/// Run tasks and everything they depend on
#[derive(Debug, Args)]
pub struct RunCommand {
    /// Task names (run in every project) or task paths (e.g. build :core:test)
    #[arg(required = true)]
    pub tasks: Vec<String>,

    /// Show what would run without running anything
    #[arg(long)]
    pub dry_run: bool,

    /// Keep running tasks that do not depend on a failed one
    #[arg(long)]
    pub continue_on_error: bool,

    /// Run every task even when its output is up to date
    #[arg(long)]
    pub rerun_tasks: bool,
}

impl RunCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(tasks = ?self.tasks, dry_run = self.dry_run, "executing run command");
        let mut build = cli.load_build()?;
        let tracker = cli.tracker(&build.config)?;
        tracker.track_declared_outputs(&mut build.workspace, &build.config)?;

        let mut requested = Vec::new();
        for request in &self.tasks {
            requested.extend(TaskDag::select(&build.workspace, request)?);
        }
        let dag = TaskDag::build(&build.workspace, &requested)?;

        if cli.is_text() && !cli.quiet {
            println!(
                "{} {} task{} in {}",
                style("→").blue(),
                dag.len(),
                if dag.len() == 1 { "" } else { "s" },
                output::path_style().apply_to(build.root_dir.display())
            );
            if cli.verbose || self.dry_run {
                println!();
                print!("{}", dag.execution_plan());
            }
            if self.dry_run {
                println!("{}", style("[DRY RUN - no actions will run]").yellow().bold());
            }
            println!();
        }

        let mut reporters = TaskReporterRegistry::new();
        if cli.is_text() && !cli.quiet {
            reporters.register(ConsoleReporter::new(cli.verbose));
        }
        let options = ExecutorOptions {
            continue_on_error: self.continue_on_error,
            dry_run: self.dry_run,
            rerun_tasks: self.rerun_tasks,
        };
        let executor = TaskExecutor::new(options, Some(tracker), Arc::new(reporters));
        let results = executor.execute(&mut build.workspace, &dag);

        if !cli.is_text() {
            output::json(&summary_json(&results))?;
        }

        let failed: Vec<&TaskResult> = results
            .iter()
            .filter(|r| matches!(r.status, TaskStatus::Failed(_)))
            .collect();
        if failed.is_empty() {
            return Ok(());
        }

        if cli.is_text() && !cli.quiet {
            println!();
            for result in &failed {
                if let TaskStatus::Failed(error) = &result.status {
                    println!("    {} {}: {}", style("✗").red(), result.path, error);
                }
            }
        }
        Err(TasksFailed(failed.len()).into())
    }
}

fn summary_json(results: &[TaskResult]) -> serde_json::Value {
    let tasks: Vec<serde_json::Value> = results
        .iter()
        .map(|r| {
            let (status, detail) = match &r.status {
                TaskStatus::Success { did_work: true } => ("executed", None),
                TaskStatus::Success { did_work: false } => ("no-work", None),
                TaskStatus::UpToDate => ("up-to-date", None),
                TaskStatus::Failed(error) => ("failed", Some(error.as_str())),
                TaskStatus::Skipped(reason) => ("skipped", Some(reason.as_str())),
            };
            serde_json::json!({
                "path": r.path.to_string(),
                "status": status,
                "detail": detail,
                "duration_ms": r.duration.as_millis() as u64,
            })
        })
        .collect();

    serde_json::json!({
        "total": results.len(),
        "succeeded": results.iter().filter(|r| r.status.is_success()).count(),
        "failed": results.iter().filter(|r| matches!(r.status, TaskStatus::Failed(_))).count(),
        "tasks": tasks,
    })
}

/// Console reporter, one line per task
struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl TaskReporter for ConsoleReporter {
    fn report(&self, event: &TaskEvent) {
        match event {
            TaskEvent::Started { path, actions } => {
                if self.verbose {
                    println!(
                        "  {} {} {}",
                        style("▸").dim(),
                        style(path).bold(),
                        style(format!("({} actions)", actions)).dim()
                    );
                }
            }
            TaskEvent::Completed {
                path,
                duration,
                did_work,
            } => {
                let note = if *did_work { "" } else { " (no work)" };
                println!(
                    "  {} {}{} {}",
                    style("✓").green(),
                    style(path).green(),
                    style(note).dim(),
                    style(format!("{:.1}s", duration.as_secs_f64())).dim()
                );
            }
            TaskEvent::UpToDate { path } => {
                println!(
                    "  {} {} {}",
                    style("✓").green(),
                    style(path).green(),
                    style("UP-TO-DATE").cyan()
                );
            }
            TaskEvent::Failed {
                path,
                duration,
                error,
            } => {
                println!(
                    "  {} {} {} {}",
                    style("✗").red(),
                    style(path).red(),
                    style(format!("{:.1}s", duration.as_secs_f64())).dim(),
                    style(error).red().dim()
                );
            }
            TaskEvent::Skipped { path, reason } => {
                println!(
                    "  {} {} {}",
                    style("○").yellow(),
                    style(path).yellow(),
                    style(format!("({})", reason)).dim()
                );
            }
            TaskEvent::AllCompleted {
                total,
                executed,
                up_to_date,
                failed,
                skipped,
                duration,
            } => {
                println!();
                println!(
                    "  {} {} tasks: {} executed, {} up to date, {} failed, {} skipped ({:.1}s)",
                    if *failed == 0 {
                        style("✓").green().bold()
                    } else {
                        style("✗").red().bold()
                    },
                    total,
                    executed,
                    up_to_date,
                    failed,
                    skipped,
                    duration.as_secs_f64()
                );
            }
        }
    }
}
