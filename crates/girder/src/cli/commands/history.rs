//! Task history command

use clap::{Args, Subcommand};
use console::style;
use tracing::info;

use girder_tasks::{HistoryRecord, HistoryStats};

use crate::cli::{output, Cli};

/// Inspect or clear the task history of this build
#[derive(Debug, Args)]
pub struct HistoryCommand {
    #[command(subcommand)]
    pub action: HistoryAction,
}

/// History subcommands
#[derive(Debug, Subcommand)]
pub enum HistoryAction {
    /// Show the recorded task executions
    Status(HistoryStatusCommand),
    /// Forget every recorded task execution
    Clear(HistoryClearCommand),
}

/// Show the recorded task executions
#[derive(Debug, Args)]
pub struct HistoryStatusCommand;

/// Forget every recorded task execution
#[derive(Debug, Args)]
pub struct HistoryClearCommand {
    /// Skip confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl HistoryCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.action {
            HistoryAction::Status(cmd) => cmd.execute(cli),
            HistoryAction::Clear(cmd) => cmd.execute(cli),
        }
    }
}

impl HistoryStatusCommand {
    fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing history status command");
        let build = cli.load_build()?;
        let tracker = cli.tracker(&build.config)?;
        let stats = tracker.status(&build.root_dir)?;

        if !cli.is_text() {
            return output::json(&status_json(&stats));
        }
        if cli.quiet {
            return Ok(());
        }

        println!("{}", output::header("Task History"));
        println!();
        println!("  Location: {}", style(stats.dir.display()).cyan());
        println!("  Records:  {}", stats.records.len());
        if let Some(newest) = stats.newest() {
            println!("  Newest:   {}", style(newest.format("%Y-%m-%d %H:%M:%S UTC")).yellow());
        }
        if cli.verbose && !stats.records.is_empty() {
            println!();
            for record in &stats.records {
                println!("  {} {}", output::path_style().apply_to(&record.task), recorded_at(record));
            }
        }
        Ok(())
    }
}

impl HistoryClearCommand {
    fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(yes = self.yes, "executing history clear command");
        let build = cli.load_build()?;
        let tracker = cli.tracker(&build.config)?;
        let dir = tracker.build_dir(&build.root_dir);

        if !dir.exists() {
            if cli.is_text() && !cli.quiet {
                output::success("No task history recorded.");
            } else if !cli.is_text() {
                output::json(&serde_json::json!({ "removed": 0 }))?;
            }
            return Ok(());
        }

        if !self.yes {
            let confirmed = dialoguer::Confirm::new()
                .with_prompt(format!("Forget every task execution recorded at {}?", dir.display()))
                .default(false)
                .interact()?;

            if !confirmed {
                println!("{}", style("Aborted.").yellow());
                return Ok(());
            }
        }

        let removed = tracker.clear(&build.root_dir)?;

        if !cli.is_text() {
            output::json(&serde_json::json!({
                "dir": dir.display().to_string(),
                "removed": removed,
            }))?;
        } else if !cli.quiet {
            output::success(&format!(
                "Removed {} record{} at {}",
                removed,
                if removed == 1 { "" } else { "s" },
                output::path_style().apply_to(dir.display())
            ));
        }
        Ok(())
    }
}

fn recorded_at(record: &HistoryRecord) -> String {
    record
        .recorded_at()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| record.timestamp.to_string())
}

fn status_json(stats: &HistoryStats) -> serde_json::Value {
    let records: Vec<serde_json::Value> = stats
        .records
        .iter()
        .map(|r| {
            serde_json::json!({
                "task": r.task,
                "timestamp": r.timestamp,
                "recorded_at": r.recorded_at().map(|t| t.to_rfc3339()),
            })
        })
        .collect();

    serde_json::json!({
        "dir": stats.dir.display().to_string(),
        "records": records,
        "newest": stats.newest().map(|t| t.to_rfc3339()),
    })
}
