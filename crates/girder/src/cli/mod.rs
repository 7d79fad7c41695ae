//! CLI definition and command handling

pub mod commands;
pub mod output;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;

use girder_core::config::{default_user_home, load_config_from_dir, Config, USER_HOME_ENV};
use girder_core::plugins::PluginRegistry;
use girder_core::project::Workspace;
use girder_tasks::OutputStalenessTracker;

use commands::{
    CompletionsCommand, HistoryCommand, InitCommand, ProjectsCommand, PropertiesCommand,
    RunCommand, TasksCommand,
};

/// Girder - Build orchestration with convention mapping and incremental tasks
#[derive(Debug, Parser)]
#[command(name = "girder")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// User home holding the task history (default: ~/.girder)
    #[arg(long, global = true, env = USER_HOME_ENV)]
    pub user_home: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a starter build file
    Init(InitCommand),

    /// List projects, configurations and project dependencies
    Projects(ProjectsCommand),

    /// List tasks and their dependencies
    Tasks(TasksCommand),

    /// Resolve the properties of a task or source set
    Properties(PropertiesCommand),

    /// Run tasks and everything they depend on
    Run(RunCommand),

    /// Inspect or clear the task history of this build
    History(HistoryCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

/// A configured build
pub struct Build {
    pub config: Config,
    pub root_dir: PathBuf,
    pub workspace: Workspace,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(&self) -> anyhow::Result<()> {
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)
                .with_context(|| format!("Cannot change to directory {}", dir.display()))?;
        }

        match &self.command {
            Commands::Init(cmd) => cmd.execute(self),
            Commands::Projects(cmd) => cmd.execute(self),
            Commands::Tasks(cmd) => cmd.execute(self),
            Commands::Properties(cmd) => cmd.execute(self),
            Commands::Run(cmd) => cmd.execute(self),
            Commands::History(cmd) => cmd.execute(self),
            Commands::Completions(cmd) => cmd.execute(self),
        }
    }

    /// Load the build file governing the working directory and configure
    /// every project
    pub fn load_build(&self) -> anyhow::Result<Build> {
        let cwd = std::env::current_dir()?;
        let (config, root_dir) = load_config_from_dir(&cwd)?;
        debug!(root = %root_dir.display(), "configuring build");

        let workspace = Workspace::from_config(&root_dir, &config, &PluginRegistry::with_builtins())?;
        Ok(Build {
            config,
            root_dir,
            workspace,
        })
    }

    pub fn user_home(&self) -> anyhow::Result<PathBuf> {
        self.user_home
            .clone()
            .or_else(default_user_home)
            .context("Cannot determine the user home; pass --user-home")
    }

    /// Staleness tracker for a build
    pub fn tracker(&self, config: &Config) -> anyhow::Result<OutputStalenessTracker> {
        let history_root = config.build.history_root(&self.user_home()?);
        Ok(OutputStalenessTracker::new(history_root))
    }

    pub fn is_text(&self) -> bool {
        self.format == OutputFormat::Text
    }
}
