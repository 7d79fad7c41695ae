//! Init command

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use console::style;
use dialoguer::{Confirm, Select};
use tracing::info;

use girder_core::config::{
    Config, DEFAULT_CONFIG_TEMPLATE_TOML, DEFAULT_CONFIG_TEMPLATE_YAML, DEFAULT_CONFIG_TOML,
    DEFAULT_CONFIG_YAML,
};

use crate::cli::{output, Cli};

/// Build file syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Syntax {
    Toml,
    Yaml,
}

impl Syntax {
    fn file_name(self) -> &'static str {
        match self {
            Syntax::Toml => DEFAULT_CONFIG_TOML,
            Syntax::Yaml => DEFAULT_CONFIG_YAML,
        }
    }

    fn template(self) -> &'static str {
        match self {
            Syntax::Toml => DEFAULT_CONFIG_TEMPLATE_TOML,
            Syntax::Yaml => DEFAULT_CONFIG_TEMPLATE_YAML,
        }
    }
}

/// Write a starter build file
#[derive(Debug, Args)]
pub struct InitCommand {
    /// Force overwrite existing build file
    #[arg(short, long)]
    pub force: bool,

    /// Use defaults without prompting
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Build file syntax (prompted when omitted)
    #[arg(long, value_enum)]
    pub syntax: Option<Syntax>,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl InitCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(force = self.force, yes = self.yes, "executing init command");
        let cwd = std::env::current_dir()?;

        let syntax = match self.syntax {
            Some(syntax) => syntax,
            None if self.yes => Syntax::Toml,
            None => {
                let syntaxes = [Syntax::Toml, Syntax::Yaml];
                let selection = Select::new()
                    .with_prompt("Build file syntax")
                    .items(&["toml", "yaml"])
                    .default(0)
                    .interact()?;
                syntaxes[selection]
            }
        };

        let config_path = self
            .output
            .clone()
            .unwrap_or_else(|| cwd.join(syntax.file_name()));

        if config_path.exists() && !self.force {
            if self.yes {
                anyhow::bail!(
                    "Build file already exists at {}. Use --force to overwrite.",
                    config_path.display()
                );
            }

            let overwrite = Confirm::new()
                .with_prompt(format!(
                    "Build file already exists at {}. Overwrite?",
                    config_path.display()
                ))
                .default(false)
                .interact()?;

            if !overwrite {
                println!("{}", style("Aborted.").yellow());
                return Ok(());
            }
        }

        std::fs::write(&config_path, syntax.template())?;
        info!(path = %config_path.display(), "build file written");

        if !cli.is_text() {
            let projects = starter_projects(syntax)?;
            output::json(&serde_json::json!({
                "path": config_path.display().to_string(),
                "projects": projects,
            }))?;
        } else if !cli.quiet {
            output::success(&format!(
                "Created {}",
                output::path_style().apply_to(config_path.display())
            ));
            println!();
            println!("Next steps:");
            println!("  1. Declare your projects and their configurations");
            println!("  2. Run {} to see the configured tasks", style("girder tasks").cyan());
            println!("  3. Run {} to build", style("girder run build").cyan());
        }

        Ok(())
    }
}

fn starter_projects(syntax: Syntax) -> anyhow::Result<Vec<String>> {
    let config: Config = match syntax {
        Syntax::Toml => toml::from_str(syntax.template())?,
        Syntax::Yaml => serde_yaml::from_str(syntax.template())?,
    };
    Ok(config.projects.into_iter().map(|p| p.path).collect())
}
