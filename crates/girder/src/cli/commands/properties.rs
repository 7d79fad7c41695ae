//! Properties command

use anyhow::Context;
use clap::Args;
use console::style;
use tracing::info;

use girder_core::conventions::{ConventionAware, PropertySource, ResolvedProperty};
use girder_core::project::ProjectPath;
use girder_core::task::TaskPath;

use crate::cli::{output, Cli};

/// Resolve every mapped property of a task or source set
#[derive(Debug, Args)]
pub struct PropertiesCommand {
    /// Task path (`:core:compile`), or a project path with --source-set
    pub target: String,

    /// Resolve the properties of this source set of the target project
    #[arg(long)]
    pub source_set: Option<String>,
}

impl PropertiesCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(target = %self.target, source_set = ?self.source_set, "executing properties command");
        let build = cli.load_build()?;

        let (subject, resolved) = match &self.source_set {
            Some(name) => {
                let path = ProjectPath::parse(&self.target)?;
                let project = build.workspace.project(&path)?;
                let source_set = project
                    .source_set(name)
                    .with_context(|| format!("Project {} has no source set '{}'", path, name))?;
                (
                    source_set.display_name(),
                    source_set.resolve_all(project.conventions()),
                )
            }
            None => {
                let path = TaskPath::resolve(&ProjectPath::root(), &self.target)?;
                let (project, task) = build
                    .workspace
                    .find_task(&path)
                    .with_context(|| format!("Task '{}' not found", path))?;
                (task.display_name(), task.resolve_all(project.conventions()))
            }
        };

        if !cli.is_text() {
            let properties: Vec<serde_json::Value> = resolved.iter().map(property_json).collect();
            return output::json(&serde_json::json!({
                "subject": subject,
                "properties": properties,
            }));
        }
        if cli.quiet {
            return Ok(());
        }

        println!("{}", output::header(&format!("Properties of {}", subject)));
        if resolved.is_empty() {
            println!("  {}", style("(none)").dim());
        }
        for property in &resolved {
            let source = match property.source {
                PropertySource::Explicit => style("explicit").green(),
                PropertySource::Convention => output::convention_style().apply_to("convention"),
            };
            match &property.value {
                Ok(value) => println!("  {} = {} ({})", style(&property.name).bold(), value, source),
                Err(e) => println!(
                    "  {} {} ({})",
                    style(&property.name).bold(),
                    style(format!("unresolved: {}", e)).red(),
                    source
                ),
            }
        }
        Ok(())
    }
}

fn property_json(property: &ResolvedProperty) -> serde_json::Value {
    match &property.value {
        Ok(value) => serde_json::json!({
            "name": property.name,
            "source": property.source,
            "value": value,
        }),
        Err(e) => serde_json::json!({
            "name": property.name,
            "source": property.source,
            "error": e.to_string(),
        }),
    }
}
