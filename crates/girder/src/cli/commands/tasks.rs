//! Tasks command

use clap::Args;
use console::style;
use tracing::info;

use girder_core::project::ProjectPath;
use girder_core::task::Task;

use crate::cli::{output, Cli};

/// List tasks and their dependencies
#[derive(Debug, Args)]
pub struct TasksCommand {
    /// Only list the tasks of this project
    #[arg(long, short)]
    pub project: Option<String>,
}

impl TasksCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(project = ?self.project, "executing tasks command");
        let build = cli.load_build()?;

        let filter = self
            .project
            .as_deref()
            .map(ProjectPath::parse)
            .transpose()?;
        if let Some(path) = &filter {
            build.workspace.project(path)?;
        }
        let projects: Vec<_> = build
            .workspace
            .projects()
            .filter(|p| filter.as_ref().map_or(true, |f| p.path() == f))
            .collect();

        if !cli.is_text() {
            let tasks: Vec<serde_json::Value> = projects
                .iter()
                .flat_map(|project| project.tasks.iter().map(task_json))
                .collect();
            return output::json(&serde_json::json!({ "tasks": tasks }));
        }
        if cli.quiet {
            return Ok(());
        }

        for project in projects {
            if project.tasks.is_empty() {
                continue;
            }
            println!(
                "{}",
                output::header(&format!("Tasks of project {}", project.path()))
            );
            for task in project.tasks.iter() {
                let description = task
                    .description
                    .as_deref()
                    .map(|d| style(format!(" - {}", d)).dim().to_string())
                    .unwrap_or_default();
                println!("  {}{}", output::path_style().apply_to(task.path()), description);

                if cli.verbose || !task.dependencies().is_empty() {
                    let deps: Vec<String> =
                        task.dependencies().iter().map(|d| d.to_string()).collect();
                    if !deps.is_empty() {
                        println!("      after: {}", deps.join(", "));
                    }
                }
                if cli.verbose {
                    for action in task.actions() {
                        println!("      action: {}", action.label);
                    }
                    if !task.outputs().is_empty() {
                        println!("      outputs: {}", task.outputs().join(", "));
                    }
                }
            }
            println!();
        }
        Ok(())
    }
}

fn task_json(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "path": task.path().to_string(),
        "description": task.description,
        "dependencies": task.dependencies().iter().map(|d| d.to_string()).collect::<Vec<_>>(),
        "cross_project": task.cross_project_dependencies(),
        "actions": task.actions().iter().map(|a| a.label.as_str()).collect::<Vec<_>>(),
        "outputs": task.outputs(),
    })
}
