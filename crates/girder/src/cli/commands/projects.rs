//! Projects command

use clap::Args;
use console::style;
use tracing::info;

use girder_core::project::{Project, ProjectGraph};

use crate::cli::{output, Cli};

/// List projects, configurations and project dependencies
#[derive(Debug, Args)]
pub struct ProjectsCommand {
    /// Also list configurations and their dependencies
    #[arg(long)]
    pub configurations: bool,
}

impl ProjectsCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing projects command");
        let build = cli.load_build()?;
        let graph = ProjectGraph::build(&build.workspace);

        if !cli.is_text() {
            let projects: Vec<serde_json::Value> = build
                .workspace
                .projects()
                .map(|project| project_json(project, &graph))
                .collect();
            return output::json(&serde_json::json!({
                "root": build.root_dir.display().to_string(),
                "projects": projects,
                "order": graph.sorted().iter().map(|p| p.to_string()).collect::<Vec<_>>(),
                "max_depth": graph.max_depth(),
            }));
        }
        if cli.quiet {
            return Ok(());
        }

        println!("{}", output::header("Projects"));
        println!();
        for project in build.workspace.projects() {
            let label = match &project.description {
                Some(description) => format!(
                    "{} {}",
                    output::path_style().apply_to(project.path()),
                    style(format!("- {}", description)).dim()
                ),
                None => output::path_style().apply_to(project.path()).to_string(),
            };
            println!("{}", label);
            println!(
                "{}",
                output::key_value("dir", &project.project_dir().display().to_string())
            );

            let plugins: Vec<&str> = project.applied_plugins().collect();
            if !plugins.is_empty() {
                println!("{}", output::key_value("plugins", &plugins.join(", ")));
            }

            let dependencies = graph.dependencies(project.path());
            if !dependencies.is_empty() {
                println!("{}", output::key_value("depends on", &join(dependencies.iter())));
            }
            let dependents = graph.dependents(project.path());
            if !dependents.is_empty() {
                println!("{}", output::key_value("used by", &join(dependents.iter())));
            }

            if self.configurations || cli.verbose {
                print_configurations(project);
            }
            println!();
        }

        println!(
            "{}",
            output::key_value("order", &join(graph.sorted().iter()))
        );
        Ok(())
    }
}

fn join<T: std::fmt::Display>(items: impl Iterator<Item = T>) -> String {
    items.map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}

fn print_configurations(project: &Project) {
    for configuration in project.configurations.iter() {
        let mut line = format!("    {}", style(&configuration.name).bold());
        if !configuration.extends_from().is_empty() {
            line.push_str(&format!(
                " {}",
                style(format!("extends {}", configuration.extends_from().join(", "))).dim()
            ));
        }
        if !configuration.transitive {
            line.push_str(&format!(" {}", style("(non-transitive)").dim()));
        }
        println!("{}", line);
        for dependency in configuration.dependencies() {
            println!("      - {}", dependency);
        }
    }
}

fn project_json(project: &Project, graph: &ProjectGraph) -> serde_json::Value {
    let configurations: Vec<serde_json::Value> = project
        .configurations
        .iter()
        .map(|c| {
            serde_json::json!({
                "name": c.name,
                "description": c.description,
                "extends": c.extends_from(),
                "transitive": c.transitive,
                "visible": c.visible,
                "dependencies": c.dependencies().iter().map(|d| d.to_string()).collect::<Vec<_>>(),
            })
        })
        .collect();

    serde_json::json!({
        "path": project.path().to_string(),
        "dir": project.project_dir().display().to_string(),
        "description": project.description,
        "plugins": project.applied_plugins().collect::<Vec<_>>(),
        "configurations": configurations,
        "dependencies": graph.dependencies(project.path()).iter().map(|p| p.to_string()).collect::<Vec<_>>(),
        "dependents": graph.dependents(project.path()).iter().map(|p| p.to_string()).collect::<Vec<_>>(),
        "depth": graph.get(project.path()).map(|n| n.depth),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use girder_core::config::{ConfigurationConfig, Config, ProjectConfig};
    use girder_core::plugins::PluginRegistry;
    use girder_core::project::{ProjectPath, Workspace};

    #[test]
    fn test_project_json() {
        let mut app = ProjectConfig::new(":app");
        app.configurations.insert(
            "compile".to_string(),
            ConfigurationConfig {
                dependencies: vec![":core".to_string()],
                ..Default::default()
            },
        );
        let config = Config {
            projects: vec![ProjectConfig::new(":core"), app],
            ..Default::default()
        };
        let workspace =
            Workspace::from_config("/r", &config, &PluginRegistry::with_builtins()).unwrap();
        let graph = ProjectGraph::build(&workspace);

        let core = workspace.project(&ProjectPath::parse(":core").unwrap()).unwrap();
        let json = project_json(core, &graph);
        assert_eq!(json["dependents"], serde_json::json!([":app"]));
        assert_eq!(json["depth"], serde_json::json!(0));

        let app = workspace.project(&ProjectPath::parse(":app").unwrap()).unwrap();
        let json = project_json(app, &graph);
        assert_eq!(json["configurations"][0]["name"], "compile");
        assert_eq!(json["dependencies"], serde_json::json!([":core"]));
    }
}
