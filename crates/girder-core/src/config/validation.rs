//! Build file validation

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::project::ProjectPath;
use crate::task::TaskPath;

use super::types::{Config, ProjectConfig, TaskConfig};

/// Validate a build description.
///
/// Checks what can be checked without applying plugins: paths, duplicates,
/// references to undeclared projects and empty values. Configuration
/// hierarchies are checked when the workspace is built, since plugins
/// contribute configurations.
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_build(config)?;

    let declared = declared_projects(config)?;
    for (i, project) in config.projects.iter().enumerate() {
        validate_project(project, &format!("projects[{}]", i), &declared)?;
    }
    debug!("configuration validation passed");
    Ok(())
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

fn validate_build(config: &Config) -> Result<()> {
    if config.build.build_dir.trim().is_empty() {
        return Err(invalid("build.build_dir", "build directory cannot be empty").into());
    }
    if config.build.plugins.iter().any(|p| p.trim().is_empty()) {
        return Err(invalid("build.plugins", "plugin id cannot be empty").into());
    }
    Ok(())
}

/// Paths of every declared project plus the implicit root
fn declared_projects(config: &Config) -> Result<BTreeSet<ProjectPath>> {
    let mut declared = BTreeSet::new();
    let mut seen = BTreeSet::new();
    declared.insert(ProjectPath::root());

    for (i, project) in config.projects.iter().enumerate() {
        let path = ProjectPath::parse(&project.path)
            .map_err(|e| invalid(format!("projects[{}].path", i), e.to_string()))?;
        if !seen.insert(path.clone()) {
            return Err(invalid(
                format!("projects[{}].path", i),
                format!("project '{}' is declared more than once", path),
            )
            .into());
        }
        declared.insert(path);
    }

    for path in declared.iter().filter(|p| !p.is_root()) {
        if let Some(parent) = path.parent() {
            if !declared.contains(&parent) {
                return Err(invalid(
                    "projects",
                    format!("parent project '{}' of '{}' is not declared", parent, path),
                )
                .into());
            }
        }
    }
    Ok(declared)
}

fn validate_project(
    project: &ProjectConfig,
    field: &str,
    declared: &BTreeSet<ProjectPath>,
) -> Result<()> {
    let path = ProjectPath::parse(&project.path)
        .map_err(|e| invalid(format!("{}.path", field), e.to_string()))?;

    if let Some(build_dir) = &project.build_dir {
        if build_dir.trim().is_empty() {
            return Err(invalid(format!("{}.build_dir", field), "build directory cannot be empty").into());
        }
    }

    for (name, configuration) in &project.configurations {
        let field = format!("{}.configurations.{}", field, name);
        if configuration.extends.iter().any(|parent| parent == name) {
            return Err(invalid(format!("{}.extends", field), "a configuration cannot extend itself").into());
        }
        for dependency in &configuration.dependencies {
            if dependency.trim().is_empty() {
                return Err(invalid(format!("{}.dependencies", field), "dependency cannot be empty").into());
            }
            if dependency.starts_with(ProjectPath::SEPARATOR) {
                let target = ProjectPath::parse(dependency)
                    .map_err(|e| invalid(format!("{}.dependencies", field), e.to_string()))?;
                if !declared.contains(&target) {
                    return Err(invalid(
                        format!("{}.dependencies", field),
                        format!("project '{}' is not declared", target),
                    )
                    .into());
                }
            }
        }
    }

    let mut names = BTreeSet::new();
    for (i, task) in project.tasks.iter().enumerate() {
        let field = format!("{}.tasks[{}]", field, i);
        if !names.insert(task.name.as_str()) {
            return Err(invalid(
                format!("{}.name", field),
                format!("task '{}' is declared more than once", task.name),
            )
            .into());
        }
        validate_task(task, &path, &field)?;
    }
    Ok(())
}

fn validate_task(task: &TaskConfig, project: &ProjectPath, field: &str) -> Result<()> {
    if !ProjectPath::is_valid_segment(&task.name) {
        return Err(invalid(
            format!("{}.name", field),
            "task name must be a local name without ':', '/' or '\\' and not '.' or '..'",
        )
        .into());
    }
    if let Some(command) = &task.command {
        if command.trim().is_empty() {
            return Err(invalid(format!("{}.command", field), "command cannot be empty").into());
        }
    }

    for (key, entries) in [("depends_on", &task.depends_on), ("stale_after", &task.stale_after)] {
        for entry in entries {
            TaskPath::resolve(project, entry)
                .map_err(|e| invalid(format!("{}.{}", field, key), e.to_string()))?;
        }
    }

    for dependency in &task.depends_on_projects {
        if dependency.task.trim().is_empty() || dependency.configuration.trim().is_empty() {
            return Err(invalid(
                format!("{}.depends_on_projects", field),
                "task and configuration are required",
            )
            .into());
        }
    }

    for output in &task.outputs {
        if output.trim().is_empty() {
            return Err(invalid(format!("{}.outputs", field), "output property name cannot be empty").into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigurationConfig, ProjectConfig, TaskConfig};

    fn config() -> Config {
        let mut core = ProjectConfig::new(":core");
        core.tasks.push(TaskConfig::new("compile").with_command("make"));

        let mut app = ProjectConfig::new(":app");
        app.configurations.insert(
            "compile".to_string(),
            ConfigurationConfig {
                dependencies: vec![":core".to_string(), "junit:junit:4.4".to_string()],
                ..Default::default()
            },
        );
        app.tasks.push(
            TaskConfig::new("compile")
                .with_depends_on(":core:compile")
                .with_stale_after(":core:compile"),
        );

        Config {
            projects: vec![core, app],
            ..Default::default()
        }
    }

    fn field_of(err: crate::error::GirderError) -> String {
        match err {
            crate::error::GirderError::Config(ConfigError::InvalidValue { field, .. }) => field,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
        assert!(validate_config(&config()).is_ok());
    }

    #[test]
    fn test_invalid_project_path() {
        let mut config = config();
        config.projects[0].path = "core".to_string();
        assert_eq!(field_of(validate_config(&config).unwrap_err()), "projects[0].path");
    }

    #[test]
    fn test_duplicate_project() {
        let mut config = config();
        config.projects.push(ProjectConfig::new(":core"));
        assert_eq!(field_of(validate_config(&config).unwrap_err()), "projects[2].path");
    }

    #[test]
    fn test_missing_parent() {
        let mut config = config();
        config.projects.push(ProjectConfig::new(":libs:json"));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_dependency_on_undeclared_project() {
        let mut config = config();
        config.projects[1]
            .configurations
            .get_mut("compile")
            .unwrap()
            .dependencies
            .push(":db".to_string());
        assert_eq!(
            field_of(validate_config(&config).unwrap_err()),
            "projects[1].configurations.compile.dependencies"
        );
    }

    #[test]
    fn test_empty_command() {
        let mut config = config();
        config.projects[0].tasks[0].command = Some("  ".to_string());
        assert_eq!(
            field_of(validate_config(&config).unwrap_err()),
            "projects[0].tasks[0].command"
        );
    }

    #[test]
    fn test_duplicate_task() {
        let mut config = config();
        config.projects[0].tasks.push(TaskConfig::new("compile"));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_task_name_cannot_leave_the_project() {
        for name in ["../../escaped", "..", "gen/sources"] {
            let mut config = config();
            config.projects[0].tasks.push(TaskConfig::new(name));
            assert_eq!(
                field_of(validate_config(&config).unwrap_err()),
                "projects[0].tasks[1].name"
            );
        }
    }

    #[test]
    fn test_malformed_task_reference() {
        let mut config = config();
        config.projects[1].tasks[0].stale_after.push(":core:".to_string());
        assert_eq!(
            field_of(validate_config(&config).unwrap_err()),
            "projects[1].tasks[0].stale_after"
        );
    }

    #[test]
    fn test_self_extension() {
        let mut config = config();
        config.projects[1]
            .configurations
            .get_mut("compile")
            .unwrap()
            .extends
            .push("compile".to_string());
        assert!(validate_config(&config).is_err());
    }
}
