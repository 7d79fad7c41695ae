//! Cross-project task dependencies
//!
//! A task may depend on the same-named task of every project related to its
//! own project through a named configuration: the projects the configuration
//! depends on, or the projects whose same-named configuration depends back on
//! this one. Related projects without such a task are skipped.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{ProjectError, Result, TaskError};
use crate::project::{ProjectPath, Workspace};
use crate::task::TaskPath;

/// Which way to walk configuration edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Projects the configuration depends on
    DependedOn,
    /// Projects whose configuration depends on this project
    Dependents,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DependedOn => f.write_str("depended-on"),
            Self::Dependents => f.write_str("dependents"),
        }
    }
}

/// A declared, not yet expanded cross-project dependency of a task
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrossProjectDependency {
    /// Name of the task to depend on in each related project
    pub task: String,
    /// Configuration whose edges are followed
    pub configuration: String,
    pub direction: Direction,
}

impl CrossProjectDependency {
    pub fn new(direction: Direction, task: impl Into<String>, configuration: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            configuration: configuration.into(),
            direction,
        }
    }
}

/// Computes cross-project edges over a read-only view of the workspace
pub struct CrossProjectDependencyExpander<'a> {
    workspace: &'a Workspace,
}

impl<'a> CrossProjectDependencyExpander<'a> {
    pub fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// Projects related to `project` through `configuration`, each listed
    /// once, never including `project` itself
    pub fn related_projects(
        &self,
        project: &ProjectPath,
        direction: Direction,
        configuration: &str,
    ) -> Result<Vec<ProjectPath>> {
        let owner = self.workspace.project(project)?;
        let mut visited: HashSet<ProjectPath> = HashSet::new();
        visited.insert(project.clone());

        let candidates = match direction {
            Direction::DependedOn => owner.configurations.project_dependencies(configuration)?,
            Direction::Dependents => {
                // fail early when the owning project lacks the configuration
                owner.configurations.get(configuration)?;

                let mut dependents = Vec::new();
                for other in self.workspace.projects() {
                    if other.path() == project || !other.configurations.contains(configuration) {
                        continue;
                    }
                    if other
                        .configurations
                        .project_dependencies(configuration)?
                        .contains(project)
                    {
                        dependents.push(other.path().clone());
                    }
                }
                dependents
            }
        };

        let mut related = Vec::new();
        for candidate in candidates {
            if !visited.insert(candidate.clone()) {
                continue;
            }
            if self.workspace.find_project(&candidate).is_none() {
                return Err(ProjectError::NotFound(candidate.to_string()).into());
            }
            related.push(candidate);
        }
        Ok(related)
    }

    /// Dependency edges `task` gains from the declaration: the task named
    /// `task_name` in each related project that has one
    #[instrument(skip(self, task), fields(task = %task))]
    pub fn expand(
        &self,
        task: &TaskPath,
        direction: Direction,
        task_name: &str,
        configuration: &str,
    ) -> Result<Vec<TaskPath>> {
        if self.workspace.find_task(task).is_none() {
            return Err(TaskError::NotFound(task.to_string()).into());
        }

        let mut edges = Vec::new();
        for related in self.related_projects(&task.project, direction, configuration)? {
            let project = self.workspace.project(&related)?;
            if project.tasks.contains(task_name) {
                edges.push(TaskPath::new(related, task_name));
            } else {
                debug!(project = %related, task_name, "no same-named task, skipping");
            }
        }
        Ok(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Dependency;

    fn p(s: &str) -> ProjectPath {
        ProjectPath::parse(s).unwrap()
    }

    /// `:p1` compile depends on `:p2`; `:p3` compile depends on `:p1`
    fn workspace(p2_has_build: bool) -> Workspace {
        let mut ws = Workspace::new("/build");
        for path in [":p1", ":p2", ":p3"] {
            let project = ws.add_project(p(path), None).unwrap();
            project.configurations.add("compile").unwrap();
            if path != ":p2" || p2_has_build {
                project.tasks.add("build").unwrap();
            }
        }
        ws.project_mut(&p(":p1"))
            .unwrap()
            .configurations
            .get_mut("compile")
            .unwrap()
            .add_dependency(Dependency::parse(":p2").unwrap());
        ws.project_mut(&p(":p3"))
            .unwrap()
            .configurations
            .get_mut("compile")
            .unwrap()
            .add_dependency(Dependency::parse(":p1").unwrap());
        ws
    }

    #[test]
    fn test_depended_on_adds_one_edge() {
        let ws = workspace(true);
        let expander = CrossProjectDependencyExpander::new(&ws);
        let edges = expander
            .expand(
                &TaskPath::parse(":p1:build").unwrap(),
                Direction::DependedOn,
                "build",
                "compile",
            )
            .unwrap();
        assert_eq!(edges, vec![TaskPath::parse(":p2:build").unwrap()]);
    }

    #[test]
    fn test_missing_task_is_skipped() {
        let ws = workspace(false);
        let expander = CrossProjectDependencyExpander::new(&ws);
        let edges = expander
            .expand(
                &TaskPath::parse(":p1:build").unwrap(),
                Direction::DependedOn,
                "build",
                "compile",
            )
            .unwrap();
        assert!(edges.is_empty());
    }

    #[test]
    fn test_dependents() {
        let ws = workspace(true);
        let expander = CrossProjectDependencyExpander::new(&ws);
        let edges = expander
            .expand(
                &TaskPath::parse(":p1:build").unwrap(),
                Direction::Dependents,
                "build",
                "compile",
            )
            .unwrap();
        assert_eq!(edges, vec![TaskPath::parse(":p3:build").unwrap()]);
    }

    #[test]
    fn test_inherited_dependencies_listed_once() {
        let mut ws = workspace(true);
        let p1 = ws.project_mut(&p(":p1")).unwrap();
        p1.configurations
            .add("runtime")
            .unwrap()
            .add_dependency(Dependency::parse(":p2").unwrap());
        p1.configurations.extend("runtime", "compile").unwrap();

        let expander = CrossProjectDependencyExpander::new(&ws);
        assert_eq!(
            expander
                .related_projects(&p(":p1"), Direction::DependedOn, "runtime")
                .unwrap(),
            vec![p(":p2")]
        );
    }

    #[test]
    fn test_self_dependency_ignored() {
        let mut ws = workspace(true);
        ws.project_mut(&p(":p2"))
            .unwrap()
            .configurations
            .get_mut("compile")
            .unwrap()
            .add_dependency(Dependency::parse(":p2").unwrap());

        let expander = CrossProjectDependencyExpander::new(&ws);
        assert!(expander
            .related_projects(&p(":p2"), Direction::DependedOn, "compile")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_unknown_configuration_fails() {
        let ws = workspace(true);
        let expander = CrossProjectDependencyExpander::new(&ws);
        let err = expander
            .expand(
                &TaskPath::parse(":p1:build").unwrap(),
                Direction::Dependents,
                "build",
                "testRuntime",
            )
            .unwrap_err();
        assert!(err.to_string().contains("testRuntime"));
    }

    #[test]
    fn test_unknown_task_fails() {
        let ws = workspace(true);
        let expander = CrossProjectDependencyExpander::new(&ws);
        assert!(expander
            .expand(
                &TaskPath::parse(":p1:jar").unwrap(),
                Direction::DependedOn,
                "jar",
                "compile",
            )
            .is_err());
    }

    #[test]
    fn test_direction_serde() {
        let d: Direction = serde_json::from_str("\"depended-on\"").unwrap();
        assert_eq!(d, Direction::DependedOn);
        assert_eq!(Direction::Dependents.to_string(), "dependents");
    }
}
