//! Tasks: named, schedulable units of build work

mod container;
mod path;

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::debug;

use crate::conventions::{ConventionAware, ConventionMapping, ConventionRegistry};
use crate::error::ConventionError;
use crate::expand::CrossProjectDependency;
use crate::project::Project;

pub use container::{TaskContainer, TaskRule};
pub use path::TaskPath;

/// What an action reports after running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action changed something
    DidWork,
    /// The action ran but found nothing to do
    NoWork,
}

/// Read access handed to actions and predicates
#[derive(Clone, Copy)]
pub struct TaskContext<'a> {
    pub project: &'a Project,
    pub task: &'a Task,
}

impl TaskContext<'_> {
    /// Registry of the owning project
    pub fn conventions(&self) -> &ConventionRegistry {
        self.project.conventions()
    }
}

/// Decides whether a task's actions run at all
pub type TaskPredicate = Arc<dyn Fn(&TaskContext<'_>) -> anyhow::Result<bool> + Send + Sync>;

type ActionFn = Arc<dyn Fn(&TaskContext<'_>) -> anyhow::Result<ActionOutcome> + Send + Sync>;

/// One executable step of a task
#[derive(Clone)]
pub struct TaskAction {
    pub label: String,
    run: ActionFn,
}

impl TaskAction {
    pub fn new<F>(label: impl Into<String>, run: F) -> Self
    where
        F: Fn(&TaskContext<'_>) -> anyhow::Result<ActionOutcome> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            run: Arc::new(run),
        }
    }

    /// Run a shell command in the project directory.
    ///
    /// A non-zero exit status fails the action.
    pub fn shell(command: impl Into<String>) -> Self {
        let command = command.into();
        let label = command.clone();
        Self::new(label, move |ctx| {
            let dir = ctx.project.project_dir();
            debug!(task = %ctx.task.path(), command = %command, dir = %dir.display(), "running shell action");

            let status = Command::new("sh")
                .arg("-c")
                .arg(&command)
                .current_dir(dir)
                .status()
                .with_context(|| format!("Failed to spawn `{}`", command))?;

            if !status.success() {
                bail!(
                    "`{}` exited with code {}",
                    command,
                    status.code().unwrap_or(-1)
                );
            }
            Ok(ActionOutcome::DidWork)
        })
    }

    pub fn run(&self, ctx: &TaskContext<'_>) -> anyhow::Result<ActionOutcome> {
        (self.run)(ctx)
    }
}

impl fmt::Debug for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskAction")
            .field("label", &self.label)
            .finish()
    }
}

/// A task of one project
pub struct Task {
    path: TaskPath,
    pub description: Option<String>,
    dependencies: BTreeSet<TaskPath>,
    cross_project: Vec<CrossProjectDependency>,
    actions: Vec<TaskAction>,
    only_if: Option<TaskPredicate>,
    outputs: Vec<String>,
    did_work: bool,
    conventions: ConventionMapping<Task>,
}

impl Task {
    pub fn new(path: TaskPath) -> Self {
        Self {
            path,
            description: None,
            dependencies: BTreeSet::new(),
            cross_project: Vec::new(),
            actions: Vec::new(),
            only_if: None,
            outputs: Vec::new(),
            did_work: false,
            conventions: ConventionMapping::new(),
        }
    }

    pub fn path(&self) -> &TaskPath {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.path.name
    }

    pub fn with_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Add an explicit dependency edge
    pub fn depends_on(&mut self, task: TaskPath) -> &mut Self {
        self.dependencies.insert(task);
        self
    }

    /// Tasks that must run before this one
    pub fn dependencies(&self) -> &BTreeSet<TaskPath> {
        &self.dependencies
    }

    /// Declare a dependency on same-named tasks of related projects; edges
    /// are added when the workspace expands cross-project dependencies
    pub fn depends_on_projects(&mut self, dependency: CrossProjectDependency) -> &mut Self {
        if !self.cross_project.contains(&dependency) {
            self.cross_project.push(dependency);
        }
        self
    }

    pub fn cross_project_dependencies(&self) -> &[CrossProjectDependency] {
        &self.cross_project
    }

    /// Append an action
    pub fn do_last(&mut self, action: TaskAction) -> &mut Self {
        self.actions.push(action);
        self
    }

    /// Prepend an action
    pub fn do_first(&mut self, action: TaskAction) -> &mut Self {
        self.actions.insert(0, action);
        self
    }

    pub fn actions(&self) -> &[TaskAction] {
        &self.actions
    }

    /// Replace the predicate deciding whether the actions run
    pub fn only_if<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&TaskContext<'_>) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        self.only_if = Some(Arc::new(predicate));
        self
    }

    pub fn has_predicate(&self) -> bool {
        self.only_if.is_some()
    }

    /// Evaluate the predicate; a task without one always runs
    pub fn should_run(&self, project: &Project) -> anyhow::Result<bool> {
        match &self.only_if {
            Some(predicate) => predicate(&TaskContext {
                project,
                task: self,
            }),
            None => Ok(true),
        }
    }

    /// Declare a path-valued property as an output of this task
    pub fn declare_output(&mut self, property: impl Into<String>) -> &mut Self {
        let property = property.into();
        if !self.outputs.contains(&property) {
            self.outputs.push(property);
        }
        self
    }

    /// Names of properties holding output locations
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Resolve every declared output property against the project directory
    pub fn output_locations(&self, project: &Project) -> Result<Vec<PathBuf>, ConventionError> {
        let registry = project.conventions();
        let mut locations = Vec::new();
        for name in &self.outputs {
            let value = self.property(name, registry)?;
            let paths = value
                .as_paths()
                .ok_or_else(|| self.mismatch(name, "path", &value))?;
            locations.extend(paths.iter().map(|p| project.resolve_file(p)));
        }
        Ok(locations)
    }

    /// Whether at least one declared output exists on disk
    pub fn output_exists(&self, project: &Project) -> Result<bool, ConventionError> {
        Ok(self
            .output_locations(project)?
            .iter()
            .any(|location| location.exists()))
    }

    /// Run every action in order, returning whether any of them did work.
    ///
    /// A task without actions did no work.
    pub fn run_actions(&self, project: &Project) -> anyhow::Result<bool> {
        let ctx = TaskContext {
            project,
            task: self,
        };
        let mut did_work = false;
        for action in &self.actions {
            let outcome = action
                .run(&ctx)
                .with_context(|| format!("Action '{}' of task {} failed", action.label, self.path))?;
            did_work |= outcome == ActionOutcome::DidWork;
        }
        Ok(did_work)
    }

    pub fn did_work(&self) -> bool {
        self.did_work
    }

    pub fn set_did_work(&mut self, did_work: bool) {
        self.did_work = did_work;
    }
}

impl ConventionAware for Task {
    fn convention_mapping(&self) -> &ConventionMapping<Self> {
        &self.conventions
    }

    fn convention_mapping_mut(&mut self) -> &mut ConventionMapping<Self> {
        &mut self.conventions
    }

    fn display_name(&self) -> String {
        format!("task '{}'", self.path)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("path", &self.path)
            .field("dependencies", &self.dependencies)
            .field("cross_project", &self.cross_project)
            .field("actions", &self.actions)
            .field("has_predicate", &self.only_if.is_some())
            .field("outputs", &self.outputs)
            .field("did_work", &self.did_work)
            .field("conventions", &self.conventions)
            .finish()
    }
}
