//! Per-project task container

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::TaskError;
use crate::project::ProjectPath;

use super::{Task, TaskPath};

/// Configuration rule applied to tasks of a container
pub type TaskRule = Arc<dyn Fn(&mut Task) + Send + Sync>;

/// The tasks of one project, keyed by name
pub struct TaskContainer {
    project: ProjectPath,
    tasks: BTreeMap<String, Task>,
    rules: Vec<TaskRule>,
}

impl TaskContainer {
    pub fn new(project: ProjectPath) -> Self {
        Self {
            project,
            tasks: BTreeMap::new(),
            rules: Vec::new(),
        }
    }

    /// Create a task. Rules registered with [`TaskContainer::all`] are applied
    /// before it is returned.
    pub fn add(&mut self, name: &str) -> Result<&mut Task, TaskError> {
        let path = TaskPath::resolve(&self.project, name)?;
        if path.project != self.project {
            return Err(TaskError::InvalidPath(name.to_string()));
        }
        if self.tasks.contains_key(&path.name) {
            return Err(TaskError::Duplicate {
                task: path.name,
                project: self.project.to_string(),
            });
        }

        debug!(task = %path, "adding task");
        let key = path.name.clone();
        let mut task = Task::new(path);
        for rule in &self.rules {
            rule(&mut task);
        }
        Ok(self.tasks.entry(key).or_insert(task))
    }

    /// Apply a rule to every existing task and every task added later
    pub fn all<F>(&mut self, rule: F)
    where
        F: Fn(&mut Task) + Send + Sync + 'static,
    {
        for task in self.tasks.values_mut() {
            rule(task);
        }
        self.rules.push(Arc::new(rule));
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Task> {
        self.tasks.get_mut(name)
    }

    /// Get a task, failing with its full path when absent
    pub fn require(&self, name: &str) -> Result<&Task, TaskError> {
        self.tasks
            .get(name)
            .ok_or_else(|| TaskError::NotFound(TaskPath::new(self.project.clone(), name).to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.tasks.values_mut()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl fmt::Debug for TaskContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContainer")
            .field("project", &self.project)
            .field("tasks", &self.tasks)
            .field("rules", &self.rules.len())
            .finish()
    }
}
