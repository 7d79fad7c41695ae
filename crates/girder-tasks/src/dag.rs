//! Task DAG construction and management

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::Serialize;
use tracing::{debug, info, instrument};

use girder_core::project::Workspace;
use girder_core::task::TaskPath;

/// A node in the task execution DAG
#[derive(Debug, Clone, Serialize)]
pub struct TaskNode {
    /// Task path
    pub path: TaskPath,
    /// Task description
    pub description: Option<String>,
    /// Labels of the task's actions, in execution order
    pub actions: Vec<String>,
    /// Tasks that must complete before this one
    pub dependencies: BTreeSet<TaskPath>,
    /// Tasks waiting on this one
    pub dependents: BTreeSet<TaskPath>,
    /// Execution wave; every dependency sits in an earlier wave
    pub wave: usize,
}

/// Directed acyclic graph of the tasks one invocation executes
#[derive(Debug, Clone)]
pub struct TaskDag {
    nodes: BTreeMap<TaskPath, TaskNode>,
    waves: Vec<Vec<TaskPath>>,
    sorted_order: Vec<TaskPath>,
}

impl TaskDag {
    /// Resolve a command-line task request.
    ///
    /// Paths (`:core:compile`) select one task; bare names select the task of
    /// that name in every project.
    pub fn select(workspace: &Workspace, request: &str) -> Result<Vec<TaskPath>, DagError> {
        if request.contains(':') {
            let path = TaskPath::parse(request)
                .map_err(|_| DagError::TaskNotFound(request.to_string()))?;
            if workspace.find_task(&path).is_none() {
                return Err(DagError::TaskNotFound(request.to_string()));
            }
            return Ok(vec![path]);
        }

        let selected: Vec<TaskPath> = workspace
            .tasks_by_name(request)
            .into_iter()
            .map(|task| task.path().clone())
            .collect();
        if selected.is_empty() {
            return Err(DagError::TaskNotFound(request.to_string()));
        }
        Ok(selected)
    }

    /// Build the DAG of the requested tasks and everything they depend on
    #[instrument(skip_all, fields(requested = requested.len()))]
    pub fn build(workspace: &Workspace, requested: &[TaskPath]) -> Result<Self, DagError> {
        let mut nodes: BTreeMap<TaskPath, TaskNode> = BTreeMap::new();
        let mut queue: VecDeque<TaskPath> = requested.iter().cloned().collect();

        // Closure over dependencies
        while let Some(path) = queue.pop_front() {
            if nodes.contains_key(&path) {
                continue;
            }
            let (_, task) = workspace
                .find_task(&path)
                .ok_or_else(|| DagError::TaskNotFound(path.to_string()))?;

            for dependency in task.dependencies() {
                if !nodes.contains_key(dependency) {
                    queue.push_back(dependency.clone());
                }
            }
            nodes.insert(
                path.clone(),
                TaskNode {
                    path,
                    description: task.description.clone(),
                    actions: task.actions().iter().map(|a| a.label.clone()).collect(),
                    dependencies: task.dependencies().clone(),
                    dependents: BTreeSet::new(),
                    wave: 0,
                },
            );
        }

        // Build reverse dependency map (dependents)
        let edges: Vec<(TaskPath, TaskPath)> = nodes
            .values()
            .flat_map(|node| {
                node.dependencies
                    .iter()
                    .map(move |dep| (dep.clone(), node.path.clone()))
            })
            .collect();
        for (dependency, dependent) in edges {
            if let Some(node) = nodes.get_mut(&dependency) {
                node.dependents.insert(dependent);
            }
        }

        let sorted_order = Self::topological_sort(&nodes)?;
        let waves = Self::compute_waves(&nodes, &sorted_order);
        for (wave_idx, wave_tasks) in waves.iter().enumerate() {
            for path in wave_tasks {
                if let Some(node) = nodes.get_mut(path) {
                    node.wave = wave_idx;
                }
            }
        }

        info!(
            task_count = nodes.len(),
            wave_count = waves.len(),
            "task DAG built"
        );

        Ok(Self {
            nodes,
            waves,
            sorted_order,
        })
    }

    /// Kahn's algorithm; ready tasks are taken in path order
    fn topological_sort(nodes: &BTreeMap<TaskPath, TaskNode>) -> Result<Vec<TaskPath>, DagError> {
        let mut in_degree: BTreeMap<&TaskPath, usize> = BTreeMap::new();
        let mut ready: BTreeSet<&TaskPath> = BTreeSet::new();
        let mut sorted: Vec<TaskPath> = Vec::new();

        for (path, node) in nodes {
            let degree = node
                .dependencies
                .iter()
                .filter(|d| nodes.contains_key(*d))
                .count();
            in_degree.insert(path, degree);
            if degree == 0 {
                ready.insert(path);
            }
        }

        while let Some(path) = ready.pop_first() {
            sorted.push(path.clone());

            if let Some(node) = nodes.get(path) {
                for dependent in &node.dependents {
                    if let Some(degree) = in_degree.get_mut(dependent) {
                        *degree = degree.saturating_sub(1);
                        if *degree == 0 {
                            ready.insert(dependent);
                        }
                    }
                }
            }
        }

        if sorted.len() != nodes.len() {
            let in_sorted: BTreeSet<_> = sorted.iter().collect();
            let cyclic: Vec<String> = nodes
                .keys()
                .filter(|path| !in_sorted.contains(path))
                .map(|path| path.to_string())
                .collect();
            return Err(DagError::CyclicDependency(cyclic.join(", ")));
        }

        debug!(order = ?sorted.iter().map(|p| p.to_string()).collect::<Vec<_>>(), "tasks sorted");
        Ok(sorted)
    }

    fn compute_waves(nodes: &BTreeMap<TaskPath, TaskNode>, sorted: &[TaskPath]) -> Vec<Vec<TaskPath>> {
        let mut wave_map: BTreeMap<&TaskPath, usize> = BTreeMap::new();

        for path in sorted {
            if let Some(node) = nodes.get(path) {
                let wave = node
                    .dependencies
                    .iter()
                    .filter_map(|dep| wave_map.get(dep))
                    .max()
                    .map(|w| w + 1)
                    .unwrap_or(0);
                wave_map.insert(path, wave);
            }
        }

        if wave_map.is_empty() {
            return Vec::new();
        }
        let max_wave = wave_map.values().max().copied().unwrap_or(0);
        let mut waves: Vec<Vec<TaskPath>> = vec![Vec::new(); max_wave + 1];
        for path in sorted {
            if let Some(&wave) = wave_map.get(path) {
                waves[wave].push(path.clone());
            }
        }
        waves
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TaskNode> {
        self.nodes.values()
    }

    pub fn get(&self, path: &TaskPath) -> Option<&TaskNode> {
        self.nodes.get(path)
    }

    pub fn contains(&self, path: &TaskPath) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn waves(&self) -> &[Vec<TaskPath>] {
        &self.waves
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Execution order
    pub fn sorted(&self) -> &[TaskPath] {
        &self.sorted_order
    }

    /// Human-readable summary of the execution plan
    pub fn execution_plan(&self) -> String {
        let mut plan = String::new();
        for (i, wave) in self.waves.iter().enumerate() {
            plan.push_str(&format!("Wave {} ({} tasks):\n", i, wave.len()));
            for path in wave {
                let Some(node) = self.nodes.get(path) else {
                    continue;
                };
                let actions = if node.actions.is_empty() {
                    "<no actions>".to_string()
                } else {
                    node.actions.join("; ")
                };
                let deps: Vec<String> = node.dependencies.iter().map(|d| d.to_string()).collect();
                if deps.is_empty() {
                    plan.push_str(&format!("  {} -> {}\n", path, actions));
                } else {
                    plan.push_str(&format!(
                        "  {} -> {} (after: {})\n",
                        path,
                        actions,
                        deps.join(", ")
                    ));
                }
            }
        }
        plan
    }
}

/// Errors during DAG construction
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    #[error("Cyclic dependency detected among tasks: {0}")]
    CyclicDependency(String),

    #[error("Task '{0}' not found")]
    TaskNotFound(String),
}
