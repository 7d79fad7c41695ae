//! Dependency graph between projects, induced by configurations

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use serde::Serialize;
use tracing::{info, instrument};

use crate::error::ProjectError;

use super::path::ProjectPath;
use super::workspace::Workspace;

/// A node in the project graph
#[derive(Debug, Clone, Serialize)]
pub struct ProjectNode {
    pub path: ProjectPath,
    /// Projects this project depends on through any configuration
    pub dependencies: Vec<ProjectPath>,
    /// Projects that depend on this project
    pub dependents: Vec<ProjectPath>,
    /// Depth in the dependency tree (0 = no dependencies)
    pub depth: usize,
}

/// Project-level dependency graph of one build
#[derive(Debug, Clone)]
pub struct ProjectGraph {
    nodes: BTreeMap<ProjectPath, ProjectNode>,
    /// Dependencies before dependents
    sorted_order: Vec<ProjectPath>,
    cycles: Vec<Vec<ProjectPath>>,
}

impl ProjectGraph {
    /// Build the graph from every configuration of every project
    #[instrument(skip_all, fields(projects = workspace.len()))]
    pub fn build(workspace: &Workspace) -> Self {
        let graph = Self::from_edges(workspace.projects().map(|project| {
            (
                project.path().clone(),
                project
                    .configurations
                    .referenced_projects()
                    .into_iter()
                    .collect::<Vec<_>>(),
            )
        }));
        info!(
            projects = graph.nodes.len(),
            cycles = graph.cycles.len(),
            "project graph built"
        );
        graph
    }

    /// Build the graph from explicit `(project, dependencies)` pairs
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (ProjectPath, Vec<ProjectPath>)>,
    {
        let mut nodes: BTreeMap<ProjectPath, ProjectNode> = BTreeMap::new();

        for (path, dependencies) in edges {
            nodes.insert(
                path.clone(),
                ProjectNode {
                    path,
                    dependencies,
                    dependents: Vec::new(),
                    depth: 0,
                },
            );
        }

        let edges: Vec<(ProjectPath, ProjectPath)> = nodes
            .values()
            .flat_map(|node| {
                node.dependencies
                    .iter()
                    .map(move |dep| (dep.clone(), node.path.clone()))
            })
            .collect();
        for (dependency, dependent) in edges {
            if let Some(node) = nodes.get_mut(&dependency) {
                if !node.dependents.contains(&dependent) {
                    node.dependents.push(dependent);
                }
            }
        }

        let (sorted_order, cycles) = Self::topological_sort(&nodes);

        for path in &sorted_order {
            let max_dep_depth = nodes
                .get(path)
                .map(|node| {
                    node.dependencies
                        .iter()
                        .filter_map(|dep| nodes.get(dep))
                        .map(|n| n.depth + 1)
                        .max()
                        .unwrap_or(0)
                })
                .unwrap_or(0);
            if let Some(node) = nodes.get_mut(path) {
                node.depth = max_dep_depth;
            }
        }

        Self {
            nodes,
            sorted_order,
            cycles,
        }
    }

    /// Kahn's algorithm; nodes left over sit on cycles
    fn topological_sort(
        nodes: &BTreeMap<ProjectPath, ProjectNode>,
    ) -> (Vec<ProjectPath>, Vec<Vec<ProjectPath>>) {
        let mut in_degree: BTreeMap<&ProjectPath, usize> = BTreeMap::new();
        let mut queue: VecDeque<&ProjectPath> = VecDeque::new();
        let mut sorted: Vec<ProjectPath> = Vec::new();

        for (path, node) in nodes {
            let degree = node
                .dependencies
                .iter()
                .filter(|d| nodes.contains_key(*d))
                .count();
            in_degree.insert(path, degree);
            if degree == 0 {
                queue.push_back(path);
            }
        }

        while let Some(path) = queue.pop_front() {
            sorted.push(path.clone());

            if let Some(node) = nodes.get(path) {
                for dependent in &node.dependents {
                    if let Some(degree) = in_degree.get_mut(dependent) {
                        *degree = degree.saturating_sub(1);
                        if *degree == 0 {
                            queue.push_back(dependent);
                        }
                    }
                }
            }
        }

        let mut cycles: Vec<Vec<ProjectPath>> = Vec::new();
        if sorted.len() != nodes.len() {
            let in_sorted: HashSet<&ProjectPath> = sorted.iter().collect();
            let cyclic: BTreeSet<&ProjectPath> = nodes
                .keys()
                .filter(|p| !in_sorted.contains(p))
                .collect();

            for start in &cyclic {
                if let Some(cycle) = Self::find_cycle(nodes, start, &cyclic) {
                    let duplicate = cycles.iter().any(|c| {
                        c.len() == cycle.len() && cycle.iter().all(|n| c.contains(n))
                    });
                    if !duplicate {
                        cycles.push(cycle);
                    }
                }
            }
        }

        (sorted, cycles)
    }

    fn find_cycle(
        nodes: &BTreeMap<ProjectPath, ProjectNode>,
        start: &ProjectPath,
        cyclic: &BTreeSet<&ProjectPath>,
    ) -> Option<Vec<ProjectPath>> {
        fn dfs(
            nodes: &BTreeMap<ProjectPath, ProjectNode>,
            current: &ProjectPath,
            start: &ProjectPath,
            visited: &mut HashSet<ProjectPath>,
            path: &mut Vec<ProjectPath>,
            cyclic: &BTreeSet<&ProjectPath>,
        ) -> bool {
            if visited.contains(current) {
                return current == start && !path.is_empty();
            }
            if !cyclic.contains(current) {
                return false;
            }

            visited.insert(current.clone());
            path.push(current.clone());

            if let Some(node) = nodes.get(current) {
                for dep in &node.dependencies {
                    if dfs(nodes, dep, start, visited, path, cyclic) {
                        return true;
                    }
                }
            }

            path.pop();
            false
        }

        let mut visited = HashSet::new();
        let mut path = Vec::new();
        if dfs(nodes, start, start, &mut visited, &mut path, cyclic) {
            Some(path)
        } else {
            None
        }
    }

    /// Projects in dependency order (dependencies first)
    pub fn sorted(&self) -> &[ProjectPath] {
        &self.sorted_order
    }

    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    pub fn cycles(&self) -> &[Vec<ProjectPath>] {
        &self.cycles
    }

    pub fn get(&self, path: &ProjectPath) -> Option<&ProjectNode> {
        self.nodes.get(path)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ProjectNode> {
        self.nodes.values()
    }

    /// Direct dependencies of a project
    pub fn dependencies(&self, path: &ProjectPath) -> BTreeSet<ProjectPath> {
        self.nodes
            .get(path)
            .map(|n| n.dependencies.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Direct dependents of a project
    pub fn dependents(&self, path: &ProjectPath) -> BTreeSet<ProjectPath> {
        self.nodes
            .get(path)
            .map(|n| n.dependents.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every project transitively depending on `path`, excluding itself
    pub fn affected(&self, path: &ProjectPath) -> BTreeSet<ProjectPath> {
        let mut affected = BTreeSet::new();
        let mut queue: VecDeque<&ProjectPath> = VecDeque::new();
        queue.push_back(path);

        while let Some(current) = queue.pop_front() {
            if let Some(node) = self.nodes.get(current) {
                for dependent in &node.dependents {
                    if affected.insert(dependent.clone()) {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        affected.remove(path);
        affected
    }

    /// Fail if any project dependency cycle exists
    pub fn validate(&self) -> Result<(), ProjectError> {
        if self.has_cycles() {
            let description: Vec<String> = self
                .cycles
                .iter()
                .map(|cycle| {
                    let mut names: Vec<&str> = cycle.iter().map(ProjectPath::as_str).collect();
                    if let Some(first) = cycle.first() {
                        names.push(first.as_str());
                    }
                    names.join(" -> ")
                })
                .collect();
            return Err(ProjectError::DependencyCycle(description.join("; ")));
        }
        Ok(())
    }

    pub fn max_depth(&self) -> usize {
        self.nodes.values().map(|n| n.depth).max().unwrap_or(0)
    }
}
