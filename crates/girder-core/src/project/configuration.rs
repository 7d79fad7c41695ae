//! Named configurations: dependency edge carriers between projects

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use crate::error::ProjectError;

use super::path::ProjectPath;

/// A declared dependency of a configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dependency {
    /// Dependency on another project of the same build
    Project {
        path: ProjectPath,
        /// Configuration of the target project, `default` when unset
        configuration: Option<String>,
    },
    /// External module notation (e.g. `org.slf4j:slf4j-api:1.7`); resolved
    /// elsewhere, carried here untouched
    External(String),
}

impl Dependency {
    /// Parse a build file notation: `:path` is a project, anything else is
    /// external
    pub fn parse(notation: &str) -> Result<Self, ProjectError> {
        if notation.starts_with(ProjectPath::SEPARATOR) {
            Ok(Self::Project {
                path: ProjectPath::parse(notation)?,
                configuration: None,
            })
        } else {
            Ok(Self::External(notation.to_string()))
        }
    }

    /// Target project, if this is a project dependency
    pub fn project(&self) -> Option<&ProjectPath> {
        match self {
            Self::Project { path, .. } => Some(path),
            Self::External(_) => None,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project {
                path,
                configuration: Some(conf),
            } => write!(f, "project {} ({})", path, conf),
            Self::Project { path, .. } => write!(f, "project {}", path),
            Self::External(notation) => f.write_str(notation),
        }
    }
}

/// A named set of dependencies inside one project
#[derive(Debug, Clone)]
pub struct Configuration {
    pub name: String,
    pub description: Option<String>,
    /// Whether the configuration is visible outside its project
    pub visible: bool,
    /// Whether dependencies of dependencies are included when resolved
    pub transitive: bool,
    extends_from: Vec<String>,
    dependencies: Vec<Dependency>,
}

impl Configuration {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            visible: true,
            transitive: true,
            extends_from: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_visible(&mut self, visible: bool) -> &mut Self {
        self.visible = visible;
        self
    }

    pub fn with_transitive(&mut self, transitive: bool) -> &mut Self {
        self.transitive = transitive;
        self
    }

    /// Declare a dependency; duplicates are ignored
    pub fn add_dependency(&mut self, dependency: Dependency) -> &mut Self {
        if !self.dependencies.contains(&dependency) {
            self.dependencies.push(dependency);
        }
        self
    }

    /// Dependencies declared directly on this configuration
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Names of configurations this one extends directly
    pub fn extends_from(&self) -> &[String] {
        &self.extends_from
    }
}

/// The configurations of one project
#[derive(Debug, Clone)]
pub struct ConfigurationContainer {
    project: ProjectPath,
    configurations: BTreeMap<String, Configuration>,
}

impl ConfigurationContainer {
    pub fn new(project: ProjectPath) -> Self {
        Self {
            project,
            configurations: BTreeMap::new(),
        }
    }

    /// Add a new configuration
    pub fn add(&mut self, name: &str) -> Result<&mut Configuration, ProjectError> {
        if self.configurations.contains_key(name) {
            return Err(ProjectError::DuplicateConfiguration {
                configuration: name.to_string(),
                project: self.project.to_string(),
            });
        }
        Ok(self
            .configurations
            .entry(name.to_string())
            .or_insert_with(|| Configuration::new(name)))
    }

    /// Get a configuration, failing if absent
    pub fn get(&self, name: &str) -> Result<&Configuration, ProjectError> {
        self.configurations
            .get(name)
            .ok_or_else(|| self.not_found(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Configuration, ProjectError> {
        let project = self.project.to_string();
        self.configurations
            .get_mut(name)
            .ok_or_else(|| ProjectError::ConfigurationNotFound {
                configuration: name.to_string(),
                project,
            })
    }

    pub fn find(&self, name: &str) -> Option<&Configuration> {
        self.configurations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.configurations.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Configuration> {
        self.configurations.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.configurations.keys().map(String::as_str)
    }

    /// Make `child` extend `parent`.
    ///
    /// Both must exist, and the extension graph must stay acyclic.
    pub fn extend(&mut self, child: &str, parent: &str) -> Result<(), ProjectError> {
        self.get(child)?;
        self.get(parent)?;

        if child == parent || self.hierarchy_names(parent)?.contains(child) {
            return Err(ProjectError::ConfigurationCycle {
                project: self.project.to_string(),
                cycle: format!("{} -> {} -> {}", child, parent, child),
            });
        }

        let configuration = self.get_mut(child)?;
        if !configuration.extends_from.iter().any(|p| p == parent) {
            configuration.extends_from.push(parent.to_string());
        }
        Ok(())
    }

    /// The configuration itself followed by every configuration it extends,
    /// transitively, each listed once
    pub fn hierarchy(&self, name: &str) -> Result<Vec<&Configuration>, ProjectError> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut order = Vec::new();
        let mut stack = vec![self.get(name)?];

        while let Some(configuration) = stack.pop() {
            if !visited.insert(configuration.name.as_str()) {
                continue;
            }
            order.push(configuration);
            for parent in configuration.extends_from.iter().rev() {
                if !visited.contains(parent.as_str()) {
                    stack.push(self.get(parent)?);
                }
            }
        }

        Ok(order)
    }

    fn hierarchy_names(&self, name: &str) -> Result<BTreeSet<String>, ProjectError> {
        Ok(self
            .hierarchy(name)?
            .into_iter()
            .map(|c| c.name.clone())
            .collect())
    }

    /// All dependencies of a configuration including inherited ones
    pub fn all_dependencies(&self, name: &str) -> Result<Vec<&Dependency>, ProjectError> {
        let mut seen: HashSet<&Dependency> = HashSet::new();
        let mut all = Vec::new();
        for configuration in self.hierarchy(name)? {
            for dependency in &configuration.dependencies {
                if seen.insert(dependency) {
                    all.push(dependency);
                }
            }
        }
        Ok(all)
    }

    /// Projects a configuration depends on, including inherited
    /// dependencies, in declaration order without duplicates
    pub fn project_dependencies(&self, name: &str) -> Result<Vec<ProjectPath>, ProjectError> {
        let mut seen: HashSet<&ProjectPath> = HashSet::new();
        let mut projects = Vec::new();
        for dependency in self.all_dependencies(name)? {
            if let Some(path) = dependency.project() {
                if seen.insert(path) {
                    projects.push(path.clone());
                }
            }
        }
        Ok(projects)
    }

    /// Every project referenced by any configuration
    pub fn referenced_projects(&self) -> BTreeSet<ProjectPath> {
        self.configurations
            .values()
            .flat_map(|c| c.dependencies.iter())
            .filter_map(|d| d.project().cloned())
            .collect()
    }

    fn not_found(&self, name: &str) -> ProjectError {
        ProjectError::ConfigurationNotFound {
            configuration: name.to_string(),
            project: self.project.to_string(),
        }
    }
}
