//! Build file types

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::conventions::PropertyValue;
use crate::expand::CrossProjectDependency;
use crate::project::DEFAULT_BUILD_DIR;

use super::defaults::HISTORY_DIR_NAME;

/// Main build description
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build name
    pub name: Option<String>,

    /// Settings shared by every project
    pub build: BuildSettings,

    /// Project declarations
    pub projects: Vec<ProjectConfig>,
}

impl Config {
    /// Declaration of a project, if any
    pub fn project(&self, path: &str) -> Option<&ProjectConfig> {
        self.projects.iter().find(|p| p.path == path)
    }
}

/// Build-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Build output directory, relative to each project directory
    pub build_dir: String,

    /// Overrides the user-scoped task history root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_dir: Option<PathBuf>,

    /// Plugins applied to every project
    pub plugins: Vec<String>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            build_dir: DEFAULT_BUILD_DIR.to_string(),
            history_dir: None,
            plugins: Vec::new(),
        }
    }
}

impl BuildSettings {
    /// Directory holding task history records
    pub fn history_root(&self, user_home: &Path) -> PathBuf {
        self.history_dir
            .clone()
            .unwrap_or_else(|| user_home.join(HISTORY_DIR_NAME))
    }
}

/// A project declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project path (`:`, `:core`, `:core:api`)
    pub path: String,

    /// Project directory relative to the build root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Plugins applied to this project on top of the build-wide ones
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<String>,

    /// Overrides the build-wide build directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_dir: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub configurations: BTreeMap<String, ConfigurationConfig>,

    /// Source sets with explicit property values
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub source_sets: BTreeMap<String, BTreeMap<String, PropertyValue>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<TaskConfig>,
}

impl ProjectConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            dir: None,
            description: None,
            plugins: Vec::new(),
            build_dir: None,
            configurations: BTreeMap::new(),
            source_sets: BTreeMap::new(),
            tasks: Vec::new(),
        }
    }

    pub fn task(&self, name: &str) -> Option<&TaskConfig> {
        self.tasks.iter().find(|t| t.name == name)
    }
}

/// A configuration declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Configurations of the same project this one extends
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,

    #[serde(default = "default_true")]
    pub transitive: bool,

    #[serde(default = "default_true")]
    pub visible: bool,

    /// Project paths (`:core`) or external module notations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl Default for ConfigurationConfig {
    fn default() -> Self {
        Self {
            description: None,
            extends: Vec::new(),
            transitive: true,
            visible: true,
            dependencies: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// A task declaration. Declaring a task a plugin already added configures
/// the existing task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Shell command appended as an action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Local task names or absolute task paths that must run first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// Same-named tasks in projects related through a configuration
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on_projects: Vec<CrossProjectDependency>,

    /// Names of path-valued properties holding the task's outputs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,

    /// Explicit property values
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertyValue>,

    /// Tasks whose recorded output time makes this task's output stale
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stale_after: Vec<String>,
}

impl TaskConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            command: None,
            depends_on: Vec::new(),
            depends_on_projects: Vec::new(),
            outputs: Vec::new(),
            properties: BTreeMap::new(),
            stale_after: Vec::new(),
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_depends_on(mut self, task: impl Into<String>) -> Self {
        self.depends_on.push(task.into());
        self
    }

    pub fn with_output(mut self, property: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        let property = property.into();
        self.properties.insert(property.clone(), value.into());
        self.outputs.push(property);
        self
    }

    pub fn with_stale_after(mut self, task: impl Into<String>) -> Self {
        self.stale_after.push(task.into());
        self
    }
}
