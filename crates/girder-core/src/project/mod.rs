//! Project model: the project tree, configurations and the project graph

pub mod configuration;
pub mod graph;
mod path;
mod source_set;
pub mod workspace;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::conventions::ConventionRegistry;
use crate::error::ProjectError;
use crate::task::TaskContainer;

pub use configuration::{Configuration, ConfigurationContainer, Dependency};
pub use graph::{ProjectGraph, ProjectNode};
pub use path::ProjectPath;
pub use source_set::SourceSet;
pub use workspace::Workspace;

/// Default name of the build output directory
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Directory facet every project registers; conventions read their base
/// directories from here
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub project_dir: PathBuf,
    pub root_dir: PathBuf,
    pub build_dir: PathBuf,
}

/// One project of the build
#[derive(Debug)]
pub struct Project {
    path: ProjectPath,
    project_dir: PathBuf,
    root_dir: PathBuf,
    build_dir: PathBuf,
    pub description: Option<String>,
    pub configurations: ConfigurationContainer,
    pub tasks: TaskContainer,
    source_sets: BTreeMap<String, SourceSet>,
    conventions: ConventionRegistry,
    applied_plugins: BTreeSet<String>,
}

impl Project {
    pub fn new(
        path: ProjectPath,
        project_dir: impl Into<PathBuf>,
        root_dir: impl Into<PathBuf>,
    ) -> Self {
        let project_dir = project_dir.into();
        let root_dir = root_dir.into();
        let build_dir = project_dir.join(DEFAULT_BUILD_DIR);

        let mut conventions = ConventionRegistry::new(path.to_string());
        // fresh registry, cannot collide
        let _ = conventions.register(ProjectLayout {
            project_dir: project_dir.clone(),
            root_dir: root_dir.clone(),
            build_dir: build_dir.clone(),
        });

        Self {
            configurations: ConfigurationContainer::new(path.clone()),
            tasks: TaskContainer::new(path.clone()),
            path,
            project_dir,
            root_dir,
            build_dir,
            description: None,
            source_sets: BTreeMap::new(),
            conventions,
            applied_plugins: BTreeSet::new(),
        }
    }

    pub fn path(&self) -> &ProjectPath {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Move the build directory; relative paths resolve against the project
    /// directory
    pub fn set_build_dir(&mut self, dir: impl AsRef<Path>) {
        self.build_dir = self.resolve_file(dir);
        if let Ok(layout) = self.conventions.lookup_mut::<ProjectLayout>() {
            layout.build_dir = self.build_dir.clone();
        }
    }

    /// Resolve a path relative to the project directory
    pub fn resolve_file(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }

    pub fn conventions(&self) -> &ConventionRegistry {
        &self.conventions
    }

    pub fn conventions_mut(&mut self) -> &mut ConventionRegistry {
        &mut self.conventions
    }

    /// Add a source set with its default directory conventions
    pub fn add_source_set(&mut self, name: &str) -> Result<&mut SourceSet, ProjectError> {
        if self.source_sets.contains_key(name) {
            return Err(ProjectError::DuplicateSourceSet {
                source_set: name.to_string(),
                project: self.path.to_string(),
            });
        }
        Ok(self
            .source_sets
            .entry(name.to_string())
            .or_insert_with(|| SourceSet::new(&self.path, name)))
    }

    /// Get a source set, adding it when absent
    pub fn source_set_or_add(&mut self, name: &str) -> &mut SourceSet {
        let path = &self.path;
        self.source_sets
            .entry(name.to_string())
            .or_insert_with(|| SourceSet::new(path, name))
    }

    pub fn source_set(&self, name: &str) -> Option<&SourceSet> {
        self.source_sets.get(name)
    }

    pub fn source_set_mut(&mut self, name: &str) -> Option<&mut SourceSet> {
        self.source_sets.get_mut(name)
    }

    pub fn source_sets(&self) -> impl Iterator<Item = &SourceSet> {
        self.source_sets.values()
    }

    /// Record that a plugin was applied; false if it already was
    pub fn mark_plugin_applied(&mut self, id: &str) -> bool {
        self.applied_plugins.insert(id.to_string())
    }

    pub fn has_plugin(&self, id: &str) -> bool {
        self.applied_plugins.contains(id)
    }

    pub fn applied_plugins(&self) -> impl Iterator<Item = &str> {
        self.applied_plugins.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_facet_registered() {
        let dir = TempDir::new().unwrap();
        let project = Project::new(
            ProjectPath::parse(":core").unwrap(),
            dir.path().join("core"),
            dir.path(),
        );

        let layout = project.conventions().lookup::<ProjectLayout>().unwrap();
        assert_eq!(layout.project_dir, dir.path().join("core"));
        assert_eq!(layout.root_dir, dir.path());
        assert_eq!(layout.build_dir, dir.path().join("core").join("build"));
        assert_eq!(project.name(), "core");
    }

    #[test]
    fn test_set_build_dir_updates_facet() {
        let dir = TempDir::new().unwrap();
        let mut project = Project::new(ProjectPath::root(), dir.path(), dir.path());
        project.set_build_dir("out");

        assert_eq!(project.build_dir(), dir.path().join("out"));
        assert_eq!(
            project.conventions().lookup::<ProjectLayout>().unwrap().build_dir,
            dir.path().join("out")
        );
    }

    #[test]
    fn test_resolve_file() {
        let project = Project::new(ProjectPath::root(), "/work/app", "/work");
        assert_eq!(project.resolve_file("src"), PathBuf::from("/work/app/src"));
        assert_eq!(project.resolve_file("/tmp/x"), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn test_duplicate_source_set() {
        let mut project = Project::new(ProjectPath::root(), "/work", "/work");
        project.add_source_set("main").unwrap();
        assert!(matches!(
            project.add_source_set("main"),
            Err(ProjectError::DuplicateSourceSet { .. })
        ));
    }

    #[test]
    fn test_plugin_bookkeeping() {
        let mut project = Project::new(ProjectPath::root(), "/work", "/work");
        assert!(project.mark_plugin_applied("base"));
        assert!(!project.mark_plugin_applied("base"));
        assert!(project.has_plugin("base"));
        assert_eq!(project.applied_plugins().collect::<Vec<_>>(), vec!["base"]);
    }
}
