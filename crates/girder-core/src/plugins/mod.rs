//! Plugin system
//!
//! Plugins configure a project during the configuration phase: they register
//! convention facets, add configurations and tasks, and map defaults onto
//! task properties. Each plugin is applied at most once per project.

pub mod base;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{ConfigError, Result};
use crate::project::Project;

pub use base::{BaseConvention, BasePlugin};

/// A project plugin
pub trait Plugin: Send + Sync {
    /// Id used in build files
    fn id(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Configure the project. Prerequisite plugins can be applied through
    /// `plugins`.
    fn apply(&self, project: &mut Project, plugins: &PluginRegistry) -> Result<()>;
}

/// Plugin registry
#[derive(Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, Arc<dyn Plugin>>,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in plugins
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(BasePlugin);
        registry
    }

    /// Register a plugin, replacing any plugin with the same id
    pub fn register<P: Plugin + 'static>(&mut self, plugin: P) {
        debug!(id = plugin.id(), "registering plugin");
        self.plugins.insert(plugin.id().to_string(), Arc::new(plugin));
    }

    pub fn get(&self, id: &str) -> Option<&dyn Plugin> {
        self.plugins.get(id).map(|p| p.as_ref())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.plugins.contains_key(id)
    }

    /// Ids of all registered plugins
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    /// Apply a plugin to a project.
    ///
    /// Returns `false` when the project already had the plugin applied.
    pub fn apply(&self, id: &str, project: &mut Project) -> Result<bool> {
        let plugin = self
            .plugins
            .get(id)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownPlugin(id.to_string()))?;

        if !project.mark_plugin_applied(id) {
            debug!(id, project = %project.path(), "plugin already applied");
            return Ok(false);
        }

        info!(id, project = %project.path(), "applying plugin");
        plugin.apply(project, self)?;
        Ok(true)
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GirderError;
    use crate::project::ProjectPath;

    struct DocsPlugin;

    impl Plugin for DocsPlugin {
        fn id(&self) -> &str {
            "docs"
        }

        fn apply(&self, project: &mut Project, plugins: &PluginRegistry) -> Result<()> {
            plugins.apply("base", project)?;
            project
                .tasks
                .add("javadoc")?
                .with_description("Generates the API documentation.");
            Ok(())
        }
    }

    fn project() -> Project {
        Project::new(ProjectPath::root(), "/w", "/w")
    }

    #[test]
    fn test_unknown_plugin() {
        let registry = PluginRegistry::with_builtins();
        let err = registry.apply("groovy", &mut project()).unwrap_err();
        assert!(matches!(
            err,
            GirderError::Config(ConfigError::UnknownPlugin(ref id)) if id == "groovy"
        ));
    }

    #[test]
    fn test_apply_is_idempotent() {
        let registry = PluginRegistry::with_builtins();
        let mut project = project();
        assert!(registry.apply("base", &mut project).unwrap());
        // a second application would fail on duplicate tasks if it ran
        assert!(!registry.apply("base", &mut project).unwrap());
    }

    #[test]
    fn test_plugin_applies_prerequisite() {
        let mut registry = PluginRegistry::with_builtins();
        registry.register(DocsPlugin);
        let mut project = project();

        registry.apply("docs", &mut project).unwrap();
        assert!(project.has_plugin("base"));
        assert!(project.tasks.contains("javadoc"));
        assert!(project.tasks.contains("build"));

        // base already applied, so applying it directly is a no-op
        assert!(!registry.apply("base", &mut project).unwrap());
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["base", "docs"]);
    }
}
