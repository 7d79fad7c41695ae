//! The `base` plugin: standard configurations and lifecycle tasks

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::conventions::{ConventionAware, PropertyValue};
use crate::error::Result;
use crate::expand::{CrossProjectDependency, Direction};
use crate::project::{ConfigurationContainer, Configuration, Project, ProjectLayout};
use crate::task::{ActionOutcome, TaskAction, TaskPath};

use super::{Plugin, PluginRegistry};

pub const COMPILE_CONFIGURATION: &str = "compile";
pub const RUNTIME_CONFIGURATION: &str = "runtime";
pub const TEST_COMPILE_CONFIGURATION: &str = "testCompile";
pub const TEST_RUNTIME_CONFIGURATION: &str = "testRuntime";
pub const ARCHIVES_CONFIGURATION: &str = "archives";
pub const DEFAULT_CONFIGURATION: &str = "default";

pub const CLEAN_TASK: &str = "clean";
pub const ASSEMBLE_TASK: &str = "assemble";
pub const CHECK_TASK: &str = "check";
pub const BUILD_TASK: &str = "build";
pub const BUILD_NEEDED_TASK: &str = "buildNeeded";
pub const BUILD_DEPENDENTS_TASK: &str = "buildDependents";

/// Facet holding the directory names the base plugin derives paths from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseConvention {
    pub libs_dir_name: String,
    pub distributions_dir_name: String,
}

impl Default for BaseConvention {
    fn default() -> Self {
        Self {
            libs_dir_name: "libs".to_string(),
            distributions_dir_name: "distributions".to_string(),
        }
    }
}

impl BaseConvention {
    pub fn libs_dir(&self, layout: &ProjectLayout) -> PathBuf {
        layout.build_dir.join(&self.libs_dir_name)
    }

    pub fn distributions_dir(&self, layout: &ProjectLayout) -> PathBuf {
        layout.build_dir.join(&self.distributions_dir_name)
    }
}

pub struct BasePlugin;

impl Plugin for BasePlugin {
    fn id(&self) -> &str {
        "base"
    }

    fn description(&self) -> &str {
        "Standard configurations and lifecycle tasks"
    }

    fn apply(&self, project: &mut Project, _plugins: &PluginRegistry) -> Result<()> {
        project.conventions_mut().register(BaseConvention::default())?;

        configure_configurations(&mut project.configurations)?;
        configure_destination_dir(project);
        configure_clean(project)?;
        configure_lifecycle(project)?;

        debug!(project = %project.path(), "base plugin applied");
        Ok(())
    }
}

fn ensure<'a>(
    configurations: &'a mut ConfigurationContainer,
    name: &str,
) -> Result<&'a mut Configuration> {
    if configurations.contains(name) {
        Ok(configurations.get_mut(name)?)
    } else {
        Ok(configurations.add(name)?)
    }
}

fn configure_configurations(configurations: &mut ConfigurationContainer) -> Result<()> {
    ensure(configurations, COMPILE_CONFIGURATION)?
        .with_visible(false)
        .with_description("Classpath for compiling the sources.");
    ensure(configurations, RUNTIME_CONFIGURATION)?
        .with_visible(false)
        .with_description("Classpath for running the compiled sources.");
    ensure(configurations, TEST_COMPILE_CONFIGURATION)?
        .with_visible(false)
        .with_transitive(false)
        .with_description("Classpath for compiling the test sources.");
    ensure(configurations, TEST_RUNTIME_CONFIGURATION)?
        .with_visible(false)
        .with_description("Classpath for running the test sources.");
    ensure(configurations, ARCHIVES_CONFIGURATION)?
        .with_description("Artifacts produced by this project.");
    ensure(configurations, DEFAULT_CONFIGURATION)?
        .with_description("Configuration used by other projects depending on this one.");

    configurations.extend(RUNTIME_CONFIGURATION, COMPILE_CONFIGURATION)?;
    configurations.extend(TEST_COMPILE_CONFIGURATION, COMPILE_CONFIGURATION)?;
    configurations.extend(TEST_RUNTIME_CONFIGURATION, RUNTIME_CONFIGURATION)?;
    configurations.extend(TEST_RUNTIME_CONFIGURATION, TEST_COMPILE_CONFIGURATION)?;
    configurations.extend(DEFAULT_CONFIGURATION, RUNTIME_CONFIGURATION)?;
    configurations.extend(DEFAULT_CONFIGURATION, ARCHIVES_CONFIGURATION)?;
    Ok(())
}

/// Every task of the project writes below `<build dir>/<task name>` unless
/// told otherwise
fn configure_destination_dir(project: &mut Project) {
    project.tasks.all(|task| {
        task.convention_mapping_mut()
            .map("destinationDir", |registry, task| {
                let layout = registry.lookup::<ProjectLayout>()?;
                Ok(PropertyValue::Path(layout.build_dir.join(task.name())))
            });
    });
}

fn configure_clean(project: &mut Project) -> Result<()> {
    let clean = project.tasks.add(CLEAN_TASK)?;
    clean.with_description("Deletes the build directory.");
    clean.convention_mapping_mut().map("target", |registry, _| {
        let layout = registry.lookup::<ProjectLayout>()?;
        Ok(PropertyValue::Path(layout.build_dir.clone()))
    });
    clean.do_last(TaskAction::new("delete target", |ctx| {
        let target = ctx.task.get_path("target", ctx.conventions())?;
        delete(&ctx.project.resolve_file(target))
    }));
    Ok(())
}

fn delete(target: &Path) -> anyhow::Result<ActionOutcome> {
    if !target.exists() {
        return Ok(ActionOutcome::NoWork);
    }
    debug!(path = %target.display(), "deleting");
    if target.is_dir() {
        std::fs::remove_dir_all(target)?;
    } else {
        std::fs::remove_file(target)?;
    }
    Ok(ActionOutcome::DidWork)
}

fn configure_lifecycle(project: &mut Project) -> Result<()> {
    let path = project.path().clone();
    let local = |name: &str| TaskPath::new(path.clone(), name);

    let assemble = project.tasks.add(ASSEMBLE_TASK)?;
    assemble.with_description("Assembles the outputs of this project.");
    assemble.convention_mapping_mut().map("libsDir", |registry, _| {
        let layout = registry.lookup::<ProjectLayout>()?;
        Ok(registry.lookup::<BaseConvention>()?.libs_dir(layout).into())
    });
    assemble
        .convention_mapping_mut()
        .map("distributionsDir", |registry, _| {
            let layout = registry.lookup::<ProjectLayout>()?;
            Ok(registry
                .lookup::<BaseConvention>()?
                .distributions_dir(layout)
                .into())
        });

    project
        .tasks
        .add(CHECK_TASK)?
        .with_description("Runs all checks.");

    project
        .tasks
        .add(BUILD_TASK)?
        .with_description("Assembles and tests this project.")
        .depends_on(local(ASSEMBLE_TASK))
        .depends_on(local(CHECK_TASK));

    project
        .tasks
        .add(BUILD_NEEDED_TASK)?
        .with_description("Assembles and tests this project and all projects it depends on.")
        .depends_on(local(BUILD_TASK))
        .depends_on_projects(CrossProjectDependency::new(
            Direction::DependedOn,
            BUILD_TASK,
            TEST_RUNTIME_CONFIGURATION,
        ));

    project
        .tasks
        .add(BUILD_DEPENDENTS_TASK)?
        .with_description("Assembles and tests this project and all projects that depend on it.")
        .depends_on(local(BUILD_TASK))
        .depends_on_projects(CrossProjectDependency::new(
            Direction::Dependents,
            BUILD_TASK,
            TEST_RUNTIME_CONFIGURATION,
        ));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ProjectPath;
    use tempfile::TempDir;

    fn applied(dir: &Path) -> Project {
        let mut project = Project::new(ProjectPath::parse(":app").unwrap(), dir, dir);
        PluginRegistry::with_builtins()
            .apply("base", &mut project)
            .unwrap();
        project
    }

    #[test]
    fn test_configuration_hierarchy() {
        let project = applied(Path::new("/w/app"));
        let names: Vec<&str> = project
            .configurations
            .hierarchy(DEFAULT_CONFIGURATION)
            .unwrap()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["default", "runtime", "compile", "archives"]);
        assert!(!project.configurations.get("testCompile").unwrap().transitive);
    }

    #[test]
    fn test_build_depends_on_lifecycle_tasks() {
        let project = applied(Path::new("/w/app"));
        let build = project.tasks.get(BUILD_TASK).unwrap();
        let deps: Vec<String> = build.dependencies().iter().map(|t| t.to_string()).collect();
        assert_eq!(deps, vec![":app:assemble", ":app:check"]);

        let needed = project.tasks.get(BUILD_NEEDED_TASK).unwrap();
        assert_eq!(
            needed.cross_project_dependencies(),
            &[CrossProjectDependency::new(
                Direction::DependedOn,
                "build",
                "testRuntime"
            )]
        );
    }

    #[test]
    fn test_destination_dir_for_every_task() {
        let mut project = applied(Path::new("/w/app"));
        project.tasks.add("jar").unwrap();

        for name in ["check", "jar"] {
            let task = project.tasks.get(name).unwrap();
            assert_eq!(
                task.get_path("destinationDir", project.conventions())
                    .unwrap(),
                PathBuf::from("/w/app/build").join(name)
            );
        }
    }

    #[test]
    fn test_libs_dir_follows_facet_state() {
        let mut project = applied(Path::new("/w/app"));
        project
            .conventions_mut()
            .lookup_mut::<BaseConvention>()
            .unwrap()
            .libs_dir_name = "jars".to_string();

        let assemble = project.tasks.get(ASSEMBLE_TASK).unwrap();
        assert_eq!(
            assemble
                .get_path("libsDir", project.conventions())
                .unwrap(),
            PathBuf::from("/w/app/build/jars")
        );
    }

    #[test]
    fn test_clean_deletes_build_dir() {
        let dir = TempDir::new().unwrap();
        let project = applied(dir.path());
        std::fs::create_dir_all(dir.path().join("build/libs")).unwrap();

        let clean = project.tasks.get(CLEAN_TASK).unwrap();
        assert!(clean.run_actions(&project).unwrap());
        assert!(!dir.path().join("build").exists());
        // nothing left to delete
        assert!(!clean.run_actions(&project).unwrap());
    }
}
