//! The project tree of one build invocation

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::config::{validate_config, Config, ProjectConfig, TaskConfig};
use crate::conventions::ConventionAware;
use crate::error::{ConfigError, ProjectError, Result, TaskError};
use crate::expand::{CrossProjectDependencyExpander, Direction};
use crate::plugins::PluginRegistry;
use crate::task::{Task, TaskAction, TaskPath};

use super::configuration::Dependency;
use super::graph::ProjectGraph;
use super::path::ProjectPath;
use super::Project;

/// All projects of a build, keyed by path. The root project always exists.
#[derive(Debug)]
pub struct Workspace {
    root_dir: PathBuf,
    projects: BTreeMap<ProjectPath, Project>,
}

impl Workspace {
    /// Create a workspace holding only the root project
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        let root_dir = root_dir.into();
        let mut projects = BTreeMap::new();
        projects.insert(
            ProjectPath::root(),
            Project::new(ProjectPath::root(), root_dir.clone(), root_dir.clone()),
        );
        Self { root_dir, projects }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Add a project below an existing parent.
    ///
    /// `dir` is relative to the build root and defaults to the path segments
    /// (`:a:b` lives in `a/b`).
    pub fn add_project(
        &mut self,
        path: ProjectPath,
        dir: Option<PathBuf>,
    ) -> std::result::Result<&mut Project, ProjectError> {
        if self.projects.contains_key(&path) {
            return Err(ProjectError::Duplicate(path.to_string()));
        }
        if let Some(parent) = path.parent() {
            if !self.projects.contains_key(&parent) {
                return Err(ProjectError::MissingParent {
                    project: path.to_string(),
                    parent: parent.to_string(),
                });
            }
        }

        let dir = dir.unwrap_or_else(|| path.default_dir());
        let project_dir = if dir.is_absolute() {
            dir
        } else {
            self.root_dir.join(dir)
        };
        debug!(project = %path, dir = %project_dir.display(), "adding project");

        let project = Project::new(path.clone(), project_dir, self.root_dir.clone());
        Ok(self.projects.entry(path).or_insert(project))
    }

    pub fn root_project(&self) -> &Project {
        // the root is inserted on construction and never removed
        &self.projects[&ProjectPath::root()]
    }

    pub fn project(&self, path: &ProjectPath) -> std::result::Result<&Project, ProjectError> {
        self.projects
            .get(path)
            .ok_or_else(|| ProjectError::NotFound(path.to_string()))
    }

    pub fn project_mut(
        &mut self,
        path: &ProjectPath,
    ) -> std::result::Result<&mut Project, ProjectError> {
        self.projects
            .get_mut(path)
            .ok_or_else(|| ProjectError::NotFound(path.to_string()))
    }

    pub fn find_project(&self, path: &ProjectPath) -> Option<&Project> {
        self.projects.get(path)
    }

    /// Projects ordered by path
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Direct children of a project in the project tree
    pub fn children(&self, path: &ProjectPath) -> Vec<&Project> {
        self.projects
            .values()
            .filter(|p| p.path().parent().as_ref() == Some(path))
            .collect()
    }

    /// A task together with its owning project
    pub fn find_task(&self, path: &TaskPath) -> Option<(&Project, &Task)> {
        let project = self.projects.get(&path.project)?;
        project.tasks.get(&path.name).map(|task| (project, task))
    }

    pub fn task(&self, path: &TaskPath) -> std::result::Result<&Task, TaskError> {
        self.find_task(path)
            .map(|(_, task)| task)
            .ok_or_else(|| TaskError::NotFound(path.to_string()))
    }

    pub fn task_mut(&mut self, path: &TaskPath) -> std::result::Result<&mut Task, TaskError> {
        self.projects
            .get_mut(&path.project)
            .and_then(|project| project.tasks.get_mut(&path.name))
            .ok_or_else(|| TaskError::NotFound(path.to_string()))
    }

    /// Every task with the given name, across projects
    pub fn tasks_by_name(&self, name: &str) -> Vec<&Task> {
        self.projects
            .values()
            .filter_map(|project| project.tasks.get(name))
            .collect()
    }

    /// Every task path in the build
    pub fn task_paths(&self) -> Vec<TaskPath> {
        self.projects
            .values()
            .flat_map(|project| project.tasks.iter().map(|task| task.path().clone()))
            .collect()
    }

    /// Add dependency edges from `task` to the task named `task_name` of each
    /// project related through `configuration`. Returns the added edges.
    pub fn expand(
        &mut self,
        task: &TaskPath,
        direction: Direction,
        task_name: &str,
        configuration: &str,
    ) -> Result<Vec<TaskPath>> {
        let edges = CrossProjectDependencyExpander::new(self).expand(
            task,
            direction,
            task_name,
            configuration,
        )?;

        let target = self.task_mut(task)?;
        for edge in &edges {
            target.depends_on(edge.clone());
        }
        Ok(edges)
    }

    /// Expand every cross-project dependency declared on any task.
    ///
    /// Returns the number of edges added.
    #[instrument(skip(self), fields(projects = self.projects.len()))]
    pub fn expand_cross_project_dependencies(&mut self) -> Result<usize> {
        let declarations: Vec<_> = self
            .projects
            .values()
            .flat_map(|project| project.tasks.iter())
            .flat_map(|task| {
                task.cross_project_dependencies()
                    .iter()
                    .map(move |dependency| (task.path().clone(), dependency.clone()))
            })
            .collect();

        let mut added = 0;
        for (task, dependency) in declarations {
            added += self
                .expand(
                    &task,
                    dependency.direction,
                    &dependency.task,
                    &dependency.configuration,
                )?
                .len();
        }

        info!(edges = added, "cross-project dependencies expanded");
        Ok(added)
    }

    /// Build the workspace described by a build file: create projects, apply
    /// plugins, declare configurations, source sets and tasks, check the
    /// project graph for cycles, and expand cross-project dependencies.
    #[instrument(skip_all, fields(root = %root_dir.as_ref().display()))]
    pub fn from_config(
        root_dir: impl AsRef<Path>,
        config: &Config,
        plugins: &PluginRegistry,
    ) -> Result<Self> {
        validate_config(config)?;
        let mut workspace = Self::new(root_dir.as_ref());

        let mut declarations: Vec<(ProjectPath, &ProjectConfig)> = config
            .projects
            .iter()
            .map(|p| -> Result<(ProjectPath, &ProjectConfig)> {
                Ok((ProjectPath::parse(&p.path)?, p))
            })
            .collect::<Result<_>>()?;
        // parents before children
        declarations.sort_by(|(a, _), (b, _)| a.depth().cmp(&b.depth()).then_with(|| a.cmp(b)));

        for (path, declaration) in &declarations {
            if path.is_root() {
                if let Some(dir) = &declaration.dir {
                    if !dir.as_os_str().is_empty() && dir != Path::new(".") {
                        return Err(ConfigError::InvalidValue {
                            field: "projects.dir".to_string(),
                            message: "the root project lives in the build root".to_string(),
                        }
                        .into());
                    }
                }
            } else {
                workspace.add_project(path.clone(), declaration.dir.clone())?;
            }
        }

        // an undeclared root still gets the build-wide settings
        let implicit_root = ProjectConfig::new(":");
        let paths: Vec<ProjectPath> = workspace.projects.keys().cloned().collect();
        for path in &paths {
            let declaration = config.project(path.as_str()).unwrap_or(&implicit_root);
            let project = workspace.project_mut(path)?;
            configure_project(project, declaration, config, plugins)?;
        }

        ProjectGraph::build(&workspace).validate()?;
        workspace.expand_cross_project_dependencies()?;

        info!(
            projects = workspace.len(),
            tasks = workspace.task_paths().len(),
            "workspace configured"
        );
        Ok(workspace)
    }
}

fn configure_project(
    project: &mut Project,
    declaration: &ProjectConfig,
    config: &Config,
    plugins: &PluginRegistry,
) -> Result<()> {
    debug!(project = %project.path(), "configuring project");

    project.description = declaration.description.clone();
    project.set_build_dir(
        declaration
            .build_dir
            .as_deref()
            .unwrap_or(&config.build.build_dir),
    );

    for id in config.build.plugins.iter().chain(&declaration.plugins) {
        plugins.apply(id, project)?;
    }

    // declare every configuration before wiring hierarchies
    for (name, settings) in &declaration.configurations {
        let configuration = if project.configurations.contains(name) {
            project.configurations.get_mut(name)?
        } else {
            project.configurations.add(name)?
        };
        configuration
            .with_transitive(settings.transitive)
            .with_visible(settings.visible);
        if let Some(description) = &settings.description {
            configuration.with_description(description.clone());
        }
        for notation in &settings.dependencies {
            configuration.add_dependency(Dependency::parse(notation)?);
        }
    }
    for (name, settings) in &declaration.configurations {
        for parent in &settings.extends {
            project.configurations.extend(name, parent)?;
        }
    }

    for (name, properties) in &declaration.source_sets {
        let source_set = project.source_set_or_add(name);
        for (property, value) in properties {
            source_set.set(property, value.clone());
        }
    }

    for task_config in &declaration.tasks {
        configure_task(project, task_config)?;
    }
    Ok(())
}

fn configure_task(project: &mut Project, config: &TaskConfig) -> Result<()> {
    let project_path = project.path().clone();
    let task = if project.tasks.contains(&config.name) {
        debug!(task = %config.name, "configuring task added by a plugin");
        project
            .tasks
            .get_mut(&config.name)
            .ok_or_else(|| TaskError::NotFound(config.name.clone()))?
    } else {
        project.tasks.add(&config.name)?
    };

    if let Some(description) = &config.description {
        task.with_description(description.clone());
    }
    for dependency in &config.depends_on {
        task.depends_on(TaskPath::resolve(&project_path, dependency)?);
    }
    for dependency in &config.depends_on_projects {
        task.depends_on_projects(dependency.clone());
    }
    for (name, value) in &config.properties {
        task.convention_mapping_mut().set(name.clone(), value.clone());
    }
    for output in &config.outputs {
        task.declare_output(output.clone());
    }
    if let Some(command) = &config.command {
        task.do_last(TaskAction::shell(command.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigurationConfig, TaskConfig};
    use crate::error::GirderError;
    use crate::expand::CrossProjectDependency;

    fn p(s: &str) -> ProjectPath {
        ProjectPath::parse(s).unwrap()
    }

    fn t(s: &str) -> TaskPath {
        TaskPath::parse(s).unwrap()
    }

    fn depends_on(deps: &[&str]) -> ConfigurationConfig {
        ConfigurationConfig {
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        }
    }

    /// `:app` -> `:core` through testRuntime (inherited from compile)
    fn build_file() -> Config {
        let mut core = ProjectConfig::new(":core");
        core.tasks.push(TaskConfig::new("compile").with_command("true"));

        let mut app = ProjectConfig::new(":app");
        app.configurations
            .insert("compile".to_string(), depends_on(&[":core"]));
        let mut compile = TaskConfig::new("compile").with_depends_on("generate");
        compile.depends_on_projects.push(CrossProjectDependency::new(
            Direction::DependedOn,
            "compile",
            "compile",
        ));
        app.tasks.push(TaskConfig::new("generate"));
        app.tasks.push(compile);

        let mut config = Config {
            projects: vec![app, core],
            ..Default::default()
        };
        config.build.plugins.push("base".to_string());
        config
    }

    #[test]
    fn test_root_project_exists() {
        let ws = Workspace::new("/r");
        assert!(ws.root_project().path().is_root());
        assert_eq!(ws.root_project().project_dir(), Path::new("/r"));
        assert_eq!(ws.len(), 1);
    }

    #[test]
    fn test_add_project_requires_parent() {
        let mut ws = Workspace::new("/r");
        let err = ws.add_project(p(":libs:json"), None).unwrap_err();
        assert!(matches!(err, ProjectError::MissingParent { .. }));

        ws.add_project(p(":libs"), None).unwrap();
        let json = ws.add_project(p(":libs:json"), None).unwrap();
        assert_eq!(json.project_dir(), Path::new("/r/libs/json"));
        assert_eq!(
            ws.children(&p(":libs"))
                .iter()
                .map(|p| p.path().to_string())
                .collect::<Vec<_>>(),
            vec![":libs:json"]
        );
    }

    #[test]
    fn test_add_duplicate_project() {
        let mut ws = Workspace::new("/r");
        ws.add_project(p(":a"), Some(PathBuf::from("modules/a"))).unwrap();
        assert_eq!(
            ws.project(&p(":a")).unwrap().project_dir(),
            Path::new("/r/modules/a")
        );
        assert!(matches!(
            ws.add_project(p(":a"), None),
            Err(ProjectError::Duplicate(_))
        ));
        assert!(ws.add_project(ProjectPath::root(), None).is_err());
    }

    #[test]
    fn test_from_config_wires_tasks() {
        let ws = Workspace::from_config("/r", &build_file(), &PluginRegistry::with_builtins())
            .unwrap();

        assert_eq!(ws.len(), 3);
        let compile = ws.task(&t(":app:compile")).unwrap();
        let deps: Vec<String> = compile.dependencies().iter().map(|d| d.to_string()).collect();
        assert_eq!(deps, vec![":app:generate", ":core:compile"]);

        // base plugin on every project, root included
        assert!(ws.root_project().tasks.contains("build"));
        assert_eq!(ws.tasks_by_name("buildNeeded").len(), 3);
    }

    #[test]
    fn test_build_needed_expanded_through_test_runtime() {
        let ws = Workspace::from_config("/r", &build_file(), &PluginRegistry::with_builtins())
            .unwrap();

        let needed = ws.task(&t(":app:buildNeeded")).unwrap();
        assert!(needed.dependencies().contains(&t(":core:build")));

        let dependents = ws.task(&t(":core:buildDependents")).unwrap();
        assert!(dependents.dependencies().contains(&t(":app:build")));
    }

    #[test]
    fn test_from_config_existing_configuration_is_configured() {
        let ws = Workspace::from_config("/r", &build_file(), &PluginRegistry::with_builtins())
            .unwrap();
        let app = ws.project(&p(":app")).unwrap();
        assert_eq!(
            app.configurations.project_dependencies("testRuntime").unwrap(),
            vec![p(":core")]
        );
    }

    #[test]
    fn test_from_config_rejects_project_cycles() {
        let mut config = build_file();
        config.projects[1]
            .configurations
            .insert("compile".to_string(), depends_on(&[":app"]));

        let err = Workspace::from_config("/r", &config, &PluginRegistry::with_builtins())
            .unwrap_err();
        assert!(matches!(
            err,
            GirderError::Project(ProjectError::DependencyCycle(_))
        ));
    }

    #[test]
    fn test_from_config_rejects_unknown_extends() {
        let mut config = build_file();
        config.projects[0]
            .configurations
            .get_mut("compile")
            .unwrap()
            .extends
            .push("provided".to_string());

        assert!(Workspace::from_config("/r", &config, &PluginRegistry::with_builtins()).is_err());
    }

    #[test]
    fn test_from_config_unknown_plugin() {
        let mut config = build_file();
        config.projects[0].plugins.push("scala".to_string());
        assert!(Workspace::from_config("/r", &config, &PluginRegistry::with_builtins()).is_err());
    }

    #[test]
    fn test_task_properties_and_outputs() {
        let mut config = Config::default();
        let mut root = ProjectConfig::new(":");
        root.build_dir = Some("out".to_string());
        root.tasks.push(TaskConfig::new("jar").with_output("archive", "dist/app.jar"));
        config.projects.push(root);
        config.build.plugins.push("base".to_string());

        let ws = Workspace::from_config("/r", &config, &PluginRegistry::with_builtins()).unwrap();
        let (project, jar) = ws.find_task(&t(":jar")).unwrap();
        assert_eq!(
            jar.output_locations(project).unwrap(),
            vec![PathBuf::from("/r/dist/app.jar")]
        );
        assert_eq!(
            jar.get_path("destinationDir", project.conventions())
                .unwrap(),
            PathBuf::from("/r/out/jar")
        );
    }

    #[test]
    fn test_expand_single_declaration() {
        let mut ws = Workspace::new("/r");
        for path in [":p1", ":p2"] {
            let project = ws.add_project(p(path), None).unwrap();
            project.configurations.add("compile").unwrap();
            project.tasks.add("build").unwrap();
        }
        ws.project_mut(&p(":p1"))
            .unwrap()
            .configurations
            .get_mut("compile")
            .unwrap()
            .add_dependency(Dependency::parse(":p2").unwrap());

        let added = ws
            .expand(&t(":p1:build"), Direction::DependedOn, "build", "compile")
            .unwrap();
        assert_eq!(added, vec![t(":p2:build")]);
        assert_eq!(
            ws.task(&t(":p1:build")).unwrap().dependencies().len(),
            1
        );
    }
}
