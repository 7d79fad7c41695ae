//! Named source sets

use crate::conventions::{ConventionAware, ConventionMapping, PropertyValue};

use super::{ProjectLayout, ProjectPath};

/// A named group of sources (`main`, `test`) with convention-mapped
/// directories
#[derive(Debug, Clone)]
pub struct SourceSet {
    name: String,
    project: ProjectPath,
    conventions: ConventionMapping<SourceSet>,
}

impl SourceSet {
    /// Create a source set; `srcDir` defaults to `src/<name>` and `outputDir`
    /// to `<build dir>/classes/<name>`, both read from the project layout
    pub(crate) fn new(project: &ProjectPath, name: &str) -> Self {
        let mut source_set = Self {
            name: name.to_string(),
            project: project.clone(),
            conventions: ConventionMapping::new(),
        };

        let mapping = source_set.convention_mapping_mut();
        mapping.map("srcDir", |registry, set: &SourceSet| {
            let layout = registry.lookup::<ProjectLayout>()?;
            Ok(PropertyValue::Path(
                layout.project_dir.join("src").join(&set.name),
            ))
        });
        mapping.map("outputDir", |registry, set: &SourceSet| {
            let layout = registry.lookup::<ProjectLayout>()?;
            Ok(PropertyValue::Path(
                layout.build_dir.join("classes").join(&set.name),
            ))
        });
        source_set
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project(&self) -> &ProjectPath {
        &self.project
    }

    /// Set an explicit value for a property
    pub fn set(&mut self, property: &str, value: impl Into<PropertyValue>) -> &mut Self {
        self.conventions.set(property, value);
        self
    }
}

impl ConventionAware for SourceSet {
    fn convention_mapping(&self) -> &ConventionMapping<Self> {
        &self.conventions
    }

    fn convention_mapping_mut(&mut self) -> &mut ConventionMapping<Self> {
        &mut self.conventions
    }

    fn display_name(&self) -> String {
        if self.project.is_root() {
            format!("source set '{}'", self.name)
        } else {
            format!("source set '{}' of project {}", self.name, self.project)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::conventions::ConventionAware;
    use crate::project::{Project, ProjectPath};

    #[test]
    fn test_default_directories_follow_layout() {
        let mut project = Project::new(ProjectPath::parse(":app").unwrap(), "/w/app", "/w");
        project.add_source_set("main").unwrap();

        let main = project.source_set("main").unwrap();
        assert_eq!(
            main.get_path("srcDir", project.conventions()).unwrap(),
            std::path::PathBuf::from("/w/app/src/main")
        );
        assert_eq!(
            main.get_path("outputDir", project.conventions()).unwrap(),
            std::path::PathBuf::from("/w/app/build/classes/main")
        );
    }

    #[test]
    fn test_output_dir_tracks_build_dir_changes() {
        let mut project = Project::new(ProjectPath::root(), "/w", "/w");
        project.add_source_set("test").unwrap();
        project.set_build_dir("target");

        let test = project.source_set("test").unwrap();
        assert_eq!(
            test.get_path("outputDir", project.conventions()).unwrap(),
            std::path::PathBuf::from("/w/target/classes/test")
        );
    }

    #[test]
    fn test_explicit_src_dir() {
        let mut project = Project::new(ProjectPath::root(), "/w", "/w");
        project
            .add_source_set("main")
            .unwrap()
            .set("srcDir", "java/src");

        let main = project.source_set("main").unwrap();
        assert_eq!(
            main.get_path("srcDir", project.conventions()).unwrap(),
            std::path::PathBuf::from("java/src")
        );
        assert_eq!(main.display_name(), "source set 'main'");
    }
}
