//! Error types for Girder

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using GirderError
pub type Result<T> = std::result::Result<T, GirderError>;

/// Main error type for Girder operations
#[derive(Debug, Error)]
pub enum GirderError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Convention mapping and registry errors
    #[error(transparent)]
    Convention(#[from] ConventionError),

    /// Project model errors
    #[error(transparent)]
    Project(#[from] ProjectError),

    /// Task model errors
    #[error(transparent)]
    Task(#[from] TaskError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Build file not found at or above {0}")]
    NotFound(PathBuf),

    /// Failed to parse configuration
    #[error("Failed to parse build file: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// Unknown plugin id
    #[error("Plugin with id '{0}' not found")]
    UnknownPlugin(String),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading build file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while resolving convention-mapped properties or facets
#[derive(Debug, Error)]
pub enum ConventionError {
    /// A property was read with neither an explicit value nor a convention
    #[error("No value or convention mapping for property '{property}' of {object}")]
    UnresolvedProperty { property: String, object: String },

    /// A convention facet lookup failed
    #[error("Convention '{key}' is not registered in project {project}")]
    ConventionNotFound { key: String, project: String },

    /// A facet was registered twice under the same key
    #[error("Convention '{key}' is already registered in project {project}")]
    DuplicateConvention { key: String, project: String },

    /// A convention computation failed
    #[error("Could not resolve property '{property}' of {object}: {source:#}")]
    ResolutionFailed {
        property: String,
        object: String,
        #[source]
        source: anyhow::Error,
    },

    /// A resolved value had an unexpected type
    #[error("Property '{property}' of {object} is a {found}, expected {expected}")]
    TypeMismatch {
        property: String,
        object: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Project model errors
#[derive(Debug, Error)]
pub enum ProjectError {
    /// Invalid project path
    #[error("Invalid project path '{0}': must start with ':' and every segment must be a plain name")]
    InvalidPath(String),

    /// Project not found
    #[error("Project '{0}' not found")]
    NotFound(String),

    /// Project declared twice
    #[error("Project '{0}' is already defined")]
    Duplicate(String),

    /// Parent project missing
    #[error("Parent project '{parent}' of '{project}' does not exist")]
    MissingParent { project: String, parent: String },

    /// Configuration not found
    #[error("Configuration '{configuration}' not found in project {project}")]
    ConfigurationNotFound {
        configuration: String,
        project: String,
    },

    /// Configuration declared twice
    #[error("Configuration '{configuration}' is already defined in project {project}")]
    DuplicateConfiguration {
        configuration: String,
        project: String,
    },

    /// Source set declared twice
    #[error("Source set '{source_set}' is already defined in project {project}")]
    DuplicateSourceSet { source_set: String, project: String },

    /// Configuration extension cycle
    #[error("Configuration hierarchy of project {project} is cyclic: {cycle}")]
    ConfigurationCycle { project: String, cycle: String },

    /// Project dependency cycle
    #[error("Circular project dependencies detected: {0}")]
    DependencyCycle(String),
}

/// Task model errors
#[derive(Debug, Error)]
pub enum TaskError {
    /// Invalid task path
    #[error("Invalid task path '{0}'")]
    InvalidPath(String),

    /// Task not found
    #[error("Task '{0}' not found")]
    NotFound(String),

    /// Task declared twice
    #[error("Task '{task}' is already defined in project {project}")]
    Duplicate { task: String, project: String },
}

impl GirderError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_property_message_names_property_and_object() {
        let err = ConventionError::UnresolvedProperty {
            property: "destinationDir".to_string(),
            object: "task ':core:compile'".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("destinationDir"));
        assert!(msg.contains(":core:compile"));
    }

    #[test]
    fn test_resolution_failure_includes_cause() {
        let err = ConventionError::ResolutionFailed {
            property: "classpath".to_string(),
            object: "task ':compile'".to_string(),
            source: anyhow::anyhow!("facet missing"),
        };
        assert!(err.to_string().contains("facet missing"));
    }

    #[test]
    fn test_transparent_wrapping() {
        let err: GirderError = ProjectError::NotFound(":missing".to_string()).into();
        assert_eq!(err.to_string(), "Project ':missing' not found");
    }
}
