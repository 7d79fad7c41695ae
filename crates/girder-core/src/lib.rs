//! Girder Core - Project model for Girder builds
//!
//! This crate provides the project tree, configurations, tasks, the
//! convention mapping used to derive default property values, plugins and
//! build file loading.

pub mod config;
pub mod conventions;
pub mod error;
pub mod expand;
pub mod plugins;
pub mod project;
pub mod task;

pub use config::{load_config, load_config_from_dir, validate_config, Config};
pub use conventions::{ConventionAware, ConventionMapping, ConventionRegistry, PropertyValue};
pub use error::{GirderError, Result};
pub use expand::{CrossProjectDependency, CrossProjectDependencyExpander, Direction};
pub use plugins::{BasePlugin, Plugin, PluginRegistry};
pub use project::{Project, ProjectGraph, ProjectLayout, ProjectPath, SourceSet, Workspace};
pub use task::{ActionOutcome, Task, TaskAction, TaskContext, TaskPath};
