//! Project paths

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ProjectError;

/// Hierarchical path of a project: `:` for the root, `:a:b` for nested ones
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectPath(String);

impl ProjectPath {
    pub const SEPARATOR: char = ':';

    /// The root project path
    pub fn root() -> Self {
        Self(":".to_string())
    }

    /// Parse an absolute project path
    pub fn parse(s: &str) -> Result<Self, ProjectError> {
        if s == ":" {
            return Ok(Self::root());
        }
        let Some(rest) = s.strip_prefix(Self::SEPARATOR) else {
            return Err(ProjectError::InvalidPath(s.to_string()));
        };
        if !rest.split(Self::SEPARATOR).all(Self::is_valid_segment) {
            return Err(ProjectError::InvalidPath(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Whether a name can be one segment of a project or task path. Segments
    /// double as file names in the task history, so separators and `.`/`..`
    /// are rejected.
    pub fn is_valid_segment(name: &str) -> bool {
        !name.trim().is_empty()
            && name != "."
            && name != ".."
            && !name.contains(|c: char| matches!(c, '/' | '\\' | Self::SEPARATOR))
    }

    pub fn is_root(&self) -> bool {
        self.0 == ":"
    }

    /// Path of a direct child
    pub fn child(&self, name: &str) -> Self {
        if self.is_root() {
            Self(format!(":{}", name))
        } else {
            Self(format!("{}:{}", self.0, name))
        }
    }

    /// Path of the parent project, `None` for the root
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind(Self::SEPARATOR) {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Last segment, empty for the root
    pub fn name(&self) -> &str {
        self.0
            .rsplit(Self::SEPARATOR)
            .next()
            .unwrap_or_default()
    }

    /// Path segments below the root
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(Self::SEPARATOR).filter(|s| !s.is_empty())
    }

    /// Nesting depth (0 for the root)
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Directory of the project relative to the build root when none is
    /// configured: `:a:b` lives in `a/b`
    pub fn default_dir(&self) -> PathBuf {
        self.segments().collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ProjectPath {
    type Error = ProjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProjectPath> for String {
    fn from(value: ProjectPath) -> Self {
        value.0
    }
}
