//! Task paths

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::TaskError;
use crate::project::ProjectPath;

/// Unique identifier for a task within the project tree
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskPath {
    /// Owning project
    pub project: ProjectPath,
    /// Task name (e.g., "compile", "test", "jar")
    pub name: String,
}

impl TaskPath {
    const HISTORY_DIR_SUFFIX: &'static str = ".d";
    const HISTORY_FILE_SUFFIX: &'static str = ".ts";

    /// Create a new task path
    pub fn new(project: ProjectPath, name: impl Into<String>) -> Self {
        Self {
            project,
            name: name.into(),
        }
    }

    /// Parse an absolute task path such as `:build` or `:core:compile`
    pub fn parse(s: &str) -> Result<Self, TaskError> {
        let invalid = || TaskError::InvalidPath(s.to_string());

        let idx = s.rfind(ProjectPath::SEPARATOR).ok_or_else(invalid)?;
        let name = &s[idx + 1..];
        if !ProjectPath::is_valid_segment(name) {
            return Err(invalid());
        }
        let project = match &s[..idx] {
            "" => ProjectPath::root(),
            ":" => return Err(invalid()),
            project => ProjectPath::parse(project).map_err(|_| invalid())?,
        };
        Ok(Self::new(project, name))
    }

    /// Resolve either a local task name or an absolute path
    pub fn resolve(relative_to: &ProjectPath, s: &str) -> Result<Self, TaskError> {
        if s.contains(ProjectPath::SEPARATOR) {
            Self::parse(s)
        } else if !ProjectPath::is_valid_segment(s) {
            Err(TaskError::InvalidPath(s.to_string()))
        } else {
            Ok(Self::new(relative_to.clone(), s))
        }
    }

    /// Relative location of the per-task file: `:a:build:jar` maps to
    /// `a.d/build.d/jar.ts`. Project segments become `.d` directories and
    /// the task a `.ts` file, so no task file ever shares a name with the
    /// directory of a subproject.
    pub fn history_segments(&self) -> PathBuf {
        let mut path: PathBuf = self
            .project
            .segments()
            .map(|segment| format!("{}{}", segment, Self::HISTORY_DIR_SUFFIX))
            .collect();
        path.push(format!("{}{}", self.name, Self::HISTORY_FILE_SUFFIX));
        path
    }

    /// Inverse of [`TaskPath::history_segments`]; `None` for paths that are
    /// not task files
    pub fn from_history_segments<'a>(
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Option<Self> {
        let segments: Vec<&str> = segments.into_iter().collect();
        let (file, dirs) = segments.split_last()?;
        let name = file.strip_suffix(Self::HISTORY_FILE_SUFFIX)?;
        let mut project = ProjectPath::root();
        for dir in dirs {
            let segment = dir.strip_suffix(Self::HISTORY_DIR_SUFFIX)?;
            if !ProjectPath::is_valid_segment(segment) {
                return None;
            }
            project = project.child(segment);
        }
        ProjectPath::is_valid_segment(name).then(|| Self::new(project, name))
    }

    /// Whether every segment can be placed on disk
    pub fn is_well_formed(&self) -> bool {
        ProjectPath::is_valid_segment(&self.name)
            && self.project.segments().all(ProjectPath::is_valid_segment)
    }
}

impl fmt::Display for TaskPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.project.is_root() {
            write!(f, ":{}", self.name)
        } else {
            write!(f, "{}:{}", self.project, self.name)
        }
    }
}

impl TryFrom<String> for TaskPath {
    type Error = TaskError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TaskPath> for String {
    fn from(value: TaskPath) -> Self {
        value.to_string()
    }
}
