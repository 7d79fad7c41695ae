//! Property values

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A resolved property value.
///
/// Strings coming from a build file deserialize as [`PropertyValue::String`];
/// the path accessors accept them, so a user can write `"out/classes"` where a
/// plugin's convention would produce a [`PropertyValue::Path`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean flag
    Bool(bool),
    /// Integer
    Integer(i64),
    /// Free-form string
    String(String),
    /// List of strings
    List(Vec<String>),
    /// A single file system location
    Path(PathBuf),
    /// Several file system locations
    Paths(Vec<PathBuf>),
}

impl PropertyValue {
    /// Name of the variant, used in type mismatch errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Path(_) => "path",
            Self::Paths(_) => "paths",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Interpret the value as a single path
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p),
            Self::String(s) => Some(Path::new(s)),
            _ => None,
        }
    }

    /// Interpret the value as a set of paths
    pub fn as_paths(&self) -> Option<Vec<PathBuf>> {
        match self {
            Self::Path(p) => Some(vec![p.clone()]),
            Self::Paths(ps) => Some(ps.clone()),
            Self::String(s) => Some(vec![PathBuf::from(s)]),
            Self::List(items) => Some(items.iter().map(PathBuf::from).collect()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::String(s) => write!(f, "{}", s),
            Self::List(items) => write!(f, "[{}]", items.join(", ")),
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Paths(ps) => {
                let joined: Vec<String> = ps.iter().map(|p| p.display().to_string()).collect();
                write!(f, "[{}]", joined.join(", "))
            }
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<PathBuf> for PropertyValue {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for PropertyValue {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<PathBuf>> for PropertyValue {
    fn from(value: Vec<PathBuf>) -> Self {
        Self::Paths(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_is_usable_as_path() {
        let value = PropertyValue::from("out/classes");
        assert_eq!(value.as_path(), Some(Path::new("out/classes")));
        assert_eq!(value.as_paths(), Some(vec![PathBuf::from("out/classes")]));
    }

    #[test]
    fn test_deserialize_untagged() {
        let values: Vec<PropertyValue> =
            serde_json::from_str(r#"[true, 7, "text", ["a", "b"]]"#).unwrap();
        assert_eq!(values[0], PropertyValue::Bool(true));
        assert_eq!(values[1], PropertyValue::Integer(7));
        assert_eq!(values[2], PropertyValue::String("text".to_string()));
        assert_eq!(
            values[3],
            PropertyValue::List(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(PropertyValue::from(true).to_string(), "true");
        assert_eq!(
            PropertyValue::Paths(vec![PathBuf::from("a"), PathBuf::from("b")]).to_string(),
            "[a, b]"
        );
    }

    #[test]
    fn test_type_name() {
        assert_eq!(PropertyValue::from(PathBuf::from("x")).type_name(), "path");
        assert_eq!(PropertyValue::from(3i64).type_name(), "integer");
    }
}
