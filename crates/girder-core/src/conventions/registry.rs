//! Per-project registry of convention facets

use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::error::ConventionError;

/// Key a facet is registered under
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConventionKey {
    /// Looked up by capability (the facet's Rust type)
    Type(&'static str),
    /// Looked up by logical name
    Name(String),
}

impl ConventionKey {
    /// Key for a facet type
    pub fn of<F: Any>() -> Self {
        Self::Type(type_name::<F>())
    }

    /// Key for a logical name
    pub fn named(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }
}

impl fmt::Display for ConventionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(t) => write!(f, "{}", t),
            Self::Name(n) => write!(f, "{}", n),
        }
    }
}

/// Registry of plugin-contributed convention facets, owned by one project.
///
/// Populated during the configuration phase and only read afterwards. A key
/// can be registered once; a second registration fails and leaves the first
/// facet in place.
pub struct ConventionRegistry {
    project: String,
    facets: BTreeMap<ConventionKey, Box<dyn Any + Send + Sync>>,
}

impl ConventionRegistry {
    /// Create an empty registry for the given project
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            facets: BTreeMap::new(),
        }
    }

    /// Path of the owning project
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Register a facet under its type
    pub fn register<F: Any + Send + Sync>(&mut self, facet: F) -> Result<(), ConventionError> {
        self.insert(ConventionKey::of::<F>(), Box::new(facet))
    }

    /// Register a facet under a logical name
    pub fn register_named<F: Any + Send + Sync>(
        &mut self,
        name: impl Into<String>,
        facet: F,
    ) -> Result<(), ConventionError> {
        self.insert(ConventionKey::named(name), Box::new(facet))
    }

    fn insert(
        &mut self,
        key: ConventionKey,
        facet: Box<dyn Any + Send + Sync>,
    ) -> Result<(), ConventionError> {
        if self.facets.contains_key(&key) {
            return Err(ConventionError::DuplicateConvention {
                key: key.to_string(),
                project: self.project.clone(),
            });
        }
        debug!(project = %self.project, key = %key, "registering convention");
        self.facets.insert(key, facet);
        Ok(())
    }

    /// Look up a facet by type
    pub fn lookup<F: Any>(&self) -> Result<&F, ConventionError> {
        let key = ConventionKey::of::<F>();
        self.facets
            .get(&key)
            .and_then(|f| f.downcast_ref::<F>())
            .ok_or_else(|| self.not_found(&key))
    }

    /// Look up a facet by type for modification
    pub fn lookup_mut<F: Any>(&mut self) -> Result<&mut F, ConventionError> {
        let key = ConventionKey::of::<F>();
        match self.facets.get_mut(&key).and_then(|f| f.downcast_mut::<F>()) {
            Some(facet) => Ok(facet),
            None => Err(ConventionError::ConventionNotFound {
                key: key.to_string(),
                project: self.project.clone(),
            }),
        }
    }

    /// Look up a facet by logical name.
    ///
    /// A facet registered under the name but of another type counts as absent.
    pub fn lookup_named<F: Any>(&self, name: &str) -> Result<&F, ConventionError> {
        let key = ConventionKey::named(name);
        self.facets
            .get(&key)
            .and_then(|f| f.downcast_ref::<F>())
            .ok_or_else(|| ConventionError::ConventionNotFound {
                key: format!("{} ({})", name, type_name::<F>()),
                project: self.project.clone(),
            })
    }

    /// Look up a named facet for modification
    pub fn lookup_named_mut<F: Any>(&mut self, name: &str) -> Result<&mut F, ConventionError> {
        let key = ConventionKey::named(name);
        match self.facets.get_mut(&key).and_then(|f| f.downcast_mut::<F>()) {
            Some(facet) => Ok(facet),
            None => Err(ConventionError::ConventionNotFound {
                key: format!("{} ({})", name, type_name::<F>()),
                project: self.project.clone(),
            }),
        }
    }

    /// Whether anything is registered under the key
    pub fn contains(&self, key: &ConventionKey) -> bool {
        self.facets.contains_key(key)
    }

    /// All registered keys
    pub fn keys(&self) -> impl Iterator<Item = &ConventionKey> {
        self.facets.keys()
    }

    pub fn len(&self) -> usize {
        self.facets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    fn not_found(&self, key: &ConventionKey) -> ConventionError {
        ConventionError::ConventionNotFound {
            key: key.to_string(),
            project: self.project.clone(),
        }
    }
}

impl fmt::Debug for ConventionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConventionRegistry")
            .field("project", &self.project)
            .field("keys", &self.facets.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct JavaConvention {
        source_compatibility: String,
    }

    #[derive(Debug)]
    struct ReportingConvention;

    #[test]
    fn test_register_and_lookup_by_type() {
        let mut registry = ConventionRegistry::new(":core");
        registry
            .register(JavaConvention {
                source_compatibility: "1.5".to_string(),
            })
            .unwrap();

        let facet = registry.lookup::<JavaConvention>().unwrap();
        assert_eq!(facet.source_compatibility, "1.5");
    }

    #[test]
    fn test_lookup_missing_fails_with_key_and_project() {
        let registry = ConventionRegistry::new(":core");
        let err = registry.lookup::<ReportingConvention>().unwrap_err();
        match err {
            ConventionError::ConventionNotFound { key, project } => {
                assert!(key.contains("ReportingConvention"));
                assert_eq!(project, ":core");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_register_twice_keeps_first() {
        let mut registry = ConventionRegistry::new(":");
        registry
            .register(JavaConvention {
                source_compatibility: "1.5".to_string(),
            })
            .unwrap();

        let err = registry
            .register(JavaConvention {
                source_compatibility: "1.6".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, ConventionError::DuplicateConvention { .. }));

        assert_eq!(
            registry.lookup::<JavaConvention>().unwrap().source_compatibility,
            "1.5"
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_named_lookup() {
        let mut registry = ConventionRegistry::new(":");
        registry
            .register_named(
                "java",
                JavaConvention {
                    source_compatibility: "1.5".to_string(),
                },
            )
            .unwrap();

        assert!(registry.lookup_named::<JavaConvention>("java").is_ok());
        assert!(registry.lookup_named::<JavaConvention>("groovy").is_err());
        // right name, wrong type
        assert!(registry.lookup_named::<ReportingConvention>("java").is_err());
        // named registration does not satisfy a type lookup
        assert!(registry.lookup::<JavaConvention>().is_err());
    }

    #[test]
    fn test_lookup_mut_changes_state() {
        let mut registry = ConventionRegistry::new(":");
        registry
            .register(JavaConvention {
                source_compatibility: "1.5".to_string(),
            })
            .unwrap();

        registry
            .lookup_mut::<JavaConvention>()
            .unwrap()
            .source_compatibility = "1.6".to_string();

        assert_eq!(
            registry.lookup::<JavaConvention>().unwrap().source_compatibility,
            "1.6"
        );
    }

    #[test]
    fn test_lookup_named_mut_changes_state() {
        let mut registry = ConventionRegistry::new(":core");
        registry
            .register_named(
                "java",
                JavaConvention {
                    source_compatibility: "1.5".to_string(),
                },
            )
            .unwrap();

        registry
            .lookup_named_mut::<JavaConvention>("java")
            .unwrap()
            .source_compatibility = "1.7".to_string();
        assert_eq!(
            registry
                .lookup_named::<JavaConvention>("java")
                .unwrap()
                .source_compatibility,
            "1.7"
        );

        let err = registry
            .lookup_named_mut::<ReportingConvention>("java")
            .unwrap_err();
        match err {
            ConventionError::ConventionNotFound { key, project } => {
                assert!(key.starts_with("java ("));
                assert_eq!(project, ":core");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_key_display() {
        assert_eq!(ConventionKey::named("java").to_string(), "java");
        assert!(ConventionKey::of::<JavaConvention>()
            .to_string()
            .ends_with("JavaConvention"));
    }
}
