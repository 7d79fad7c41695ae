//! Convention mapping: explicit values layered over deferred defaults

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::ConventionError;

use super::registry::ConventionRegistry;
use super::value::PropertyValue;

/// A deferred default for a property.
///
/// Receives the owning project's registry and the configurable object
/// itself, so a default may depend on facets and on sibling properties.
pub type ConventionValue<T> =
    Arc<dyn Fn(&ConventionRegistry, &T) -> anyhow::Result<PropertyValue> + Send + Sync>;

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertySource {
    /// Set by the user or a plugin with `set`
    Explicit,
    /// Computed by a convention mapping
    Convention,
}

/// Property values of one configurable object.
///
/// Explicit values always win. A convention mapping is kept while an explicit
/// value shadows it and is never consulted until the explicit value is
/// removed. Convention results are not cached: every read re-runs the
/// computation so it observes the current facet state.
pub struct ConventionMapping<T> {
    explicit: BTreeMap<String, PropertyValue>,
    conventions: BTreeMap<String, ConventionValue<T>>,
}

impl<T> ConventionMapping<T> {
    pub fn new() -> Self {
        Self {
            explicit: BTreeMap::new(),
            conventions: BTreeMap::new(),
        }
    }

    /// Set an explicit value, shadowing any convention for the property
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        self.explicit.insert(name.into(), value.into());
    }

    /// Remove an explicit value, exposing the convention again
    pub fn unset(&mut self, name: &str) -> Option<PropertyValue> {
        self.explicit.remove(name)
    }

    /// Register the default computation for a property.
    ///
    /// A later call for the same name replaces the earlier default.
    pub fn map<F>(&mut self, name: impl Into<String>, compute: F)
    where
        F: Fn(&ConventionRegistry, &T) -> anyhow::Result<PropertyValue> + Send + Sync + 'static,
    {
        self.conventions.insert(name.into(), Arc::new(compute));
    }

    /// Whether an explicit value is set
    pub fn is_explicit(&self, name: &str) -> bool {
        self.explicit.contains_key(name)
    }

    /// Whether a convention mapping exists
    pub fn has_convention(&self, name: &str) -> bool {
        self.conventions.contains_key(name)
    }

    /// Whether the property can be resolved at all
    pub fn contains(&self, name: &str) -> bool {
        self.is_explicit(name) || self.has_convention(name)
    }

    /// Names of all properties with an explicit value or a convention
    pub fn property_names(&self) -> BTreeSet<&str> {
        self.explicit
            .keys()
            .chain(self.conventions.keys())
            .map(String::as_str)
            .collect()
    }
}

impl<T: ConventionAware> ConventionMapping<T> {
    /// Resolve a property of `owner`
    pub fn get(
        &self,
        name: &str,
        registry: &ConventionRegistry,
        owner: &T,
    ) -> Result<PropertyValue, ConventionError> {
        if let Some(value) = self.explicit.get(name) {
            return Ok(value.clone());
        }

        let compute = self
            .conventions
            .get(name)
            .ok_or_else(|| ConventionError::UnresolvedProperty {
                property: name.to_string(),
                object: owner.display_name(),
            })?;

        debug!(property = name, object = %owner.display_name(), "resolving convention");
        compute(registry, owner).map_err(|source| ConventionError::ResolutionFailed {
            property: name.to_string(),
            object: owner.display_name(),
            source,
        })
    }
}

impl<T> Default for ConventionMapping<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ConventionMapping<T> {
    fn clone(&self) -> Self {
        Self {
            explicit: self.explicit.clone(),
            conventions: self.conventions.clone(),
        }
    }
}

impl<T> fmt::Debug for ConventionMapping<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConventionMapping")
            .field("explicit", &self.explicit)
            .field("conventions", &self.conventions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A resolved property as reported by [`ConventionAware::resolve_all`]
#[derive(Debug)]
pub struct ResolvedProperty {
    pub name: String,
    pub source: PropertySource,
    pub value: Result<PropertyValue, ConventionError>,
}

/// An object whose properties are resolved through a [`ConventionMapping`]
pub trait ConventionAware: Sized {
    fn convention_mapping(&self) -> &ConventionMapping<Self>;

    fn convention_mapping_mut(&mut self) -> &mut ConventionMapping<Self>;

    /// Human-readable identity used in error messages
    fn display_name(&self) -> String;

    /// Resolve a property
    fn property(
        &self,
        name: &str,
        registry: &ConventionRegistry,
    ) -> Result<PropertyValue, ConventionError> {
        self.convention_mapping().get(name, registry, self)
    }

    /// Resolve a property that must be a single path
    fn get_path(
        &self,
        name: &str,
        registry: &ConventionRegistry,
    ) -> Result<PathBuf, ConventionError> {
        let value = self.property(name, registry)?;
        value
            .as_path()
            .map(|p| p.to_path_buf())
            .ok_or_else(|| self.mismatch(name, "path", &value))
    }

    /// Resolve a property that must be a string
    fn get_string(
        &self,
        name: &str,
        registry: &ConventionRegistry,
    ) -> Result<String, ConventionError> {
        let value = self.property(name, registry)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.mismatch(name, "string", &value))
    }

    /// Resolve a property that must be a boolean
    fn get_bool(
        &self,
        name: &str,
        registry: &ConventionRegistry,
    ) -> Result<bool, ConventionError> {
        let value = self.property(name, registry)?;
        value
            .as_bool()
            .ok_or_else(|| self.mismatch(name, "bool", &value))
    }

    /// Resolve every known property, keeping per-property failures
    fn resolve_all(&self, registry: &ConventionRegistry) -> Vec<ResolvedProperty> {
        let mapping = self.convention_mapping();
        mapping
            .property_names()
            .into_iter()
            .map(|name| ResolvedProperty {
                name: name.to_string(),
                source: if mapping.is_explicit(name) {
                    PropertySource::Explicit
                } else {
                    PropertySource::Convention
                },
                value: self.property(name, registry),
            })
            .collect()
    }

    #[doc(hidden)]
    fn mismatch(&self, name: &str, expected: &'static str, found: &PropertyValue) -> ConventionError {
        ConventionError::TypeMismatch {
            property: name.to_string(),
            object: self.display_name(),
            expected,
            found: found.type_name(),
        }
    }
}
