//! Convention mapping
//!
//! Plugins contribute *facets* to a project's [`ConventionRegistry`] and map
//! default computations onto the properties of tasks and other configurable
//! objects. A build file or another plugin can override any property with an
//! explicit value; the explicit value always wins, while later plugins may
//! still replace the default for properties nobody set.

mod mapping;
mod registry;
mod value;

pub use mapping::{
    ConventionAware, ConventionMapping, ConventionValue, PropertySource, ResolvedProperty,
};
pub use registry::{ConventionKey, ConventionRegistry};
pub use value::PropertyValue;
