//! Name-based type resolution.

mod type_registry;

pub use type_registry::{ResolveError, TemplateDefinition, TypeRegistry};
