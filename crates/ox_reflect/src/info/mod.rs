//! Runtime type descriptors.
//!
//! A [`Type`] describes a value kind at runtime: the primitives, an
//! enumeration with named elements, a class with an ordered field schema,
//! or the metatype whose values are themselves type descriptors.
//! Descriptors are shared behind [`TypeRef`] and compared by identity,
//! never structurally: two descriptors with the same name but different
//! origins are different types.

// -----------------------------------------------------------------------------
// Modules

mod builtins;
mod enumeration;
mod field_info;
mod type_info;

// -----------------------------------------------------------------------------
// Exports

pub use builtins::{
    boolean_type, double_type, integer_type, object_class, string_type, type_class,
};
pub use enumeration::EnumerationSchema;
pub use field_info::FieldInfo;
pub use type_info::{ClassSchema, Factory, TemplateSpec, Type, TypeKind, TypeRef};
