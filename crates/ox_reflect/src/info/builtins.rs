//! Built-in type singletons.
//!
//! Each builtin is a per-thread singleton so that every resolution of,
//! say, `Integer` yields the same handle and [`Type::same`] holds. The
//! registry registers these same handles on construction.

use crate::info::type_info::{Type, TypeKind, TypeRef};

thread_local! {
    static BOOLEAN: TypeRef = Type::new_builtin("Boolean", TypeKind::Boolean);
    static INTEGER: TypeRef = Type::new_builtin("Integer", TypeKind::Integer);
    static DOUBLE: TypeRef = Type::new_builtin("Double", TypeKind::Double);
    static STRING: TypeRef = Type::new_builtin("String", TypeKind::String);
    static OBJECT: TypeRef = Type::new_class("Object", true, None, Vec::new(), None);
    static TYPE: TypeRef = Type::new_builtin("Type", TypeKind::Meta);
}

/// The `Boolean` type.
pub fn boolean_type() -> TypeRef {
    BOOLEAN.with(TypeRef::clone)
}

/// The `Integer` type.
pub fn integer_type() -> TypeRef {
    INTEGER.with(TypeRef::clone)
}

/// The `Double` type.
pub fn double_type() -> TypeRef {
    DOUBLE.with(TypeRef::clone)
}

/// The `String` type.
pub fn string_type() -> TypeRef {
    STRING.with(TypeRef::clone)
}

/// The root `Object` class. Every class ultimately inherits from it.
pub fn object_class() -> TypeRef {
    OBJECT.with(TypeRef::clone)
}

/// The `Type` metatype, the type of type descriptors themselves.
pub fn type_class() -> TypeRef {
    TYPE.with(TypeRef::clone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::Type;

    #[test]
    fn singletons_are_stable() {
        assert!(Type::same(&integer_type(), &integer_type()));
        assert!(!Type::same(&integer_type(), &double_type()));
        assert!(type_class().is_meta());
        assert!(object_class().is_class());
    }
}
