//! Shallow and deep object cloning.

use crate::info::Type;
use crate::object::ObjectRef;
use crate::value::Variant;

/// Shallowly clones `object`: a fresh instance of the same class whose
/// fields hold the same values. Object-valued fields stay shared with
/// the original.
///
/// Returns `None` when the class has no registered factory.
pub fn clone_object(object: &ObjectRef) -> Option<ObjectRef> {
    let source = object.borrow();
    let class = source.class();
    let clone = Type::create_instance(&class)?;
    {
        let mut target = clone.borrow_mut();
        for index in 0..class.field_count() {
            target.set_field(index, source.get_field(index));
        }
    }
    drop(source);
    Some(clone)
}

/// Deeply clones `object`: object-valued fields are recursively cloned
/// instead of shared. Fields whose declared type is the metatype keep
/// their original value, since type descriptors are global singletons.
///
/// Returns `None` when any class on the way has no registered factory.
pub fn deep_clone(object: &ObjectRef) -> Option<ObjectRef> {
    let clone = clone_object(object)?;
    let class = clone.borrow().class();
    for index in 0..class.field_count() {
        let declared = class.field_type(index).cloned();
        let skip = declared.as_ref().is_none_or(|ty| !ty.is_class() || ty.is_meta());
        if skip {
            continue;
        }
        let value = clone.borrow().get_field(index);
        if let Some(child) = value.as_object() {
            let child_clone = deep_clone(child)?;
            clone
                .borrow_mut()
                .set_field(index, Variant::object_with_type(value.ty().clone(), child_clone));
        }
    }
    Some(clone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Pair, new_object, same_object};
    use crate::registry::TypeRegistry;
    use crate::value::Variant;

    #[test]
    fn shallow_clone_shares_child_objects() {
        let registry = TypeRegistry::new();
        let inner_class = registry.resolve("Pair<Integer,Integer>").unwrap();
        let inner = new_object(Pair::new(
            inner_class.clone(),
            Variant::integer(1),
            Variant::integer(2),
        ));
        let outer_class = registry
            .resolve("Pair<Pair<Integer,Integer>,Integer>")
            .unwrap();
        let outer = new_object(Pair::new(
            outer_class,
            Variant::object(inner.clone()),
            Variant::integer(9),
        ));

        let clone = clone_object(&outer).unwrap();
        assert!(!same_object(&outer, &clone));
        let child = clone.borrow().get_field(0).as_object().cloned().unwrap();
        assert!(same_object(&child, &inner));
    }

    #[test]
    fn deep_clone_detaches_child_objects() {
        let registry = TypeRegistry::new();
        let inner_class = registry.resolve("Pair<Integer,Integer>").unwrap();
        let inner = new_object(Pair::new(
            inner_class.clone(),
            Variant::integer(1),
            Variant::integer(2),
        ));
        let outer_class = registry
            .resolve("Pair<Pair<Integer,Integer>,Integer>")
            .unwrap();
        let outer = new_object(Pair::new(
            outer_class,
            Variant::object(inner.clone()),
            Variant::integer(9),
        ));

        let clone = deep_clone(&outer).unwrap();
        let child = clone.borrow().get_field(0).as_object().cloned().unwrap();
        assert!(!same_object(&child, &inner));
        assert_eq!(child.borrow().get_field(1).as_integer(), Some(2));

        // Mutating the clone's child leaves the original untouched.
        child.borrow_mut().set_field(1, Variant::integer(99));
        assert_eq!(inner.borrow().get_field(1).as_integer(), Some(2));
    }
}
