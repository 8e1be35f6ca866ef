//! Object comparison entry point.

use std::cmp::Ordering;

use crate::object::ObjectRef;

/// Totally orders two objects, delegating to their
/// [`compare_to`](crate::Object::compare_to) implementations.
pub fn compare(a: &ObjectRef, b: &ObjectRef) -> Ordering {
    a.borrow().compare_to(&*b.borrow())
}
