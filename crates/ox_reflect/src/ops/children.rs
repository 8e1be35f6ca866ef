//! Recursive enumeration of child objects.

use std::collections::HashSet;

use crate::object::{ObjectId, ObjectRef, object_id};

/// Collects every object reachable from `root` through field values and
/// container elements, `root` included. Each object appears once even
/// when reached along several paths, and cycles terminate.
pub fn all_child_objects(root: &ObjectRef) -> Vec<ObjectRef> {
    let mut visited: HashSet<ObjectId> = HashSet::new();
    let mut res = Vec::new();
    collect(root, &mut visited, &mut res);
    res
}

fn collect(object: &ObjectRef, visited: &mut HashSet<ObjectId>, res: &mut Vec<ObjectRef>) {
    if !visited.insert(object_id(object)) {
        return;
    }
    res.push(object.clone());
    let children: Vec<ObjectRef> = {
        let borrowed = object.borrow();
        let class = borrowed.class();
        let mut children = Vec::new();
        for index in 0..class.field_count() {
            if let Some(child) = borrowed.get_field(index).as_object() {
                children.push(child.clone());
            }
        }
        for index in 0..borrowed.element_count() {
            if let Some(child) = borrowed.element(index).and_then(|v| v.as_object().cloned()) {
                children.push(child);
            }
        }
        children
    };
    for child in &children {
        collect(child, visited, res);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Pair, new_object};
    use crate::registry::TypeRegistry;
    use crate::value::Variant;

    #[test]
    fn diamond_counts_each_object_once() {
        let registry = TypeRegistry::new();
        let leaf_class = registry.resolve("Pair<Integer,Integer>").unwrap();
        let leaf = new_object(Pair::new(
            leaf_class,
            Variant::integer(1),
            Variant::integer(2),
        ));
        let root_class = registry
            .resolve("Pair<Pair<Integer,Integer>,Pair<Integer,Integer>>")
            .unwrap();
        let root = new_object(Pair::new(
            root_class,
            Variant::object(leaf.clone()),
            Variant::object(leaf),
        ));

        let all = all_child_objects(&root);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn cycle_terminates() {
        let registry = TypeRegistry::new();
        let class = registry.resolve("Pair<Object,Integer>").unwrap();
        let node = new_object(Pair::new(
            class,
            Variant::missing(crate::info::object_class()),
            Variant::integer(0),
        ));
        let back_edge = Variant::object(node.clone());
        node.borrow_mut().set_field(0, back_edge);

        let all = all_child_objects(&node);
        assert_eq!(all.len(), 1);
    }
}
