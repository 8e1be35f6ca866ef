//! The XML exporter.
//!
//! Writing happens in two passes. During traversal every object's
//! content is written once into a detached node, and every place the
//! object appears is recorded as a reference. [`XmlWriter::flush`] then
//! decides the final shape: objects referenced once are merged into
//! their single reference element, objects referenced several times are
//! promoted to `<shared identifier="...">` declarations at the root and
//! their references become `reference="..."` attributes.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use crate::info::{Type, TypeRef};
use crate::object::{ObjectId, ObjectRef, object_id};
use crate::value::Variant;
use crate::xml::node::{NodeId, XmlTree};
use crate::xml::report::Report;
use crate::xml::text::{XmlTextError, render_document};

/// One object encountered during traversal.
struct SavedObject {
    object: ObjectRef,
    /// The detached node holding the object's content.
    node: NodeId,
    /// Every element where the object appears.
    references: Vec<NodeId>,
    /// Indices of objects this object's content refers to.
    dependencies: BTreeSet<usize>,
}

/// Serializes variants and objects into an XML document.
///
/// # Examples
///
/// ```
/// use ox_reflect::Variant;
/// use ox_reflect::xml::XmlWriter;
///
/// let mut writer = XmlWriter::new("lbcpp", 0);
/// writer.save_variable("", &Variant::integer(42), None);
/// let text = writer.to_document_string().unwrap();
/// assert!(text.contains("<variable type=\"Integer\">42</variable>"));
/// ```
pub struct XmlWriter {
    tree: XmlTree,
    root: NodeId,
    stack: Vec<NodeId>,
    saved_objects: Vec<SavedObject>,
    saved_index: HashMap<ObjectId, usize>,
    shared_indices: BTreeSet<usize>,
    in_flight: BTreeSet<usize>,
    flush_state: Option<bool>,
    report: Report,
}

impl XmlWriter {
    /// Creates a writer with the given root tag. A nonzero `version`
    /// becomes a `version` attribute on the root.
    pub fn new(root_tag: &str, version: u32) -> Self {
        let mut tree = XmlTree::new();
        let root = tree.new_node(root_tag);
        if version != 0 {
            tree.set_attribute(root, "version", &version.to_string());
        }
        Self {
            tree,
            root,
            stack: vec![root],
            saved_objects: Vec::new(),
            saved_index: HashMap::new(),
            shared_indices: BTreeSet::new(),
            in_flight: BTreeSet::new(),
            flush_state: None,
            report: Report::new(),
        }
    }

    /// The element currently being written into.
    pub fn current(&self) -> NodeId {
        // The stack always holds at least the root.
        self.stack[self.stack.len() - 1]
    }

    pub fn tree(&self) -> &XmlTree {
        &self.tree
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Opens a new child element; content written until the matching
    /// [`leave`](Self::leave) goes into it.
    pub fn enter(&mut self, tag: &str) {
        let node = self.tree.new_node(tag);
        self.stack.push(node);
    }

    /// Closes the innermost element and attaches it to its parent.
    pub fn leave(&mut self) {
        if self.stack.len() > 1 {
            if let Some(node) = self.stack.pop() {
                let parent = self.current();
                self.tree.add_child(parent, node);
            }
        }
    }

    /// Sets an attribute on the current element.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        let current = self.current();
        self.tree.set_attribute(current, name, value);
    }

    /// Appends text content to the current element.
    pub fn add_text(&mut self, content: &str) {
        let current = self.current();
        self.tree.add_text_child(current, content);
    }

    /// Writes `<variable name="...">` holding `value`. An empty `name`
    /// omits the attribute, the form used for the document's root value.
    pub fn save_variable(&mut self, name: &str, value: &Variant, expected: Option<&TypeRef>) {
        self.enter("variable");
        if !name.is_empty() {
            self.set_attribute("name", name);
        }
        self.write_variable(value, expected);
        self.leave();
    }

    /// Writes `<element index="...">` holding a container element.
    pub fn save_element(&mut self, index: usize, value: &Variant, expected: Option<&TypeRef>) {
        self.enter("element");
        self.set_attribute("index", &index.to_string());
        self.write_variable(value, expected);
        self.leave();
    }

    /// Writes `value` into the current element.
    ///
    /// The type annotation is omitted when `expected` already names the
    /// value's type, so that statically typed fields stay compact.
    pub fn write_variable(&mut self, value: &Variant, expected: Option<&TypeRef>) {
        if value.is_missing() {
            self.maybe_write_type(value.ty(), expected);
            self.set_attribute("missing", "true");
            return;
        }
        if let Some(ty) = value.as_type() {
            if ty.is_named() {
                self.maybe_write_type(value.ty(), expected);
                self.add_text(ty.name());
                return;
            }
            // Unnamed types serialize structurally through the object path.
        }
        if let Some(object) = value.as_object() {
            let object = object.clone();
            self.write_object(&object, expected);
            return;
        }
        self.maybe_write_type(value.ty(), expected);
        self.add_text(&value.to_text());
    }

    fn maybe_write_type(&mut self, ty: &TypeRef, expected: Option<&TypeRef>) {
        let omit = expected.is_some_and(|e| Type::same(e, ty));
        if !omit {
            self.write_type(ty);
        }
    }

    /// Annotates the current element with a type: an attribute for named
    /// types, a structural `<type>` child for unnamed instantiations.
    pub fn write_type(&mut self, ty: &TypeRef) {
        if ty.is_named() {
            self.set_attribute("type", &ty.attribute_name());
        } else {
            self.enter("type");
            self.write_type_content(ty);
            self.leave();
        }
    }

    /// Writes a type into the current element: named types as text,
    /// unnamed ones as `templateType` plus indexed `templateArgument`
    /// children.
    pub fn write_type_content(&mut self, ty: &TypeRef) {
        if ty.is_named() {
            self.add_text(ty.name());
            return;
        }
        match ty.template() {
            Some(template) => {
                let base_name = template.base_name().to_string();
                let arguments: Vec<TypeRef> = template.arguments().to_vec();
                self.set_attribute("templateType", &base_name);
                for (index, argument) in arguments.iter().enumerate() {
                    self.enter("templateArgument");
                    self.set_attribute("index", &index.to_string());
                    self.write_type_content(argument);
                    self.leave();
                }
            }
            None => self.set_attribute("typeName", ty.name()),
        }
    }

    /// Writes an object reference into the current element.
    ///
    /// The first encounter writes the object's content into a detached
    /// node; later encounters only record the reference and promote the
    /// object to shared.
    pub fn write_object(&mut self, object: &ObjectRef, expected: Option<&TypeRef>) {
        let id = object_id(object);
        let index = match self.saved_index.get(&id) {
            Some(&index) => index,
            None => {
                let index = self.saved_objects.len();
                let content = self.tree.new_node("shared");
                self.saved_objects.push(SavedObject {
                    object: object.clone(),
                    node: content,
                    references: Vec::new(),
                    dependencies: BTreeSet::new(),
                });
                self.saved_index.insert(id, index);
                self.in_flight.insert(index);
                self.stack.push(content);
                let class = object.borrow().class();
                self.maybe_write_type(&class, expected);
                object.borrow().save_to_xml(self);
                self.stack.pop();
                self.in_flight.remove(&index);
                index
            }
        };
        let reference = self.current();
        let saved = &mut self.saved_objects[index];
        saved.references.push(reference);
        if saved.references.len() == 2 {
            self.shared_indices.insert(index);
        }
        for &in_flight in &self.in_flight {
            self.saved_objects[in_flight].dependencies.insert(index);
        }
    }

    /// Resolves all recorded object references into their final shape.
    ///
    /// Returns `false`, once and for all, when the object graph contains
    /// a reference cycle; the diagnostics name the objects involved.
    pub fn flush(&mut self) -> bool {
        if let Some(ok) = self.flush_state {
            return ok;
        }
        let order = match self.shared_save_order() {
            Ok(order) => order,
            Err(stuck) => {
                let names: Vec<String> = stuck
                    .iter()
                    .map(|&index| {
                        self.saved_objects[index]
                            .object
                            .borrow()
                            .to_display_string(true)
                    })
                    .collect();
                self.report.error(
                    "XmlWriter::flush",
                    &format!("cannot serialize cyclic object graph ({})", names.join(", ")),
                );
                self.flush_state = Some(false);
                return false;
            }
        };

        let mut used_identifiers: HashSet<String> = HashSet::new();
        for &index in order.iter().rev() {
            let identifier = self.make_unique_identifier(index, &mut used_identifiers);
            let node = self.saved_objects[index].node;
            self.tree.set_attribute(node, "identifier", &identifier);
            // The type annotation may have been elided against the
            // declared type of the reference site; a shared declaration
            // has no such context, so it always carries its type.
            if !self.tree.has_attribute(node, "type") && self.tree.child_by_tag(node, "type").is_none()
            {
                let class = self.saved_objects[index].object.borrow().class();
                self.tree.set_attribute(node, "type", &class.attribute_name());
            }
            self.tree.insert_child(self.root, 0, node);
            let references = self.saved_objects[index].references.clone();
            for reference in references {
                self.tree.set_attribute(reference, "reference", &identifier);
            }
        }

        for index in 0..self.saved_objects.len() {
            if self.shared_indices.contains(&index) {
                continue;
            }
            let saved = &self.saved_objects[index];
            let content = saved.node;
            if let Some(&target) = saved.references.first() {
                self.tree.move_children_from(target, content);
                self.tree.copy_attributes(target, content);
            }
        }

        self.flush_state = Some(true);
        true
    }

    /// Orders shared objects so that every object's dependencies appear
    /// before it in the document. Returns the stuck indices when a cycle
    /// prevents that.
    fn shared_save_order(&self) -> Result<Vec<usize>, Vec<usize>> {
        let shared: Vec<usize> = self.shared_indices.iter().copied().collect();
        let mut placed: BTreeSet<usize> = BTreeSet::new();
        let mut order = Vec::with_capacity(shared.len());
        while order.len() < shared.len() {
            let mut progressed = false;
            for &index in &shared {
                if placed.contains(&index) {
                    continue;
                }
                let ready = self.saved_objects[index]
                    .dependencies
                    .iter()
                    .all(|dep| !self.shared_indices.contains(dep) || placed.contains(dep));
                if ready {
                    order.push(index);
                    placed.insert(index);
                    progressed = true;
                }
            }
            if !progressed {
                return Err(shared
                    .iter()
                    .copied()
                    .filter(|index| !placed.contains(index))
                    .collect());
            }
        }
        Ok(order)
    }

    /// Builds `ClassNameK` with the smallest `K >= 1` not used yet.
    fn make_unique_identifier(&self, index: usize, used: &mut HashSet<String>) -> String {
        let class = self.saved_objects[index].object.borrow().class();
        let base = if class.name().is_empty() {
            "object".to_string()
        } else {
            class.attribute_name()
        };
        let mut k = 1usize;
        loop {
            let candidate = format!("{base}{k}");
            if used.insert(candidate.clone()) {
                return candidate;
            }
            k += 1;
        }
    }

    /// Flushes and renders the document. Returns `None` when flushing
    /// fails; the reason is in [`report`](Self::report).
    pub fn to_document_string(&mut self) -> Option<String> {
        if !self.flush() {
            return None;
        }
        Some(render_document(&self.tree, self.root))
    }

    /// Flushes and writes the document to `path`. Nothing is written
    /// when flushing fails.
    pub fn save_to_file(&mut self, path: &Path) -> Result<(), XmlTextError> {
        let display = path.display().to_string();
        if path.is_dir() {
            return Err(XmlTextError::NotAFile { path: display });
        }
        let Some(text) = self.to_document_string() else {
            return Err(XmlTextError::Io {
                path: display,
                message: "cannot serialize cyclic object graph".into(),
            });
        };
        std::fs::write(path, text).map_err(|e| XmlTextError::Io {
            path: display,
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Pair, new_object};
    use crate::registry::TypeRegistry;

    #[test]
    fn scalar_variable_with_type_attribute() {
        let mut writer = XmlWriter::new("lbcpp", 0);
        writer.save_variable("count", &Variant::integer(7), None);
        let text = writer.to_document_string().unwrap();
        assert!(text.contains("<variable name=\"count\" type=\"Integer\">7</variable>"));
    }

    #[test]
    fn expected_type_is_omitted() {
        let registry = TypeRegistry::new();
        let class = registry.resolve("Pair<Integer,String>").unwrap();
        let pair = new_object(Pair::new(
            class.clone(),
            Variant::integer(3),
            Variant::string("abc"),
        ));
        let mut writer = XmlWriter::new("lbcpp", 0);
        writer.save_variable("", &Variant::object(pair), None);
        let text = writer.to_document_string().unwrap();
        // The pair itself carries its type; its fields match their
        // declared types and stay unannotated.
        assert!(text.contains("type=\"Pair[Integer,String]\""));
        assert!(text.contains("<variable name=\"first\">3</variable>"));
        assert!(text.contains("<variable name=\"second\">abc</variable>"));
    }

    #[test]
    fn missing_value_writes_missing_attribute() {
        let mut writer = XmlWriter::new("lbcpp", 0);
        writer.save_variable(
            "gap",
            &Variant::missing(crate::info::double_type()),
            None,
        );
        let text = writer.to_document_string().unwrap();
        assert!(text.contains("name=\"gap\""));
        assert!(text.contains("type=\"Double\""));
        assert!(text.contains("missing=\"true\""));
    }

    #[test]
    fn diamond_promotes_one_shared_declaration() {
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

        let mut writer = XmlWriter::new("lbcpp", 0);
        writer.save_variable("", &Variant::object(root), None);
        let text = writer.to_document_string().unwrap();
        assert_eq!(text.matches("<shared ").count(), 1);
        assert_eq!(
            text.matches("reference=\"Pair[Integer,Integer]1\"").count(),
            2
        );
    }

    #[test]
    fn cycle_makes_flush_fail() {
        let registry = TypeRegistry::new();
        let class = registry.resolve("Pair<Object,Integer>").unwrap();
        let node = new_object(Pair::new(
            class,
            Variant::missing(crate::info::object_class()),
            Variant::integer(0),
        ));
        let back_edge = Variant::object(node.clone());
        node.borrow_mut().set_field(0, back_edge);

        let mut writer = XmlWriter::new("lbcpp", 0);
        writer.save_variable("", &Variant::object(node), None);
        assert!(!writer.flush());
        assert!(writer.report().has_errors());
        // Flushing is idempotent, the error is reported once.
        assert!(!writer.flush());
        assert_eq!(writer.report().error_count(), 1);
        assert!(writer.to_document_string().is_none());
    }

    #[test]
    fn identifiers_count_up_per_class() {
        let registry = TypeRegistry::new();
        let class = registry.resolve("Pair<Integer,Integer>").unwrap();
        let a = new_object(Pair::new(
            class.clone(),
            Variant::integer(1),
            Variant::integer(1),
        ));
        let b = new_object(Pair::new(
            class.clone(),
            Variant::integer(2),
            Variant::integer(2),
        ));
        let outer_class = registry
            .resolve("Vector<Pair<Integer,Integer>>")
            .unwrap();
        let outer = crate::object::ObjectVector::new(outer_class);
        let outer = {
            let mut v = outer;
            for object in [&a, &a, &b, &b] {
                v.push(Variant::object(object.clone()));
            }
            new_object(v)
        };

        let mut writer = XmlWriter::new("lbcpp", 0);
        writer.save_variable("", &Variant::object(outer), None);
        let text = writer.to_document_string().unwrap();
        assert!(text.contains("identifier=\"Pair[Integer,Integer]1\""));
        assert!(text.contains("identifier=\"Pair[Integer,Integer]2\""));
    }
}
