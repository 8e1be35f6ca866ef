//! The XML importer.
//!
//! The importer walks a parsed [`XmlTree`] top-down, resolving type
//! annotations through an explicitly provided registry and shared
//! declarations through a scoped identifier table. Problems are recorded
//! in the [`Report`]; a failed load yields `None`, never a panic.

use std::collections::HashMap;
use std::path::Path;

use crate::info::{Type, TypeKind, TypeRef};
use crate::object::ObjectRef;
use crate::registry::TypeRegistry;
use crate::value::Variant;
use crate::xml::node::{NodeId, XmlTree};
use crate::xml::report::Report;
use crate::xml::text::{XmlTextError, parse_document};

/// Deserializes a variant from an XML document.
///
/// # Examples
///
/// ```
/// use ox_reflect::registry::TypeRegistry;
/// use ox_reflect::xml::XmlReader;
///
/// let registry = TypeRegistry::new();
/// let mut reader = XmlReader::from_str(
///     &registry,
///     r#"<lbcpp><variable type="Integer">42</variable></lbcpp>"#,
/// )
/// .unwrap();
/// let value = reader.load().unwrap();
/// assert_eq!(value.as_integer(), Some(42));
/// ```
pub struct XmlReader<'r> {
    registry: &'r TypeRegistry,
    tree: XmlTree,
    root: NodeId,
    stack: Vec<NodeId>,
    // One identifier scope per enclosing element; entering an element
    // inherits the scope, so inner references see outer declarations.
    shared_stack: Vec<HashMap<String, ObjectRef>>,
    report: Report,
}

impl<'r> XmlReader<'r> {
    /// Parses `input` and positions the reader on its root element.
    pub fn from_str(registry: &'r TypeRegistry, input: &str) -> Result<Self, XmlTextError> {
        let (tree, root) = parse_document(input)?;
        Ok(Self {
            registry,
            tree,
            root,
            stack: vec![root],
            shared_stack: vec![HashMap::new()],
            report: Report::new(),
        })
    }

    /// Reads and parses the file at `path`.
    pub fn from_file(registry: &'r TypeRegistry, path: &Path) -> Result<Self, XmlTextError> {
        let display = path.display().to_string();
        if path.is_dir() {
            return Err(XmlTextError::NotAFile { path: display });
        }
        let input = std::fs::read_to_string(path).map_err(|e| XmlTextError::Io {
            path: display,
            message: e.to_string(),
        })?;
        Self::from_str(registry, &input)
    }

    /// The element currently being read.
    pub fn current(&self) -> NodeId {
        self.stack[self.stack.len() - 1]
    }

    pub fn tree(&self) -> &XmlTree {
        &self.tree
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn report_mut(&mut self) -> &mut Report {
        &mut self.report
    }

    pub fn into_report(self) -> Report {
        self.report
    }

    /// Loads the document's value.
    ///
    /// An `lbcpp` root wraps the value in a `<variable>` child and may
    /// declare shared objects beside it; any other root is read as the
    /// value element itself.
    pub fn load(&mut self) -> Option<Variant> {
        if self.tree.tag(self.root) == "lbcpp" {
            self.load_shared_objects();
            let Some(variable) = self.tree.child_by_tag(self.root, "variable") else {
                self.report
                    .error("XmlReader::load", "root has no variable element");
                return None;
            };
            self.load_variable_at(variable, None)
        } else {
            self.load_shared_objects();
            self.load_variable(None)
        }
    }

    /// Loads the value held by `node`, which becomes the current element
    /// for the duration.
    pub fn load_variable_at(&mut self, node: NodeId, expected: Option<&TypeRef>) -> Option<Variant> {
        self.enter(node);
        self.load_shared_objects();
        let res = self.load_variable(expected);
        self.leave();
        res
    }

    /// Registers the `<shared>` declarations among the current element's
    /// children, in document order so later ones may refer to earlier
    /// ones.
    fn load_shared_objects(&mut self) {
        let current = self.current();
        for node in self.tree.children_by_tag(current, "shared") {
            let Some(identifier) = self.tree.attribute(node, "identifier").map(str::to_string)
            else {
                self.report.error(
                    "XmlReader::load_shared_objects",
                    "shared element without identifier attribute",
                );
                continue;
            };
            let object = self
                .load_variable_at(node, None)
                .and_then(|value| value.as_object().cloned());
            match object {
                Some(object) => {
                    if let Some(scope) = self.shared_stack.last_mut() {
                        scope.insert(identifier, object);
                    }
                }
                None => self.report.error(
                    "XmlReader::load_shared_objects",
                    &format!("shared element `{identifier}` does not hold an object"),
                ),
            }
        }
    }

    /// Loads the value written into the current element.
    fn load_variable(&mut self, expected: Option<&TypeRef>) -> Option<Variant> {
        let current = self.current();
        if let Some(identifier) = self.reference_attribute(current).map(str::to_string) {
            return self.referenced_object(&identifier, expected);
        }
        let ty = self.load_type(expected)?;
        if self.tree.attribute(current, "missing") == Some("true") {
            return Some(Variant::missing(ty));
        }
        self.create_from_node(&ty)
    }

    /// Resolves the current element's type annotation, falling back to
    /// the declared `expected` type when the annotation was elided.
    fn load_type(&mut self, expected: Option<&TypeRef>) -> Option<TypeRef> {
        let current = self.current();
        if let Some(attribute) = self.tree.attribute(current, "type") {
            let name = attribute.replace('[', "<").replace(']', ">");
            return match self.registry.resolve(&name) {
                Ok(ty) => Some(ty),
                Err(e) => {
                    self.report.error("XmlReader::load_type", &e.to_string());
                    None
                }
            };
        }
        if let Some(node) = self.tree.child_by_tag(current, "type") {
            self.enter(node);
            let ty = match self.reference_attribute(node).map(str::to_string) {
                Some(identifier) => self.referenced_type(&identifier),
                None => self.load_unnamed_type(),
            };
            self.leave();
            return ty;
        }
        match expected {
            Some(ty) => Some(ty.clone()),
            None => {
                self.report
                    .error("XmlReader::load_type", "element has no type information");
                None
            }
        }
    }

    /// Loads a structural type description: a `templateType` with
    /// indexed `templateArgument` children, a `typeName` attribute, or a
    /// type name as text content.
    fn load_unnamed_type(&mut self) -> Option<TypeRef> {
        let current = self.current();
        if let Some(base_name) = self.tree.attribute(current, "templateType").map(str::to_string) {
            let mut children: Vec<(i64, NodeId)> = self
                .tree
                .children_by_tag(current, "templateArgument")
                .into_iter()
                .filter_map(|node| Some((self.tree.int_attribute(node, "index")?, node)))
                .collect();
            children.sort_by_key(|&(index, _)| index);
            let mut arguments = Vec::with_capacity(children.len());
            for (_, node) in children {
                self.enter(node);
                let argument = self.load_unnamed_type();
                self.leave();
                arguments.push(argument?);
            }
            return match self.registry.resolve_template(&base_name, &arguments) {
                Ok(ty) => Some(ty),
                Err(e) => {
                    self.report
                        .error("XmlReader::load_unnamed_type", &e.to_string());
                    None
                }
            };
        }
        let name = match self.tree.attribute(current, "typeName") {
            Some(name) => name.to_string(),
            None => self.tree.all_text(current).trim().to_string(),
        };
        if name.is_empty() {
            self.report
                .error("XmlReader::load_unnamed_type", "empty type description");
            return None;
        }
        match self.registry.resolve(&name.replace('[', "<").replace(']', ">")) {
            Ok(ty) => Some(ty),
            Err(e) => {
                self.report
                    .error("XmlReader::load_unnamed_type", &e.to_string());
                None
            }
        }
    }

    /// Materializes a value of type `ty` from the current element.
    fn create_from_node(&mut self, ty: &TypeRef) -> Option<Variant> {
        let current = self.current();
        match ty.kind() {
            // Strings carry their text verbatim: trimming or unquoting
            // here would corrupt payloads on a round trip.
            TypeKind::String => Some(Variant::string(self.tree.all_text(current))),
            TypeKind::Boolean
            | TypeKind::Integer
            | TypeKind::Double
            | TypeKind::Enumeration(_) => {
                let text = self.tree.all_text(current);
                match Variant::parse(ty, &text) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        self.report
                            .error("XmlReader::create_from_node", &e.to_string());
                        None
                    }
                }
            }
            TypeKind::Meta => {
                let inner = self.load_unnamed_type()?;
                Some(Variant::type_value(inner))
            }
            TypeKind::Class(_) => {
                let Some(instance) = Type::create_instance(ty) else {
                    self.report.error(
                        "XmlReader::create_from_node",
                        &format!("class `{}` has no factory", ty.name()),
                    );
                    return None;
                };
                let ok = instance.borrow_mut().load_from_xml(self);
                if !ok {
                    return None;
                }
                Some(Variant::object(instance))
            }
        }
    }

    /// Looks up a shared object by identifier in the current scope.
    fn referenced_object(&mut self, identifier: &str, expected: Option<&TypeRef>) -> Option<Variant> {
        let object = self
            .shared_stack
            .last()
            .and_then(|scope| scope.get(identifier))
            .cloned();
        let Some(object) = object else {
            self.report.error(
                "XmlReader::referenced_object",
                &format!("unknown shared reference `{identifier}`"),
            );
            return None;
        };
        if let Some(expected) = expected {
            self.check_inheritance(&object.borrow().class(), expected);
        }
        Some(Variant::object(object))
    }

    /// Resolves a shared reference that must carry a type descriptor.
    fn referenced_type(&mut self, identifier: &str) -> Option<TypeRef> {
        let value = self.referenced_object(identifier, None)?;
        match value.as_type() {
            Some(ty) => Some(ty),
            None => {
                self.report.error(
                    "XmlReader::referenced_type",
                    &format!("shared reference `{identifier}` does not hold a type"),
                );
                None
            }
        }
    }

    /// Warns when a loaded object's class does not fit the declared type.
    fn check_inheritance(&mut self, class: &TypeRef, expected: &TypeRef) {
        if !Type::inherits_from(class, expected) {
            self.report.warning(
                "XmlReader::check_inheritance",
                &format!(
                    "object of class `{}` where `{}` was expected",
                    class.name(),
                    expected.name()
                ),
            );
        }
    }

    /// The `reference` attribute, tolerating the legacy `ref` spelling.
    fn reference_attribute(&self, node: NodeId) -> Option<&str> {
        self.tree
            .attribute(node, "reference")
            .or_else(|| self.tree.attribute(node, "ref"))
    }

    fn enter(&mut self, node: NodeId) {
        self.stack.push(node);
        let scope = self.shared_stack.last().cloned().unwrap_or_default();
        self.shared_stack.push(scope);
    }

    fn leave(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
            self.shared_stack.pop();
        }
    }
}
