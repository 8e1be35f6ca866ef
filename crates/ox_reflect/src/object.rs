//! The dynamic object model.
//!
//! Objects are reference-counted and interiorly mutable: an [`ObjectRef`]
//! can appear in several fields at once, and the XML layer preserves that
//! sharing through `<shared>` declarations. Identity is handle identity,
//! exposed through [`ObjectId`] and [`same_object`].

use std::any::Any;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use crate::info::{TypeKind, TypeRef, object_class, type_class};
use crate::value::Variant;
use crate::xml::{XmlReader, XmlWriter};

// -----------------------------------------------------------------------------
// Object

/// The behavior shared by all reflective objects.
///
/// Implementors describe themselves through their class descriptor and
/// expose ordered field access; everything else has schema-driven
/// defaults that containers and special types override.
pub trait Object: Any {
    /// Returns this object's class descriptor.
    fn class(&self) -> TypeRef;

    /// Returns the value of the field at `index`.
    fn get_field(&self, index: usize) -> Variant;

    /// Replaces the value of the field at `index`.
    fn set_field(&mut self, index: usize, value: Variant);

    /// Number of container elements, zero for plain objects.
    fn element_count(&self) -> usize {
        0
    }

    /// Returns the container element at `index`, if any.
    fn element(&self, _index: usize) -> Option<Variant> {
        None
    }

    /// Renders this object for display. The `short` form is a single
    /// token, the full form is `ClassName(field, field, ...)`.
    fn to_display_string(&self, short: bool) -> String {
        let class = self.class();
        if short {
            return class.name().into();
        }
        let mut res = String::from(class.name());
        res.push('(');
        for index in 0..class.field_count() {
            if index > 0 {
                res.push_str(", ");
            }
            res.push_str(&self.get_field(index).to_display_string(true));
        }
        res.push(')');
        res
    }

    /// Totally orders two objects. Objects of different classes order by
    /// class name, objects of the same class field by field.
    fn compare_to(&self, other: &dyn Object) -> Ordering {
        let class = self.class();
        let other_class = other.class();
        if !crate::info::Type::same(&class, &other_class) {
            return class.name().cmp(other_class.name());
        }
        for index in 0..class.field_count() {
            let ordering = self.get_field(index).compare(&other.get_field(index));
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Writes this object's content into the writer's current node.
    ///
    /// The default writes one `<variable name="...">` child per present
    /// field; missing fields are skipped and come back missing on load.
    fn save_to_xml(&self, writer: &mut XmlWriter) {
        let class = self.class();
        for index in 0..class.field_count() {
            let value = self.get_field(index);
            if value.is_missing() {
                continue;
            }
            let name = class.field_name(index).unwrap_or_default().to_string();
            let expected = class.field_type(index).cloned();
            writer.save_variable(&name, &value, expected.as_ref());
        }
    }

    /// Fills this object from the reader's current node.
    ///
    /// Returns `false` only on malformed input (a `<variable>` without a
    /// `name` attribute); unknown field names are reported as warnings
    /// and skipped.
    fn load_from_xml(&mut self, reader: &mut XmlReader<'_>) -> bool {
        let class = self.class();
        let current = reader.current();
        let children = reader.tree().children_by_tag(current, "variable");
        for child in children {
            let Some(name) = reader.tree().attribute(child, "name").map(str::to_string) else {
                reader
                    .report_mut()
                    .error("Object::load_from_xml", "variable without name attribute");
                return false;
            };
            let Some(index) = class.find_field(&name) else {
                reader.report_mut().warning(
                    "Object::load_from_xml",
                    &format!("unknown variable `{name}` in {}", class.name()),
                );
                continue;
            };
            let expected = class.field_type(index).cloned();
            if let Some(value) = reader.load_variable_at(child, expected.as_ref()) {
                self.set_field(index, value);
            }
        }
        true
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A shared, mutable handle to an object.
pub type ObjectRef = Rc<RefCell<dyn Object>>;

/// Wraps a concrete object into a shared handle.
pub fn new_object<T: Object>(object: T) -> ObjectRef {
    Rc::new(RefCell::new(object))
}

// -----------------------------------------------------------------------------
// ObjectId

/// The identity of an object handle, usable as a map key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ObjectId(*const ());

/// Returns the identity of `object`.
pub fn object_id(object: &ObjectRef) -> ObjectId {
    ObjectId(Rc::as_ptr(object) as *const ())
}

/// Whether two handles denote the same object.
pub fn same_object(a: &ObjectRef, b: &ObjectRef) -> bool {
    Rc::ptr_eq(a, b)
}

// -----------------------------------------------------------------------------
// DynamicObject

/// A schema-driven object: its class descriptor fully determines its
/// fields, all stored as variants.
pub struct DynamicObject {
    class: TypeRef,
    fields: Vec<Variant>,
}

impl DynamicObject {
    /// Creates an instance with every field missing.
    pub fn new(class: TypeRef) -> Self {
        let fields = (0..class.field_count())
            .map(|index| {
                let ty = class.field_type(index).cloned().unwrap_or_else(object_class);
                Variant::missing(ty)
            })
            .collect();
        Self { class, fields }
    }
}

impl Object for DynamicObject {
    fn class(&self) -> TypeRef {
        self.class.clone()
    }

    fn get_field(&self, index: usize) -> Variant {
        self.fields
            .get(index)
            .cloned()
            .unwrap_or_else(|| Variant::missing(object_class()))
    }

    fn set_field(&mut self, index: usize, value: Variant) {
        if let Some(slot) = self.fields.get_mut(index) {
            *slot = value;
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// -----------------------------------------------------------------------------
// Pair

/// A pair of values, instantiated from the `Pair<First,Second>` template.
pub struct Pair {
    class: TypeRef,
    first: Variant,
    second: Variant,
}

impl Pair {
    pub fn new(class: TypeRef, first: Variant, second: Variant) -> Self {
        Self {
            class,
            first,
            second,
        }
    }

    pub fn first(&self) -> &Variant {
        &self.first
    }

    pub fn second(&self) -> &Variant {
        &self.second
    }
}

impl Object for Pair {
    fn class(&self) -> TypeRef {
        self.class.clone()
    }

    fn get_field(&self, index: usize) -> Variant {
        match index {
            0 => self.first.clone(),
            1 => self.second.clone(),
            _ => Variant::missing(object_class()),
        }
    }

    fn set_field(&mut self, index: usize, value: Variant) {
        match index {
            0 => self.first = value,
            1 => self.second = value,
            _ => {}
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// -----------------------------------------------------------------------------
// ObjectVector

/// A homogeneous container, instantiated from the `Vector<Element>`
/// template. Elements serialize as indexed `<element>` children.
pub struct ObjectVector {
    class: TypeRef,
    element_type: TypeRef,
    elements: Vec<Variant>,
}

impl ObjectVector {
    /// Creates an empty vector; the element type comes from the class's
    /// template argument.
    pub fn new(class: TypeRef) -> Self {
        let element_type = class
            .template()
            .and_then(|t| t.arguments().first().cloned())
            .unwrap_or_else(object_class);
        Self {
            class,
            element_type,
            elements: Vec::new(),
        }
    }

    pub fn element_type(&self) -> &TypeRef {
        &self.element_type
    }

    pub fn push(&mut self, value: Variant) {
        self.elements.push(value);
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl Object for ObjectVector {
    fn class(&self) -> TypeRef {
        self.class.clone()
    }

    fn get_field(&self, _index: usize) -> Variant {
        Variant::missing(object_class())
    }

    fn set_field(&mut self, _index: usize, _value: Variant) {}

    fn element_count(&self) -> usize {
        self.elements.len()
    }

    fn element(&self, index: usize) -> Option<Variant> {
        self.elements.get(index).cloned()
    }

    fn to_display_string(&self, short: bool) -> String {
        if short {
            return self.class.name().into();
        }
        // Enumerations with one-letter codes print as a dense string.
        if let TypeKind::Enumeration(schema) = self.element_type.kind() {
            if schema.has_codes() {
                let mut res = String::with_capacity(self.elements.len());
                for element in &self.elements {
                    let code = element
                        .as_integer()
                        .and_then(|i| usize::try_from(i).ok())
                        .and_then(|i| schema.code(i));
                    res.push(code.unwrap_or('?'));
                }
                return res;
            }
        }
        let mut res = String::from("[");
        for (index, element) in self.elements.iter().enumerate() {
            if index > 0 {
                res.push_str(", ");
            }
            res.push_str(&element.to_display_string(true));
        }
        res.push(']');
        res
    }

    fn compare_to(&self, other: &dyn Object) -> Ordering {
        let Some(other) = other.as_any().downcast_ref::<Self>() else {
            return self.class.name().cmp(other.class().name());
        };
        for (a, b) in self.elements.iter().zip(&other.elements) {
            let ordering = a.compare(b);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        self.elements.len().cmp(&other.elements.len())
    }

    fn save_to_xml(&self, writer: &mut XmlWriter) {
        writer.set_attribute("size", &self.elements.len().to_string());
        for (index, element) in self.elements.iter().enumerate() {
            if element.is_missing() {
                continue;
            }
            writer.save_element(index, element, Some(&self.element_type));
        }
    }

    fn load_from_xml(&mut self, reader: &mut XmlReader<'_>) -> bool {
        let current = reader.current();
        let size = reader
            .tree()
            .int_attribute(current, "size")
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        self.elements = vec![Variant::missing(self.element_type.clone()); size];
        let children = reader.tree().children_by_tag(current, "element");
        for child in children {
            let Some(index) = reader
                .tree()
                .int_attribute(child, "index")
                .and_then(|n| usize::try_from(n).ok())
            else {
                reader
                    .report_mut()
                    .error("ObjectVector::load_from_xml", "element without index attribute");
                return false;
            };
            if index >= self.elements.len() {
                self.elements.resize(index + 1, Variant::missing(self.element_type.clone()));
            }
            if let Some(value) = reader.load_variable_at(child, Some(&self.element_type)) {
                self.elements[index] = value;
            }
        }
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// -----------------------------------------------------------------------------
// TypeObject

/// A type descriptor lifted into the object model, so types can travel
/// as ordinary values.
pub struct TypeObject {
    ty: TypeRef,
}

impl TypeObject {
    pub fn new(ty: TypeRef) -> Self {
        Self { ty }
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }
}

impl Object for TypeObject {
    fn class(&self) -> TypeRef {
        type_class()
    }

    fn get_field(&self, _index: usize) -> Variant {
        Variant::missing(object_class())
    }

    fn set_field(&mut self, _index: usize, _value: Variant) {}

    fn to_display_string(&self, _short: bool) -> String {
        self.ty.name().into()
    }

    fn compare_to(&self, other: &dyn Object) -> Ordering {
        match other.as_any().downcast_ref::<Self>() {
            Some(other) => self.ty.name().cmp(other.ty.name()),
            None => self.class().name().cmp(other.class().name()),
        }
    }

    /// Named types serialize as their name; unnamed template instances
    /// serialize structurally with a `templateType` attribute and one
    /// `templateArgument` child per argument.
    fn save_to_xml(&self, writer: &mut XmlWriter) {
        writer.write_type_content(&self.ty);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
