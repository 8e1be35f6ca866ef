use std::rc::Rc;

use crate::info::{EnumerationSchema, FieldInfo};
use crate::object::ObjectRef;

// -----------------------------------------------------------------------------
// TypeRef

/// A shared handle to a type descriptor.
///
/// Type identity is handle identity: the registry guarantees that one
/// textual name always resolves to the same handle, so the serializer can
/// compare types with [`Type::same`] when deciding whether a `type`
/// attribute can be omitted.
pub type TypeRef = Rc<Type>;

/// Creates an instance of a class type through its registered factory.
pub type Factory = Box<dyn Fn(TypeRef) -> ObjectRef>;

// -----------------------------------------------------------------------------
// TemplateSpec

/// Base name and type arguments of a template instantiation.
///
/// Carried by instantiated types so they can serialize structurally
/// (`templateType` attribute plus indexed `templateArgument` children)
/// when the instantiation itself is unnamed.
pub struct TemplateSpec {
    base_name: String,
    arguments: Vec<TypeRef>,
}

impl TemplateSpec {
    /// Returns the template's base name, e.g. `Pair`.
    #[inline]
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Returns the type arguments in declaration order.
    #[inline]
    pub fn arguments(&self) -> &[TypeRef] {
        &self.arguments
    }
}

// -----------------------------------------------------------------------------
// TypeKind

/// What kind of values a [`Type`] describes.
pub enum TypeKind {
    Boolean,
    Integer,
    Double,
    String,
    /// A finite set of named elements, stored as element indices.
    Enumeration(EnumerationSchema),
    /// An object class with a field schema.
    Class(ClassSchema),
    /// The metatype: values of this type are type descriptors themselves.
    Meta,
}

// -----------------------------------------------------------------------------
// ClassSchema

/// The runtime schema of a class type: base chain, ordered fields and an
/// optional instance factory.
///
/// `fields` is the complete ordered list, inherited fields first, so
/// field indices are stable across the whole hierarchy.
pub struct ClassSchema {
    base: Option<TypeRef>,
    fields: Vec<FieldInfo>,
    factory: Option<Factory>,
}

impl ClassSchema {
    /// Creates a new schema.
    pub fn new(base: Option<TypeRef>, fields: Vec<FieldInfo>, factory: Option<Factory>) -> Self {
        Self {
            base,
            fields,
            factory,
        }
    }

    /// Returns the base type, if any.
    #[inline]
    pub fn base(&self) -> Option<&TypeRef> {
        self.base.as_ref()
    }

    /// Returns the ordered field list.
    #[inline]
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }
}

// -----------------------------------------------------------------------------
// Type

/// A runtime type descriptor.
///
/// # Examples
///
/// ```
/// use ox_reflect::registry::TypeRegistry;
///
/// let registry = TypeRegistry::new();
/// let ty = registry.resolve("Pair<Integer,String>").unwrap();
/// assert_eq!(ty.name(), "Pair<Integer,String>");
/// assert_eq!(ty.field_count(), 2);
/// assert_eq!(ty.find_field("second"), Some(1));
/// ```
pub struct Type {
    name: String,
    named: bool,
    template: Option<TemplateSpec>,
    kind: TypeKind,
}

impl Type {
    /// Creates a new class type.
    pub fn new_class(
        name: impl Into<String>,
        named: bool,
        base: Option<TypeRef>,
        fields: Vec<FieldInfo>,
        factory: Option<Factory>,
    ) -> TypeRef {
        Rc::new(Self {
            name: name.into(),
            named,
            template: None,
            kind: TypeKind::Class(ClassSchema::new(base, fields, factory)),
        })
    }

    /// Creates a template-instance class type.
    ///
    /// The canonical name `Base<Arg,...>` is derived from the arguments;
    /// the instance stays resolvable by that name through the registry.
    pub fn new_template_instance(
        base_name: &str,
        arguments: Vec<TypeRef>,
        base: Option<TypeRef>,
        fields: Vec<FieldInfo>,
        factory: Option<Factory>,
    ) -> TypeRef {
        let name = Self::canonical_template_name(base_name, &arguments);
        Rc::new(Self {
            name,
            named: true,
            template: Some(TemplateSpec {
                base_name: base_name.into(),
                arguments,
            }),
            kind: TypeKind::Class(ClassSchema::new(base, fields, factory)),
        })
    }

    /// Creates an enumeration type.
    pub fn new_enumeration(
        name: impl Into<String>,
        elements: Vec<String>,
        one_letter_codes: Option<String>,
    ) -> TypeRef {
        Rc::new(Self {
            name: name.into(),
            named: true,
            template: None,
            kind: TypeKind::Enumeration(EnumerationSchema::new(elements, one_letter_codes)),
        })
    }

    pub(crate) fn new_builtin(name: &str, kind: TypeKind) -> TypeRef {
        Rc::new(Self {
            name: name.into(),
            named: true,
            template: None,
            kind,
        })
    }

    /// Returns the canonical textual name of a template instantiation.
    pub fn canonical_template_name(base_name: &str, arguments: &[TypeRef]) -> String {
        let mut res = String::from(base_name);
        res.push('<');
        for (i, arg) in arguments.iter().enumerate() {
            if i > 0 {
                res.push(',');
            }
            res.push_str(arg.name());
        }
        res.push('>');
        res
    }

    /// Returns the type name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the name with `<` and `>` remapped to `[` and `]`,
    /// the form used inside XML attributes.
    pub fn attribute_name(&self) -> String {
        self.name.replace('<', "[").replace('>', "]")
    }

    /// Whether this type is resolvable by name alone through the registry.
    #[inline]
    pub fn is_named(&self) -> bool {
        self.named
    }

    /// Returns the kind of this type.
    #[inline]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Returns the template spec when this type is a template instance.
    #[inline]
    pub fn template(&self) -> Option<&TemplateSpec> {
        self.template.as_ref()
    }

    /// Whether this type is a class.
    #[inline]
    pub fn is_class(&self) -> bool {
        matches!(self.kind, TypeKind::Class(_))
    }

    /// Whether this type is the metatype.
    #[inline]
    pub fn is_meta(&self) -> bool {
        matches!(self.kind, TypeKind::Meta)
    }

    /// Returns the class schema when this type is a class.
    pub fn class_schema(&self) -> Option<&ClassSchema> {
        match &self.kind {
            TypeKind::Class(schema) => Some(schema),
            _ => None,
        }
    }

    /// Returns the base type when this type is a class with a base.
    pub fn base(&self) -> Option<&TypeRef> {
        self.class_schema().and_then(ClassSchema::base)
    }

    /// Returns the number of fields (zero for non-class types).
    pub fn field_count(&self) -> usize {
        self.class_schema().map_or(0, |s| s.fields().len())
    }

    /// Returns the field descriptor at `index`, if present.
    pub fn field(&self, index: usize) -> Option<&FieldInfo> {
        self.class_schema().and_then(|s| s.fields().get(index))
    }

    /// Returns the name of the field at `index`, if present.
    pub fn field_name(&self, index: usize) -> Option<&str> {
        self.field(index).map(FieldInfo::name)
    }

    /// Returns the declared type of the field at `index`, if present.
    pub fn field_type(&self, index: usize) -> Option<&TypeRef> {
        self.field(index).map(FieldInfo::ty)
    }

    /// Returns the index of the field with the given `name`, if present.
    ///
    /// This is O(N) complexity.
    pub fn find_field(&self, name: &str) -> Option<usize> {
        self.class_schema()
            .and_then(|s| s.fields().iter().position(|f| f.name() == name))
    }

    /// Whether two handles denote the same type.
    #[inline]
    pub fn same(a: &TypeRef, b: &TypeRef) -> bool {
        Rc::ptr_eq(a, b)
    }

    /// Whether `ty` equals `base` or has it somewhere up its base chain.
    pub fn inherits_from(ty: &TypeRef, base: &TypeRef) -> bool {
        let mut current = ty.clone();
        loop {
            if Self::same(&current, base) {
                return true;
            }
            match current.base() {
                Some(next) => current = next.clone(),
                None => return false,
            }
        }
    }

    /// Creates a fresh instance of a class type through its factory.
    ///
    /// Returns `None` for non-class types and for classes registered
    /// without a factory.
    pub fn create_instance(this: &TypeRef) -> Option<ObjectRef> {
        let factory = this.class_schema()?.factory.as_ref()?;
        Some(factory(this.clone()))
    }
}

impl core::fmt::Debug for Type {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Type")
            .field("name", &self.name)
            .field("named", &self.named)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Type, TypeRef};
    use crate::info::{FieldInfo, integer_type, object_class};

    fn class(name: &str, base: Option<TypeRef>) -> TypeRef {
        Type::new_class(name, true, base, Vec::new(), None)
    }

    #[test]
    fn inherits_walks_base_chain() {
        let root = object_class();
        let middle = class("Middle", Some(root.clone()));
        let leaf = class("Leaf", Some(middle.clone()));

        assert!(Type::inherits_from(&leaf, &leaf));
        assert!(Type::inherits_from(&leaf, &middle));
        assert!(Type::inherits_from(&leaf, &root));
        assert!(!Type::inherits_from(&root, &leaf));
    }

    #[test]
    fn field_lookup_by_name() {
        let ty = Type::new_class(
            "Point",
            true,
            None,
            vec![
                FieldInfo::new("x", integer_type()),
                FieldInfo::new("y", integer_type()),
            ],
            None,
        );
        assert_eq!(ty.field_count(), 2);
        assert_eq!(ty.find_field("y"), Some(1));
        assert_eq!(ty.find_field("z"), None);
        assert_eq!(ty.field_name(0), Some("x"));
    }

    #[test]
    fn attribute_name_remaps_angle_brackets() {
        let ty = Type::new_template_instance(
            "Pair",
            vec![integer_type(), integer_type()],
            None,
            Vec::new(),
            None,
        );
        assert_eq!(ty.name(), "Pair<Integer,Integer>");
        assert_eq!(ty.attribute_name(), "Pair[Integer,Integer]");
    }
}
