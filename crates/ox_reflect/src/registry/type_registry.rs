//! The registry mapping type names to [`TypeRef`] handles.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::info::{
    FieldInfo, Type, TypeRef, boolean_type, double_type, integer_type, object_class, string_type,
    type_class,
};
use crate::object::{ObjectVector, Pair, new_object};
use crate::ops::parse_list_with_parenthesis;
use crate::value::Variant;

/// Instantiates a template for a resolved argument list.
pub type TemplateDefinition =
    Box<dyn Fn(&TypeRegistry, &[TypeRef]) -> Result<TypeRef, ResolveError>>;

// -----------------------------------------------------------------------------
// TypeRegistry

/// Resolves textual type names to shared type handles.
///
/// Resolution is identity-stable: the same name always yields the same
/// handle, template instantiations included, so [`Type::same`] can be
/// used for type equality everywhere.
///
/// # Examples
///
/// ```
/// use ox_reflect::info::Type;
/// use ox_reflect::registry::TypeRegistry;
///
/// let registry = TypeRegistry::new();
/// let a = registry.resolve("Vector<Pair<Integer,String>>").unwrap();
/// let b = registry.resolve("Vector<Pair<Integer,String>>").unwrap();
/// assert!(Type::same(&a, &b));
/// ```
pub struct TypeRegistry {
    types: HashMap<String, TypeRef>,
    templates: HashMap<String, TemplateDefinition>,
    // Instantiation cache, filled lazily during resolution.
    instances: RefCell<HashMap<String, TypeRef>>,
}

impl TypeRegistry {
    /// An empty registry with no types at all.
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
            templates: HashMap::new(),
            instances: RefCell::new(HashMap::new()),
        }
    }

    /// A registry with the built-in types and the `Pair` and `Vector`
    /// templates preinstalled.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(boolean_type());
        registry.register(integer_type());
        registry.register(double_type());
        registry.register(string_type());
        registry.register(object_class());
        registry.register(type_class());
        registry.register_template("Pair", Box::new(instantiate_pair));
        registry.register_template("Vector", Box::new(instantiate_vector));
        registry
    }

    /// Registers `ty` under its name. Returns `false` without replacing
    /// when the name is already taken.
    pub fn register(&mut self, ty: TypeRef) -> bool {
        let name = ty.name().to_string();
        if self.types.contains_key(&name) {
            return false;
        }
        self.types.insert(name, ty);
        true
    }

    /// Registers a template under its base name. Returns `false` without
    /// replacing when the name is already taken.
    pub fn register_template(&mut self, base_name: &str, definition: TemplateDefinition) -> bool {
        if self.templates.contains_key(base_name) {
            return false;
        }
        self.templates.insert(base_name.into(), definition);
        true
    }

    /// Whether `name` resolves without instantiating anything new.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name) || self.instances.borrow().contains_key(name)
    }

    /// Returns the type registered under exactly `name`, if any.
    pub fn get(&self, name: &str) -> Option<TypeRef> {
        self.types.get(name).cloned()
    }

    /// Resolves `name`, instantiating templates on demand.
    ///
    /// `Pair<Integer,String>` resolves by parsing the base name and the
    /// argument list, resolving each argument recursively and asking the
    /// `Pair` template for an instance. Instances are cached under their
    /// canonical name.
    pub fn resolve(&self, name: &str) -> Result<TypeRef, ResolveError> {
        let name = name.trim();
        if let Some(ty) = self.types.get(name) {
            return Ok(ty.clone());
        }
        if let Some(ty) = self.instances.borrow().get(name) {
            return Ok(ty.clone());
        }
        if !name.contains('<') {
            return Err(ResolveError::UnknownType { name: name.into() });
        }
        let (base_name, arguments) = parse_instantiated_name(name)?;
        let arguments = arguments
            .iter()
            .map(|argument| self.resolve(argument))
            .collect::<Result<Vec<_>, _>>()?;
        self.resolve_template(&base_name, &arguments)
    }

    /// Resolves a template instantiation from already-resolved arguments.
    pub fn resolve_template(
        &self,
        base_name: &str,
        arguments: &[TypeRef],
    ) -> Result<TypeRef, ResolveError> {
        let canonical = Type::canonical_template_name(base_name, arguments);
        if let Some(ty) = self.instances.borrow().get(&canonical) {
            return Ok(ty.clone());
        }
        let definition =
            self.templates
                .get(base_name)
                .ok_or_else(|| ResolveError::UnknownTemplate {
                    name: base_name.into(),
                })?;
        let ty = definition(self, arguments)?;
        self.instances.borrow_mut().insert(canonical, ty.clone());
        Ok(ty)
    }

    /// Whether the type named `name` inherits from the type named `base`.
    pub fn is_subtype(&self, name: &str, base: &str) -> bool {
        match (self.resolve(name), self.resolve(base)) {
            (Ok(ty), Ok(base)) => Type::inherits_from(&ty, &base),
            _ => false,
        }
    }

    /// Iterates over the directly registered types, in no specific order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeRef> {
        self.types.values()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits `Base<Arg1,Arg2>` into the base name and raw argument names.
fn parse_instantiated_name(name: &str) -> Result<(String, Vec<String>), ResolveError> {
    let malformed = || ResolveError::MalformedName { name: name.into() };
    let open = name.find('<').ok_or_else(malformed)?;
    if !name.ends_with('>') || open == 0 {
        return Err(malformed());
    }
    let base_name = name[..open].to_string();
    let inner = &name[open + 1..name.len() - 1];
    let arguments =
        parse_list_with_parenthesis(inner, '<', '>', ',').map_err(|_| malformed())?;
    if arguments.is_empty() || arguments.iter().any(String::is_empty) {
        return Err(malformed());
    }
    Ok((base_name, arguments))
}

fn instantiate_pair(
    _registry: &TypeRegistry,
    arguments: &[TypeRef],
) -> Result<TypeRef, ResolveError> {
    let [first, second] = arguments else {
        return Err(ResolveError::WrongArity {
            template: "Pair".into(),
            expected: 2,
            got: arguments.len(),
        });
    };
    let fields = vec![
        FieldInfo::new("first", first.clone()),
        FieldInfo::new("second", second.clone()),
    ];
    Ok(Type::new_template_instance(
        "Pair",
        arguments.to_vec(),
        Some(object_class()),
        fields,
        Some(Box::new(|ty: TypeRef| {
            let first = Variant::missing(ty.field_type(0).cloned().unwrap_or_else(object_class));
            let second = Variant::missing(ty.field_type(1).cloned().unwrap_or_else(object_class));
            new_object(Pair::new(ty, first, second))
        })),
    ))
}

fn instantiate_vector(
    _registry: &TypeRegistry,
    arguments: &[TypeRef],
) -> Result<TypeRef, ResolveError> {
    if arguments.len() != 1 {
        return Err(ResolveError::WrongArity {
            template: "Vector".into(),
            expected: 1,
            got: arguments.len(),
        });
    }
    Ok(Type::new_template_instance(
        "Vector",
        arguments.to_vec(),
        Some(object_class()),
        Vec::new(),
        Some(Box::new(|ty: TypeRef| new_object(ObjectVector::new(ty)))),
    ))
}

// -----------------------------------------------------------------------------
// ResolveError

/// Error produced during type name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The name denotes no registered type.
    UnknownType { name: String },
    /// The base name of an instantiation denotes no registered template.
    UnknownTemplate { name: String },
    /// The name is not a well-formed type name.
    MalformedName { name: String },
    /// The template was instantiated with the wrong number of arguments.
    WrongArity {
        template: String,
        expected: usize,
        got: usize,
    },
}

impl core::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownType { name } => write!(f, "unknown type `{name}`"),
            Self::UnknownTemplate { name } => write!(f, "unknown template `{name}`"),
            Self::MalformedName { name } => write!(f, "malformed type name `{name}`"),
            Self::WrongArity {
                template,
                expected,
                got,
            } => write!(
                f,
                "template `{template}` expects {expected} argument(s), got {got}"
            ),
        }
    }
}

impl std::error::Error for ResolveError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_resolve_to_singletons() {
        let registry = TypeRegistry::new();
        let ty = registry.resolve("Integer").unwrap();
        assert!(Type::same(&ty, &integer_type()));
    }

    #[test]
    fn template_instances_are_cached() {
        let registry = TypeRegistry::new();
        let a = registry.resolve("Pair<Integer,String>").unwrap();
        let b = registry.resolve("Pair<Integer,String>").unwrap();
        assert!(Type::same(&a, &b));
        assert_eq!(a.name(), "Pair<Integer,String>");
        assert!(registry.contains("Pair<Integer,String>"));
    }

    #[test]
    fn nested_instantiations_resolve_recursively() {
        let registry = TypeRegistry::new();
        let ty = registry.resolve("Vector<Pair<Integer,Double>>").unwrap();
        assert_eq!(ty.name(), "Vector<Pair<Integer,Double>>");
        let inner = ty.template().unwrap().arguments()[0].clone();
        assert!(Type::same(
            &inner,
            &registry.resolve("Pair<Integer,Double>").unwrap()
        ));
    }

    #[test]
    fn resolution_errors_are_specific() {
        let registry = TypeRegistry::new();
        assert!(matches!(
            registry.resolve("Nope"),
            Err(ResolveError::UnknownType { .. })
        ));
        assert!(matches!(
            registry.resolve("Nope<Integer>"),
            Err(ResolveError::UnknownTemplate { .. })
        ));
        assert!(matches!(
            registry.resolve("Pair<Integer>"),
            Err(ResolveError::WrongArity { .. })
        ));
        assert!(matches!(
            registry.resolve("Pair<Integer,>"),
            Err(ResolveError::MalformedName { .. })
        ));
    }

    #[test]
    fn register_refuses_duplicates() {
        let mut registry = TypeRegistry::new();
        let suit = Type::new_enumeration("Suit", vec!["clubs".into()], None);
        assert!(registry.register(suit.clone()));
        assert!(!registry.register(suit));
    }

    #[test]
    fn subtyping_goes_through_object() {
        let registry = TypeRegistry::new();
        assert!(registry.is_subtype("Pair<Integer,Integer>", "Object"));
        assert!(!registry.is_subtype("Object", "Pair<Integer,Integer>"));
    }
}
