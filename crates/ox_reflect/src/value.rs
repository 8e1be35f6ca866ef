//! The dynamically typed value carried by object fields.

use std::cmp::Ordering;

use crate::info::{Type, TypeKind, TypeRef, boolean_type, double_type, integer_type, string_type, type_class};
use crate::object::{ObjectRef, TypeObject, new_object};

// -----------------------------------------------------------------------------
// Payload

/// The raw payload of a [`Variant`].
#[derive(Clone)]
pub enum Payload {
    /// The absence of a value. Any type can be missing.
    Missing,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Object(ObjectRef),
}

// -----------------------------------------------------------------------------
// Variant

/// A value tagged with its runtime type.
///
/// Enumeration values carry the element index as an `Integer` payload
/// under the enumeration type. Type values carry a [`TypeObject`] under
/// the `Type` metatype.
///
/// # Examples
///
/// ```
/// use ox_reflect::Variant;
///
/// let v = Variant::integer(42);
/// assert_eq!(v.as_integer(), Some(42));
/// assert_eq!(v.to_text(), "42");
/// assert!(!v.is_missing());
/// ```
#[derive(Clone)]
pub struct Variant {
    ty: TypeRef,
    payload: Payload,
}

impl Variant {
    /// A missing value of the given type.
    pub fn missing(ty: TypeRef) -> Self {
        Self {
            ty,
            payload: Payload::Missing,
        }
    }

    /// A `Boolean` value.
    pub fn boolean(value: bool) -> Self {
        Self {
            ty: boolean_type(),
            payload: Payload::Boolean(value),
        }
    }

    /// An `Integer` value.
    pub fn integer(value: i64) -> Self {
        Self {
            ty: integer_type(),
            payload: Payload::Integer(value),
        }
    }

    /// A `Double` value.
    pub fn double(value: f64) -> Self {
        Self {
            ty: double_type(),
            payload: Payload::Double(value),
        }
    }

    /// A `String` value.
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            ty: string_type(),
            payload: Payload::String(value.into()),
        }
    }

    /// An enumeration value holding the element `index`.
    pub fn enumeration(ty: TypeRef, index: i64) -> Self {
        Self {
            ty,
            payload: Payload::Integer(index),
        }
    }

    /// An object value typed with the object's own class.
    pub fn object(object: ObjectRef) -> Self {
        let ty = object.borrow().class();
        Self {
            ty,
            payload: Payload::Object(object),
        }
    }

    /// An object value carried under an explicit static type, typically
    /// a base class of the object's dynamic class.
    pub fn object_with_type(ty: TypeRef, object: ObjectRef) -> Self {
        Self {
            ty,
            payload: Payload::Object(object),
        }
    }

    /// A type descriptor as a first-class value.
    pub fn type_value(ty: TypeRef) -> Self {
        Self {
            ty: type_class(),
            payload: Payload::Object(new_object(TypeObject::new(ty))),
        }
    }

    /// Returns the static type of this value.
    #[inline]
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// Returns the raw payload.
    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Whether this value is missing.
    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self.payload, Payload::Missing)
    }

    /// Whether this value is present.
    #[inline]
    pub fn exists(&self) -> bool {
        !self.is_missing()
    }

    /// Whether this value holds an object.
    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self.payload, Payload::Object(_))
    }

    /// Returns the object payload, if any.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match &self.payload {
            Payload::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Returns the boolean payload, if any.
    pub fn as_boolean(&self) -> Option<bool> {
        match self.payload {
            Payload::Boolean(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the integer payload, if any. Enumeration values yield
    /// their element index.
    pub fn as_integer(&self) -> Option<i64> {
        match self.payload {
            Payload::Integer(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the double payload, if any.
    pub fn as_double(&self) -> Option<f64> {
        match self.payload {
            Payload::Double(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match &self.payload {
            Payload::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the carried type descriptor when this is a type value.
    pub fn as_type(&self) -> Option<TypeRef> {
        let object = self.as_object()?;
        let borrowed = object.borrow();
        let type_object = borrowed.as_any().downcast_ref::<TypeObject>()?;
        Some(type_object.ty().clone())
    }

    /// Renders the value as plain text, the form used for XML text
    /// payloads. Enumeration values print their element name, objects
    /// their display string.
    pub fn to_text(&self) -> String {
        match &self.payload {
            Payload::Missing => "Missing".into(),
            Payload::Boolean(value) => value.to_string(),
            Payload::Integer(index) => match self.ty.kind() {
                TypeKind::Enumeration(schema) => {
                    match usize::try_from(*index).ok().and_then(|i| schema.element_name(i)) {
                        Some(name) => name.into(),
                        None => index.to_string(),
                    }
                }
                _ => index.to_string(),
            },
            Payload::Double(value) => value.to_string(),
            Payload::String(value) => value.clone(),
            Payload::Object(object) => object.borrow().to_display_string(false),
        }
    }

    /// Renders the value for display, optionally in a `short` form
    /// that abbreviates nested objects.
    pub fn to_display_string(&self, short: bool) -> String {
        match &self.payload {
            Payload::Object(object) => object.borrow().to_display_string(short),
            _ => self.to_text(),
        }
    }

    /// Parses a textual representation into a value of type `ty`.
    pub fn parse(ty: &TypeRef, text: &str) -> Result<Self, ParseVariantError> {
        let text = text.trim();
        match ty.kind() {
            TypeKind::Boolean => match text {
                "true" => Ok(Self::boolean(true)),
                "false" => Ok(Self::boolean(false)),
                _ => Err(ParseVariantError::InvalidLiteral {
                    type_name: ty.name().into(),
                    text: text.into(),
                }),
            },
            TypeKind::Integer => text
                .parse::<i64>()
                .map(Self::integer)
                .map_err(|_| ParseVariantError::InvalidLiteral {
                    type_name: ty.name().into(),
                    text: text.into(),
                }),
            TypeKind::Double => text
                .parse::<f64>()
                .map(Self::double)
                .map_err(|_| ParseVariantError::InvalidLiteral {
                    type_name: ty.name().into(),
                    text: text.into(),
                }),
            TypeKind::String => {
                // Strip one pair of matching quotes, if present.
                let bytes = text.as_bytes();
                let unquoted = if bytes.len() >= 2
                    && (bytes[0] == b'"' || bytes[0] == b'\'')
                    && bytes[bytes.len() - 1] == bytes[0]
                {
                    &text[1..text.len() - 1]
                } else {
                    text
                };
                Ok(Self::string(unquoted))
            }
            TypeKind::Enumeration(schema) => match schema.find_element(text) {
                Some(index) => Ok(Self::enumeration(ty.clone(), index as i64)),
                None => Err(ParseVariantError::UnknownElement {
                    type_name: ty.name().into(),
                    text: text.into(),
                }),
            },
            TypeKind::Class(_) | TypeKind::Meta => Err(ParseVariantError::UnsupportedKind {
                type_name: ty.name().into(),
            }),
        }
    }

    /// Totally orders two values for deterministic container layouts.
    ///
    /// Missing sorts before present; values of different types order by
    /// type name; doubles use a total order over NaN.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self.is_missing(), other.is_missing()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }
        if !Type::same(&self.ty, &other.ty) {
            return self.ty.name().cmp(other.ty.name());
        }
        match (&self.payload, &other.payload) {
            (Payload::Boolean(a), Payload::Boolean(b)) => a.cmp(b),
            (Payload::Integer(a), Payload::Integer(b)) => a.cmp(b),
            (Payload::Double(a), Payload::Double(b)) => a.total_cmp(b),
            (Payload::String(a), Payload::String(b)) => a.cmp(b),
            (Payload::Object(a), Payload::Object(b)) => a.borrow().compare_to(&*b.borrow()),
            _ => Ordering::Equal,
        }
    }
}

impl core::fmt::Debug for Variant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Variant")
            .field("type", &self.ty.name())
            .field("value", &self.to_display_string(true))
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ParseVariantError

/// Error produced when parsing a textual value representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseVariantError {
    /// The text is not a valid literal for the target type.
    InvalidLiteral { type_name: String, text: String },
    /// The text names no element of the target enumeration.
    UnknownElement { type_name: String, text: String },
    /// The target type has no textual form.
    UnsupportedKind { type_name: String },
}

impl core::fmt::Display for ParseVariantError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidLiteral { type_name, text } => {
                write!(f, "could not parse `{text}` as {type_name}")
            }
            Self::UnknownElement { type_name, text } => {
                write!(f, "`{text}` is not an element of {type_name}")
            }
            Self::UnsupportedKind { type_name } => {
                write!(f, "values of type {type_name} cannot be parsed from text")
            }
        }
    }
}

impl std::error::Error for ParseVariantError {}
