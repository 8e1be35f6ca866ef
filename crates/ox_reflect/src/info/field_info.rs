use crate::info::TypeRef;

// -----------------------------------------------------------------------------
// FieldInfo

/// Information for a single named field of a class schema.
///
/// The field order of a class is fixed at construction and determines
/// the field indices used by [`Object::get_field`](crate::Object::get_field).
#[derive(Clone)]
pub struct FieldInfo {
    name: String,
    ty: TypeRef,
}

impl FieldInfo {
    /// Creates a new [`FieldInfo`] for the given field `name` and declared type.
    #[inline]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// Returns the field name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field's declared type.
    #[inline]
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }
}

impl core::fmt::Debug for FieldInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FieldInfo")
            .field("name", &self.name)
            .field("ty", &self.ty.name())
            .finish()
    }
}
