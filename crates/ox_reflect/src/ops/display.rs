//! Textual rendering of objects and their fields.

use crate::object::Object;

/// Joins the present fields of `object` with `separator`, optionally
/// prefixing each with `name = `.
pub fn variables_to_string(object: &dyn Object, separator: &str, include_names: bool) -> String {
    let class = object.class();
    let mut res = String::new();
    let mut first = true;
    for index in 0..class.field_count() {
        let value = object.get_field(index);
        if value.is_missing() {
            continue;
        }
        if !first {
            res.push_str(separator);
        }
        first = false;
        if include_names {
            if let Some(name) = class.field_name(index) {
                res.push_str(name);
                res.push_str(" = ");
            }
        }
        res.push_str(&value.to_display_string(true));
    }
    res
}

/// Renders `object` as `ClassName(field, field, ...)`.
pub fn object_to_string(object: &dyn Object) -> String {
    format!("{}({})", object.class().name(), variables_to_string(object, ", ", false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Pair;
    use crate::registry::TypeRegistry;
    use crate::value::Variant;

    #[test]
    fn variables_to_string_with_names() {
        let registry = TypeRegistry::new();
        let class = registry.resolve("Pair<Integer,String>").unwrap();
        let pair = Pair::new(class, Variant::integer(3), Variant::string("abc"));
        assert_eq!(
            variables_to_string(&pair, "; ", true),
            "first = 3; second = abc"
        );
        assert_eq!(object_to_string(&pair), "Pair<Integer,String>(3, abc)");
    }

    #[test]
    fn missing_fields_are_skipped() {
        let registry = TypeRegistry::new();
        let class = registry.resolve("Pair<Integer,String>").unwrap();
        let pair = Pair::new(
            class.clone(),
            Variant::missing(crate::info::integer_type()),
            Variant::string("only"),
        );
        assert_eq!(variables_to_string(&pair, ", ", false), "only");
    }
}
