//! Filling object fields from a compact textual argument list.

use crate::object::Object;
use crate::value::Variant;
use crate::xml::Report;

/// Splits `text` into top-level tokens separated by `separator`,
/// ignoring separators nested inside `open`/`close` pairs.
///
/// Returns an error message when the brackets are unbalanced.
pub fn parse_list_with_parenthesis(
    text: &str,
    open: char,
    close: char,
    separator: char,
) -> Result<Vec<String>, String> {
    let mut res = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in text.chars() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth = depth
                .checked_sub(1)
                .ok_or_else(|| format!("unbalanced `{close}` in `{text}`"))?;
        } else if c == separator && depth == 0 {
            res.push(current.trim().to_string());
            current.clear();
            continue;
        }
        current.push(c);
    }
    if depth != 0 {
        return Err(format!("missing `{close}` in `{text}`"));
    }
    let last = current.trim();
    if !last.is_empty() || !res.is_empty() {
        res.push(last.to_string());
    }
    Ok(res)
}

/// Parses `text` as a comma-separated argument list and assigns the
/// tokens to `object`'s fields in declaration order.
///
/// Returns `false` when the list is malformed, has more tokens than the
/// class has fields, or a token fails to parse; details go to `report`.
pub fn load_arguments(object: &mut dyn Object, text: &str, report: &mut Report) -> bool {
    let context = "load_arguments";
    let tokens = match parse_list_with_parenthesis(text, '(', ')', ',') {
        Ok(tokens) => tokens,
        Err(message) => {
            report.error(context, &message);
            return false;
        }
    };
    let class = object.class();
    if tokens.len() > class.field_count() {
        report.error(
            context,
            &format!(
                "too many arguments for {}: got {}, expected at most {}",
                class.name(),
                tokens.len(),
                class.field_count()
            ),
        );
        return false;
    }
    let mut ok = true;
    for (index, token) in tokens.iter().enumerate() {
        if token.is_empty() {
            continue;
        }
        let Some(ty) = class.field_type(index).cloned() else {
            continue;
        };
        match Variant::parse(&ty, token) {
            Ok(value) => object.set_field(index, value),
            Err(err) => {
                report.error(context, &err.to_string());
                ok = false;
            }
        }
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Pair;
    use crate::registry::TypeRegistry;

    #[test]
    fn split_respects_nesting() {
        let tokens = parse_list_with_parenthesis("a, f(b, c), d", '(', ')', ',').unwrap();
        assert_eq!(tokens, vec!["a", "f(b, c)", "d"]);
    }

    #[test]
    fn split_rejects_unbalanced_brackets() {
        assert!(parse_list_with_parenthesis("f(a, b", '(', ')', ',').is_err());
        assert!(parse_list_with_parenthesis("a)b", '(', ')', ',').is_err());
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(parse_list_with_parenthesis("  ", '(', ')', ',').unwrap().is_empty());
    }

    #[test]
    fn arguments_fill_fields_in_order() {
        let registry = TypeRegistry::new();
        let class = registry.resolve("Pair<Integer,String>").unwrap();
        let mut pair = Pair::new(
            class,
            crate::value::Variant::missing(crate::info::integer_type()),
            crate::value::Variant::missing(crate::info::string_type()),
        );
        let mut report = Report::new();
        assert!(load_arguments(&mut pair, "12, hello", &mut report));
        assert_eq!(pair.first().as_integer(), Some(12));
        assert_eq!(pair.second().as_str(), Some("hello"));
        assert!(!report.has_errors());
    }

    #[test]
    fn too_many_tokens_is_an_error() {
        let registry = TypeRegistry::new();
        let class = registry.resolve("Pair<Integer,Integer>").unwrap();
        let mut pair = Pair::new(
            class,
            crate::value::Variant::missing(crate::info::integer_type()),
            crate::value::Variant::missing(crate::info::integer_type()),
        );
        let mut report = Report::new();
        assert!(!load_arguments(&mut pair, "1, 2, 3", &mut report));
        assert!(report.has_errors());
    }
}
