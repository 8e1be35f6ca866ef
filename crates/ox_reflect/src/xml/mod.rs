//! XML serialization of variants and object graphs.
//!
//! [`XmlWriter`] exports a value into an `lbcpp` document, preserving
//! object sharing through `<shared>` declarations; [`XmlReader`] loads
//! such a document back through a [`TypeRegistry`](crate::registry::TypeRegistry).
//! Both sides collect their diagnostics in a [`Report`].

mod node;
mod reader;
mod report;
mod text;
mod writer;

pub use node::{NodeId, XmlNode, XmlTree};
pub use reader::XmlReader;
pub use report::{Message, Report, Severity};
pub use text::{XmlTextError, parse_document, render_document};
pub use writer::XmlWriter;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::Type;
    use crate::object::{Pair, new_object, same_object};
    use crate::registry::TypeRegistry;
    use crate::value::Variant;

    fn save(value: &Variant) -> String {
        let mut writer = XmlWriter::new("lbcpp", 0);
        writer.save_variable("", value, None);
        writer.to_document_string().unwrap()
    }

    fn load(registry: &TypeRegistry, text: &str) -> (Option<Variant>, Report) {
        let mut reader = XmlReader::from_str(registry, text).unwrap();
        let value = reader.load();
        (value, reader.into_report())
    }

    #[test]
    fn scalar_pair_round_trips() {
        let registry = TypeRegistry::new();
        let class = registry.resolve("Pair<Integer,String>").unwrap();
        let pair = new_object(Pair::new(
            class,
            Variant::integer(3),
            Variant::string("abc"),
        ));
        let text = save(&Variant::object(pair));

        let (value, report) = load(&registry, &text);
        let value = value.unwrap();
        assert!(!report.has_errors());
        let object = value.as_object().unwrap();
        assert_eq!(object.borrow().get_field(0).as_integer(), Some(3));
        assert_eq!(object.borrow().get_field(1).as_str(), Some("abc"));
    }

    #[test]
    fn diamond_sharing_survives_a_round_trip() {
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
        let text = save(&Variant::object(root));

        let (value, report) = load(&registry, &text);
        let value = value.unwrap();
        assert!(!report.has_errors());
        let object = value.as_object().unwrap();
        let first = object.borrow().get_field(0).as_object().cloned().unwrap();
        let second = object.borrow().get_field(1).as_object().cloned().unwrap();
        assert!(same_object(&first, &second));
        assert_eq!(first.borrow().get_field(1).as_integer(), Some(2));
    }

    #[test]
    fn missing_fields_stay_missing() {
        let registry = TypeRegistry::new();
        let class = registry.resolve("Pair<Integer,String>").unwrap();
        let pair = new_object(Pair::new(
            class,
            Variant::missing(crate::info::integer_type()),
            Variant::string("only"),
        ));
        let text = save(&Variant::object(pair));

        let (value, report) = load(&registry, &text);
        let value = value.unwrap();
        assert!(!report.has_errors());
        let object = value.as_object().unwrap();
        assert!(object.borrow().get_field(0).is_missing());
        assert_eq!(object.borrow().get_field(1).as_str(), Some("only"));

        // Saving the reloaded object produces the same document.
        assert_eq!(save(&value), text);
    }

    #[test]
    fn explicit_missing_round_trips() {
        let registry = TypeRegistry::new();
        let text = save(&Variant::missing(crate::info::double_type()));
        let (value, report) = load(&registry, &text);
        let value = value.unwrap();
        assert!(!report.has_errors());
        assert!(value.is_missing());
        assert!(Type::same(value.ty(), &crate::info::double_type()));
    }

    #[test]
    fn unknown_field_warns_and_continues() {
        let registry = TypeRegistry::new();
        let text = r#"<lbcpp>
            <variable type="Pair[Integer,String]">
              <variable name="first">3</variable>
              <variable name="legacy">what</variable>
              <variable name="second">abc</variable>
            </variable>
          </lbcpp>"#;

        let (value, report) = load(&registry, text);
        let value = value.unwrap();
        assert!(!report.has_errors());
        assert_eq!(report.warning_count(), 1);
        let object = value.as_object().unwrap();
        assert_eq!(object.borrow().get_field(0).as_integer(), Some(3));
        assert_eq!(object.borrow().get_field(1).as_str(), Some("abc"));
    }

    #[test]
    fn variable_without_name_fails_the_load() {
        let registry = TypeRegistry::new();
        let text = r#"<lbcpp>
            <variable type="Pair[Integer,Integer]">
              <variable>3</variable>
            </variable>
          </lbcpp>"#;

        let (value, report) = load(&registry, text);
        assert!(value.is_none());
        assert!(report.has_errors());
    }

    #[test]
    fn legacy_ref_attribute_is_accepted() {
        let registry = TypeRegistry::new();
        let text = r#"<lbcpp>
            <shared identifier="Pair[Integer,Integer]1" type="Pair[Integer,Integer]">
              <variable name="first">1</variable>
              <variable name="second">2</variable>
            </shared>
            <variable type="Pair[Pair[Integer,Integer],Pair[Integer,Integer]]">
              <variable name="first" ref="Pair[Integer,Integer]1"/>
              <variable name="second" reference="Pair[Integer,Integer]1"/>
            </variable>
          </lbcpp>"#;

        let (value, report) = load(&registry, text);
        let value = value.unwrap();
        assert!(!report.has_errors());
        let object = value.as_object().unwrap();
        let first = object.borrow().get_field(0).as_object().cloned().unwrap();
        let second = object.borrow().get_field(1).as_object().cloned().unwrap();
        assert!(same_object(&first, &second));
    }

    #[test]
    fn unknown_reference_is_an_error() {
        let registry = TypeRegistry::new();
        let text = r#"<lbcpp>
            <variable type="Pair[Pair[Integer,Integer],Integer]">
              <variable name="first" reference="nowhere1"/>
              <variable name="second">0</variable>
            </variable>
          </lbcpp>"#;

        let (value, report) = load(&registry, text);
        // The pair still loads, with the broken field left untouched.
        let value = value.unwrap();
        assert!(report.has_errors());
        let object = value.as_object().unwrap();
        assert!(object.borrow().get_field(0).is_missing());
    }

    #[test]
    fn vectors_round_trip_with_indices() {
        let registry = TypeRegistry::new();
        let class = registry.resolve("Vector<Integer>").unwrap();
        let mut vector = crate::object::ObjectVector::new(class);
        for n in [5, -1, 12] {
            vector.push(Variant::integer(n));
        }
        let text = save(&Variant::object(new_object(vector)));
        assert!(text.contains("<element index=\"0\">5</element>"));

        let (value, report) = load(&registry, &text);
        let value = value.unwrap();
        assert!(!report.has_errors());
        let object = value.as_object().unwrap();
        let object = object.borrow();
        assert_eq!(object.element_count(), 3);
        assert_eq!(object.element(1).unwrap().as_integer(), Some(-1));
    }

    #[test]
    fn named_type_values_round_trip_as_text() {
        let registry = TypeRegistry::new();
        let text = save(&Variant::type_value(
            registry.resolve("Pair<Integer,Double>").unwrap(),
        ));
        assert!(text.contains(">Pair&lt;Integer,Double&gt;<"));

        let (value, report) = load(&registry, &text);
        let value = value.unwrap();
        assert!(!report.has_errors());
        let ty = value.as_type().unwrap();
        assert!(Type::same(&ty, &registry.resolve("Pair<Integer,Double>").unwrap()));
    }

    #[test]
    fn string_payloads_round_trip_verbatim() {
        let registry = TypeRegistry::new();
        for payload in [" padded ", "\"quoted\"", "   ", "'a', \"b\"", ""] {
            let text = save(&Variant::string(payload));
            let (value, report) = load(&registry, &text);
            let value = value.unwrap();
            assert!(!report.has_errors());
            assert_eq!(value.as_str(), Some(payload), "payload {payload:?}");
        }
    }

    #[test]
    fn string_fields_round_trip_verbatim() {
        let registry = TypeRegistry::new();
        let class = registry.resolve("Pair<Integer,String>").unwrap();
        let pair = new_object(Pair::new(
            class,
            Variant::integer(1),
            Variant::string(" padded "),
        ));
        let text = save(&Variant::object(pair));

        let (value, report) = load(&registry, &text);
        let value = value.unwrap();
        assert!(!report.has_errors());
        let object = value.as_object().unwrap();
        assert_eq!(object.borrow().get_field(1).as_str(), Some(" padded "));
    }

    #[test]
    fn shared_type_definitions_resolve_by_reference() {
        let registry = TypeRegistry::new();
        let text = r#"<lbcpp>
            <shared identifier="Type1" type="Type">Pair&lt;Integer,Double&gt;</shared>
            <variable>
              <type reference="Type1"/>
              <variable name="first">1</variable>
              <variable name="second">2.5</variable>
            </variable>
          </lbcpp>"#;

        let (value, report) = load(&registry, text);
        let value = value.unwrap();
        assert!(!report.has_errors());
        assert_eq!(value.ty().name(), "Pair<Integer,Double>");
        let object = value.as_object().unwrap();
        assert_eq!(object.borrow().get_field(1).as_double(), Some(2.5));
    }

    #[test]
    fn type_reference_to_a_non_type_is_an_error() {
        let registry = TypeRegistry::new();
        let text = r#"<lbcpp>
            <shared identifier="Pair[Integer,Integer]1" type="Pair[Integer,Integer]">
              <variable name="first">1</variable>
              <variable name="second">2</variable>
            </shared>
            <variable>
              <type reference="Pair[Integer,Integer]1"/>
            </variable>
          </lbcpp>"#;

        let (value, report) = load(&registry, text);
        assert!(value.is_none());
        assert!(report.has_errors());
    }

    #[test]
    fn structural_type_descriptions_resolve() {
        let registry = TypeRegistry::new();
        let text = r#"<lbcpp>
            <variable>
              <type templateType="Pair">
                <templateArgument index="0">Integer</templateArgument>
                <templateArgument index="1">String</templateArgument>
              </type>
              <variable name="first">7</variable>
              <variable name="second">hi</variable>
            </variable>
          </lbcpp>"#;

        let (value, report) = load(&registry, text);
        let value = value.unwrap();
        assert!(!report.has_errors());
        assert_eq!(value.ty().name(), "Pair<Integer,String>");
        let object = value.as_object().unwrap();
        assert_eq!(object.borrow().get_field(0).as_integer(), Some(7));
    }

    #[test]
    fn enumerations_round_trip_by_element_name() {
        let mut registry = TypeRegistry::new();
        let suit = Type::new_enumeration(
            "Suit",
            vec!["clubs".into(), "diamonds".into(), "hearts".into(), "spades".into()],
            Some("CDHS".into()),
        );
        registry.register(suit.clone());

        let text = save(&Variant::enumeration(suit.clone(), 2));
        assert!(text.contains("type=\"Suit\">hearts<"));

        let (value, report) = load(&registry, &text);
        let value = value.unwrap();
        assert!(!report.has_errors());
        assert!(Type::same(value.ty(), &suit));
        assert_eq!(value.as_integer(), Some(2));
    }
}
