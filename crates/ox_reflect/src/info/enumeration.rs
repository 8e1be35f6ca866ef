// -----------------------------------------------------------------------------
// EnumerationSchema

/// The element table of an enumeration type.
///
/// Elements are identified by their index. An enumeration may carry a
/// string of one-letter codes, one character per element, used for the
/// dense rendering of sequence-like containers.
#[derive(Clone, Debug)]
pub struct EnumerationSchema {
    elements: Vec<String>,
    one_letter_codes: Option<String>,
}

impl EnumerationSchema {
    /// Creates a new schema from element names and optional one-letter codes.
    ///
    /// When codes are given there must be exactly one character per element.
    pub fn new(elements: Vec<String>, one_letter_codes: Option<String>) -> Self {
        if let Some(codes) = &one_letter_codes {
            debug_assert_eq!(codes.chars().count(), elements.len());
        }
        Self {
            elements,
            one_letter_codes,
        }
    }

    /// Returns the number of elements.
    #[inline]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Returns the name of the element at `index`, if present.
    pub fn element_name(&self, index: usize) -> Option<&str> {
        self.elements.get(index).map(String::as_str)
    }

    /// Returns the index of the element with the given name or one-letter code.
    pub fn find_element(&self, text: &str) -> Option<usize> {
        if let Some(index) = self.elements.iter().position(|e| e == text) {
            return Some(index);
        }
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => self.find_element_by_code(c),
            _ => None,
        }
    }

    /// Returns the index of the element with the given one-letter code.
    pub fn find_element_by_code(&self, code: char) -> Option<usize> {
        self.one_letter_codes
            .as_ref()
            .and_then(|codes| codes.chars().position(|c| c == code))
    }

    /// Returns the one-letter code of the element at `index`, if codes exist.
    pub fn code(&self, index: usize) -> Option<char> {
        self.one_letter_codes
            .as_ref()
            .and_then(|codes| codes.chars().nth(index))
    }

    /// Whether this enumeration carries one-letter codes.
    #[inline]
    pub fn has_codes(&self) -> bool {
        self.one_letter_codes.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::EnumerationSchema;

    #[test]
    fn find_element_by_name_and_code() {
        let schema = EnumerationSchema::new(
            vec!["alanine".into(), "cysteine".into(), "glycine".into()],
            Some("ACG".into()),
        );
        assert_eq!(schema.find_element("cysteine"), Some(1));
        assert_eq!(schema.find_element("G"), Some(2));
        assert_eq!(schema.find_element("unknown"), None);
        assert_eq!(schema.code(0), Some('A'));
    }
}
