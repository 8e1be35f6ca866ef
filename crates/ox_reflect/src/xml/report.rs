//! Diagnostics collected during XML import and export.
//!
//! Errors never abort the traversal: they are recorded here, mirrored to
//! the [`log`] facade and inspected by the caller afterwards.

/// How severe a diagnostic is.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Severity {
    Warning,
    Error,
}

/// A single diagnostic: where it happened and what went wrong.
#[derive(Clone, Debug)]
pub struct Message {
    severity: Severity,
    context: String,
    text: String,
}

impl Message {
    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// An ordered collection of diagnostics.
#[derive(Default)]
pub struct Report {
    messages: Vec<Message>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error and logs it.
    pub fn error(&mut self, context: &str, text: &str) {
        log::error!("{context}: {text}");
        self.messages.push(Message {
            severity: Severity::Error,
            context: context.into(),
            text: text.into(),
        });
    }

    /// Records a warning and logs it.
    pub fn warning(&mut self, context: &str, text: &str) {
        log::warn!("{context}: {text}");
        self.messages.push(Message {
            severity: Severity::Warning,
            context: context.into(),
            text: text.into(),
        });
    }

    /// Whether at least one error was recorded.
    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.severity == Severity::Error)
    }

    /// All recorded diagnostics, in recording order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of recorded errors.
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Number of recorded warnings.
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.messages.iter().filter(|m| m.severity == severity).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_severity() {
        let mut report = Report::new();
        assert!(!report.has_errors());
        report.warning("here", "odd");
        report.error("there", "bad");
        report.warning("here", "odd again");
        assert!(report.has_errors());
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 2);
        assert_eq!(report.messages()[1].context(), "there");
    }
}
