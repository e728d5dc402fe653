//! Diagnostic value shape (spec §6 "Diagnostic contract").

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::shared::models::Range;

use super::catalog::{doc_href, DiagnosticKind};
use super::severity::Severity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tag {
    Unused,
}

/// The shape handed across the C8 boundary for one diagnostic, matching
/// spec §6's contract field-for-field; `Serialize` lets a host process
/// ship it over the wire unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub range: Range,
    pub severity: Severity,
    pub code: String,
    pub href: String,
    pub message: String,
    pub fragment_violation: Option<String>,
    pub tags: Vec<Tag>,
}

/// Builder mirroring the "templates resolved at emission time against a
/// data map" rule in spec §4.6.
pub struct DiagnosticBuilder {
    kind: DiagnosticKind,
    range: Range,
    data: FxHashMap<&'static str, String>,
    fragment_violation: Option<String>,
    tags: Vec<Tag>,
}

impl DiagnosticBuilder {
    pub fn new(kind: DiagnosticKind, range: Range) -> Self {
        Self {
            kind,
            range,
            data: FxHashMap::default(),
            fragment_violation: None,
            tags: Vec::new(),
        }
    }

    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.data.insert(key, value.into());
        self
    }

    pub fn fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment_violation = Some(fragment.into());
        self
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn build(self) -> Diagnostic {
        let mut message = self.kind.template().to_string();
        for (key, value) in &self.data {
            message = message.replace(&format!("{{{key}}}"), value);
        }
        Diagnostic {
            range: self.range,
            severity: self.kind.severity(),
            code: self.kind.code(),
            href: doc_href(self.kind),
            message,
            fragment_violation: self.fragment_violation,
            tags: self.tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::Position;

    #[test]
    fn template_placeholders_are_resolved() {
        let d = DiagnosticBuilder::new(DiagnosticKind::ErrUndeclaredAtom, Range::new(Position::new(0, 0), Position::new(0, 1)))
            .with("atom", "foo")
            .build();
        assert_eq!(d.message, "Atom 'foo' is used but never declared");
        assert_eq!(d.code, "1001");
    }

    #[test]
    fn diagnostic_round_trips_through_json() {
        let d = DiagnosticBuilder::new(DiagnosticKind::ErrAtomAlreadyOutput, Range::new(Position::new(2, 0), Position::new(2, 3)))
            .with("atom", "a")
            .fragment("Warded")
            .tag(Tag::Unused)
            .build();
        let json = serde_json::to_string(&d).unwrap();
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back.code, d.code);
        assert_eq!(back.fragment_violation, d.fragment_violation);
        assert_eq!(back.tags, d.tags);
    }
}
