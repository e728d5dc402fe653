//! C6 — Diagnostic Catalog.

mod catalog;
mod diagnostic;
mod severity;

pub use catalog::{doc_href, DiagnosticKind};
pub use diagnostic::{Diagnostic, DiagnosticBuilder, Tag};
pub use severity::Severity;
