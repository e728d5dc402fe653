//! Unified error type for the analyzer crate.
//!
//! Every recoverable condition inside the analyzer (parse errors, symbol
//! errors, fragment violations, style warnings, hints) is represented as a
//! [`crate::features::diagnostics::Diagnostic`] value, never as an `Err`.
//! `AnalyzerError` exists only for the one error kind spec §7 calls out as
//! a hard precondition violation: querying analysis results before
//! `analyze()` has completed.

use thiserror::Error;

/// Errors that abort a call instead of producing a diagnostic.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// A query helper (`get_atom_references`, `get_bindings`, ...) was
    /// called on a session that has not finished `analyze()`.
    #[error("query issued before analysis completed: {0}")]
    NotAnalyzed(&'static str),

    /// The reference front end failed in a way that leaves no usable
    /// parse tree at all (as opposed to a parse-level diagnostic, which
    /// is still a usable partial tree).
    #[error("reference parser produced no tree: {0}")]
    NoParseTree(String),
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
