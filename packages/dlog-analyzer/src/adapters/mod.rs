//! C8 — External Interface Adapters.
//!
//! Thin layer the language-server transport talks to: `analyze` runs the
//! whole C2→C3→C5→C4→C7 pipeline over one document and returns its
//! tokens and diagnostics; [`AnalyzerSession`] additionally keeps the
//! built graph and symbol tables around so the per-position query
//! helpers (`get_atom_references`, `get_atom_vadoc_block`, `get_bindings`,
//! `get_mappings`, `get_rule_at_cursor`) can answer without re-parsing.
//!
//! No caching, TTL or background eviction here — spec's Non-goals rule
//! out persisting the graph across sessions or incremental re-analysis,
//! so a session holds exactly one document's analysis, replaced whole by
//! the next `analyze` call.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::features::decorator::{self, DecoratedToken, TargetFragment};
use crate::features::diagnostics::Diagnostic;
use crate::features::graph_builder::{BindingInfo, MappingEntry, ProgramGraphBuilderUseCase, ProgramGraphBuilderUseCaseImpl, SymbolTables};
use crate::features::{base_analysis, fragment_analysis, semantic_analysis};
use crate::shared::models::{AnalyzerError, ProgramGraph, Range, Result};

/// The return value of one `analyze()` call: every token of the
/// document, decorated with the attributes analyzers attached, plus the
/// diagnostic list (already narrowed to `target_fragment`, if given).
/// `Serialize`/`Deserialize` so a host process across an FFI or wire
/// boundary can ship it unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub tokens: Vec<DecoratedToken>,
    pub diagnostics: Vec<Diagnostic>,
}

struct SessionState {
    graph: ProgramGraph,
    tables: SymbolTables,
}

/// Stateful handle around one document's analysis. Call [`AnalyzerSession::analyze`]
/// first; every query helper returns [`AnalyzerError::NotAnalyzed`] until
/// it has.
#[derive(Default)]
pub struct AnalyzerSession {
    state: Option<SessionState>,
}

impl AnalyzerSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the full pipeline over `source` and keeps the resulting graph
    /// and symbol tables for subsequent query calls.
    #[instrument(skip_all)]
    pub fn analyze(&mut self, source: &str, target_fragment: Option<TargetFragment>) -> AnalysisResult {
        let built = ProgramGraphBuilderUseCaseImpl::new().build_program_graph(source);
        let mut graph = built.graph;
        let tables = built.tables;

        base_analysis::run(&mut graph);

        let mut diagnostics = built.diagnostics;
        diagnostics.extend(semantic_analysis::run_all(&mut graph, &tables));
        diagnostics.extend(fragment_analysis::run_all(&mut graph));

        let tokens = decorator::assemble_tokens(&graph);
        let diagnostics = decorator::filter_diagnostics(diagnostics, target_fragment.unwrap_or_default());

        self.state = Some(SessionState { graph, tables });

        AnalysisResult { tokens, diagnostics }
    }

    fn state(&self, who: &'static str) -> Result<&SessionState> {
        self.state.as_ref().ok_or(AnalyzerError::NotAnalyzed(who))
    }

    /// Every lexical occurrence (head, body or fact) of the atom named
    /// `name`, in source order.
    pub fn get_atom_references(&self, name: &str) -> Result<Vec<Range>> {
        let state = self.state("get_atom_references")?;
        let Some(atom) = state.graph.atom_id(name) else {
            return Ok(Vec::new());
        };
        let mut ranges: Vec<Range> = state
            .graph
            .tokens
            .iter()
            .filter(|t| t.atom == Some(atom) && t.term_index.is_none())
            .map(|t| t.lexical.range())
            .collect();
        ranges.sort_by_key(|r| (r.start.line, r.start.character));
        Ok(ranges)
    }

    /// The Vadoc comment block immediately above `name`'s declaration, if any.
    pub fn get_atom_vadoc_block(&self, name: &str) -> Result<Option<String>> {
        let state = self.state("get_atom_vadoc_block")?;
        Ok(state.tables.atom_vadoc.get(name).cloned())
    }

    pub fn get_bindings(&self, name: &str) -> Result<Vec<BindingInfo>> {
        let state = self.state("get_bindings")?;
        Ok(state.tables.bindings.get(name).cloned().unwrap_or_default())
    }

    pub fn get_mappings(&self, name: &str) -> Result<Vec<MappingEntry>> {
        let state = self.state("get_mappings")?;
        Ok(state.tables.mappings.get(name).cloned().unwrap_or_default())
    }

    /// The range of the innermost rule/fact/annotation whose span covers
    /// `(line, character)`, if any. Ties (nested or overlapping ranges,
    /// which the grammar never actually produces) resolve to the
    /// narrowest span.
    pub fn get_rule_at_cursor(&self, line: u32, character: u32) -> Result<Option<Range>> {
        let state = self.state("get_rule_at_cursor")?;
        let cursor = (line, character);
        Ok(state
            .graph
            .rules
            .iter()
            .map(|r| r.range)
            .filter(|r| (r.start.line, r.start.character) <= cursor && cursor < (r.end.line, r.end.character))
            .min_by_key(|r| span_len(*r)))
    }
}

fn span_len(r: Range) -> (u32, u32) {
    (r.end.line.saturating_sub(r.start.line), r.end.character.saturating_sub(r.start.character))
}

/// Stateless convenience wrapping [`AnalyzerSession::analyze`] for callers
/// that don't need the query helpers.
pub fn analyze(source: &str, target_fragment: Option<TargetFragment>) -> AnalysisResult {
    AnalyzerSession::new().analyze(source, target_fragment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_returns_sorted_tokens_and_diagnostics() {
        let result = analyze("a(1).", None);
        assert!(!result.tokens.is_empty());
        for pair in result.tokens.windows(2) {
            let a = (pair[0].range.start.line, pair[0].range.start.character);
            let b = (pair[1].range.start.line, pair[1].range.start.character);
            assert!(a <= b);
        }
        assert!(result.diagnostics.iter().any(|d| d.code == "1011"));
    }

    #[test]
    fn query_helpers_fail_before_analyze() {
        let session = AnalyzerSession::new();
        assert!(matches!(session.get_atom_references("a"), Err(AnalyzerError::NotAnalyzed(_))));
        assert!(matches!(session.get_bindings("a"), Err(AnalyzerError::NotAnalyzed(_))));
        assert!(matches!(session.get_rule_at_cursor(0, 0), Err(AnalyzerError::NotAnalyzed(_))));
    }

    #[test]
    fn atom_references_are_found_after_analyze() {
        let mut session = AnalyzerSession::new();
        session.analyze("a(1).\np(X):-a(X).", None);
        let refs = session.get_atom_references("a").unwrap();
        assert_eq!(refs.len(), 2);
    }

    #[test]
    fn rule_at_cursor_finds_the_enclosing_rule() {
        let mut session = AnalyzerSession::new();
        session.analyze("p(X):-a(X).", None);
        let rule = session.get_rule_at_cursor(0, 2).unwrap();
        assert!(rule.is_some());
    }

    #[test]
    fn analysis_result_round_trips_through_json() {
        let result = analyze("b(1).\na(X):-b(X).\n@output(\"a\").", None);
        let json = serde_json::to_string(&result).unwrap();
        let back: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tokens.len(), result.tokens.len());
        assert_eq!(back.diagnostics.len(), result.diagnostics.len());
    }

    #[test]
    fn determinism_across_two_analyze_calls() {
        let source = "b(1).\na(X):-b(X).\n@output(\"a\").";
        let first = analyze(source, None);
        let second = analyze(source, None);
        assert_eq!(first.tokens.len(), second.tokens.len());
        assert_eq!(first.diagnostics.len(), second.diagnostics.len());
    }
}
