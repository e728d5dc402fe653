//! C5 — wiring an `@input`/`@output` atom to external storage requires
//! a `@bind`/`@qbind`. An unbound input always needs one (nothing else
//! could supply its rows); an unbound output only needs one when the
//! analyzer isn't deriving it from a rule, since a derived output's
//! rows come from evaluation rather than a binding.

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::features::graph_builder::SymbolTables;
use crate::shared::models::{ProgramGraph, TokenLocation};

use super::SemanticAnalyzer;

pub struct UnboundInputOutputAnalyzer;

impl SemanticAnalyzer for UnboundInputOutputAnalyzer {
    fn name(&self) -> &'static str {
        "UnboundInputOutput"
    }

    fn run(&self, graph: &mut ProgramGraph, tables: &SymbolTables) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for token in graph.tokens.iter().filter(|t| t.location == TokenLocation::Input && t.term_index.is_none()) {
            let Some(atom) = token.atom else { continue };
            let name = &graph.atom(atom).name;
            if tables.atom_bindings.contains(name) {
                continue;
            }
            diagnostics.push(
                DiagnosticBuilder::new(DiagnosticKind::ErrNoBindingsForInput, token.lexical.range())
                    .with("atom", name.clone())
                    .build(),
            );
        }

        for token in graph.tokens.iter().filter(|t| t.location == TokenLocation::Output && t.term_index.is_none()) {
            let Some(atom) = token.atom else { continue };
            let node = graph.atom(atom);
            if node.is_idb || tables.atom_bindings.contains(&node.name) {
                continue;
            }
            diagnostics.push(
                DiagnosticBuilder::new(DiagnosticKind::NoBindingsForOutput, token.lexical.range())
                    .with("atom", node.name.clone())
                    .build(),
            );
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::graph_builder::{ProgramGraphBuilderUseCase, ProgramGraphBuilderUseCaseImpl};

    fn analyze(source: &str) -> Vec<Diagnostic> {
        let mut result = ProgramGraphBuilderUseCaseImpl::new().build_program_graph(source);
        UnboundInputOutputAnalyzer.run(&mut result.graph, &result.tables)
    }

    #[test]
    fn unbound_input_is_flagged() {
        let diagnostics = analyze("@input(\"c\").");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticKind::ErrNoBindingsForInput.code());
    }

    #[test]
    fn output_derived_by_a_rule_needs_no_binding() {
        let diagnostics = analyze("b(1).\n@output(\"a\").\na(X):-b(X).");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn unbound_non_derived_output_gets_a_hint() {
        let diagnostics = analyze("a(1).\n@output(\"a\").");
        assert!(diagnostics.iter().any(|d| d.code == DiagnosticKind::NoBindingsForOutput.code()));
    }
}
