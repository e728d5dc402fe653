//! C5 — an `@output(name)` is only meaningful if `name` is actually
//! declared (a rule head or a fact) or is itself an `@input` pass-through.

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::features::graph_builder::SymbolTables;
use crate::shared::models::{ProgramGraph, TokenLocation};

use super::SemanticAnalyzer;

pub struct NonExistingOutputAnalyzer;

impl SemanticAnalyzer for NonExistingOutputAnalyzer {
    fn name(&self) -> &'static str {
        "NonExistingOutput"
    }

    fn run(&self, graph: &mut ProgramGraph, tables: &SymbolTables) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for (name, token) in &tables.output_declarations {
            if tables.input_atom_names.contains(name) {
                continue;
            }
            let declared = graph.atom_id(name).map(|a| graph.atom(a).is_idb).unwrap_or(false)
                || graph.tokens.iter().any(|t| t.atom == graph.atom_id(name) && t.location == TokenLocation::Fact);
            if declared {
                continue;
            }
            diagnostics.push(
                DiagnosticBuilder::new(DiagnosticKind::ErrNonExistingOutput, token.range())
                    .with("atom", name.clone())
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
        NonExistingOutputAnalyzer.run(&mut result.graph, &result.tables)
    }

    #[test]
    fn output_with_no_head_no_fact_no_input_is_flagged() {
        let diagnostics = analyze("@output(\"a\").");
        assert!(diagnostics.iter().any(|d| d.code == DiagnosticKind::ErrNonExistingOutput.code()));
    }

    #[test]
    fn output_backed_by_a_rule_head_is_fine() {
        let diagnostics = analyze("b(1).\n@output(\"a\").\na(X):-b(X).");
        assert!(diagnostics.is_empty());
    }
}
