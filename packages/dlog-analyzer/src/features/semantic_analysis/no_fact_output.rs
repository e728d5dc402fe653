//! C5 — an atom backed by ground facts can never also be an `@output`:
//! output declarations name atoms the analyzer is expected to *derive*.

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::features::graph_builder::SymbolTables;
use crate::shared::models::{ProgramGraph, TokenLocation};

use super::SemanticAnalyzer;

pub struct NoFactOutputAnalyzer;

impl SemanticAnalyzer for NoFactOutputAnalyzer {
    fn name(&self) -> &'static str {
        "NoFactOutput"
    }

    fn run(&self, graph: &mut ProgramGraph, tables: &SymbolTables) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for (name, token) in &tables.output_declarations {
            let Some(atom) = graph.atom_id(name) else { continue };
            let has_fact = graph.tokens.iter().any(|t| t.atom == Some(atom) && t.location == TokenLocation::Fact);
            if !has_fact {
                continue;
            }
            diagnostics.push(
                DiagnosticBuilder::new(DiagnosticKind::ErrNoExtensionalAtomAsOutput, token.range())
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
        NoFactOutputAnalyzer.run(&mut result.graph, &result.tables)
    }

    #[test]
    fn fact_atom_declared_as_output_is_flagged() {
        let diagnostics = analyze("a(1).\n@output(\"a\").");
        assert!(diagnostics.iter().any(|d| d.code == DiagnosticKind::ErrNoExtensionalAtomAsOutput.code()));
    }

    #[test]
    fn derived_atom_declared_as_output_is_fine() {
        let diagnostics = analyze("b(1).\n@output(\"a\").\na(X):-b(X).");
        assert!(diagnostics.is_empty());
    }
}
