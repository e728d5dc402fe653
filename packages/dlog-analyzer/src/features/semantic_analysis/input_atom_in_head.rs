//! C5 — an atom declared `@input` and also derived by a rule head is
//! suspicious: the analyzer can't tell whether it should trust the
//! external source or the derivation.

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::features::graph_builder::SymbolTables;
use crate::shared::models::{ProgramGraph, TokenLocation};

use super::SemanticAnalyzer;

pub struct InputAtomInHeadAnalyzer;

impl SemanticAnalyzer for InputAtomInHeadAnalyzer {
    fn name(&self) -> &'static str {
        "InputAtomInHead"
    }

    fn run(&self, graph: &mut ProgramGraph, tables: &SymbolTables) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for token in &graph.tokens {
            let Some(atom) = token.atom else { continue };
            if token.location != TokenLocation::Head || token.term_index.is_some() {
                continue;
            }
            let name = &graph.atom(atom).name;
            if tables.input_atom_names.contains(name) {
                diagnostics.push(
                    DiagnosticBuilder::new(DiagnosticKind::ErrInputAtomInHead, token.lexical.range())
                        .with("atom", name.clone())
                        .build(),
                );
            }
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
        InputAtomInHeadAnalyzer.run(&mut result.graph, &result.tables)
    }

    #[test]
    fn input_atom_also_derived_is_flagged() {
        let diagnostics = analyze("@input(\"a\").\na(X):-b(X).");
        assert!(diagnostics.iter().any(|d| d.code == DiagnosticKind::ErrInputAtomInHead.code()));
    }

    #[test]
    fn input_atom_never_derived_is_fine() {
        let diagnostics = analyze("@input(\"a\").\np(X):-a(X).");
        assert!(diagnostics.is_empty());
    }
}
