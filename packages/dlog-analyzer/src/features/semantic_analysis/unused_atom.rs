//! C5 — an atom nobody calls, outputs, imports as `@input`, or exports
//! through a module is dead weight: it contributes nothing observable
//! to the program.

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::features::graph_builder::SymbolTables;
use crate::shared::models::{AtomId, ProgramGraph, TokenLocation};

use super::SemanticAnalyzer;

pub struct UnusedAtomAnalyzer;

impl SemanticAnalyzer for UnusedAtomAnalyzer {
    fn name(&self) -> &'static str {
        "UnusedAtom"
    }

    fn run(&self, graph: &mut ProgramGraph, tables: &SymbolTables) -> Vec<Diagnostic> {
        let outputs = tables.output_atom_names();
        let mut diagnostics = Vec::new();

        for i in 0..graph.atoms.len() {
            let atom = AtomId(i as u32);
            let name = graph.atom(atom).name.clone();

            if tables.input_atom_names.contains(&name) || outputs.contains(&name) || tables.module_names.contains(&name) {
                continue;
            }

            let used_in_body = graph.tokens.iter().any(|t| t.atom == Some(atom) && t.location == TokenLocation::Body);
            if used_in_body {
                continue;
            }

            let mut occurrences: Vec<_> = graph
                .tokens
                .iter()
                .filter(|t| t.atom == Some(atom) && t.term_index.is_none() && matches!(t.location, TokenLocation::Head | TokenLocation::Fact))
                .collect();
            occurrences.sort_by_key(|t| t.lexical.sort_key());
            let Some(first) = occurrences.first() else { continue };

            diagnostics.push(
                DiagnosticBuilder::new(DiagnosticKind::ErrUnusedAtom, first.lexical.range())
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
        UnusedAtomAnalyzer.run(&mut result.graph, &result.tables)
    }

    #[test]
    fn fact_atom_with_no_other_use_is_unused() {
        let diagnostics = analyze("a(1).");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticKind::ErrUnusedAtom.code());
    }

    #[test]
    fn input_only_atom_is_not_unused() {
        let diagnostics = analyze("@input(\"c\").");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn atom_used_in_a_body_is_not_unused() {
        let diagnostics = analyze("a(1).\np(X):-a(X).");
        assert!(diagnostics.iter().all(|d| d.code != DiagnosticKind::ErrUnusedAtom.code()));
    }

    #[test]
    fn atom_declared_as_output_is_not_unused() {
        let diagnostics = analyze("a(1).\n@output(\"a\").");
        assert!(diagnostics.iter().all(|d| d.code != DiagnosticKind::ErrUnusedAtom.code()));
    }
}
