//! C5 — the second and later `@output(name)` declarations for the same
//! atom are flagged, including the first: all of them are ambiguous
//! once there's more than one.

use rustc_hash::FxHashMap;

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::features::graph_builder::SymbolTables;
use crate::shared::models::ProgramGraph;

use super::SemanticAnalyzer;

pub struct DuplicateOutputAnalyzer;

impl SemanticAnalyzer for DuplicateOutputAnalyzer {
    fn name(&self) -> &'static str {
        "DuplicateOutput"
    }

    fn run(&self, _graph: &mut ProgramGraph, tables: &SymbolTables) -> Vec<Diagnostic> {
        let mut by_name: FxHashMap<&str, u32> = FxHashMap::default();
        for (name, _) in &tables.output_declarations {
            *by_name.entry(name.as_str()).or_insert(0) += 1;
        }

        tables
            .output_declarations
            .iter()
            .filter(|(name, _)| by_name.get(name.as_str()).copied().unwrap_or(0) > 1)
            .map(|(name, token)| {
                DiagnosticBuilder::new(DiagnosticKind::ErrAtomAlreadyOutput, token.range())
                    .with("atom", name.clone())
                    .build()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::graph_builder::{ProgramGraphBuilderUseCase, ProgramGraphBuilderUseCaseImpl};

    fn analyze(source: &str) -> Vec<Diagnostic> {
        let mut result = ProgramGraphBuilderUseCaseImpl::new().build_program_graph(source);
        DuplicateOutputAnalyzer.run(&mut result.graph, &result.tables)
    }

    #[test]
    fn two_output_declarations_for_the_same_atom_both_flagged() {
        let diagnostics = analyze("b(1).\n@output(\"a\").\n@output(\"a\").\na(X):-b(X).");
        assert_eq!(diagnostics.iter().filter(|d| d.code == DiagnosticKind::ErrAtomAlreadyOutput.code()).count(), 2);
    }

    #[test]
    fn single_output_declaration_is_fine() {
        let diagnostics = analyze("b(1).\n@output(\"a\").\na(X):-b(X).");
        assert!(diagnostics.is_empty());
    }
}
