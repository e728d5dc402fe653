//! C5 — an `@mapping` declares one column per term of the atom it maps.
//! If the column count and the atom's arity disagree, the binding can
//! never line up term-for-term with the external source.

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::features::graph_builder::SymbolTables;
use crate::shared::models::ProgramGraph;

use super::SemanticAnalyzer;

pub struct MappingArityAnalyzer;

impl SemanticAnalyzer for MappingArityAnalyzer {
    fn name(&self) -> &'static str {
        "MappingArity"
    }

    fn run(&self, graph: &mut ProgramGraph, tables: &SymbolTables) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for (name, entries) in &tables.mappings {
            let Some(atom) = graph.atom_id(name) else { continue };
            let arity = graph
                .tokens
                .iter()
                .filter(|t| t.atom == Some(atom))
                .filter_map(|t| t.term_index)
                .max()
                .map(|max| max + 1);
            let Some(arity) = arity else { continue };
            let mapped = entries.len() as u32;
            if mapped == arity {
                continue;
            }
            for entry in entries {
                diagnostics.push(
                    DiagnosticBuilder::new(DiagnosticKind::ErrMappingArity, entry.token.range())
                        .with("atom", name.clone())
                        .with("mapped", mapped.to_string())
                        .with("actual", arity.to_string())
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
        MappingArityAnalyzer.run(&mut result.graph, &result.tables)
    }

    #[test]
    fn mismatched_column_count_is_flagged() {
        let diagnostics = analyze("@mapping(\"a\",0,\"x\",\"int\").\na(1,2).");
        assert!(diagnostics.iter().any(|d| d.code == DiagnosticKind::ErrMappingArity.code()));
    }

    #[test]
    fn matching_column_count_is_fine() {
        let diagnostics = analyze("@mapping(\"a\",0,\"x\",\"int\").\n@mapping(\"a\",1,\"y\",\"int\").\na(1,2).");
        assert!(diagnostics.is_empty());
    }
}
