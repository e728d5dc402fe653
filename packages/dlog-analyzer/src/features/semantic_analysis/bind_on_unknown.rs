//! C5 — a binding only makes sense once the atom it binds is known as
//! either an `@input` or an `@output` source/sink.

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::features::graph_builder::SymbolTables;
use crate::shared::models::{ProgramGraph, TokenLocation};

use super::SemanticAnalyzer;

pub struct BindOnUnknownAnalyzer;

impl SemanticAnalyzer for BindOnUnknownAnalyzer {
    fn name(&self) -> &'static str {
        "BindOnUnknown"
    }

    fn run(&self, graph: &mut ProgramGraph, tables: &SymbolTables) -> Vec<Diagnostic> {
        let outputs = tables.output_atom_names();
        let mut diagnostics = Vec::new();
        for name in &tables.atom_bindings {
            if tables.input_atom_names.contains(name) || outputs.contains(name) {
                continue;
            }
            for token in &graph.tokens {
                if token.location == TokenLocation::Binding && token.atom.map(|a| &graph.atom(a).name) == Some(name) {
                    diagnostics.push(
                        DiagnosticBuilder::new(DiagnosticKind::ErrBindingOnUnknownAtom, token.lexical.range())
                            .with("atom", name.clone())
                            .build(),
                    );
                }
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
        BindOnUnknownAnalyzer.run(&mut result.graph, &result.tables)
    }

    #[test]
    fn binding_without_input_or_output_is_flagged() {
        let diagnostics = analyze("@bind(\"a\",\"csv\",\"folder\",\"file.csv\").");
        assert!(diagnostics.iter().any(|d| d.code == DiagnosticKind::ErrBindingOnUnknownAtom.code()));
    }

    #[test]
    fn binding_on_declared_input_is_fine() {
        let diagnostics = analyze("@input(\"a\").\n@bind(\"a\",\"csv\",\"folder\",\"file.csv\").");
        assert!(diagnostics.is_empty());
    }
}
