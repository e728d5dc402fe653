//! C5 — an atom is declared iff it has a rule head, a ground fact, or
//! an `@input` declaration. Anything else referencing it (a body call,
//! an `@output`/`@bind`/`@mapping`/`@post` annotation) is a reference to
//! something that was never introduced.

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::features::graph_builder::SymbolTables;
use crate::shared::models::{AtomId, ProgramGraph, TokenLocation};

use super::SemanticAnalyzer;

pub struct UndeclaredAtomAnalyzer;

impl SemanticAnalyzer for UndeclaredAtomAnalyzer {
    fn name(&self) -> &'static str {
        "UndeclaredAtom"
    }

    fn run(&self, graph: &mut ProgramGraph, _tables: &SymbolTables) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for i in 0..graph.atoms.len() {
            let atom = AtomId(i as u32);
            let node = graph.atom(atom);
            // is_edb already covers @input (recompute_atom_classification
            // sets it from Fact *or* Input tokens), so checking it alone
            // is enough to rule out both declaration forms.
            if node.is_idb || node.is_edb {
                continue;
            }
            let name = node.name.clone();
            for j in 0..graph.tokens.len() {
                let t = &graph.tokens[j];
                if t.atom != Some(atom) || t.term_index.is_some() {
                    continue;
                }
                if matches!(t.location, TokenLocation::Head | TokenLocation::Fact) {
                    continue;
                }
                diagnostics.push(
                    DiagnosticBuilder::new(DiagnosticKind::ErrUndeclaredAtom, t.lexical.range())
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
        UndeclaredAtomAnalyzer.run(&mut result.graph, &result.tables)
    }

    #[test]
    fn body_atom_with_no_head_fact_or_input_is_undeclared() {
        let diagnostics = analyze("p(X):-a(X).");
        assert!(diagnostics.iter().any(|d| d.code == DiagnosticKind::ErrUndeclaredAtom.code()));
    }

    #[test]
    fn body_atom_backed_by_a_fact_is_declared() {
        let diagnostics = analyze("a(1).\np(X):-a(X).");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn body_atom_backed_by_an_input_declaration_is_declared() {
        let diagnostics = analyze("@input(\"a\").\np(X):-a(X).");
        assert!(diagnostics.is_empty());
    }
}
