//! C5 — safe negation: a variable reachable from the head through a
//! negated body literal must also be bound by some positive body atom
//! in the same rule, or the rule isn't safe under the standard
//! stratified-negation semantics.

use rustc_hash::FxHashMap;

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::features::graph_builder::SymbolTables;
use crate::shared::models::{EdgeKind, NodeRef, ProgramGraph, VariableId};

use super::SemanticAnalyzer;

pub struct NegationAnalyzer;

impl SemanticAnalyzer for NegationAnalyzer {
    fn name(&self) -> &'static str {
        "Negation"
    }

    fn run(&self, graph: &mut ProgramGraph, _tables: &SymbolTables) -> Vec<Diagnostic> {
        let mut positive: FxHashMap<VariableId, bool> = FxHashMap::default();
        let mut negative: FxHashMap<VariableId, bool> = FxHashMap::default();
        let mut head: FxHashMap<VariableId, bool> = FxHashMap::default();

        graph.for_each_edge(|src, _dst, edge| {
            let EdgeKind::VariableAtAtomToken(attrs) = edge else { return };
            let NodeRef::Variable(var) = src else { return };
            if attrs.head {
                head.insert(var, true);
            } else if attrs.negated {
                negative.insert(var, true);
            } else {
                positive.insert(var, true);
            }
        });

        let mut diagnostics = Vec::new();
        for (var, _) in negative.iter().filter(|(v, _)| head.contains_key(v)) {
            if positive.contains_key(var) {
                continue;
            }
            for token in negated_occurrence_tokens(graph, *var) {
                diagnostics.push(
                    DiagnosticBuilder::new(DiagnosticKind::InvalidNegationPositiveBody, graph.token(token).lexical.range())
                        .with("variable", graph.variable(*var).name.clone())
                        .build(),
                );
            }
        }
        diagnostics
    }
}

fn negated_occurrence_tokens(graph: &ProgramGraph, var: VariableId) -> Vec<crate::shared::models::TokenId> {
    graph
        .out_edges(NodeRef::Variable(var), |e| matches!(e, EdgeKind::VariableAtAtomToken(attrs) if attrs.negated))
        .into_iter()
        .filter_map(|(dst, _)| match dst {
            NodeRef::Token(t) => Some(t),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::graph_builder::{ProgramGraphBuilderUseCase, ProgramGraphBuilderUseCaseImpl};

    fn analyze(source: &str) -> Vec<Diagnostic> {
        let mut result = ProgramGraphBuilderUseCaseImpl::new().build_program_graph(source);
        NegationAnalyzer.run(&mut result.graph, &result.tables)
    }

    #[test]
    fn negated_variable_without_positive_binding_is_unsafe() {
        let diagnostics = analyze("p(X):-not a(X).");
        assert!(diagnostics.iter().any(|d| d.code == DiagnosticKind::InvalidNegationPositiveBody.code()));
    }

    #[test]
    fn negated_variable_bound_by_a_positive_atom_is_safe() {
        let diagnostics = analyze("p(X):-b(X),not a(X).");
        assert!(diagnostics.is_empty());
    }
}
