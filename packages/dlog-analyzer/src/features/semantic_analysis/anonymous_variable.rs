//! C5 — a universally quantified variable that appears in exactly one
//! body atom-token, never in the head, never in a condition, never in
//! an EGD and never as an aggregation contributor has no effect on the
//! rule: it's a stand-in for a wildcard and should be written as one.

use rustc_hash::FxHashSet;

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind, Tag};
use crate::features::fragment_analysis::{atom_occurrence_tokens_in, variable_position_sets, vars_of_atom_token};
use crate::features::graph_builder::SymbolTables;
use crate::shared::models::{EdgeKind, NodeRef, ProgramGraph, RuleId, TokenLocation, VariableId};

use super::{occurrence_tokens_of_variable, SemanticAnalyzer};

pub struct AnonymousVariableAnalyzer;

impl SemanticAnalyzer for AnonymousVariableAnalyzer {
    fn name(&self) -> &'static str {
        "AnonymousVariable"
    }

    fn run(&self, graph: &mut ProgramGraph, _tables: &SymbolTables) -> Vec<Diagnostic> {
        let (_body_positions, head_positions) = variable_position_sets(graph);

        let mut body_atoms_by_var: std::collections::HashMap<VariableId, FxHashSet<_>> = std::collections::HashMap::new();
        for i in 0..graph.rules.len() {
            let rule = RuleId(i as u32);
            for token in atom_occurrence_tokens_in(graph, rule, TokenLocation::Body) {
                for var in vars_of_atom_token(graph, token) {
                    body_atoms_by_var.entry(var).or_default().insert(token);
                }
            }
        }

        let has_condition_use: FxHashSet<VariableId> = graph
            .filter_edges(|src, _dst, e| matches!(e, EdgeKind::VariableAtCondition { .. }) && matches!(src, NodeRef::Variable(_)))
            .into_iter()
            .filter_map(|(src, _, _)| match src {
                NodeRef::Variable(v) => Some(v),
                _ => None,
            })
            .collect();
        let has_egd_use: FxHashSet<VariableId> = graph
            .filter_edges(|src, _dst, e| matches!(e, EdgeKind::VariableAtEgd { .. }) && matches!(src, NodeRef::Variable(_)))
            .into_iter()
            .filter_map(|(src, _, _)| match src {
                NodeRef::Variable(v) => Some(v),
                _ => None,
            })
            .collect();
        let has_contributor_use: FxHashSet<VariableId> = graph
            .filter_edges(|src, _dst, e| matches!(e, EdgeKind::ContributorOfAggregation { .. }) && matches!(src, NodeRef::Variable(_)))
            .into_iter()
            .filter_map(|(src, _, _)| match src {
                NodeRef::Variable(v) => Some(v),
                _ => None,
            })
            .collect();

        let mut diagnostics = Vec::new();
        for (var, atoms) in &body_atoms_by_var {
            if atoms.len() != 1 || graph.variable(*var).existential {
                continue;
            }
            if head_positions.get(var).map(|s| !s.is_empty()).unwrap_or(false) {
                continue;
            }
            if has_condition_use.contains(var) || has_egd_use.contains(var) || has_contributor_use.contains(var) {
                continue;
            }
            for token in occurrence_tokens_of_variable(graph, *var) {
                if graph.token(token).location != TokenLocation::Body {
                    continue;
                }
                diagnostics.push(
                    DiagnosticBuilder::new(DiagnosticKind::AnonymousVariable, graph.token(token).lexical.range())
                        .with("variable", graph.variable(*var).name.clone())
                        .tag(Tag::Unused)
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
        AnonymousVariableAnalyzer.run(&mut result.graph, &result.tables)
    }

    #[test]
    fn single_use_body_variable_not_in_head_is_anonymous() {
        let diagnostics = analyze("p(X):-a(X,Y).");
        assert!(diagnostics.iter().any(|d| d.code == DiagnosticKind::AnonymousVariable.code()));
    }

    #[test]
    fn variable_reused_in_head_is_not_anonymous() {
        let diagnostics = analyze("p(X,Y):-a(X,Y).");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn variable_reused_in_two_body_atoms_is_not_anonymous() {
        let diagnostics = analyze("p(X):-a(X,Y),b(Y).");
        assert!(diagnostics.iter().all(|d| d.code != DiagnosticKind::AnonymousVariable.code()));
    }
}
