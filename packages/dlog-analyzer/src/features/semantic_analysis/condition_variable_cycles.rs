//! C5 — a chain of equality conditions (`X=Y, Y=Z, Z=X`) forms a cycle
//! of variables that can never all be distinct bindings of one another
//! without collapsing to a single value; flag every variable caught in
//! such a cycle.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::features::graph_builder::SymbolTables;
use crate::shared::models::{ProgramGraph, VariableId};

use super::{occurrence_tokens_of_variable, SemanticAnalyzer};

pub struct ConditionVariableCyclesAnalyzer;

impl SemanticAnalyzer for ConditionVariableCyclesAnalyzer {
    fn name(&self) -> &'static str {
        "ConditionVariableCycles"
    }

    fn run(&self, graph: &mut ProgramGraph, _tables: &SymbolTables) -> Vec<Diagnostic> {
        let mut condition_graph: DiGraph<VariableId, ()> = DiGraph::new();
        let mut node_of: FxHashMap<VariableId, NodeIndex> = FxHashMap::default();
        let mut node_for = |var: VariableId, g: &mut DiGraph<VariableId, ()>, map: &mut FxHashMap<VariableId, NodeIndex>| -> NodeIndex {
            *map.entry(var).or_insert_with(|| g.add_node(var))
        };

        for i in 0..graph.conditions.len() {
            let condition = crate::shared::models::ConditionId(i as u32);
            if !graph.condition(condition).equality {
                continue;
            }
            let vars = condition_variables(graph, condition);
            let Some(lhs) = vars.0 else { continue };
            let Some(rhs) = vars.1 else { continue };
            let a = node_for(lhs, &mut condition_graph, &mut node_of);
            let b = node_for(rhs, &mut condition_graph, &mut node_of);
            condition_graph.add_edge(a, b, ());
        }

        let mut cyclic: Vec<VariableId> = Vec::new();
        for component in tarjan_scc(&condition_graph) {
            if component.len() > 1 {
                cyclic.extend(component.iter().map(|idx| condition_graph[*idx]));
            } else if let [idx] = component[..] {
                if condition_graph.contains_edge(idx, idx) {
                    cyclic.push(condition_graph[idx]);
                }
            }
        }
        if cyclic.is_empty() {
            return Vec::new();
        }

        let names: Vec<String> = cyclic.iter().map(|v| graph.variable(*v).name.clone()).collect();
        let cycle_text = names.join(", ");

        let mut diagnostics = Vec::new();
        for var in &cyclic {
            for token in occurrence_tokens_of_variable(graph, *var) {
                diagnostics.push(
                    DiagnosticBuilder::new(DiagnosticKind::ErrCycleInConditionVariables, graph.token(token).lexical.range())
                        .with("cycle", cycle_text.clone())
                        .build(),
                );
            }
        }
        diagnostics
    }
}

/// `(lhs_var, rhs_var)` of an equality condition, `None` where a side is
/// a literal rather than a variable.
fn condition_variables(graph: &ProgramGraph, condition: crate::shared::models::ConditionId) -> (Option<VariableId>, Option<VariableId>) {
    use crate::shared::models::{EdgeKind, NodeRef};

    let mut lhs = None;
    let mut rhs = None;
    graph.for_each_edge(|src, dst, edge| {
        let EdgeKind::VariableAtCondition {
            left_hand_side_of_an_eq_condition,
        } = edge
        else {
            return;
        };
        let (NodeRef::Variable(var), NodeRef::Condition(c)) = (src, dst) else { return };
        if c != condition {
            return;
        }
        if *left_hand_side_of_an_eq_condition {
            lhs = Some(var);
        } else {
            rhs = Some(var);
        }
    });
    (lhs, rhs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::graph_builder::{ProgramGraphBuilderUseCase, ProgramGraphBuilderUseCaseImpl};

    fn analyze(source: &str) -> Vec<Diagnostic> {
        let mut result = ProgramGraphBuilderUseCaseImpl::new().build_program_graph(source);
        ConditionVariableCyclesAnalyzer.run(&mut result.graph, &result.tables)
    }

    #[test]
    fn three_variable_equality_cycle_is_flagged() {
        let diagnostics = analyze("p(X):-a(X,Y,Z),X=Y,Y=Z,Z=X.");
        assert!(diagnostics.iter().any(|d| d.code == DiagnosticKind::ErrCycleInConditionVariables.code()));
    }

    #[test]
    fn acyclic_equality_chain_is_fine() {
        let diagnostics = analyze("p(X):-a(X,Y,Z),X=Y,Y=Z.");
        assert!(diagnostics.is_empty());
    }
}
