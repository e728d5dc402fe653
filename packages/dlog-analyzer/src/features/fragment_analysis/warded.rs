//! C4.7 — Warded: the largest violation budget in the system (spec
//! §4.4.7). Eight steps: dangerous variables, ward-breaking, tainted
//! position seeding, tainted fixpoint propagation, tainted join, tainted
//! filter, literals in tainted positions, constants in EGD tainted
//! positions.
//!
//! Must run before Weakly-Guarded / Weakly-Frontier-Guarded (spec §5):
//! this is the analyzer that marks [`crate::shared::models::VariableNode::dangerous`]
//! on the graph; the weak guard fragments just read that flag back.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::shared::models::{EdgeKind, NodeRef, PositionId, ProgramGraph, RuleId, TokenId, TokenLocation, VariableId};

use super::{
    atom_occurrence_tokens_in, body_variables_by_rule, dangerous_variables_by_rule, rules_with_egd, variable_position_sets, vars_of_atom_token, FragmentAnalyzer,
    WARDED,
};

pub struct WardedAnalyzer;

impl FragmentAnalyzer for WardedAnalyzer {
    fn name(&self) -> &'static str {
        WARDED
    }

    fn run(&self, graph: &mut ProgramGraph) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        let (body_positions, head_positions) = variable_position_sets(graph);
        mark_harmful_and_dangerous(graph, &body_positions, &head_positions);

        diagnostics.extend(detect_ward_breaking(graph, &body_positions));

        seed_tainted_positions(graph);
        propagate_tainted_fixpoint(graph);

        diagnostics.extend(detect_tainted_join(graph));
        diagnostics.extend(detect_tainted_filter(graph));
        diagnostics.extend(detect_literals_in_tainted_positions(graph));
        diagnostics.extend(detect_constants_in_egd_tainted_positions(graph));

        diagnostics
    }
}

/// Harmful: universally quantified, every body position affected, at
/// least one body position (spec glossary). Dangerous: harmful and the
/// variable also occurs in the head (spec §4.4.6). Marks both flags on
/// the variable nodes so later fragments (and P4) can read them back.
fn mark_harmful_and_dangerous(
    graph: &mut ProgramGraph,
    body_positions: &FxHashMap<VariableId, FxHashSet<PositionId>>,
    head_positions: &FxHashMap<VariableId, FxHashSet<PositionId>>,
) {
    for (var, positions) in body_positions {
        if graph.variable(*var).existential || positions.is_empty() {
            continue;
        }
        if !positions.iter().all(|p| graph.position(*p).affected) {
            continue;
        }
        graph.update_variable(*var, |v| v.harmful = true);
    }
    let dangerous = dangerous_variables_by_rule(graph, body_positions, head_positions);
    for vars in dangerous.values() {
        for var in vars {
            graph.update_variable(*var, |v| v.dangerous = true);
        }
    }
}

/// Groups dangerous variables, already marked on the graph by
/// [`mark_harmful_and_dangerous`], by rule.
pub(crate) fn dangerous_variables_from_flags(graph: &ProgramGraph) -> FxHashMap<RuleId, FxHashSet<VariableId>> {
    let mut out: FxHashMap<RuleId, FxHashSet<VariableId>> = FxHashMap::default();
    for i in 0..graph.variables.len() {
        let id = VariableId(i as u32);
        let v = graph.variable(id);
        if v.dangerous {
            out.entry(v.rule).or_default().insert(id);
        }
    }
    out
}

/// Step 2: group dangerous variables by the body atom-token they
/// occupy; a rule with more than one such atom-token unwards every
/// dangerous variable in any of them.
fn detect_ward_breaking(graph: &mut ProgramGraph, body_positions: &FxHashMap<VariableId, FxHashSet<PositionId>>) -> Vec<Diagnostic> {
    let _ = body_positions;
    let mut diagnostics = Vec::new();
    for i in 0..graph.rules.len() {
        let rule = RuleId(i as u32);
        if !graph.rule(rule).is_rule {
            continue;
        }
        let body_tokens = atom_occurrence_tokens_in(graph, rule, TokenLocation::Body);
        let mut dangerous_atom_tokens: FxHashSet<TokenId> = FxHashSet::default();
        let mut unwarded_vars: FxHashSet<VariableId> = FxHashSet::default();
        for token in &body_tokens {
            let vars = vars_of_atom_token(graph, *token);
            if vars.iter().any(|v| graph.variable(*v).dangerous) {
                dangerous_atom_tokens.insert(*token);
            }
        }
        if dangerous_atom_tokens.len() <= 1 {
            continue;
        }
        for token in &dangerous_atom_tokens {
            for var in vars_of_atom_token(graph, *token) {
                if graph.variable(var).dangerous {
                    unwarded_vars.insert(var);
                }
            }
        }
        for var in &unwarded_vars {
            for token in occurrence_tokens_of_variable(graph, *var) {
                if graph.token(token).location != TokenLocation::Body {
                    continue;
                }
                diagnostics.push(
                    DiagnosticBuilder::new(DiagnosticKind::ErrVariableIsUnwarded, graph.token(token).lexical.range())
                        .with("variable", graph.variable(*var).name.clone())
                        .fragment(WARDED)
                        .build(),
                );
            }
        }
    }
    diagnostics
}

/// Step 3: seed tainted positions from variables that occur both in an
/// EGD and in a body position (the "variable is harmful [to EGDs]"
/// variant named in spec §4.4.7).
fn seed_tainted_positions(graph: &mut ProgramGraph) {
    let mut egd_vars_by_name_rule: FxHashSet<(String, RuleId)> = FxHashSet::default();
    graph.for_each_edge(|src, _dst, edge| {
        if !matches!(edge, EdgeKind::VariableAtEgd { .. }) {
            return;
        }
        let NodeRef::Variable(var) = src else { return };
        let v = graph.variable(var);
        egd_vars_by_name_rule.insert((v.name.clone(), v.rule));
    });

    let mut tainted: FxHashSet<PositionId> = FxHashSet::default();
    graph.for_each_edge(|src, dst, edge| {
        let EdgeKind::VariableAtPosition(attrs) = edge else { return };
        if attrs.head {
            return;
        }
        let (NodeRef::Variable(var), NodeRef::Position(pos)) = (src, dst) else { return };
        let v = graph.variable(var);
        if egd_vars_by_name_rule.contains(&(v.name.clone(), v.rule)) {
            tainted.insert(pos);
        }
    });
    for pos in tainted {
        graph.update_position(pos, |p| p.tainted = true);
    }
}

/// Step 4: fixpoint — a variable whose head occurrences include a
/// tainted position propagates taintedness backward to all its body
/// positions; a variable whose body occurrences include a tainted
/// position propagates forward to all its head positions. EDB positions
/// never accept taintedness.
fn propagate_tainted_fixpoint(graph: &mut ProgramGraph) {
    let (body_positions, head_positions) = variable_position_sets(graph);
    let edb_positions: FxHashSet<PositionId> = (0..graph.positions.len())
        .map(|i| PositionId(i as u32))
        .filter(|p| graph.atom_id(&graph.position(*p).atom_name).map(|a| graph.atom(a).is_edb).unwrap_or(false))
        .collect();

    let all_vars: Vec<VariableId> = (0..graph.variables.len()).map(|i| VariableId(i as u32)).collect();

    let mut changed = true;
    while changed {
        changed = false;
        for var in &all_vars {
            let heads = head_positions.get(var).cloned().unwrap_or_default();
            let bodies = body_positions.get(var).cloned().unwrap_or_default();

            let head_tainted = heads.iter().any(|p| graph.position(*p).tainted);
            if head_tainted {
                for pos in &bodies {
                    if edb_positions.contains(pos) || graph.position(*pos).tainted {
                        continue;
                    }
                    graph.update_position(*pos, |p| p.tainted = true);
                    changed = true;
                }
            }

            let body_tainted = bodies.iter().any(|p| graph.position(*p).tainted);
            if body_tainted {
                for pos in &heads {
                    if edb_positions.contains(pos) || graph.position(*pos).tainted {
                        continue;
                    }
                    graph.update_position(*pos, |p| p.tainted = true);
                    changed = true;
                }
            }
        }
    }
}

/// Step 5: in a non-EGD rule, a tainted variable joined across more than
/// one body atom-token is flagged on every hosting token.
fn detect_tainted_join(graph: &mut ProgramGraph) -> Vec<Diagnostic> {
    let egd_rules = rules_with_egd(graph);
    let mut diagnostics = Vec::new();
    for i in 0..graph.rules.len() {
        let rule = RuleId(i as u32);
        if !graph.rule(rule).is_rule || egd_rules.contains(&rule) {
            continue;
        }
        let body_tokens = atom_occurrence_tokens_in(graph, rule, TokenLocation::Body);
        let mut hosts_by_var: FxHashMap<VariableId, Vec<TokenId>> = FxHashMap::default();
        for token in &body_tokens {
            for var in vars_of_atom_token(graph, *token) {
                if is_tainted_variable(graph, var) {
                    hosts_by_var.entry(var).or_default().push(*token);
                }
            }
        }
        for (var, tokens) in hosts_by_var {
            if tokens.len() < 2 {
                continue;
            }
            for token in tokens {
                graph.update_token(token, |t| t.used_in_tainted_join = true);
                diagnostics.push(
                    DiagnosticBuilder::new(DiagnosticKind::ErrVariableIsEgdHarmful, graph.token(token).lexical.range())
                        .with("variable", graph.variable(var).name.clone())
                        .fragment(WARDED)
                        .build(),
                );
            }
        }
    }
    diagnostics
}

fn is_tainted_variable(graph: &ProgramGraph, var: VariableId) -> bool {
    graph
        .out_edges(NodeRef::Variable(var), |e| matches!(e, EdgeKind::VariableAtPosition(_)))
        .into_iter()
        .any(|(dst, _)| matches!(dst, NodeRef::Position(p) if graph.position(p).tainted))
}

/// Step 6: a tainted variable used in any condition is flagged at every
/// occurrence.
fn detect_tainted_filter(graph: &mut ProgramGraph) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let condition_vars = graph.filter_edges(|src, _dst, edge| matches!(edge, EdgeKind::VariableAtCondition { .. }) && matches!(src, NodeRef::Variable(_)));
    for (src, _dst, _) in condition_vars {
        let NodeRef::Variable(var) = src else { continue };
        if !is_tainted_variable(graph, var) {
            continue;
        }
        for token in occurrence_tokens_of_variable(graph, var) {
            graph.update_token(token, |t| t.used_in_tainted_filter = true);
            diagnostics.push(
                DiagnosticBuilder::new(DiagnosticKind::ErrVariableInTaintedPositionUsedInFilter, graph.token(token).lexical.range())
                    .with("variable", graph.variable(var).name.clone())
                    .fragment(WARDED)
                    .build(),
            );
        }
    }
    diagnostics
}

fn occurrence_tokens_of_variable(graph: &ProgramGraph, var: VariableId) -> Vec<TokenId> {
    graph
        .out_edges(NodeRef::Variable(var), |e| matches!(e, EdgeKind::TokenOf))
        .into_iter()
        .filter_map(|(dst, _)| match dst {
            NodeRef::Token(t) => Some(t),
            _ => None,
        })
        .collect()
}

/// Step 7: literals occupying a tainted position.
fn detect_literals_in_tainted_positions(graph: &mut ProgramGraph) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let literal_positions = graph.filter_edges(|src, dst, edge| matches!(edge, EdgeKind::TokenAtPosition) && matches!((src, dst), (NodeRef::Token(_), NodeRef::Position(_))));
    for (src, dst, _) in literal_positions {
        let (NodeRef::Token(token), NodeRef::Position(pos)) = (src, dst) else { continue };
        if !graph.position(pos).tainted {
            continue;
        }
        graph.update_token(token, |t| t.is_literal_used_in_tainted_positions = true);
        diagnostics.push(
            DiagnosticBuilder::new(DiagnosticKind::ErrLiteralInTaintedPosition, graph.token(token).lexical.range())
                .with("literal", graph.token(token).lexical.text.clone())
                .fragment(WARDED)
                .build(),
        );
    }
    diagnostics
}

/// Step 8: literal tokens in a tainted position that belong to an
/// EGD-rule additionally raise `ERR_CONSTANT_USED_IN_TAINTED_POSITION`.
fn detect_constants_in_egd_tainted_positions(graph: &ProgramGraph) -> Vec<Diagnostic> {
    let egd_rules = rules_with_egd(graph);
    let mut diagnostics = Vec::new();
    let literal_positions = graph.filter_edges(|src, dst, edge| matches!(edge, EdgeKind::TokenAtPosition) && matches!((src, dst), (NodeRef::Token(_), NodeRef::Position(_))));
    for (src, dst, _) in literal_positions {
        let (NodeRef::Token(token), NodeRef::Position(pos)) = (src, dst) else { continue };
        if !graph.position(pos).tainted || !egd_rules.contains(&graph.token(token).rule) {
            continue;
        }
        diagnostics.push(
            DiagnosticBuilder::new(DiagnosticKind::ErrConstantUsedInTaintedPosition, graph.token(token).lexical.range())
                .with("literal", graph.token(token).lexical.text.clone())
                .fragment(WARDED)
                .build(),
        );
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::base_analysis;
    use crate::features::graph_builder::{ProgramGraphBuilderUseCase, ProgramGraphBuilderUseCaseImpl};

    fn analyze(source: &str) -> (ProgramGraph, Vec<Diagnostic>) {
        let mut result = ProgramGraphBuilderUseCaseImpl::new().build_program_graph(source);
        base_analysis::run(&mut result.graph);
        let diagnostics = WardedAnalyzer.run(&mut result.graph);
        (result.graph, diagnostics)
    }

    #[test]
    fn egd_join_variable_is_tainted_in_downstream_rule() {
        let (_, diagnostics) = analyze(
            "parent_db(\"a\",\"b\").\n\
             person(P):-parent_db(P,_X).\n\
             parent_of(X,Y):-person(Y).\n\
             Parent1=Parent2:-parent_of(Parent1,C1),parent_of(Parent2,C2),sibling_db(C1,C2).",
        );
        assert!(diagnostics.iter().any(|d| d.code == DiagnosticKind::ErrVariableIsEgdHarmful.code()));
    }

    #[test]
    fn dangerous_variables_split_across_two_atoms_break_the_ward() {
        let (_, diagnostics) = analyze(
            "node(X,Y):-edge(X).\n\
             node2(X,Z):-edge2(X).\n\
             q(Y,Z):-node(A,Y),node2(B,Z),link(A,B).",
        );
        assert!(diagnostics.iter().any(|d| d.code == DiagnosticKind::ErrVariableIsUnwarded.code()));
    }

    #[test]
    fn rule_with_no_dangerous_variables_is_clean() {
        let (_, diagnostics) = analyze("p(X,Y):-a(X,Y).");
        assert!(diagnostics.iter().all(|d| d.code != DiagnosticKind::ErrVariableIsUnwarded.code()));
    }
}
