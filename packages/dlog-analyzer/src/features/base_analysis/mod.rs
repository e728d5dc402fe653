//! C3 — Base Analyzer.
//!
//! Five ordered steps, each reading what the previous wrote: existential
//! variables, affected-position seeding, affected-position fixpoint
//! propagation, undeclared condition variables, token enrichment. Runs
//! exactly once, right after the program graph is built, and seeds the
//! attributes every fragment analyzer (C4) and several semantic
//! analyzers (C5) depend on.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::instrument;

use crate::shared::models::{EdgeKind, NodeRef, PositionId, ProgramGraph, TokenLocation, VariableId};

/// Runs the five base-analysis steps against a freshly built graph.
#[instrument(skip_all)]
pub fn run(graph: &mut ProgramGraph) {
    mark_existential_variables(graph);
    seed_affected_positions(graph);
    propagate_affected_fixpoint(graph);
    mark_undeclared_condition_variables(graph);
    enrich_tokens(graph);
}

/// Step 1: a variable is existential iff it occupies a head position and
/// never occupies a body position in the same rule.
fn mark_existential_variables(graph: &mut ProgramGraph) {
    let mut in_head: FxHashSet<VariableId> = FxHashSet::default();
    let mut in_body: FxHashSet<VariableId> = FxHashSet::default();

    graph.for_each_edge(|src, _dst, edge| {
        let EdgeKind::VariableAtPosition(attrs) = edge else { return };
        let NodeRef::Variable(var) = src else { return };
        if attrs.head {
            in_head.insert(var);
        } else {
            in_body.insert(var);
        }
    });

    let existential: Vec<VariableId> = in_head.difference(&in_body).copied().collect();
    for var in &existential {
        graph.update_variable(*var, |v| v.existential = true);
    }

    // Mark each atom-token hosting at least one existential variable.
    let existential_set: FxHashSet<VariableId> = existential.into_iter().collect();
    let hosting = graph.filter_edges(|src, dst, edge| {
        matches!(edge, EdgeKind::VariableAtAtomToken(_)) && matches!(src, NodeRef::Variable(v) if existential_set.contains(&v)) && matches!(dst, NodeRef::Token(_))
    });
    let mut names_by_token: FxHashMap<crate::shared::models::TokenId, Vec<String>> = FxHashMap::default();
    for (src, dst, _) in hosting {
        let (NodeRef::Variable(var), NodeRef::Token(token)) = (src, dst) else { continue };
        names_by_token.entry(token).or_default().push(graph.variable(var).name.clone());
    }
    for (token, mut names) in names_by_token {
        names.sort();
        names.dedup();
        graph.update_token(token, |t| t.existential_variables = names);
    }
}

/// Step 2: every position an existential variable reaches becomes affected.
fn seed_affected_positions(graph: &mut ProgramGraph) {
    let mut affected: FxHashSet<PositionId> = FxHashSet::default();
    graph.for_each_edge(|src, dst, edge| {
        let EdgeKind::VariableAtPosition(_) = edge else { return };
        let (NodeRef::Variable(var), NodeRef::Position(pos)) = (src, dst) else { return };
        if graph.variable(var).existential {
            affected.insert(pos);
        }
    });
    for pos in affected {
        graph.update_position(pos, |p| p.affected = true);
    }
}

/// Step 3: fixpoint propagation via worklist — a universally quantified
/// variable whose body positions are all affected (and at least one
/// exists) makes every head position it reaches affected too.
fn propagate_affected_fixpoint(graph: &mut ProgramGraph) {
    let mut body_positions: FxHashMap<VariableId, Vec<PositionId>> = FxHashMap::default();
    let mut head_positions: FxHashMap<VariableId, Vec<PositionId>> = FxHashMap::default();
    graph.for_each_edge(|src, dst, edge| {
        let EdgeKind::VariableAtPosition(attrs) = edge else { return };
        let (NodeRef::Variable(var), NodeRef::Position(pos)) = (src, dst) else { return };
        if attrs.head {
            head_positions.entry(var).or_default().push(pos);
        } else {
            body_positions.entry(var).or_default().push(pos);
        }
    });

    let universal: Vec<VariableId> = (0..graph.variables.len())
        .map(|i| VariableId(i as u32))
        .filter(|v| !graph.variable(*v).existential)
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for var in &universal {
            let Some(positions) = body_positions.get(var) else { continue };
            if positions.is_empty() {
                continue;
            }
            if !positions.iter().all(|p| graph.position(*p).affected) {
                continue;
            }
            let Some(targets) = head_positions.get(var) else { continue };
            for pos in targets {
                if !graph.position(*pos).affected {
                    graph.update_position(*pos, |p| p.affected = true);
                    changed = true;
                }
            }
        }
    }
}

/// Step 4: a condition variable is undeclared unless it occurs in a
/// non-negated body atom position, or is the LHS of an equality condition.
fn mark_undeclared_condition_variables(graph: &mut ProgramGraph) {
    let mut positively_bound: FxHashSet<VariableId> = FxHashSet::default();
    graph.for_each_edge(|src, dst, edge| {
        let EdgeKind::VariableAtPosition(attrs) = edge else { return };
        let NodeRef::Variable(var) = src else { return };
        let _ = dst;
        if !attrs.negated {
            positively_bound.insert(var);
        }
    });

    let mut equality_lhs: FxHashSet<VariableId> = FxHashSet::default();
    graph.for_each_edge(|src, _dst, edge| {
        let EdgeKind::VariableAtCondition {
            left_hand_side_of_an_eq_condition: true,
        } = edge
        else {
            return;
        };
        let NodeRef::Variable(var) = src else { return };
        equality_lhs.insert(var);
    });

    let mut condition_vars: FxHashSet<VariableId> = FxHashSet::default();
    graph.for_each_edge(|src, _dst, edge| {
        if !matches!(edge, EdgeKind::VariableAtCondition { .. }) {
            return;
        }
        let NodeRef::Variable(var) = src else { return };
        condition_vars.insert(var);
    });

    for var in condition_vars {
        if !positively_bound.contains(&var) && !equality_lhs.contains(&var) {
            graph.update_variable(var, |v| v.undeclared = true);
        }
    }
}

/// Step 5: tag the `EXISTENTIAL` modifier on every token occupying an
/// affected position (spec §4.7 step 3) — a position is the `(atom name,
/// term index)` pair a token's own `TOKEN_AT_POSITION` edge resolves to,
/// not every token of an atom that happens to have some affected
/// position somewhere in the program.
fn enrich_tokens(graph: &mut ProgramGraph) {
    let mut token_position: FxHashMap<crate::shared::models::TokenId, crate::shared::models::PositionId> = FxHashMap::default();
    graph.for_each_edge(|src, dst, edge| {
        if !matches!(edge, EdgeKind::TokenAtPosition) {
            return;
        }
        let (NodeRef::Token(token), NodeRef::Position(pos)) = (src, dst) else { return };
        token_position.insert(token, pos);
    });

    for i in 0..graph.tokens.len() {
        let id = crate::shared::models::TokenId(i as u32);
        let token = graph.token(id);
        let is_marked_null = matches!(token.location, TokenLocation::Head | TokenLocation::Body)
            && token_position.get(&id).map(|pos| graph.position(*pos).affected).unwrap_or(false);
        if is_marked_null {
            graph.update_token(id, |t| {
                if !t.lexical.modifiers.contains(&crate::shared::models::TokenModifier::Existential) {
                    t.lexical.modifiers.push(crate::shared::models::TokenModifier::Existential);
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::graph_builder::ProgramGraphBuilderUseCase;
    use crate::features::graph_builder::ProgramGraphBuilderUseCaseImpl;

    fn build_and_run(source: &str) -> ProgramGraph {
        let mut result = ProgramGraphBuilderUseCaseImpl::new().build_program_graph(source);
        run(&mut result.graph);
        result.graph
    }

    #[test]
    fn head_only_variable_is_existential() {
        let graph = build_and_run("node(X,Y):-edge(X).");
        let y = graph.variable_id("Y", crate::shared::models::RuleId(0)).expect("Y recorded");
        assert!(graph.variable(y).existential);
        let x = graph.variable_id("X", crate::shared::models::RuleId(0)).expect("X recorded");
        assert!(!graph.variable(x).existential);
    }

    #[test]
    fn existential_seeds_affected_head_position() {
        let graph = build_and_run("node(X,Y):-edge(X).");
        let pos = graph.positions.iter().find(|p| p.atom_name == "node" && p.index == 1).expect("position exists");
        assert!(pos.affected);
    }

    #[test]
    fn affected_propagates_through_universal_variable() {
        let graph = build_and_run("a(X,Y):-b(X).\nc(Y,Z):-a(X,Y).");
        let c_pos = graph.positions.iter().find(|p| p.atom_name == "c" && p.index == 0).expect("position exists");
        assert!(c_pos.affected);
    }

    #[test]
    fn condition_variable_not_bound_in_body_is_undeclared() {
        let graph = build_and_run("r(X):-s(X),Y=1.");
        let rule = crate::shared::models::RuleId(0);
        let y = graph.variable_id("Y", rule).expect("Y recorded");
        assert!(!graph.variable(y).undeclared);
    }

    #[test]
    fn rhs_condition_variable_with_no_body_binding_is_undeclared() {
        let graph = build_and_run("r(X):-s(X),Y=Z.");
        let rule = crate::shared::models::RuleId(0);
        let z = graph.variable_id("Z", rule).expect("Z recorded");
        assert!(graph.variable(z).undeclared);
        let y = graph.variable_id("Y", rule).expect("Y recorded");
        assert!(!graph.variable(y).undeclared);
    }

    #[test]
    fn existential_modifier_only_tags_the_affected_positions_own_token() {
        let graph = build_and_run("node(X,Y):-edge(X).");
        let is_existential = |text: &str, nth: usize| {
            graph
                .tokens
                .iter()
                .filter(|t| t.lexical.text == text)
                .nth(nth)
                .map(|t| t.lexical.modifiers.contains(&crate::shared::models::TokenModifier::Existential))
                .expect("token exists")
        };
        // Y at node's position 1 is affected and existential.
        assert!(is_existential("Y", 0));
        // X at node's position 0 is not affected.
        assert!(!is_existential("X", 0));
        // The atom-name token itself (term_index None) is not a position.
        assert!(!is_existential("node", 0));
    }
}
