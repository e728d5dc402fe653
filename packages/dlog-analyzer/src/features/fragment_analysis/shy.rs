//! C4.8 — Shy: the invasion/attack/protection analysis (spec §4.4.8).

use rustc_hash::{FxHashMap, FxHashSet};

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::shared::models::{EdgeKind, NodeRef, PositionId, ProgramGraph, RuleId, TokenId, TokenLocation, VariableId};

use super::{atom_occurrence_tokens_in, variable_position_sets, vars_of_atom_token, FragmentAnalyzer, SHY};

pub struct ShyAnalyzer;

impl FragmentAnalyzer for ShyAnalyzer {
    fn name(&self) -> &'static str {
        SHY
    }

    fn run(&self, graph: &mut ProgramGraph) -> Vec<Diagnostic> {
        seed_invasion(graph);
        propagate_invasion_fixpoint(graph);
        compute_attack_and_protection(graph);

        let mut diagnostics = Vec::new();
        diagnostics.extend(check_s1(graph));
        diagnostics.extend(check_s2(graph));
        diagnostics
    }
}

/// Step 1: a head position is invaded by the existential variables that
/// occupy it.
fn seed_invasion(graph: &mut ProgramGraph) {
    let mut invasions: FxHashMap<PositionId, FxHashSet<VariableId>> = FxHashMap::default();
    graph.for_each_edge(|src, dst, edge| {
        let EdgeKind::VariableAtPosition(attrs) = edge else { return };
        if !attrs.head {
            return;
        }
        let (NodeRef::Variable(var), NodeRef::Position(pos)) = (src, dst) else { return };
        if graph.variable(var).existential {
            invasions.entry(pos).or_default().insert(var);
        }
    });
    for (pos, invaders) in invasions {
        graph.update_position(pos, |p| p.invaded_by = invaders);
    }
}

/// Step 2: a universal body variable whose body positions are *all*
/// invaded propagates the union of those invaders to every head
/// position it reaches, repeated to a fixpoint.
fn propagate_invasion_fixpoint(graph: &mut ProgramGraph) {
    let (body_positions, head_positions) = variable_position_sets(graph);
    let universal: Vec<VariableId> = (0..graph.variables.len()).map(|i| VariableId(i as u32)).filter(|v| !graph.variable(*v).existential).collect();

    let mut changed = true;
    while changed {
        changed = false;
        for var in &universal {
            let Some(bodies) = body_positions.get(var) else { continue };
            if bodies.is_empty() || !bodies.iter().all(|p| !graph.position(*p).invaded_by.is_empty()) {
                continue;
            }
            let invaders: FxHashSet<VariableId> = bodies.iter().flat_map(|p| graph.position(*p).invaded_by.iter().copied()).collect();
            let Some(heads) = head_positions.get(var) else { continue };
            for pos in heads {
                let before = graph.position(*pos).invaded_by.len();
                let merged: FxHashSet<VariableId> = graph.position(*pos).invaded_by.union(&invaders).copied().collect();
                if merged.len() != before {
                    graph.update_position(*pos, |p| p.invaded_by = merged);
                    changed = true;
                }
            }
        }
    }
}

/// Step 3: a body variable `x` is attacked by existential `y` iff every
/// body position of `x` is invaded by `y`; with no such `y`, `x` is
/// protected in its rule.
fn compute_attack_and_protection(graph: &mut ProgramGraph) {
    let (body_positions, _head_positions) = variable_position_sets(graph);
    for i in 0..graph.variables.len() {
        let var = VariableId(i as u32);
        if graph.variable(var).existential {
            continue;
        }
        let Some(positions) = body_positions.get(&var) else { continue };
        if positions.is_empty() {
            continue;
        }
        let mut attackers: Option<FxHashSet<VariableId>> = None;
        for pos in positions {
            let invaders = graph.position(*pos).invaded_by.clone();
            attackers = Some(match attackers {
                None => invaders,
                Some(acc) => acc.intersection(&invaders).copied().collect(),
            });
        }
        let attackers = attackers.unwrap_or_default();
        graph.update_variable(var, |v| {
            v.attacked_by = attackers.clone();
            v.protected = attackers.is_empty();
        });
    }
}

/// S1: a variable occurring in more than one body atom-token must be
/// protected.
fn check_s1(graph: &ProgramGraph) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for i in 0..graph.rules.len() {
        let rule = RuleId(i as u32);
        if !graph.rule(rule).is_rule {
            continue;
        }
        let body_tokens = atom_occurrence_tokens_in(graph, rule, TokenLocation::Body);
        let mut atoms_by_var: FxHashMap<VariableId, FxHashSet<TokenId>> = FxHashMap::default();
        for token in &body_tokens {
            for var in vars_of_atom_token(graph, *token) {
                atoms_by_var.entry(var).or_default().insert(*token);
            }
        }
        for (var, atoms) in atoms_by_var {
            if atoms.len() < 2 || graph.variable(var).protected {
                continue;
            }
            for token in occurrence_tokens_of_variable(graph, var) {
                if graph.token(token).location != TokenLocation::Body {
                    continue;
                }
                diagnostics.push(
                    DiagnosticBuilder::new(DiagnosticKind::ErrAtomNotViolatingShyS1, graph.token(token).lexical.range())
                        .with("variable", graph.variable(var).name.clone())
                        .fragment(SHY)
                        .build(),
                );
            }
        }
    }
    diagnostics
}

/// S2: for each unordered pair of attacked variables in the same rule
/// sharing a common attacker, if both occur in the head and together
/// reach more than one distinct body atom-token, flag all their
/// occurrences.
fn check_s2(graph: &ProgramGraph) -> Vec<Diagnostic> {
    let (_body_positions, head_positions) = variable_position_sets(graph);
    let mut diagnostics = Vec::new();

    let mut attacked_by_rule: FxHashMap<RuleId, Vec<VariableId>> = FxHashMap::default();
    for i in 0..graph.variables.len() {
        let var = VariableId(i as u32);
        if !graph.variable(var).attacked_by.is_empty() {
            attacked_by_rule.entry(graph.variable(var).rule).or_default().push(var);
        }
    }

    for (_rule, vars) in attacked_by_rule {
        for i in 0..vars.len() {
            for j in (i + 1)..vars.len() {
                let (x, y) = (vars[i], vars[j]);
                if graph.variable(x).attacked_by.is_disjoint(&graph.variable(y).attacked_by) {
                    continue;
                }
                let x_in_head = head_positions.get(&x).map(|s| !s.is_empty()).unwrap_or(false);
                let y_in_head = head_positions.get(&y).map(|s| !s.is_empty()).unwrap_or(false);
                if !x_in_head || !y_in_head {
                    continue;
                }
                let rule = graph.variable(x).rule;
                let atoms_x = body_atom_tokens_of_variable(graph, x, rule);
                let atoms_y = body_atom_tokens_of_variable(graph, y, rule);
                let combined: FxHashSet<TokenId> = atoms_x.union(&atoms_y).copied().collect();
                if combined.len() < 2 {
                    continue;
                }
                for var in [x, y] {
                    for token in occurrence_tokens_of_variable(graph, var) {
                        diagnostics.push(
                            DiagnosticBuilder::new(DiagnosticKind::ErrAtomNotViolatingShyS2, graph.token(token).lexical.range())
                                .with("variable", graph.variable(x).name.clone())
                                .with("other", graph.variable(y).name.clone())
                                .fragment(SHY)
                                .build(),
                        );
                    }
                }
            }
        }
    }
    diagnostics
}

fn body_atom_tokens_of_variable(graph: &ProgramGraph, var: VariableId, rule: RuleId) -> FxHashSet<TokenId> {
    atom_occurrence_tokens_in(graph, rule, TokenLocation::Body)
        .into_iter()
        .filter(|t| vars_of_atom_token(graph, *t).contains(&var))
        .collect()
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::base_analysis;
    use crate::features::graph_builder::{ProgramGraphBuilderUseCase, ProgramGraphBuilderUseCaseImpl};

    fn analyze(source: &str) -> Vec<Diagnostic> {
        let mut result = ProgramGraphBuilderUseCaseImpl::new().build_program_graph(source);
        base_analysis::run(&mut result.graph);
        ShyAnalyzer.run(&mut result.graph)
    }

    #[test]
    fn variable_joined_across_two_atoms_with_no_attacker_is_protected() {
        // X is universal and not invaded by any existential, so it's
        // trivially protected even though it joins two atoms.
        let diagnostics = analyze("q(X):-a(X),b(X).");
        assert!(diagnostics.iter().all(|d| d.code != DiagnosticKind::ErrAtomNotViolatingShyS1.code()));
    }

    #[test]
    fn variable_attacked_at_a_shared_position_across_two_occurrences_violates_s1() {
        // Y is existential at node[1] in rule0, so that shared position
        // id is invaded. Rule1 joins two occurrences of `node` on Y,
        // both resolving to the same invaded position, so Y is attacked
        // (not protected) yet occurs in two body atom-tokens.
        let diagnostics = analyze(
            "node(X,Y):-edge(X).\n\
             q(Y):-node(C,Y),node(D,Y).",
        );
        assert!(diagnostics.iter().any(|d| d.code == DiagnosticKind::ErrAtomNotViolatingShyS1.code()));
    }
}
