//! C4 — Fragment Analyzers.
//!
//! Nine decidable-fragment checks, one module each, sharing the
//! [`FragmentAnalyzer`] trait and a handful of graph-traversal helpers.
//! [`run_all`] composes them in the fixed order of spec §5 and returns
//! every diagnostic; the caller (C8) is responsible for filtering by
//! target fragment.

mod afrati_linear;
mod frontier_guarded;
mod guarded;
mod linear;
mod plain_datalog;
mod shy;
mod warded;
mod weakly_frontier_guarded;
mod weakly_guarded;

pub use afrati_linear::AfratiLinearAnalyzer;
pub use frontier_guarded::FrontierGuardedAnalyzer;
pub use guarded::GuardedAnalyzer;
pub use linear::LinearAnalyzer;
pub use plain_datalog::PlainDatalogAnalyzer;
pub use shy::ShyAnalyzer;
pub use warded::WardedAnalyzer;
pub use weakly_frontier_guarded::WeaklyFrontierGuardedAnalyzer;
pub use weakly_guarded::WeaklyGuardedAnalyzer;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::features::diagnostics::Diagnostic;
use crate::shared::models::{EdgeKind, NodeRef, PositionId, ProgramGraph, RuleId, TokenId, TokenLocation, TokenNode, VariableId};

pub const PLAIN_DATALOG: &str = "Plain Datalog";
pub const LINEAR: &str = "Linear";
pub const AFRATI_LINEAR: &str = "Afrati Linear";
pub const GUARDED: &str = "Guarded";
pub const FRONTIER_GUARDED: &str = "Frontier Guarded";
pub const WEAKLY_GUARDED: &str = "Weakly Guarded";
pub const WEAKLY_FRONTIER_GUARDED: &str = "Weakly Frontier Guarded";
pub const WARDED: &str = "Warded";
pub const SHY: &str = "Shy";

pub trait FragmentAnalyzer {
    fn name(&self) -> &'static str;
    fn run(&self, graph: &mut ProgramGraph) -> Vec<Diagnostic>;
}

/// Runs all nine fragment analyzers in spec §4.4's order and returns
/// every diagnostic they raised, unfiltered. Order follows spec §5
/// exactly: Warded must precede the weak-guard variants because they
/// read the `dangerous` flag Warded marks on variable nodes.
pub fn run_all(graph: &mut ProgramGraph) -> Vec<Diagnostic> {
    let analyzers: Vec<Box<dyn FragmentAnalyzer>> = vec![
        Box::new(PlainDatalogAnalyzer),
        Box::new(LinearAnalyzer),
        Box::new(AfratiLinearAnalyzer),
        Box::new(WardedAnalyzer),
        Box::new(GuardedAnalyzer),
        Box::new(WeaklyGuardedAnalyzer),
        Box::new(FrontierGuardedAnalyzer),
        Box::new(WeaklyFrontierGuardedAnalyzer),
        Box::new(ShyAnalyzer),
    ];
    let mut diagnostics = Vec::new();
    for analyzer in &analyzers {
        diagnostics.extend(analyzer.run(graph));
    }
    diagnostics
}

// ---- shared traversal helpers -------------------------------------------------

/// True for a token that is an atom's own name occurrence (as opposed to
/// a variable- or literal-argument token inside that atom's call).
pub(crate) fn is_atom_occurrence_token(t: &TokenNode) -> bool {
    t.atom.is_some() && t.term_index.is_none() && !t.is_literal
}

pub(crate) fn atom_occurrence_tokens_in(graph: &ProgramGraph, rule: RuleId, location: TokenLocation) -> Vec<TokenId> {
    (0..graph.tokens.len())
        .map(|i| TokenId(i as u32))
        .filter(|id| {
            let t = graph.token(*id);
            t.rule == rule && t.location == location && is_atom_occurrence_token(t)
        })
        .collect()
}

/// Variables occurring as arguments of a given atom-occurrence token.
pub(crate) fn vars_of_atom_token(graph: &ProgramGraph, token: TokenId) -> FxHashSet<VariableId> {
    graph
        .in_edges(NodeRef::Token(token), |e| matches!(e, EdgeKind::VariableAtAtomToken(_)))
        .into_iter()
        .filter_map(|(src, _)| match src {
            NodeRef::Variable(v) => Some(v),
            _ => None,
        })
        .collect()
}

/// The variable a token denotes, if it denotes one at all (as opposed to
/// an atom, EGD, condition or aggregation).
pub(crate) fn token_variable(graph: &ProgramGraph, token: TokenId) -> Option<VariableId> {
    graph
        .out_edges(NodeRef::Token(token), |e| matches!(e, EdgeKind::TokenOf))
        .into_iter()
        .find_map(|(dst, _)| match dst {
            NodeRef::Variable(v) => Some(v),
            _ => None,
        })
}

/// Body/head position sets per variable, derived once from
/// `VARIABLE_AT_POSITION` edges.
pub(crate) fn variable_position_sets(graph: &ProgramGraph) -> (FxHashMap<VariableId, FxHashSet<PositionId>>, FxHashMap<VariableId, FxHashSet<PositionId>>) {
    let mut body = FxHashMap::default();
    let mut head = FxHashMap::default();
    graph.for_each_edge(|src, dst, edge| {
        let EdgeKind::VariableAtPosition(attrs) = edge else { return };
        let (NodeRef::Variable(v), NodeRef::Position(p)) = (src, dst) else { return };
        let target = if attrs.head { &mut head } else { &mut body };
        target.entry(v).or_insert_with(FxHashSet::default).insert(p);
    });
    (body, head)
}

/// Variables occurring in body atoms of a rule (spec §4.4.4's `V(ρ)`),
/// keyed by rule.
pub(crate) fn body_variables_by_rule(graph: &ProgramGraph, body_positions: &FxHashMap<VariableId, FxHashSet<PositionId>>) -> FxHashMap<RuleId, FxHashSet<VariableId>> {
    let mut out: FxHashMap<RuleId, FxHashSet<VariableId>> = FxHashMap::default();
    for (var, positions) in body_positions {
        if positions.is_empty() {
            continue;
        }
        out.entry(graph.variable(*var).rule).or_default().insert(*var);
    }
    out
}

/// Universally-quantified variables occurring in the head of a rule
/// (spec §4.4.5's frontier `V(ρ)`).
pub(crate) fn frontier_variables_by_rule(graph: &ProgramGraph, head_positions: &FxHashMap<VariableId, FxHashSet<PositionId>>) -> FxHashMap<RuleId, FxHashSet<VariableId>> {
    let mut out: FxHashMap<RuleId, FxHashSet<VariableId>> = FxHashMap::default();
    for (var, positions) in head_positions {
        if positions.is_empty() || graph.variable(*var).existential {
            continue;
        }
        out.entry(graph.variable(*var).rule).or_default().insert(*var);
    }
    out
}

/// Dangerous variables per rule (spec §4.4.6): universally quantified,
/// every body position affected, at least one body position, occurs in
/// the head.
pub(crate) fn dangerous_variables_by_rule(
    graph: &ProgramGraph,
    body_positions: &FxHashMap<VariableId, FxHashSet<PositionId>>,
    head_positions: &FxHashMap<VariableId, FxHashSet<PositionId>>,
) -> FxHashMap<RuleId, FxHashSet<VariableId>> {
    let mut out: FxHashMap<RuleId, FxHashSet<VariableId>> = FxHashMap::default();
    for (var, positions) in body_positions {
        if graph.variable(*var).existential || positions.is_empty() {
            continue;
        }
        if !positions.iter().all(|p| graph.position(*p).affected) {
            continue;
        }
        if !head_positions.get(var).map(|s| !s.is_empty()).unwrap_or(false) {
            continue;
        }
        out.entry(graph.variable(*var).rule).or_default().insert(*var);
    }
    out
}

/// Shared guard computation used by the four guard-shaped fragments
/// (Guarded, Frontier-Guarded, Weakly-Guarded, Weakly-Frontier-Guarded):
/// a body atom-token `a` guards rule `ρ` iff `vars(a) ⊇ required[ρ]`,
/// using [`crate::shared::utils::sets::set_includes`]'s empty/empty
/// convention. Returns, per rule with a body, whether it is guarded and
/// the set of tokens that act as its guard.
pub(crate) fn guard_check(graph: &ProgramGraph, required: &FxHashMap<RuleId, FxHashSet<VariableId>>) -> (FxHashMap<RuleId, bool>, FxHashSet<TokenId>) {
    use crate::shared::utils::sets::set_includes;

    let mut guarded = FxHashMap::default();
    let mut guard_tokens = FxHashSet::default();
    for i in 0..graph.rules.len() {
        let rule = RuleId(i as u32);
        if !graph.rule(rule).is_rule {
            continue;
        }
        let body_tokens = atom_occurrence_tokens_in(graph, rule, TokenLocation::Body);
        if body_tokens.is_empty() {
            continue;
        }
        let need = required.get(&rule).cloned().unwrap_or_default();
        let mut is_guarded = false;
        for token in body_tokens {
            let vars = vars_of_atom_token(graph, token);
            if set_includes(&vars, &need) {
                is_guarded = true;
                guard_tokens.insert(token);
            }
        }
        guarded.insert(rule, is_guarded);
    }
    (guarded, guard_tokens)
}

pub(crate) fn rules_with_egd(graph: &ProgramGraph) -> FxHashSet<RuleId> {
    graph.egds.iter().map(|e| e.rule).collect()
}
