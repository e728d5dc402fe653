//! C7 — Token Decorator / Output Assembler.
//!
//! Runs once, after C2-C5 have finished, and turns the program graph
//! into the two values `adapters::analyze` (C8) actually returns: a
//! flat, sorted token list enriched with the variable- and atom-level
//! attributes a caller needs to render hovers/highlights, and the
//! diagnostic list optionally narrowed to one target fragment.
//!
//! Most of spec §4.7's "merge" work already happened in place: the
//! `EXISTENTIAL` modifier is pushed onto tokens by the base analyzer
//! (C3), `TEMPORAL` and `UNUSED` by the relevant C5 analyzers, and the
//! guard/weak-guard/frontier-guard flags and `existentialVariables` are
//! written directly onto each atom-token by the C4 fragment analyzers.
//! What's left here: merging variable-node attributes onto the tokens
//! that denote them (atom tokens don't carry their own copy of
//! `existential`/`harmful`/`dangerous`/`protected`/`attackedBy` — only
//! the owning `VariableNode` does), merging `isEDB`/`isIDB` onto atom
//! tokens, sorting, and the target-fragment filter. The builder never
//! double-emits an annotation-argument token as a plain atom token (it
//! assigns exactly one `TokenLocation` per occurrence), so step 4's
//! "remove suppressed tokens" has nothing left to remove here.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::features::diagnostics::Diagnostic;
use crate::shared::models::{EdgeKind, NodeRef, ProgramGraph, Range, TokenId, TokenLocation, VariableId};

/// One token as handed to a caller: the lexical occurrence plus every
/// attribute an analyzer attached to it or to the node it denotes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoratedToken {
    pub range: Range,
    pub text: String,
    pub location: TokenLocation,
    pub modifiers: Vec<crate::shared::models::TokenModifier>,

    // Variable-occurrence attributes (set only when this token denotes
    // a variable; default/false otherwise).
    pub existential: bool,
    pub harmful: bool,
    pub dangerous: bool,
    pub protected: bool,
    pub attacked_by: Vec<Range>,

    // Atom-occurrence attributes (set only when this token denotes an
    // atom's own name, i.e. `term_index.is_none()`).
    pub is_edb: bool,
    pub is_idb: bool,
    pub guard: bool,
    pub weak_guard: bool,
    pub frontier_guard: bool,
    pub weak_frontier_guard: bool,
    pub existential_variables: Vec<String>,
}

/// Step 1+2+4: merge variable/atom attributes onto every token, then
/// sort ascending by `(line, column)` (spec P1).
pub fn assemble_tokens(graph: &ProgramGraph) -> Vec<DecoratedToken> {
    let token_variable = token_to_variable_map(graph);

    let mut decorated: Vec<DecoratedToken> = (0..graph.tokens.len())
        .map(|i| {
            let id = TokenId(i as u32);
            let token = graph.token(id);
            let mut decorated = DecoratedToken {
                range: token.lexical.range(),
                text: token.lexical.text.clone(),
                location: token.location,
                modifiers: token.lexical.modifiers.clone(),
                existential: false,
                harmful: false,
                dangerous: false,
                protected: false,
                attacked_by: Vec::new(),
                is_edb: false,
                is_idb: false,
                guard: token.guard,
                weak_guard: token.weak_guard,
                frontier_guard: token.frontier_guard,
                weak_frontier_guard: token.weak_frontier_guard,
                existential_variables: token.existential_variables.clone(),
            };

            if let Some(&var) = token_variable.get(&id) {
                let v = graph.variable(var);
                decorated.existential = v.existential;
                decorated.harmful = v.harmful;
                decorated.dangerous = v.dangerous;
                decorated.protected = v.protected;
                decorated.attacked_by = v
                    .attacked_by
                    .iter()
                    .flat_map(|&attacker| occurrence_tokens_of(graph, attacker))
                    .map(|t| graph.token(t).lexical.range())
                    .collect();
            }

            if let Some(atom) = token.atom {
                if token.term_index.is_none() {
                    let a = graph.atom(atom);
                    decorated.is_edb = a.is_edb;
                    decorated.is_idb = a.is_idb;
                }
            }

            decorated
        })
        .collect();

    decorated.sort_by_key(|t| (t.range.start.line, t.range.start.character));
    decorated
}

fn token_to_variable_map(graph: &ProgramGraph) -> FxHashMap<TokenId, VariableId> {
    let mut map = FxHashMap::default();
    graph.for_each_edge(|src, dst, edge| {
        if !matches!(edge, EdgeKind::TokenOf) {
            return;
        }
        let (NodeRef::Token(token), NodeRef::Variable(var)) = (src, dst) else { return };
        map.insert(token, var);
    });
    map
}

fn occurrence_tokens_of(graph: &ProgramGraph, var: VariableId) -> Vec<TokenId> {
    graph
        .out_edges(NodeRef::Variable(var), |e| matches!(e, EdgeKind::TokenOf))
        .into_iter()
        .filter_map(|(dst, _)| match dst {
            NodeRef::Token(t) => Some(t),
            _ => None,
        })
        .collect()
}

/// Which fragments a caller may ask C8 to narrow diagnostics down to.
/// `ShowAllViolations` means no filter, `DatalogExistential` is the
/// catch-all for rules with existential variables that aren't further
/// constrained to one of the fixed fragments below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFragment {
    ShowAllViolations,
    PlainDatalog,
    Linear,
    AfratiLinear,
    Warded,
    Shy,
    Guarded,
    WeaklyGuarded,
    WeaklyFrontierGuarded,
    FrontierGuarded,
    DatalogExistential,
}

impl Default for TargetFragment {
    fn default() -> Self {
        TargetFragment::Warded
    }
}

impl TargetFragment {
    /// The fragment-violation label this target corresponds to, matching
    /// the constants each C4 analyzer tags its diagnostics with.
    fn label(self) -> Option<&'static str> {
        use crate::features::fragment_analysis::*;
        match self {
            TargetFragment::ShowAllViolations => None,
            TargetFragment::PlainDatalog => Some(PLAIN_DATALOG),
            TargetFragment::Linear => Some(LINEAR),
            TargetFragment::AfratiLinear => Some(AFRATI_LINEAR),
            TargetFragment::Warded => Some(WARDED),
            TargetFragment::Shy => Some(SHY),
            TargetFragment::Guarded => Some(GUARDED),
            TargetFragment::WeaklyGuarded => Some(WEAKLY_GUARDED),
            TargetFragment::WeaklyFrontierGuarded => Some(WEAKLY_FRONTIER_GUARDED),
            TargetFragment::FrontierGuarded => Some(FRONTIER_GUARDED),
            // Datalog ∃ has no dedicated analyzer of its own: every rule
            // with an existential variable belongs to it by definition,
            // which is exactly Plain Datalog's violation set inverted —
            // there is no separate fragment-violation label to filter on,
            // so treat it as "show everything" like the source does.
            TargetFragment::DatalogExistential => None,
        }
    }
}

/// Step 5: narrow `diagnostics` to base/semantic errors (no
/// `fragment_violation`) plus only the target fragment's violations.
/// `ShowAllViolations` (and `DatalogExistential`, see [`TargetFragment::label`])
/// passes everything through unfiltered.
pub fn filter_diagnostics(diagnostics: Vec<Diagnostic>, target: TargetFragment) -> Vec<Diagnostic> {
    let Some(label) = target.label() else {
        return diagnostics;
    };
    diagnostics
        .into_iter()
        .filter(|d| match &d.fragment_violation {
            None => true,
            Some(violation) => violation == label,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::graph_builder::{ProgramGraphBuilderUseCase, ProgramGraphBuilderUseCaseImpl};

    #[test]
    fn decorated_tokens_are_sorted_ascending() {
        let result = ProgramGraphBuilderUseCaseImpl::new().build_program_graph("p(X):-a(X,Y),b(Y).");
        let tokens = assemble_tokens(&result.graph);
        for pair in tokens.windows(2) {
            let a = (pair[0].range.start.line, pair[0].range.start.character);
            let b = (pair[1].range.start.line, pair[1].range.start.character);
            assert!(a <= b);
        }
    }

    #[test]
    fn atom_token_carries_edb_idb_flags() {
        let result = ProgramGraphBuilderUseCaseImpl::new().build_program_graph("a(1).\np(X):-a(X).");
        let tokens = assemble_tokens(&result.graph);
        let a_fact_token = tokens.iter().find(|t| t.location == TokenLocation::Fact && t.text == "a").unwrap();
        assert!(a_fact_token.is_edb);
        assert!(!a_fact_token.is_idb);
    }

    #[test]
    fn show_all_violations_passes_fragment_diagnostics_through() {
        let diagnostics = vec![];
        assert_eq!(filter_diagnostics(diagnostics.clone(), TargetFragment::ShowAllViolations).len(), diagnostics.len());
    }
}
