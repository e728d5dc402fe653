//! C4.6 — Weakly-Guarded: same shape as Guarded, but the required set
//! is restricted to dangerous variables (spec §4.4.6). Depends on
//! [`super::warded`] having already marked `VariableNode::dangerous`
//! (spec §5 ordering).

use rustc_hash::FxHashSet;

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::shared::models::{ProgramGraph, RuleId, TokenLocation};

use super::warded::dangerous_variables_from_flags;
use super::{atom_occurrence_tokens_in, guard_check, FragmentAnalyzer, WEAKLY_GUARDED};

pub struct WeaklyGuardedAnalyzer;

impl FragmentAnalyzer for WeaklyGuardedAnalyzer {
    fn name(&self) -> &'static str {
        WEAKLY_GUARDED
    }

    fn run(&self, graph: &mut ProgramGraph) -> Vec<Diagnostic> {
        let required = dangerous_variables_from_flags(graph);
        let mut diagnostics = Vec::new();

        // Rules with no dangerous variables at all trivially satisfy the
        // fragment (nothing needs guarding); only rules that actually
        // have a nonempty dangerous set are checked against guard_check,
        // since set_includes(outer, {}) is defined true (spec §9).
        let rules_with_dangerous: FxHashSet<RuleId> = required.keys().copied().collect();
        let (guarded, guard_tokens) = guard_check(graph, &required);

        for token in &guard_tokens {
            graph.update_token(*token, |t| t.weak_guard = true);
        }

        for i in 0..graph.rules.len() {
            let rule = RuleId(i as u32);
            if !graph.rule(rule).is_rule || atom_occurrence_tokens_in(graph, rule, TokenLocation::Body).is_empty() {
                continue;
            }
            if !rules_with_dangerous.contains(&rule) {
                graph.update_rule(rule, |r| r.weakly_guarded = true);
                continue;
            }
            let is_guarded = guarded.get(&rule).copied().unwrap_or(false);
            graph.update_rule(rule, |r| r.weakly_guarded = is_guarded);
            if !is_guarded {
                diagnostics.push(
                    DiagnosticBuilder::new(DiagnosticKind::ErrAtomNotInWeaklyGuardedRule, graph.rule(rule).range)
                        .fragment(WEAKLY_GUARDED)
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
    use crate::features::base_analysis;
    use crate::features::fragment_analysis::WardedAnalyzer;
    use crate::features::graph_builder::{ProgramGraphBuilderUseCase, ProgramGraphBuilderUseCaseImpl};

    fn analyze(source: &str) -> Vec<Diagnostic> {
        let mut result = ProgramGraphBuilderUseCaseImpl::new().build_program_graph(source);
        base_analysis::run(&mut result.graph);
        WardedAnalyzer.run(&mut result.graph);
        WeaklyGuardedAnalyzer.run(&mut result.graph)
    }

    #[test]
    fn rule_without_dangerous_variables_is_trivially_weakly_guarded() {
        let diagnostics = analyze("edge(X,Y):-node(X),node(Y).");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn dangerous_variable_covered_by_a_partial_guard_passes() {
        let diagnostics = analyze(
            "node(X,Y):-edge(X).\n\
             q(Y):-node(A,Y),r(A).",
        );
        assert!(diagnostics.is_empty());
    }
}
