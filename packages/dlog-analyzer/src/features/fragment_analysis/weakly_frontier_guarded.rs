//! C4.6 (part two) — Weakly-Frontier-Guarded. Spec §4.4.6 defines
//! "dangerous" as already requiring head occurrence, so the
//! dangerous-variable subset is identical whether derived from the
//! full body-variable set or the frontier set; this fragment and
//! [`super::weakly_guarded`] therefore compute the same required set
//! (documented as a deliberate, spec-preserved degenerate overlap in
//! `DESIGN.md` rather than invented differently) and differ only in
//! which guard flag/diagnostic they record.

use rustc_hash::FxHashSet;

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::shared::models::{ProgramGraph, RuleId, TokenLocation};

use super::warded::dangerous_variables_from_flags;
use super::{atom_occurrence_tokens_in, guard_check, FragmentAnalyzer, WEAKLY_FRONTIER_GUARDED};

pub struct WeaklyFrontierGuardedAnalyzer;

impl FragmentAnalyzer for WeaklyFrontierGuardedAnalyzer {
    fn name(&self) -> &'static str {
        WEAKLY_FRONTIER_GUARDED
    }

    fn run(&self, graph: &mut ProgramGraph) -> Vec<Diagnostic> {
        let required = dangerous_variables_from_flags(graph);
        let rules_with_dangerous: FxHashSet<RuleId> = required.keys().copied().collect();
        let (guarded, guard_tokens) = guard_check(graph, &required);

        for token in &guard_tokens {
            graph.update_token(*token, |t| t.weak_frontier_guard = true);
        }

        let mut diagnostics = Vec::new();
        for i in 0..graph.rules.len() {
            let rule = RuleId(i as u32);
            if !graph.rule(rule).is_rule || atom_occurrence_tokens_in(graph, rule, TokenLocation::Body).is_empty() {
                continue;
            }
            if !rules_with_dangerous.contains(&rule) {
                graph.update_rule(rule, |r| r.weakly_frontier_guarded = true);
                continue;
            }
            let is_guarded = guarded.get(&rule).copied().unwrap_or(false);
            graph.update_rule(rule, |r| r.weakly_frontier_guarded = is_guarded);
            if !is_guarded {
                diagnostics.push(
                    DiagnosticBuilder::new(DiagnosticKind::ErrAtomNotInWeaklyFrontierGuardedRule, graph.rule(rule).range)
                        .fragment(WEAKLY_FRONTIER_GUARDED)
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
        WeaklyFrontierGuardedAnalyzer.run(&mut result.graph)
    }

    #[test]
    fn rule_without_dangerous_variables_is_trivially_satisfied() {
        let diagnostics = analyze("edge(X,Y):-node(X),node(Y).");
        assert!(diagnostics.is_empty());
    }
}
