//! C4.5 — Frontier-Guarded: same shape as Guarded but the required set
//! is the rule's frontier (the universally quantified variables that
//! actually occur in the head) rather than the full body-variable set
//! (spec §4.4.5).

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::shared::models::{ProgramGraph, RuleId, TokenLocation};

use super::{atom_occurrence_tokens_in, frontier_variables_by_rule, guard_check, variable_position_sets, FragmentAnalyzer, FRONTIER_GUARDED};

pub struct FrontierGuardedAnalyzer;

impl FragmentAnalyzer for FrontierGuardedAnalyzer {
    fn name(&self) -> &'static str {
        FRONTIER_GUARDED
    }

    fn run(&self, graph: &mut ProgramGraph) -> Vec<Diagnostic> {
        let (_body_positions, head_positions) = variable_position_sets(graph);
        let required = frontier_variables_by_rule(graph, &head_positions);
        let (guarded, guard_tokens) = guard_check(graph, &required);

        for token in &guard_tokens {
            graph.update_token(*token, |t| t.frontier_guard = true);
        }

        let mut diagnostics = Vec::new();
        for i in 0..graph.rules.len() {
            let rule = RuleId(i as u32);
            if !graph.rule(rule).is_rule || atom_occurrence_tokens_in(graph, rule, TokenLocation::Body).is_empty() {
                continue;
            }
            let is_guarded = guarded.get(&rule).copied().unwrap_or(false);
            graph.update_rule(rule, |r| r.frontier_guarded = is_guarded);
            if !is_guarded {
                diagnostics.push(
                    DiagnosticBuilder::new(DiagnosticKind::ErrAtomNotInFrontierGuardedRule, graph.rule(rule).range)
                        .fragment(FRONTIER_GUARDED)
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
    use crate::features::graph_builder::{ProgramGraphBuilderUseCase, ProgramGraphBuilderUseCaseImpl};

    fn analyze(source: &str) -> Vec<Diagnostic> {
        let mut result = ProgramGraphBuilderUseCaseImpl::new().build_program_graph(source);
        base_analysis::run(&mut result.graph);
        FrontierGuardedAnalyzer.run(&mut result.graph)
    }

    #[test]
    fn frontier_guard_only_needs_to_cover_head_variables_that_occur_in_body() {
        // Z is head-only (existential), so the frontier set is just {X};
        // g(X,K) covers it even though no atom covers the full body {X,Y,K}.
        let diagnostics = analyze("t(X,Z):-s(X,Y),t(Y,K),g(X,K).");
        assert!(diagnostics.is_empty());
    }
}
