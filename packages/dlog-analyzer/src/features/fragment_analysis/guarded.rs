//! C4.4 — Guarded: a rule is guarded iff some body atom-token's
//! variables cover the full body-variable set (spec §4.4.4).

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::shared::models::{ProgramGraph, RuleId, TokenLocation};

use super::{atom_occurrence_tokens_in, body_variables_by_rule, guard_check, variable_position_sets, FragmentAnalyzer, GUARDED};

pub struct GuardedAnalyzer;

impl FragmentAnalyzer for GuardedAnalyzer {
    fn name(&self) -> &'static str {
        GUARDED
    }

    fn run(&self, graph: &mut ProgramGraph) -> Vec<Diagnostic> {
        let (body_positions, _head_positions) = variable_position_sets(graph);
        let required = body_variables_by_rule(graph, &body_positions);
        let (guarded, guard_tokens) = guard_check(graph, &required);

        for token in &guard_tokens {
            graph.update_token(*token, |t| t.guard = true);
        }

        let mut diagnostics = Vec::new();
        for i in 0..graph.rules.len() {
            let rule = RuleId(i as u32);
            if !graph.rule(rule).is_rule || atom_occurrence_tokens_in(graph, rule, TokenLocation::Body).is_empty() {
                continue;
            }
            let is_guarded = guarded.get(&rule).copied().unwrap_or(false);
            graph.update_rule(rule, |r| r.guarded = is_guarded);
            if !is_guarded {
                diagnostics.push(
                    DiagnosticBuilder::new(DiagnosticKind::ErrAtomNotInGuardedRule, graph.rule(rule).range)
                        .fragment(GUARDED)
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
        GuardedAnalyzer.run(&mut result.graph)
    }

    #[test]
    fn single_guard_atom_covering_all_body_variables_is_guarded() {
        let diagnostics = analyze("t(X,Z):-s(X,Y,Z),t(Y,Z).");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn no_atom_covers_all_body_variables() {
        // s(X,Y),g(X,K),t(Y,K): body vars {X,Y,K}; no single atom has all three.
        let diagnostics = analyze("t(X,Z):-s(X,Y),t(Y,K),g(X,K).");
        assert!(diagnostics.iter().any(|d| d.code == DiagnosticKind::ErrAtomNotInGuardedRule.code()));
    }
}
