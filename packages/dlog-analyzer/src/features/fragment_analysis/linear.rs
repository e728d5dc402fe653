//! C4.2 — Linear: a rule is non-linear iff its body has more than one
//! atom-token.

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::shared::models::{ProgramGraph, RuleId, TokenLocation};

use super::{atom_occurrence_tokens_in, FragmentAnalyzer, LINEAR};

pub struct LinearAnalyzer;

impl FragmentAnalyzer for LinearAnalyzer {
    fn name(&self) -> &'static str {
        LINEAR
    }

    fn run(&self, graph: &mut ProgramGraph) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for i in 0..graph.rules.len() {
            let rule = RuleId(i as u32);
            if !graph.rule(rule).is_rule {
                continue;
            }
            let body_atoms = atom_occurrence_tokens_in(graph, rule, TokenLocation::Body).len();
            if body_atoms > 1 {
                graph.update_rule(rule, |r| r.non_linear = true);
                diagnostics.push(
                    DiagnosticBuilder::new(DiagnosticKind::NonLinearRule, graph.rule(rule).range)
                        .fragment(LINEAR)
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
    use crate::features::graph_builder::{ProgramGraphBuilderUseCase, ProgramGraphBuilderUseCaseImpl};

    #[test]
    fn two_body_atoms_is_non_linear() {
        let mut result = ProgramGraphBuilderUseCaseImpl::new().build_program_graph("t(X,Z):-s(X,Y),t(Y,Z).");
        let diagnostics = LinearAnalyzer.run(&mut result.graph);
        assert_eq!(diagnostics.len(), 1);
        assert!(result.graph.rule(RuleId(0)).non_linear);
    }

    #[test]
    fn single_body_atom_is_linear() {
        let mut result = ProgramGraphBuilderUseCaseImpl::new().build_program_graph("t(X):-s(X).");
        assert!(LinearAnalyzer.run(&mut result.graph).is_empty());
    }
}
