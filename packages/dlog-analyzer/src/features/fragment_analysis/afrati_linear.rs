//! C4.3 — Afrati-Linear: a rule is Afrati-non-linear iff its body
//! contains two or more intensional atom-tokens.

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::shared::models::{AtomId, ProgramGraph, RuleId, TokenId, TokenLocation};

use super::{atom_occurrence_tokens_in, AFRATI_LINEAR, FragmentAnalyzer};

pub struct AfratiLinearAnalyzer;

impl FragmentAnalyzer for AfratiLinearAnalyzer {
    fn name(&self) -> &'static str {
        AFRATI_LINEAR
    }

    fn run(&self, graph: &mut ProgramGraph) -> Vec<Diagnostic> {
        for i in 0..graph.atoms.len() {
            let atom = AtomId(i as u32);
            let is_idb = graph.atom(atom).is_idb;
            graph.update_atom(atom, |a| a.intensional = is_idb);
        }

        let mut diagnostics = Vec::new();
        for i in 0..graph.rules.len() {
            let rule = RuleId(i as u32);
            if !graph.rule(rule).is_rule {
                continue;
            }
            let body_tokens = atom_occurrence_tokens_in(graph, rule, TokenLocation::Body);
            let intensional_tokens: Vec<TokenId> = body_tokens
                .into_iter()
                .filter(|t| graph.token(*t).atom.map(|a| graph.atom(a).intensional).unwrap_or(false))
                .collect();
            if intensional_tokens.len() < 2 {
                continue;
            }
            for token in intensional_tokens {
                graph.update_token(token, |t| t.afrati_non_linear_join = true);
                diagnostics.push(
                    DiagnosticBuilder::new(DiagnosticKind::NonAfratiLinearJoin, graph.token(token).lexical.range())
                        .fragment(AFRATI_LINEAR)
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
    fn join_of_two_intensional_atoms_violates_afrati_linearity() {
        let mut result = ProgramGraphBuilderUseCaseImpl::new().build_program_graph("r(X,Z):-p(X,Y),p(Y,Z).\np(X,Y):-e(X,Y).");
        let diagnostics = AfratiLinearAnalyzer.run(&mut result.graph);
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn join_with_one_extensional_atom_is_clean() {
        let mut result = ProgramGraphBuilderUseCaseImpl::new().build_program_graph("r(X,Z):-p(X,Y),e(Y,Z).\np(X,Y):-e(X,Y).");
        assert!(AfratiLinearAnalyzer.run(&mut result.graph).is_empty());
    }
}
