//! C4.1 — Plain Datalog: rejects any existential variable occurrence.

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::shared::models::{ProgramGraph, TokenId};

use super::{token_variable, FragmentAnalyzer, PLAIN_DATALOG};

pub struct PlainDatalogAnalyzer;

impl FragmentAnalyzer for PlainDatalogAnalyzer {
    fn name(&self) -> &'static str {
        PLAIN_DATALOG
    }

    fn run(&self, graph: &mut ProgramGraph) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for i in 0..graph.tokens.len() {
            let id = TokenId(i as u32);
            let Some(var) = token_variable(graph, id) else { continue };
            if !graph.variable(var).existential {
                continue;
            }
            let token = graph.token(id);
            diagnostics.push(
                DiagnosticBuilder::new(DiagnosticKind::ExistentialVariableInDatalog, token.lexical.range())
                    .with("variable", token.lexical.text.clone())
                    .fragment(PLAIN_DATALOG)
                    .build(),
            );
        }
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::base_analysis;
    use crate::features::graph_builder::{ProgramGraphBuilderUseCase, ProgramGraphBuilderUseCaseImpl};

    #[test]
    fn existential_variable_violates_plain_datalog() {
        let mut result = ProgramGraphBuilderUseCaseImpl::new().build_program_graph("node(X,Y):-edge(X).");
        base_analysis::run(&mut result.graph);
        let diagnostics = PlainDatalogAnalyzer.run(&mut result.graph);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticKind::ExistentialVariableInDatalog.code());
    }

    #[test]
    fn rule_without_existentials_is_clean() {
        let mut result = ProgramGraphBuilderUseCaseImpl::new().build_program_graph("edge(X,Y):-node(X),node(Y).");
        base_analysis::run(&mut result.graph);
        assert!(PlainDatalogAnalyzer.run(&mut result.graph).is_empty());
    }
}
