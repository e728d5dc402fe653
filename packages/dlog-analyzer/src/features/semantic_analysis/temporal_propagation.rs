//! C5 — `@temporal(name)` seeds a set of atoms whose facts expire; any
//! atom a temporal atom's rule heads depend on inherits the same
//! instability, transitively, since a rule can only be as fresh as the
//! oldest thing it's built from.

use rustc_hash::FxHashSet;

use crate::features::diagnostics::Diagnostic;
use crate::features::graph_builder::SymbolTables;
use crate::shared::models::{ProgramGraph, TokenLocation, TokenModifier};

use super::SemanticAnalyzer;

pub struct TemporalPropagationAnalyzer;

impl SemanticAnalyzer for TemporalPropagationAnalyzer {
    fn name(&self) -> &'static str {
        "TemporalPropagation"
    }

    fn run(&self, graph: &mut ProgramGraph, tables: &SymbolTables) -> Vec<Diagnostic> {
        let mut temporal: FxHashSet<_> = tables.temporal_atom_names.iter().filter_map(|name| graph.atom_id(name)).collect();

        let mut frontier: Vec<_> = temporal.iter().copied().collect();
        while let Some(atom) = frontier.pop() {
            for &dependency in graph.atom_dependents(atom) {
                if temporal.insert(dependency) {
                    frontier.push(dependency);
                }
            }
        }

        for i in 0..graph.tokens.len() {
            let id = crate::shared::models::TokenId(i as u32);
            let token = graph.token(id);
            let is_temporal = matches!(token.location, TokenLocation::Head | TokenLocation::Body | TokenLocation::Fact)
                && token.atom.map(|a| temporal.contains(&a)).unwrap_or(false);
            if !is_temporal {
                continue;
            }
            graph.update_token(id, |t| {
                if !t.lexical.modifiers.contains(&TokenModifier::Temporal) {
                    t.lexical.modifiers.push(TokenModifier::Temporal);
                }
            });
        }

        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::graph_builder::{ProgramGraphBuilderUseCase, ProgramGraphBuilderUseCaseImpl};

    fn run(source: &str) -> ProgramGraph {
        let mut result = ProgramGraphBuilderUseCaseImpl::new().build_program_graph(source);
        TemporalPropagationAnalyzer.run(&mut result.graph, &result.tables);
        result.graph
    }

    #[test]
    fn temporal_atom_tokens_get_the_temporal_modifier() {
        let graph = run("a(1).\n@temporal(\"a\").");
        let tagged = graph
            .tokens
            .iter()
            .any(|t| t.location == TokenLocation::Fact && t.lexical.modifiers.contains(&TokenModifier::Temporal));
        assert!(tagged);
    }

    #[test]
    fn dependency_of_a_temporal_atom_is_also_tagged() {
        let graph = run("b(1).\n@temporal(\"a\").\na(X):-b(X).");
        let b_tagged = graph.tokens.iter().any(|t| {
            t.location == TokenLocation::Fact
                && t.atom.map(|a| graph.atom(a).name == "b").unwrap_or(false)
                && t.lexical.modifiers.contains(&TokenModifier::Temporal)
        });
        assert!(b_tagged);
    }

    #[test]
    fn unrelated_atom_is_not_tagged() {
        let graph = run("b(1).\nc(1).\n@temporal(\"a\").\na(X):-b(X).");
        let c_tagged = graph.tokens.iter().any(|t| {
            t.atom.map(|a| graph.atom(a).name == "c").unwrap_or(false) && t.lexical.modifiers.contains(&TokenModifier::Temporal)
        });
        assert!(!c_tagged);
    }
}
