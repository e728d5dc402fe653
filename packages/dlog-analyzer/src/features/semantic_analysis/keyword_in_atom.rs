//! C5 — atom names that collide with a reserved annotation or
//! aggregation keyword. The lexer (C-parsing) never reserves these as
//! identifiers — `output(X):-a(X).` parses just fine — so the clash has
//! to be caught here instead, against the same keyword lists the parser
//! uses for annotations and aggregations.

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::features::graph_builder::SymbolTables;
use crate::shared::models::{ProgramGraph, TokenLocation};

use super::SemanticAnalyzer;

const RESERVED: &[&str] = &[
    "output", "input", "module", "bind", "qbind", "mapping", "post", "temporal", "sum", "prod", "avg", "count", "min", "max", "set", "list", "union",
    "msum", "mprod", "mcount", "mmin", "mmax", "munion",
];

pub struct KeywordInAtomNameAnalyzer;

impl SemanticAnalyzer for KeywordInAtomNameAnalyzer {
    fn name(&self) -> &'static str {
        "NoKeywordInAtomName"
    }

    fn run(&self, graph: &mut ProgramGraph, _tables: &SymbolTables) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for token in &graph.tokens {
            let Some(atom) = token.atom else { continue };
            if !matches!(token.location, TokenLocation::Head | TokenLocation::Body | TokenLocation::Fact) || token.term_index.is_some() {
                continue;
            }
            let name = &graph.atom(atom).name;
            if RESERVED.contains(&name.to_lowercase().as_str()) {
                diagnostics.push(
                    DiagnosticBuilder::new(DiagnosticKind::ErrKeywordUsedAsAtomName, token.lexical.range())
                        .with("atom", name.clone())
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

    fn analyze(source: &str) -> Vec<Diagnostic> {
        let mut result = ProgramGraphBuilderUseCaseImpl::new().build_program_graph(source);
        KeywordInAtomNameAnalyzer.run(&mut result.graph, &result.tables)
    }

    #[test]
    fn atom_named_after_an_aggregation_keyword_is_flagged() {
        let diagnostics = analyze("sum(1).");
        assert!(diagnostics.iter().any(|d| d.code == DiagnosticKind::ErrKeywordUsedAsAtomName.code()));
    }

    #[test]
    fn ordinary_atom_name_is_fine() {
        let diagnostics = analyze("person(1).");
        assert!(diagnostics.is_empty());
    }
}
