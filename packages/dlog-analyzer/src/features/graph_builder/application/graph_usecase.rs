//! Program Graph Builder use case — parses the source once and walks the
//! resulting tree into a [`ProgramGraph`] plus the annotation symbol
//! tables, combining the two diagnostic sources (parse errors, builder
//! errors) into one ordered list.

use crate::features::diagnostics::Diagnostic;
use crate::features::parsing::parse;
use crate::shared::models::ProgramGraph;

use super::super::domain::SymbolTables;
use super::super::infrastructure::build;

pub struct ProgramGraphBuildResult {
    pub graph: ProgramGraph,
    pub tables: SymbolTables,
    pub diagnostics: Vec<Diagnostic>,
}

pub trait ProgramGraphBuilderUseCase {
    fn build_program_graph(&self, source: &str) -> ProgramGraphBuildResult;
}

#[derive(Debug, Default)]
pub struct ProgramGraphBuilderUseCaseImpl;

impl ProgramGraphBuilderUseCaseImpl {
    pub fn new() -> Self {
        Self
    }
}

impl ProgramGraphBuilderUseCase for ProgramGraphBuilderUseCaseImpl {
    fn build_program_graph(&self, source: &str) -> ProgramGraphBuildResult {
        let parsed = parse(source);
        let built = build(source, &parsed.tree);

        let mut diagnostics = parsed.diagnostics;
        diagnostics.extend(built.diagnostics);

        ProgramGraphBuildResult {
            graph: built.graph,
            tables: built.tables,
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combines_parse_and_builder_diagnostics() {
        let result = ProgramGraphBuilderUseCaseImpl::new().build_program_graph("person(X).");
        assert!(result.diagnostics.iter().any(|d| d.code == "1008"));
    }
}
