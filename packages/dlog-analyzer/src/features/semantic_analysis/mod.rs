//! C5 — Semantic Analyzers.
//!
//! Structural and annotation-level checks that aren't fragment-shaped:
//! naming/declaration well-formedness, input/output wiring, negation
//! safety, condition-variable acyclicity and temporal propagation. Each
//! check is its own module sharing the [`SemanticAnalyzer`] trait;
//! [`run_all`] composes them in spec §5's order, ahead of the C4
//! fragment analyzers.

mod anonymous_variable;
mod bind_on_unknown;
mod condition_variable_cycles;
mod duplicate_output;
mod input_atom_in_head;
mod keyword_in_atom;
mod mapping_arity;
mod negation;
mod no_fact_output;
mod non_existing_output;
mod temporal_propagation;
mod unbound_input_output;
mod undeclared_atom;
mod unused_atom;

pub use anonymous_variable::AnonymousVariableAnalyzer;
pub use bind_on_unknown::BindOnUnknownAnalyzer;
pub use condition_variable_cycles::ConditionVariableCyclesAnalyzer;
pub use duplicate_output::DuplicateOutputAnalyzer;
pub use input_atom_in_head::InputAtomInHeadAnalyzer;
pub use keyword_in_atom::KeywordInAtomNameAnalyzer;
pub use mapping_arity::MappingArityAnalyzer;
pub use negation::NegationAnalyzer;
pub use no_fact_output::NoFactOutputAnalyzer;
pub use non_existing_output::NonExistingOutputAnalyzer;
pub use temporal_propagation::TemporalPropagationAnalyzer;
pub use unbound_input_output::UnboundInputOutputAnalyzer;
pub use undeclared_atom::UndeclaredAtomAnalyzer;
pub use unused_atom::UnusedAtomAnalyzer;

use crate::features::diagnostics::Diagnostic;
use crate::features::graph_builder::SymbolTables;
use crate::shared::models::{EdgeKind, NodeRef, ProgramGraph, TokenId, VariableId};

pub trait SemanticAnalyzer {
    fn name(&self) -> &'static str;
    fn run(&self, graph: &mut ProgramGraph, tables: &SymbolTables) -> Vec<Diagnostic>;
}

/// Ported from the source system per the Open Question resolution in
/// spec §9, but never wired into [`run_all`]: its own rollout shipped it
/// disabled because it only ever re-reported what
/// [`ConditionVariableCyclesAnalyzer`] already catches. Kept here, inert,
/// for parity rather than silently dropped.
struct AssignedVariableUsedInSameConditionAnalyzer;

impl SemanticAnalyzer for AssignedVariableUsedInSameConditionAnalyzer {
    fn name(&self) -> &'static str {
        "AssignedVariableUsedInSameCondition"
    }

    fn run(&self, _graph: &mut ProgramGraph, _tables: &SymbolTables) -> Vec<Diagnostic> {
        Vec::new()
    }
}

/// Runs every C5 analyzer in spec §5's order, ahead of the C4 fragment
/// analyzers.
pub fn run_all(graph: &mut ProgramGraph, tables: &SymbolTables) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    diagnostics.extend(NoFactOutputAnalyzer.run(graph, tables));
    diagnostics.extend(BindOnUnknownAnalyzer.run(graph, tables));
    diagnostics.extend(AnonymousVariableAnalyzer.run(graph, tables));
    diagnostics.extend(NegationAnalyzer.run(graph, tables));
    diagnostics.extend(KeywordInAtomNameAnalyzer.run(graph, tables));
    diagnostics.extend(AssignedVariableUsedInSameConditionAnalyzer.run(graph, tables));
    diagnostics.extend(ConditionVariableCyclesAnalyzer.run(graph, tables));
    diagnostics.extend(UndeclaredAtomAnalyzer.run(graph, tables));
    diagnostics.extend(InputAtomInHeadAnalyzer.run(graph, tables));
    diagnostics.extend(DuplicateOutputAnalyzer.run(graph, tables));
    diagnostics.extend(NonExistingOutputAnalyzer.run(graph, tables));
    diagnostics.extend(UnboundInputOutputAnalyzer.run(graph, tables));
    diagnostics.extend(MappingArityAnalyzer.run(graph, tables));
    diagnostics.extend(TemporalPropagationAnalyzer.run(graph, tables));
    diagnostics.extend(UnusedAtomAnalyzer.run(graph, tables));
    diagnostics
}

pub(crate) fn occurrence_tokens_of_variable(graph: &ProgramGraph, var: VariableId) -> Vec<TokenId> {
    graph
        .out_edges(NodeRef::Variable(var), |e| matches!(e, EdgeKind::TokenOf))
        .into_iter()
        .filter_map(|(dst, _)| match dst {
            NodeRef::Token(t) => Some(t),
            _ => None,
        })
        .collect()
}
