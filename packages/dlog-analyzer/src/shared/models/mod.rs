//! Shared models

mod edge_kinds;
pub mod error;
mod graph;
mod ids;
mod node_kinds;
mod span;
mod token;

pub use edge_kinds::{EdgeKind, OccurrenceAttrs};
pub use error::{AnalyzerError, Result};
pub use graph::ProgramGraph;
pub use ids::{
    AggregationId, AtomId, ConditionId, EgdId, NodeRef, PositionId, RuleId, TokenId, VariableId,
};
pub use node_kinds::{
    AggregationNode, AggregationType, AtomNode, ConditionNode, EgdNode, PositionNode, RuleNode,
    TokenLocation, TokenNode, TokenOfTarget, VariableNode,
};
pub use span::{Position, Range};
pub use token::{LexicalKind, LexicalToken, TokenModifier};
