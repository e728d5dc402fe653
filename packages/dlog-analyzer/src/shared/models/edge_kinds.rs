//! Tagged edge variant, one per edge kind in spec §3, each with its
//! variant-specific payload (spec §9 redesign note on attribute bags).

/// Shared attribute triple carried by the two variable-occurrence edges
/// (`VARIABLE_AT_POSITION`, `VARIABLE_AT_ATOM_TOKEN`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OccurrenceAttrs {
    pub head: bool,
    pub body_conjunctive_query_term: Option<u32>,
    pub negated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// atom → rule
    AtomOf,
    /// token → {atom,variable,egd,aggregation,condition}
    TokenOf,
    /// atom → position
    PositionOf,
    /// variable → position
    VariableAtPosition(OccurrenceAttrs),
    /// variable → atom-token
    VariableAtAtomToken(OccurrenceAttrs),
    /// variable → egd, `lhs` true iff this occurrence is the left side
    VariableAtEgd { lhs: bool },
    /// variable → condition
    VariableAtCondition { left_hand_side_of_an_eq_condition: bool },
    /// token → position
    TokenAtPosition,
    /// egd → rule
    EgdOf,
    /// aggregation → rule
    AggregationOfRule,
    /// variable → aggregation
    ContributorOfAggregation { index: u32 },
}
