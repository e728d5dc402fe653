//! Arena index newtypes (spec §9 redesign: arena indices instead of
//! string-keyed identity).

macro_rules! arena_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(RuleId);
arena_id!(AtomId);
arena_id!(TokenId);
arena_id!(VariableId);
arena_id!(PositionId);
arena_id!(EgdId);
arena_id!(ConditionId);
arena_id!(AggregationId);

/// Any node-kind id, used as the weight of the `petgraph` node so edges
/// can connect heterogeneous node kinds (spec §3: a multigraph of typed
/// nodes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Rule(RuleId),
    Atom(AtomId),
    Token(TokenId),
    Variable(VariableId),
    Position(PositionId),
    Egd(EgdId),
    Condition(ConditionId),
    Aggregation(AggregationId),
}
