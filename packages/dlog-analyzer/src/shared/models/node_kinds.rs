//! One sum-type-free struct per node kind (spec §9: replace the untyped
//! attribute bag with a fixed record of optional booleans/id-sets per
//! node kind).

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::ids::{AggregationId, AtomId, EgdId, RuleId, TokenId, VariableId};
use super::span::Range;
use super::token::LexicalToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenLocation {
    Head,
    Body,
    Fact,
    Input,
    Output,
    Binding,
    Mapping,
    Post,
}

#[derive(Debug, Clone, Default)]
pub struct RuleNode {
    pub range: Range,
    pub source_uri: Option<String>,
    /// True only for actual Datalog rules (a head plus a body, or an EGD
    /// head). Facts and annotations also get a `RuleId` as their owning
    /// construct (spec §4.2's "every token needs a rule"), but fragment
    /// analyzers (C4) skip anything with `is_rule=false`.
    pub is_rule: bool,
    pub guarded: bool,
    pub frontier_guarded: bool,
    pub weakly_guarded: bool,
    pub weakly_frontier_guarded: bool,
    pub non_linear: bool,
}

impl RuleNode {
    pub fn new(range: Range) -> Self {
        Self {
            range,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AtomNode {
    pub name: String,
    pub is_edb: bool,
    pub is_idb: bool,
    pub intensional: bool,
    pub existential_variables: Vec<String>,
}

impl AtomNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// One per lexical occurrence of an identifier/variable/literal, linked
/// via `TOKEN_OF` to whichever entity it denotes. Fields below the
/// `lexical` record only apply to atom-occurrence tokens; they stay at
/// their default for variable- and literal-occurrence tokens.
#[derive(Debug, Clone)]
pub struct TokenNode {
    pub lexical: LexicalToken,
    pub location: TokenLocation,
    pub rule: RuleId,
    pub atom: Option<AtomId>,
    pub term_index: Option<u32>,
    pub is_literal: bool,
    pub egd: Option<EgdId>,
    pub guard: bool,
    pub weak_guard: bool,
    pub frontier_guard: bool,
    pub weak_frontier_guard: bool,
    pub afrati_non_linear_join: bool,
    pub used_in_tainted_join: bool,
    pub used_in_tainted_filter: bool,
    pub is_literal_used_in_tainted_positions: bool,
    pub existential_variables: Vec<String>,
}

impl TokenNode {
    pub fn new(lexical: LexicalToken, location: TokenLocation, rule: RuleId) -> Self {
        Self {
            lexical,
            location,
            rule,
            atom: None,
            term_index: None,
            is_literal: false,
            egd: None,
            guard: false,
            weak_guard: false,
            frontier_guard: false,
            weak_frontier_guard: false,
            afrati_non_linear_join: false,
            used_in_tainted_join: false,
            used_in_tainted_filter: false,
            is_literal_used_in_tainted_positions: false,
            existential_variables: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VariableNode {
    pub name: String,
    pub rule: RuleId,
    pub existential: bool,
    pub undeclared: bool,
    pub harmful: bool,
    pub dangerous: bool,
    pub attacked_by: FxHashSet<VariableId>,
    pub protected: bool,
}

impl VariableNode {
    pub fn new(name: impl Into<String>, rule: RuleId) -> Self {
        Self {
            name: name.into(),
            rule,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PositionNode {
    pub atom_name: String,
    pub index: u32,
    pub affected: bool,
    pub tainted: bool,
    pub invaded_by: FxHashSet<VariableId>,
}

impl PositionNode {
    pub fn new(atom_name: impl Into<String>, index: u32) -> Self {
        Self {
            atom_name: atom_name.into(),
            index,
            ..Default::default()
        }
    }

    /// `atomName[index]` identity string, matching spec §3's position id
    /// convention (still useful for diagnostics and debugging even
    /// though identity is now the arena index).
    pub fn display_id(&self) -> String {
        format!("{}[{}]", self.atom_name, self.index)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EgdNode {
    pub rule: RuleId,
}

#[derive(Debug, Clone, Default)]
pub struct ConditionNode {
    pub rule: RuleId,
    pub text: String,
    pub equality: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationType {
    Sum,
    Prod,
    Avg,
    Count,
    Min,
    Max,
    Set,
    List,
    Union,
    MSum,
    MProd,
    MCount,
    MMin,
    MMax,
    MUnion,
}

impl AggregationType {
    /// `MAX`/`MIN`/`MMAX`/`MMIN` take no contributor list (spec §4.2).
    pub fn has_contributors(self) -> bool {
        !matches!(
            self,
            AggregationType::Max | AggregationType::Min | AggregationType::MMax | AggregationType::MMin
        )
    }
}

#[derive(Debug, Clone)]
pub struct AggregationNode {
    pub rule: RuleId,
    pub text: String,
    pub aggregation_type: AggregationType,
}

/// Marker kept only to document which `TOKEN_OF` target an edge points
/// at; not stored on nodes themselves.
#[derive(Debug, Clone, Copy)]
pub enum TokenOfTarget {
    Atom(AtomId),
    Variable(VariableId),
    Egd(EgdId),
    Aggregation(AggregationId),
    Condition(super::ids::ConditionId),
}
