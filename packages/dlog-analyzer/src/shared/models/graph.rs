//! C1 — Graph IR.
//!
//! A directed multigraph of typed nodes/edges, re-architected per spec §9:
//! one arena (`Vec<T>`) per node kind holding the attribute record, a
//! `petgraph::graph::DiGraph<NodeRef, EdgeKind>` carrying connectivity
//! (petgraph allows parallel edges between the same pair by default,
//! which is exactly the multigraph semantics spec §3 requires for, e.g.,
//! a variable occurring twice in the same atom), and name-keyed side
//! tables for O(1) lookup without re-walking the arenas.

use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;

use super::edge_kinds::{EdgeKind, OccurrenceAttrs};
use super::ids::{
    AggregationId, AtomId, ConditionId, EgdId, NodeRef, PositionId, RuleId, TokenId, VariableId,
};
use super::node_kinds::{
    AggregationNode, AtomNode, ConditionNode, EgdNode, PositionNode, RuleNode, TokenLocation,
    TokenNode, TokenOfTarget, VariableNode,
};

#[derive(Default)]
pub struct ProgramGraph {
    pub rules: Vec<RuleNode>,
    pub atoms: Vec<AtomNode>,
    pub tokens: Vec<TokenNode>,
    pub variables: Vec<VariableNode>,
    pub positions: Vec<PositionNode>,
    pub egds: Vec<EgdNode>,
    pub conditions: Vec<ConditionNode>,
    pub aggregations: Vec<AggregationNode>,

    atom_by_name: FxHashMap<String, AtomId>,
    variable_by_key: FxHashMap<(String, RuleId), VariableId>,
    position_by_key: FxHashMap<(String, u32), PositionId>,

    graph: DiGraph<NodeRef, EdgeKind>,
    rule_idx: Vec<NodeIndex>,
    atom_idx: Vec<NodeIndex>,
    token_idx: Vec<NodeIndex>,
    variable_idx: Vec<NodeIndex>,
    position_idx: Vec<NodeIndex>,
    egd_idx: Vec<NodeIndex>,
    condition_idx: Vec<NodeIndex>,
    aggregation_idx: Vec<NodeIndex>,

    /// Simple atom-dependency digraph (head atom → body atoms of the
    /// same rule), used only by temporal propagation (spec §4.2, §4.5).
    atom_dependencies: FxHashMap<AtomId, Vec<AtomId>>,
}

impl ProgramGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- node constructors -------------------------------------------------

    pub fn add_rule(&mut self, rule: RuleNode) -> RuleId {
        let id = RuleId(self.rules.len() as u32);
        let idx = self.graph.add_node(NodeRef::Rule(id));
        self.rules.push(rule);
        self.rule_idx.push(idx);
        id
    }

    /// Idempotent: returns the existing id if `name` was already added.
    pub fn add_atom_if_missing(&mut self, name: &str) -> AtomId {
        if let Some(&id) = self.atom_by_name.get(name) {
            return id;
        }
        let id = AtomId(self.atoms.len() as u32);
        let idx = self.graph.add_node(NodeRef::Atom(id));
        self.atoms.push(AtomNode::new(name));
        self.atom_idx.push(idx);
        self.atom_by_name.insert(name.to_string(), id);
        id
    }

    pub fn has_atom(&self, name: &str) -> bool {
        self.atom_by_name.contains_key(name)
    }

    pub fn atom_id(&self, name: &str) -> Option<AtomId> {
        self.atom_by_name.get(name).copied()
    }

    pub fn add_token(&mut self, token: TokenNode) -> TokenId {
        let id = TokenId(self.tokens.len() as u32);
        let idx = self.graph.add_node(NodeRef::Token(id));
        self.tokens.push(token);
        self.token_idx.push(idx);
        id
    }

    /// Idempotent on `(name, rule)`.
    pub fn add_variable_if_missing(&mut self, name: &str, rule: RuleId) -> VariableId {
        let key = (name.to_string(), rule);
        if let Some(&id) = self.variable_by_key.get(&key) {
            return id;
        }
        let id = VariableId(self.variables.len() as u32);
        let idx = self.graph.add_node(NodeRef::Variable(id));
        self.variables.push(VariableNode::new(name, rule));
        self.variable_idx.push(idx);
        self.variable_by_key.insert(key, id);
        id
    }

    pub fn variable_id(&self, name: &str, rule: RuleId) -> Option<VariableId> {
        self.variable_by_key.get(&(name.to_string(), rule)).copied()
    }

    /// Idempotent on `(atom_name, index)` — spec §3: "the same position
    /// may be reachable from multiple rules".
    pub fn add_position_if_missing(&mut self, atom_name: &str, index: u32) -> PositionId {
        let key = (atom_name.to_string(), index);
        if let Some(&id) = self.position_by_key.get(&key) {
            return id;
        }
        let id = PositionId(self.positions.len() as u32);
        let idx = self.graph.add_node(NodeRef::Position(id));
        self.positions.push(PositionNode::new(atom_name, index));
        self.position_idx.push(idx);
        self.position_by_key.insert(key, id);
        id
    }

    pub fn add_egd(&mut self, rule: RuleId) -> EgdId {
        let id = EgdId(self.egds.len() as u32);
        let idx = self.graph.add_node(NodeRef::Egd(id));
        self.egds.push(EgdNode { rule });
        self.egd_idx.push(idx);
        id
    }

    pub fn add_condition(&mut self, condition: ConditionNode) -> ConditionId {
        let id = ConditionId(self.conditions.len() as u32);
        let idx = self.graph.add_node(NodeRef::Condition(id));
        self.conditions.push(condition);
        self.condition_idx.push(idx);
        id
    }

    pub fn add_aggregation(&mut self, aggregation: AggregationNode) -> AggregationId {
        let id = AggregationId(self.aggregations.len() as u32);
        let idx = self.graph.add_node(NodeRef::Aggregation(id));
        self.aggregations.push(aggregation);
        self.aggregation_idx.push(idx);
        id
    }

    // ---- node attribute access/update ---------------------------------------

    pub fn rule(&self, id: RuleId) -> &RuleNode {
        &self.rules[id.index()]
    }

    pub fn update_rule(&mut self, id: RuleId, mutator: impl FnOnce(&mut RuleNode)) {
        mutator(&mut self.rules[id.index()]);
    }

    pub fn atom(&self, id: AtomId) -> &AtomNode {
        &self.atoms[id.index()]
    }

    pub fn update_atom(&mut self, id: AtomId, mutator: impl FnOnce(&mut AtomNode)) {
        mutator(&mut self.atoms[id.index()]);
    }

    pub fn token(&self, id: TokenId) -> &TokenNode {
        &self.tokens[id.index()]
    }

    pub fn update_token(&mut self, id: TokenId, mutator: impl FnOnce(&mut TokenNode)) {
        mutator(&mut self.tokens[id.index()]);
    }

    pub fn variable(&self, id: VariableId) -> &VariableNode {
        &self.variables[id.index()]
    }

    pub fn update_variable(&mut self, id: VariableId, mutator: impl FnOnce(&mut VariableNode)) {
        mutator(&mut self.variables[id.index()]);
    }

    pub fn position(&self, id: PositionId) -> &PositionNode {
        &self.positions[id.index()]
    }

    pub fn update_position(&mut self, id: PositionId, mutator: impl FnOnce(&mut PositionNode)) {
        mutator(&mut self.positions[id.index()]);
    }

    pub fn egd(&self, id: EgdId) -> &EgdNode {
        &self.egds[id.index()]
    }

    pub fn condition(&self, id: ConditionId) -> &ConditionNode {
        &self.conditions[id.index()]
    }

    pub fn aggregation(&self, id: AggregationId) -> &AggregationNode {
        &self.aggregations[id.index()]
    }

    // ---- edge constructors ---------------------------------------------------

    pub fn add_atom_of(&mut self, atom: AtomId, rule: RuleId) {
        self.graph
            .add_edge(self.atom_idx[atom.index()], self.rule_idx[rule.index()], EdgeKind::AtomOf);
    }

    pub fn add_token_of(&mut self, token: TokenId, target: TokenOfTarget) {
        let dst = match target {
            TokenOfTarget::Atom(id) => self.atom_idx[id.index()],
            TokenOfTarget::Variable(id) => self.variable_idx[id.index()],
            TokenOfTarget::Egd(id) => self.egd_idx[id.index()],
            TokenOfTarget::Aggregation(id) => self.aggregation_idx[id.index()],
            TokenOfTarget::Condition(id) => self.condition_idx[id.index()],
        };
        self.graph.add_edge(self.token_idx[token.index()], dst, EdgeKind::TokenOf);
    }

    pub fn add_position_of(&mut self, atom: AtomId, position: PositionId) {
        self.graph.add_edge(
            self.atom_idx[atom.index()],
            self.position_idx[position.index()],
            EdgeKind::PositionOf,
        );
    }

    pub fn add_variable_at_position(&mut self, variable: VariableId, position: PositionId, attrs: OccurrenceAttrs) {
        self.graph.add_edge(
            self.variable_idx[variable.index()],
            self.position_idx[position.index()],
            EdgeKind::VariableAtPosition(attrs),
        );
    }

    pub fn add_variable_at_atom_token(&mut self, variable: VariableId, token: TokenId, attrs: OccurrenceAttrs) {
        self.graph.add_edge(
            self.variable_idx[variable.index()],
            self.token_idx[token.index()],
            EdgeKind::VariableAtAtomToken(attrs),
        );
    }

    pub fn add_variable_at_egd(&mut self, variable: VariableId, egd: EgdId, lhs: bool) {
        self.graph.add_edge(
            self.variable_idx[variable.index()],
            self.egd_idx[egd.index()],
            EdgeKind::VariableAtEgd { lhs },
        );
    }

    pub fn add_variable_at_condition(&mut self, variable: VariableId, condition: ConditionId, lhs: bool) {
        self.graph.add_edge(
            self.variable_idx[variable.index()],
            self.condition_idx[condition.index()],
            EdgeKind::VariableAtCondition {
                left_hand_side_of_an_eq_condition: lhs,
            },
        );
    }

    pub fn add_token_at_position(&mut self, token: TokenId, position: PositionId) {
        self.graph.add_edge(
            self.token_idx[token.index()],
            self.position_idx[position.index()],
            EdgeKind::TokenAtPosition,
        );
    }

    pub fn add_egd_of(&mut self, egd: EgdId, rule: RuleId) {
        self.graph.add_edge(self.egd_idx[egd.index()], self.rule_idx[rule.index()], EdgeKind::EgdOf);
    }

    pub fn add_aggregation_of_rule(&mut self, aggregation: AggregationId, rule: RuleId) {
        self.graph.add_edge(
            self.aggregation_idx[aggregation.index()],
            self.rule_idx[rule.index()],
            EdgeKind::AggregationOfRule,
        );
    }

    pub fn add_contributor_of_aggregation(&mut self, variable: VariableId, aggregation: AggregationId, index: u32) {
        self.graph.add_edge(
            self.variable_idx[variable.index()],
            self.aggregation_idx[aggregation.index()],
            EdgeKind::ContributorOfAggregation { index },
        );
    }

    pub fn add_atom_dependency(&mut self, head_atom: AtomId, body_atom: AtomId) {
        let deps = self.atom_dependencies.entry(head_atom).or_default();
        if !deps.contains(&body_atom) {
            deps.push(body_atom);
        }
    }

    pub fn atom_dependents(&self, head_atom: AtomId) -> &[AtomId] {
        self.atom_dependencies.get(&head_atom).map(Vec::as_slice).unwrap_or(&[])
    }

    // ---- generic C1 traversal helpers ----------------------------------------

    pub fn has_edge_kind(&self, src: NodeRef, dst: NodeRef, pred: impl Fn(&EdgeKind) -> bool) -> bool {
        let (Some(s), Some(d)) = (self.node_index(src), self.node_index(dst)) else {
            return false;
        };
        self.graph.edges_connecting(s, d).any(|e| pred(e.weight()))
    }

    pub fn for_each_edge(&self, mut visit: impl FnMut(NodeRef, NodeRef, &EdgeKind)) {
        for e in self.graph.edge_indices() {
            let (s, d) = self.graph.edge_endpoints(e).expect("edge index from this graph");
            visit(self.graph[s], self.graph[d], &self.graph[e]);
        }
    }

    pub fn filter_edges(&self, pred: impl Fn(NodeRef, NodeRef, &EdgeKind) -> bool) -> Vec<(NodeRef, NodeRef, EdgeKind)> {
        let mut out = Vec::new();
        self.for_each_edge(|s, d, e| {
            if pred(s, d, e) {
                out.push((s, d, *e));
            }
        });
        out
    }

    /// Outgoing edges from `src`, matching `pred`, as `(dst, edge)` pairs.
    pub fn out_edges(&self, src: NodeRef, pred: impl Fn(&EdgeKind) -> bool) -> Vec<(NodeRef, EdgeKind)> {
        let Some(idx) = self.node_index(src) else {
            return Vec::new();
        };
        self.graph
            .edges(idx)
            .filter(|e| pred(e.weight()))
            .map(|e| (self.graph[e.target()], *e.weight()))
            .collect()
    }

    /// Incoming edges into `dst`, matching `pred`, as `(src, edge)` pairs.
    pub fn in_edges(&self, dst: NodeRef, pred: impl Fn(&EdgeKind) -> bool) -> Vec<(NodeRef, EdgeKind)> {
        let Some(idx) = self.node_index(dst) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, petgraph::Direction::Incoming)
            .filter(|e| pred(e.weight()))
            .map(|e| (self.graph[e.source()], *e.weight()))
            .collect()
    }

    fn node_index(&self, node: NodeRef) -> Option<NodeIndex> {
        match node {
            NodeRef::Rule(id) => self.rule_idx.get(id.index()).copied(),
            NodeRef::Atom(id) => self.atom_idx.get(id.index()).copied(),
            NodeRef::Token(id) => self.token_idx.get(id.index()).copied(),
            NodeRef::Variable(id) => self.variable_idx.get(id.index()).copied(),
            NodeRef::Position(id) => self.position_idx.get(id.index()).copied(),
            NodeRef::Egd(id) => self.egd_idx.get(id.index()).copied(),
            NodeRef::Condition(id) => self.condition_idx.get(id.index()).copied(),
            NodeRef::Aggregation(id) => self.aggregation_idx.get(id.index()).copied(),
        }
    }

    // ---- atom classification (spec §3 invariant) ------------------------------

    /// Recomputes `isEDB`/`isIDB` for every atom from its tokens'
    /// locations. Called once by the builder after the parse tree walk.
    pub fn recompute_atom_classification(&mut self) {
        let mut is_head = vec![false; self.atoms.len()];
        let mut is_fact_or_input = vec![false; self.atoms.len()];
        for token in &self.tokens {
            let Some(atom) = token.atom else { continue };
            match token.location {
                TokenLocation::Head => is_head[atom.index()] = true,
                TokenLocation::Fact | TokenLocation::Input => is_fact_or_input[atom.index()] = true,
                _ => {}
            }
        }
        for (i, atom) in self.atoms.iter_mut().enumerate() {
            atom.is_idb = is_head[i];
            atom.is_edb = is_fact_or_input[i];
        }
    }
}
