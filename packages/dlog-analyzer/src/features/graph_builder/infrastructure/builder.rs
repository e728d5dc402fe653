//! Walks a [`ParseTree`] once, populating a [`ProgramGraph`] and the
//! annotation-derived [`SymbolTables`] (spec §4.2). Every top-level item —
//! rule, fact or annotation — gets its own [`RuleId`] so that every token
//! still has an owning construct to point back to, even when that
//! construct isn't a Datalog rule in the strict sense.

use rustc_hash::FxHashSet;
use tracing::instrument;

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::features::parsing::{vadoc_block_before, Annotation, AtomLiteral, BodyLiteral, CompOp, Condition, Fact, Head, Item, ParseTree, Rule, Term};
use crate::shared::models::{
    AggregationType, AtomId, ConditionNode, LexicalToken, PositionId, ProgramGraph, Range, RuleId, RuleNode, TokenId, TokenLocation, TokenNode,
    TokenOfTarget,
};

use super::super::domain::{BindingInfo, MappingEntry, SymbolTables};

const KNOWN_COLUMN_TYPES: &[&str] = &["string", "int", "integer", "double", "boolean", "bool", "date"];

pub struct BuildOutput {
    pub graph: ProgramGraph,
    pub tables: SymbolTables,
    pub diagnostics: Vec<Diagnostic>,
}

#[instrument(skip_all, fields(items = tree.items.len()))]
pub fn build(source: &str, tree: &ParseTree) -> BuildOutput {
    let mut builder = GraphBuilder {
        source,
        graph: ProgramGraph::new(),
        tables: SymbolTables::default(),
        diagnostics: Vec::new(),
        position_of_added: FxHashSet::default(),
        atom_of_added: FxHashSet::default(),
    };
    for item in &tree.items {
        match item {
            Item::Rule(rule) => builder.handle_rule(rule),
            Item::Fact(fact) => builder.handle_fact(fact),
            Item::Annotation(annotation) => builder.handle_annotation(annotation),
        }
    }
    builder.graph.recompute_atom_classification();
    BuildOutput {
        graph: builder.graph,
        tables: builder.tables,
        diagnostics: builder.diagnostics,
    }
}

struct GraphBuilder<'a> {
    source: &'a str,
    graph: ProgramGraph,
    tables: SymbolTables,
    diagnostics: Vec<Diagnostic>,
    position_of_added: FxHashSet<(AtomId, PositionId)>,
    atom_of_added: FxHashSet<(AtomId, RuleId)>,
}

impl<'a> GraphBuilder<'a> {
    fn item_range(start: &LexicalToken, dot: &Option<LexicalToken>) -> Range {
        Range::new(start.start(), dot.as_ref().map(LexicalToken::end).unwrap_or_else(|| start.end()))
    }

    fn record_vadoc(&mut self, start: &LexicalToken, atom_name: &str) {
        if atom_name.is_empty() || self.tables.atom_vadoc.contains_key(atom_name) {
            return;
        }
        if let Some(block) = vadoc_block_before(self.source, start.line) {
            self.tables.atom_vadoc.insert(atom_name.to_string(), block);
        }
    }

    fn link_atom_of(&mut self, atom: AtomId, rule: RuleId) {
        if self.atom_of_added.insert((atom, rule)) {
            self.graph.add_atom_of(atom, rule);
        }
    }

    fn link_position(&mut self, atom: AtomId, atom_name: &str, index: u32) -> PositionId {
        let position = self.graph.add_position_if_missing(atom_name, index);
        if self.position_of_added.insert((atom, position)) {
            self.graph.add_position_of(atom, position);
        }
        position
    }

    fn push_token(&mut self, token: &LexicalToken, location: TokenLocation, rule: RuleId) -> TokenId {
        self.graph.add_token(TokenNode::new(token.clone(), location, rule))
    }

    // ---- rules and facts ---------------------------------------------------

    fn handle_rule(&mut self, rule: &Rule) {
        let range = Self::item_range(&rule.start, &rule.dot);
        let rule_id = self.graph.add_rule(RuleNode::new(range));
        self.graph.update_rule(rule_id, |r| r.is_rule = true);

        match &rule.head {
            Head::Atom(atom_lit) => {
                self.record_vadoc(&rule.start, &atom_lit.name_token.text);
                self.visit_atom_occurrence(atom_lit, rule_id, TokenLocation::Head, None, false);
            }
            Head::Egd(lhs, rhs, eq_token) => self.visit_egd_head(lhs, rhs, eq_token, rule_id),
        }

        let mut body_conjunctive_query_term = 0u32;
        for literal in &rule.body {
            self.visit_body_literal(literal, rule_id, body_conjunctive_query_term);
            body_conjunctive_query_term += 1;
        }

        // Temporal propagation (C5) walks a head→body atom digraph built
        // here rather than re-deriving it from tokens at analysis time.
        if let Head::Atom(atom_lit) = &rule.head {
            let head_atom = self.graph.add_atom_if_missing(&atom_lit.name_token.text);
            for literal in &rule.body {
                if let Some(name) = Self::body_literal_atom_name(literal) {
                    let body_atom = self.graph.add_atom_if_missing(name);
                    self.graph.add_atom_dependency(head_atom, body_atom);
                }
            }
        }
    }

    fn body_literal_atom_name(literal: &BodyLiteral) -> Option<&str> {
        match literal {
            BodyLiteral::Positive(a) | BodyLiteral::Negative(a) => Some(&a.name_token.text),
            BodyLiteral::Cond(_) => None,
        }
    }

    fn handle_fact(&mut self, fact: &Fact) {
        let range = Self::item_range(&fact.start, &fact.dot);
        let rule_id = self.graph.add_rule(RuleNode::new(range));
        self.record_vadoc(&fact.start, &fact.atom.name_token.text);
        self.visit_atom_occurrence(&fact.atom, rule_id, TokenLocation::Fact, None, false);

        for term in &fact.atom.args {
            if let Term::Var(tok) = term {
                self.diagnostics
                    .push(DiagnosticBuilder::new(DiagnosticKind::ErrNoVariablesInFact, tok.range()).with("variable", tok.text.clone()).build());
            }
        }
    }

    // ---- annotations ---------------------------------------------------------

    fn handle_annotation(&mut self, annotation: &Annotation) {
        let name = annotation.name_token.text.to_lowercase();
        let expected = match name.as_str() {
            "output" | "input" | "module" | "post" | "temporal" => 1,
            "bind" | "qbind" | "mapping" => 4,
            _ => return,
        };

        let range = Self::item_range(&annotation.start, &annotation.dot);
        let rule_id = self.graph.add_rule(RuleNode::new(range));

        if annotation.args.len() != expected {
            self.diagnostics.push(
                DiagnosticBuilder::new(DiagnosticKind::ErrAnnotationArity, annotation.name_token.range())
                    .with("annotation", name.clone())
                    .with("expected", expected.to_string())
                    .with("actual", annotation.args.len().to_string())
                    .build(),
            );
            return;
        }

        let values: Vec<String> = annotation.args.iter().map(|t| unquote(&t.text)).collect();
        for (tok, value) in annotation.args.iter().zip(&values) {
            if value.is_empty() {
                self.diagnostics.push(DiagnosticBuilder::new(DiagnosticKind::ErrEmptyDefinition, tok.range()).build());
            }
        }

        match name.as_str() {
            "output" => {
                let atom_name = values[0].clone();
                self.record_vadoc(&annotation.start, &atom_name);
                self.tables.output_declarations.push((atom_name.clone(), annotation.args[0].clone()));
                self.record_annotation_token(&annotation.args[0], rule_id, TokenLocation::Output, &atom_name);
            }
            "input" => {
                let atom_name = values[0].clone();
                self.record_vadoc(&annotation.start, &atom_name);
                self.tables.input_atom_names.insert(atom_name.clone());
                self.record_annotation_token(&annotation.args[0], rule_id, TokenLocation::Input, &atom_name);
            }
            "module" => {
                self.tables.module_names.insert(values[0].clone());
            }
            "temporal" => {
                self.tables.temporal_atom_names.insert(values[0].clone());
            }
            "bind" | "qbind" => {
                let atom_name = values[0].clone();
                self.tables.atom_bindings.insert(atom_name.clone());
                self.tables.bindings.entry(atom_name.clone()).or_default().push(BindingInfo {
                    data_source: values[1].clone(),
                    outermost_container: values[2].clone(),
                    inner: values[3].clone(),
                    is_query_bind: name == "qbind",
                    token: annotation.args[0].clone(),
                });
                self.record_annotation_token(&annotation.args[0], rule_id, TokenLocation::Binding, &atom_name);
            }
            "mapping" => {
                let atom_name = values[0].clone();
                match values[1].parse::<u32>() {
                    Ok(position) => {
                        let column_type = values[3].clone();
                        if !KNOWN_COLUMN_TYPES.contains(&column_type.to_lowercase().as_str()) {
                            self.diagnostics.push(
                                DiagnosticBuilder::new(DiagnosticKind::ErrUnknownMappingColumnType, annotation.args[3].range())
                                    .with("column_type", column_type.clone())
                                    .build(),
                            );
                        }
                        self.tables.mappings.entry(atom_name.clone()).or_default().push(MappingEntry {
                            position,
                            column_name: values[2].clone(),
                            column_type,
                            token: annotation.args[0].clone(),
                        });
                    }
                    Err(_) => {
                        self.diagnostics.push(
                            DiagnosticBuilder::new(DiagnosticKind::ErrMappingPositionMustBeIndex, annotation.args[1].range())
                                .with("position", values[1].clone())
                                .build(),
                        );
                    }
                }
                self.record_annotation_token(&annotation.args[0], rule_id, TokenLocation::Mapping, &atom_name);
            }
            "post" => {
                let atom_name = values[0].clone();
                self.record_annotation_token(&annotation.args[0], rule_id, TokenLocation::Post, &atom_name);
            }
            _ => unreachable!("filtered above"),
        }
    }

    fn record_annotation_token(&mut self, name_token: &LexicalToken, rule_id: RuleId, location: TokenLocation, atom_name: &str) {
        let atom_id = self.graph.add_atom_if_missing(atom_name);
        self.link_atom_of(atom_id, rule_id);
        let token_id = self.push_token(name_token, location, rule_id);
        self.graph.update_token(token_id, |t| t.atom = Some(atom_id));
        self.graph.add_token_of(token_id, TokenOfTarget::Atom(atom_id));
    }

    // ---- EGD heads -------------------------------------------------------------

    fn visit_egd_head(&mut self, lhs: &Term, rhs: &Term, eq_token: &LexicalToken, rule_id: RuleId) {
        let egd_id = self.graph.add_egd(rule_id);
        self.graph.add_egd_of(egd_id, rule_id);
        self.diagnostics.push(
            DiagnosticBuilder::new(DiagnosticKind::HintEgd, eq_token.range())
                .with("lhs", lhs.token().text.clone())
                .with("rhs", rhs.token().text.clone())
                .build(),
        );
        self.visit_egd_term(lhs, rule_id, egd_id, true);
        self.visit_egd_term(rhs, rule_id, egd_id, false);
    }

    fn visit_egd_term(&mut self, term: &Term, rule_id: RuleId, egd_id: crate::shared::models::EgdId, lhs: bool) {
        if let Term::Var(tok) = term {
            let var_id = self.graph.add_variable_if_missing(&tok.text, rule_id);
            let token_id = self.push_token(tok, TokenLocation::Head, rule_id);
            self.graph.update_token(token_id, |t| t.egd = Some(egd_id));
            self.graph.add_token_of(token_id, TokenOfTarget::Egd(egd_id));
            self.graph.add_variable_at_egd(var_id, egd_id, lhs);
        }
    }

    // ---- body literals ------------------------------------------------------------

    fn visit_body_literal(&mut self, literal: &BodyLiteral, rule_id: RuleId, bcqt: u32) {
        match literal {
            BodyLiteral::Positive(atom_lit) => {
                self.visit_atom_occurrence(atom_lit, rule_id, TokenLocation::Body, Some(bcqt), false);
            }
            BodyLiteral::Negative(atom_lit) => {
                self.visit_atom_occurrence(atom_lit, rule_id, TokenLocation::Body, Some(bcqt), true);
            }
            BodyLiteral::Cond(condition) => self.visit_condition(condition, rule_id),
        }
    }

    fn visit_condition(&mut self, condition: &Condition, rule_id: RuleId) {
        let text = format!("{}{}{}", condition.lhs.token().text, op_text(condition.op), condition.rhs.token().text);
        let condition_id = self.graph.add_condition(ConditionNode {
            rule: rule_id,
            text,
            equality: matches!(condition.op, CompOp::Eq),
        });
        self.visit_condition_term(&condition.lhs, rule_id, condition_id, true);
        self.visit_condition_term(&condition.rhs, rule_id, condition_id, false);
    }

    fn visit_condition_term(&mut self, term: &Term, rule_id: RuleId, condition_id: crate::shared::models::ConditionId, lhs: bool) {
        if let Term::Var(tok) = term {
            let var_id = self.graph.add_variable_if_missing(&tok.text, rule_id);
            let token_id = self.push_token(tok, TokenLocation::Body, rule_id);
            self.graph.add_token_of(token_id, TokenOfTarget::Condition(condition_id));
            self.graph.add_variable_at_condition(var_id, condition_id, lhs);
        }
    }

    // ---- atoms and terms -----------------------------------------------------------

    fn visit_atom_occurrence(&mut self, atom_lit: &AtomLiteral, rule_id: RuleId, location: TokenLocation, bcqt: Option<u32>, negated: bool) -> AtomId {
        let atom_name = atom_lit.name_token.text.clone();
        let atom_id = self.graph.add_atom_if_missing(&atom_name);
        self.link_atom_of(atom_id, rule_id);

        let occurrence_token = self.push_token(&atom_lit.name_token, location, rule_id);
        self.graph.update_token(occurrence_token, |t| t.atom = Some(atom_id));
        self.graph.add_token_of(occurrence_token, TokenOfTarget::Atom(atom_id));

        for (index, term) in atom_lit.args.iter().enumerate() {
            self.visit_term(term, rule_id, atom_id, &atom_name, index as u32, location, bcqt, negated, occurrence_token);
        }
        atom_id
    }

    #[allow(clippy::too_many_arguments)]
    fn visit_term(
        &mut self,
        term: &Term,
        rule_id: RuleId,
        atom_id: AtomId,
        atom_name: &str,
        term_index: u32,
        location: TokenLocation,
        bcqt: Option<u32>,
        negated: bool,
        occurrence_token: TokenId,
    ) {
        match term {
            Term::Var(tok) => {
                let var_id = self.graph.add_variable_if_missing(&tok.text, rule_id);
                let token_id = self.push_token(tok, location, rule_id);
                self.graph.update_token(token_id, |t| {
                    t.atom = Some(atom_id);
                    t.term_index = Some(term_index);
                });
                self.graph.add_token_of(token_id, TokenOfTarget::Variable(var_id));

                let position_id = self.link_position(atom_id, atom_name, term_index);
                let attrs = crate::shared::models::OccurrenceAttrs {
                    head: matches!(location, TokenLocation::Head),
                    body_conjunctive_query_term: bcqt,
                    negated,
                };
                self.graph.add_variable_at_position(var_id, position_id, attrs);
                self.graph.add_variable_at_atom_token(var_id, occurrence_token, attrs);
            }
            Term::StringLit(tok) | Term::IntLit(tok) | Term::DoubleLit(tok) | Term::BoolLit(tok) | Term::Collection(tok) => {
                let token_id = self.push_token(tok, location, rule_id);
                self.graph.update_token(token_id, |t| {
                    t.atom = Some(atom_id);
                    t.term_index = Some(term_index);
                    t.is_literal = true;
                });
                let position_id = self.link_position(atom_id, atom_name, term_index);
                self.graph.add_token_at_position(token_id, position_id);
            }
            Term::Aggregation {
                keyword,
                aggregation_type,
                contributors,
            } => {
                self.visit_aggregation(keyword, *aggregation_type, contributors, rule_id, atom_id, atom_name, term_index, location);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn visit_aggregation(
        &mut self,
        keyword: &LexicalToken,
        aggregation_type: AggregationType,
        contributors: &[LexicalToken],
        rule_id: RuleId,
        atom_id: AtomId,
        atom_name: &str,
        term_index: u32,
        location: TokenLocation,
    ) {
        let aggregation_id = self.graph.add_aggregation(crate::shared::models::AggregationNode {
            rule: rule_id,
            text: keyword.text.clone(),
            aggregation_type,
        });
        self.graph.add_aggregation_of_rule(aggregation_id, rule_id);

        let keyword_token = self.push_token(keyword, location, rule_id);
        self.graph.update_token(keyword_token, |t| {
            t.atom = Some(atom_id);
            t.term_index = Some(term_index);
        });
        self.graph.add_token_of(keyword_token, TokenOfTarget::Aggregation(aggregation_id));

        let position_id = self.link_position(atom_id, atom_name, term_index);
        self.graph.add_token_at_position(keyword_token, position_id);

        for (index, contributor) in contributors.iter().enumerate() {
            let var_id = self.graph.add_variable_if_missing(&contributor.text, rule_id);
            self.graph.add_contributor_of_aggregation(var_id, aggregation_id, index as u32);
            let token_id = self.push_token(contributor, location, rule_id);
            self.graph.add_token_of(token_id, TokenOfTarget::Variable(var_id));
        }
    }
}

fn op_text(op: CompOp) -> &'static str {
    match op {
        CompOp::Eq => "=",
        CompOp::Neq => "!=",
        CompOp::Lt => "<",
        CompOp::Lte => "<=",
        CompOp::Gt => ">",
        CompOp::Gte => ">=",
    }
}

fn unquote(text: &str) -> String {
    let t = text.trim();
    match t.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) {
        Some(inner) => inner.to_string(),
        None => t.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::parse;

    fn build_source(src: &str) -> BuildOutput {
        let outcome = parse(src);
        build(src, &outcome.tree)
    }

    #[test]
    fn fact_produces_edb_atom() {
        let out = build_source("person(\"alice\").");
        let atom = out.graph.atom_id("person").expect("atom recorded");
        assert!(out.graph.atom(atom).is_edb);
        assert!(!out.graph.atom(atom).is_idb);
    }

    #[test]
    fn rule_head_produces_idb_atom() {
        let out = build_source("parent_of(X,Y):-child_of(Y,X).");
        let head = out.graph.atom_id("parent_of").expect("head atom recorded");
        assert!(out.graph.atom(head).is_idb);
        let body = out.graph.atom_id("child_of").expect("body atom recorded");
        assert!(!out.graph.atom(body).is_idb);
    }

    #[test]
    fn variable_in_fact_is_flagged() {
        let out = build_source("person(X).");
        assert!(out
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticKind::ErrNoVariablesInFact.code()));
    }

    #[test]
    fn egd_head_emits_hint_and_variable_edges() {
        let out = build_source("P1=P2:-a(P1,C1),a(P2,C2),b(C1,C2).");
        assert!(out.diagnostics.iter().any(|d| d.code == DiagnosticKind::HintEgd.code()));
        assert_eq!(out.graph.egds.len(), 1);
    }

    #[test]
    fn annotations_populate_symbol_tables() {
        let out = build_source("@output(\"person\").\n@input(\"raw_person\").\n@bind(\"raw_person\",\"csv\",\"folder\",\"file.csv\").");
        assert_eq!(out.tables.output_atom_names(), ["person".to_string()].into_iter().collect());
        assert!(out.tables.input_atom_names.contains("raw_person"));
        assert!(out.tables.atom_bindings.contains("raw_person"));
    }

    #[test]
    fn annotation_arity_mismatch_is_flagged() {
        let out = build_source("@output(\"a\",\"b\").");
        assert!(out.diagnostics.iter().any(|d| d.code == DiagnosticKind::ErrAnnotationArity.code()));
    }

    #[test]
    fn duplicate_output_declarations_are_all_recorded() {
        let out = build_source("@output(\"a\").\n@output(\"a\").");
        assert_eq!(out.tables.output_declarations.iter().filter(|(n, _)| n == "a").count(), 2);
    }

    #[test]
    fn mapping_with_non_numeric_position_is_flagged() {
        let out = build_source("@mapping(\"a\",\"first\",\"name\",\"string\").");
        assert!(out.diagnostics.iter().any(|d| d.code == DiagnosticKind::ErrMappingPositionMustBeIndex.code()));
    }
}
