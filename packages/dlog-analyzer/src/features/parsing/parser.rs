//! Minimal recursive-descent parser over the `logos` token stream,
//! producing the [`ParseTree`] the program-graph builder (C2) walks.
//! Parse failures are reported as `Diagnostic`s (never panics) and
//! recovery simply skips to the next `.`, matching spec §7's rule that
//! parse errors never prevent the rest of the analysis from running.

use crate::features::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticKind};
use crate::shared::models::{AggregationType, LexicalKind, LexicalToken, Position, Range};

use super::ast::{Annotation, AtomLiteral, BodyLiteral, CompOp, Condition, Fact, Head, Item, ParseTree, Rule, Term};
use super::lexer::{lex, Spanned, Tok};

const AGGREGATION_KEYWORDS: &[(&str, AggregationType)] = &[
    ("sum", AggregationType::Sum),
    ("prod", AggregationType::Prod),
    ("avg", AggregationType::Avg),
    ("count", AggregationType::Count),
    ("min", AggregationType::Min),
    ("max", AggregationType::Max),
    ("set", AggregationType::Set),
    ("list", AggregationType::List),
    ("union", AggregationType::Union),
    ("msum", AggregationType::MSum),
    ("mprod", AggregationType::MProd),
    ("mcount", AggregationType::MCount),
    ("mmin", AggregationType::MMin),
    ("mmax", AggregationType::MMax),
    ("munion", AggregationType::MUnion),
];

pub struct ParseOutcome {
    pub tree: ParseTree,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn parse(source: &str) -> ParseOutcome {
    let tokens = lex(source);
    Parser {
        tokens,
        pos: 0,
        diagnostics: Vec::new(),
    }
    .run()
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Parser {
    fn run(mut self) -> ParseOutcome {
        let mut items = Vec::new();
        while !self.at_end() {
            match self.parse_item() {
                Some(item) => items.push(item),
                None => self.recover_to_dot(),
            }
        }
        ParseOutcome {
            tree: ParseTree { items },
            diagnostics: self.diagnostics,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn peek_tok(&self) -> Option<&Tok> {
        self.peek().map(|s| &s.tok)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, pred: impl Fn(&Tok) -> bool, what: &str) -> Option<Spanned> {
        match self.peek_tok() {
            Some(t) if pred(t) => self.advance(),
            _ => {
                self.error(format!("expected {what}"));
                None
            }
        }
    }

    fn error(&mut self, message: String) {
        let range = self
            .peek()
            .map(|s| Range::new(Position::new(s.line, s.column), Position::new(s.line, s.column + s.text.chars().count() as u32)))
            .unwrap_or_default();
        self.diagnostics.push(DiagnosticBuilder::new(DiagnosticKind::ParseError, range).with("message", message).build());
    }

    fn recover_to_dot(&mut self) {
        if self.peek_tok().is_none() {
            return;
        }
        while let Some(t) = self.peek_tok() {
            let was_dot = matches!(t, Tok::Dot);
            self.advance();
            if was_dot {
                break;
            }
        }
    }

    fn spanned_to_lexical(s: &Spanned, kind: LexicalKind) -> LexicalToken {
        LexicalToken::new(s.line, s.column, s.text.clone(), kind)
    }

    fn parse_item(&mut self) -> Option<Item> {
        match self.peek_tok()? {
            Tok::At => self.parse_annotation().map(Item::Annotation),
            _ => self.parse_rule_or_fact(),
        }
    }

    fn parse_annotation(&mut self) -> Option<Annotation> {
        let at = self.advance()?;
        let start = Self::spanned_to_lexical(&at, LexicalKind::At);
        let name_tok = self.expect(|t| matches!(t, Tok::Atom(_)), "annotation name")?;
        let name_token = Self::spanned_to_lexical(&name_tok, LexicalKind::Annotation);
        self.expect(|t| matches!(t, Tok::LParen), "'('")?;
        let mut args = Vec::new();
        if !matches!(self.peek_tok(), Some(Tok::RParen)) {
            loop {
                let arg = self.expect(
                    |t| matches!(t, Tok::Str(_) | Tok::Int(_) | Tok::Double(_) | Tok::Atom(_) | Tok::Variable(_)),
                    "annotation argument",
                )?;
                let kind = match &arg.tok {
                    Tok::Str(_) => LexicalKind::String,
                    Tok::Int(_) => LexicalKind::Int,
                    Tok::Double(_) => LexicalKind::Double,
                    Tok::Variable(_) => LexicalKind::Variable,
                    _ => LexicalKind::Atom,
                };
                args.push(Self::spanned_to_lexical(&arg, kind));
                if matches!(self.peek_tok(), Some(Tok::Comma)) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(|t| matches!(t, Tok::RParen), "')'")?;
        let dot = self.expect(|t| matches!(t, Tok::Dot), "'.'").map(|s| Self::spanned_to_lexical(&s, LexicalKind::Unknown));
        Some(Annotation {
            name_token,
            args,
            start,
            dot,
            comment: None,
        })
    }

    fn parse_rule_or_fact(&mut self) -> Option<Item> {
        let start_tok = self.peek()?.clone();
        let start = Self::spanned_to_lexical(&start_tok, LexicalKind::Atom);

        // EGD head: `Var = Var :- body.`
        if matches!(self.peek_tok(), Some(Tok::Variable(_))) && matches!(self.tokens.get(self.pos + 1).map(|s| &s.tok), Some(Tok::Eq)) {
            let lhs_tok = self.advance()?;
            let eq_tok = self.advance()?; // '='
            let rhs_tok = self.expect(|t| matches!(t, Tok::Variable(_)), "variable")?;
            self.expect(|t| matches!(t, Tok::ImpliedBy), "':-'")?;
            let body = self.parse_body()?;
            let dot = self.expect(|t| matches!(t, Tok::Dot), "'.'").map(|s| Self::spanned_to_lexical(&s, LexicalKind::Unknown));
            return Some(Item::Rule(Rule {
                head: Head::Egd(
                    Term::Var(Self::spanned_to_lexical(&lhs_tok, LexicalKind::Variable)),
                    Term::Var(Self::spanned_to_lexical(&rhs_tok, LexicalKind::Variable)),
                    Self::spanned_to_lexical(&eq_tok, LexicalKind::Unknown),
                ),
                body,
                start,
                dot,
            }));
        }

        let head_atom = self.parse_atom_literal()?;
        match self.peek_tok() {
            Some(Tok::ImpliedBy) => {
                self.advance();
                let body = self.parse_body()?;
                let dot = self.expect(|t| matches!(t, Tok::Dot), "'.'").map(|s| Self::spanned_to_lexical(&s, LexicalKind::Unknown));
                Some(Item::Rule(Rule {
                    head: Head::Atom(head_atom),
                    body,
                    start,
                    dot,
                }))
            }
            Some(Tok::Dot) => {
                let dot_tok = self.advance().unwrap();
                Some(Item::Fact(Fact {
                    atom: head_atom,
                    start,
                    dot: Some(Self::spanned_to_lexical(&dot_tok, LexicalKind::Unknown)),
                }))
            }
            _ => {
                self.error("expected ':-' or '.'".to_string());
                None
            }
        }
    }

    fn parse_body(&mut self) -> Option<Vec<BodyLiteral>> {
        let mut body = Vec::new();
        loop {
            body.push(self.parse_body_literal()?);
            if matches!(self.peek_tok(), Some(Tok::Comma)) {
                self.advance();
                continue;
            }
            break;
        }
        Some(body)
    }

    fn parse_body_literal(&mut self) -> Option<BodyLiteral> {
        if matches!(self.peek_tok(), Some(Tok::Not)) {
            self.advance();
            let atom = self.parse_atom_literal()?;
            return Some(BodyLiteral::Negative(atom));
        }
        // Equality/comparison condition: Term op Term, where Term isn't
        // followed by '(' (which would make it an atom call).
        if self.looks_like_condition() {
            let lhs = self.parse_term()?;
            let op = self.parse_comp_op()?;
            let rhs = self.parse_term()?;
            return Some(BodyLiteral::Cond(Condition { lhs, op, rhs }));
        }
        self.parse_atom_literal().map(BodyLiteral::Positive)
    }

    fn looks_like_condition(&self) -> bool {
        match self.peek_tok() {
            Some(Tok::Variable(_)) => !matches!(self.tokens.get(self.pos + 1).map(|s| &s.tok), Some(Tok::LParen)),
            _ => false,
        }
    }

    fn parse_comp_op(&mut self) -> Option<CompOp> {
        let op = match self.peek_tok() {
            Some(Tok::Eq) => CompOp::Eq,
            Some(Tok::Neq) => CompOp::Neq,
            Some(Tok::Lt) => CompOp::Lt,
            Some(Tok::Lte) => CompOp::Lte,
            Some(Tok::Gt) => CompOp::Gt,
            Some(Tok::Gte) => CompOp::Gte,
            _ => {
                self.error("expected a comparison operator".to_string());
                return None;
            }
        };
        self.advance();
        Some(op)
    }

    fn parse_atom_literal(&mut self) -> Option<AtomLiteral> {
        let name = self.expect(|t| matches!(t, Tok::Atom(_)), "atom name")?;
        let name_token = Self::spanned_to_lexical(&name, LexicalKind::Atom);
        self.expect(|t| matches!(t, Tok::LParen), "'('")?;
        let mut args = Vec::new();
        if !matches!(self.peek_tok(), Some(Tok::RParen)) {
            loop {
                args.push(self.parse_term()?);
                if matches!(self.peek_tok(), Some(Tok::Comma)) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(|t| matches!(t, Tok::RParen), "')'")?;
        Some(AtomLiteral { name_token, args })
    }

    fn parse_term(&mut self) -> Option<Term> {
        match self.peek_tok()?.clone() {
            Tok::Variable(_) => {
                let t = self.advance().unwrap();
                Some(Term::Var(Self::spanned_to_lexical(&t, LexicalKind::Variable)))
            }
            Tok::Str(_) => {
                let t = self.advance().unwrap();
                Some(Term::StringLit(Self::spanned_to_lexical(&t, LexicalKind::String)))
            }
            Tok::Int(_) => {
                let t = self.advance().unwrap();
                Some(Term::IntLit(Self::spanned_to_lexical(&t, LexicalKind::Int)))
            }
            Tok::Double(_) => {
                let t = self.advance().unwrap();
                Some(Term::DoubleLit(Self::spanned_to_lexical(&t, LexicalKind::Double)))
            }
            Tok::True | Tok::False => {
                let t = self.advance().unwrap();
                Some(Term::BoolLit(Self::spanned_to_lexical(&t, LexicalKind::Boolean)))
            }
            Tok::LBracket => self.parse_collection(),
            Tok::Atom(name) => {
                if let Some((_, ty)) = AGGREGATION_KEYWORDS.iter().find(|(kw, _)| *kw == name.to_lowercase()) {
                    self.parse_aggregation(*ty)
                } else {
                    self.error(format!("unexpected atom '{name}' in term position"));
                    None
                }
            }
            other => {
                self.error(format!("unexpected token {other:?} in term position"));
                None
            }
        }
    }

    fn parse_collection(&mut self) -> Option<Term> {
        let open = self.advance().unwrap();
        let mut depth = 1usize;
        while depth > 0 {
            match self.advance()?.tok {
                Tok::LBracket => depth += 1,
                Tok::RBracket => depth -= 1,
                _ => {}
            }
        }
        Some(Term::Collection(Self::spanned_to_lexical(&open, LexicalKind::Unknown)))
    }

    /// Parses the ad-hoc `KEYWORD<contrib,...>` aggregation term, where
    /// the parser — not the builder — strips the `<`/`>` delimiters
    /// (spec §9 Open Question).
    fn parse_aggregation(&mut self, aggregation_type: AggregationType) -> Option<Term> {
        let keyword_tok = self.advance().unwrap();
        let keyword = Self::spanned_to_lexical(&keyword_tok, LexicalKind::Atom);
        let mut contributors = Vec::new();
        if matches!(self.peek_tok(), Some(Tok::Lt)) {
            self.advance();
            if aggregation_type.has_contributors() {
                loop {
                    let c = self.expect(|t| matches!(t, Tok::Variable(_)), "contributor variable")?;
                    contributors.push(Self::spanned_to_lexical(&c, LexicalKind::Variable));
                    if matches!(self.peek_tok(), Some(Tok::Comma)) {
                        self.advance();
                        continue;
                    }
                    break;
                }
            }
            self.expect(|t| matches!(t, Tok::Gt), "'>'")?;
        }
        Some(Term::Aggregation {
            keyword,
            aggregation_type,
            contributors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_fact() {
        let out = parse("a(1).");
        assert!(out.diagnostics.is_empty());
        assert_eq!(out.tree.items.len(), 1);
        assert!(matches!(out.tree.items[0], Item::Fact(_)));
    }

    #[test]
    fn parses_a_rule_with_join() {
        let out = parse("t(X,Z):-s(X,Y),t(Y,Z).");
        assert!(out.diagnostics.is_empty());
        assert_eq!(out.tree.items.len(), 1);
        match &out.tree.items[0] {
            Item::Rule(r) => assert_eq!(r.body.len(), 2),
            _ => panic!("expected rule"),
        }
    }

    #[test]
    fn parses_an_egd_head() {
        let out = parse("P1=P2:-a(P1,C1),a(P2,C2),b(C1,C2).");
        assert!(out.diagnostics.is_empty());
        match &out.tree.items[0] {
            Item::Rule(r) => assert!(matches!(r.head, Head::Egd(_, _, _))),
            _ => panic!("expected rule"),
        }
    }

    #[test]
    fn parses_an_annotation() {
        let out = parse("@output(\"a\").");
        assert!(out.diagnostics.is_empty());
        assert!(matches!(out.tree.items[0], Item::Annotation(_)));
    }

    #[test]
    fn recovers_after_a_malformed_item() {
        let out = parse("a(.\nb(1).");
        assert!(!out.diagnostics.is_empty());
        assert!(out.tree.items.iter().any(|i| matches!(i, Item::Fact(_))));
    }

    #[test]
    fn parses_a_non_equality_comparison_condition() {
        let out = parse("p(X):-a(X,Y),X<Y.");
        assert!(out.diagnostics.is_empty());
        match &out.tree.items[0] {
            Item::Rule(r) => match &r.body[1] {
                BodyLiteral::Cond(c) => assert!(matches!(c.op, CompOp::Lt)),
                _ => panic!("expected a condition literal"),
            },
            _ => panic!("expected rule"),
        }
    }
}
