//! Parse tree produced by the reference front end. Mirrors the shape the
//! spec's parser contract (§6) requires: a flat token list plus, for each
//! construct, the start/end source token.

use crate::shared::models::{AggregationType, LexicalToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

#[derive(Debug, Clone)]
pub enum Term {
    Var(LexicalToken),
    StringLit(LexicalToken),
    IntLit(LexicalToken),
    DoubleLit(LexicalToken),
    BoolLit(LexicalToken),
    /// Parser-recognized aggregation term, e.g. `SUM<Y>`: the keyword
    /// token, its type, and the contributor variable tokens already
    /// split out (spec §9: treated as a structural hint, not
    /// re-derived from raw text by the builder).
    Aggregation {
        keyword: LexicalToken,
        aggregation_type: AggregationType,
        contributors: Vec<LexicalToken>,
    },
    /// An opaque collection literal; its own elements are not walked for
    /// variable/position bookkeeping (spec §4.2: collections count as a
    /// single term).
    Collection(LexicalToken),
}

impl Term {
    pub fn token(&self) -> &LexicalToken {
        match self {
            Term::Var(t) | Term::StringLit(t) | Term::IntLit(t) | Term::DoubleLit(t) | Term::BoolLit(t) => t,
            Term::Aggregation { keyword, .. } => keyword,
            Term::Collection(t) => t,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AtomLiteral {
    pub name_token: LexicalToken,
    pub args: Vec<Term>,
}

#[derive(Debug, Clone)]
pub struct Condition {
    pub lhs: Term,
    pub op: CompOp,
    pub rhs: Term,
}

#[derive(Debug, Clone)]
pub enum BodyLiteral {
    Positive(AtomLiteral),
    Negative(AtomLiteral),
    Cond(Condition),
}

#[derive(Debug, Clone)]
pub enum Head {
    Atom(AtomLiteral),
    /// `Var1 = Var2 :- body.` — an equality-generating dependency. The
    /// third field is the `=` token itself, which carries the `HINT_EGD`
    /// diagnostic.
    Egd(Term, Term, LexicalToken),
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub head: Head,
    pub body: Vec<BodyLiteral>,
    pub start: LexicalToken,
    pub dot: Option<LexicalToken>,
}

#[derive(Debug, Clone)]
pub struct Fact {
    pub atom: AtomLiteral,
    pub start: LexicalToken,
    pub dot: Option<LexicalToken>,
}

#[derive(Debug, Clone)]
pub struct Annotation {
    pub name_token: LexicalToken,
    pub args: Vec<LexicalToken>,
    pub start: LexicalToken,
    pub dot: Option<LexicalToken>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Item {
    Rule(Rule),
    Fact(Fact),
    Annotation(Annotation),
}

#[derive(Debug, Clone, Default)]
pub struct ParseTree {
    pub items: Vec<Item>,
}
