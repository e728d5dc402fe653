//! Reference lexer for the Datalog± surface syntax, built on `logos` the
//! way `dhilipsiva-lojban-NeSy` tokenizes its own rule language. This is
//! explicitly *not* part of the analyzer's hard subsystem (spec §1): it
//! exists only so `analyze()` has something to call end-to-end in tests.

use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"%[^\n]*")]
pub enum Tok {
    #[token(":-")]
    ImpliedBy,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("!=")]
    Neq,
    #[token("<=")]
    Lte,
    #[token(">=")]
    Gte,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Eq,
    #[token("@")]
    At,
    #[token("not")]
    Not,
    #[token("true")]
    True,
    #[token("false")]
    False,

    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice().to_string())]
    Str(String),

    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().to_string())]
    Double(String),

    #[regex(r"[0-9]+", |lex| lex.slice().to_string())]
    Int(String),

    /// Upper-case-or-underscore leading identifier: a variable.
    #[regex(r"[A-Z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Variable(String),

    /// Lower-case leading identifier: an atom name or annotation keyword.
    #[regex(r"[a-z][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Atom(String),
}

/// A lexed token plus its source span, kept alongside the logical `Tok`
/// so the parser can report ranges without re-scanning text.
#[derive(Debug, Clone)]
pub struct Spanned {
    pub tok: Tok,
    pub line: u32,
    pub column: u32,
    pub text: String,
}

/// Tokenizes `source`, tracking line/column manually since `logos` only
/// reports byte offsets.
pub fn lex(source: &str) -> Vec<Spanned> {
    let mut out = Vec::new();
    let mut lexer = Tok::lexer(source);
    let mut line = 0u32;
    let mut line_start = 0usize;
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        // Advance line/column bookkeeping over any text consumed as
        // whitespace/comments before this token, and over the token
        // itself if it spans a newline (it never should for this
        // grammar, but guard anyway).
        for (i, ch) in source[..span.start].char_indices().skip(count_chars(&source[..line_start])) {
            if ch == '\n' {
                line += 1;
                line_start = i + 1;
            }
        }
        let column = (span.start - line_start) as u32;
        if let Ok(tok) = result {
            out.push(Spanned {
                text: lexer.slice().to_string(),
                tok,
                line,
                column,
            });
        }
    }
    out
}

fn count_chars(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_a_simple_fact() {
        let toks = lex("a(1).");
        assert_eq!(toks.len(), 5);
        assert!(matches!(toks[0].tok, Tok::Atom(ref s) if s == "a"));
        assert!(matches!(toks[1].tok, Tok::LParen));
        assert!(matches!(toks[2].tok, Tok::Int(ref s) if s == "1"));
    }

    #[test]
    fn tracks_line_numbers_across_newlines() {
        let toks = lex("a(1).\nb(2).");
        let b = toks.iter().find(|t| matches!(&t.tok, Tok::Atom(s) if s == "b")).unwrap();
        assert_eq!(b.line, 1);
    }

    #[test]
    fn multi_char_comparison_operators_take_priority_over_their_prefixes() {
        let toks = lex("X<=Y,X!=Y,X>=Y");
        let ops: Vec<&Tok> = toks.iter().map(|t| &t.tok).filter(|t| !matches!(t, Tok::Variable(_) | Tok::Comma)).collect();
        assert_eq!(ops, vec![&Tok::Lte, &Tok::Neq, &Tok::Gte]);
    }
}
