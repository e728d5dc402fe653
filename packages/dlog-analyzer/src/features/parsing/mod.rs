//! Reference front end: a `logos` lexer plus a small recursive-descent
//! parser standing in for the external grammar/lexer the spec treats as
//! out-of-core (spec §1). Only the AST shapes consumed by
//! [`crate::features::graph_builder`] are public.

pub mod ast;
mod lexer;
mod parser;

pub use ast::{Annotation, AtomLiteral, BodyLiteral, CompOp, Condition, Fact, Head, Item, ParseTree, Rule, Term};
pub use parser::{parse, ParseOutcome};

/// Extracts Vadoc-style doc comment blocks (lines starting with `%%%`)
/// immediately preceding a given source line, matching the
/// `activeBlockComment` bookkeeping of spec §4.2: a block is active only
/// while every preceding comment line carries the Vadoc marker, and is
/// invalidated by any intervening non-Vadoc comment or blank line.
pub fn vadoc_block_before(source: &str, line: u32) -> Option<String> {
    let lines: Vec<&str> = source.lines().collect();
    if line == 0 {
        return None;
    }
    let mut collected = Vec::new();
    let mut idx = line as i64 - 1;
    while idx >= 0 {
        let text = lines.get(idx as usize)?.trim();
        if let Some(rest) = text.strip_prefix("%%%") {
            collected.push(rest.trim().to_string());
            idx -= 1;
            continue;
        }
        break;
    }
    if collected.is_empty() {
        return None;
    }
    collected.reverse();
    Some(collected.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_contiguous_vadoc_lines() {
        let src = "%%% Describes a\n%%% the person atom\nperson(X).";
        assert_eq!(vadoc_block_before(src, 2).as_deref(), Some("Describes a\nthe person atom"));
    }

    #[test]
    fn stops_at_non_vadoc_comment() {
        let src = "% not vadoc\n%%% real doc\nperson(X).";
        assert_eq!(vadoc_block_before(src, 2).as_deref(), Some("real doc"));
    }
}
