// src/conditions/bracket.rs
//
// The bracket dialect: a sequence of entries, each an optional name with an
// optional `:` or `=`, followed by one balanced parenthesised group.
//
//   entries := entry*
//   entry   := [name [':' | '=']] group
//   group   := '(' (text | group)* ')'

use tracing::{debug, warn};

use crate::types::FilterDefinition;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BracketError {
    #[error("unclosed `(` opened at line {line}")]
    UnclosedGroup { line: usize },

    #[error("stray `)` at line {line}")]
    StrayClose { line: usize },

    #[error("`{name}` at line {line} is not followed by a `( ... )` group")]
    MissingGroup { name: String, line: usize },
}

/// A parsed entry before positional names are assigned.
#[derive(Debug, PartialEq, Eq)]
struct Entry<'a> {
    name: Option<&'a str>,
    group: &'a str,
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn line_at(&self, pos: usize) -> usize {
        self.src[..pos].matches('\n').count() + 1
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// entry := [name [':' | '=']] group
    fn entry(&mut self) -> Result<Entry<'a>, BracketError> {
        let name = match self.peek() {
            Some('(') => None,
            Some(')') => {
                let line = self.line_at(self.pos);
                self.bump();
                return Err(BracketError::StrayClose { line });
            }
            _ => self.name(),
        };

        self.skip_whitespace();
        if matches!(self.peek(), Some(':' | '=')) {
            self.bump();
            self.skip_whitespace();
        }

        if self.peek() != Some('(') {
            return Err(BracketError::MissingGroup {
                name: name.unwrap_or_default().to_string(),
                line: self.line_at(self.pos),
            });
        }
        let group = self.group()?;
        Ok(Entry { name, group })
    }

    /// Everything up to the next delimiter, trimmed. Empty names count as absent.
    fn name(&mut self) -> Option<&'a str> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, ':' | '=' | '(' | ')' | '\n') {
                break;
            }
            self.bump();
        }
        let name = self.src[start..self.pos].trim();
        (!name.is_empty()).then_some(name)
    }

    /// group := '(' (text | group)* ')', returned with its outer parentheses.
    /// Nested groups are tracked with a depth counter so nesting is bounded
    /// only by the input size.
    fn group(&mut self) -> Result<&'a str, BracketError> {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(c) = self.bump() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(&self.src[start..self.pos]);
                    }
                }
                _ => {}
            }
        }
        Err(BracketError::UnclosedGroup {
            line: self.line_at(start),
        })
    }
}

/// Parse the bracket dialect. Malformed entries are logged and dropped; the
/// scan resumes after them.
pub fn parse_entries(raw: &str) -> Vec<FilterDefinition> {
    let mut scanner = Scanner::new(raw);
    let mut filters = Vec::new();

    loop {
        scanner.skip_whitespace();
        if scanner.at_end() {
            break;
        }
        match scanner.entry() {
            Ok(Entry { name, group }) => {
                let name = name
                    .map(str::to_string)
                    .unwrap_or_else(|| FilterDefinition::positional_name(filters.len() + 1));
                debug!(name = %name, "parsed bracket entry");
                filters.push(FilterDefinition::new(name, group.trim()));
            }
            Err(e) => warn!(error = %e, "skipping malformed condition"),
        }
    }
    filters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &str) -> Vec<(String, String)> {
        parse_entries(raw)
            .into_iter()
            .map(|f| (f.name, f.expression))
            .collect()
    }

    fn pair(name: &str, expr: &str) -> (String, String) {
        (name.to_string(), expr.to_string())
    }

    #[test]
    fn named_and_unnamed_entries() {
        let raw = "gainers: ( {cash} ( latest close > 1 day ago close ) )\n\
                   volume=( {cash} ( latest volume > 100000 ) )\n\
                   ( {cash} ( latest rsi( 14 ) > 60 ) )\n\
                   breakout( {cash} ( latest high > 52 week high ) )";
        assert_eq!(
            pairs(raw),
            vec![
                pair("gainers", "( {cash} ( latest close > 1 day ago close ) )"),
                pair("volume", "( {cash} ( latest volume > 100000 ) )"),
                pair("condition_3", "( {cash} ( latest rsi( 14 ) > 60 ) )"),
                pair("breakout", "( {cash} ( latest high > 52 week high ) )"),
            ]
        );
    }

    #[test]
    fn names_may_contain_spaces_and_groups_span_lines() {
        let raw = "top gainers :\n(\n  {cash}\n  ( latest close > 100 )\n)";
        assert_eq!(
            pairs(raw),
            vec![pair(
                "top gainers",
                "(\n  {cash}\n  ( latest close > 100 )\n)"
            )]
        );
    }

    #[test]
    fn stray_close_is_skipped() {
        let raw = ") a: (x) ) (y)";
        assert_eq!(pairs(raw), vec![pair("a", "(x)"), pair("condition_2", "(y)")]);
    }

    #[test]
    fn name_without_group_is_skipped() {
        let raw = "orphan\nb: (y)";
        assert_eq!(pairs(raw), vec![pair("b", "(y)")]);
    }

    #[test]
    fn unclosed_group_drops_the_tail() {
        let raw = "a: (x)\nb: ( ( y )";
        assert_eq!(pairs(raw), vec![pair("a", "(x)")]);
    }

    #[test]
    fn errors_carry_line_numbers() {
        let mut s = Scanner::new("ok: (x)\n\nbad: ( (");
        assert!(s.entry().is_ok());
        s.skip_whitespace();
        assert_eq!(s.entry(), Err(BracketError::UnclosedGroup { line: 3 }));
    }

    #[test]
    fn deeply_nested_group_parses() {
        let depth = 20_000;
        let group = format!("{}{}", "(".repeat(depth), ")".repeat(depth));
        let raw = format!("deep: {}\nnext: (x)", group);
        assert_eq!(pairs(&raw), vec![pair("deep", &group), pair("next", "(x)")]);
    }

    #[test]
    fn deeply_nested_unclosed_group_is_skipped() {
        let raw = format!("ok: (x)\ndeep: {}{}", "(".repeat(20_000), ")".repeat(19_999));
        assert_eq!(pairs(&raw), vec![pair("ok", "(x)")]);
    }

    #[test]
    fn empty_input() {
        assert!(parse_entries("  \n\t ").is_empty());
    }
}
