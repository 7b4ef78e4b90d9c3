// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Shared scanning helpers for JavaScript source.
//!
//! [`Cursor`] walks a statement by hand where the grammar needs more than a
//! regex: comments between parts, nested destructuring, balanced brackets.
//! The `*_len` functions back the recognizers every tokenizer in this crate
//! puts first (skip regions) and last (words).

use modbridge_lexer::literals::is_id_start;
use modbridge_lexer::{identifier_len, parse_string_at, skip_region_after};

/// Keywords after which `/` starts a regex literal rather than a division
const REGEX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

/// Characters that keep an expression going onto the next line
const TRAILING_CONTINUATION: &str = "=+-*/%&|^!~?:<>,.([{";
const LEADING_CONTINUATION: &str = ".?:+-*/%&|^,=<>([`";

/// Length of the skip region (string, comment, regex or template literal)
/// at the start of `input`.
pub fn skip_len(input: &str) -> Option<usize> {
    modbridge_lexer::skip_region(input)
}

/// Length of the operand at the start of `input`: an identifier with its
/// member chain (`a.b?.c`, `this.#x`), a numeric literal, or a closing
/// bracket. A division operator on the same line is consumed with it so the
/// skip recognizer never mistakes `a / b / c` for a regex literal.
pub fn word_len(input: &str) -> Option<usize> {
    let first = input.chars().next()?;
    let mut len = if is_id_start(first) {
        let head = identifier_len(input);
        let len = member_chain_len(input, head);
        if len == head && REGEX_KEYWORDS.contains(&&input[..head]) {
            return Some(head);
        }
        len
    } else if first.is_ascii_digit() {
        input
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '.' || c == '_'))
            .unwrap_or(input.len())
    } else if first == ')' || first == ']' {
        1
    } else {
        return None;
    };

    let rest = &input[len..];
    let after = rest.trim_start_matches([' ', '\t']);
    if after.starts_with('/') && !after.starts_with("//") && !after.starts_with("/*") {
        len += rest.len() - after.len() + 1;
    }
    Some(len)
}

fn member_chain_len(input: &str, mut len: usize) -> usize {
    loop {
        let rest = input[len..].trim_start();
        let after_dot = if let Some(after) = rest.strip_prefix("?.") {
            after
        } else if rest.starts_with("...") {
            return len;
        } else if let Some(after) = rest.strip_prefix('.') {
            after
        } else {
            return len;
        };
        let after_dot = after_dot.trim_start();
        let name = after_dot.strip_prefix('#').unwrap_or(after_dot);
        let name_len = identifier_len(name);
        if name_len == 0 {
            return len;
        }
        len = input.len() - name.len() + name_len;
    }
}

/// Hand-driven cursor over a piece of source.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at the start of `src`
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// Current byte offset
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Move back to an earlier offset
    pub fn reset(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Unconsumed input
    pub fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    /// Next character, if any
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Skip whitespace, newlines included
    pub fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Skip whitespace and comments
    pub fn skip_trivia(&mut self) {
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("//") || rest.starts_with("/*") {
                match skip_len(rest) {
                    Some(len) => self.pos += len,
                    None => return,
                }
            } else {
                return;
            }
        }
    }

    /// Consume `token` if the input starts with it
    pub fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    /// Consume the keyword `kw` when it is not part of a longer identifier
    pub fn keyword(&mut self, kw: &str) -> bool {
        let rest = self.rest();
        if rest.starts_with(kw) && identifier_len(rest) == kw.len() {
            self.pos += kw.len();
            true
        } else {
            false
        }
    }

    /// Consume an identifier
    pub fn identifier(&mut self) -> Option<&'a str> {
        let len = identifier_len(self.rest());
        if len == 0 {
            return None;
        }
        let ident = &self.rest()[..len];
        self.pos += len;
        Some(ident)
    }

    /// Consume a quoted string literal, returning its decoded value
    pub fn string(&mut self) -> Option<String> {
        let (value, len) = parse_string_at(self.rest())?;
        self.pos += len;
        Some(value)
    }

    /// Consume a module export name: an identifier or a string literal
    pub fn name(&mut self) -> Option<String> {
        match self.peek()? {
            '\'' | '"' => self.string(),
            _ => self.identifier().map(str::to_string),
        }
    }

    /// Consume an optional `;` after a statement, looking past trivia
    pub fn finish_statement(&mut self) {
        let before = self.pos;
        self.skip_trivia();
        if !self.eat(";") {
            self.reset(before);
        }
    }

    /// Skip a bracketed group starting at the current opening bracket
    pub fn skip_balanced(&mut self) -> Option<()> {
        if !matches!(self.peek()?, '(' | '[' | '{') {
            return None;
        }
        let start = self.pos;
        let mut depth = 0usize;
        let mut prev: Option<char> = None;

        while let Some(ch) = self.peek() {
            let rest = self.rest();
            if let Some(len) = skip_region_after(prev, rest) {
                self.pos += len;
                prev = Some('"');
                continue;
            }
            match ch {
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos += 1;
                        return Some(());
                    }
                }
                _ => {}
            }
            if !ch.is_whitespace() {
                prev = Some(ch);
            }
            self.pos += ch.len_utf8();
        }

        self.reset(start);
        None
    }

    /// Skip an expression up to a `,` `;` or unmatched closer at depth zero,
    /// or a newline that ends the statement.
    pub fn skip_expression(&mut self) {
        let mut depth = 0usize;
        let mut prev: Option<char> = None;

        while let Some(ch) = self.peek() {
            let rest = self.rest();
            if let Some(len) = skip_region_after(prev, rest) {
                let comment = rest.starts_with("//") || rest.starts_with("/*");
                self.pos += len;
                if !comment {
                    prev = Some('"');
                }
                continue;
            }
            match ch {
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                ',' | ';' if depth == 0 => return,
                '\n' if depth == 0 && self.ends_statement(prev) => return,
                _ => {}
            }
            if !ch.is_whitespace() {
                prev = Some(ch);
            }
            self.pos += ch.len_utf8();
        }
    }

    fn ends_statement(&self, prev: Option<char>) -> bool {
        if prev.is_some_and(|c| TRAILING_CONTINUATION.contains(c)) {
            return false;
        }
        let next = self.rest().trim_start();
        if next.starts_with("//") || next.starts_with("/*") {
            return true;
        }
        !next
            .chars()
            .next()
            .is_some_and(|c| LEADING_CONTINUATION.contains(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_len() {
        assert_eq!(word_len("foo bar"), Some(3));
        assert_eq!(word_len("obj.import(x)"), Some(10));
        assert_eq!(word_len("a?.b.#c = 1"), Some(7));
        assert_eq!(word_len("module\n  .exports = x"), Some(17));
        assert_eq!(word_len("reimport(x)"), Some(8));
        assert_eq!(word_len("...rest"), None);
        assert_eq!(word_len("12.5e3;"), Some(6));
    }

    #[test]
    fn test_word_absorbs_division() {
        assert_eq!(word_len("a / b / c"), Some(3));
        assert_eq!(word_len(") / 2"), Some(3));
        assert_eq!(word_len("a // comment"), Some(1));
        assert_eq!(word_len("return /re/"), Some(6));
    }

    #[test]
    fn test_cursor_basics() {
        let mut cur = Cursor::new("import /* c */ x, {a as b} from 'm'");
        assert!(cur.keyword("import"));
        cur.skip_trivia();
        assert_eq!(cur.identifier(), Some("x"));
        assert!(cur.eat(","));
        cur.skip_trivia();
        assert!(cur.eat("{"));
        assert!(!cur.keyword("as"));
        assert_eq!(cur.name(), Some("a".to_string()));
    }

    #[test]
    fn test_keyword_boundary() {
        let mut cur = Cursor::new("imports");
        assert!(!cur.keyword("import"));
        assert_eq!(cur.pos(), 0);
    }

    #[test]
    fn test_skip_expression_stops_at_comma() {
        let mut cur = Cursor::new("f(a, [b, c]), next");
        cur.skip_expression();
        assert_eq!(cur.rest(), ", next");
    }

    #[test]
    fn test_skip_expression_skips_literals() {
        let mut cur = Cursor::new("`a, ${ 'b, }' }` + \"c;\" + /,/g; tail");
        cur.skip_expression();
        assert_eq!(cur.rest(), "; tail");
    }

    #[test]
    fn test_skip_expression_newline_rules() {
        let mut cur = Cursor::new("1\nlet b, c");
        cur.skip_expression();
        assert_eq!(cur.rest(), "\nlet b, c");

        let mut cur = Cursor::new("a +\n  b\n  .c(), d");
        cur.skip_expression();
        assert_eq!(cur.rest(), ", d");
    }

    #[test]
    fn test_skip_expression_division() {
        let mut cur = Cursor::new("a / b / c, d");
        cur.skip_expression();
        assert_eq!(cur.rest(), ", d");
    }

    #[test]
    fn test_skip_balanced() {
        let mut cur = Cursor::new("[a, {b: [c]}, d] = x");
        assert!(cur.skip_balanced().is_some());
        assert_eq!(cur.rest(), " = x");

        let mut cur = Cursor::new("(never closed");
        assert!(cur.skip_balanced().is_none());
    }

    #[test]
    fn test_finish_statement() {
        let mut cur = Cursor::new("  ; x");
        cur.finish_statement();
        assert_eq!(cur.rest(), " x");

        let mut cur = Cursor::new("\nfoo();");
        cur.finish_statement();
        assert_eq!(cur.pos(), 0);
    }
}
