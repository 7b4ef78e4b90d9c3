// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Transform results and diagnostics

use serde::Serialize;

use super::resolver::{Origin, Resolution};

/// A line-start `import` or `export` that no statement shape matched and
/// that was therefore left untouched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedStatement {
    /// 1-based line number
    pub line: usize,
    /// Byte offset of the keyword
    pub offset: usize,
    /// `import` or `export`
    pub keyword: &'static str,
}

/// Everything a transform chose not to (or could not) rewrite
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Statements left as written
    pub skipped: Vec<SkippedStatement>,
    /// Specifiers that did not resolve, as written
    pub unresolved: Vec<String>,
}

impl Diagnostics {
    /// Check if nothing was reported
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.unresolved.is_empty()
    }

    /// Record a resolution, noting it when unresolved
    pub(crate) fn track(&mut self, resolution: &Resolution) {
        if resolution.origin == Origin::Unresolved {
            self.unresolved.push(resolution.specifier.clone());
        }
    }
}

/// Output of a module transform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformOutput {
    /// Rewritten source
    pub code: String,
    /// Every specifier encountered, resolved, in source order
    pub dependencies: Vec<Resolution>,
    /// Statements skipped and specifiers left unresolved
    pub diagnostics: Diagnostics,
}

/// 1-based line number of `offset` in `source`
pub(crate) fn line_of(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())].matches('\n').count() + 1
}

/// Whether `offset` begins a statement: only horizontal whitespace precedes
/// it on its line, or the nearest character before it is `;` or `}`
pub(crate) fn at_statement_start(source: &str, offset: usize) -> bool {
    source[..offset]
        .chars()
        .rev()
        .find(|c| *c != ' ' && *c != '\t')
        .is_none_or(|c| matches!(c, '\n' | '\r' | ';' | '}'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_line_helpers() {
        let src = "a\n  b c\nd";
        assert_eq!(line_of(src, 0), 1);
        assert_eq!(line_of(src, 4), 2);
        assert_eq!(line_of(src, 8), 3);
        assert!(at_statement_start(src, 0));
        assert!(at_statement_start(src, 4));
        assert!(!at_statement_start(src, 6));
    }

    #[test]
    fn test_statement_start_after_semicolon_or_brace() {
        let src = "a(); b\nif (x) {} c\nd = e";
        assert!(at_statement_start(src, src.find('b').unwrap()));
        assert!(at_statement_start(src, src.find('c').unwrap()));
        assert!(!at_statement_start(src, src.find('e').unwrap()));
    }

    #[test]
    fn test_track_unresolved() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.track(&Resolution {
            origin: Origin::Unresolved,
            specifier: "./missing".to_string(),
            path: PathBuf::from("/src/missing"),
        });
        diagnostics.track(&Resolution {
            origin: Origin::Core,
            specifier: "fs".to_string(),
            path: PathBuf::from("fs"),
        });
        assert_eq!(diagnostics.unresolved, ["./missing"]);
        assert!(!diagnostics.is_clean());
    }
}
