// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Text splicing and synthetic identifiers for rewritten source

use modbridge_lexer::Span;
use std::collections::HashSet;
use tracing::warn;

/// Collects replacements against spans of an unmodified buffer and applies
/// them in one pass.
#[derive(Debug)]
pub struct Splicer<'s> {
    source: &'s str,
    edits: Vec<(Span, String)>,
}

impl<'s> Splicer<'s> {
    /// Create a splicer over `source`
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            edits: Vec::new(),
        }
    }

    /// Replace `span` of the original buffer with `text`
    pub fn replace(&mut self, span: Span, text: impl Into<String>) {
        self.edits.push((span, text.into()));
    }

    /// Number of pending edits
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Check if there are no pending edits
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Apply every edit in increasing offset order.
    ///
    /// Spans refer to the original buffer; each one is shifted by the
    /// cumulative length change of the edits before it. Overlapping edits
    /// are dropped.
    pub fn apply(mut self) -> String {
        self.edits.sort_by_key(|(span, _)| span.start);

        let mut out = self.source.to_string();
        let mut delta: isize = 0;
        let mut last_end = 0;

        for (span, text) in self.edits {
            if span.start < last_end || span.end > self.source.len() {
                warn!(start = span.start, end = span.end, "dropping overlapping edit");
                continue;
            }
            let start = span.start.saturating_add_signed(delta);
            out.replace_range(start..start + span.len(), &text);
            delta += text.len() as isize - span.len() as isize;
            last_end = span.end;
        }

        out
    }
}

/// Hands out identifiers that do not occur in a given source text.
#[derive(Debug)]
pub struct SyntheticNames<'s> {
    source: &'s str,
    issued: HashSet<String>,
    counter: usize,
}

impl<'s> SyntheticNames<'s> {
    /// Create an allocator avoiding every identifier-like run in `source`
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            issued: HashSet::new(),
            counter: 0,
        }
    }

    /// A fresh name of the form `{prefix}{n}`
    pub fn numbered(&mut self, prefix: &str) -> String {
        loop {
            let name = format!("{prefix}{}", self.counter);
            self.counter += 1;
            if self.is_free(&name) {
                self.issued.insert(name.clone());
                return name;
            }
        }
    }

    /// `name` itself if free, otherwise `name` with a numeric suffix
    pub fn named(&mut self, name: &str) -> String {
        if self.is_free(name) {
            self.issued.insert(name.to_string());
            return name.to_string();
        }
        self.numbered(&format!("{name}_"))
    }

    fn is_free(&self, name: &str) -> bool {
        !self.issued.contains(name) && !self.source.contains(name)
    }
}
