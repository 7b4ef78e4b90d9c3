//! Token definitions for the tokenizer engine.

use std::collections::BTreeMap;

/// A span in the source code, representing a range of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length of this span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if this span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if `offset` falls inside this span.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Named capture groups produced by a pattern recognizer.
pub type Captures = BTreeMap<String, String>;

/// A token produced by the tokenizer.
///
/// Spans always refer to the buffer the tokenizer was constructed with,
/// never to a rewritten copy of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<T = Captures> {
    /// Name of the recognizer that produced this token
    pub name: &'static str,
    /// The span in the source code
    pub span: Span,
    /// The matched source text
    pub text: String,
    /// Structured fields attached by the recognizer
    pub data: T,
}

impl<T> Token<T> {
    /// Creates a new token.
    pub fn new(name: &'static str, span: Span, text: impl Into<String>, data: T) -> Self {
        Self {
            name,
            span,
            text: text.into(),
            data,
        }
    }

    /// Returns true if this token was produced by the recognizer `name`.
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_new() {
        let span = Span::new(10, 20);
        assert_eq!(span.start, 10);
        assert_eq!(span.end, 20);
    }

    #[test]
    fn test_span_len() {
        assert_eq!(Span::new(5, 15).len(), 10);
        assert_eq!(Span::new(0, 0).len(), 0);
    }

    #[test]
    fn test_span_is_empty() {
        assert!(Span::new(5, 5).is_empty());
        assert!(!Span::new(5, 6).is_empty());
    }

    #[test]
    fn test_span_contains() {
        let span = Span::new(2, 4);
        assert!(!span.contains(1));
        assert!(span.contains(2));
        assert!(span.contains(3));
        assert!(!span.contains(4));
    }

    #[test]
    fn test_token_new() {
        let token = Token::new("word", Span::new(0, 3), "foo", Captures::new());
        assert!(token.is("word"));
        assert!(!token.is("other"));
        assert_eq!(token.text, "foo");
        assert!(token.data.is_empty());
    }
}
