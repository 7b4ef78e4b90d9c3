//! The first-match tokenizer engine.

use std::cell::OnceCell;

use regex::Regex;
use tracing::trace;

use super::group::{self, Group, Selector};
use super::{Captures, Span, Token};

/// A successful recognizer match.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognized<T> {
    /// Number of bytes consumed, always positive
    pub len: usize,
    /// Structured fields for the produced token
    pub data: T,
}

impl<T> Recognized<T> {
    /// Creates a new match.
    pub fn new(len: usize, data: T) -> Self {
        Self { len, data }
    }
}

impl<T: Default> Recognized<T> {
    /// Creates a match carrying no structured fields.
    pub fn bare(len: usize) -> Self {
        Self::new(len, T::default())
    }
}

type RecognizeFn<'r, T> = Box<dyn Fn(&str) -> Option<Recognized<T>> + 'r>;

/// Something that can recognize a token at the start of the remaining input.
pub enum Recognizer<'r, T> {
    /// An anchored regular expression; named groups become token fields.
    Pattern {
        /// The pattern, anchored at the current position
        regex: Regex,
        /// Converts the named captures into token data
        map: fn(Captures) -> T,
    },
    /// An arbitrary function of the remaining input.
    Func(RecognizeFn<'r, T>),
}

impl<'r, T> Recognizer<'r, T> {
    /// Builds a recognizer from a closure.
    pub fn func(f: impl Fn(&str) -> Option<Recognized<T>> + 'r) -> Self {
        Self::Func(Box::new(f))
    }

    /// Builds an anchored pattern recognizer with a custom field mapping.
    pub fn pattern_with(pattern: &str, map: fn(Captures) -> T) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{pattern})"))?;
        Ok(Self::Pattern { regex, map })
    }

    /// Tries to recognize a token at the start of `input`.
    pub fn recognize(&self, input: &str) -> Option<Recognized<T>> {
        let hit = match self {
            Self::Pattern { regex, map } => {
                let caps = regex.captures(input)?;
                let whole = caps.get(0)?;
                let fields = regex
                    .capture_names()
                    .flatten()
                    .filter_map(|name| {
                        caps.name(name)
                            .map(|m| (name.to_string(), m.as_str().to_string()))
                    })
                    .collect();
                Recognized::new(whole.end(), map(fields))
            }
            Self::Func(f) => f(input)?,
        };
        (hit.len > 0 && input.is_char_boundary(hit.len.min(input.len()))).then_some(hit)
    }
}

impl<'r, T: From<Captures>> Recognizer<'r, T> {
    /// Builds an anchored pattern recognizer whose named groups become fields.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Self::pattern_with(pattern, T::from)
    }
}

impl<T> std::fmt::Debug for Recognizer<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pattern { regex, .. } => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// Splits text into tokens using an ordered list of named recognizers.
///
/// At every position the recognizers are tried in the order they were given
/// and the first positive match wins; input matched by nothing is skipped one
/// character at a time. The buffer is scanned with one sentinel newline on
/// each side so recognizers can anchor on the start of a line; reported spans
/// are clamped to the original text.
///
/// ```rust
/// use modbridge_lexer::{Recognizer, Recognized, Tokenizer};
///
/// let tokenizer: Tokenizer<'_, ()> = Tokenizer::new(
///     "a1 b22",
///     vec![(
///         "digits",
///         Recognizer::func(|s: &str| {
///             let n = s.bytes().take_while(u8::is_ascii_digit).count();
///             (n > 0).then(|| Recognized::bare(n))
///         }),
///     )],
/// );
/// let texts: Vec<_> = tokenizer.tokens().iter().map(|t| t.text.as_str()).collect();
/// assert_eq!(texts, ["1", "22"]);
/// ```
pub struct Tokenizer<'r, T = Captures> {
    source: String,
    padded: String,
    recognizers: Vec<(&'static str, Recognizer<'r, T>)>,
    tokens: OnceCell<Vec<Token<T>>>,
}

impl<'r, T> Tokenizer<'r, T> {
    /// Creates a tokenizer over `source` with recognizers in priority order.
    pub fn new(source: &str, recognizers: Vec<(&'static str, Recognizer<'r, T>)>) -> Self {
        Self {
            source: source.to_string(),
            padded: format!("\n{source}\n"),
            recognizers,
            tokens: OnceCell::new(),
        }
    }

    /// The text being tokenized.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns all tokens, scanning the buffer on first use.
    pub fn tokens(&self) -> &[Token<T>] {
        self.tokens.get_or_init(|| self.scan())
    }

    /// Returns the tokens produced by the recognizer `name`.
    pub fn tokens_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Token<T>> + 'a {
        self.tokens().iter().filter(move |tok| tok.name == name)
    }

    /// Finds every non-overlapping window of tokens matching `selectors`.
    pub fn match_groups(&self, selectors: &[Selector]) -> Vec<Group<'_, T>> {
        group::match_groups(self.tokens(), selectors)
    }

    fn recognize(&self, rest: &str) -> Option<(&'static str, Recognized<T>)> {
        self.recognizers
            .iter()
            .find_map(|(name, rec)| rec.recognize(rest).map(|hit| (*name, hit)))
    }

    fn scan(&self) -> Vec<Token<T>> {
        let source_len = self.source.len();
        let mut tokens = Vec::new();
        let mut pos = 0;

        while pos < self.padded.len() {
            let rest = &self.padded[pos..];
            match self.recognize(rest) {
                Some((name, hit)) => {
                    let len = hit.len.min(rest.len());
                    let start = pos.saturating_sub(1).min(source_len);
                    let end = (pos + len).saturating_sub(1).min(source_len);
                    trace!(name, start, end, "token");
                    tokens.push(Token::new(
                        name,
                        Span::new(start, end),
                        &self.source[start..end],
                        hit.data,
                    ));
                    pos += len;
                }
                None => pos += rest.chars().next().map_or(1, char::len_utf8),
            }
        }

        tokens
    }
}
