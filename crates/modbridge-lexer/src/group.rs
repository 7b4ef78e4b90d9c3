//! Structural group matching over a token stream.
//!
//! A selector sequence describes a statement shape as an ordered list of
//! token names with quantifiers. The compact string form used by
//! [`Selector::from`] is borrowed from the usual regex prefixes:
//!
//! | Form | Quantifier |
//! |------|------------|
//! | `name` | [`Quantifier::Required`] |
//! | `?name` | [`Quantifier::Optional`] |
//! | `*name` or `*` | [`Quantifier::Cascade`] |
//! | `^` | [`Quantifier::Nested`] |

use super::Token;

/// Nested selectors recurse at most this deep.
pub const MAX_GROUP_DEPTH: usize = 32;

/// How many tokens a selector consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// Exactly one token with the selector's name
    Required,
    /// One token with the selector's name, if present
    Optional,
    /// Tokens with the selector's name; without a name, every token up to
    /// the following selector's name
    Cascade,
    /// The whole sequence again, zero or more times. Only recurses once the
    /// selectors before it consumed a token; in first position it skips
    /// tokens up to the following selector without collecting inner groups.
    Nested,
}

/// One element of a selector sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selector {
    /// Token name to match; `None` accepts any token
    pub name: Option<&'static str>,
    /// How many tokens to consume
    pub quantifier: Quantifier,
}

impl Selector {
    /// A required token.
    pub fn required(name: &'static str) -> Self {
        Self {
            name: Some(name),
            quantifier: Quantifier::Required,
        }
    }

    /// An optional token.
    pub fn optional(name: &'static str) -> Self {
        Self {
            name: Some(name),
            quantifier: Quantifier::Optional,
        }
    }

    /// A run of tokens.
    pub fn cascade(name: Option<&'static str>) -> Self {
        Self {
            name,
            quantifier: Quantifier::Cascade,
        }
    }

    /// A recursive repetition of the enclosing sequence.
    pub fn nested() -> Self {
        Self {
            name: None,
            quantifier: Quantifier::Nested,
        }
    }

    fn accepts<T>(&self, token: &Token<T>) -> bool {
        self.name.is_none_or(|name| token.name == name)
    }
}

impl From<&'static str> for Selector {
    fn from(spec: &'static str) -> Self {
        match spec.as_bytes().first() {
            Some(b'?') => Self::optional(&spec[1..]),
            Some(b'*') if spec.len() == 1 => Self::cascade(None),
            Some(b'*') => Self::cascade(Some(&spec[1..])),
            Some(b'^') => Self::nested(),
            _ => Self::required(spec),
        }
    }
}

/// One element of a matched group.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupItem<'t, T> {
    /// A token consumed by a required, optional or cascade selector
    Token(&'t Token<T>),
    /// Each inner match collected by a nested selector
    Nested(Vec<Group<'t, T>>),
}

impl<'t, T> GroupItem<'t, T> {
    /// Returns the token, if this item is one.
    pub fn as_token(&self) -> Option<&'t Token<T>> {
        match self {
            Self::Token(tok) => Some(tok),
            Self::Nested(_) => None,
        }
    }
}

/// The items matched by one selector window.
pub type Group<'t, T> = Vec<GroupItem<'t, T>>;

/// Finds every non-overlapping window of `tokens` matching `selectors`,
/// resuming right after each match.
///
/// A [`Quantifier::Nested`] selector recurses only after earlier selectors
/// consumed at least one token, so a sequence that starts with `^` never
/// yields inner groups. Recursion stops at [`MAX_GROUP_DEPTH`].
pub fn match_groups<'t, T>(tokens: &'t [Token<T>], selectors: &[Selector]) -> Vec<Group<'t, T>> {
    let mut groups = Vec::new();
    let mut idx = 0;

    while idx < tokens.len() {
        match match_at(tokens, selectors, idx, 0) {
            Some((end, group)) if end > idx => {
                groups.push(group);
                idx = end;
            }
            _ => idx += 1,
        }
    }

    groups
}

/// Matches `selectors` starting at token `start`, returning the index after
/// the last consumed token.
fn match_at<'t, T>(
    tokens: &'t [Token<T>],
    selectors: &[Selector],
    start: usize,
    depth: usize,
) -> Option<(usize, Group<'t, T>)> {
    if depth > MAX_GROUP_DEPTH {
        return None;
    }

    let mut idx = start;
    let mut matched = Vec::new();

    for (i, selector) in selectors.iter().enumerate() {
        let next = selectors.get(i + 1);

        match selector.quantifier {
            Quantifier::Required => {
                let token = tokens.get(idx).filter(|tok| selector.accepts(tok))?;
                matched.push(GroupItem::Token(token));
                idx += 1;
            }
            Quantifier::Optional => {
                if let Some(token) = tokens.get(idx).filter(|tok| selector.accepts(tok)) {
                    matched.push(GroupItem::Token(token));
                    idx += 1;
                }
            }
            Quantifier::Cascade => {
                while let Some(token) = tokens.get(idx) {
                    let keep = match selector.name {
                        Some(name) => token.name == name,
                        None => next
                            .and_then(|sel| sel.name)
                            .is_none_or(|boundary| token.name != boundary),
                    };
                    if !keep {
                        break;
                    }
                    matched.push(GroupItem::Token(token));
                    idx += 1;
                }
            }
            Quantifier::Nested => {
                let mut inner = Vec::new();
                // recursing before anything was consumed would never progress
                let can_recurse = idx > start;
                while let Some(token) = tokens.get(idx) {
                    if can_recurse {
                        if let Some((end, group)) = match_at(tokens, selectors, idx, depth + 1) {
                            if end > idx {
                                inner.push(group);
                                idx = end;
                                continue;
                            }
                        }
                    }
                    if next.is_some_and(|sel| sel.accepts(token)) {
                        break;
                    }
                    idx += 1;
                }
                matched.push(GroupItem::Nested(inner));
            }
        }
    }

    Some((idx, matched))
}
