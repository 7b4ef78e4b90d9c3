// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # modbridge-lexer
//!
//! A small, configurable tokenizer for scanning JavaScript source without
//! parsing it.
//!
//! ## Overview
//!
//! This crate provides the building blocks used by the module converters:
//! - A first-match [`Tokenizer`] driven by an ordered list of named recognizers
//! - Skip-region measurement for strings, comments, regex and template literals
//! - Structural [`match_groups`](Tokenizer::match_groups) over the token stream
//! - String literal decoding and identifier helpers
//!
//! ## Quick Start
//!
//! ```rust
//! use modbridge_lexer::{skip_region, Captures, Recognized, Recognizer, Tokenizer};
//!
//! let tokenizer: Tokenizer<'_, Captures> = Tokenizer::new(
//!     "foo('bar') // baz",
//!     vec![
//!         ("skip", Recognizer::func(|s: &str| skip_region(s).map(Recognized::bare))),
//!         ("word", Recognizer::pattern(r"[A-Za-z_$][\w$]*").unwrap()),
//!     ],
//! );
//! assert_eq!(tokenizer.tokens_named("word").count(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod group;
pub mod literals;
pub mod skip;
pub mod token;
pub mod tokenizer;

pub use group::{Group, GroupItem, Quantifier, Selector};
pub use literals::{identifier_len, is_identifier, parse_string_at};
pub use skip::{skip_region, skip_region_after};
pub use token::{Captures, Span, Token};
pub use tokenizer::{Recognized, Recognizer, Tokenizer};
