// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Export shape of CommonJS modules, decided without running them

use modbridge_lexer::{Recognized, Recognizer, Tokenizer};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

use super::scan::{Cursor, skip_len, word_len};

/// Keys never re-exported by name
const EXCLUDED_KEYS: &[&str] = &["__esModule"];

static EXPORTS_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<module>module\s*\.\s*)?exports\b").expect("valid regex"));

static DEFINE_PROPERTY_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Object\s*\.\s*defineProperty\s*\(\s*(?P<module>module\s*\.\s*)?exports\s*,\s*")
        .expect("valid regex")
});

/// What a CommonJS module exposes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportShape {
    /// Export `module.exports` itself as the default instead of by key
    pub has_default: bool,
    /// Statically known keys, in order of first appearance; a `default` key
    /// is kept so interop modules keep their real default
    pub names: Vec<String>,
}

/// Decides the export shape of a CommonJS module
pub trait ExportInspector: Send + Sync {
    /// Inspect the module at `path` whose text is `source`
    fn inspect(&self, source: &str, path: &Path) -> ExportShape;
}

/// Reads export keys from assignment patterns in the source.
///
/// Recognized:
/// - `module.exports = { a, b: 1, "c": 2, d() {} }`
/// - `exports.k = ...`, `exports["k"] = ...` and the `module.exports` forms
/// - `Object.defineProperty(exports, "k", ...)`
///
/// Assigning anything but an object literal to `module.exports`, a spread or
/// computed key in the literal, or finding no keys at all makes the module
/// export a default.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticExportInspector;

impl ExportInspector for StaticExportInspector {
    fn inspect(&self, source: &str, path: &Path) -> ExportShape {
        let tokenizer = site_tokenizer(source);
        let mut shape = ExportShape::default();
        let mut reassigned = false;

        for token in tokenizer.tokens() {
            match &token.data {
                Site::Named { key, alias } => {
                    // `exports` no longer aliases a reassigned `module.exports`
                    if *alias && reassigned {
                        continue;
                    }
                    shape.add(key);
                }
                Site::Reassign(Some(literal)) => {
                    reassigned = true;
                    shape.names.clear();
                    shape.has_default = literal.dynamic;
                    for key in &literal.names {
                        shape.add(key);
                    }
                }
                Site::Reassign(None) => {
                    reassigned = true;
                    shape.has_default = true;
                }
                Site::Skip | Site::Word => {}
            }
        }

        if shape.names.is_empty() {
            shape.has_default = true;
        }
        debug!(path = %path.display(), has_default = shape.has_default, names = ?shape.names, "export shape");
        shape
    }
}

impl ExportShape {
    fn add(&mut self, key: &str) {
        if !EXCLUDED_KEYS.contains(&key) && !self.names.iter().any(|name| name == key) {
            self.names.push(key.to_string());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LiteralKeys {
    names: Vec<String>,
    dynamic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Site {
    Skip,
    Word,
    Named { key: String, alias: bool },
    Reassign(Option<LiteralKeys>),
}

fn site_tokenizer(source: &str) -> Tokenizer<'static, Site> {
    Tokenizer::new(
        source,
        vec![
            (
                "skip",
                Recognizer::func(|s: &str| skip_len(s).map(|n| Recognized::new(n, Site::Skip))),
            ),
            ("export_site", Recognizer::func(recognize_site)),
            (
                "word",
                Recognizer::func(|s: &str| word_len(s).map(|n| Recognized::new(n, Site::Word))),
            ),
        ],
    )
}

fn recognize_site(input: &str) -> Option<Recognized<Site>> {
    let mut cur = Cursor::new(input);

    if let Some(caps) = DEFINE_PROPERTY_HEAD.captures(input) {
        cur.reset(caps.get(0)?.end());
        let key = cur.string()?;
        let alias = caps.name("module").is_none();
        return Some(Recognized::new(cur.pos(), Site::Named { key, alias }));
    }

    let caps = EXPORTS_HEAD.captures(input)?;
    let alias = caps.name("module").is_none();
    cur.reset(caps.get(0)?.end());
    cur.skip_whitespace();

    let site = if cur.eat(".") {
        cur.skip_whitespace();
        let key = cur.identifier()?.to_string();
        assignment(&mut cur).then_some(Site::Named { key, alias })?
    } else if cur.eat("[") {
        cur.skip_whitespace();
        let key = cur.string()?;
        cur.skip_whitespace();
        cur.eat("]").then_some(())?;
        assignment(&mut cur).then_some(Site::Named { key, alias })?
    } else if !alias && assignment(&mut cur) {
        cur.skip_trivia();
        Site::Reassign(object_literal(&mut cur))
    } else {
        return None;
    };

    Some(Recognized::new(cur.pos(), site))
}

/// Consumes `=` when it is a plain assignment
fn assignment(cur: &mut Cursor<'_>) -> bool {
    cur.skip_whitespace();
    let rest = cur.rest();
    if rest.starts_with('=') && !rest[1..].starts_with(['=', '>']) {
        cur.eat("=")
    } else {
        false
    }
}

fn object_literal(cur: &mut Cursor<'_>) -> Option<LiteralKeys> {
    let start = cur.pos();
    let keys = literal_entries(cur);
    if keys.is_none() {
        cur.reset(start);
    }
    keys
}

fn literal_entries(cur: &mut Cursor<'_>) -> Option<LiteralKeys> {
    cur.eat("{").then_some(())?;
    let mut keys = LiteralKeys {
        names: Vec::new(),
        dynamic: false,
    };

    loop {
        cur.skip_trivia();
        if cur.eat("}") {
            return Some(keys);
        }

        if cur.eat("...") {
            keys.dynamic = true;
            cur.skip_expression();
        } else {
            let key = property_key(cur, &mut keys)?;
            cur.skip_trivia();
            // accessor and async method prefixes
            let key = match key.as_deref() {
                Some("get" | "set" | "async") if !matches!(cur.peek()?, ':' | '(' | ',' | '}') => {
                    let key = property_key(cur, &mut keys)?;
                    cur.skip_trivia();
                    key
                }
                _ => key,
            };
            keys.names.extend(key);

            match cur.peek()? {
                ':' => {
                    cur.eat(":");
                    cur.skip_expression();
                }
                '(' => {
                    cur.skip_balanced()?;
                    cur.skip_trivia();
                    cur.skip_balanced()?;
                }
                _ => {}
            }
        }

        cur.skip_trivia();
        if !cur.eat(",") {
            cur.skip_trivia();
            return cur.eat("}").then_some(keys);
        }
    }
}

/// A literal key, or `None` for a computed one
fn property_key(cur: &mut Cursor<'_>, keys: &mut LiteralKeys) -> Option<Option<String>> {
    if cur.eat("*") {
        cur.skip_trivia();
    }
    match cur.peek()? {
        '[' => {
            keys.dynamic = true;
            cur.skip_balanced()?;
            Some(None)
        }
        c if c.is_ascii_digit() => {
            let len = word_len(cur.rest())?;
            let key = cur.rest()[..len].to_string();
            cur.reset(cur.pos() + len);
            Some(Some(key))
        }
        _ => cur.name().map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inspect(source: &str) -> ExportShape {
        StaticExportInspector.inspect(source, Path::new("/src/mod.js"))
    }

    #[test]
    fn test_object_literal_keys() {
        let shape = inspect(
            "module.exports = {\n  a,\n  b: 1,\n  'c-d': x => x,\n  e() { return {}; },\n  get f() { return 1; },\n  async *g() {},\n};\n",
        );
        assert!(!shape.has_default);
        assert_eq!(shape.names, ["a", "b", "c-d", "e", "f", "g"]);
    }

    #[test]
    fn test_property_assignments() {
        let shape = inspect(
            "exports.a = 1;\nexports[\"b\"] = 2;\nmodule.exports.c = 3;\nObject.defineProperty(exports, 'd', { value: 4 });\nif (exports.a == 1) {}\n",
        );
        assert!(!shape.has_default);
        assert_eq!(shape.names, ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_function_export_is_default() {
        let shape = inspect("function main() {}\nmodule.exports = main;\nmodule.exports.helper = h;\n");
        assert!(shape.has_default);
        assert_eq!(shape.names, ["helper"]);
    }

    #[test]
    fn test_empty_module_is_default() {
        let shape = inspect("module.exports = {};\n");
        assert!(shape.has_default);
        assert!(shape.names.is_empty());
    }

    #[test]
    fn test_spread_and_computed_keys_are_default() {
        assert!(inspect("module.exports = { ...base, a };").has_default);
        let shape = inspect("module.exports = { [name]: 1, b: 2 };");
        assert!(shape.has_default);
        assert_eq!(shape.names, ["b"]);
    }

    #[test]
    fn test_literal_reassignment_replaces_keys() {
        let shape = inspect("exports.old = 1;\nmodule.exports = { fresh };\nexports.stale = 2;\n");
        assert_eq!(shape.names, ["fresh"]);
    }

    #[test]
    fn test_interop_module_keeps_default_key() {
        let shape = inspect(
            "\"use strict\";\nObject.defineProperty(exports, \"__esModule\", { value: true });\nexports.default = main;\nexports.helper = helper;\n",
        );
        assert!(!shape.has_default);
        assert_eq!(shape.names, ["default", "helper"]);
    }

    #[test]
    fn test_es_module_flag_alone_is_default() {
        let shape = inspect("Object.defineProperty(exports, '__esModule', { value: true });\n");
        assert!(shape.has_default);
        assert!(shape.names.is_empty());
    }

    #[test]
    fn test_ignores_strings_comments_and_members() {
        let shape = inspect("// exports.a = 1\nconst s = 'module.exports = {b}';\nfoo.exports.c = 1;\nexports.d = 1;\n");
        assert_eq!(shape.names, ["d"]);
    }
}
