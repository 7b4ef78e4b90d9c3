// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! ECMAScript module statement parser
//!
//! Recognizes the module statement shapes needed for interop:
//! - `import` declarations, with `with { ... }` attributes
//! - `export default`, export lists, re-exports and `export *`
//! - `export` on `const`/`let`/`var`/`function`/`class` declarations,
//!   destructuring included
//! - Dynamic `import(...)` and `import.meta`
//!
//! Statements start a line or follow a `;` or `}` on the same line. Anything
//! that looks like a statement but does not parse, or sits anywhere else, is
//! left alone and reported in [`ParsedModule::skipped`].

use modbridge_lexer::{Recognized, Recognizer, Token, Tokenizer};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::debug;

use super::diagnostics::{SkippedStatement, at_statement_start, line_of};
use super::scan::{Cursor, skip_len, word_len};

/// Import attributes, e.g. `{ type: "json" }`
pub type Attributes = BTreeMap<String, String>;

/// Module type detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleType {
    /// CommonJS module (require/module.exports)
    CommonJS,
    /// ECMAScript module (import/export)
    ESM,
    /// JSON file
    Json,
    /// Unknown/detect from content
    Unknown,
}

impl ModuleType {
    /// Detect module type from file path
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("mjs") => ModuleType::ESM,
            Some("cjs") => ModuleType::CommonJS,
            Some("json") => ModuleType::Json,
            _ => ModuleType::Unknown,
        }
    }

    /// Detect module type from the file name, then from its contents
    pub fn detect(path: &Path, source: &str) -> Self {
        match Self::from_path(path) {
            ModuleType::Unknown if is_esm(source) => ModuleType::ESM,
            ModuleType::Unknown => ModuleType::CommonJS,
            known => known,
        }
    }
}

/// One binding introduced by an import
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportBinding {
    /// `import foo from 'module'`
    Default(String),
    /// `import * as foo from 'module'`
    Namespace(String),
    /// `import { foo as bar } from 'module'`
    Named {
        /// Name exported by the module
        imported: String,
        /// Local binding
        local: String,
    },
}

impl ImportBinding {
    /// The key this binding reads: `default`, `*` or the imported name
    pub fn key(&self) -> &str {
        match self {
            Self::Default(_) => "default",
            Self::Namespace(_) => "*",
            Self::Named { imported, .. } => imported,
        }
    }

    /// The local binding name
    pub fn local(&self) -> &str {
        match self {
            Self::Default(local) | Self::Namespace(local) | Self::Named { local, .. } => local,
        }
    }
}

/// Parsed import statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDescriptor {
    /// The module specifier (e.g., './foo.js', 'lodash')
    pub specifier: String,
    /// Import attributes; `type` defaults to the specifier's extension
    pub attributes: Attributes,
    /// Bindings, unique by key
    pub bindings: Vec<ImportBinding>,
}

impl ImportDescriptor {
    /// Whether this is a side-effect only import (`import 'module'`)
    pub fn is_side_effect_only(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// `local as exported` in an export list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportName {
    /// Local binding
    pub local: String,
    /// Name visible to importers
    pub exported: String,
}

/// What a re-export reads from the foreign module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForeignKey {
    /// The whole module (`export *`)
    Namespace,
    /// Its default export
    Default,
    /// One named export
    Named(String),
}

/// Where a re-export lands in this module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportedAs {
    /// This module's default export
    Default,
    /// A named export
    Named(String),
    /// Every key of the foreign module (`export * from`)
    Spread,
}

/// One entry of a re-export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReexportEntry {
    /// Key read from the foreign module
    pub foreign: ForeignKey,
    /// Key written to this module
    pub exported: ExportedAs,
}

/// Declaration keyword after `export`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    /// `const`
    Const,
    /// `let`
    Let,
    /// `var`
    Var,
    /// `function`
    Function,
    /// `function*`
    Generator,
    /// `async function`
    AsyncFunction,
    /// `async function*`
    AsyncGenerator,
    /// `class`
    Class,
}

/// Parsed export statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportDescriptor {
    /// `export default <expr>`; `declared` names a function or class
    /// declaration that stays a local binding
    Default {
        /// Name of the declared function or class
        declared: Option<String>,
    },
    /// `export { a, b as c }`
    Local(Vec<ExportName>),
    /// `export const a = 1`, `export function f() {}`, ...
    Declaration {
        /// Declaration keyword
        kind: DeclarationKind,
        /// Every name the declaration binds
        names: Vec<String>,
    },
    /// `export { a } from 'module'`, `export * from 'module'`
    Reexport {
        /// Foreign module specifier
        specifier: String,
        /// Import attributes for the foreign module
        attributes: Attributes,
        /// Re-exported keys
        entries: Vec<ReexportEntry>,
    },
}

/// Token payload of the statement tokenizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// String, comment, regex or template literal
    Skip,
    /// Static import
    Import(ImportDescriptor),
    /// Export statement; the token covers only the prefix that is rewritten
    Export(ExportDescriptor),
    /// The `import` keyword of `import(...)` or `import.meta`
    DynamicImport,
    /// Identifier, member chain or other operand
    Word,
}

/// Module statements in source order
#[derive(Debug, Clone, Default)]
pub struct ParsedModule {
    /// Import, export and dynamic import tokens
    pub statements: Vec<Token<Statement>>,
    /// Statement keywords that did not parse
    pub skipped: Vec<SkippedStatement>,
}

/// Build a tokenizer recognizing module statements.
///
/// Recognizers in order: skip regions, static imports, exports, dynamic
/// imports, words.
pub fn statement_tokenizer(source: &str) -> Tokenizer<'static, Statement> {
    Tokenizer::new(
        source,
        vec![
            (
                "skip",
                Recognizer::func(|s: &str| skip_len(s).map(|n| Recognized::new(n, Statement::Skip))),
            ),
            ("import", Recognizer::func(recognize_import)),
            ("export", Recognizer::func(recognize_export)),
            ("dynamic_import", Recognizer::func(recognize_dynamic_import)),
            (
                "word",
                Recognizer::func(|s: &str| word_len(s).map(|n| Recognized::new(n, Statement::Word))),
            ),
        ],
    )
}

/// Parse the module statements of `source`
pub fn parse_module(source: &str) -> ParsedModule {
    let tokenizer = statement_tokenizer(source);
    let mut parsed = ParsedModule::default();

    for token in tokenizer.tokens() {
        let keyword = match &token.data {
            Statement::Skip => continue,
            Statement::DynamicImport => {
                parsed.statements.push(token.clone());
                continue;
            }
            Statement::Word => match token.text.as_str() {
                "import" => "import",
                "export" => "export",
                _ => continue,
            },
            Statement::Import(_) => "import",
            Statement::Export(_) => "export",
        };

        let offset = keyword_offset(token);
        let starts_statement = at_statement_start(source, offset);
        let recognized = !matches!(token.data, Statement::Word);
        if recognized && starts_statement {
            debug!(name = token.name, span = ?token.span, data = ?token.data, "statement");
            parsed.statements.push(token.clone());
        } else if recognized || starts_statement {
            let line = line_of(source, offset);
            debug!(keyword, line, "statement not recognized");
            parsed.skipped.push(SkippedStatement { line, offset, keyword });
        }
    }

    parsed
}

/// Offset of the statement keyword, past the whitespace a token may lead with
fn keyword_offset<T>(token: &Token<T>) -> usize {
    token.span.start + token.text.len() - token.text.trim_start().len()
}

/// Check if `source` contains a static import or an export statement
pub fn is_esm(source: &str) -> bool {
    parse_module(source)
        .statements
        .iter()
        .any(|tok| matches!(tok.data, Statement::Import(_) | Statement::Export(_)))
}

/// Matches `<keyword>` at the start of `input`, or after a newline and
/// indentation. Whether the keyword starts a statement is checked against the
/// full source in [`parse_module`].
fn statement_keyword<'a>(input: &'a str, keyword: &str) -> Option<Cursor<'a>> {
    let mut cur = Cursor::new(input);
    if input.starts_with('\n') {
        cur.skip_whitespace();
    }
    cur.keyword(keyword).then_some(cur)
}

fn recognize_import(input: &str) -> Option<Recognized<Statement>> {
    let mut cur = statement_keyword(input, "import")?;
    cur.skip_trivia();

    let (specifier, bindings) = if matches!(cur.peek()?, '\'' | '"') {
        (cur.string()?, Vec::new())
    } else {
        let bindings = import_bindings(&mut cur)?;
        cur.skip_trivia();
        if !cur.keyword("from") {
            return None;
        }
        cur.skip_trivia();
        (cur.string()?, bindings)
    };

    let attributes = attributes_clause(&mut cur, &specifier)?;
    cur.finish_statement();

    Some(Recognized::new(
        cur.pos(),
        Statement::Import(ImportDescriptor {
            specifier,
            attributes,
            bindings,
        }),
    ))
}

fn import_bindings(cur: &mut Cursor<'_>) -> Option<Vec<ImportBinding>> {
    let mut bindings = Vec::new();

    match cur.peek()? {
        '*' => bindings.push(namespace_binding(cur)?),
        '{' => named_bindings(cur, &mut bindings)?,
        // `(` and `.` belong to dynamic imports
        _ => {
            let local = cur.identifier()?;
            bindings.push(ImportBinding::Default(local.to_string()));
            let before = cur.pos();
            cur.skip_trivia();
            if cur.eat(",") {
                cur.skip_trivia();
                match cur.peek()? {
                    '*' => bindings.push(namespace_binding(cur)?),
                    '{' => named_bindings(cur, &mut bindings)?,
                    _ => return None,
                }
            } else {
                cur.reset(before);
            }
        }
    }

    let mut keys = HashSet::new();
    bindings
        .iter()
        .all(|binding| keys.insert(binding.key().to_string()))
        .then_some(bindings)
}

fn namespace_binding(cur: &mut Cursor<'_>) -> Option<ImportBinding> {
    cur.eat("*").then_some(())?;
    cur.skip_trivia();
    cur.keyword("as").then_some(())?;
    cur.skip_trivia();
    Some(ImportBinding::Namespace(cur.identifier()?.to_string()))
}

fn named_bindings(cur: &mut Cursor<'_>, bindings: &mut Vec<ImportBinding>) -> Option<()> {
    cur.eat("{").then_some(())?;
    loop {
        cur.skip_trivia();
        if cur.eat("}") {
            return Some(());
        }
        let quoted = matches!(cur.peek()?, '\'' | '"');
        let imported = cur.name()?;
        cur.skip_trivia();
        let local = if cur.keyword("as") {
            cur.skip_trivia();
            cur.identifier()?.to_string()
        } else if quoted || imported == "default" {
            return None;
        } else {
            imported.clone()
        };
        bindings.push(if imported == "default" {
            ImportBinding::Default(local)
        } else {
            ImportBinding::Named { imported, local }
        });
        cur.skip_trivia();
        if !cur.eat(",") {
            cur.skip_trivia();
            return cur.eat("}").then_some(());
        }
    }
}

/// Parses an optional `with { ... }` (or legacy `assert { ... }`) clause and
/// fills in `type` from the specifier's extension. A malformed clause fails
/// the whole statement.
fn attributes_clause(cur: &mut Cursor<'_>, specifier: &str) -> Option<Attributes> {
    let mut attributes = Attributes::new();
    let before = cur.pos();
    cur.skip_trivia();

    if cur.keyword("with") || cur.keyword("assert") {
        cur.skip_trivia();
        if cur.eat("{") {
            loop {
                cur.skip_trivia();
                if cur.eat("}") {
                    break;
                }
                let key = cur.name()?;
                cur.skip_trivia();
                cur.eat(":").then_some(())?;
                cur.skip_trivia();
                let value = cur.string()?;
                attributes.insert(key, value);
                cur.skip_trivia();
                if !cur.eat(",") {
                    cur.skip_trivia();
                    cur.eat("}").then_some(())?;
                    break;
                }
            }
        } else {
            // `assert(...)` on the next line is a call, not a clause
            cur.reset(before);
        }
    } else {
        cur.reset(before);
    }

    attributes
        .entry("type".to_string())
        .or_insert_with(|| extension_of(specifier));
    Some(attributes)
}

fn extension_of(specifier: &str) -> String {
    Path::new(specifier)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_string()
}

fn recognize_dynamic_import(input: &str) -> Option<Recognized<Statement>> {
    let mut cur = Cursor::new(input);
    if !cur.keyword("import") {
        return None;
    }
    let len = cur.pos();
    cur.skip_trivia();
    matches!(cur.peek()?, '(' | '.').then(|| Recognized::new(len, Statement::DynamicImport))
}

fn recognize_export(input: &str) -> Option<Recognized<Statement>> {
    let mut cur = statement_keyword(input, "export")?;
    cur.skip_trivia();

    let descriptor = if cur.keyword("default") {
        cur.skip_whitespace();
        let prefix = cur.pos();
        let declared = declared_default(&mut cur);
        cur.reset(prefix);
        ExportDescriptor::Default { declared }
    } else if cur.peek()? == '*' {
        reexport_all(&mut cur)?
    } else if cur.peek()? == '{' {
        export_list(&mut cur)?
    } else {
        let prefix = cur.pos();
        let (kind, names) = declaration(&mut cur)?;
        cur.reset(prefix);
        ExportDescriptor::Declaration { kind, names }
    };

    Some(Recognized::new(cur.pos(), Statement::Export(descriptor)))
}

/// Name of a function or class declared right after `export default`
fn declared_default(cur: &mut Cursor<'_>) -> Option<String> {
    let class = cur.keyword("class");
    if !class {
        if cur.keyword("async") {
            cur.skip_trivia();
        }
        cur.keyword("function").then_some(())?;
        cur.skip_trivia();
        cur.eat("*");
    }
    cur.skip_trivia();
    cur.identifier()
        .filter(|name| *name != "extends")
        .map(str::to_string)
}

fn reexport_all(cur: &mut Cursor<'_>) -> Option<ExportDescriptor> {
    cur.eat("*").then_some(())?;
    cur.skip_trivia();
    let exported = if cur.keyword("as") {
        cur.skip_trivia();
        match cur.name()? {
            name if name == "default" => ExportedAs::Default,
            name => ExportedAs::Named(name),
        }
    } else {
        ExportedAs::Spread
    };
    cur.skip_trivia();
    cur.keyword("from").then_some(())?;
    cur.skip_trivia();
    let specifier = cur.string()?;
    let attributes = attributes_clause(cur, &specifier)?;
    cur.finish_statement();

    Some(ExportDescriptor::Reexport {
        specifier,
        attributes,
        entries: vec![ReexportEntry {
            foreign: ForeignKey::Namespace,
            exported,
        }],
    })
}

fn export_list(cur: &mut Cursor<'_>) -> Option<ExportDescriptor> {
    cur.eat("{").then_some(())?;
    let mut names = Vec::new();
    let mut quoted_local = false;

    loop {
        cur.skip_trivia();
        if cur.eat("}") {
            break;
        }
        quoted_local |= matches!(cur.peek()?, '\'' | '"');
        let local = cur.name()?;
        cur.skip_trivia();
        let exported = if cur.keyword("as") {
            cur.skip_trivia();
            cur.name()?
        } else {
            local.clone()
        };
        names.push(ExportName { local, exported });
        cur.skip_trivia();
        if !cur.eat(",") {
            cur.skip_trivia();
            cur.eat("}").then_some(())?;
            break;
        }
    }

    let mut exported = HashSet::new();
    if !names.iter().all(|name| exported.insert(name.exported.clone())) {
        return None;
    }

    let before = cur.pos();
    cur.skip_trivia();
    if !cur.keyword("from") {
        cur.reset(before);
        cur.finish_statement();
        // string names only make sense when re-exporting
        return (!quoted_local).then_some(ExportDescriptor::Local(names));
    }

    cur.skip_trivia();
    let specifier = cur.string()?;
    let attributes = attributes_clause(cur, &specifier)?;
    cur.finish_statement();

    let entries = names
        .into_iter()
        .map(|name| ReexportEntry {
            foreign: if name.local == "default" {
                ForeignKey::Default
            } else {
                ForeignKey::Named(name.local)
            },
            exported: if name.exported == "default" {
                ExportedAs::Default
            } else {
                ExportedAs::Named(name.exported)
            },
        })
        .collect();

    Some(ExportDescriptor::Reexport {
        specifier,
        attributes,
        entries,
    })
}

/// Parses a declaration and recovers every name it binds
fn declaration(cur: &mut Cursor<'_>) -> Option<(DeclarationKind, Vec<String>)> {
    let kind = if cur.keyword("const") {
        DeclarationKind::Const
    } else if cur.keyword("let") {
        DeclarationKind::Let
    } else if cur.keyword("var") {
        DeclarationKind::Var
    } else if cur.keyword("class") {
        DeclarationKind::Class
    } else {
        let is_async = cur.keyword("async");
        if is_async {
            cur.skip_trivia();
        }
        cur.keyword("function").then_some(())?;
        cur.skip_trivia();
        match (is_async, cur.eat("*")) {
            (false, false) => DeclarationKind::Function,
            (false, true) => DeclarationKind::Generator,
            (true, false) => DeclarationKind::AsyncFunction,
            (true, true) => DeclarationKind::AsyncGenerator,
        }
    };

    let names = match kind {
        DeclarationKind::Const | DeclarationKind::Let | DeclarationKind::Var => {
            declarator_names(cur)?
        }
        _ => {
            cur.skip_trivia();
            vec![cur.identifier()?.to_string()]
        }
    };
    Some((kind, names))
}

fn declarator_names(cur: &mut Cursor<'_>) -> Option<Vec<String>> {
    let mut names = Vec::new();
    loop {
        binding_pattern(cur, &mut names)?;
        cur.skip_trivia();
        if cur.eat("=") {
            cur.skip_expression();
        }
        let before = cur.pos();
        cur.skip_trivia();
        if !cur.eat(",") {
            cur.reset(before);
            return Some(names);
        }
    }
}

/// Collects the names bound by an identifier, object or array pattern
fn binding_pattern(cur: &mut Cursor<'_>, names: &mut Vec<String>) -> Option<()> {
    cur.skip_trivia();
    match cur.peek()? {
        '{' => object_pattern(cur, names),
        '[' => array_pattern(cur, names),
        _ => {
            names.push(cur.identifier()?.to_string());
            Some(())
        }
    }
}

fn object_pattern(cur: &mut Cursor<'_>, names: &mut Vec<String>) -> Option<()> {
    cur.eat("{").then_some(())?;
    loop {
        cur.skip_trivia();
        if cur.eat("}") {
            return Some(());
        }
        if cur.eat("...") {
            binding_pattern(cur, names)?;
        } else {
            let shorthand = match cur.peek()? {
                '[' => {
                    cur.skip_balanced()?;
                    None
                }
                '\'' | '"' => {
                    cur.string()?;
                    None
                }
                c if c.is_ascii_digit() => {
                    let digits = cur
                        .rest()
                        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '.'))
                        .unwrap_or(cur.rest().len());
                    cur.reset(cur.pos() + digits);
                    None
                }
                _ => Some(cur.identifier()?.to_string()),
            };
            cur.skip_trivia();
            if cur.eat(":") {
                binding_pattern(cur, names)?;
            } else {
                names.push(shorthand?);
            }
            cur.skip_trivia();
            if cur.eat("=") {
                cur.skip_expression();
            }
        }
        cur.skip_trivia();
        if !cur.eat(",") {
            cur.skip_trivia();
            return cur.eat("}").then_some(());
        }
    }
}

fn array_pattern(cur: &mut Cursor<'_>, names: &mut Vec<String>) -> Option<()> {
    cur.eat("[").then_some(())?;
    loop {
        cur.skip_trivia();
        if cur.eat("]") {
            return Some(());
        }
        if cur.eat(",") {
            // hole
            continue;
        }
        if cur.eat("...") {
            binding_pattern(cur, names)?;
        } else {
            binding_pattern(cur, names)?;
            cur.skip_trivia();
            if cur.eat("=") {
                cur.skip_expression();
            }
        }
        cur.skip_trivia();
        if !cur.eat(",") {
            cur.skip_trivia();
            return cur.eat("]").then_some(());
        }
    }
}
