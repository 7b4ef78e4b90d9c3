// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! CommonJS to ES module transform

use modbridge_lexer::{Recognized, Recognizer, Span, Tokenizer};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use super::diagnostics::{Diagnostics, TransformOutput};
use super::exports::ExportInspector;
use super::resolver::SpecifierResolver;
use super::scan::{Cursor, skip_len, word_len};
use super::splice::{Splicer, SyntheticNames};

/// Declares the CommonJS bindings the module body expects
const PRELUDE: &str = "const exports = {};\nconst module = { exports };\n";

/// A `require("...")` call with a literal specifier
#[derive(Debug, Clone, PartialEq, Eq)]
struct RequireCall {
    span: Span,
    specifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Scanned {
    Skip,
    Require(String),
    Word,
}

/// Convert a CommonJS module at `path` to an ES module.
///
/// Each `require` call with a string literal specifier is hoisted into a
/// namespace import and replaced by the module's default export, falling
/// back to the namespace. The export shape comes from `inspector`: either
/// `module.exports` becomes the default export, or each known key becomes a
/// named export.
pub async fn to_esm<R, I>(source: &str, path: &Path, resolver: &R, inspector: &I) -> TransformOutput
where
    R: SpecifierResolver + ?Sized,
    I: ExportInspector + ?Sized,
{
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let calls = require_calls(source);

    let mut names = SyntheticNames::new(source);
    let mut splicer = Splicer::new(source);
    let mut header = String::new();
    let mut imported: HashMap<String, String> = HashMap::new();
    let mut dependencies = Vec::new();
    let mut diagnostics = Diagnostics::default();

    for call in calls {
        let resolution = resolver.resolve_specifier(base_dir, &call.specifier).await;
        diagnostics.track(&resolution);

        let value = match imported.get(&resolution.specifier) {
            Some(value) => value.clone(),
            None => {
                let namespace = names.numbered("__modbridge_ns_");
                let default = names.numbered("__modbridge_default_");
                header.push_str(&format!(
                    "import * as {namespace} from {};\nconst {default} = {namespace}.default;\n",
                    Value::from(resolution.specifier.as_str())
                ));
                let value = format!("({default} ?? {namespace})");
                imported.insert(resolution.specifier.clone(), value.clone());
                value
            }
        };

        splicer.replace(call.span, value);
        dependencies.push(resolution);
    }

    let shape = inspector.inspect(source, path);
    debug!(
        path = %path.display(),
        requires = splicer.len(),
        imports = imported.len(),
        "esm transform"
    );

    let mut code = header;
    code.push_str(PRELUDE);
    code.push_str(&splicer.apply());
    if !code.ends_with('\n') {
        code.push('\n');
    }

    if shape.has_default || shape.names.is_empty() {
        code.push_str("export default module.exports;\n");
    } else {
        let bindings: Vec<(String, String)> = shape
            .names
            .iter()
            .map(|key| (Value::from(key.as_str()).to_string(), names.numbered("__modbridge_export_")))
            .collect();
        let destructure = bindings
            .iter()
            .map(|(key, local)| format!("{key}: {local}"))
            .collect::<Vec<_>>()
            .join(", ");
        let list = bindings
            .iter()
            .map(|(key, local)| format!("{local} as {key}"))
            .collect::<Vec<_>>()
            .join(", ");
        code.push_str(&format!("const {{ {destructure} }} = module.exports;\n"));
        code.push_str(&format!("export {{ {list} }};\n"));
    }

    TransformOutput {
        code,
        dependencies,
        diagnostics,
    }
}

/// Finds `require` calls that are not member accesses
fn require_calls(source: &str) -> Vec<RequireCall> {
    let tokenizer = Tokenizer::new(
        source,
        vec![
            (
                "skip",
                Recognizer::func(|s: &str| skip_len(s).map(|n| Recognized::new(n, Scanned::Skip))),
            ),
            ("require", Recognizer::func(recognize_require)),
            (
                "word",
                Recognizer::func(|s: &str| word_len(s).map(|n| Recognized::new(n, Scanned::Word))),
            ),
        ],
    );

    tokenizer
        .tokens()
        .iter()
        .filter_map(|token| match &token.data {
            Scanned::Require(specifier) if !after_member_access(source, token.span.start) => {
                Some(RequireCall {
                    span: token.span,
                    specifier: specifier.clone(),
                })
            }
            _ => None,
        })
        .collect()
}

fn recognize_require(input: &str) -> Option<Recognized<Scanned>> {
    let mut cur = Cursor::new(input);
    cur.keyword("require").then_some(())?;
    cur.skip_trivia();
    let open = cur.pos();
    cur.eat("(").then_some(())?;
    cur.skip_trivia();
    let specifier = cur.string()?;
    cur.reset(open);
    cur.skip_balanced()?;
    Some(Recognized::new(cur.pos(), Scanned::Require(specifier)))
}

fn after_member_access(source: &str, offset: usize) -> bool {
    source[..offset].trim_end().ends_with('.')
}
