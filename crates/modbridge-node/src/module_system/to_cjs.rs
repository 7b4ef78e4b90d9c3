// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! ES module to CommonJS transform
//!
//! Statements are rewritten in place; exports are collected and written as a
//! tail at the end of the file, named assignments first and the default
//! merge last.

use modbridge_lexer::is_identifier;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

use super::diagnostics::{Diagnostics, TransformOutput};
use super::esm::{
    Attributes, ExportDescriptor, ExportedAs, ForeignKey, ImportBinding, ImportDescriptor,
    ReexportEntry, Statement, parse_module,
};
use super::resolver::SpecifierResolver;
use super::splice::{Splicer, SyntheticNames};

/// Convert an ES module to CommonJS.
///
/// Every specifier goes through `resolver` relative to `base_dir`; the
/// rewritten specifier is what ends up in the `require` call.
pub async fn to_commonjs<R>(source: &str, base_dir: &Path, resolver: &R) -> TransformOutput
where
    R: SpecifierResolver + ?Sized,
{
    let parsed = parse_module(source);
    let mut names = SyntheticNames::new(source);
    let mut splicer = Splicer::new(source);
    let mut tail = Vec::new();
    let mut default_value: Option<String> = None;
    let mut dependencies = Vec::new();
    let mut diagnostics = Diagnostics {
        skipped: parsed.skipped,
        ..Diagnostics::default()
    };

    for token in &parsed.statements {
        let indent = leading_whitespace(&token.text);

        match &token.data {
            Statement::DynamicImport => splicer.replace(token.span, "require"),
            Statement::Import(import) => {
                let resolution = resolver.resolve_specifier(base_dir, &import.specifier).await;
                diagnostics.track(&resolution);
                let module = names.numbered("__modbridge_mod_");
                let replacement = import_replacement(indent, &module, &resolution.specifier, import);
                splicer.replace(token.span, replacement);
                dependencies.push(resolution);
            }
            Statement::Export(ExportDescriptor::Default { declared }) => match declared {
                Some(name) => {
                    splicer.replace(token.span, indent);
                    default_value = Some(name.clone());
                }
                None => {
                    let name = names.named("__modbridge_default");
                    splicer.replace(token.span, format!("{indent}const {name} = "));
                    default_value = Some(name);
                }
            },
            Statement::Export(ExportDescriptor::Local(exports)) => {
                splicer.replace(token.span, indent);
                for export in exports {
                    if export.exported == "default" {
                        default_value = Some(export.local.clone());
                    } else {
                        tail.push(assign_export(&export.exported, &export.local));
                    }
                }
            }
            Statement::Export(ExportDescriptor::Declaration { names: bound, .. }) => {
                splicer.replace(token.span, indent);
                tail.extend(bound.iter().map(|name| assign_export(name, name)));
            }
            Statement::Export(ExportDescriptor::Reexport {
                specifier,
                attributes,
                entries,
            }) => {
                let resolution = resolver.resolve_specifier(base_dir, specifier).await;
                diagnostics.track(&resolution);
                let module = names.numbered("__modbridge_mod_");
                splicer.replace(
                    token.span,
                    format!("{indent}{}", require_statement(&module, &resolution.specifier, attributes)),
                );
                for entry in entries {
                    match reexport_line(&module, entry) {
                        Ok(line) => tail.push(line),
                        Err(value) => default_value = Some(value),
                    }
                }
                dependencies.push(resolution);
            }
            Statement::Skip | Statement::Word => {}
        }
    }

    debug!(
        edits = splicer.len(),
        exports = tail.len(),
        default = default_value.is_some(),
        "commonjs transform"
    );

    let mut code = splicer.apply();
    if !tail.is_empty() || default_value.is_some() {
        if !code.ends_with('\n') {
            code.push('\n');
        }
        for line in tail {
            code.push_str(&line);
            code.push('\n');
        }
        if let Some(value) = default_value {
            code.push_str(&default_merge(&mut names, &value));
        }
    }

    TransformOutput {
        code,
        dependencies,
        diagnostics,
    }
}

fn leading_whitespace(text: &str) -> &str {
    &text[..text.len() - text.trim_start().len()]
}

fn json_string(value: &str) -> String {
    Value::from(value).to_string()
}

fn json_attributes(attributes: &Attributes) -> String {
    Value::Object(
        attributes
            .iter()
            .map(|(key, value)| (key.clone(), Value::from(value.as_str())))
            .collect(),
    )
    .to_string()
}

fn require_statement(module: &str, specifier: &str, attributes: &Attributes) -> String {
    format!(
        "const {module} = require({}, {});",
        json_string(specifier),
        json_attributes(attributes)
    )
}

fn import_replacement(indent: &str, module: &str, specifier: &str, import: &ImportDescriptor) -> String {
    let mut out = format!("{indent}{}", require_statement(module, specifier, &import.attributes));
    for binding in &import.bindings {
        let line = match binding {
            ImportBinding::Default(local) | ImportBinding::Namespace(local) => {
                format!(" const {local} = {module};")
            }
            ImportBinding::Named { imported, local } => {
                format!(" const {local} = {module}[{}];", json_string(imported))
            }
        };
        out.push_str(&line);
    }
    out
}

fn assign_export(exported: &str, value: &str) -> String {
    format!("module.exports[{}] = {value};", json_string(exported))
}

/// Tail line for one re-export entry, or the default value it provides
fn reexport_line(module: &str, entry: &ReexportEntry) -> Result<String, String> {
    let value = match &entry.foreign {
        ForeignKey::Namespace | ForeignKey::Default => module.to_string(),
        ForeignKey::Named(key) => format!("{module}[{}]", json_string(key)),
    };
    match &entry.exported {
        ExportedAs::Named(name) => Ok(assign_export(name, &value)),
        ExportedAs::Spread => Ok(format!(
            "for (const key in {module}) if (key !== \"default\") module.exports[key] = {module}[key];"
        )),
        ExportedAs::Default => Err(value),
    }
}

/// Copies the named exports onto an object or function default, then makes
/// it the module's export. A primitive default replaces everything.
fn default_merge(names: &mut SyntheticNames<'_>, value: &str) -> String {
    let mut out = String::new();
    let target = if is_identifier(value) {
        value.to_string()
    } else {
        let name = names.named("__modbridge_default");
        out.push_str(&format!("const {name} = {value};\n"));
        name
    };
    out.push_str(&format!(
        "if ({target} !== null && (typeof {target} === \"object\" || typeof {target} === \"function\")) {{ \
         for (const key in module.exports) {target}[key] = module.exports[key]; }}\n"
    ));
    out.push_str(&format!("module.exports = {target};\n"));
    out
}
