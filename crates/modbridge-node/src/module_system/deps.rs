// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Dependency scanning and traversal

use modbridge_lexer::{Captures, Recognized, Recognizer, Tokenizer, parse_string_at};
use regex::Regex;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, trace, warn};

use super::esm::ModuleType;
use super::resolver::{ResolveScope, SpecifierResolver};
use super::scan::{skip_len, word_len};
use crate::error::Result;

/// Files at or above this many bytes are scanned with plain regexes
pub const DEFAULT_LARGE_FILE_THRESHOLD: usize = 50_000;

const REQUIRE_PATTERN: &str = r#"\brequire\s*\(\s*(?P<module>"[^"\n]*"|'[^'\n]*')"#;
const IMPORT_PATTERN: &str =
    r#"\bimport\b\s*(?:\(\s*|[^;'"()]*?\bfrom\s*)?(?P<module>"[^"\n]*"|'[^'\n]*')"#;
const EXPORT_FROM_PATTERN: &str =
    r#"\bexport\b\s*(?:\*|\{)[^;'"]*?\bfrom\s*(?P<module>"[^"\n]*"|'[^'\n]*')"#;

static UNANCHORED: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [REQUIRE_PATTERN, IMPORT_PATTERN, EXPORT_FROM_PATTERN]
        .map(|pattern| Regex::new(pattern).expect("valid regex"))
});

static ANCHORED: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [REQUIRE_PATTERN, IMPORT_PATTERN, EXPORT_FROM_PATTERN]
        .map(|pattern| Regex::new(&format!("^(?:{pattern})")).expect("valid regex"))
});

/// List the specifiers `source` depends on, in order of first appearance.
///
/// Sources of `threshold` bytes or more skip tokenizing and are matched with
/// regexes alone, so specifiers inside strings or comments may be reported.
pub fn scan_dependencies(source: &str, threshold: usize) -> Vec<String> {
    let raw: Vec<String> = if source.len() >= threshold {
        warn!(
            bytes = source.len(),
            threshold, "file too large for tokenizing, scanning with regexes"
        );
        UNANCHORED
            .iter()
            .flat_map(|regex| regex.captures_iter(source))
            .filter_map(|caps| caps.name("module").map(|m| m.as_str().to_string()))
            .collect()
    } else {
        let mut recognizers = vec![(
            "skip",
            Recognizer::func(|s: &str| skip_len(s).map(Recognized::<Captures>::bare)),
        )];
        for (name, regex) in ["require", "import", "export"].into_iter().zip(ANCHORED.iter()) {
            recognizers.push((
                name,
                Recognizer::Pattern {
                    regex: regex.clone(),
                    map: std::convert::identity,
                },
            ));
        }
        recognizers.push((
            "word",
            Recognizer::func(|s: &str| word_len(s).map(Recognized::<Captures>::bare)),
        ));

        Tokenizer::new(source, recognizers)
            .tokens()
            .iter()
            .filter_map(|token| token.data.get("module").cloned())
            .collect()
    };

    let mut seen = HashSet::new();
    raw.iter()
        .filter_map(|literal| parse_string_at(literal).map(|(value, _)| value))
        .filter(|specifier| seen.insert(specifier.clone()))
        .collect()
}

/// Collect `entry` and every file it transitively depends on.
///
/// Each file is read once; core modules and specifiers that do not resolve
/// are passed over. With a build context bound to `scope`, file contents
/// come from the build when it knows the file.
pub async fn walk_dependencies(
    entry: &Path,
    scope: &ResolveScope<'_>,
    threshold: usize,
) -> Result<Vec<PathBuf>> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    let mut queue = VecDeque::from([entry.to_path_buf()]);

    while let Some(file) = queue.pop_front() {
        if !visited.insert(file.clone()) {
            continue;
        }
        order.push(file.clone());

        if ModuleType::from_path(&file) == ModuleType::Json {
            continue;
        }

        let source = read_source(&file, scope).await?;
        let base_dir = file.parent().unwrap_or_else(|| Path::new("."));
        debug!(file = %file.display(), "traversing imports");

        for specifier in scan_dependencies(&source, threshold) {
            let resolution = scope.resolve_specifier(base_dir, &specifier).await;
            if !resolution.is_file() {
                trace!(specifier, origin = ?resolution.origin, "not followed");
                continue;
            }
            if !visited.contains(&resolution.path) {
                queue.push_back(resolution.path);
            }
        }
    }

    Ok(order)
}

async fn read_source(file: &Path, scope: &ResolveScope<'_>) -> Result<String> {
    if let Some(build) = scope.build() {
        match build.get_file(file).await {
            Ok(built) => return Ok(built.content),
            Err(err) => debug!(file = %file.display(), error = %err, "reading outside the build"),
        }
    }
    Ok(tokio::fs::read_to_string(file).await?)
}
