// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Import specifier resolution (Node.js algorithm)
//!
//! ## Stages
//!
//! | Stage | Candidate |
//! |-------|-----------|
//! | Source | `base_dir/specifier` |
//! | Build | `base_dir` rebased from `entry` into `build_dir`, then `specifier` |
//! | Package | `packages_dir/specifier` (bare specifiers only) |
//! | Package main | `packages_dir/<package>/<main>` from `package.json` |
//!
//! Every candidate is tried with each of [`SUFFIXES`] in order; the first
//! regular file wins.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace, warn};

use super::build::BuildContext;
use super::cache::{CacheKey, ResolutionCache};

/// Core modules resolved by name, with or without the `node:` scheme
pub const CORE_MODULES: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "quic",
    "readline",
    "repl",
    "sqlite",
    "stream",
    "string_decoder",
    "test",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Suffixes appended to every candidate path, in order
pub const SUFFIXES: &[&str] = &[
    "",
    ".js",
    ".mjs",
    ".cjs",
    ".json",
    "/index.js",
    "/index.mjs",
    "/index.cjs",
    "/index.json",
];

/// Where a resolved specifier points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Built-in module, never probed
    Core,
    /// File reached from the importing directory or the build tree
    Local,
    /// File inside the packages directory
    Package,
    /// Nothing matched
    Unresolved,
}

/// Result of resolving one specifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Resolution {
    /// Where the specifier points
    pub origin: Origin,
    /// Specifier to substitute into rewritten source
    pub specifier: String,
    /// Absolute path of the file (the specifier itself for core modules)
    pub path: PathBuf,
}

impl Resolution {
    /// Whether the file was found in the packages directory
    pub fn from_package_dir(&self) -> bool {
        self.origin == Origin::Package
    }

    /// Whether the specifier names a file that exists
    pub fn is_file(&self) -> bool {
        matches!(self.origin, Origin::Local | Origin::Package)
    }
}

/// Check if a specifier names a core module
pub fn is_core(specifier: &str) -> bool {
    let name = specifier.strip_prefix("node:").unwrap_or(specifier);
    let end = name.find(['.', '/']).unwrap_or(name.len());
    CORE_MODULES.contains(&&name[..end])
}

/// Check if a specifier is a path rather than a package name
pub fn is_path_specifier(specifier: &str) -> bool {
    specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier == "."
        || specifier == ".."
        || Path::new(specifier).is_absolute()
}

/// Split a package specifier into name and optional subpath
pub fn parse_package_specifier(specifier: &str) -> (&str, Option<&str>) {
    if let Some(scoped) = specifier.strip_prefix('@') {
        // @scope/name or @scope/name/subpath
        if let Some(slash_pos) = scoped.find('/') {
            let after_scope = &specifier[slash_pos + 2..];
            if let Some(subpath_pos) = after_scope.find('/') {
                let name_end = slash_pos + 2 + subpath_pos;
                return (&specifier[..name_end], Some(&specifier[name_end + 1..]));
            }
        }
        (specifier, None)
    } else if let Some((name, subpath)) = specifier.split_once('/') {
        (name, Some(subpath))
    } else {
        (specifier, None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Source,
    Build,
    Package,
    PackageMain,
}

impl Stage {
    const ALL: [Stage; 4] = [Stage::Source, Stage::Build, Stage::Package, Stage::PackageMain];

    fn origin(self) -> Origin {
        match self {
            Stage::Source | Stage::Build => Origin::Local,
            Stage::Package | Stage::PackageMain => Origin::Package,
        }
    }
}

/// Minimal package.json structure for resolution
#[derive(Debug, Deserialize)]
struct PackageJson {
    main: Option<String>,
}

/// Resolver implementing the staged lookup with a shared cache
#[derive(Debug)]
pub struct ImportResolver {
    packages_dir: PathBuf,
    cache: ResolutionCache,
}

impl ImportResolver {
    /// Create a resolver probing `packages_dir` for bare specifiers
    pub fn new(packages_dir: impl Into<PathBuf>) -> Self {
        Self {
            packages_dir: absolute(&packages_dir.into()),
            cache: ResolutionCache::new(),
        }
    }

    /// The packages directory probed for bare specifiers
    pub fn packages_dir(&self) -> &Path {
        &self.packages_dir
    }

    /// The resolution cache
    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Resolve `specifier` as imported from a file in `base_dir`.
    ///
    /// Never fails: a specifier nothing matches comes back unchanged with
    /// [`Origin::Unresolved`] after a warning listing every path tried.
    pub async fn resolve(
        &self,
        base_dir: &Path,
        specifier: &str,
        build: Option<&dyn BuildContext>,
    ) -> Resolution {
        if is_core(specifier) {
            trace!(specifier, "core module");
            return Resolution {
                origin: Origin::Core,
                specifier: specifier.to_string(),
                path: PathBuf::from(specifier),
            };
        }

        let key = CacheKey::new(base_dir, specifier, build.is_some());
        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }

        let base_dir = absolute(base_dir);
        let mut tried = Vec::new();

        for stage in Stage::ALL {
            let Some(candidate) = self.candidate(stage, &base_dir, specifier, build).await else {
                continue;
            };
            for suffix in SUFFIXES {
                let path = with_suffix(&candidate, suffix);
                if is_file(&path).await {
                    debug!(specifier, ?stage, path = %path.display(), "resolved");
                    let resolution = Resolution {
                        origin: stage.origin(),
                        specifier: self.rewrite(&base_dir, &path, build).await,
                        path,
                    };
                    self.cache.set(key, resolution.clone());
                    return resolution;
                }
                tried.push(path);
            }
        }

        warn!(
            specifier,
            from = %base_dir.display(),
            tried = ?tried,
            "could not locate import"
        );
        Resolution {
            origin: Origin::Unresolved,
            specifier: specifier.to_string(),
            path: normalize(&base_dir.join(specifier)),
        }
    }

    async fn candidate(
        &self,
        stage: Stage,
        base_dir: &Path,
        specifier: &str,
        build: Option<&dyn BuildContext>,
    ) -> Option<PathBuf> {
        match stage {
            Stage::Source => Some(normalize(&base_dir.join(specifier))),
            Stage::Build => {
                let rebased = build?.rebase(base_dir)?;
                Some(normalize(&rebased.join(specifier)))
            }
            Stage::Package => {
                (!is_path_specifier(specifier)).then(|| normalize(&self.packages_dir.join(specifier)))
            }
            Stage::PackageMain => {
                if is_path_specifier(specifier) {
                    return None;
                }
                let (name, subpath) = parse_package_specifier(specifier);
                if subpath.is_some() {
                    return None;
                }
                let package_dir = self.packages_dir.join(name);
                let manifest = tokio::fs::read_to_string(package_dir.join("package.json"))
                    .await
                    .ok()?;
                let package: PackageJson = match serde_json::from_str(&manifest) {
                    Ok(package) => package,
                    Err(err) => {
                        warn!(package = name, error = %err, "unreadable package.json");
                        return None;
                    }
                };
                Some(normalize(&package_dir.join(package.main?)))
            }
        }
    }

    /// Computes the specifier to write back: relative to the importing
    /// directory, or to its build counterpart when a build is active.
    async fn rewrite(&self, base_dir: &Path, found: &Path, build: Option<&dyn BuildContext>) -> String {
        let Some(build) = build else {
            return relative_specifier(base_dir, found);
        };

        let from = build.rebase(base_dir).unwrap_or_else(|| base_dir.to_path_buf());
        if found.starts_with(build.build_dir()) {
            return relative_specifier(&from, found);
        }

        match build.get_file(found).await {
            Ok(built) => relative_specifier(&from, &built.output_path),
            Err(err) => {
                debug!(path = %found.display(), error = %err, "file is not part of the build");
                relative_specifier(&from, found)
            }
        }
    }
}

impl Default for ImportResolver {
    fn default() -> Self {
        Self::new("node_modules")
    }
}

/// Something that can rewrite specifiers for a file's directory.
///
/// Transforms depend on this rather than on [`ImportResolver`] so callers
/// can bind a build context or substitute a fixed mapping.
#[async_trait]
pub trait SpecifierResolver: Send + Sync {
    /// Resolve `specifier` as imported from a file in `base_dir`
    async fn resolve_specifier(&self, base_dir: &Path, specifier: &str) -> Resolution;
}

#[async_trait]
impl SpecifierResolver for ImportResolver {
    async fn resolve_specifier(&self, base_dir: &Path, specifier: &str) -> Resolution {
        self.resolve(base_dir, specifier, None).await
    }
}

/// An [`ImportResolver`] bound to an optional build context
#[derive(Clone, Copy)]
pub struct ResolveScope<'a> {
    resolver: &'a ImportResolver,
    build: Option<&'a dyn BuildContext>,
}

impl<'a> ResolveScope<'a> {
    /// Bind a resolver to a build context
    pub fn new(resolver: &'a ImportResolver, build: Option<&'a dyn BuildContext>) -> Self {
        Self { resolver, build }
    }

    /// The bound build context, if any
    pub fn build(&self) -> Option<&'a dyn BuildContext> {
        self.build
    }
}

impl std::fmt::Debug for ResolveScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveScope")
            .field("resolver", self.resolver)
            .field("build_active", &self.build.is_some())
            .finish()
    }
}

#[async_trait]
impl SpecifierResolver for ResolveScope<'_> {
    async fn resolve_specifier(&self, base_dir: &Path, specifier: &str) -> Resolution {
        self.resolver.resolve(base_dir, specifier, self.build).await
    }
}

/// Maps every specifier to itself without touching the filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver;

#[async_trait]
impl SpecifierResolver for IdentityResolver {
    async fn resolve_specifier(&self, base_dir: &Path, specifier: &str) -> Resolution {
        Resolution {
            origin: if is_core(specifier) { Origin::Core } else { Origin::Local },
            specifier: specifier.to_string(),
            path: normalize(&base_dir.join(specifier)),
        }
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut joined = path.as_os_str().to_os_string();
    joined.push(suffix);
    PathBuf::from(joined)
}

fn absolute(path: &Path) -> PathBuf {
    normalize(&std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()))
}

/// Lexically removes `.` and `..` components.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `/`-separated path from `from` to `to`, always starting with `./` or `../`.
fn relative_specifier(from: &Path, to: &Path) -> String {
    let Some(relative) = pathdiff::diff_paths(to, from) else {
        return to.to_string_lossy().replace('\\', "/");
    };
    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    if joined.starts_with("../") || joined == ".." {
        joined
    } else {
        format!("./{joined}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_system::build::MirrorBuild;

    async fn touch(path: &Path, content: &str) {
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(path, content).await.unwrap();
    }

    #[test]
    fn test_is_core() {
        assert!(is_core("fs"));
        assert!(is_core("node:fs"));
        assert!(is_core("fs/promises"));
        assert!(is_core("node:path/posix"));
        assert!(!is_core("lodash"));
        assert!(!is_core("./fs"));
        assert!(!is_core("fsevents"));
    }

    #[test]
    fn test_parse_package_specifier() {
        assert_eq!(parse_package_specifier("lodash"), ("lodash", None));
        assert_eq!(parse_package_specifier("lodash/get"), ("lodash", Some("get")));
        assert_eq!(parse_package_specifier("@types/node"), ("@types/node", None));
        assert_eq!(
            parse_package_specifier("@babel/core/lib/index"),
            ("@babel/core", Some("lib/index"))
        );
    }

    #[test]
    fn test_relative_specifier() {
        assert_eq!(relative_specifier(Path::new("/a/b"), Path::new("/a/b/c.js")), "./c.js");
        assert_eq!(relative_specifier(Path::new("/a/b"), Path::new("/a/c.js")), "../c.js");
        assert_eq!(
            relative_specifier(Path::new("/a"), Path::new("/a/node_modules/x/index.js")),
            "./node_modules/x/index.js"
        );
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[tokio::test]
    async fn test_core_module_untouched() {
        let resolver = ImportResolver::new("/nowhere");
        let res = resolver.resolve(Path::new("/src"), "node:fs/promises", None).await;
        assert_eq!(res.origin, Origin::Core);
        assert_eq!(res.specifier, "node:fs/promises");
        assert!(resolver.cache().is_empty());
    }

    #[tokio::test]
    async fn test_exact_file() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("m.js"), "").await;

        let resolver = ImportResolver::new(dir.path().join("node_modules"));
        let res = resolver.resolve(dir.path(), "./m.js", None).await;
        assert_eq!(res.origin, Origin::Local);
        assert_eq!(res.specifier, "./m.js");
        assert!(!res.from_package_dir());
    }

    #[tokio::test]
    async fn test_suffix_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("util.mjs"), "").await;
        touch(&dir.path().join("util.json"), "{}").await;

        let resolver = ImportResolver::new(dir.path().join("node_modules"));
        let res = resolver.resolve(dir.path(), "./util", None).await;
        assert_eq!(res.specifier, "./util.mjs");
    }

    #[tokio::test]
    async fn test_directory_index() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("util/index.mjs"), "").await;

        let resolver = ImportResolver::new(dir.path().join("node_modules"));
        let res = resolver.resolve(dir.path(), "./util", None).await;
        assert_eq!(res.origin, Origin::Local);
        assert_eq!(res.specifier, "./util/index.mjs");
        assert_eq!(res.path, absolute(&dir.path().join("util/index.mjs")));
    }

    #[tokio::test]
    async fn test_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("lib/a.js"), "").await;
        touch(&dir.path().join("shared.js"), "").await;

        let resolver = ImportResolver::new(dir.path().join("node_modules"));
        let res = resolver.resolve(&dir.path().join("lib"), "../shared", None).await;
        assert_eq!(res.specifier, "../shared.js");
    }

    #[tokio::test]
    async fn test_package_main() {
        let dir = tempfile::tempdir().unwrap();
        let packages = dir.path().join("node_modules");
        touch(
            &packages.join("lodash/package.json"),
            r#"{ "name": "lodash", "main": "lib/lodash.js" }"#,
        )
        .await;
        touch(&packages.join("lodash/lib/lodash.js"), "").await;

        let resolver = ImportResolver::new(&packages);
        let res = resolver.resolve(dir.path(), "lodash", None).await;
        assert_eq!(res.origin, Origin::Package);
        assert!(res.from_package_dir());
        assert_eq!(res.specifier, "./node_modules/lodash/lib/lodash.js");
    }

    #[tokio::test]
    async fn test_scoped_package_main() {
        let dir = tempfile::tempdir().unwrap();
        let packages = dir.path().join("node_modules");
        touch(&packages.join("@acme/ui/package.json"), r#"{ "main": "dist/ui.cjs" }"#).await;
        touch(&packages.join("@acme/ui/dist/ui.cjs"), "").await;

        let resolver = ImportResolver::new(&packages);
        let res = resolver.resolve(dir.path(), "@acme/ui", None).await;
        assert_eq!(res.path, absolute(&packages.join("@acme/ui/dist/ui.cjs")));
    }

    #[tokio::test]
    async fn test_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ImportResolver::new(dir.path().join("node_modules"));
        let res = resolver.resolve(dir.path(), "./missing", None).await;
        assert_eq!(res.origin, Origin::Unresolved);
        assert_eq!(res.specifier, "./missing");
        assert!(!res.is_file());
        assert!(resolver.cache().is_empty());
    }

    #[tokio::test]
    async fn test_second_lookup_hits_cache() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("m.js"), "").await;

        let resolver = ImportResolver::new(dir.path().join("node_modules"));
        let first = resolver.resolve(dir.path(), "./m", None).await;
        let hits = resolver.cache().hits();
        let second = resolver.resolve(dir.path(), "./m", None).await;
        assert_eq!(first, second);
        assert_eq!(resolver.cache().hits(), hits + 1);
    }

    #[tokio::test]
    async fn test_build_context_rewrites_into_output_tree() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dist = dir.path().join("dist");
        touch(&src.join("pages/index.js"), "").await;
        touch(&src.join("lib/util.js"), "").await;

        let build = MirrorBuild::new(&src, &dist);
        let resolver = ImportResolver::new(dir.path().join("node_modules"));
        let res = resolver
            .resolve(&src.join("pages"), "../lib/util", Some(&build))
            .await;
        assert_eq!(res.origin, Origin::Local);
        assert_eq!(res.specifier, "../lib/util.js");
        assert_eq!(res.path, absolute(&src.join("lib/util.js")));
    }

    #[tokio::test]
    async fn test_build_stage_finds_generated_files() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dist = dir.path().join("dist");
        tokio::fs::create_dir_all(&src).await.unwrap();
        touch(&dist.join("generated.js"), "").await;

        let build = MirrorBuild::new(&src, &dist);
        let resolver = ImportResolver::new(dir.path().join("node_modules"));
        let res = resolver.resolve(&src, "./generated", Some(&build)).await;
        assert_eq!(res.origin, Origin::Local);
        assert_eq!(res.specifier, "./generated.js");

        let without = resolver.resolve(&src, "./generated", None).await;
        assert_eq!(without.origin, Origin::Unresolved);
    }

    #[tokio::test]
    async fn test_identity_resolver() {
        let res = IdentityResolver.resolve_specifier(Path::new("/src"), "./m.js").await;
        assert_eq!(res.specifier, "./m.js");
        assert_eq!(res.path, PathBuf::from("/src/m.js"));
    }
}
