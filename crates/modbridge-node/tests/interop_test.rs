//! Module Interop Integration Tests
//!
//! Exercises the transforms and the resolver together against fixture trees
//! written to temporary directories.

use modbridge_node::module_system::esm::{ExportDescriptor, Statement};
use modbridge_node::module_system::{Origin, parse_module};
use modbridge_node::{
    IdentityResolver, ImportResolver, MirrorBuild, ResolveScope, StaticExportInspector, to_commonjs,
    to_esm,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

/// Write a fixture file, creating parent directories
async fn write(path: &Path, content: &str) {
    tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
    tokio::fs::write(path, content).await.unwrap();
}

/// Exported names and whether a default export is present
fn export_surface(code: &str) -> (bool, Vec<String>) {
    let mut has_default = false;
    let mut names = Vec::new();
    for token in parse_module(code).statements {
        match token.data {
            Statement::Export(ExportDescriptor::Default { .. }) => has_default = true,
            Statement::Export(ExportDescriptor::Local(list)) => {
                names.extend(list.into_iter().map(|name| name.exported));
            }
            Statement::Export(ExportDescriptor::Declaration { names: bound, .. }) => {
                names.extend(bound);
            }
            _ => {}
        }
    }
    names.sort();
    (has_default, names)
}

#[tokio::test]
async fn test_import_aliases_required_module() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    write(&src.join("m.js"), "module.exports = 1;\n").await;

    let resolver = ImportResolver::new(dir.path().join("node_modules"));
    let out = to_commonjs("import x from \"./m.js\";\n", &src, &resolver).await;

    assert!(out.code.contains("require(\"./m.js\", {\"type\":\"js\"})"));
    assert!(out.code.contains("const x = __modbridge_mod_0;"));
    assert_eq!(out.dependencies[0].origin, Origin::Local);
    assert_eq!(out.dependencies[0].path, src.join("m.js"));
}

#[tokio::test]
async fn test_primitive_default_replaces_named_keys() {
    let out = to_commonjs("exports.a = 1;\nexport default 5;\n", Path::new("/src"), &IdentityResolver).await;

    let lines: Vec<_> = out.code.lines().collect();
    assert_eq!(lines[0], "exports.a = 1;");
    assert_eq!(lines[1], "const __modbridge_default = 5;");
    assert!(lines[2].starts_with("if (__modbridge_default !== null && (typeof __modbridge_default === \"object\""));
    assert_eq!(lines[3], "module.exports = __modbridge_default;");
}

#[tokio::test]
async fn test_directory_resolves_to_index_mjs() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    write(&src.join("util/index.mjs"), "export const x = 1;\n").await;

    let resolver = ImportResolver::new(dir.path().join("node_modules"));
    let resolution = resolver.resolve(&src, "./util", None).await;

    assert!(!resolution.from_package_dir());
    assert_eq!(resolution.path, src.join("util/index.mjs"));
    assert_eq!(resolution.specifier, "./util/index.mjs");
}

#[tokio::test]
async fn test_package_main_entry() {
    let dir = tempdir().unwrap();
    let packages = dir.path().join("node_modules");
    write(&packages.join("lodash/package.json"), "{\"name\": \"lodash\", \"main\": \"index.js\"}").await;
    write(&packages.join("lodash/index.js"), "module.exports = {};\n").await;

    let resolver = ImportResolver::new(&packages);
    let resolution = resolver.resolve(&dir.path().join("src"), "lodash", None).await;

    assert!(resolution.from_package_dir());
    assert_eq!(resolution.path, packages.join("lodash/index.js"));
}

#[tokio::test]
async fn test_unresolved_specifier_left_untouched() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    tokio::fs::create_dir_all(&src).await.unwrap();

    let resolver = ImportResolver::new(dir.path().join("node_modules"));
    let out = to_commonjs("import m from './missing';\n", &src, &resolver).await;

    assert!(out.code.contains("require(\"./missing\", {\"type\":\"\"})"));
    assert_eq!(out.diagnostics.unresolved, ["./missing"]);
    assert_eq!(out.dependencies[0].origin, Origin::Unresolved);
}

#[tokio::test]
async fn test_round_trip_preserves_exports() {
    let source = concat!(
        "import dep, { helper as h } from './dep.js';\n",
        "export const a = h(dep);\n",
        "export function f() { return a; }\n",
        "const hidden = 1, shown = 2;\n",
        "export { shown as visible };\n",
        "export default { b: 2 };\n",
    );
    let path = Path::new("/src/main.js");

    let cjs = to_commonjs(source, Path::new("/src"), &IdentityResolver).await;
    let esm = to_esm(&cjs.code, path, &IdentityResolver, &StaticExportInspector).await;

    // named exports live on the merged default
    for key in ["a", "f", "visible"] {
        assert!(cjs.code.contains(&format!("module.exports[\"{key}\"]")));
    }
    let (has_default, names) = export_surface(&esm.code);
    assert!(has_default);
    assert!(names.is_empty());
    assert_eq!(esm.dependencies.len(), 1);
    assert_eq!(esm.dependencies[0].specifier, "./dep.js");
    assert!(parse_module(&esm.code).skipped.is_empty());
}

#[tokio::test]
async fn test_round_trip_without_default() {
    let source = "export const one = 1;\nexport let two = 2;\n";
    let cjs = to_commonjs(source, Path::new("/src"), &IdentityResolver).await;
    let esm = to_esm(&cjs.code, Path::new("/src/n.js"), &IdentityResolver, &StaticExportInspector).await;

    let (has_default, names) = export_surface(&esm.code);
    assert!(!has_default);
    assert_eq!(names, ["one", "two"]);
}

#[tokio::test]
async fn test_statements_sharing_a_line() {
    let source = concat!(
        "import a from './a.js'; export = a;\n",
        "export const b = 1; import { broken from './x.js';\n",
    );
    let out = to_commonjs(source, Path::new("/src"), &IdentityResolver).await;

    assert!(!out.code.contains("import a"));
    assert!(out.code.contains("const b = 1;"));
    assert_eq!(out.dependencies.len(), 1);
    let skipped: Vec<_> = out
        .diagnostics
        .skipped
        .iter()
        .map(|s| (s.line, s.keyword))
        .collect();
    assert_eq!(skipped, [(1, "export"), (2, "import")]);
}

#[tokio::test]
async fn test_interop_module_keeps_its_default() {
    let source = concat!(
        "\"use strict\";\n",
        "Object.defineProperty(exports, \"__esModule\", { value: true });\n",
        "exports.helper = void 0;\n",
        "const helper = () => 1;\n",
        "exports.helper = helper;\n",
        "function main() { return helper(); }\n",
        "exports.default = main;\n",
    );
    let esm = to_esm(source, Path::new("/src/lib.js"), &IdentityResolver, &StaticExportInspector).await;

    let (has_default, names) = export_surface(&esm.code);
    assert!(!has_default);
    assert_eq!(names, ["default", "helper"]);
    assert!(!esm.code.contains("export default module.exports"));
}

#[tokio::test]
async fn test_skip_regions_never_rewritten() {
    let source = concat!(
        "const a = \"import x from 'y'\";\n",
        "const b = 'require(\"z\")';\n",
        "// export default 1;\n",
        "/* import q from 'q';\n   export { q }; */\n",
        "const re = /import|require\\(\"w\"\\)/g;\n",
        "const t = `\nimport ${`\nexport ${ \"require('v')\" }`} from 'u'\n`;\n",
    );

    let cjs = to_commonjs(source, Path::new("/src"), &IdentityResolver).await;
    assert_eq!(cjs.code, source);
    assert!(cjs.dependencies.is_empty());
    assert!(cjs.diagnostics.is_clean());

    let esm = to_esm(source, Path::new("/src/s.js"), &IdentityResolver, &StaticExportInspector).await;
    assert!(esm.dependencies.is_empty());
    assert!(!esm.code.contains("import * as"));
}

#[tokio::test]
async fn test_resolution_is_cached() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    write(&src.join("a.js"), "").await;

    let resolver = ImportResolver::new(dir.path().join("node_modules"));
    let first = resolver.resolve(&src, "./a", None).await;
    let second = resolver.resolve(&src, "./a", None).await;

    assert_eq!(first, second);
    assert_eq!(resolver.cache().hits(), 1);
    assert_eq!(resolver.cache().len(), 1);
}

#[tokio::test]
async fn test_concurrent_resolution_shares_cache() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    write(&src.join("shared.js"), "").await;

    let resolver = Arc::new(ImportResolver::new(dir.path().join("node_modules")));
    let mut handles = Vec::new();
    for _ in 0..8 {
        let resolver = Arc::clone(&resolver);
        let src = src.clone();
        handles.push(tokio::spawn(async move { resolver.resolve(&src, "./shared", None).await }));
    }

    for handle in handles {
        let resolution = handle.await.unwrap();
        assert_eq!(resolution.path, src.join("shared.js"));
    }
    assert_eq!(resolver.cache().len(), 1);
}

#[tokio::test]
async fn test_build_context_redirects_specifiers() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    write(&src.join("lib/a.js"), "export const a = 1;\n").await;
    write(&src.join("pages/index.js"), "import { a } from '../lib/a.js';\n").await;

    let resolver = ImportResolver::new(dir.path().join("node_modules"));
    let build = MirrorBuild::new(&src, dir.path().join("dist"));
    let scope = ResolveScope::new(&resolver, Some(&build));

    let out = to_commonjs("import { a } from '../lib/a.js';\n", &src.join("pages"), &scope).await;
    assert!(out.code.contains("require(\"../lib/a.js\""));
    assert_eq!(out.dependencies[0].path, src.join("lib/a.js"));
}
