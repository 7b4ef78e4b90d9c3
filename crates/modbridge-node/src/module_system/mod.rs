// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module system interop
//!
//! Converts between CommonJS `require()` and ECMAScript Modules (ESM) and
//! resolves specifiers the way Node.js does.
//!
//! ## ESM to CommonJS
//! - `import` declarations become `require` calls with attributes
//! - `export` statements become `module.exports` assignments
//! - Dynamic `import()` becomes `require()`
//!
//! ## CommonJS to ESM
//! - `require("...")` calls become namespace imports
//! - `module.exports` / `exports` keys become named exports
//!
//! ## Resolution
//! - Core modules, with or without `node:`
//! - Relative paths with extension and `index` probing
//! - `node_modules` and `package.json` `main`
//! - Redirection into a build output tree

pub mod build;
mod cache;
mod deps;
mod diagnostics;
pub mod esm;
mod exports;
mod resolver;
mod scan;
mod splice;
mod to_cjs;
mod to_esm;

pub use build::{BuildContext, BuiltFile, MirrorBuild};
pub use cache::{CacheKey, ResolutionCache};
pub use deps::{DEFAULT_LARGE_FILE_THRESHOLD, scan_dependencies, walk_dependencies};
pub use diagnostics::{Diagnostics, SkippedStatement, TransformOutput};
pub use esm::{ModuleType, is_esm, parse_module};
pub use exports::{ExportInspector, ExportShape, StaticExportInspector};
pub use resolver::{
    CORE_MODULES, IdentityResolver, ImportResolver, Origin, ResolveScope, Resolution, SUFFIXES,
    SpecifierResolver, is_core,
};
pub use splice::{Splicer, SyntheticNames};
pub use to_cjs::to_commonjs;
pub use to_esm::to_esm;
