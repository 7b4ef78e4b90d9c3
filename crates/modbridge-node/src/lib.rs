// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # modbridge-node
//!
//! Converts JavaScript sources between ECMAScript module syntax and CommonJS,
//! resolving specifiers the way Node.js does.
//!
//! This crate provides:
//!
//! - An import/export statement parser built on `modbridge-lexer`
//! - ESM to CommonJS and CommonJS to ESM transforms
//! - A staged import resolver with a shared cache
//! - Redirection of resolved files into a build output tree
//! - Dependency scanning and traversal
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use modbridge_node::{ImportResolver, to_commonjs};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() {
//!     let resolver = ImportResolver::new("node_modules");
//!     let out = to_commonjs("import x from './x.js';\n", Path::new("src"), &resolver).await;
//!     println!("{}", out.code);
//! }
//! ```
//!
//! ## Configuration
//!
//! See [`config::Config`] for `modbridge.toml` and `MODBRIDGE_*` overrides.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod module_system;

// Re-exports
pub use config::Config;
pub use error::{BridgeError, Result};
pub use module_system::{
    BuildContext, IdentityResolver, ImportResolver, MirrorBuild, ModuleType, Resolution,
    ResolveScope, SpecifierResolver, StaticExportInspector, TransformOutput, is_esm,
    scan_dependencies, to_commonjs, to_esm, walk_dependencies,
};

/// Version of the modbridge-node crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
