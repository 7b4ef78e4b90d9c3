// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Build context contract
//!
//! A build context redirects resolved files from a source tree (`entry`)
//! into a parallel output tree (`build_dir`), so rewritten specifiers point
//! at where the imported file will live after the build.

use async_trait::async_trait;
use dashmap::DashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{BridgeError, Result};

/// A file as seen through the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltFile {
    /// Where the built file is written
    pub output_path: PathBuf,
    /// Contents of the source file
    pub content: String,
    /// Whether this file was requested before
    pub already_built: bool,
}

/// The interface a build orchestrator exposes to the resolver.
#[async_trait]
pub trait BuildContext: Send + Sync {
    /// Absolute source root
    fn entry(&self) -> &Path;

    /// Absolute build output root
    fn build_dir(&self) -> &Path;

    /// Looks up (and possibly schedules) the build of `path`.
    async fn get_file(&self, path: &Path) -> Result<BuiltFile>;

    /// Maps a path under `entry` onto its counterpart under `build_dir`.
    fn rebase(&self, path: &Path) -> Option<PathBuf> {
        path.strip_prefix(self.entry())
            .ok()
            .map(|rel| self.build_dir().join(rel))
    }
}

/// A build that mirrors `entry` onto `build_dir` file for file.
#[derive(Debug)]
pub struct MirrorBuild {
    entry: PathBuf,
    build_dir: PathBuf,
    requested: DashSet<PathBuf>,
}

impl MirrorBuild {
    /// Create a mirror build between two roots
    pub fn new(entry: impl Into<PathBuf>, build_dir: impl Into<PathBuf>) -> Self {
        Self {
            entry: entry.into(),
            build_dir: build_dir.into(),
            requested: DashSet::new(),
        }
    }
}

#[async_trait]
impl BuildContext for MirrorBuild {
    fn entry(&self) -> &Path {
        &self.entry
    }

    fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    async fn get_file(&self, path: &Path) -> Result<BuiltFile> {
        let output_path = self
            .rebase(path)
            .ok_or_else(|| BridgeError::build(path, "file is outside the build entry"))?;
        let content = tokio::fs::read_to_string(path).await?;
        let already_built = !self.requested.insert(path.to_path_buf());

        debug!(path = %path.display(), output = %output_path.display(), already_built, "build file");

        Ok(BuiltFile {
            output_path,
            content,
            already_built,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebase() {
        let build = MirrorBuild::new("/site/src", "/site/dist");
        assert_eq!(
            build.rebase(Path::new("/site/src/js/app.js")),
            Some(PathBuf::from("/site/dist/js/app.js"))
        );
        assert_eq!(build.rebase(Path::new("/elsewhere/app.js")), None);
    }

    #[tokio::test]
    async fn test_get_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        tokio::fs::create_dir_all(&src).await.unwrap();
        tokio::fs::write(src.join("a.js"), "exports.a = 1;").await.unwrap();

        let build = MirrorBuild::new(&src, dir.path().join("dist"));
        let file = build.get_file(&src.join("a.js")).await.unwrap();
        assert_eq!(file.output_path, dir.path().join("dist").join("a.js"));
        assert_eq!(file.content, "exports.a = 1;");
        assert!(!file.already_built);

        let again = build.get_file(&src.join("a.js")).await.unwrap();
        assert!(again.already_built);
    }

    #[tokio::test]
    async fn test_get_file_outside_entry() {
        let dir = tempfile::tempdir().unwrap();
        let build = MirrorBuild::new(dir.path().join("src"), dir.path().join("dist"));
        let err = build.get_file(&dir.path().join("other.js")).await.unwrap_err();
        assert!(matches!(err, BridgeError::Build { .. }));
    }
}
