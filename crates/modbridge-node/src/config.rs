// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Configuration management.
//!
//! Settings are read from `modbridge.toml` and then overridden by
//! `MODBRIDGE_*` environment variables, e.g. `MODBRIDGE_PACKAGES_DIR`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{BridgeError, Result};
use crate::module_system::DEFAULT_LARGE_FILE_THRESHOLD;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "MODBRIDGE_";

/// Configuration for module conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Third-party package directory probed by the resolver
    pub packages_dir: PathBuf,

    /// Files at or above this size use the lightweight dependency scan
    pub large_file_threshold: usize,

    /// Source root of the build, if any
    pub entry: Option<PathBuf>,

    /// Build output root mirroring `entry`
    pub build_dir: Option<PathBuf>,

    /// Default log filter
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            packages_dir: PathBuf::from("node_modules"),
            large_file_threshold: DEFAULT_LARGE_FILE_THRESHOLD,
            entry: None,
            build_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Name of the project configuration file.
    pub const FILE_NAME: &'static str = "modbridge.toml";

    /// Load configuration from `path`, or from `modbridge.toml` in the
    /// working directory when it exists, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let local = PathBuf::from(Self::FILE_NAME);
                if local.is_file() {
                    Self::from_file(&local)?
                } else {
                    Self::default()
                }
            }
        };

        config.merge_env(std::env::vars())?;
        Ok(config)
    }

    /// Read a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Apply `MODBRIDGE_*` overrides from an environment listing.
    pub fn merge_env<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix(ENV_PREFIX) {
                self.set(&config_key.to_lowercase(), &value)?;
            }
        }
        Ok(())
    }

    /// Set a configuration value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "packages_dir" => self.packages_dir = PathBuf::from(value),
            "large_file_threshold" => {
                self.large_file_threshold = value
                    .parse()
                    .map_err(|_| BridgeError::config_value(key, value))?;
            }
            "entry" => self.entry = Some(PathBuf::from(value)),
            "build_dir" => self.build_dir = Some(PathBuf::from(value)),
            "log_level" => self.log_level = value.to_string(),
            _ => warn!(key, "ignoring unknown config key"),
        }
        Ok(())
    }

    /// Returns the build roots when both are configured.
    pub fn build_roots(&self) -> Option<(&Path, &Path)> {
        Some((self.entry.as_deref()?, self.build_dir.as_deref()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.packages_dir, PathBuf::from("node_modules"));
        assert_eq!(config.large_file_threshold, 50_000);
        assert!(config.build_roots().is_none());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(Config::FILE_NAME);
        std::fs::write(
            &path,
            "packages_dir = \"vendor\"\nentry = \"src\"\nbuild_dir = \"dist\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.packages_dir, PathBuf::from("vendor"));
        assert_eq!(config.large_file_threshold, 50_000);
        assert_eq!(
            config.build_roots(),
            Some((Path::new("src"), Path::new("dist")))
        );
    }

    #[test]
    fn test_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(Config::FILE_NAME);
        std::fs::write(&path, "large_file_threshold = \"big\"").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(BridgeError::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .merge_env([
                ("MODBRIDGE_LARGE_FILE_THRESHOLD".to_string(), "10".to_string()),
                ("MODBRIDGE_LOG_LEVEL".to_string(), "debug".to_string()),
                ("PATH".to_string(), "/usr/bin".to_string()),
            ])
            .unwrap();
        assert_eq!(config.large_file_threshold, 10);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_set_rejects_bad_numbers() {
        let mut config = Config::default();
        let err = config.set("large_file_threshold", "many").unwrap_err();
        assert!(matches!(err, BridgeError::ConfigValue { .. }));
        assert!(config.set("unknown", "x").is_ok());
    }
}
