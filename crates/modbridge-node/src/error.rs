// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for module conversion

use std::path::PathBuf;
use thiserror::Error;

/// Result type for module conversion operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur while converting or resolving modules
#[derive(Debug, Error)]
pub enum BridgeError {
    /// File system error
    #[error("File system error: {0}")]
    Fs(#[from] std::io::Error),

    /// Path error
    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration file error
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid value for '{key}': {value}")]
    ConfigValue {
        /// Configuration key
        key: String,
        /// Rejected value
        value: String,
    },

    /// Build context failure
    #[error("Build error for '{path}': {reason}")]
    Build {
        /// File being built
        path: PathBuf,
        /// Reason for failure
        reason: String,
    },
}

impl BridgeError {
    /// Create a build context error
    pub fn build(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Build {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration value error
    pub fn config_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::ConfigValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = BridgeError::build("/src/a.js", "outside entry");
        assert_eq!(err.to_string(), "Build error for '/src/a.js': outside entry");

        let err = BridgeError::config_value("large_file_threshold", "lots");
        assert_eq!(err.to_string(), "Invalid value for 'large_file_threshold': lots");
    }

    #[test]
    fn test_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: BridgeError = io.into();
        assert!(matches!(err, BridgeError::Fs(_)));
    }
}
