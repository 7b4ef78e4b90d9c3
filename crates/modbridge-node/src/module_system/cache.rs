// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Resolution cache shared across concurrent transforms

use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::resolver::Resolution;

/// Key of a cached resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Directory the specifier was resolved from
    pub base_dir: PathBuf,
    /// Specifier exactly as written
    pub specifier: String,
    /// Whether a build context was active
    pub build_active: bool,
}

impl CacheKey {
    /// Create a new cache key
    pub fn new(base_dir: impl Into<PathBuf>, specifier: impl Into<String>, build_active: bool) -> Self {
        Self {
            base_dir: base_dir.into(),
            specifier: specifier.into(),
            build_active,
        }
    }
}

/// Thread-safe resolution cache.
///
/// Entries are never evicted. Two tasks missing on the same key at once may
/// both compute and insert; the results are identical so either write wins.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    cache: DashMap<CacheKey, Resolution>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl ResolutionCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached resolution, counting the hit or miss
    pub fn get(&self, key: &CacheKey) -> Option<Resolution> {
        let found = self.cache.get(key).map(|entry| entry.clone());
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Check if a key is cached
    pub fn has(&self, key: &CacheKey) -> bool {
        self.cache.contains_key(key)
    }

    /// Add a resolution to the cache
    pub fn set(&self, key: CacheKey, resolution: Resolution) {
        self.cache.insert(key, resolution);
    }

    /// Number of lookups answered from the cache
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of lookups that found nothing
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    /// Get the number of cached resolutions
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
