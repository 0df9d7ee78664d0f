//! Stylesheets extracted from components during development-mode loading.
//!
//! The loader writes here while compiling a component and reads entries back
//! when the bundler requests the matching `orbit:css` id. One cache belongs to
//! one loader instance, so concurrent builds in a process never share entries.

use std::sync::Arc;

use dashmap::DashMap;
use orbit_compiler::CompiledCss;

/// Concurrent stylesheet cache keyed by style key (`/<path>.css`).
#[derive(Debug, Clone, Default)]
pub struct StyleCache {
    inner: Arc<DashMap<String, CompiledCss>>,
}

impl StyleCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the stylesheet for a key. Returns the old value if any.
    pub fn insert(&self, key: &str, css: CompiledCss) -> Option<CompiledCss> {
        self.inner.insert(key.to_string(), css)
    }

    /// Get the cached stylesheet for a key.
    pub fn get(&self, key: &str) -> Option<CompiledCss> {
        self.inner.get(key).map(|entry| entry.value().clone())
    }

    /// Number of cached stylesheets.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
