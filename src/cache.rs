//! Parsed-format cache
//!
//! A `FormatSpec` is a pure function of its format string and variant, so a
//! call site can parse once and share the result. LRU eviction keeps the
//! cache bounded. Failed parses are never cached.

use crate::errors::ArgError;
use crate::format::{FormatSpec, Variant};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

pub const DEFAULT_CAPACITY: usize = 256;

type CacheKey = (Variant, String);

/// Thread-safe LRU cache of parsed format strings
pub struct SpecCache {
    entries: Mutex<LruCache<CacheKey, Arc<FormatSpec>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl SpecCache {
    /// A zero capacity is raised to one entry
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn positional(&self, fmt: &str) -> Result<Arc<FormatSpec>, ArgError> {
        self.get_or_parse(fmt, Variant::Positional)
    }

    pub fn keywords(&self, fmt: &str) -> Result<Arc<FormatSpec>, ArgError> {
        self.get_or_parse(fmt, Variant::Keywords)
    }

    pub fn get_or_parse(&self, fmt: &str, variant: Variant) -> Result<Arc<FormatSpec>, ArgError> {
        let key = (variant, fmt.to_string());

        if let Some(spec) = self.entries.lock().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(target: "argmarshal", fmt, "format cache hit");
            return Ok(Arc::clone(spec));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let spec = Arc::new(FormatSpec::parse(fmt, variant)?);
        self.entries.lock().put(key, Arc::clone(&spec));
        Ok(spec)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl Default for SpecCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
