//! Key-stripping caches for `@` / `$` prefixed state keys.

use std::sync::Arc;

use crate::cache::{BoundedCache, DEFAULT_CAPACITY};

/// Maps a raw key such as `@Payload` to `Payload`.
///
/// Bounded: once `capacity` keys are stored, new keys are stripped on every
/// call instead of being cached. Results are the same either way.
#[derive(Debug)]
pub struct SigilCache {
    sigil: char,
    inner: BoundedCache<Arc<str>>,
}

impl SigilCache {
    /// Create a cache for keys prefixed with `sigil`, holding at most
    /// `capacity` entries.
    pub fn new(sigil: char, capacity: usize) -> Self {
        Self {
            sigil,
            inner: BoundedCache::new(capacity),
        }
    }

    pub fn sigil(&self) -> char {
        self.sigil
    }

    /// `key` without its leading sigil. Keys lacking the sigil come back as-is.
    pub fn strip(&self, key: &str) -> Arc<str> {
        let sigil = self.sigil;
        self.inner
            .get_or_insert_with(key, |raw| Arc::from(strip_sigil(raw, sigil)))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// True once new keys are no longer cached.
    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }
}

fn strip_sigil(key: &str, sigil: char) -> &str {
    key.strip_prefix(sigil).unwrap_or(key)
}

impl Default for SigilCache {
    fn default() -> Self {
        Self::new('@', DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_only_leading_sigil() {
        let cache = SigilCache::new('@', 10);
        assert_eq!(&*cache.strip("@Payload"), "Payload");
        assert_eq!(&*cache.strip("@@Twice"), "@Twice");
        assert_eq!(&*cache.strip("Plain"), "Plain");
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_bounded_at_capacity_with_identical_results() {
        let cache = SigilCache::new('$', DEFAULT_CAPACITY);
        for i in 0..DEFAULT_CAPACITY {
            cache.strip(&format!("$Key{}", i));
        }
        assert!(cache.is_full());

        let stripped = cache.strip("$Overflow");
        assert_eq!(&*stripped, "Overflow");
        assert_eq!(cache.len(), DEFAULT_CAPACITY);

        // Cached keys still resolve to the same value.
        assert_eq!(&*cache.strip("$Key7"), "Key7");
    }

    #[test]
    fn test_zero_capacity_never_caches() {
        let cache = SigilCache::new('@', 0);
        assert_eq!(&*cache.strip("@A"), "A");
        assert!(cache.is_empty());
    }
}
