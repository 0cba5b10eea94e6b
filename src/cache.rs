//! Content-hash keyed memoization.
//!
//! Entries live only as long as the owning cache and are dropped explicitly
//! with [`ContentCache::invalidate`] or [`ContentCache::clear`].

use std::sync::Arc;

use hashbrown::HashMap;
use tracing::debug;
use xxhash_rust::xxh64::{xxh64, Xxh64};

/// Hash of a byte buffer, stable across runs and platforms
pub fn content_hash(bytes: &[u8]) -> u64 {
    xxh64(bytes, 0)
}

/// Incremental hasher for values that are not already a byte buffer
pub struct ContentHasher {
    inner: Xxh64,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self {
            inner: Xxh64::new(0),
        }
    }
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.inner.update(&value.to_le_bytes());
        self
    }

    pub fn write_f64(&mut self, value: f64) -> &mut Self {
        self.write_u64(value.to_bits())
    }

    pub fn finish(&self) -> u64 {
        self.inner.digest()
    }
}

pub struct ContentCache<V> {
    entries: HashMap<u64, Arc<V>>,
}

impl<V> Default for ContentCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V> ContentCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: u64) -> Option<Arc<V>> {
        self.entries.get(&key).cloned()
    }

    /// Return the cached value for `key`, building and storing it on a miss.
    /// Failed builds are not cached.
    pub fn get_or_try_insert_with<E, F>(&mut self, key: u64, build: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.entries.get(&key) {
            debug!("Cache hit for {:016x}", key);
            return Ok(Arc::clone(value));
        }
        debug!("Cache miss for {:016x}", key);
        let value = Arc::new(build()?);
        self.entries.insert(key, Arc::clone(&value));
        Ok(value)
    }

    pub fn invalidate(&mut self, key: u64) -> bool {
        self.entries.remove(&key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(content_hash(b"Longitud,Latitud"), content_hash(b"Longitud,Latitud"));
        assert_ne!(content_hash(b"a"), content_hash(b"b"));

        let mut a = ContentHasher::new();
        a.write_u64(1).write_f64(2.5);
        let mut b = ContentHasher::new();
        b.write_u64(1).write_f64(2.5);
        assert_eq!(a.finish(), b.finish());
    }

    #[test]
    fn test_builds_once_per_key() {
        let mut cache: ContentCache<usize> = ContentCache::new();
        let mut builds = 0;
        for _ in 0..3 {
            let value = cache
                .get_or_try_insert_with::<(), _>(7, || {
                    builds += 1;
                    Ok(42)
                })
                .unwrap();
            assert_eq!(*value, 42);
        }
        assert_eq!(builds, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_forces_rebuild() {
        let mut cache: ContentCache<&str> = ContentCache::new();
        cache.get_or_try_insert_with::<(), _>(1, || Ok("first")).unwrap();
        assert!(cache.invalidate(1));
        assert!(!cache.invalidate(1));
        let value = cache.get_or_try_insert_with::<(), _>(1, || Ok("second")).unwrap();
        assert_eq!(*value, "second");
    }

    #[test]
    fn test_errors_are_not_cached() {
        let mut cache: ContentCache<u8> = ContentCache::new();
        let err = cache.get_or_try_insert_with(3, || Err("boom"));
        assert!(err.is_err());
        assert!(cache.is_empty());
    }
}
