//! In-process cache backed by a bounded LRU map

use super::{CacheError, CacheStore, Clock, SystemClock};
use hashlink::LruCache;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// Bounded in-memory cache with per-entry TTL
///
/// Least recently used entries are evicted once `capacity` is reached.
/// Expired entries are dropped lazily on read.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity.max(1))),
            clock,
        }
    }

    /// Number of entries currently held, expired ones included
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LruCache<String, Entry>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Backend("cache lock poisoned".to_string()))
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = self.clock.now();
        let mut entries = self.lock()?;

        match entries.get(key) {
            None => return Ok(None),
            Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
            Some(_) => {}
        }

        entries.remove(key);
        Ok(None)
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = self
            .clock
            .now()
            .checked_add(ttl)
            .ok_or_else(|| CacheError::Backend(format!("TTL out of range: {:?}", ttl)))?;
        self.lock()?.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.lock()?.remove(key);
        Ok(())
    }
}
