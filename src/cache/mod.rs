//! Content-addressed embedding cache.
//!
//! Keys are SHA-256 fingerprints of the task type and the exact content, so a
//! query embedding and a document embedding of the same text occupy separate
//! slots. A miss is a normal outcome: callers compute the vector and `set` it.

mod sqlite;

pub use sqlite::PersistentEmbeddingCache;

use crate::embedding::TaskType;
use crate::error::{Result, VidlensError};
use lru::LruCache;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Cache statistics for operators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

impl CacheStats {
    fn new(size: usize, capacity: usize, hits: u64, misses: u64) -> Self {
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };
        Self {
            size,
            capacity,
            hits,
            misses,
            hit_rate,
        }
    }
}

/// Common interface of the in-memory and persistent caches.
pub trait VectorCache: Send + Sync {
    /// Look up a vector. Updates hit/miss counters and recency.
    fn get(&self, content: &str, task: TaskType) -> Option<Vec<f32>>;

    /// Store a vector, evicting the least recently used entry when full.
    fn set(&self, content: &str, task: TaskType, vector: Vec<f32>);

    fn stats(&self) -> CacheStats;

    /// Drop every entry and reset the counters.
    fn clear(&self);
}

/// Fingerprint of `(task, content)` used as the cache key.
pub fn fingerprint(content: &str, task: TaskType) -> String {
    let mut hasher = Sha256::new();
    hasher.update(task.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

struct CacheState {
    entries: LruCache<String, Vec<f32>>,
    hits: u64,
    misses: u64,
}

/// Size-bounded in-memory LRU cache.
///
/// Lookup, eviction and insertion for a key all happen under one lock, so an
/// entry is never observed half-written.
pub struct EmbeddingCache {
    state: Mutex<CacheState>,
}

impl EmbeddingCache {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| VidlensError::Config("cache capacity must be positive".to_string()))?;

        Ok(Self {
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                hits: 0,
                misses: 0,
            }),
        })
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl VectorCache for EmbeddingCache {
    fn get(&self, content: &str, task: TaskType) -> Option<Vec<f32>> {
        let key = fingerprint(content, task);
        let mut state = self.lock();

        match state.entries.get(&key).cloned() {
            Some(vector) => {
                state.hits += 1;
                Some(vector)
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    fn set(&self, content: &str, task: TaskType, vector: Vec<f32>) {
        let key = fingerprint(content, task);
        let mut state = self.lock();

        if let Some((evicted, _)) = state.entries.push(key.clone(), vector) {
            if evicted != key {
                trace!(key = %evicted, "Evicted least recently used embedding");
            }
        }
    }

    fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats::new(
            state.entries.len(),
            state.entries.cap().get(),
            state.hits,
            state.misses,
        )
    }

    fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.hits = 0;
        state.misses = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(EmbeddingCache::new(0).is_err());
    }

    #[test]
    fn test_set_then_get() {
        let cache = EmbeddingCache::new(10).unwrap();
        cache.set("test content", TaskType::Query, vec![0.1, 0.2, 0.3]);

        assert_eq!(cache.get("test content", TaskType::Query), Some(vec![0.1, 0.2, 0.3]));
        assert_eq!(cache.get("test content", TaskType::Query), Some(vec![0.1, 0.2, 0.3]));

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.size, 1);
    }

    #[test]
    fn test_miss() {
        let cache = EmbeddingCache::new(10).unwrap();
        assert_eq!(cache.get("nonexistent", TaskType::Query), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_task_type_isolation() {
        let cache = EmbeddingCache::new(10).unwrap();
        cache.set("same content", TaskType::Query, vec![1.0]);
        cache.set("same content", TaskType::Document, vec![2.0]);

        assert_eq!(cache.get("same content", TaskType::Query), Some(vec![1.0]));
        assert_eq!(cache.get("same content", TaskType::Document), Some(vec![2.0]));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_fingerprint_distinguishes_task() {
        assert_ne!(
            fingerprint("x", TaskType::Query),
            fingerprint("x", TaskType::Document)
        );
        assert_eq!(fingerprint("x", TaskType::Query), fingerprint("x", TaskType::Query));
        assert_eq!(fingerprint("x", TaskType::Query).len(), 64);
    }

    #[test]
    fn test_evicts_oldest_insert() {
        let cache = EmbeddingCache::new(2).unwrap();
        cache.set("item1", TaskType::Document, vec![1.0]);
        cache.set("item2", TaskType::Document, vec![2.0]);
        cache.set("item3", TaskType::Document, vec![3.0]);

        assert!(cache.get("item1", TaskType::Document).is_none());
        assert!(cache.get("item2", TaskType::Document).is_some());
        assert!(cache.get("item3", TaskType::Document).is_some());
    }

    #[test]
    fn test_hit_promotes_entry() {
        let cache = EmbeddingCache::new(3).unwrap();
        cache.set("a", TaskType::Query, vec![1.0]);
        cache.set("b", TaskType::Query, vec![2.0]);
        cache.set("c", TaskType::Query, vec![3.0]);

        // Touch "a" so "b" becomes least recently used.
        assert!(cache.get("a", TaskType::Query).is_some());
        cache.set("d", TaskType::Query, vec![4.0]);

        assert!(cache.get("b", TaskType::Query).is_none());
        for key in ["a", "c", "d"] {
            assert!(cache.get(key, TaskType::Query).is_some(), "{} was evicted", key);
        }
    }

    #[test]
    fn test_overwrite_does_not_grow() {
        let cache = EmbeddingCache::new(2).unwrap();
        cache.set("a", TaskType::Query, vec![1.0]);
        cache.set("a", TaskType::Query, vec![9.0]);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a", TaskType::Query), Some(vec![9.0]));
    }

    #[test]
    fn test_stats_and_clear() {
        let cache = EmbeddingCache::new(5).unwrap();
        cache.set("test", TaskType::Query, vec![1.0]);
        cache.get("test", TaskType::Query);
        cache.get("missing", TaskType::Query);

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.capacity, 5);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);

        cache.clear();
        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.hit_rate, 0.0);
    }

    #[test]
    fn test_concurrent_access_stays_bounded() {
        let cache = Arc::new(EmbeddingCache::new(16).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let key = format!("{}-{}", t, i % 20);
                        if cache.get(&key, TaskType::Query).is_none() {
                            cache.set(&key, TaskType::Query, vec![i as f32]);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        assert_eq!(stats.size, 16);
        assert_eq!(stats.hits + stats.misses, 800);
    }
}
