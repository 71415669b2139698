//! Response memo table for request lookups.
//!
//! A display layer often asks for the response paired with a request many
//! times while browsing one capture. [`ResponseCache`] remembers each answer
//! keyed by the request's message id, including "no response". The cache is
//! owned by the caller and must be invalidated whenever a new capture is
//! loaded, since ids are only unique within one capture.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::stream::parsers::HttpResponse;

/// Memoized request id -> matched response map.
///
/// Thread-safe using an RwLock for the entries and atomics for statistics.
/// Each key is computed at most once between invalidations.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<u64, Option<Arc<HttpResponse>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached answer for `request_id`, computing it on first use.
    ///
    /// `compute` runs under the write lock, so concurrent callers for the
    /// same id never compute twice.
    pub fn get_or_compute<F>(&self, request_id: u64, compute: F) -> Option<Arc<HttpResponse>>
    where
        F: FnOnce() -> Option<HttpResponse>,
    {
        if let Some(cached) = self.lookup(request_id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return cached;
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        // Another caller may have filled the slot while we waited for the lock
        if let Some(cached) = entries.get(&request_id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return cached.clone();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = compute().map(Arc::new);
        entries.insert(request_id, value.clone());
        value
    }

    /// Cached answer for `request_id`, if one has been computed.
    ///
    /// The outer `Option` is whether the id is cached; the inner one is
    /// whether the request had a response.
    pub fn get(&self, request_id: u64) -> Option<Option<Arc<HttpResponse>>> {
        self.lookup(request_id)
    }

    fn lookup(&self, request_id: u64) -> Option<Option<Arc<HttpResponse>>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&request_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry. Call when a new capture is loaded.
    pub fn invalidate(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Snapshot of hit/miss counters and entry count.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    pub fn reset_stats(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

/// Cache statistics for monitoring.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Cache hit ratio (0.0 to 1.0).
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    use crate::stream::{reconstruct_http, Direction, Message};

    fn exchange() -> Vec<Message> {
        vec![
            Message::new(1, 0.0, Direction::AtoB, "GET / HTTP/1.1\r\n\r\n"),
            Message::new(2, 0.1, Direction::BtoA, "HTTP/1.1 204 No Content\r\n\r\n"),
            Message::new(3, 0.2, Direction::AtoB, "GET /lost HTTP/1.1\r\n\r\n"),
        ]
    }

    #[test]
    fn test_compute_once() {
        let result = reconstruct_http(&exchange());
        let cache = ResponseCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let response = cache.get_or_compute(1, || {
                calls.fetch_add(1, Ordering::Relaxed);
                result.response_for(1).cloned()
            });
            assert_eq!(response.map(|r| r.status_code), Some(204));
        }

        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 2,
                misses: 1,
                entries: 1
            }
        );
    }

    #[test]
    fn test_caches_missing_response() {
        let result = reconstruct_http(&exchange());
        let cache = ResponseCache::new();

        assert!(cache.get(3).is_none());
        assert!(cache.get_or_compute(3, || result.response_for(3).cloned()).is_none());
        assert_eq!(cache.get(3), Some(None));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate() {
        let cache = ResponseCache::new();
        cache.get_or_compute(1, || None);
        cache.get_or_compute(2, || None);
        assert_eq!(cache.len(), 2);

        cache.invalidate();
        assert!(cache.is_empty());
        assert!(cache.get(1).is_none());

        cache.reset_stats();
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_concurrent_compute_once() {
        let cache = Arc::new(ResponseCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                thread::spawn(move || {
                    cache.get_or_compute(42, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        None
                    });
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.hits + stats.misses, 8);
    }

    #[test]
    fn test_cache_stats_hit_ratio() {
        let stats = CacheStats {
            hits: 75,
            misses: 25,
            entries: 100,
        };
        assert!((stats.hit_ratio() - 0.75).abs() < 0.001);
        assert_eq!(CacheStats::default().hit_ratio(), 0.0);
    }
}
