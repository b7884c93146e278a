//! Suggestion Replay Cache
//!
//! Replaying the same message in the same conversation within the TTL
//! returns the previously computed suggestion verbatim.
//!
//! **Key**: (conversation id, user id, SHA-256 of the message text)
//! **Bound**: at capacity the single oldest insertion is evicted first
//! **Invalidation**: everything (catalog or preference changes) or one conversation.
//! Clearing everything bumps a generation; inserts computed under an older
//! generation are dropped.

use crate::models::RankedSuggestion;
use crate::utils::content_hash;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const DEFAULT_TTL: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub conversation_id: String,
    pub user_id: String,
    pub content_hash: String,
}

impl CacheKey {
    pub fn new(conversation_id: &str, user_id: &str, text: &str) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            user_id: user_id.to_string(),
            content_hash: content_hash(text),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedSuggestion {
    suggestion: RankedSuggestion,
    inserted_at: Instant,
}

impl CachedSuggestion {
    #[inline]
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() < ttl
    }
}

pub struct SuggestionCache {
    store: DashMap<CacheKey, CachedSuggestion>,
    ttl: Duration,
    max_entries: usize,
    /// Serializes evict-then-insert so the bound holds under concurrent writers
    insert_guard: Mutex<()>,
    generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl Default for SuggestionCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }
}

impl SuggestionCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        debug!(
            ttl_secs = ttl.as_secs(),
            max_entries, "Initializing suggestion cache"
        );

        Self {
            store: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
            insert_guard: Mutex::new(()),
            generation: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Fresh cached suggestion, if any. Expired entries are dropped on read.
    pub fn get(&self, key: &CacheKey) -> Option<RankedSuggestion> {
        if let Some(entry) = self.store.get(key) {
            if entry.is_fresh(self.ttl) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(conversation_id = %key.conversation_id, "Suggestion cache HIT");
                return Some(entry.suggestion.clone());
            }
            drop(entry);
            self.store
                .remove_if(key, |_, entry| !entry.is_fresh(self.ttl));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn insert(&self, key: CacheKey, suggestion: RankedSuggestion) {
        let _guard = self.insert_guard.lock();
        self.store_locked(key, suggestion);
    }

    /// Current invalidation generation. Read it before computing a value
    /// that will be passed to `insert_at`.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Insert only if no `invalidate_all` ran since `generation` was read.
    /// Returns false when the value was dropped as stale.
    pub fn insert_at(
        &self,
        key: CacheKey,
        suggestion: RankedSuggestion,
        generation: u64,
    ) -> bool {
        let _guard = self.insert_guard.lock();
        if self.generation.load(Ordering::Acquire) != generation {
            debug!(conversation_id = %key.conversation_id, "Dropping stale suggestion");
            return false;
        }
        self.store_locked(key, suggestion);
        true
    }

    /// Caller holds `insert_guard`
    fn store_locked(&self, key: CacheKey, suggestion: RankedSuggestion) {
        if !self.store.contains_key(&key) && self.store.len() >= self.max_entries {
            self.evict_oldest();
        }

        self.store.insert(
            key,
            CachedSuggestion {
                suggestion,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Linear scan for the oldest insertion
    fn evict_oldest(&self) {
        let oldest = self
            .store
            .iter()
            .min_by_key(|entry| entry.value().inserted_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            self.store.remove(&key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            warn!(
                conversation_id = %key.conversation_id,
                max_entries = self.max_entries,
                "Suggestion cache full, evicted oldest entry"
            );
        }
    }

    pub fn invalidate_all(&self) {
        let _guard = self.insert_guard.lock();
        self.generation.fetch_add(1, Ordering::AcqRel);
        let count = self.store.len();
        self.store.clear();
        debug!(cleared_entries = count, "Suggestion cache CLEAR");
    }

    pub fn invalidate_conversation(&self, conversation_id: &str) {
        let before = self.store.len();
        self.store
            .retain(|key, _| key.conversation_id != conversation_id);
        debug!(
            conversation_id = conversation_id,
            invalidated = before.saturating_sub(self.store.len()),
            "Suggestion cache INVALIDATE"
        );
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.store.len(),
            max_entries: self.max_entries,
            hit_count: self.hits.load(Ordering::Relaxed),
            miss_count: self.misses.load(Ordering::Relaxed),
            eviction_count: self.evictions.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub max_entries: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub eviction_count: u64,
}

impl CacheStats {
    /// Hit rate percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            (self.hit_count as f64 / total as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(text: &str) -> RankedSuggestion {
        RankedSuggestion::fallback(text)
    }

    #[test]
    fn test_key_hashes_text() {
        let a = CacheKey::new("c", "u", "hello");
        let b = CacheKey::new("c", "u", "hello");
        let c = CacheKey::new("c", "u", "hello!");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.content_hash.len(), 64);
    }

    #[test]
    fn test_hit_and_miss() {
        let cache = SuggestionCache::default();
        let key = CacheKey::new("c", "u", "hello");

        assert!(cache.get(&key).is_none());
        cache.insert(key.clone(), suggestion("hi there"));
        assert_eq!(cache.get(&key).map(|s| s.response), Some("hi there".to_string()));

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
        assert!((stats.hit_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_expired_entries_miss() {
        let cache = SuggestionCache::new(Duration::from_millis(20), 10);
        let key = CacheKey::new("c", "u", "hello");
        cache.insert(key.clone(), suggestion("hi"));

        std::thread::sleep(Duration::from_millis(40));

        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_bound_evicts_oldest() {
        let cache = SuggestionCache::new(DEFAULT_TTL, 3);
        for i in 0..3 {
            cache.insert(CacheKey::new("c", "u", &format!("m{}", i)), suggestion("s"));
            std::thread::sleep(Duration::from_millis(2));
        }

        cache.insert(CacheKey::new("c", "u", "m3"), suggestion("s"));

        assert_eq!(cache.len(), 3);
        assert!(cache.get(&CacheKey::new("c", "u", "m0")).is_none());
        assert!(cache.get(&CacheKey::new("c", "u", "m3")).is_some());
        assert_eq!(cache.stats().eviction_count, 1);
    }

    #[test]
    fn test_default_bound_never_exceeded() {
        let cache = SuggestionCache::default();
        for i in 0..1200 {
            cache.insert(CacheKey::new("c", "u", &format!("m{}", i)), suggestion("s"));
            assert!(cache.len() <= DEFAULT_MAX_ENTRIES);
        }
        assert_eq!(cache.len(), DEFAULT_MAX_ENTRIES);
    }

    #[test]
    fn test_reinsert_same_key_does_not_evict() {
        let cache = SuggestionCache::new(DEFAULT_TTL, 2);
        cache.insert(CacheKey::new("c", "u", "a"), suggestion("1"));
        cache.insert(CacheKey::new("c", "u", "b"), suggestion("2"));
        cache.insert(CacheKey::new("c", "u", "b"), suggestion("3"));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().eviction_count, 0);
    }

    #[test]
    fn test_invalidation() {
        let cache = SuggestionCache::default();
        cache.insert(CacheKey::new("c1", "u", "a"), suggestion("1"));
        cache.insert(CacheKey::new("c1", "u", "b"), suggestion("2"));
        cache.insert(CacheKey::new("c2", "u", "a"), suggestion("3"));

        cache.invalidate_conversation("c1");
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&CacheKey::new("c2", "u", "a")).is_some());

        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_after_invalidation_is_dropped() {
        let cache = SuggestionCache::default();
        let key = CacheKey::new("c", "u", "hello");

        let before = cache.generation();
        cache.invalidate_all();
        assert_eq!(cache.generation(), before + 1);

        assert!(!cache.insert_at(key.clone(), suggestion("stale"), before));
        assert!(cache.is_empty());

        assert!(cache.insert_at(key.clone(), suggestion("fresh"), cache.generation()));
        assert_eq!(cache.get(&key).map(|s| s.response), Some("fresh".to_string()));
    }
}
