//! Caching of completed decomposition results
//!
//! Results are keyed by a normalized form of the sentence, so requests
//! differing only in case or spacing share an entry. Admission requires a
//! successful result above a confidence floor; entries expire after a TTL
//! and are removed lazily on lookup. When the cache is full, a batch of
//! the lowest-value entries is evicted, valuing entries by how often and
//! how recently they were hit.

use crate::config::CacheConfig;
use crate::types::UnifiedResult;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::debug;

/// Normalize a sentence into its cache key
///
/// Trimmed, lowercased, inner whitespace collapsed to single spaces.
pub fn normalize_sentence(sentence: &str) -> String {
    sentence
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Cached decomposition result with access bookkeeping
#[derive(Debug, Clone)]
struct CacheEntry {
    result: UnifiedResult,
    cached_at: Instant,
    last_access: Instant,
    access_count: u64,
}

impl CacheEntry {
    fn new(result: UnifiedResult) -> Self {
        let now = Instant::now();
        Self {
            result,
            cached_at: now,
            last_access: now,
            access_count: 0,
        }
    }

    /// Check if this entry is still valid given TTL
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() < ttl
    }

    /// Retention score: frequently and recently hit entries score high
    fn retention_score(&self) -> f64 {
        self.access_count as f64 + 1.0 / (1.0 + self.last_access.elapsed().as_secs_f64())
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    /// Current number of entries
    pub size: usize,

    /// Maximum capacity
    pub capacity: usize,

    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// TTL-bounded result cache with batch eviction
pub struct ResultCache {
    config: CacheConfig,
    entries: RwLock<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a sentence; a stale entry is dropped on the way out
    pub fn get(&self, sentence: &str) -> Option<UnifiedResult> {
        let key = normalize_sentence(sentence);
        let mut entries = self.entries.write().ok()?;
        match entries.get_mut(&key) {
            Some(entry) if entry.is_fresh(self.config.ttl()) => {
                entry.access_count += 1;
                entry.last_access = Instant::now();
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.result.clone())
            }
            Some(_) => {
                entries.remove(&key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Admit a result; failures and low-confidence results are not cached
    pub fn put(&self, sentence: &str, result: &UnifiedResult) {
        if !result.success || result.confidence() < self.config.min_confidence {
            return;
        }
        let key = normalize_sentence(sentence);
        if key.is_empty() {
            return;
        }
        if let Ok(mut entries) = self.entries.write() {
            if !entries.contains_key(&key) && entries.len() >= self.config.capacity {
                evict_batch(&mut entries, self.config.capacity, self.config.evict_fraction);
            }
            entries.insert(key, CacheEntry::new(result.clone()));
        }
    }

    /// Clear all entries; hit/miss counters persist
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let size = self.entries.read().map(|e| e.len()).unwrap_or(0);
        CacheStats {
            size,
            capacity: self.config.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Evict the lowest-scoring fraction of entries (at least one)
fn evict_batch(entries: &mut HashMap<String, CacheEntry>, capacity: usize, fraction: f64) {
    let count = ((capacity as f64 * fraction).ceil() as usize).max(1);
    let mut scored: Vec<(String, f64)> = entries
        .iter()
        .map(|(key, entry)| (key.clone(), entry.retention_score()))
        .collect();
    scored.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    let evicted = scored.into_iter().take(count);
    let mut removed = 0;
    for (key, _) in evicted {
        entries.remove(&key);
        removed += 1;
    }
    debug!("Evicted {} cache entries", removed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SlotAssignment;

    fn result(confidence: f64) -> UnifiedResult {
        UnifiedResult::merged(
            SlotAssignment::new(),
            vec!["foundation".to_string()],
            confidence,
            Vec::new(),
        )
    }

    fn cache_with(capacity: usize, ttl_secs: u64, min_confidence: f64) -> ResultCache {
        ResultCache::new(CacheConfig {
            ttl_secs,
            capacity,
            evict_fraction: 0.5,
            min_confidence,
        })
    }

    #[test]
    fn test_normalization_folds_case_and_spacing() {
        assert_eq!(
            normalize_sentence("  The   dog barked. "),
            "the dog barked."
        );
        assert_eq!(normalize_sentence("THE DOG"), normalize_sentence("the dog"));
    }

    #[test]
    fn test_put_then_get() {
        let cache = cache_with(10, 60, 0.0);
        cache.put("The dog barked.", &result(0.9));

        let hit = cache.get("the  DOG barked.");
        assert!(hit.is_some());
        assert_eq!(hit.unwrap().confidence(), 0.9);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.hit_rate(), 1.0);
    }

    #[test]
    fn test_failures_and_low_confidence_not_admitted() {
        let cache = cache_with(10, 60, 0.4);
        cache.put("bad sentence", &UnifiedResult::failure("all analyzers failed"));
        cache.put("weak sentence", &result(0.2));

        assert!(cache.get("bad sentence").is_none());
        assert!(cache.get("weak sentence").is_none());
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_expired_entry_removed_on_get() {
        let cache = cache_with(10, 0, 0.0);
        cache.put("The dog barked.", &result(0.9));
        assert_eq!(cache.stats().size, 1);

        std::thread::sleep(Duration::from_millis(10));

        assert!(cache.get("The dog barked.").is_none());
        assert_eq!(cache.stats().size, 0);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_eviction_prefers_unused_entries() {
        let cache = cache_with(4, 60, 0.0);
        cache.put("sentence a", &result(0.9));
        cache.put("sentence b", &result(0.9));
        cache.put("sentence c", &result(0.9));
        cache.put("sentence d", &result(0.9));

        // a gets three hits, b one; c and d stay cold.
        for _ in 0..3 {
            cache.get("sentence a");
        }
        cache.get("sentence b");

        // Full cache: inserting e evicts ceil(4 * 0.5) = 2 coldest entries.
        cache.put("sentence e", &result(0.9));

        assert!(cache.get("sentence a").is_some());
        assert!(cache.get("sentence b").is_some());
        assert!(cache.get("sentence e").is_some());
        assert!(cache.get("sentence c").is_none());
        assert!(cache.get("sentence d").is_none());
        assert_eq!(cache.stats().size, 3);
    }

    #[test]
    fn test_reinsert_existing_key_skips_eviction() {
        let cache = cache_with(2, 60, 0.0);
        cache.put("sentence a", &result(0.5));
        cache.put("sentence b", &result(0.5));

        // Same key: overwrite in place, no eviction needed.
        cache.put("sentence a", &result(0.8));
        assert_eq!(cache.stats().size, 2);
        assert_eq!(cache.get("sentence a").unwrap().confidence(), 0.8);
        assert!(cache.get("sentence b").is_some());
    }

    #[test]
    fn test_clear_empties_cache() {
        let cache = cache_with(10, 60, 0.0);
        cache.put("sentence a", &result(0.9));
        cache.clear();
        assert_eq!(cache.stats().size, 0);
        assert!(cache.get("sentence a").is_none());
    }
}
