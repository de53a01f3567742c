//! Request and analyzer usage statistics
//!
//! Shared collector updated on every request. Request-level counts live in
//! atomics; per-analyzer counters (invocations, successes, latency totals,
//! hour-of-day usage buckets) live behind a read-write lock. The hourly
//! buckets feed the predictive preloader's usage-share computation.

use crate::types::AnalyzerOutcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// Per-analyzer counters
#[derive(Debug, Clone, Default)]
struct AnalyzerStats {
    invocations: u64,
    successes: u64,
    failures: u64,
    total_elapsed: Duration,
    /// Invocations bucketed by local hour of day
    hourly: [u64; 24],
}

/// Serializable per-analyzer summary
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzerSummary {
    pub analyzer_id: String,
    pub invocations: u64,
    pub successes: u64,
    pub failures: u64,
    pub success_rate: f64,
    pub avg_elapsed_ms: f64,
    pub hourly: [u64; 24],
}

/// Serializable statistics snapshot
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub generated_at: DateTime<Utc>,
    pub requests_total: u64,
    pub requests_succeeded: u64,
    pub requests_failed: u64,
    /// Per-analyzer summaries sorted by id
    pub analyzers: Vec<AnalyzerSummary>,
}

/// Thread-safe statistics collector
#[derive(Debug, Default)]
pub struct Statistics {
    requests_total: AtomicU64,
    requests_succeeded: AtomicU64,
    requests_failed: AtomicU64,
    analyzers: RwLock<HashMap<String, AnalyzerStats>>,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the final outcome of one request
    pub fn record_request(&self, success: bool) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.requests_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.requests_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record one analyzer invocation in the given local hour (0..=23)
    pub fn record_outcome(&self, outcome: &AnalyzerOutcome, hour: u32) {
        if let Ok(mut analyzers) = self.analyzers.write() {
            let stats = analyzers.entry(outcome.analyzer_id.clone()).or_default();
            stats.invocations += 1;
            if outcome.success {
                stats.successes += 1;
            } else {
                stats.failures += 1;
            }
            stats.total_elapsed += outcome.elapsed;
            stats.hourly[(hour % 24) as usize] += 1;
        }
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    /// Fraction of requests that produced a successful unified result
    pub fn request_success_rate(&self) -> f64 {
        let total = self.requests_total.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.requests_succeeded.load(Ordering::Relaxed) as f64 / total as f64
    }

    /// Share of invocations each analyzer had in the given hour bucket
    ///
    /// Shares sum to 1.0 over the analyzers that ran in that hour; an empty
    /// map means nothing ran then.
    pub fn usage_shares(&self, hour: u32) -> HashMap<String, f64> {
        let bucket = (hour % 24) as usize;
        let mut shares = HashMap::new();
        if let Ok(analyzers) = self.analyzers.read() {
            let total: u64 = analyzers.values().map(|s| s.hourly[bucket]).sum();
            if total == 0 {
                return shares;
            }
            for (id, stats) in analyzers.iter() {
                if stats.hourly[bucket] > 0 {
                    shares.insert(id.clone(), stats.hourly[bucket] as f64 / total as f64);
                }
            }
        }
        shares
    }

    /// Get current statistics snapshot
    pub fn snapshot(&self) -> StatsSnapshot {
        let mut summaries = Vec::new();
        if let Ok(analyzers) = self.analyzers.read() {
            for (id, stats) in analyzers.iter() {
                let success_rate = if stats.invocations == 0 {
                    0.0
                } else {
                    stats.successes as f64 / stats.invocations as f64
                };
                let avg_elapsed_ms = if stats.invocations == 0 {
                    0.0
                } else {
                    stats.total_elapsed.as_secs_f64() * 1000.0 / stats.invocations as f64
                };
                summaries.push(AnalyzerSummary {
                    analyzer_id: id.clone(),
                    invocations: stats.invocations,
                    successes: stats.successes,
                    failures: stats.failures,
                    success_rate,
                    avg_elapsed_ms,
                    hourly: stats.hourly,
                });
            }
        }
        summaries.sort_by(|a, b| a.analyzer_id.cmp(&b.analyzer_id));

        StatsSnapshot {
            generated_at: Utc::now(),
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_succeeded: self.requests_succeeded.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            analyzers: summaries,
        }
    }

    /// Reset all counters
    pub fn clear(&self) {
        self.requests_total.store(0, Ordering::Relaxed);
        self.requests_succeeded.store(0, Ordering::Relaxed);
        self.requests_failed.store(0, Ordering::Relaxed);
        if let Ok(mut analyzers) = self.analyzers.write() {
            analyzers.clear();
        }
    }
}
