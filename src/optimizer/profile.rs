//! Per-analyzer performance profiles
//!
//! Each profile is a sliding picture of one analyzer's behavior built from
//! exponential moving averages:
//! - success rate (seeded with the first sample, then EMA-smoothed)
//! - average latency in seconds (same seeding)
//! - usage frequency (moves toward 1.0 when the analyzer runs, decays
//!   toward 0.0 when it sits a request out)
//!
//! Profiles also keep a bounded cache of sentence-pattern signatures with a
//! per-signature success EMA; the optimizer uses it to score how similar a
//! new sentence is to sentences the analyzer has handled well before.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

/// Normalized word-set signature of a sentence
///
/// Lowercased, split on non-alphanumerics, deduplicated and sorted, so word
/// order and punctuation do not produce distinct signatures.
pub fn sentence_signature(sentence: &str) -> String {
    let lowered = sentence.to_lowercase();
    let mut words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    words.sort_unstable();
    words.dedup();
    words.join(" ")
}

/// Learned performance picture for a single analyzer
#[derive(Debug, Clone, Default)]
pub struct PerformanceProfile {
    usage_frequency: f64,
    avg_latency: f64,
    success_rate: f64,
    samples: u64,
    /// Sentence signature -> success EMA, bounded by the pattern cache cap
    patterns: HashMap<String, f64>,
}

impl PerformanceProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of recent requests that invoked this analyzer
    pub fn usage_frequency(&self) -> f64 {
        self.usage_frequency
    }

    /// Smoothed latency in seconds
    pub fn avg_latency(&self) -> f64 {
        self.avg_latency
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Fold in one invocation
    ///
    /// The first sample seeds the success and latency averages directly so a
    /// new analyzer is not dragged toward zero; later samples move by the
    /// smoothing factor. The sentence signature is admitted to the pattern
    /// cache, evicting the weakest signature when the cap is reached.
    pub fn record_invocation(
        &mut self,
        success: bool,
        elapsed: Duration,
        smoothing: f64,
        signature: &str,
        pattern_cap: usize,
    ) {
        let outcome = if success { 1.0 } else { 0.0 };
        let latency = elapsed.as_secs_f64();

        if self.samples == 0 {
            self.success_rate = outcome;
            self.avg_latency = latency;
        } else {
            self.success_rate += smoothing * (outcome - self.success_rate);
            self.avg_latency += smoothing * (latency - self.avg_latency);
        }
        self.samples += 1;
        self.usage_frequency += smoothing * (1.0 - self.usage_frequency);

        if signature.is_empty() || pattern_cap == 0 {
            return;
        }
        match self.patterns.get_mut(signature) {
            Some(score) => *score += smoothing * (outcome - *score),
            None => {
                if self.patterns.len() >= pattern_cap {
                    self.evict_weakest_pattern();
                }
                self.patterns.insert(signature.to_string(), outcome);
            }
        }
    }

    /// Decay usage frequency for a request this analyzer sat out
    pub fn record_idle(&mut self, smoothing: f64) {
        self.usage_frequency *= 1.0 - smoothing;
    }

    /// Similarity of a sentence to the analyzer's remembered successes
    ///
    /// The best Jaccard overlap between the sentence's word set and any
    /// cached signature, weighted by that signature's success EMA. Ranges
    /// over [0, 1]; an empty cache or empty sentence scores 0.
    pub fn pattern_similarity(&self, signature: &str) -> f64 {
        let words: BTreeSet<&str> = signature.split_whitespace().collect();
        if words.is_empty() {
            return 0.0;
        }

        let mut best: f64 = 0.0;
        for (cached, success) in &self.patterns {
            let cached_words: BTreeSet<&str> = cached.split_whitespace().collect();
            let union = words.union(&cached_words).count();
            if union == 0 {
                continue;
            }
            let intersection = words.intersection(&cached_words).count();
            let jaccard = intersection as f64 / union as f64;
            best = best.max(jaccard * success);
        }
        best
    }

    /// Drop the cached signature with the lowest success EMA (ties by key)
    fn evict_weakest_pattern(&mut self) {
        let weakest = self
            .patterns
            .iter()
            .min_by(|a, b| a.1.total_cmp(b.1).then_with(|| a.0.cmp(b.0)))
            .map(|(key, _)| key.clone());
        if let Some(key) = weakest {
            self.patterns.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_normalizes_order_and_case() {
        assert_eq!(
            sentence_signature("The cat sat."),
            sentence_signature("SAT, the cat!")
        );
        assert_eq!(sentence_signature("a b a"), "a b");
        assert_eq!(sentence_signature("  "), "");
    }

    #[test]
    fn test_first_sample_seeds_averages() {
        let mut profile = PerformanceProfile::new();
        profile.record_invocation(true, Duration::from_millis(500), 0.1, "cat sat", 50);

        assert_eq!(profile.success_rate(), 1.0);
        assert!((profile.avg_latency() - 0.5).abs() < 1e-9);
        assert_eq!(profile.samples(), 1);
    }

    #[test]
    fn test_ema_moves_by_smoothing_factor() {
        let mut profile = PerformanceProfile::new();
        profile.record_invocation(true, Duration::from_secs(1), 0.1, "a", 50);
        profile.record_invocation(false, Duration::from_secs(3), 0.1, "b", 50);

        // 1.0 + 0.1 * (0.0 - 1.0) = 0.9
        assert!((profile.success_rate() - 0.9).abs() < 1e-9);
        // 1.0 + 0.1 * (3.0 - 1.0) = 1.2
        assert!((profile.avg_latency() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_usage_frequency_rises_and_decays() {
        let mut profile = PerformanceProfile::new();
        profile.record_invocation(true, Duration::ZERO, 0.5, "a", 50);
        assert!((profile.usage_frequency() - 0.5).abs() < 1e-9);

        profile.record_invocation(true, Duration::ZERO, 0.5, "a", 50);
        assert!((profile.usage_frequency() - 0.75).abs() < 1e-9);

        profile.record_idle(0.5);
        assert!((profile.usage_frequency() - 0.375).abs() < 1e-9);
    }

    #[test]
    fn test_pattern_cache_bounded() {
        let mut profile = PerformanceProfile::new();
        for i in 0..10 {
            profile.record_invocation(true, Duration::ZERO, 0.1, &format!("word{}", i), 4);
        }
        assert_eq!(profile.pattern_count(), 4);
    }

    #[test]
    fn test_eviction_drops_weakest_signature() {
        let mut profile = PerformanceProfile::new();
        profile.record_invocation(false, Duration::ZERO, 0.1, "weak", 2);
        profile.record_invocation(true, Duration::ZERO, 0.1, "strong", 2);
        profile.record_invocation(true, Duration::ZERO, 0.1, "fresh", 2);

        // "weak" had success 0.0 and must be the one evicted.
        assert_eq!(profile.pattern_count(), 2);
        assert_eq!(profile.pattern_similarity("weak"), 0.0);
        assert!(profile.pattern_similarity("strong") > 0.9);
    }

    #[test]
    fn test_pattern_similarity_partial_overlap() {
        let mut profile = PerformanceProfile::new();
        profile.record_invocation(true, Duration::ZERO, 0.1, "cat mat sat the", 50);

        let exact = profile.pattern_similarity("cat mat sat the");
        assert!((exact - 1.0).abs() < 1e-9);

        // 2 shared words of 6 in the union: jaccard 1/3
        let partial = profile.pattern_similarity("cat dog ran the");
        assert!(partial > 0.0 && partial < exact);

        assert_eq!(profile.pattern_similarity(""), 0.0);
    }
}
