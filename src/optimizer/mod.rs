//! Adaptive analyzer ordering
//!
//! Learns per-analyzer performance profiles from observed outcomes and
//! reorders candidate lists so analyzers likely to do well on a sentence
//! run first and survive fanout caps.
//!
//! # Scoring
//!
//! Each candidate gets a weighted composite of four signals:
//! 1. Success rate (EMA over past invocations)
//! 2. Latency, folded through 1 / (1 + seconds) so faster is higher
//! 3. Usage frequency (how often recent requests used the analyzer)
//! 4. Pattern similarity to sentences the analyzer handled well
//!
//! Weights and the EMA smoothing factor come from [`OptimizerConfig`].
//! A never-seen analyzer scores only through the latency term, which gives
//! it a neutral middle score instead of burying it.

pub mod preloader;
pub mod profile;

pub use preloader::PreloaderHandle;
pub use profile::{sentence_signature, PerformanceProfile};

use crate::config::OptimizerConfig;
use crate::registry::Candidate;
use crate::types::AnalyzerOutcome;
use std::collections::HashMap;
use std::sync::RwLock;

/// Profile store plus the scoring weights applied over it
#[derive(Debug)]
pub struct AdaptiveOptimizer {
    config: OptimizerConfig,
    profiles: RwLock<HashMap<String, PerformanceProfile>>,
}

impl AdaptiveOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            config,
            profiles: RwLock::new(HashMap::new()),
        }
    }

    /// Fold one request's outcomes into the profiles
    ///
    /// Analyzers that ran get a success/latency/pattern sample; every other
    /// known analyzer has its usage frequency decayed for sitting this
    /// request out.
    pub fn record(&self, outcomes: &[AnalyzerOutcome], sentence: &str) {
        let signature = sentence_signature(sentence);
        if let Ok(mut profiles) = self.profiles.write() {
            for outcome in outcomes {
                let profile = profiles.entry(outcome.analyzer_id.clone()).or_default();
                profile.record_invocation(
                    outcome.success,
                    outcome.elapsed,
                    self.config.smoothing,
                    &signature,
                    self.config.pattern_cache_cap,
                );
            }
            for (id, profile) in profiles.iter_mut() {
                if !outcomes.iter().any(|o| &o.analyzer_id == id) {
                    profile.record_idle(self.config.smoothing);
                }
            }
        }
    }

    /// Composite score for one analyzer against one sentence signature
    pub fn score(&self, analyzer_id: &str, signature: &str) -> f64 {
        let profiles = match self.profiles.read() {
            Ok(profiles) => profiles,
            Err(_) => return 0.0,
        };
        match profiles.get(analyzer_id) {
            Some(profile) => self.composite(profile, signature),
            None => self.composite(&PerformanceProfile::default(), signature),
        }
    }

    fn composite(&self, profile: &PerformanceProfile, signature: &str) -> f64 {
        let latency_term = 1.0 / (1.0 + profile.avg_latency());
        self.config.weight_success * profile.success_rate()
            + self.config.weight_latency * latency_term
            + self.config.weight_frequency * profile.usage_frequency()
            + self.config.weight_pattern * profile.pattern_similarity(signature)
    }

    /// Reorder candidates by descending composite score
    ///
    /// Score ties fall back to (priority, id), so a fresh optimizer returns
    /// candidates in their registration priority order.
    pub fn reorder(&self, candidates: &[Candidate], sentence: &str) -> Vec<Candidate> {
        let signature = sentence_signature(sentence);
        let mut scored: Vec<(f64, Candidate)> = candidates
            .iter()
            .map(|candidate| (self.score(&candidate.id, &signature), candidate.clone()))
            .collect();
        scored.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| a.1.priority.cmp(&b.1.priority))
                .then_with(|| a.1.id.cmp(&b.1.id))
        });
        scored.into_iter().map(|(_, candidate)| candidate).collect()
    }

    /// Cloned profile for inspection, if the analyzer has one
    pub fn profile(&self, analyzer_id: &str) -> Option<PerformanceProfile> {
        self.profiles
            .read()
            .ok()
            .and_then(|profiles| profiles.get(analyzer_id).cloned())
    }

    /// Forget everything learned so far
    pub fn clear(&self) {
        if let Ok(mut profiles) = self.profiles.write() {
            profiles.clear();
        }
    }
}
