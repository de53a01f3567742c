//! Sentence coordination engine
//!
//! The coordinator is the single entry point for decomposition requests.
//! Each request flows through a fixed pipeline:
//!
//! 1. **Cache** — normalized-sentence lookup; a fresh hit short-circuits
//!    everything below.
//! 2. **Applicability detection** — trigger patterns pick candidate
//!    analyzers without instantiating any of them.
//! 3. **Strategy selection** — a complexity score chooses single-engine,
//!    foundation-plus-specialist, or multi-cooperative coordination.
//! 4. **Execution** — participants are lazily loaded and run under a
//!    per-analyzer deadline; every failure is contained as a failed outcome.
//! 5. **Merging** — outcomes combine deterministically into one unified
//!    slot assignment.
//!
//! Outcomes feed the adaptive optimizer and the statistics store after every
//! request. The predictive preloader runs on its own background cadence and
//! only ever touches the lazy loader and statistics.

pub mod cache;
pub mod execution;
pub mod merger;
pub mod strategy;

pub use cache::{normalize_sentence, CacheStats, ResultCache};
pub use execution::ExecutionEngine;
pub use merger::ResultMerger;
pub use strategy::{CoordinationPlan, StrategySelector};

use crate::config::HarmoniaConfig;
use crate::error::{HarmoniaError, Result};
use crate::optimizer::{AdaptiveOptimizer, PreloaderHandle};
use crate::registry::{
    AnalyzerRegistration, AnalyzerRegistry, ApplicabilityDetector,
};
use crate::stats::{Statistics, StatsSnapshot};
use crate::types::{AnalysisRequest, AnalyzerOutcome, Strategy, UnifiedResult};
use chrono::Timelike;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Coordination engine owning the registry, cache, profiles, and statistics
///
/// One coordinator serves concurrent requests; every store it owns is
/// internally synchronized, so `process` takes `&self` and the coordinator
/// can sit behind an `Arc` shared across tasks.
pub struct Coordinator {
    config: HarmoniaConfig,
    registry: AnalyzerRegistry,
    detector: ApplicabilityDetector,
    selector: StrategySelector,
    execution: ExecutionEngine,
    merger: ResultMerger,
    cache: ResultCache,
    optimizer: AdaptiveOptimizer,
    stats: Arc<Statistics>,
    preloader: Mutex<Option<PreloaderHandle>>,
}

impl Coordinator {
    /// Create a coordinator from configuration
    pub fn new(config: HarmoniaConfig) -> Self {
        let registry = AnalyzerRegistry::new(config.registry.strict_duplicates);
        let detector = ApplicabilityDetector::new(config.strategy.foundation_id.clone());
        let selector = StrategySelector::new(config.strategy.clone());
        let execution = ExecutionEngine::new(config.execution.deadline());
        let merger = ResultMerger::new(config.merge.clone());
        let cache = ResultCache::new(config.cache.clone());
        let optimizer = AdaptiveOptimizer::new(config.optimizer.clone());

        Self {
            config,
            registry,
            detector,
            selector,
            execution,
            merger,
            cache,
            optimizer,
            stats: Arc::new(Statistics::new()),
            preloader: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &HarmoniaConfig {
        &self.config
    }

    pub fn registry(&self) -> &AnalyzerRegistry {
        &self.registry
    }

    pub fn optimizer(&self) -> &AdaptiveOptimizer {
        &self.optimizer
    }

    /// Register an analyzer with the coordinator's registry
    pub async fn register(&self, registration: AnalyzerRegistration) -> Result<()> {
        self.registry.register(registration).await
    }

    /// Decompose one sentence with default request options
    pub async fn process_sentence(&self, sentence: &str) -> UnifiedResult {
        self.process(AnalysisRequest::new(sentence)).await
    }

    /// Decompose one sentence into a unified slot assignment
    ///
    /// This never returns an error: empty input, a missing foundation
    /// analyzer, and total analyzer failure all come back as a failed
    /// [`UnifiedResult`] carrying the error text. Per-analyzer failures are
    /// contained by the execution engine and surface only through the
    /// merged result.
    pub async fn process(&self, request: AnalysisRequest) -> UnifiedResult {
        let start = Instant::now();
        let sentence = request.sentence.trim().to_string();

        if sentence.is_empty() {
            debug!("Rejecting empty input");
            self.stats.record_request(false);
            return failed_result(HarmoniaError::EmptyInput.to_string(), start);
        }

        if let Some(mut hit) = self.cache.get(&sentence) {
            debug!("Cache hit for '{}'", sentence);
            self.stats.record_request(hit.success);
            hit.elapsed = start.elapsed();
            if request.debug {
                hit.diagnostics
                    .insert("cache_hit".to_string(), json!(true));
            }
            return hit;
        }

        let detection = self.detector.detect(&self.registry, &sentence).await;
        let Some(plan) = self.selector.plan(&sentence, &detection, &self.optimizer) else {
            warn!("No applicable analyzer for '{}'", sentence);
            self.stats.record_request(false);
            let error = HarmoniaError::NoApplicableAnalyzer(
                "no trigger matched and no foundation analyzer is registered".to_string(),
            );
            return failed_result(error.to_string(), start);
        };

        let outcomes = self.execute_plan(&plan, &sentence).await;

        let hour = chrono::Local::now().hour();
        for outcome in &outcomes {
            self.stats.record_outcome(outcome, hour);
        }
        self.optimizer.record(&outcomes, &sentence);

        let mut result = self.merger.merge(&outcomes);
        result.strategy = Some(plan.strategy);
        result.elapsed = start.elapsed();

        self.stats.record_request(result.success);
        // Diagnostics are per-request, so the cache stores the result bare.
        self.cache.put(&sentence, &result);

        if request.debug {
            result.diagnostics = request_diagnostics(&plan, &outcomes);
        }

        debug!(
            "Processed '{}' via {} with {} contributor(s) in {:?}",
            sentence,
            plan.strategy,
            result.contributors.len(),
            result.elapsed
        );
        result
    }

    /// Resolve plan participants and run them under the planned strategy
    async fn execute_plan(&self, plan: &CoordinationPlan, sentence: &str) -> Vec<AnalyzerOutcome> {
        let mut descriptors = Vec::new();
        for candidate in plan.participants() {
            match self.registry.get(&candidate.id).await {
                Some(descriptor) => descriptors.push(descriptor),
                None => warn!("Analyzer '{}' was unregistered before execution", candidate.id),
            }
        }

        match plan.strategy {
            Strategy::MultiCooperative => self.execution.run_concurrent(&descriptors, sentence).await,
            _ => {
                let mut outcomes = Vec::with_capacity(descriptors.len());
                for descriptor in descriptors {
                    outcomes.push(self.execution.run_one(descriptor, sentence).await);
                }
                outcomes
            }
        }
    }

    /// Start the predictive preloader if configuration enables it
    pub async fn start_preloader(&self) {
        if !self.config.preloader.enabled {
            info!("Predictive preloader disabled by configuration");
            return;
        }
        let mut guard = self.preloader.lock().await;
        if guard.is_some() {
            warn!("Predictive preloader already running");
            return;
        }
        *guard = Some(PreloaderHandle::spawn(
            self.registry.clone(),
            Arc::clone(&self.stats),
            self.config.preloader.clone(),
        ));
        info!("Predictive preloader started");
    }

    pub async fn preloader_running(&self) -> bool {
        self.preloader
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| handle.is_running())
    }

    /// Stop background work gracefully
    pub async fn shutdown(&self) -> Result<()> {
        if let Some(mut handle) = self.preloader.lock().await.take() {
            handle.stop().await?;
        }
        info!("Coordinator shut down");
        Ok(())
    }

    /// Drop all memoized results and learned profiles
    ///
    /// Statistics counters are left intact; they are telemetry, not caches.
    pub fn clear_caches(&self) {
        self.cache.clear();
        self.optimizer.clear();
        info!("Coordinator caches cleared");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn stats_snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(HarmoniaConfig::default())
    }
}

fn failed_result(error: String, start: Instant) -> UnifiedResult {
    let mut result = UnifiedResult::failure(error);
    result.elapsed = start.elapsed();
    result
}

fn request_diagnostics(
    plan: &CoordinationPlan,
    outcomes: &[AnalyzerOutcome],
) -> BTreeMap<String, serde_json::Value> {
    let mut diagnostics = BTreeMap::new();
    diagnostics.insert("request_id".to_string(), json!(Uuid::new_v4().to_string()));
    diagnostics.insert("strategy".to_string(), json!(plan.strategy.to_string()));
    diagnostics.insert("complexity".to_string(), json!(plan.complexity));
    diagnostics.insert(
        "categories".to_string(),
        json!(plan.categories.iter().map(|c| c.name()).collect::<Vec<_>>()),
    );
    diagnostics.insert(
        "participants".to_string(),
        json!(plan
            .participants()
            .iter()
            .map(|c| c.id.clone())
            .collect::<Vec<_>>()),
    );
    diagnostics.insert(
        "outcomes".to_string(),
        json!(outcomes
            .iter()
            .map(|o| {
                json!({
                    "analyzer_id": o.analyzer_id,
                    "success": o.success,
                    "confidence": o.confidence(),
                    "elapsed_ms": o.elapsed.as_millis() as u64,
                    "error": o.error,
                })
            })
            .collect::<Vec<_>>()),
    );
    diagnostics
}
