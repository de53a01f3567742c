//! Failure-isolated analyzer execution
//!
//! Every planned analyzer runs inside its own task with an optional
//! per-invocation deadline. Load failures, returned errors, panics, and
//! deadline misses all collapse into a failed [`AnalyzerOutcome`]; nothing
//! an analyzer does can take down the request or its sibling analyzers.

use crate::registry::AnalyzerDescriptor;
use crate::types::AnalyzerOutcome;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Runs analyzers under a shared deadline policy
pub struct ExecutionEngine {
    /// Per-invocation deadline; None disables the limit
    deadline: Option<Duration>,
}

impl ExecutionEngine {
    pub fn new(deadline: Option<Duration>) -> Self {
        Self { deadline }
    }

    /// Run one analyzer to a guaranteed outcome
    pub async fn run_one(
        &self,
        descriptor: Arc<AnalyzerDescriptor>,
        sentence: &str,
    ) -> AnalyzerOutcome {
        run_analyzer(descriptor, sentence.to_string(), self.deadline).await
    }

    /// Run several analyzers concurrently, preserving input order
    ///
    /// All analyzers start together; the returned outcomes line up with the
    /// descriptor order regardless of completion order.
    pub async fn run_concurrent(
        &self,
        descriptors: &[Arc<AnalyzerDescriptor>],
        sentence: &str,
    ) -> Vec<AnalyzerOutcome> {
        let mut join_set = JoinSet::new();
        for (index, descriptor) in descriptors.iter().enumerate() {
            let descriptor = Arc::clone(descriptor);
            let sentence = sentence.to_string();
            let deadline = self.deadline;
            join_set
                .spawn(async move { (index, run_analyzer(descriptor, sentence, deadline).await) });
        }

        let mut outcomes: Vec<Option<AnalyzerOutcome>> =
            descriptors.iter().map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => warn!("Analyzer wrapper task failed to join: {}", e),
            }
        }

        outcomes
            .into_iter()
            .enumerate()
            .map(|(index, outcome)| {
                outcome.unwrap_or_else(|| {
                    let descriptor = &descriptors[index];
                    AnalyzerOutcome::failed(
                        descriptor.id(),
                        "analyzer task aborted",
                        Duration::ZERO,
                        descriptor.priority(),
                        descriptor.precedence(),
                    )
                })
            })
            .collect()
    }
}

/// Run one analyzer, converting every failure mode into a failed outcome
async fn run_analyzer(
    descriptor: Arc<AnalyzerDescriptor>,
    sentence: String,
    deadline: Option<Duration>,
) -> AnalyzerOutcome {
    let started = Instant::now();

    let analyzer = match descriptor.instance().await {
        Ok(analyzer) => analyzer,
        Err(e) => {
            return AnalyzerOutcome::failed(
                descriptor.id(),
                e.to_string(),
                started.elapsed(),
                descriptor.priority(),
                descriptor.precedence(),
            );
        }
    };

    // The inner task keeps a panicking analyzer from unwinding into us.
    let mut handle = tokio::spawn(async move { analyzer.analyze(&sentence).await });

    let joined = match deadline {
        Some(limit) => match timeout(limit, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                warn!(
                    "Analyzer '{}' exceeded its {}ms deadline",
                    descriptor.id(),
                    limit.as_millis()
                );
                return AnalyzerOutcome::failed(
                    descriptor.id(),
                    format!("deadline of {}ms exceeded", limit.as_millis()),
                    started.elapsed(),
                    descriptor.priority(),
                    descriptor.precedence(),
                );
            }
        },
        None => handle.await,
    };

    let elapsed = started.elapsed();
    match joined {
        Ok(Ok(analysis)) => {
            debug!("Analyzer '{}' finished in {:?}", descriptor.id(), elapsed);
            AnalyzerOutcome::succeeded(
                descriptor.id(),
                analysis,
                elapsed,
                descriptor.priority(),
                descriptor.precedence(),
            )
        }
        Ok(Err(e)) => {
            warn!("Analyzer '{}' failed: {}", descriptor.id(), e);
            AnalyzerOutcome::failed(
                descriptor.id(),
                e.to_string(),
                elapsed,
                descriptor.priority(),
                descriptor.precedence(),
            )
        }
        Err(join_error) => {
            let message = if join_error.is_panic() {
                "analyzer panicked".to_string()
            } else {
                format!("analyzer task cancelled: {}", join_error)
            };
            warn!("Analyzer '{}': {}", descriptor.id(), message);
            AnalyzerOutcome::failed(
                descriptor.id(),
                message,
                elapsed,
                descriptor.priority(),
                descriptor.precedence(),
            )
        }
    }
}
