//! Harmonia - Coordinated Grammatical Slot Decomposition
//!
//! A coordination engine for sentence decomposition that assigns grammatical
//! roles ("slots") to spans of an English sentence using pluggable analyzers:
//! - Trigger-based applicability detection without instantiating analyzers
//! - Lazy, exactly-once analyzer loading with permanent-failure memory
//! - Strategy selection scaled to sentence complexity
//! - Failure-isolated concurrent execution with per-analyzer deadlines
//! - Deterministic merging of conflicting analyzer outputs
//! - Result caching, adaptive analyzer ordering, and predictive preloading
//!
//! # Architecture
//!
//! The crate is organized into coordinator-owned layers:
//! - **Types**: slot vocabulary, outcomes, unified results
//! - **Registry**: descriptors, applicability detection, lazy loading
//! - **Coordination**: strategy selection, execution, merging, caching
//! - **Optimizer**: performance profiles, adaptive ordering, preloading
//!
//! # Example
//!
//! ```ignore
//! use harmonia_core::{analyzers, Coordinator, HarmoniaConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let coordinator = Coordinator::new(HarmoniaConfig::default());
//!     analyzers::register_builtin(coordinator.registry()).await?;
//!
//!     let result = coordinator.process_sentence("The ball was thrown by the boy.").await;
//!     for (slot, value) in result.slots.iter() {
//!         println!("{}: {}", slot.name(), value);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod analyzers;
pub mod config;
pub mod coordination;
pub mod error;
pub mod optimizer;
pub mod registry;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use config::HarmoniaConfig;
pub use coordination::{CoordinationPlan, Coordinator, ResultCache, ResultMerger};
pub use error::{HarmoniaError, Result};
pub use registry::{
    Analyzer, AnalyzerDescriptor, AnalyzerRegistration, AnalyzerRegistry, ApplicabilityDetector,
    TriggerCategory, TriggerPattern,
};
pub use stats::{Statistics, StatsSnapshot};
pub use types::{
    Analysis, AnalysisRequest, AnalyzerOutcome, ConflictRule, Precedence, Slot, SlotAssignment,
    SlotConflict, Strategy, UnifiedResult,
};
