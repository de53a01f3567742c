//! Analyzer Registry
//!
//! Centralized registry for pluggable grammatical analyzers. A
//! registration carries an id, a priority, optional trigger patterns, and
//! a factory; the analyzer instance itself is built lazily on first use
//! (see [`loader`]). Applicability detection over the registered triggers
//! lives in [`detector`].
//!
//! Registering an id twice replaces the previous analyzer with a warning
//! by default; strict mode turns the collision into an error instead.

pub mod detector;
pub mod loader;

pub use detector::{ApplicabilityDetector, Candidate, Detection, TriggerCategory, TriggerPattern};
pub use loader::InstanceSlot;

use crate::error::{HarmoniaError, Result};
use crate::types::{Analysis, Precedence};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Capability interface implemented by every analyzer
///
/// Implementations must be cheap to share across requests; per-sentence
/// state belongs in `analyze`, not in the instance.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Stable identifier, unique within a registry
    fn identifier(&self) -> &str;

    /// Priority matching the descriptor's; lower runs earlier
    fn priority(&self) -> u32;

    /// Decompose one sentence into a slot assignment
    async fn analyze(&self, sentence: &str) -> Result<Analysis>;
}

impl fmt::Debug for dyn Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("id", &self.identifier())
            .field("priority", &self.priority())
            .finish()
    }
}

/// Factory producing an analyzer instance on first demand
pub type AnalyzerFactory = Box<dyn Fn() -> Result<Arc<dyn Analyzer>> + Send + Sync>;

/// Everything needed to register one analyzer
pub struct AnalyzerRegistration {
    id: String,
    priority: u32,
    precedence: Precedence,
    triggers: Vec<TriggerPattern>,
    factory: AnalyzerFactory,
}

impl AnalyzerRegistration {
    pub fn new<F>(id: impl Into<String>, priority: u32, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Analyzer>> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            priority,
            precedence: Precedence::Standard,
            triggers: Vec::new(),
            factory: Box::new(factory),
        }
    }

    /// Mark this analyzer's slot values as protected during merging
    pub fn with_precedence(mut self, precedence: Precedence) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn with_trigger(mut self, trigger: TriggerPattern) -> Self {
        self.triggers.push(trigger);
        self
    }
}

/// Registered analyzer metadata plus its lazily filled instance slot
pub struct AnalyzerDescriptor {
    id: String,
    priority: u32,
    precedence: Precedence,
    triggers: Vec<TriggerPattern>,
    factory: AnalyzerFactory,
    instance: InstanceSlot,
}

impl AnalyzerDescriptor {
    fn from_registration(registration: AnalyzerRegistration) -> Self {
        Self {
            id: registration.id,
            priority: registration.priority,
            precedence: registration.precedence,
            triggers: registration.triggers,
            factory: registration.factory,
            instance: InstanceSlot::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn precedence(&self) -> Precedence {
        self.precedence
    }

    pub fn triggers(&self) -> &[TriggerPattern] {
        &self.triggers
    }

    /// True when the instance has been constructed successfully
    pub fn is_loaded(&self) -> bool {
        self.instance.is_loaded()
    }

    pub fn load_failed(&self) -> bool {
        self.instance.load_failed()
    }

    /// Get the shared instance, running the factory on first call
    pub async fn instance(&self) -> Result<Arc<dyn Analyzer>> {
        self.instance.get_or_load(&self.id, &self.factory).await
    }
}

impl fmt::Debug for AnalyzerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerDescriptor")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("precedence", &self.precedence)
            .field("triggers", &self.triggers.len())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// Thread-safe analyzer registry
#[derive(Clone)]
pub struct AnalyzerRegistry {
    strict_duplicates: bool,
    /// Map of analyzer id to descriptor
    descriptors: Arc<RwLock<HashMap<String, Arc<AnalyzerDescriptor>>>>,
}

impl AnalyzerRegistry {
    pub fn new(strict_duplicates: bool) -> Self {
        Self {
            strict_duplicates,
            descriptors: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register an analyzer
    ///
    /// A duplicate id replaces the existing registration with a warning,
    /// unless strict duplicate handling was configured, in which case the
    /// call fails and the existing registration stays in place.
    pub async fn register(&self, registration: AnalyzerRegistration) -> Result<()> {
        let descriptor = Arc::new(AnalyzerDescriptor::from_registration(registration));
        let mut descriptors = self.descriptors.write().await;
        if descriptors.contains_key(descriptor.id()) {
            if self.strict_duplicates {
                return Err(HarmoniaError::DuplicateAnalyzer(descriptor.id().to_string()));
            }
            warn!("Analyzer '{}' already registered, replacing it", descriptor.id());
        }
        debug!(
            "Registered analyzer '{}' (priority {}, {} trigger patterns)",
            descriptor.id(),
            descriptor.priority(),
            descriptor.triggers().len()
        );
        descriptors.insert(descriptor.id().to_string(), descriptor);
        Ok(())
    }

    /// Remove an analyzer; dropping the descriptor drops any loaded instance
    pub async fn unregister(&self, id: &str) -> bool {
        let mut descriptors = self.descriptors.write().await;
        descriptors.remove(id).is_some()
    }

    /// Get descriptor by id
    pub async fn get(&self, id: &str) -> Option<Arc<AnalyzerDescriptor>> {
        let descriptors = self.descriptors.read().await;
        descriptors.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        let descriptors = self.descriptors.read().await;
        descriptors.contains_key(id)
    }

    /// All descriptors ordered by (priority, id)
    pub async fn all(&self) -> Vec<Arc<AnalyzerDescriptor>> {
        let descriptors = self.descriptors.read().await;
        let mut all: Vec<_> = descriptors.values().cloned().collect();
        all.sort_by(|a, b| {
            a.priority()
                .cmp(&b.priority())
                .then_with(|| a.id().cmp(b.id()))
        });
        all
    }

    /// Get count of registered analyzers
    pub async fn count(&self) -> usize {
        let descriptors = self.descriptors.read().await;
        descriptors.len()
    }

    /// Ids of analyzers whose instance has been constructed
    pub async fn loaded_ids(&self) -> Vec<String> {
        let descriptors = self.descriptors.read().await;
        let mut ids: Vec<String> = descriptors
            .values()
            .filter(|d| d.is_loaded())
            .map(|d| d.id().to_string())
            .collect();
        ids.sort();
        ids
    }

    /// Force-load an analyzer instance, erroring on unknown ids
    pub async fn ensure_loaded(&self, id: &str) -> Result<Arc<dyn Analyzer>> {
        let descriptor = self
            .get(id)
            .await
            .ok_or_else(|| HarmoniaError::UnknownAnalyzer(id.to_string()))?;
        descriptor.instance().await
    }
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::new(false)
    }
}
