//! Common test fixtures: stub analyzers and coordinator builders

use async_trait::async_trait;
use harmonia_core::error::{HarmoniaError, Result};
use harmonia_core::{
    Analysis, Analyzer, AnalyzerRegistration, Coordinator, HarmoniaConfig, Slot, SlotAssignment,
    TriggerCategory, TriggerPattern,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Analyzer returning a fixed slot assignment with a fixed confidence
pub struct StubAnalyzer {
    pub id: String,
    pub priority: u32,
    pub confidence: f64,
    pub fill: Vec<(Slot, String)>,
}

#[async_trait]
impl Analyzer for StubAnalyzer {
    fn identifier(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    async fn analyze(&self, _sentence: &str) -> Result<Analysis> {
        let mut slots = SlotAssignment::new();
        for (slot, value) in &self.fill {
            slots.set(*slot, value.clone());
        }
        Ok(Analysis::new(slots, self.confidence))
    }
}

/// Registration for a stub analyzer, optionally with one trigger pattern
pub fn stub_registration(
    id: &str,
    priority: u32,
    confidence: f64,
    fill: Vec<(Slot, &str)>,
    trigger: Option<(TriggerCategory, Vec<&str>)>,
) -> AnalyzerRegistration {
    let owned_id = id.to_string();
    let owned_fill: Vec<(Slot, String)> = fill
        .into_iter()
        .map(|(slot, value)| (slot, value.to_string()))
        .collect();

    let mut registration = AnalyzerRegistration::new(id, priority, move || {
        Ok(Arc::new(StubAnalyzer {
            id: owned_id.clone(),
            priority,
            confidence,
            fill: owned_fill.clone(),
        }) as Arc<dyn Analyzer>)
    });
    if let Some((category, keywords)) = trigger {
        registration = registration.with_trigger(TriggerPattern::new(category, keywords));
    }
    registration
}

/// Registration whose factory increments a counter on every invocation
pub fn counting_registration(
    id: &str,
    priority: u32,
    counter: Arc<AtomicUsize>,
) -> AnalyzerRegistration {
    let owned_id = id.to_string();
    AnalyzerRegistration::new(id, priority, move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(StubAnalyzer {
            id: owned_id.clone(),
            priority,
            confidence: 0.8,
            fill: vec![(Slot::Subject, "stub".to_string())],
        }) as Arc<dyn Analyzer>)
    })
}

/// Registration whose factory always fails, counting the attempts
pub fn failing_load_registration(
    id: &str,
    priority: u32,
    counter: Arc<AtomicUsize>,
) -> AnalyzerRegistration {
    let owned_id = id.to_string();
    AnalyzerRegistration::new(id, priority, move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(HarmoniaError::AnalyzerLoad {
            id: owned_id.clone(),
            message: "model file missing".to_string(),
        })
    })
}

/// Analyzer counting how many times `analyze` runs
pub struct AnalyzeCountingAnalyzer {
    pub id: String,
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Analyzer for AnalyzeCountingAnalyzer {
    fn identifier(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> u32 {
        100
    }

    async fn analyze(&self, _sentence: &str) -> Result<Analysis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut slots = SlotAssignment::new();
        slots.set(Slot::Subject, "counted");
        Ok(Analysis::new(slots, 0.9))
    }
}

/// Registration for an analyzer that counts its `analyze` invocations
pub fn analyze_counting_registration(id: &str, calls: Arc<AtomicUsize>) -> AnalyzerRegistration {
    let owned_id = id.to_string();
    AnalyzerRegistration::new(id, 100, move || {
        Ok(Arc::new(AnalyzeCountingAnalyzer {
            id: owned_id.clone(),
            calls: Arc::clone(&calls),
        }) as Arc<dyn Analyzer>)
    })
}

/// Analyzer whose `analyze` always returns an error
pub struct FailingAnalyzer {
    pub id: String,
    pub priority: u32,
}

#[async_trait]
impl Analyzer for FailingAnalyzer {
    fn identifier(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    async fn analyze(&self, _sentence: &str) -> Result<Analysis> {
        Err(HarmoniaError::AnalyzerExecution {
            id: self.id.clone(),
            message: "pattern matcher crashed".to_string(),
        })
    }
}

/// Registration for an always-failing analyzer with one trigger pattern
pub fn failing_analyze_registration(
    id: &str,
    priority: u32,
    trigger: (TriggerCategory, Vec<&str>),
) -> AnalyzerRegistration {
    let owned_id = id.to_string();
    AnalyzerRegistration::new(id, priority, move || {
        Ok(Arc::new(FailingAnalyzer {
            id: owned_id.clone(),
            priority,
        }) as Arc<dyn Analyzer>)
    })
    .with_trigger(TriggerPattern::new(trigger.0, trigger.1))
}

/// Analyzer that panics inside `analyze`
pub struct PanickingAnalyzer {
    pub id: String,
}

#[async_trait]
impl Analyzer for PanickingAnalyzer {
    fn identifier(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> u32 {
        5
    }

    async fn analyze(&self, _sentence: &str) -> Result<Analysis> {
        panic!("analyzer blew up");
    }
}

pub fn panicking_registration(
    id: &str,
    trigger: (TriggerCategory, Vec<&str>),
) -> AnalyzerRegistration {
    let owned_id = id.to_string();
    AnalyzerRegistration::new(id, 5, move || {
        Ok(Arc::new(PanickingAnalyzer {
            id: owned_id.clone(),
        }) as Arc<dyn Analyzer>)
    })
    .with_trigger(TriggerPattern::new(trigger.0, trigger.1))
}

/// Coordinator with default configuration and no analyzers registered
pub fn bare_coordinator() -> Coordinator {
    Coordinator::new(HarmoniaConfig::default())
}

/// Coordinator with the built-in analyzers registered
pub async fn builtin_coordinator() -> Coordinator {
    let coordinator = bare_coordinator();
    harmonia_core::analyzers::register_builtin(coordinator.registry())
        .await
        .expect("builtin analyzers register");
    coordinator
}
