//! Modal-auxiliary analyzer
//!
//! Splits a sentence around the first modal: subject before it, the modal
//! into the auxiliary slot, the verb after it, negation into a modifier.

use super::{is_one_of, words, MODALS};
use crate::error::{HarmoniaError, Result};
use crate::registry::{Analyzer, AnalyzerRegistration, TriggerCategory, TriggerPattern};
use crate::types::{Analysis, Slot, SlotAssignment};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

pub const ID: &str = "modal";
pub const PRIORITY: u32 = 30;

const CONFIDENCE: f64 = 0.7;

const NEGATIONS: &[&str] = &["not", "never"];

pub struct ModalAnalyzer;

pub fn registration() -> AnalyzerRegistration {
    AnalyzerRegistration::new(ID, PRIORITY, || {
        Ok(Arc::new(ModalAnalyzer) as Arc<dyn Analyzer>)
    })
    .with_trigger(TriggerPattern::new(
        TriggerCategory::Modal,
        MODALS.iter().copied(),
    ))
}

#[async_trait]
impl Analyzer for ModalAnalyzer {
    fn identifier(&self) -> &str {
        ID
    }

    fn priority(&self) -> u32 {
        PRIORITY
    }

    async fn analyze(&self, sentence: &str) -> Result<Analysis> {
        let words = words(sentence);
        let modal_idx = words
            .iter()
            .position(|w| is_one_of(w, MODALS))
            .ok_or_else(|| HarmoniaError::AnalyzerExecution {
                id: ID.to_string(),
                message: "no modal auxiliary found".to_string(),
            })?;

        let mut slots = SlotAssignment::new();
        if modal_idx > 0 {
            slots.set(Slot::Subject, words[..modal_idx].join(" "));
        }
        slots.set(Slot::Auxiliary, words[modal_idx]);

        let mut verb_idx = modal_idx + 1;
        if words
            .get(verb_idx)
            .is_some_and(|w| is_one_of(w, NEGATIONS))
        {
            slots.set(Slot::Modifier3, words[verb_idx]);
            verb_idx += 1;
        }
        if let Some(verb) = words.get(verb_idx) {
            slots.set(Slot::Verb, *verb);
        }
        if verb_idx + 1 < words.len() {
            slots.set(Slot::Object1, words[verb_idx + 1..].join(" "));
        }

        Ok(Analysis::new(slots, CONFIDENCE).with_metadata("modal", json!(words[modal_idx])))
    }
}
