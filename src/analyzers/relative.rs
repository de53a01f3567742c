//! Relative-clause analyzer
//!
//! Finds the first relative marker, treats the couple of words before it as
//! the antecedent, and decomposes the clause body into sub-slots parented to
//! the first object slot.

use super::{is_one_of, words, BE_FORMS, MODALS};
use crate::error::{HarmoniaError, Result};
use crate::registry::{Analyzer, AnalyzerRegistration, TriggerCategory, TriggerPattern};
use crate::types::{Analysis, Slot, SlotAssignment};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

pub const ID: &str = "relative";
pub const PRIORITY: u32 = 20;

const CONFIDENCE: f64 = 0.75;

/// Relative markers; doubles as the trigger keyword list
const MARKERS: &[&str] = &["who", "whom", "whose", "which", "that", "where", "when"];

/// How many words before the marker count as the antecedent phrase
const ANTECEDENT_SPAN: usize = 2;

pub struct RelativeAnalyzer;

pub fn registration() -> AnalyzerRegistration {
    AnalyzerRegistration::new(ID, PRIORITY, || {
        Ok(Arc::new(RelativeAnalyzer) as Arc<dyn Analyzer>)
    })
    .with_trigger(TriggerPattern::new(
        TriggerCategory::Relative,
        MARKERS.iter().copied(),
    ))
}

fn looks_verbal(word: &str) -> bool {
    let lowered = word.to_lowercase();
    is_one_of(word, BE_FORMS)
        || is_one_of(word, MODALS)
        || super::is_participle(word)
        || lowered.ends_with("es")
        || lowered.ends_with("ing")
}

#[async_trait]
impl Analyzer for RelativeAnalyzer {
    fn identifier(&self) -> &str {
        ID
    }

    fn priority(&self) -> u32 {
        PRIORITY
    }

    async fn analyze(&self, sentence: &str) -> Result<Analysis> {
        let words = words(sentence);
        // A sentence-initial marker is a demonstrative, not a relative.
        let marker_idx = (1..words.len())
            .find(|&i| is_one_of(words[i], MARKERS))
            .ok_or_else(|| HarmoniaError::AnalyzerExecution {
                id: ID.to_string(),
                message: "no relative marker found".to_string(),
            })?;

        let start = marker_idx.saturating_sub(ANTECEDENT_SPAN);
        let mut slots = SlotAssignment::new();
        slots.set(Slot::Object1, words[start..].join(" "));

        let body = &words[marker_idx + 1..];
        match body {
            [] => {}
            [only] => {
                slots.set_sub(Slot::Verb, *only);
            }
            [first, rest @ ..] if looks_verbal(first) => {
                // Marker is the clause subject: "which was red".
                slots.set_sub(Slot::Verb, *first);
                if !rest.is_empty() {
                    slots.set_sub(Slot::Object1, rest.join(" "));
                }
            }
            [subject, verb, rest @ ..] => {
                slots.set_sub(Slot::Subject, *subject);
                slots.set_sub(Slot::Verb, *verb);
                if !rest.is_empty() {
                    slots.set_sub(Slot::Object1, rest.join(" "));
                }
            }
        }
        if slots.has_sub_slots() {
            slots.set_sub_parent(Some(Slot::Object1));
        }

        Ok(Analysis::new(slots, CONFIDENCE).with_metadata("marker", json!(words[marker_idx])))
    }
}
