//! Basic subject-verb-object decomposer
//!
//! The foundation analyzer is the always-applicable default: it carries no
//! trigger patterns and relies on the detector's guaranteed inclusion. Its
//! verb heuristic is naive on purpose — first auxiliary, else first word
//! with a common verb suffix, else the second word.

use super::{is_one_of, words, BE_FORMS, MODALS};
use crate::error::{HarmoniaError, Result};
use crate::registry::{Analyzer, AnalyzerRegistration};
use crate::types::{Analysis, Slot, SlotAssignment};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

pub const ID: &str = "foundation";
pub const PRIORITY: u32 = 100;

const BASE_CONFIDENCE: f64 = 0.6;
const SINGLE_WORD_CONFIDENCE: f64 = 0.3;

pub struct FoundationAnalyzer;

/// Registration for the foundation analyzer: lowest weight, no triggers
pub fn registration() -> AnalyzerRegistration {
    AnalyzerRegistration::new(ID, PRIORITY, || {
        Ok(Arc::new(FoundationAnalyzer) as Arc<dyn Analyzer>)
    })
}

fn verb_suffix(word: &str) -> bool {
    let lowered = word.to_lowercase();
    lowered.ends_with("ed") || lowered.ends_with("ing") || lowered.ends_with("es")
}

/// Pick the verb position and name the rule that found it
fn verb_index(words: &[&str]) -> (usize, &'static str) {
    if let Some(i) = words
        .iter()
        .position(|w| is_one_of(w, BE_FORMS) || is_one_of(w, MODALS))
    {
        return (i, "auxiliary");
    }
    if let Some(i) = words.iter().skip(1).position(|w| verb_suffix(w)) {
        return (i + 1, "suffix");
    }
    (1, "position")
}

#[async_trait]
impl Analyzer for FoundationAnalyzer {
    fn identifier(&self) -> &str {
        ID
    }

    fn priority(&self) -> u32 {
        PRIORITY
    }

    async fn analyze(&self, sentence: &str) -> Result<Analysis> {
        let words = words(sentence);
        if words.is_empty() {
            return Err(HarmoniaError::AnalyzerExecution {
                id: ID.to_string(),
                message: "sentence contains no words".to_string(),
            });
        }

        let mut slots = SlotAssignment::new();
        if words.len() == 1 {
            slots.set(Slot::Subject, words[0]);
            return Ok(Analysis::new(slots, SINGLE_WORD_CONFIDENCE)
                .with_metadata("word_count", json!(1)));
        }

        let (verb_idx, rule) = verb_index(&words);
        if verb_idx > 0 {
            slots.set(Slot::Subject, words[..verb_idx].join(" "));
        }

        // An auxiliary followed by a verb-looking word splits into Aux + V.
        let mut rest_from = verb_idx + 1;
        if rule == "auxiliary"
            && words
                .get(verb_idx + 1)
                .is_some_and(|w| super::is_participle(w) || w.to_lowercase().ends_with("ing"))
        {
            slots.set(Slot::Auxiliary, words[verb_idx]);
            slots.set(Slot::Verb, words[verb_idx + 1]);
            rest_from = verb_idx + 2;
        } else {
            slots.set(Slot::Verb, words[verb_idx]);
        }

        if rest_from < words.len() {
            slots.set(Slot::Object1, words[rest_from..].join(" "));
        }

        Ok(Analysis::new(slots, BASE_CONFIDENCE)
            .with_metadata("word_count", json!(words.len()))
            .with_metadata("verb_rule", json!(rule)))
    }
}
