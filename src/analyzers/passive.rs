//! Passive-voice analyzer
//!
//! Detects a be-form auxiliary followed by a past participle, with an
//! optional "by" agent phrase. Registered with protected precedence: a
//! passive reading that fires is structural, so its slot values hold against
//! longer challengers during merging.

use super::{is_one_of, is_participle, words, BE_FORMS};
use crate::error::{HarmoniaError, Result};
use crate::registry::{Analyzer, AnalyzerRegistration, TriggerCategory, TriggerPattern};
use crate::types::{Analysis, Precedence, Slot, SlotAssignment};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

pub const ID: &str = "passive";
pub const PRIORITY: u32 = 10;

const AGENT_CONFIDENCE: f64 = 0.85;
const AGENTLESS_CONFIDENCE: f64 = 0.7;

pub struct PassiveAnalyzer;

/// Registration: protected precedence, triggered by be-form auxiliaries
pub fn registration() -> AnalyzerRegistration {
    AnalyzerRegistration::new(ID, PRIORITY, || {
        Ok(Arc::new(PassiveAnalyzer) as Arc<dyn Analyzer>)
    })
    .with_precedence(Precedence::Protected)
    .with_trigger(TriggerPattern::new(TriggerCategory::Passive, BE_FORMS.iter().copied()))
}

fn execution_error(message: &str) -> HarmoniaError {
    HarmoniaError::AnalyzerExecution {
        id: ID.to_string(),
        message: message.to_string(),
    }
}

#[async_trait]
impl Analyzer for PassiveAnalyzer {
    fn identifier(&self) -> &str {
        ID
    }

    fn priority(&self) -> u32 {
        PRIORITY
    }

    async fn analyze(&self, sentence: &str) -> Result<Analysis> {
        let words = words(sentence);
        let be_idx = words
            .iter()
            .position(|w| is_one_of(w, BE_FORMS))
            .ok_or_else(|| execution_error("no be-form auxiliary found"))?;

        // The participle may sit one adverb away from the auxiliary.
        let participle_idx = (be_idx + 1..=be_idx + 2)
            .filter(|&i| i < words.len())
            .find(|&i| is_participle(words[i]))
            .ok_or_else(|| execution_error("no past participle after the auxiliary"))?;

        let mut slots = SlotAssignment::new();
        if be_idx > 0 {
            slots.set(Slot::Subject, words[..be_idx].join(" "));
        }
        slots.set(Slot::Auxiliary, words[be_idx]);
        slots.set(Slot::Verb, words[participle_idx]);
        if participle_idx > be_idx + 1 {
            slots.set(Slot::Modifier3, words[be_idx + 1]);
        }

        let tail = &words[participle_idx + 1..];
        let by_idx = tail.iter().position(|w| w.eq_ignore_ascii_case("by"));
        let agent = match by_idx {
            Some(i) => {
                if i > 0 {
                    slots.set(Slot::Modifier2, tail[..i].join(" "));
                }
                slots.set(Slot::Modifier1, tail[i..].join(" "));
                true
            }
            None => {
                if !tail.is_empty() {
                    slots.set(Slot::Modifier2, tail.join(" "));
                }
                false
            }
        };

        let confidence = if agent {
            AGENT_CONFIDENCE
        } else {
            AGENTLESS_CONFIDENCE
        };
        Ok(Analysis::new(slots, confidence).with_metadata("agent", json!(agent)))
    }
}
