//! Deterministic merging of analyzer outcomes
//!
//! The merger turns a pile of per-analyzer outcomes into one unified
//! decomposition. Failed outcomes are dropped first; survivors are
//! deduplicated per analyzer (best confidence wins) and ordered by
//! confidence, then priority, then id, so the same outcomes always merge
//! the same way.
//!
//! # Conflict resolution
//!
//! The strongest survivor seeds the merged slots. Each later contributor
//! adopts its values into empty slots; where a slot is already held, the
//! conflict resolves in order:
//! 1. Overwriting disabled: the incumbent stays.
//! 2. Incumbent written by a protected-precedence analyzer: it stays.
//! 3. Strictly longer challenger value: the challenger wins on specificity.
//! 4. Otherwise the incumbent stays.
//!
//! Identical values are agreement, not conflict. Sub-slot values only merge
//! when the contributors agree on the parent clause slot. Every resolved
//! conflict is recorded on the result, and upper-slot emptying is enforced
//! last.

use crate::config::MergeConfig;
use crate::error::HarmoniaError;
use crate::types::{
    AnalyzerOutcome, ConflictRule, Precedence, Slot, SlotAssignment, SlotConflict, UnifiedResult,
};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// One merged slot value with the analyzer that holds it
#[derive(Debug, Clone)]
struct MergedValue {
    text: String,
    source: String,
    precedence: Precedence,
}

impl MergedValue {
    fn from_outcome(text: &str, outcome: &AnalyzerOutcome) -> Self {
        Self {
            text: text.to_string(),
            source: outcome.analyzer_id.clone(),
            precedence: outcome.precedence,
        }
    }
}

/// Merges analyzer outcomes into one unified result
pub struct ResultMerger {
    config: MergeConfig,
}

impl ResultMerger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// Merge outcomes into one unified result
    ///
    /// The highest-confidence survivor (ties broken by ascending priority,
    /// then id) seeds the merged slots. With no successful outcome this
    /// returns a failed result whose error aggregates every analyzer's
    /// failure.
    pub fn merge(&self, outcomes: &[AnalyzerOutcome]) -> UnifiedResult {
        let mut survivors = dedup_successes(outcomes);
        if survivors.is_empty() {
            let detail = summarize_failures(outcomes);
            return UnifiedResult::failure(
                HarmoniaError::AllAnalyzersFailed(detail).to_string(),
            );
        }

        let seed = survivors.remove(0);

        let mut top: BTreeMap<Slot, MergedValue> = BTreeMap::new();
        let mut sub: BTreeMap<Slot, MergedValue> = BTreeMap::new();
        for (slot, value) in seed.slots.iter() {
            top.insert(slot, MergedValue::from_outcome(value, seed));
        }
        for (slot, value) in seed.slots.iter_sub() {
            sub.insert(slot, MergedValue::from_outcome(value, seed));
        }
        let mut sub_parent = seed.slots.sub_parent();

        let mut conflicts = Vec::new();
        let mut contributors = vec![seed.analyzer_id.clone()];

        for &challenger in &survivors {
            contributors.push(challenger.analyzer_id.clone());
            self.merge_layer(&mut top, &mut conflicts, challenger, challenger.slots.iter(), false);

            if !challenger.slots.has_sub_slots() {
                continue;
            }
            let compatible = match (sub_parent, challenger.slots.sub_parent()) {
                (Some(existing), Some(incoming)) => existing == incoming,
                _ => true,
            };
            if !compatible {
                debug!(
                    "Skipping sub-slots from '{}': parent clause differs",
                    challenger.analyzer_id
                );
                continue;
            }
            if sub_parent.is_none() {
                sub_parent = challenger.slots.sub_parent();
            }
            self.merge_layer(
                &mut sub,
                &mut conflicts,
                challenger,
                challenger.slots.iter_sub(),
                true,
            );
        }

        let mut slots = SlotAssignment::new();
        for (slot, held) in &top {
            slots.set(*slot, held.text.clone());
        }
        for (slot, held) in &sub {
            slots.set_sub(*slot, held.text.clone());
        }
        slots.set_sub_parent(sub_parent);
        slots.apply_upper_slot_emptying();

        let bonus = (self.config.bonus_step * contributors.len().saturating_sub(1) as f64)
            .min(self.config.bonus_cap);
        let confidence = seed.confidence() + bonus;

        UnifiedResult::merged(slots, contributors, confidence, conflicts)
    }

    /// Fold one contributor's values into a slot layer
    fn merge_layer<'a>(
        &self,
        layer: &mut BTreeMap<Slot, MergedValue>,
        conflicts: &mut Vec<SlotConflict>,
        challenger: &AnalyzerOutcome,
        values: impl Iterator<Item = (Slot, &'a str)>,
        sub_slot: bool,
    ) {
        for (slot, value) in values {
            match layer.entry(slot) {
                Entry::Vacant(vacant) => {
                    vacant.insert(MergedValue::from_outcome(value, challenger));
                }
                Entry::Occupied(mut occupied) => {
                    let held = occupied.get_mut();
                    if held.text == value {
                        continue;
                    }

                    let (keep_incumbent, rule) = if !self.config.allow_overwrite {
                        (true, ConflictRule::Incumbent)
                    } else if held.precedence == Precedence::Protected {
                        (true, ConflictRule::ProtectedSource)
                    } else if value.chars().count() > held.text.chars().count() {
                        (false, ConflictRule::Specificity)
                    } else {
                        (true, ConflictRule::Incumbent)
                    };

                    conflicts.push(if keep_incumbent {
                        SlotConflict {
                            slot,
                            sub_slot,
                            kept: held.text.clone(),
                            discarded: value.to_string(),
                            winner: held.source.clone(),
                            loser: challenger.analyzer_id.clone(),
                            rule,
                        }
                    } else {
                        SlotConflict {
                            slot,
                            sub_slot,
                            kept: value.to_string(),
                            discarded: held.text.clone(),
                            winner: challenger.analyzer_id.clone(),
                            loser: held.source.clone(),
                            rule,
                        }
                    });

                    if !keep_incumbent {
                        *held = MergedValue::from_outcome(value, challenger);
                    }
                }
            }
        }
    }
}

/// Keep only successful outcomes, one per analyzer id (best confidence),
/// ordered by confidence desc, then priority asc, then id asc
fn dedup_successes(outcomes: &[AnalyzerOutcome]) -> Vec<&AnalyzerOutcome> {
    let mut best: HashMap<&str, &AnalyzerOutcome> = HashMap::new();
    for outcome in outcomes.iter().filter(|o| o.success) {
        match best.get(outcome.analyzer_id.as_str()) {
            Some(existing) if existing.confidence() >= outcome.confidence() => {}
            _ => {
                best.insert(outcome.analyzer_id.as_str(), outcome);
            }
        }
    }
    let mut survivors: Vec<&AnalyzerOutcome> = best.into_values().collect();
    survivors.sort_by(|a, b| {
        b.confidence()
            .total_cmp(&a.confidence())
            .then_with(|| a.priority.cmp(&b.priority))
            .then_with(|| a.analyzer_id.cmp(&b.analyzer_id))
    });
    survivors
}

/// Aggregate per-analyzer failure text for the all-failed case
fn summarize_failures(outcomes: &[AnalyzerOutcome]) -> String {
    if outcomes.is_empty() {
        return "no analyzers produced output".to_string();
    }
    outcomes
        .iter()
        .map(|o| {
            format!(
                "{}: {}",
                o.analyzer_id,
                o.error.as_deref().unwrap_or("unknown error")
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}
