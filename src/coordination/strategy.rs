//! Coordination strategy selection
//!
//! Decides how many analyzers a sentence gets and which ones, producing
//! the plan the execution engine follows.
//!
//! # Selection rules
//!
//! - One applicable analyzer runs alone (single engine).
//! - A sentence whose complexity reaches the configured threshold, or with
//!   at least the configured number of applicable analyzers, escalates to
//!   multi-cooperative: the lowest-priority candidate leads and the rest
//!   join in adaptive order up to the fanout cap. The foundation analyzer
//!   is guaranteed a seat when it is applicable.
//! - Everything else runs foundation-plus-specialist: the foundation
//!   analyzer leads and the best-scoring specialist joins it.
//!
//! Complexity is the number of distinct trigger categories matched plus a
//! capped word-count term, so long sentences escalate even without varied
//! grammar and short dense ones escalate on grammar alone.

use crate::config::StrategyConfig;
use crate::optimizer::AdaptiveOptimizer;
use crate::registry::{Candidate, Detection, TriggerCategory};
use crate::types::Strategy;
use std::collections::BTreeSet;
use tracing::debug;

/// The picked strategy, its participants, and the inputs behind the choice
#[derive(Debug, Clone)]
pub struct CoordinationPlan {
    pub strategy: Strategy,
    /// Analyzer whose slots seed the merge
    pub primary: Candidate,
    /// Other participants, strongest first
    pub supporting: Vec<Candidate>,
    pub categories: BTreeSet<TriggerCategory>,
    pub complexity: f64,
}

impl CoordinationPlan {
    /// All participants in execution order, primary first
    pub fn participants(&self) -> Vec<Candidate> {
        let mut all = Vec::with_capacity(1 + self.supporting.len());
        all.push(self.primary.clone());
        all.extend(self.supporting.iter().cloned());
        all
    }

    pub fn participant_count(&self) -> usize {
        1 + self.supporting.len()
    }
}

/// Chooses a coordination strategy per sentence
pub struct StrategySelector {
    config: StrategyConfig,
}

impl StrategySelector {
    pub fn new(config: StrategyConfig) -> Self {
        Self { config }
    }

    /// Complexity score: distinct trigger categories plus a capped length term
    pub fn complexity(&self, sentence: &str, categories: &BTreeSet<TriggerCategory>) -> f64 {
        let words = sentence.split_whitespace().count();
        let length_term =
            (words as f64 / self.config.length_divisor as f64).min(self.config.length_term_cap);
        categories.len() as f64 + length_term
    }

    /// Build the coordination plan for one sentence
    ///
    /// Returns `None` when the detection has no candidates at all.
    pub fn plan(
        &self,
        sentence: &str,
        detection: &Detection,
        optimizer: &AdaptiveOptimizer,
    ) -> Option<CoordinationPlan> {
        let first = detection.candidates.first()?;
        let complexity = self.complexity(sentence, &detection.categories);

        if detection.candidates.len() == 1 {
            return Some(CoordinationPlan {
                strategy: Strategy::SingleEngine,
                primary: first.clone(),
                supporting: Vec::new(),
                categories: detection.categories.clone(),
                complexity,
            });
        }

        let escalate = complexity >= self.config.multi_complexity_threshold
            || detection.candidates.len() >= self.config.multi_candidate_floor;

        let plan = if escalate {
            self.multi_cooperative(sentence, detection, optimizer, complexity)
        } else {
            self.foundation_plus_specialist(sentence, detection, optimizer, complexity)
        };
        debug!(
            "Planned {} for complexity {:.2} with {} candidate(s)",
            plan.strategy,
            complexity,
            detection.candidates.len()
        );
        Some(plan)
    }

    /// Lowest-priority candidate leads; the rest join in adaptive order up
    /// to the fanout cap, with a guaranteed seat for the foundation analyzer
    fn multi_cooperative(
        &self,
        sentence: &str,
        detection: &Detection,
        optimizer: &AdaptiveOptimizer,
        complexity: f64,
    ) -> CoordinationPlan {
        // Detection candidates are already (priority, id) sorted.
        let primary = detection.candidates[0].clone();
        let others: Vec<Candidate> = detection
            .candidates
            .iter()
            .filter(|c| c.id != primary.id)
            .cloned()
            .collect();

        let cap = self.config.max_fanout.saturating_sub(1);
        let mut supporting: Vec<Candidate> =
            optimizer.reorder(&others, sentence).into_iter().take(cap).collect();

        if cap > 0 {
            if let Some(foundation) = detection
                .candidates
                .iter()
                .find(|c| c.id == self.config.foundation_id)
            {
                let seated = foundation.id == primary.id
                    || supporting.iter().any(|c| c.id == foundation.id);
                if !seated {
                    if supporting.len() == cap {
                        supporting.pop();
                    }
                    supporting.push(foundation.clone());
                }
            }
        }

        CoordinationPlan {
            strategy: Strategy::MultiCooperative,
            primary,
            supporting,
            categories: detection.categories.clone(),
            complexity,
        }
    }

    /// Foundation analyzer leads (when applicable) with the single
    /// best-scoring specialist alongside
    fn foundation_plus_specialist(
        &self,
        sentence: &str,
        detection: &Detection,
        optimizer: &AdaptiveOptimizer,
        complexity: f64,
    ) -> CoordinationPlan {
        let primary = detection
            .candidates
            .iter()
            .find(|c| c.id == self.config.foundation_id)
            .unwrap_or(&detection.candidates[0])
            .clone();
        let others: Vec<Candidate> = detection
            .candidates
            .iter()
            .filter(|c| c.id != primary.id)
            .cloned()
            .collect();
        let supporting: Vec<Candidate> = optimizer
            .reorder(&others, sentence)
            .into_iter()
            .take(1)
            .collect();

        CoordinationPlan {
            strategy: Strategy::FoundationPlusSpecialist,
            primary,
            supporting,
            categories: detection.categories.clone(),
            complexity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptimizerConfig;

    fn candidate(id: &str, priority: u32) -> Candidate {
        Candidate {
            id: id.to_string(),
            priority,
        }
    }

    fn detection(candidates: Vec<Candidate>, categories: &[TriggerCategory]) -> Detection {
        Detection {
            candidates,
            categories: categories.iter().copied().collect(),
        }
    }

    fn selector() -> StrategySelector {
        StrategySelector::new(StrategyConfig::default())
    }

    fn optimizer() -> AdaptiveOptimizer {
        AdaptiveOptimizer::new(OptimizerConfig::default())
    }

    #[test]
    fn test_single_candidate_runs_alone() {
        let detection = detection(vec![candidate("foundation", 100)], &[]);
        let plan = selector()
            .plan("The dog barked.", &detection, &optimizer())
            .unwrap();

        assert_eq!(plan.strategy, Strategy::SingleEngine);
        assert_eq!(plan.primary.id, "foundation");
        assert!(plan.supporting.is_empty());
    }

    #[test]
    fn test_empty_detection_yields_no_plan() {
        let detection = Detection::default();
        assert!(selector()
            .plan("The dog barked.", &detection, &optimizer())
            .is_none());
    }

    #[test]
    fn test_simple_pair_uses_foundation_plus_specialist() {
        let detection = detection(
            vec![candidate("passive", 10), candidate("foundation", 100)],
            &[TriggerCategory::Passive],
        );
        let plan = selector()
            .plan("The ball was thrown.", &detection, &optimizer())
            .unwrap();

        assert_eq!(plan.strategy, Strategy::FoundationPlusSpecialist);
        assert_eq!(plan.primary.id, "foundation");
        assert_eq!(plan.supporting.len(), 1);
        assert_eq!(plan.supporting[0].id, "passive");
    }

    #[test]
    fn test_category_count_escalates_to_multi() {
        let detection = detection(
            vec![
                candidate("passive", 10),
                candidate("relative", 20),
                candidate("foundation", 100),
            ],
            &[
                TriggerCategory::Passive,
                TriggerCategory::Relative,
                TriggerCategory::Modal,
            ],
        );
        // Three categories alone push complexity past the 3.0 threshold.
        let plan = selector()
            .plan("Short sentence here.", &detection, &optimizer())
            .unwrap();

        assert_eq!(plan.strategy, Strategy::MultiCooperative);
        assert_eq!(plan.primary.id, "passive");
    }

    #[test]
    fn test_candidate_floor_escalates_to_multi() {
        let detection = detection(
            vec![
                candidate("conditional", 15),
                candidate("modal", 30),
                candidate("passive", 10),
                candidate("foundation", 100),
            ],
            &[TriggerCategory::Modal],
        );
        let mut sorted = detection.candidates.clone();
        sorted.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        let detection = Detection {
            candidates: sorted,
            categories: detection.categories,
        };

        let plan = selector().plan("A few words.", &detection, &optimizer()).unwrap();
        assert_eq!(plan.strategy, Strategy::MultiCooperative);
        // Lowest priority leads.
        assert_eq!(plan.primary.id, "passive");
    }

    #[test]
    fn test_fanout_cap_keeps_foundation_seated() {
        let config = StrategyConfig {
            max_fanout: 3,
            ..StrategyConfig::default()
        };
        let selector = StrategySelector::new(config);
        let detection = detection(
            vec![
                candidate("passive", 10),
                candidate("conditional", 15),
                candidate("relative", 20),
                candidate("modal", 30),
                candidate("foundation", 100),
            ],
            &[
                TriggerCategory::Passive,
                TriggerCategory::Conditional,
                TriggerCategory::Relative,
                TriggerCategory::Modal,
            ],
        );

        let plan = selector
            .plan("Dense little sentence.", &detection, &optimizer())
            .unwrap();
        assert_eq!(plan.strategy, Strategy::MultiCooperative);
        assert_eq!(plan.participant_count(), 3);
        assert!(plan.participants().iter().any(|c| c.id == "foundation"));
    }

    #[test]
    fn test_long_sentence_length_term_is_capped() {
        let selector = selector();
        let long_sentence = "word ".repeat(100);
        let categories: BTreeSet<TriggerCategory> =
            [TriggerCategory::Conjunction].into_iter().collect();

        // 100 words / 12 per unit would be 8.3, but the term caps at 2.0.
        let complexity = selector.complexity(&long_sentence, &categories);
        assert!((complexity - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_pair_without_foundation_uses_lowest_priority() {
        let detection = detection(
            vec![candidate("passive", 10), candidate("relative", 20)],
            &[TriggerCategory::Passive],
        );
        let plan = selector()
            .plan("It was seen.", &detection, &optimizer())
            .unwrap();

        assert_eq!(plan.strategy, Strategy::FoundationPlusSpecialist);
        assert_eq!(plan.primary.id, "passive");
        assert_eq!(plan.supporting[0].id, "relative");
    }
}
