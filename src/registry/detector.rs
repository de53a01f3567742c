//! Trigger patterns and applicability detection
//!
//! Applicability is a fast, pattern-only membership test: each descriptor
//! carries keyword triggers compiled into one case-insensitive word-boundary
//! regex per pattern, and the detector checks those against the sentence
//! without ever instantiating or invoking an analyzer. The configured
//! foundation analyzer is always included in the candidate list, so any
//! non-empty sentence has at least one candidate as long as the foundation
//! analyzer is registered.

use crate::registry::AnalyzerRegistry;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Grammatical construction families used for trigger matching
///
/// The number of distinct categories matched by a sentence feeds the
/// strategy selector's complexity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerCategory {
    /// Coordinating/subordinating conjunction markers (and, but, because, ...)
    Conjunction,
    /// Relative clause markers (who, which, that, ...)
    Relative,
    /// Passive voice markers (was, were, been, by, ...)
    Passive,
    /// Modal auxiliaries (can, must, should, ...)
    Modal,
    /// Conditional markers (if, unless, provided, ...)
    Conditional,
    /// Inverted word order markers (never, rarely, seldom, ...)
    Inversion,
    /// Several finite verbs in one sentence
    MultiVerb,
}

impl TriggerCategory {
    pub fn name(&self) -> &'static str {
        match self {
            TriggerCategory::Conjunction => "conjunction",
            TriggerCategory::Relative => "relative",
            TriggerCategory::Passive => "passive",
            TriggerCategory::Modal => "modal",
            TriggerCategory::Conditional => "conditional",
            TriggerCategory::Inversion => "inversion",
            TriggerCategory::MultiVerb => "multi_verb",
        }
    }
}

impl fmt::Display for TriggerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One keyword set under a trigger category, compiled for fast matching
///
/// Keywords are matched case-insensitively at word boundaries; multi-word
/// keywords ("not only") are allowed. A pattern with no keywords matches
/// nothing.
#[derive(Debug)]
pub struct TriggerPattern {
    category: TriggerCategory,
    keywords: Vec<String>,
    regex: Option<Regex>,
}

impl TriggerPattern {
    pub fn new<I, S>(category: TriggerCategory, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.into().trim().to_ascii_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        let regex = if keywords.is_empty() {
            None
        } else {
            let alternation = keywords
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            Some(
                Regex::new(&format!(r"(?i)\b(?:{})\b", alternation))
                    .expect("Valid trigger keyword regex"),
            )
        };

        Self {
            category,
            keywords,
            regex,
        }
    }

    pub fn category(&self) -> TriggerCategory {
        self.category
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// True when any keyword occurs in the sentence
    pub fn matches(&self, sentence: &str) -> bool {
        self.regex
            .as_ref()
            .is_some_and(|regex| regex.is_match(sentence))
    }
}

/// An applicable analyzer, identified with its descriptor priority
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: String,
    /// Descriptor priority; lower numbers are tried/weighted first
    pub priority: u32,
}

/// Result of an applicability pass over the registry
#[derive(Debug, Clone, Default)]
pub struct Detection {
    /// Applicable analyzers ordered by (priority, id)
    pub candidates: Vec<Candidate>,
    /// Distinct trigger categories matched anywhere in the sentence
    pub categories: BTreeSet<TriggerCategory>,
}

impl Detection {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn candidate_ids(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.id.clone()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.candidates.iter().any(|c| c.id == id)
    }
}

/// Pattern-only applicability check over all registered analyzers
pub struct ApplicabilityDetector {
    foundation_id: String,
}

impl ApplicabilityDetector {
    pub fn new(foundation_id: impl Into<String>) -> Self {
        Self {
            foundation_id: foundation_id.into(),
        }
    }

    pub fn foundation_id(&self) -> &str {
        &self.foundation_id
    }

    /// Collect analyzers whose triggers match the sentence, plus the
    /// foundation analyzer when registered
    ///
    /// Candidates come back ordered by descriptor priority ascending,
    /// ties broken by id. The result is empty only when the foundation
    /// analyzer is unregistered and no trigger matched.
    pub async fn detect(&self, registry: &AnalyzerRegistry, sentence: &str) -> Detection {
        let mut candidates = Vec::new();
        let mut categories = BTreeSet::new();

        for descriptor in registry.all().await {
            let matched: Vec<TriggerCategory> = descriptor
                .triggers()
                .iter()
                .filter(|trigger| trigger.matches(sentence))
                .map(|trigger| trigger.category())
                .collect();

            let is_foundation = descriptor.id() == self.foundation_id;
            if matched.is_empty() && !is_foundation {
                continue;
            }

            categories.extend(matched);
            candidates.push(Candidate {
                id: descriptor.id().to_string(),
                priority: descriptor.priority(),
            });
        }

        candidates.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));

        Detection {
            candidates,
            categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Analyzer, AnalyzerRegistration, AnalyzerRegistry};
    use crate::types::Analysis;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NoopAnalyzer;

    #[async_trait]
    impl Analyzer for NoopAnalyzer {
        fn identifier(&self) -> &str {
            "noop"
        }

        fn priority(&self) -> u32 {
            50
        }

        async fn analyze(&self, _sentence: &str) -> crate::error::Result<Analysis> {
            Ok(Analysis::default())
        }
    }

    fn registration(id: &str, priority: u32) -> AnalyzerRegistration {
        AnalyzerRegistration::new(id, priority, || Ok(Arc::new(NoopAnalyzer)))
    }

    #[test]
    fn test_pattern_matches_word_boundaries() {
        let pattern = TriggerPattern::new(TriggerCategory::Relative, ["who", "which"]);
        assert!(pattern.matches("The man who called"));
        assert!(pattern.matches("WHICH way?"));
        // "whoever" must not match "who" mid-word
        assert!(!pattern.matches("whoever arrives first"));
    }

    #[test]
    fn test_pattern_multi_word_keyword() {
        let pattern = TriggerPattern::new(TriggerCategory::Inversion, ["not only"]);
        assert!(pattern.matches("Not only did she win"));
        assert!(!pattern.matches("not the only one"));
    }

    #[test]
    fn test_empty_pattern_matches_nothing() {
        let pattern = TriggerPattern::new(TriggerCategory::Modal, Vec::<String>::new());
        assert!(!pattern.matches("she can swim"));
    }

    #[test]
    fn test_detect_orders_by_priority_then_id() {
        let detection = tokio_test::block_on(async {
            let registry = AnalyzerRegistry::new(false);
            registry
                .register(registration("zeta", 10).with_trigger(TriggerPattern::new(
                    TriggerCategory::Modal,
                    ["can"],
                )))
                .await
                .unwrap();
            registry
                .register(registration("alpha", 10).with_trigger(TriggerPattern::new(
                    TriggerCategory::Modal,
                    ["can"],
                )))
                .await
                .unwrap();
            registry
                .register(registration("beta", 5).with_trigger(TriggerPattern::new(
                    TriggerCategory::Modal,
                    ["can"],
                )))
                .await
                .unwrap();

            let detector = ApplicabilityDetector::new("foundation");
            detector.detect(&registry, "she can swim").await
        });

        assert_eq!(detection.candidate_ids(), vec!["beta", "alpha", "zeta"]);
        assert_eq!(detection.categories.len(), 1);
    }

    #[test]
    fn test_foundation_included_without_trigger_match() {
        let detection = tokio_test::block_on(async {
            let registry = AnalyzerRegistry::new(false);
            registry
                .register(registration("foundation", 100))
                .await
                .unwrap();
            registry
                .register(registration("passive", 10).with_trigger(TriggerPattern::new(
                    TriggerCategory::Passive,
                    ["was", "were"],
                )))
                .await
                .unwrap();

            let detector = ApplicabilityDetector::new("foundation");
            detector.detect(&registry, "The dog barks.").await
        });

        assert_eq!(detection.candidate_ids(), vec!["foundation"]);
        assert!(detection.categories.is_empty());
    }

    #[test]
    fn test_detect_empty_without_foundation() {
        let detection = tokio_test::block_on(async {
            let registry = AnalyzerRegistry::new(false);
            registry
                .register(registration("passive", 10).with_trigger(TriggerPattern::new(
                    TriggerCategory::Passive,
                    ["was"],
                )))
                .await
                .unwrap();

            let detector = ApplicabilityDetector::new("foundation");
            detector.detect(&registry, "The dog barks.").await
        });

        assert!(detection.is_empty());
    }

    #[test]
    fn test_distinct_categories_counted_once() {
        let detection = tokio_test::block_on(async {
            let registry = AnalyzerRegistry::new(false);
            registry
                .register(
                    registration("relative", 10)
                        .with_trigger(TriggerPattern::new(TriggerCategory::Relative, ["who"]))
                        .with_trigger(TriggerPattern::new(TriggerCategory::Relative, ["that"])),
                )
                .await
                .unwrap();
            registry
                .register(registration("modal", 20).with_trigger(TriggerPattern::new(
                    TriggerCategory::Modal,
                    ["must"],
                )))
                .await
                .unwrap();

            let detector = ApplicabilityDetector::new("foundation");
            detector
                .detect(&registry, "The man who left must return.")
                .await
        });

        // Two relative patterns matched but the category counts once.
        assert_eq!(detection.categories.len(), 2);
        assert_eq!(detection.candidates.len(), 2);
    }
}
