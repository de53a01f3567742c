//! Built-in reference analyzers
//!
//! These are deliberately small keyword heuristics, not real grammar: they
//! exist so the coordination engine is usable end-to-end without an external
//! syntactic parser, and so tests exercise the capability interface with
//! realistic participants. Each module exposes a `registration()` that wires
//! id, priority, precedence, and trigger patterns to a factory.
//!
//! None of them carries an accuracy contract. The coordinator treats every
//! analyzer as an opaque black box either way.

pub mod foundation;
pub mod modal;
pub mod passive;
pub mod relative;

use crate::error::Result;
use crate::registry::AnalyzerRegistry;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Be-forms treated as auxiliaries by the reference heuristics
pub(crate) const BE_FORMS: &[&str] = &["am", "is", "are", "was", "were", "be", "been", "being"];

/// Modal auxiliaries
pub(crate) const MODALS: &[&str] = &[
    "can", "could", "may", "might", "must", "shall", "should", "will", "would",
];

/// Irregular past participles the suffix test misses
static IRREGULAR_PARTICIPLES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "done", "made", "seen", "given", "taken", "known", "shown", "thrown", "written", "found",
        "held", "kept", "left", "lost", "built", "sent", "sold", "told", "bought", "caught",
        "taught", "brought", "read", "put", "sung", "worn",
    ]
    .into_iter()
    .collect()
});

/// Split a sentence into words with terminal punctuation removed
pub(crate) fn words(sentence: &str) -> Vec<&str> {
    sentence
        .split_whitespace()
        .map(|w| w.trim_end_matches(['.', ',', '!', '?', ';', ':']))
        .filter(|w| !w.is_empty())
        .collect()
}

/// Case-insensitive membership test against a keyword list
pub(crate) fn is_one_of(word: &str, list: &[&str]) -> bool {
    let lowered = word.to_lowercase();
    list.contains(&lowered.as_str())
}

pub(crate) fn is_participle(word: &str) -> bool {
    let lowered = word.to_lowercase();
    lowered.ends_with("ed") || lowered.ends_with("en") || IRREGULAR_PARTICIPLES.contains(lowered.as_str())
}

/// Register every built-in analyzer with the given registry
pub async fn register_builtin(registry: &AnalyzerRegistry) -> Result<()> {
    registry.register(foundation::registration()).await?;
    registry.register(passive::registration()).await?;
    registry.register(relative::registration()).await?;
    registry.register(modal::registration()).await?;
    Ok(())
}
