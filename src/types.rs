//! Core data types for the Harmonia coordination engine
//!
//! This module defines the fundamental structures used throughout harmonia:
//! the closed slot vocabulary, slot assignments with clause-internal sub-slots,
//! analyzer outcomes, and the unified result handed back to callers. These
//! types form the contract between the coordination core and every pluggable
//! analyzer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Closed vocabulary of grammatical slots
///
/// The ten slots cover the classic sentence-pattern decomposition: subject,
/// auxiliary, verb, two objects, two complements, and three modifiers. The
/// enum is the vocabulary contract: slot names outside this set cannot be
/// represented and are rejected by [`Slot::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Slot {
    #[serde(rename = "S")]
    Subject,
    #[serde(rename = "Aux")]
    Auxiliary,
    #[serde(rename = "V")]
    Verb,
    #[serde(rename = "O1")]
    Object1,
    #[serde(rename = "O2")]
    Object2,
    #[serde(rename = "C1")]
    Complement1,
    #[serde(rename = "C2")]
    Complement2,
    #[serde(rename = "M1")]
    Modifier1,
    #[serde(rename = "M2")]
    Modifier2,
    #[serde(rename = "M3")]
    Modifier3,
}

impl Slot {
    /// Every slot, in canonical order
    pub const ALL: [Slot; 10] = [
        Slot::Subject,
        Slot::Auxiliary,
        Slot::Verb,
        Slot::Object1,
        Slot::Object2,
        Slot::Complement1,
        Slot::Complement2,
        Slot::Modifier1,
        Slot::Modifier2,
        Slot::Modifier3,
    ];

    /// Canonical short name ("S", "Aux", "V", ...)
    pub fn name(&self) -> &'static str {
        match self {
            Slot::Subject => "S",
            Slot::Auxiliary => "Aux",
            Slot::Verb => "V",
            Slot::Object1 => "O1",
            Slot::Object2 => "O2",
            Slot::Complement1 => "C1",
            Slot::Complement2 => "C2",
            Slot::Modifier1 => "M1",
            Slot::Modifier2 => "M2",
            Slot::Modifier3 => "M3",
        }
    }

    /// Parse a slot name, accepting short and long forms case-insensitively.
    ///
    /// Returns `None` for any name outside the closed vocabulary; callers use
    /// this as the rejection point for foreign slot names.
    pub fn parse(name: &str) -> Option<Slot> {
        match name.trim().to_ascii_lowercase().as_str() {
            "s" | "subject" => Some(Slot::Subject),
            "aux" | "auxiliary" => Some(Slot::Auxiliary),
            "v" | "verb" => Some(Slot::Verb),
            "o1" | "object1" => Some(Slot::Object1),
            "o2" | "object2" => Some(Slot::Object2),
            "c1" | "complement1" => Some(Slot::Complement1),
            "c2" | "complement2" => Some(Slot::Complement2),
            "m1" | "modifier1" => Some(Slot::Modifier1),
            "m2" | "modifier2" => Some(Slot::Modifier2),
            "m3" | "modifier3" => Some(Slot::Modifier3),
            _ => None,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Precedence class used during conflict resolution
///
/// Analyzers registered as `Protected` win slot conflicts they are already
/// holding, regardless of the specificity rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precedence {
    #[default]
    Standard,
    Protected,
}

/// Coordination strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Exactly one applicable analyzer runs alone
    SingleEngine,
    /// The foundation analyzer plus one specialist
    FoundationPlusSpecialist,
    /// Several analyzers run concurrently and their outputs are merged
    MultiCooperative,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::SingleEngine => write!(f, "single_engine"),
            Strategy::FoundationPlusSpecialist => write!(f, "foundation_plus_specialist"),
            Strategy::MultiCooperative => write!(f, "multi_cooperative"),
        }
    }
}

/// A slot assignment: top-level slot values plus optional clause-internal
/// sub-slot values
///
/// Sub-slots mirror the top-level vocabulary and describe the internal
/// structure of one clause; `sub_parent` marks which top-level slot that
/// clause belongs to. Values are always non-empty strings: assigning an
/// empty value clears the slot. BTreeMaps keep iteration order deterministic,
/// which the merger relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlotAssignment {
    slots: BTreeMap<Slot, String>,
    sub_slots: BTreeMap<Slot, String>,
    sub_parent: Option<Slot>,
}

impl SlotAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a top-level slot. Empty or whitespace-only values clear it.
    pub fn set(&mut self, slot: Slot, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            self.slots.remove(&slot);
        } else {
            self.slots.insert(slot, value);
        }
    }

    /// Assign a sub-slot. Empty or whitespace-only values clear it.
    pub fn set_sub(&mut self, slot: Slot, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            self.sub_slots.remove(&slot);
        } else {
            self.sub_slots.insert(slot, value);
        }
    }

    /// Assign a top-level slot by name; returns false for names outside the
    /// closed vocabulary.
    pub fn set_named(&mut self, name: &str, value: impl Into<String>) -> bool {
        match Slot::parse(name) {
            Some(slot) => {
                self.set(slot, value);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, slot: Slot) -> Option<&str> {
        self.slots.get(&slot).map(String::as_str)
    }

    pub fn get_sub(&self, slot: Slot) -> Option<&str> {
        self.sub_slots.get(&slot).map(String::as_str)
    }

    /// Which top-level slot the sub-slot clause belongs to, if any
    pub fn sub_parent(&self) -> Option<Slot> {
        self.sub_parent
    }

    pub fn set_sub_parent(&mut self, slot: Option<Slot>) {
        self.sub_parent = slot;
    }

    /// Iterate top-level slot values in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Slot, &str)> {
        self.slots.iter().map(|(slot, value)| (*slot, value.as_str()))
    }

    /// Iterate sub-slot values in canonical order
    pub fn iter_sub(&self) -> impl Iterator<Item = (Slot, &str)> {
        self.sub_slots
            .iter()
            .map(|(slot, value)| (*slot, value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty() && self.sub_slots.is_empty()
    }

    pub fn has_sub_slots(&self) -> bool {
        !self.sub_slots.is_empty()
    }

    /// Enforce upper-slot emptying: a slot whose clause detail lives in
    /// sub-slots must not keep its own top-level text.
    pub fn apply_upper_slot_emptying(&mut self) {
        if !self.sub_slots.is_empty() {
            if let Some(parent) = self.sub_parent {
                self.slots.remove(&parent);
            }
        }
    }

    /// True when the upper-slot-emptying invariant holds
    pub fn satisfies_upper_slot_emptying(&self) -> bool {
        if self.sub_slots.is_empty() {
            return true;
        }
        match self.sub_parent {
            Some(parent) => !self.slots.contains_key(&parent),
            None => true,
        }
    }
}

/// What an analyzer produces on success
///
/// Confidence is clamped to [0, 1] on construction; non-finite values are
/// treated as zero.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub slots: SlotAssignment,
    confidence: f64,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Analysis {
    pub fn new(slots: SlotAssignment, confidence: f64) -> Self {
        Self {
            slots,
            confidence: clamp_confidence(confidence),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// One analyzer invocation's outcome, as recorded by the execution engine
///
/// The descriptor's priority and precedence are stamped onto the outcome so
/// the merger can resolve ties and protected conflicts without touching the
/// registry. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzerOutcome {
    pub analyzer_id: String,
    pub success: bool,
    pub slots: SlotAssignment,
    confidence: f64,
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub elapsed: Duration,
    pub error: Option<String>,
    pub priority: u32,
    pub precedence: Precedence,
}

impl AnalyzerOutcome {
    /// Build a successful outcome from an analyzer's analysis
    pub fn succeeded(
        analyzer_id: impl Into<String>,
        analysis: Analysis,
        elapsed: Duration,
        priority: u32,
        precedence: Precedence,
    ) -> Self {
        Self {
            analyzer_id: analyzer_id.into(),
            success: true,
            confidence: analysis.confidence(),
            slots: analysis.slots,
            metadata: analysis.metadata,
            elapsed,
            error: None,
            priority,
            precedence,
        }
    }

    /// Build a failed outcome (load failure, execution error, panic, deadline)
    pub fn failed(
        analyzer_id: impl Into<String>,
        error: impl Into<String>,
        elapsed: Duration,
        priority: u32,
        precedence: Precedence,
    ) -> Self {
        Self {
            analyzer_id: analyzer_id.into(),
            success: false,
            slots: SlotAssignment::new(),
            confidence: 0.0,
            metadata: BTreeMap::new(),
            elapsed,
            error: Some(error.into()),
            priority,
            precedence,
        }
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// A single decomposition request. Created per call, not retained.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub sentence: String,
    /// When set, the unified result carries plan and outcome diagnostics
    pub debug: bool,
}

impl AnalysisRequest {
    pub fn new(sentence: impl Into<String>) -> Self {
        Self {
            sentence: sentence.into(),
            debug: false,
        }
    }

    pub fn with_debug(mut self) -> Self {
        self.debug = true;
        self
    }
}

/// Which rule decided a slot conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictRule {
    /// The incumbent value came from a protected analyzer
    ProtectedSource,
    /// The longer, more specific value won
    Specificity,
    /// Equal or shorter challenger; the incumbent stayed
    Incumbent,
}

/// Record of one resolved slot conflict
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotConflict {
    pub slot: Slot,
    /// True when the conflict happened in the sub-slot layer
    pub sub_slot: bool,
    pub kept: String,
    pub discarded: String,
    pub winner: String,
    pub loser: String,
    pub rule: ConflictRule,
}

/// The merged decomposition handed back to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedResult {
    pub success: bool,
    pub slots: SlotAssignment,
    /// Analyzer ids that contributed, in merge order (the seeding analyzer
    /// first, then confidence descending)
    pub contributors: Vec<String>,
    confidence: f64,
    pub strategy: Option<Strategy>,
    pub elapsed: Duration,
    pub conflicts: Vec<SlotConflict>,
    pub diagnostics: BTreeMap<String, serde_json::Value>,
    pub error: Option<String>,
}

impl UnifiedResult {
    /// Build a successful merged result. Confidence is clamped to [0, 1].
    pub fn merged(
        slots: SlotAssignment,
        contributors: Vec<String>,
        confidence: f64,
        conflicts: Vec<SlotConflict>,
    ) -> Self {
        Self {
            success: true,
            slots,
            contributors,
            confidence: clamp_confidence(confidence),
            strategy: None,
            elapsed: Duration::default(),
            conflicts,
            diagnostics: BTreeMap::new(),
            error: None,
        }
    }

    /// Build a failed result: confidence 0, empty slots, populated error
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            slots: SlotAssignment::new(),
            contributors: Vec::new(),
            confidence: 0.0,
            strategy: None,
            elapsed: Duration::default(),
            conflicts: Vec::new(),
            diagnostics: BTreeMap::new(),
            error: Some(error.into()),
        }
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

fn clamp_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
