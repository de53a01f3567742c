//! Error types for the Harmonia coordination engine
//!
//! This module provides structured error handling using thiserror. Per-analyzer
//! failures are contained inside the execution engine and converted into failed
//! outcomes; only request-level failures (empty input, no applicable analyzer,
//! all analyzers failed) surface to callers, and even those are folded into a
//! failed `UnifiedResult` by the coordinator's public entry point.

use thiserror::Error;

/// Main error type for Harmonia operations
#[derive(Error, Debug)]
pub enum HarmoniaError {
    /// Input sentence was empty or whitespace-only
    #[error("Empty input: sentence contains no analyzable text")]
    EmptyInput,

    /// No analyzer is applicable, not even the foundation analyzer
    #[error("No applicable analyzer: {0}")]
    NoApplicableAnalyzer(String),

    /// Analyzer factory failed; permanent for the process lifetime
    #[error("Analyzer '{id}' failed to load: {message}")]
    AnalyzerLoad { id: String, message: String },

    /// Analyzer raised an error during analysis; scoped to one outcome
    #[error("Analyzer '{id}' failed during analysis: {message}")]
    AnalyzerExecution { id: String, message: String },

    /// Every analyzer in the coordination plan produced a failed outcome
    #[error("All analyzers failed: {0}")]
    AllAnalyzersFailed(String),

    /// Registration rejected because the id is already taken
    #[error("Analyzer already registered: {0}")]
    DuplicateAnalyzer(String),

    /// Lookup of an analyzer id that was never registered
    #[error("Unknown analyzer: {0}")]
    UnknownAnalyzer(String),

    /// Background task failure (preloader spawn/join)
    #[error("Background task error: {0}")]
    Task(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for Harmonia operations
pub type Result<T> = std::result::Result<T, HarmoniaError>;
