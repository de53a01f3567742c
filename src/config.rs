//! Harmonia Configuration
//!
//! Defines tunable settings for the coordination engine: strategy selection
//! thresholds, execution deadlines, merge behavior, cache sizing, optimizer
//! weights, and the predictive preloader schedule. All values have defaults
//! matching the engine's documented behavior; a TOML file can override any
//! section.

use crate::error::{HarmoniaError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration for the coordination engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarmoniaConfig {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub strategy: StrategyConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub merge: MergeConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub optimizer: OptimizerConfig,

    #[serde(default)]
    pub preloader: PreloaderConfig,
}

/// Analyzer registration policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// When true, registering an already-taken id is an error instead of an
    /// overwrite-with-warning
    pub strict_duplicates: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            strict_duplicates: false,
        }
    }
}

/// Strategy selection thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Id of the broad-coverage analyzer paired with specialists
    pub foundation_id: String,

    /// Complexity at or above which multi-cooperative coordination is chosen
    pub multi_complexity_threshold: f64,

    /// Minimum applicable analyzers for multi-cooperative coordination
    pub multi_candidate_floor: usize,

    /// Maximum analyzers run concurrently for one sentence
    pub max_fanout: usize,

    /// Words per unit of length-derived complexity
    pub length_divisor: usize,

    /// Upper bound on the length term of the complexity score
    pub length_term_cap: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            foundation_id: "foundation".to_string(),
            multi_complexity_threshold: 3.0,
            multi_candidate_floor: 4,
            max_fanout: 4,
            length_divisor: 12,
            length_term_cap: 2.0,
        }
    }
}

/// Per-analyzer execution limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Deadline for a single analyzer invocation (in milliseconds, 0 disables)
    pub deadline_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self { deadline_ms: 2000 }
    }
}

impl ExecutionConfig {
    /// Deadline as a Duration, or None when disabled
    pub fn deadline(&self) -> Option<Duration> {
        if self.deadline_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.deadline_ms))
        }
    }
}

/// Result merging behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// When false, the first analyzer to fill a slot keeps it unconditionally
    pub allow_overwrite: bool,

    /// Confidence bonus per cooperating analyzer beyond the first
    pub bonus_step: f64,

    /// Upper bound on the cooperation bonus
    pub bonus_cap: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            allow_overwrite: true,
            bonus_step: 0.1,
            bonus_cap: 0.3,
        }
    }
}

/// Result cache sizing and admission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live for cached results (in seconds)
    pub ttl_secs: u64,

    /// Maximum number of cached results
    pub capacity: usize,

    /// Fraction of entries evicted when the cache is full
    pub evict_fraction: f64,

    /// Results below this confidence are not cached
    pub min_confidence: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            capacity: 500,
            evict_fraction: 0.2,
            min_confidence: 0.4,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Adaptive optimizer smoothing and scoring weights
///
/// The four weights combine success rate, latency, usage frequency, and
/// pattern similarity into one composite score. They should sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// EMA smoothing factor applied to success rate, latency, and frequency
    pub smoothing: f64,

    pub weight_success: f64,
    pub weight_latency: f64,
    pub weight_frequency: f64,
    pub weight_pattern: f64,

    /// Maximum sentence signatures retained per analyzer profile
    pub pattern_cache_cap: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.1,
            weight_success: 0.4,
            weight_latency: 0.3,
            weight_frequency: 0.2,
            weight_pattern: 0.1,
            pattern_cache_cap: 50,
        }
    }
}

/// Predictive preloader schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreloaderConfig {
    /// Enable/disable the background preload task
    pub enabled: bool,

    /// Interval between preload passes (in seconds)
    pub interval_secs: u64,

    /// Hour-of-day usage share above which an analyzer is preloaded
    pub share_threshold: f64,
}

impl Default for PreloaderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            share_threshold: 0.7,
        }
    }
}

impl PreloaderConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl HarmoniaConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: HarmoniaConfig = toml::from_str(toml_str).map_err(|e| {
            HarmoniaError::Config(config::ConfigError::Message(format!(
                "Failed to parse config: {}",
                e
            )))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).map_err(|e| {
            HarmoniaError::Config(config::ConfigError::Message(e.to_string()))
        })?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.strategy.foundation_id.trim().is_empty() {
            return Err(validation_error("strategy: foundation_id must not be empty"));
        }
        if self.strategy.max_fanout == 0 {
            return Err(validation_error("strategy: max_fanout must be at least 1"));
        }
        if self.strategy.length_divisor == 0 {
            return Err(validation_error(
                "strategy: length_divisor must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.merge.bonus_step)
            || !(0.0..=1.0).contains(&self.merge.bonus_cap)
        {
            return Err(validation_error(
                "merge: bonus_step and bonus_cap must be between 0 and 1",
            ));
        }
        if self.cache.capacity == 0 {
            return Err(validation_error("cache: capacity must be at least 1"));
        }
        if !(self.cache.evict_fraction > 0.0 && self.cache.evict_fraction <= 1.0) {
            return Err(validation_error(
                "cache: evict_fraction must be in (0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.cache.min_confidence) {
            return Err(validation_error(
                "cache: min_confidence must be between 0 and 1",
            ));
        }
        if !(self.optimizer.smoothing > 0.0 && self.optimizer.smoothing <= 1.0) {
            return Err(validation_error(
                "optimizer: smoothing must be in (0, 1]",
            ));
        }
        let weight_sum = self.optimizer.weight_success
            + self.optimizer.weight_latency
            + self.optimizer.weight_frequency
            + self.optimizer.weight_pattern;
        if (weight_sum - 1.0).abs() > 0.01 {
            return Err(validation_error("optimizer: weights must sum to 1.0"));
        }
        if self.optimizer.pattern_cache_cap == 0 {
            return Err(validation_error(
                "optimizer: pattern_cache_cap must be at least 1",
            ));
        }
        if !(self.preloader.share_threshold > 0.0 && self.preloader.share_threshold <= 1.0) {
            return Err(validation_error(
                "preloader: share_threshold must be in (0, 1]",
            ));
        }
        Ok(())
    }
}

fn validation_error(message: &str) -> HarmoniaError {
    HarmoniaError::Config(config::ConfigError::Message(message.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = HarmoniaConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        let config = HarmoniaConfig::default();
        assert_eq!(config.strategy.foundation_id, "foundation");
        assert_eq!(config.execution.deadline(), Some(Duration::from_secs(2)));
        assert_eq!(config.cache.ttl(), Duration::from_secs(300));
        assert_eq!(config.preloader.interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_deadline_disables_limit() {
        let config = ExecutionConfig { deadline_ms: 0 };
        assert_eq!(config.deadline(), None);
    }

    #[test]
    fn test_validate_rejects_zero_fanout() {
        let mut config = HarmoniaConfig::default();
        config.strategy.max_fanout = 0;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("max_fanout must be at least 1"));
    }

    #[test]
    fn test_validate_rejects_bad_evict_fraction() {
        let mut config = HarmoniaConfig::default();
        config.cache.evict_fraction = 1.5;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("evict_fraction must be in (0, 1]"));
    }

    #[test]
    fn test_validate_rejects_unbalanced_weights() {
        let mut config = HarmoniaConfig::default();
        config.optimizer.weight_success = 0.9;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("weights must sum to 1.0"));
    }

    #[test]
    fn test_from_toml_partial_override() {
        let toml_str = r#"
            [cache]
            ttl_secs = 60
            capacity = 100
            evict_fraction = 0.5
            min_confidence = 0.2

            [preloader]
            enabled = false
            interval_secs = 10
            share_threshold = 0.9
        "#;

        let config = HarmoniaConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.cache.capacity, 100);
        assert!(!config.preloader.enabled);
        // Untouched sections keep their defaults.
        assert_eq!(config.strategy.max_fanout, 4);
        assert_eq!(config.execution.deadline_ms, 2000);
    }

    #[test]
    fn test_from_toml_rejects_invalid() {
        let toml_str = r#"
            [cache]
            ttl_secs = 300
            capacity = 0
            evict_fraction = 0.2
            min_confidence = 0.4
        "#;

        assert!(HarmoniaConfig::from_toml(toml_str).is_err());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = HarmoniaConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: HarmoniaConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.strategy.max_fanout, deserialized.strategy.max_fanout);
        assert_eq!(config.cache.capacity, deserialized.cache.capacity);
        assert_eq!(
            config.optimizer.pattern_cache_cap,
            deserialized.optimizer.pattern_cache_cap
        );
    }

    #[test]
    fn test_to_file_and_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harmonia.toml");

        let mut config = HarmoniaConfig::default();
        config.cache.capacity = 42;
        config.to_file(&path).unwrap();

        let loaded = HarmoniaConfig::from_file(&path).unwrap();
        assert_eq!(loaded.cache.capacity, 42);
    }
}
