//! Labeler Configuration Management
//!
//! Handles configuration from config files and environment variables with
//! defaults matching the reference labeling setup. The command-line layer
//! applies its own flags on top of the result.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main labeler configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LabelerConfig {
    /// Frame matching configuration
    pub matching: MatchingConfig,

    /// Probability model configuration
    pub model: ModelConfig,

    /// Bootstrap (self-training) configuration
    pub bootstrap: BootstrapConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl LabelerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        if let Ok(algorithm) = std::env::var("VNSRL_MATCHING_ALGORITHM") {
            self.matching.algorithm = algorithm.parse()?;
        }
        if let Ok(level) = std::env::var("VNSRL_MODEL") {
            self.model.level = Some(level.parse()?);
        }
        if let Ok(value) = std::env::var("VNSRL_PASSIVIZE") {
            self.matching.passivize = parse_flag("VNSRL_PASSIVIZE", &value)?;
        }
        if let Ok(value) = std::env::var("VNSRL_SEMANTIC_RESTRICTIONS") {
            self.matching.semantic_restrictions =
                parse_flag("VNSRL_SEMANTIC_RESTRICTIONS", &value)?;
        }
        if let Ok(value) = std::env::var("VNSRL_WORDNET_RESTRICTIONS") {
            self.matching.wordnet_restrictions =
                parse_flag("VNSRL_WORDNET_RESTRICTIONS", &value)?;
        }
        if let Ok(value) = std::env::var("VNSRL_BOOTSTRAP") {
            self.bootstrap.enabled = parse_flag("VNSRL_BOOTSTRAP", &value)?;
        }

        // Logging
        if let Ok(level) = std::env::var("VNSRL_LOG_LEVEL") {
            self.logging.level = level;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject parameter combinations the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bootstrap.validate()
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Frame matching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Alignment algorithm used against VerbNet frames
    pub algorithm: MatchingAlgorithm,

    /// Also match against passive variants of every frame
    pub passivize: bool,

    /// Also match against relative-clause variants of every frame
    pub relatives: bool,

    /// Prune tied matches with co-occurrence restriction statistics
    pub semantic_restrictions: bool,

    /// Prune tied matches with a semantic lexicon lookup
    pub wordnet_restrictions: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            algorithm: MatchingAlgorithm::default(),
            passivize: false,
            relatives: false,
            semantic_restrictions: false,
            wordnet_restrictions: false,
        }
    }
}

/// Supported alignment algorithms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchingAlgorithm {
    /// Greedy first-fit over argument slots
    Baseline,
    /// Lockstep walk that resynchronizes on the verb
    #[default]
    SyncPredicates,
    /// Lockstep walk that stops at the first mismatch
    StopOnFail,
}

impl MatchingAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::SyncPredicates => "sync_predicates",
            Self::StopOnFail => "stop_on_fail",
        }
    }
}

impl std::fmt::Display for MatchingAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MatchingAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baseline" => Ok(Self::Baseline),
            "sync_predicates" => Ok(Self::SyncPredicates),
            "stop_on_fail" => Ok(Self::StopOnFail),
            _ => Err(ConfigError::InvalidValue {
                key: "matching.algorithm".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Probability model configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Finest backoff level used to resolve ambiguous slots; `None` leaves
    /// ambiguity untouched outside of bootstrap mode
    pub level: Option<ProbabilityLevel>,
}

/// Granularity of the backoff probability model, coarsest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbabilityLevel {
    /// Fixed slot class to role mapping
    Default,
    /// Keyed by slot class
    SlotClass,
    /// Keyed by slot class and preposition
    Slot,
    /// Keyed by predicate, slot class and preposition
    PredicateSlot,
}

impl ProbabilityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::SlotClass => "slot_class",
            Self::Slot => "slot",
            Self::PredicateSlot => "predicate_slot",
        }
    }

    /// This level followed by every coarser one
    pub fn backoff_chain(&self) -> Vec<ProbabilityLevel> {
        [
            Self::PredicateSlot,
            Self::Slot,
            Self::SlotClass,
            Self::Default,
        ]
        .into_iter()
        .filter(|level| level <= self)
        .collect()
    }
}

impl std::fmt::Display for ProbabilityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProbabilityLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "slot_class" => Ok(Self::SlotClass),
            "slot" => Ok(Self::Slot),
            "predicate_slot" => Ok(Self::PredicateSlot),
            _ => Err(ConfigError::InvalidValue {
                key: "model.level".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Upper bound on the number of bootstrap passes a schedule may request
pub const MAX_BOOTSTRAP_ITERATIONS: usize = 1000;

/// Bootstrap (self-training) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Run the bootstrap loop instead of a single probability pass
    pub enabled: bool,

    /// Initial log-ratio confidence threshold
    pub start_ratio: f64,

    /// Amount subtracted from the threshold after each iteration
    pub step: f64,

    /// Threshold at or below which any model decision is accepted
    pub relaxed_ratio: f64,

    /// Minimum evidence per backoff level while the threshold is strict
    pub min_evidence: EvidenceThresholds,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            start_ratio: 8.0,
            step: 0.5,
            relaxed_ratio: 1.0,
            min_evidence: EvidenceThresholds::default(),
        }
    }
}

impl BootstrapConfig {
    /// Number of passes the loop makes before the threshold reaches zero
    ///
    /// Capped at [`MAX_BOOTSTRAP_ITERATIONS`]; `validate` rejects schedules
    /// that would need more.
    pub fn iterations(&self) -> usize {
        let passes = (self.start_ratio / self.step).ceil();
        if passes.is_nan() || passes <= 0.0 {
            return 0;
        }
        passes.min(MAX_BOOTSTRAP_ITERATIONS as f64) as usize
    }

    /// Threshold in effect during the given pass
    pub fn ratio_at(&self, iteration: usize) -> f64 {
        self.start_ratio - self.step * iteration as f64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step.is_nan() || self.step <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "bootstrap.step".to_string(),
                value: self.step.to_string(),
            });
        }
        if !self.start_ratio.is_finite() || self.start_ratio < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "bootstrap.start_ratio".to_string(),
                value: self.start_ratio.to_string(),
            });
        }
        if (self.start_ratio / self.step).ceil() > MAX_BOOTSTRAP_ITERATIONS as f64 {
            return Err(ConfigError::InvalidValue {
                key: "bootstrap.step".to_string(),
                value: format!(
                    "{} (more than {MAX_BOOTSTRAP_ITERATIONS} passes from {})",
                    self.step, self.start_ratio
                ),
            });
        }
        if self.relaxed_ratio.is_nan() {
            return Err(ConfigError::InvalidValue {
                key: "bootstrap.relaxed_ratio".to_string(),
                value: self.relaxed_ratio.to_string(),
            });
        }
        Ok(())
    }
}

/// Minimum number of observations of the winning role, per backoff level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceThresholds {
    pub predicate_slot: u32,
    pub slot: u32,
    pub slot_class: u32,
}

impl Default for EvidenceThresholds {
    fn default() -> Self {
        Self {
            predicate_slot: 3,
            slot: 5,
            slot_class: 10,
        }
    }
}

impl EvidenceThresholds {
    /// Thresholds used once the ratio has decayed to the relaxed value
    pub fn relaxed() -> Self {
        Self {
            predicate_slot: 1,
            slot: 1,
            slot_class: 1,
        }
    }

    pub fn for_level(&self, level: ProbabilityLevel) -> u32 {
        match level {
            ProbabilityLevel::PredicateSlot => self.predicate_slot,
            ProbabilityLevel::Slot => self.slot,
            ProbabilityLevel::SlotClass => self.slot_class,
            ProbabilityLevel::Default => 0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
