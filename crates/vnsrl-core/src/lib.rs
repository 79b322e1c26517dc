//! VNSRL Core - Domain vocabulary, traits, and shared types
//!
//! This crate defines the abstractions shared by every layer of the
//! VerbNet semantic role labeler:
//! - Common error types
//! - Syntactic slot classes and role sets
//! - The corpus input model (frame instances and their arguments)
//! - The diagnostics collector for skipped occurrences
//! - Configuration management

pub mod config;
pub mod diagnostics;

pub use config::{
    BootstrapConfig, ConfigError, EvidenceThresholds, LabelerConfig, LoggingConfig,
    MatchingAlgorithm, MatchingConfig, ModelConfig, ProbabilityLevel, MAX_BOOTSTRAP_ITERATIONS,
};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, RoleMappingIssue};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for labeling operations
#[derive(Error, Debug)]
pub enum VnsrlError {
    #[error("Unknown semantic class: {0}")]
    UnknownSemanticClass(String),

    #[error("Invalid restriction expression: {0}")]
    InvalidRestriction(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Predicate not in VerbNet catalogue: {0}")]
    UnknownPredicate(String),

    #[error("Restriction index {index} out of range for frame {vnclass} ({available} restrictions)")]
    RestrictionIndex {
        vnclass: String,
        index: usize,
        available: usize,
    },

    #[error("Restriction filtering invoked on an occurrence with no current matches")]
    NoMatches,

    #[error("Catalogue error: {0}")]
    Catalogue(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, VnsrlError>;

// ============================================================================
// Roles and Slots
// ============================================================================

/// A semantic role label such as "Agent" or "Theme"
pub type Role = String;

/// The set of roles still possible for one argument slot
///
/// A single element means the slot is resolved, an empty set means no role
/// could be found, and several elements mean the slot is ambiguous.
pub type RoleSet = BTreeSet<Role>;

/// Preposition key used for slots that are not prepositional objects
pub const NO_PREP: &str = "NO_PREP";

/// Grammatical class of an argument slot, derived from its position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotClass {
    Subject,
    Object,
    IndirectObject,
    PrepObject,
}

impl SlotClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subject => "SBJ",
            Self::Object => "OBJ",
            Self::IndirectObject => "OBJI",
            Self::PrepObject => "PPOBJ",
        }
    }

    /// Canonical role used by the data-free default model
    pub fn default_role(&self) -> &'static str {
        match self {
            Self::Subject => "Agent",
            Self::Object => "Theme",
            Self::IndirectObject => "Recipient",
            Self::PrepObject => "Location",
        }
    }
}

impl std::fmt::Display for SlotClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Corpus Input Model
// ============================================================================

/// A text span in character offsets, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// The target predicate of a frame instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Predicate {
    pub span: Span,
    pub lemma: String,
}

/// One syntactic argument of the predicate, as produced by a corpus reader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Argument {
    /// Surface text of the argument
    pub text: String,

    /// Position in the sentence
    pub span: Span,

    /// Phrase type tag (FrameNet style: NP, PP, PPing, Sfin, VPto, ...)
    pub phrase_type: String,

    /// False for null-instantiated arguments, which have no surface slot
    #[serde(default = "default_true")]
    pub instantiated: bool,

    /// Syntactic head of the argument, extracted upstream
    #[serde(default)]
    pub headword: Option<String>,

    /// Known role, for evaluation against gold annotations
    #[serde(default)]
    pub role: Option<Role>,
}

fn default_true() -> bool {
    true
}

impl Argument {
    /// Create an instantiated argument
    pub fn new(text: impl Into<String>, span: Span, phrase_type: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            span,
            phrase_type: phrase_type.into(),
            instantiated: true,
            headword: None,
            role: None,
        }
    }

    /// Set headword
    pub fn with_headword(mut self, headword: impl Into<String>) -> Self {
        self.headword = Some(headword.into());
        self
    }

    /// Set known role
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// First word of the argument text, lowercased
    pub fn first_word(&self) -> Option<String> {
        self.text.split_whitespace().next().map(|w| w.to_lowercase())
    }
}

/// A predicate with its arguments in one parsed sentence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameInstance {
    /// Identifier for diagnostics (sentence id, file:line, ...)
    #[serde(default)]
    pub id: Option<String>,

    pub sentence: String,

    pub predicate: Predicate,

    pub arguments: Vec<Argument>,
}

impl FrameInstance {
    /// Create a frame instance
    pub fn new(
        sentence: impl Into<String>,
        lemma: impl Into<String>,
        predicate_span: Span,
        arguments: Vec<Argument>,
    ) -> Self {
        Self {
            id: None,
            sentence: sentence.into(),
            predicate: Predicate {
                span: predicate_span,
                lemma: lemma.into(),
            },
            arguments,
        }
    }

    /// Set identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Label used when reporting this instance
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("{} ({})", self.predicate.lemma, self.sentence),
        }
    }
}

// ============================================================================
// Output
// ============================================================================

/// Final role assignment for one frame occurrence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledFrame {
    pub id: Option<String>,
    pub predicate: String,
    pub sentence: String,

    /// One role set per argument slot, in sentence order
    pub roles: Vec<RoleSet>,

    /// Gold roles carried through from the input, if known
    pub gold_roles: Vec<Option<Role>>,

    /// Best alignment score, if any frame was matched
    pub best_score: Option<u32>,
}

impl LabeledFrame {
    /// Slots whose role set was collapsed to a single role
    pub fn resolved_count(&self) -> usize {
        self.roles.iter().filter(|r| r.len() == 1).count()
    }

    /// Slots that still hold several roles
    pub fn ambiguous_count(&self) -> usize {
        self.roles.iter().filter(|r| r.len() > 1).count()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_class_default_roles() {
        assert_eq!(SlotClass::Subject.default_role(), "Agent");
        assert_eq!(SlotClass::Object.default_role(), "Theme");
        assert_eq!(SlotClass::IndirectObject.default_role(), "Recipient");
        assert_eq!(SlotClass::PrepObject.default_role(), "Location");
    }

    #[test]
    fn test_slot_class_display() {
        assert_eq!(SlotClass::PrepObject.to_string(), "PPOBJ");
        assert!(SlotClass::Subject < SlotClass::Object);
    }

    #[test]
    fn test_argument_builder() {
        let arg = Argument::new("with a knife", Span::new(14, 26), "PP")
            .with_headword("knife")
            .with_role("Instrument");

        assert!(arg.instantiated);
        assert_eq!(arg.first_word().as_deref(), Some("with"));
        assert_eq!(arg.headword.as_deref(), Some("knife"));
    }

    #[test]
    fn test_frame_instance_deserialize_defaults() {
        let json = r#"{
            "sentence": "John cut the bread",
            "predicate": {"span": {"start": 5, "end": 8}, "lemma": "cut"},
            "arguments": [
                {"text": "John", "span": {"start": 0, "end": 4}, "phrase_type": "NP"}
            ]
        }"#;

        let instance: FrameInstance = serde_json::from_str(json).unwrap();
        assert!(instance.id.is_none());
        assert!(instance.arguments[0].instantiated);
        assert!(instance.arguments[0].role.is_none());
        assert_eq!(instance.label(), "cut (John cut the bread)");
    }

    #[test]
    fn test_labeled_frame_counts() {
        let labeled = LabeledFrame {
            id: None,
            predicate: "cut".to_string(),
            sentence: String::new(),
            roles: vec![
                ["Agent".to_string()].into_iter().collect(),
                ["Theme".to_string(), "Patient".to_string()].into_iter().collect(),
                RoleSet::new(),
            ],
            gold_roles: vec![None, None, None],
            best_score: Some(150),
        };

        assert_eq!(labeled.resolved_count(), 1);
        assert_eq!(labeled.ambiguous_count(), 1);
    }
}
