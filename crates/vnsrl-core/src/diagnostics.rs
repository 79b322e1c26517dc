//! Diagnostics collector
//!
//! Occurrences that cannot be labeled are skipped rather than aborting the
//! run. Each skip is recorded here so the statistics reporter can surface
//! per-category counts at the end of a run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::VnsrlError;

/// Outcome of mapping a corpus role onto VerbNet roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleMappingIssue {
    /// No VerbNet role corresponds under the given classes
    NoMapping,
    /// Several VerbNet roles correspond
    Ambiguous,
}

/// Category of a recorded condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    MissingPredicate,
    InvalidFrame,
    RestrictionIndex,
    EmptyMatchFiltering,
    NoFrameMatched,
    RoleMappingNone,
    RoleMappingAmbiguous,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::MissingPredicate => "missing_predicate",
            Self::InvalidFrame => "invalid_frame",
            Self::RestrictionIndex => "restriction_index",
            Self::EmptyMatchFiltering => "empty_match_filtering",
            Self::NoFrameMatched => "no_frame_matched",
            Self::RoleMappingNone => "role_mapping_none",
            Self::RoleMappingAmbiguous => "role_mapping_ambiguous",
        };
        write!(f, "{name}")
    }
}

/// A single recorded condition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,

    /// Occurrence the condition was raised for
    pub occurrence: String,

    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        occurrence: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            occurrence: occurrence.into(),
            message: message.into(),
        }
    }

    /// Classify a labeling error raised for an occurrence
    ///
    /// Returns `None` for errors that are not per-occurrence data problems;
    /// those must be propagated instead of skipped.
    pub fn from_error(occurrence: impl Into<String>, error: &VnsrlError) -> Option<Self> {
        let kind = match error {
            VnsrlError::UnknownPredicate(_) => DiagnosticKind::MissingPredicate,
            VnsrlError::InvalidFrame(_) => DiagnosticKind::InvalidFrame,
            VnsrlError::RestrictionIndex { .. } => DiagnosticKind::RestrictionIndex,
            VnsrlError::NoMatches => DiagnosticKind::EmptyMatchFiltering,
            _ => return None,
        };
        Some(Self::new(kind, occurrence, error.to_string()))
    }

    /// Record a role-mapping problem reported by an external role matcher
    pub fn role_mapping(
        occurrence: impl Into<String>,
        issue: RoleMappingIssue,
        role: &str,
    ) -> Self {
        match issue {
            RoleMappingIssue::NoMapping => Self::new(
                DiagnosticKind::RoleMappingNone,
                occurrence,
                format!("no VerbNet role for {role}"),
            ),
            RoleMappingIssue::Ambiguous => Self::new(
                DiagnosticKind::RoleMappingAmbiguous,
                occurrence,
                format!("several VerbNet roles for {role}"),
            ),
        }
    }
}

/// Collector owned by the top-level run context
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of entries of one category
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    /// Entry count per category, in a stable order
    pub fn counts(&self) -> BTreeMap<DiagnosticKind, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Append another collector's entries (e.g. from a worker)
    pub fn merge(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    /// One-line summary of the counts
    pub fn summary(&self) -> String {
        if self.entries.is_empty() {
            return "no diagnostics".to_string();
        }
        self.counts()
            .iter()
            .map(|(kind, count)| format!("{kind}={count}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_error_classification() {
        let d = Diagnostic::from_error("s1", &VnsrlError::UnknownPredicate("zorp".into())).unwrap();
        assert_eq!(d.kind, DiagnosticKind::MissingPredicate);
        assert!(d.message.contains("zorp"));

        let d = Diagnostic::from_error("s2", &VnsrlError::NoMatches).unwrap();
        assert_eq!(d.kind, DiagnosticKind::EmptyMatchFiltering);

        let fatal = VnsrlError::UnknownSemanticClass("shiny".into());
        assert!(Diagnostic::from_error("s3", &fatal).is_none());
    }

    #[test]
    fn test_counts_and_summary() {
        let mut diagnostics = Diagnostics::new();
        assert_eq!(diagnostics.summary(), "no diagnostics");

        diagnostics.record(Diagnostic::new(DiagnosticKind::MissingPredicate, "a", ""));
        diagnostics.record(Diagnostic::new(DiagnosticKind::MissingPredicate, "b", ""));
        diagnostics.record(Diagnostic::role_mapping(
            "c",
            RoleMappingIssue::Ambiguous,
            "Cook",
        ));

        assert_eq!(diagnostics.len(), 3);
        assert_eq!(diagnostics.count(DiagnosticKind::MissingPredicate), 2);
        assert_eq!(diagnostics.count(DiagnosticKind::RoleMappingAmbiguous), 1);
        assert_eq!(diagnostics.count(DiagnosticKind::RoleMappingNone), 0);
        assert_eq!(
            diagnostics.summary(),
            "missing_predicate=2 role_mapping_ambiguous=1"
        );
    }

    #[test]
    fn test_merge() {
        let mut a = Diagnostics::new();
        a.record(Diagnostic::new(DiagnosticKind::InvalidFrame, "x", ""));
        let mut b = Diagnostics::new();
        b.record(Diagnostic::new(DiagnosticKind::NoFrameMatched, "y", ""));

        a.merge(b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.entries()[1].occurrence, "y");
    }
}
