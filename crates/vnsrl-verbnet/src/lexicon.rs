//! Semantic lexicon lookup
//!
//! Restriction filtering can ask an external resource (WordNet hypernym
//! closure, a hand-written gazetteer) whether a headword belongs to a
//! semantic class. The labeler only sees the [`SemanticLexicon`] trait.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use vnsrl_core::{Result, VnsrlError};

use crate::restriction::SemanticClass;

/// Trait for headword to semantic class lookups
pub trait SemanticLexicon: Send + Sync {
    /// Whether `headword` is known to belong to `class`
    fn has_class(&self, headword: &str, class: SemanticClass) -> bool;
}

/// In-memory lexicon mapping lowercase words to their semantic classes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordClassLexicon {
    words: HashMap<String, BTreeSet<SemanticClass>>,
}

impl WordClassLexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from JSON: `{"knife": ["solid", "pointy"], ...}`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let lexicon: Self = serde_json::from_str(json)
            .map_err(|e| VnsrlError::Catalogue(format!("invalid lexicon: {e}")))?;
        Ok(lexicon.normalized())
    }

    fn normalized(self) -> Self {
        let mut words: HashMap<String, BTreeSet<SemanticClass>> = HashMap::new();
        for (word, classes) in self.words {
            words.entry(word.to_lowercase()).or_default().extend(classes);
        }
        Self { words }
    }

    pub fn insert(
        &mut self,
        word: impl Into<String>,
        classes: impl IntoIterator<Item = SemanticClass>,
    ) {
        self.words
            .entry(word.into().to_lowercase())
            .or_default()
            .extend(classes);
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl SemanticLexicon for WordClassLexicon {
    fn has_class(&self, headword: &str, class: SemanticClass) -> bool {
        self.words
            .get(&headword.to_lowercase())
            .is_some_and(|classes| classes.contains(&class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let lexicon =
            WordClassLexicon::from_json_str(r#"{"Knife": ["solid", "pointy"], "dog": ["animal"]}"#)
                .unwrap();

        assert_eq!(lexicon.len(), 2);
        assert!(lexicon.has_class("knife", SemanticClass::Pointy));
        assert!(lexicon.has_class("DOG", SemanticClass::Animal));
        assert!(!lexicon.has_class("dog", SemanticClass::Human));
        assert!(!lexicon.has_class("cat", SemanticClass::Animal));
    }

    #[test]
    fn test_from_json_unknown_class() {
        assert!(WordClassLexicon::from_json_str(r#"{"knife": ["shiny"]}"#).is_err());
    }
}
