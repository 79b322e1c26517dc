//! VerbNet catalogue
//!
//! Maps a predicate lemma to the official frames of every VerbNet class it
//! belongs to. The catalogue is loaded from JSON:
//!
//! ```json
//! {
//!   "cut": [
//!     {
//!       "vnclass": "cut-21.1",
//!       "syntax": "NP.Agent V NP.Patient with NP.Instrument",
//!       "restrictions": {"Agent": "int_control", "Instrument": "solid & concrete"}
//!     }
//!   ]
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use vnsrl_core::{Result, VnsrlError};

use crate::frame::{Frame, OfficialFrame};
use crate::restriction::Restriction;

#[derive(Debug, Deserialize)]
struct FrameEntry {
    vnclass: String,
    syntax: String,
    #[serde(default)]
    restrictions: BTreeMap<String, String>,
}

impl FrameEntry {
    fn into_official(self) -> Result<OfficialFrame> {
        let frame: Frame = self.syntax.parse()?;
        let restrictions = self
            .restrictions
            .iter()
            .map(|(role, expr)| Ok((role.clone(), expr.parse::<Restriction>()?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(OfficialFrame::with_role_map(self.vnclass, frame, &restrictions))
    }
}

/// Official frames indexed by predicate lemma
#[derive(Debug, Clone, Default)]
pub struct VerbnetCatalogue {
    frames: HashMap<String, Vec<OfficialFrame>>,
}

impl VerbnetCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON catalogue
    pub fn from_json_str(json: &str) -> Result<Self> {
        // Sorted keys keep the frame order stable when lemmas differ only in case.
        let raw: BTreeMap<String, Vec<FrameEntry>> = serde_json::from_str(json)
            .map_err(|e| VnsrlError::Catalogue(format!("invalid catalogue: {e}")))?;

        let mut catalogue = Self::new();
        for (lemma, entries) in raw {
            catalogue.frames.entry(lemma.to_lowercase()).or_default();
            for entry in entries {
                let vnclass = entry.vnclass.clone();
                let frame = entry.into_official().map_err(|e| {
                    VnsrlError::Catalogue(format!("{lemma} in {vnclass}: {e}"))
                })?;
                catalogue.insert(&lemma, frame);
            }
        }

        tracing::debug!(
            lemmas = catalogue.len(),
            frames = catalogue.frame_count(),
            "Loaded VerbNet catalogue"
        );
        Ok(catalogue)
    }

    /// Read and parse a JSON catalogue file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| VnsrlError::Catalogue(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn insert(&mut self, lemma: &str, frame: OfficialFrame) {
        self.frames
            .entry(lemma.to_lowercase())
            .or_default()
            .push(frame);
    }

    /// Number of lemmas
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.values().map(Vec::len).sum()
    }

    pub fn contains(&self, lemma: &str) -> bool {
        self.frames.contains_key(&lemma.to_lowercase())
    }

    /// Sorted lemmas
    pub fn lemmas(&self) -> Vec<&str> {
        let mut lemmas: Vec<&str> = self.frames.keys().map(String::as_str).collect();
        lemmas.sort_unstable();
        lemmas
    }

    /// Official frames listed for a lemma, possibly none
    pub fn frames_for(&self, lemma: &str) -> Result<&[OfficialFrame]> {
        self.frames
            .get(&lemma.to_lowercase())
            .map(Vec::as_slice)
            .ok_or_else(|| VnsrlError::UnknownPredicate(lemma.to_string()))
    }

    /// Frames to match an occurrence of `lemma` against
    ///
    /// With `passivize`, each frame's passive variants follow it; with
    /// `relatives`, so do its relative-clause variants.
    pub fn candidate_frames(
        &self,
        lemma: &str,
        passivize: bool,
        relatives: bool,
    ) -> Result<Vec<OfficialFrame>> {
        let mut candidates = Vec::new();
        for frame in self.frames_for(lemma)? {
            candidates.push(frame.clone());
            if passivize {
                candidates.extend(frame.passivize());
            }
            if relatives {
                candidates.extend(frame.relatives());
            }
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOGUE: &str = r#"{
        "cut": [
            {
                "vnclass": "cut-21.1",
                "syntax": "NP.Agent V NP.Patient",
                "restrictions": {"Agent": "int_control"}
            },
            {
                "vnclass": "cut-21.1",
                "syntax": "NP.Agent V NP.Patient with NP.Instrument",
                "restrictions": {"Agent": "int_control", "Instrument": "solid & concrete"}
            }
        ],
        "Sleep": [
            {"vnclass": "snooze-40.4", "syntax": "NP.Agent V"}
        ]
    }"#;

    #[test]
    fn test_load_catalogue() {
        let catalogue = VerbnetCatalogue::from_json_str(CATALOGUE).unwrap();
        assert_eq!(catalogue.len(), 2);
        assert_eq!(catalogue.frame_count(), 3);
        assert_eq!(catalogue.lemmas(), vec!["cut", "sleep"]);

        let frames = catalogue.frames_for("cut").unwrap();
        assert_eq!(frames[1].role_restrictions().len(), 3);
        assert_eq!(frames[1].role_restrictions()[2].to_string(), "(concrete & solid)");
        assert!(frames[1].role_restrictions()[1].is_empty());
    }

    #[test]
    fn test_unknown_predicate() {
        let catalogue = VerbnetCatalogue::from_json_str(CATALOGUE).unwrap();
        assert!(matches!(
            catalogue.frames_for("zorp"),
            Err(VnsrlError::UnknownPredicate(_))
        ));
        assert!(catalogue.contains("SLEEP"));
    }

    #[test]
    fn test_candidate_frames_with_variants() {
        let catalogue = VerbnetCatalogue::from_json_str(CATALOGUE).unwrap();

        assert_eq!(catalogue.candidate_frames("cut", false, false).unwrap().len(), 2);
        // 2 originals, 2 passives of the transitive, 3 of the instrumental
        assert_eq!(catalogue.candidate_frames("cut", true, false).unwrap().len(), 7);
        assert_eq!(catalogue.candidate_frames("sleep", true, true).unwrap().len(), 1);
    }

    #[test]
    fn test_case_variants_merge_in_stable_order() {
        let json = r#"{
            "cut": [{"vnclass": "cut-21.1", "syntax": "NP.Agent V NP.Patient"}],
            "Cut": [{"vnclass": "cut-21.1", "syntax": "NP.Instrument V NP.Patient"}],
            "CUT": [{"vnclass": "cut-21.1", "syntax": "NP.Patient V"}]
        }"#;

        for _ in 0..5 {
            let catalogue = VerbnetCatalogue::from_json_str(json).unwrap();
            assert_eq!(catalogue.len(), 1);
            let frames: Vec<String> = catalogue
                .frames_for("cut")
                .unwrap()
                .iter()
                .map(|f| f.frame().to_string())
                .collect();
            assert_eq!(
                frames,
                vec!["NP.Patient V", "NP.Instrument V NP.Patient", "NP.Agent V NP.Patient"]
            );
        }
    }

    #[test]
    fn test_bad_entries_are_reported() {
        let bad_syntax = r#"{"cut": [{"vnclass": "c", "syntax": "NP NP"}]}"#;
        assert!(matches!(
            VerbnetCatalogue::from_json_str(bad_syntax),
            Err(VnsrlError::Catalogue(_))
        ));

        let bad_restriction =
            r#"{"cut": [{"vnclass": "c", "syntax": "NP.Agent V", "restrictions": {"Agent": "shiny"}}]}"#;
        assert!(VerbnetCatalogue::from_json_str(bad_restriction).is_err());
        assert!(VerbnetCatalogue::from_json_str("[]").is_err());
    }
}
