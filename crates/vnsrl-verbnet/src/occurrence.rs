//! Observed frame occurrences
//!
//! A [`FrameOccurrence`] is the syntactic frame of one predicate in one
//! sentence, built from a corpus [`FrameInstance`]. It carries the
//! per-slot state the labeler refines: candidate role sets, the best
//! alignment score and the official frames that reached it.

use serde::{Deserialize, Serialize};
use vnsrl_core::{FrameInstance, LabeledFrame, Result, Role, RoleSet, VnsrlError};

use crate::frame::{Category, Frame, OfficialFrame, SlotDescriptor};

/// An official frame tied for the best score, with its alignment
///
/// `slot_assocs[i]` is the official argument slot aligned with occurrence
/// slot `i`, or `None` when the slot was left unaligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMatch {
    pub frame: OfficialFrame,
    pub slot_assocs: Vec<Option<usize>>,
}

impl FrameMatch {
    pub fn new(frame: OfficialFrame, slot_assocs: Vec<Option<usize>>) -> Self {
        Self { frame, slot_assocs }
    }

    /// Role the match assigns to occurrence slot `slot`
    pub fn role_for(&self, slot: usize) -> Option<&str> {
        self.slot_assocs
            .get(slot)
            .copied()
            .flatten()
            .and_then(|official| self.frame.role(official))
    }
}

/// The observed frame of one predicate occurrence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameOccurrence {
    pub id: Option<String>,
    pub predicate: String,
    pub sentence: String,
    frame: Frame,

    /// Headword of each argument slot, when known
    pub headwords: Vec<Option<String>>,

    /// Corpus roles of each argument slot, when known
    pub gold_roles: Vec<Option<Role>>,

    /// Remaining candidate roles per argument slot
    pub roles: Vec<RoleSet>,

    pub best_score: Option<u32>,
    pub best_matches: Vec<FrameMatch>,
}

impl FrameOccurrence {
    /// Occurrence over an already built frame, without headwords
    pub fn new(predicate: impl Into<String>, frame: Frame) -> Self {
        let slots = frame.num_slots();
        Self {
            id: None,
            predicate: predicate.into(),
            sentence: String::new(),
            frame,
            headwords: vec![None; slots],
            gold_roles: vec![None; slots],
            roles: vec![RoleSet::new(); slots],
            best_score: None,
            best_matches: Vec::new(),
        }
    }

    pub fn with_headwords<I, S>(mut self, headwords: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let mut headwords: Vec<Option<String>> = headwords
            .into_iter()
            .map(|h| h.map(|w| w.into().to_lowercase()))
            .collect();
        headwords.resize(self.frame.num_slots(), None);
        self.headwords = headwords;
        self
    }

    /// Build the observed frame of a corpus instance
    ///
    /// Non-instantiated arguments are dropped, the rest are ordered by
    /// span and the verb is placed at the predicate's position. Each
    /// argument contributes exactly one argument slot, preceded by its
    /// introducing word for prepositional and complementizer phrases.
    pub fn from_instance(instance: &FrameInstance) -> Result<Self> {
        let mut arguments: Vec<_> = instance.arguments.iter().filter(|a| a.instantiated).collect();
        arguments.sort_by_key(|a| (a.span.start, a.span.end));

        let predicate_start = instance.predicate.span.start;
        let mut structure = Vec::with_capacity(arguments.len() * 2 + 1);
        let mut verb_placed = false;

        for argument in &arguments {
            if !verb_placed && argument.span.start > predicate_start {
                structure.push(SlotDescriptor::verb());
                verb_placed = true;
            }
            structure.extend(argument_elements(&argument.phrase_type, argument.first_word())?);
        }
        if !verb_placed {
            structure.push(SlotDescriptor::verb());
        }

        let frame = Frame::new(structure)?;
        let slots = frame.num_slots();
        debug_assert_eq!(slots, arguments.len());

        Ok(Self {
            id: instance.id.clone(),
            predicate: instance.predicate.lemma.clone(),
            sentence: instance.sentence.clone(),
            headwords: arguments
                .iter()
                .map(|a| a.headword.as_ref().map(|h| h.to_lowercase()))
                .collect(),
            gold_roles: arguments.iter().map(|a| a.role.clone()).collect(),
            roles: vec![RoleSet::new(); slots],
            best_score: None,
            best_matches: Vec::new(),
            frame,
        })
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn num_slots(&self) -> usize {
        self.frame.num_slots()
    }

    /// Label used in diagnostics
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("{} ({})", self.predicate, self.frame),
        }
    }

    /// Union, per slot, of the roles assigned by the current best matches
    pub fn possible_distribs(&self) -> Vec<RoleSet> {
        (0..self.num_slots())
            .map(|slot| {
                self.best_matches
                    .iter()
                    .filter_map(|m| m.role_for(slot))
                    .map(str::to_string)
                    .collect()
            })
            .collect()
    }

    /// Recompute `roles` from the current best matches
    pub fn refresh_roles(&mut self) {
        self.roles = self.possible_distribs();
    }

    /// Whether any slot still has several candidate roles
    pub fn is_ambiguous(&self) -> bool {
        self.roles.iter().any(|r| r.len() > 1)
    }

    pub fn into_labeled(self) -> LabeledFrame {
        LabeledFrame {
            id: self.id,
            predicate: self.predicate,
            sentence: self.sentence,
            roles: self.roles,
            gold_roles: self.gold_roles,
            best_score: self.best_score,
        }
    }
}

fn argument_elements(phrase_type: &str, first_word: Option<String>) -> Result<Vec<SlotDescriptor>> {
    let phrase = |category| SlotDescriptor::phrase(category, None);
    let introduced = |category, word: Option<String>| match word {
        Some(word) => vec![SlotDescriptor::word(word), phrase(category)],
        None => vec![phrase(category)],
    };

    let elements = match phrase_type {
        "NP" | "N" | "Poss" | "Obj" => vec![phrase(Category::Np)],
        "PP" => introduced(Category::Np, first_word),
        "PPing" => introduced(Category::SIng, first_word),
        "PPinterrog" => introduced(Category::S, first_word),
        "Sfin" if first_word.as_deref() == Some("that") => introduced(Category::S, first_word),
        "Sfin" | "Sinterrog" | "Sub" | "QUO" => vec![phrase(Category::S)],
        "VPto" | "Sforto" => vec![phrase(Category::SInf)],
        "VPing" | "Sing" => vec![phrase(Category::SIng)],
        "AJP" | "A" => vec![phrase(Category::Adj)],
        "AVP" | "Adv" => vec![phrase(Category::Adv)],
        other => {
            return Err(VnsrlError::InvalidFrame(format!(
                "unknown phrase type '{other}'"
            )))
        }
    };
    Ok(elements)
}
