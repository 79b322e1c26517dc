//! VerbNet syntactic frames
//!
//! A frame is an ordered sequence of slot descriptors with exactly one verb
//! marker, e.g. `NP.Agent V NP.Theme {with|using} NP.Instrument`. Phrase
//! slots (NP, S, ADJ, ...) are the argument slots; lexical words such as
//! prepositions and complementizers govern the phrase that follows them.
//!
//! Every frame derives two arrays over its argument slots: the slot class
//! (subject, object, indirect object, prepositional object) and the
//! governing preposition. Both are computed once at construction by
//! [`compute_slot_types`], which is shared by observed and official frames.
//!
//! Author: hephaex@gmail.com

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use vnsrl_core::{Result, Role, SlotClass, VnsrlError};

use crate::restriction::Restriction;

type Pattern = Lazy<std::result::Result<Regex, regex::Error>>;

static PHRASE_TOKEN: Pattern =
    Lazy::new(|| Regex::new(r"^(NP|PP|S_INF|S_ING|S|ADJ|ADV)(?:\.([A-Za-z][A-Za-z_-]*))?$"));

static CHOICE_TOKEN: Pattern = Lazy::new(|| Regex::new(r"^\{([^{}]+)\}$"));

static WORD_TOKEN: Pattern = Lazy::new(|| Regex::new(r"^[a-z][a-z'_-]*$"));

fn pattern(lazy: &'static Pattern) -> Result<&'static Regex> {
    lazy.as_ref()
        .map_err(|e| VnsrlError::InvalidFrame(format!("notation pattern: {e}")))
}

// ============================================================================
// Slot Descriptors
// ============================================================================

/// Syntactic category of a frame element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// The predicate itself
    Verb,
    /// A lexical item: preposition or complementizer
    Word,
    Np,
    Pp,
    S,
    SInf,
    SIng,
    Adj,
    Adv,
}

impl Category {
    /// Whether elements of this category are argument slots
    pub fn is_phrase(&self) -> bool {
        !matches!(self, Self::Verb | Self::Word)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verb => "V",
            Self::Word => "WORD",
            Self::Np => "NP",
            Self::Pp => "PP",
            Self::S => "S",
            Self::SInf => "S_INF",
            Self::SIng => "S_ING",
            Self::Adj => "ADJ",
            Self::Adv => "ADV",
        }
    }

    /// Phrase category from its notation tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "NP" => Some(Self::Np),
            "PP" => Some(Self::Pp),
            "S" => Some(Self::S),
            "S_INF" => Some(Self::SInf),
            "S_ING" => Some(Self::SIng),
            "ADJ" => Some(Self::Adj),
            "ADV" => Some(Self::Adv),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lexical content of a word slot: one word or a set of alternatives
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Preposition {
    Fixed(String),
    OneOf(BTreeSet<String>),
}

impl Preposition {
    pub fn fixed(word: impl Into<String>) -> Self {
        Self::Fixed(word.into().to_lowercase())
    }

    /// A set of alternatives; a single alternative collapses to `Fixed`
    pub fn one_of<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: BTreeSet<String> = words.into_iter().map(|w| w.into().to_lowercase()).collect();
        if let (1, Some(word)) = (words.len(), words.first()) {
            return Self::Fixed(word.clone());
        }
        Self::OneOf(words)
    }

    pub fn contains(&self, word: &str) -> bool {
        match self {
            Self::Fixed(w) => w == word,
            Self::OneOf(words) => words.contains(word),
        }
    }

    /// Whether the two share at least one word
    pub fn intersects(&self, other: &Preposition) -> bool {
        match (self, other) {
            (Self::Fixed(a), _) => other.contains(a),
            (_, Self::Fixed(b)) => self.contains(b),
            (Self::OneOf(a), Self::OneOf(b)) => !a.is_disjoint(b),
        }
    }

    /// Stable string used as a probability model key
    pub fn key(&self) -> String {
        match self {
            Self::Fixed(w) => w.clone(),
            Self::OneOf(words) => words.iter().cloned().collect::<Vec<_>>().join("|"),
        }
    }
}

impl std::fmt::Display for Preposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(w) => write!(f, "{w}"),
            Self::OneOf(_) => write!(f, "{{{}}}", self.key()),
        }
    }
}

/// One element of a frame's syntax
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotDescriptor {
    pub category: Category,

    /// Semantic role, known only in official frames
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// Lexical content of word elements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preposition: Option<Preposition>,
}

impl SlotDescriptor {
    pub fn verb() -> Self {
        Self {
            category: Category::Verb,
            role: None,
            preposition: None,
        }
    }

    pub fn phrase(category: Category, role: Option<&str>) -> Self {
        Self {
            category,
            role: role.map(str::to_string),
            preposition: None,
        }
    }

    pub fn word(word: impl Into<String>) -> Self {
        Self {
            category: Category::Word,
            role: None,
            preposition: Some(Preposition::fixed(word)),
        }
    }

    pub fn choice<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            category: Category::Word,
            role: None,
            preposition: Some(Preposition::one_of(words)),
        }
    }

    pub fn is_verb(&self) -> bool {
        self.category == Category::Verb
    }

    pub fn is_argument(&self) -> bool {
        self.category.is_phrase()
    }

    /// Element-wise compatibility used by the lockstep aligners
    ///
    /// Phrases match on category, words when their lexical content
    /// intersects (a fixed observed word must be one of the official
    /// alternatives), and the verb only matches the verb.
    pub fn matches(&self, other: &SlotDescriptor) -> bool {
        match (self.category, other.category) {
            (Category::Verb, Category::Verb) => true,
            (Category::Word, Category::Word) => match (&self.preposition, &other.preposition) {
                (Some(a), Some(b)) => a.intersects(b),
                _ => false,
            },
            (a, b) => a.is_phrase() && a == b,
        }
    }
}

impl std::fmt::Display for SlotDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.category, &self.preposition, &self.role) {
            (Category::Word, Some(preposition), _) => write!(f, "{preposition}"),
            (Category::Word, None, _) => write!(f, "?"),
            (category, _, Some(role)) => write!(f, "{category}.{role}"),
            (category, _, None) => write!(f, "{category}"),
        }
    }
}

// ============================================================================
// Slot Typing
// ============================================================================

/// Arrays derived from a frame structure, one entry per argument slot
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlotTyping {
    pub slot_types: Vec<SlotClass>,
    pub slot_preps: Vec<Option<Preposition>>,
}

/// Classify argument slots by their position relative to the verb
///
/// Slots before the verb are subjects. A slot right after a lexical word is
/// a prepositional object governed by that word. The first other slot after
/// the verb is the object and any later one an indirect object.
pub fn compute_slot_types(structure: &[SlotDescriptor]) -> SlotTyping {
    let mut typing = SlotTyping::default();
    let mut seen_verb = false;
    let mut post_verb_slots = 0;
    let mut governing: Option<&Preposition> = None;

    for element in structure {
        match element.category {
            Category::Verb => {
                seen_verb = true;
                governing = None;
            }
            Category::Word => governing = element.preposition.as_ref(),
            _ => {
                if let Some(preposition) = governing.take() {
                    typing.slot_types.push(SlotClass::PrepObject);
                    typing.slot_preps.push(Some(preposition.clone()));
                    continue;
                }

                let class = if !seen_verb {
                    SlotClass::Subject
                } else if post_verb_slots == 0 {
                    SlotClass::Object
                } else {
                    SlotClass::IndirectObject
                };
                if seen_verb {
                    post_verb_slots += 1;
                }
                typing.slot_types.push(class);
                typing.slot_preps.push(None);
            }
        }
    }

    typing
}

// ============================================================================
// Frames
// ============================================================================

/// A syntactic frame with its derived slot arrays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SlotDescriptor>", into = "Vec<SlotDescriptor>")]
pub struct Frame {
    structure: Vec<SlotDescriptor>,
    typing: SlotTyping,
    verb_index: usize,
}

impl Frame {
    /// Build a frame, checking that it has exactly one verb
    pub fn new(structure: Vec<SlotDescriptor>) -> Result<Self> {
        let verbs: Vec<usize> = structure
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_verb())
            .map(|(i, _)| i)
            .collect();

        if verbs.len() != 1 {
            return Err(VnsrlError::InvalidFrame(format!(
                "expected exactly one verb, found {} in '{}'",
                verbs.len(),
                join_structure(&structure)
            )));
        }

        if let Some(bad) = structure
            .iter()
            .find(|e| (e.category == Category::Word) != e.preposition.is_some())
        {
            return Err(VnsrlError::InvalidFrame(format!(
                "element {bad:?} mixes lexical and phrasal content"
            )));
        }

        Ok(Self::assemble(structure, verbs[0]))
    }

    // Callers guarantee the single-verb invariant.
    pub(crate) fn assemble(structure: Vec<SlotDescriptor>, verb_index: usize) -> Self {
        let typing = compute_slot_types(&structure);
        Self {
            structure,
            typing,
            verb_index,
        }
    }

    pub fn structure(&self) -> &[SlotDescriptor] {
        &self.structure
    }

    pub fn len(&self) -> usize {
        self.structure.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structure.is_empty()
    }

    pub fn verb_index(&self) -> usize {
        self.verb_index
    }

    /// Number of argument slots
    pub fn num_slots(&self) -> usize {
        self.typing.slot_types.len()
    }

    pub fn slot_types(&self) -> &[SlotClass] {
        &self.typing.slot_types
    }

    pub fn slot_preps(&self) -> &[Option<Preposition>] {
        &self.typing.slot_preps
    }

    pub fn typing(&self) -> &SlotTyping {
        &self.typing
    }

    /// Argument slot descriptors, in order
    pub fn argument_slots(&self) -> impl Iterator<Item = &SlotDescriptor> {
        self.structure.iter().filter(|e| e.is_argument())
    }

    /// Role of each argument slot
    pub fn roles(&self) -> Vec<Option<&str>> {
        self.argument_slots().map(|e| e.role.as_deref()).collect()
    }

    /// Number of argument slots strictly before a structure position
    pub fn slots_before(&self, index: usize) -> usize {
        self.structure[..index.min(self.structure.len())]
            .iter()
            .filter(|e| e.is_argument())
            .count()
    }

    /// Whether a lexical slot offers `word`
    pub fn contains_word(&self, word: &str) -> bool {
        self.structure.iter().any(|e| {
            e.category == Category::Word
                && e.preposition.as_ref().is_some_and(|p| p.contains(word))
        })
    }

    /// Copy of the frame without `word` as a lexical option
    ///
    /// Lexical slots that are exactly `word` are dropped; choice slots only
    /// lose that alternative and keep the others. Argument slot indices are
    /// unchanged since only words are touched.
    pub fn without_word(&self, word: &str) -> Frame {
        let structure: Vec<SlotDescriptor> = self
            .structure
            .iter()
            .filter_map(|e| match (&e.category, &e.preposition) {
                (Category::Word, Some(Preposition::Fixed(w))) if w == word => None,
                (Category::Word, Some(Preposition::OneOf(words))) if words.contains(word) => {
                    let rest = words.iter().filter(|w| w.as_str() != word).cloned();
                    Some(SlotDescriptor {
                        preposition: Some(Preposition::one_of(rest)),
                        ..e.clone()
                    })
                }
                _ => Some(e.clone()),
            })
            .collect();
        let verb_index = structure.iter().position(|e| e.is_verb()).unwrap_or(0);
        Frame::assemble(structure, verb_index)
    }
}

impl TryFrom<Vec<SlotDescriptor>> for Frame {
    type Error = VnsrlError;

    fn try_from(structure: Vec<SlotDescriptor>) -> Result<Self> {
        Frame::new(structure)
    }
}

impl From<Frame> for Vec<SlotDescriptor> {
    fn from(frame: Frame) -> Self {
        frame.structure
    }
}

fn join_structure(structure: &[SlotDescriptor]) -> String {
    structure
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", join_structure(&self.structure))
    }
}

impl std::str::FromStr for Frame {
    type Err = VnsrlError;

    /// Parse frame notation, e.g. `NP.Agent V NP.Theme {with|using} NP.Instrument`
    fn from_str(s: &str) -> Result<Self> {
        let structure = s
            .split_whitespace()
            .map(parse_token)
            .collect::<Result<Vec<_>>>()?;
        Frame::new(structure)
    }
}

fn parse_token(token: &str) -> Result<SlotDescriptor> {
    if token == "V" {
        return Ok(SlotDescriptor::verb());
    }

    if let Some(caps) = pattern(&PHRASE_TOKEN)?.captures(token) {
        let category = Category::from_tag(&caps[1])
            .ok_or_else(|| VnsrlError::InvalidFrame(format!("unknown category '{token}'")))?;
        return Ok(SlotDescriptor::phrase(
            category,
            caps.get(2).map(|m| m.as_str()),
        ));
    }

    let word = pattern(&WORD_TOKEN)?;

    if let Some(caps) = pattern(&CHOICE_TOKEN)?.captures(token) {
        let words: Vec<&str> = caps[1].split('|').map(str::trim).collect();
        if words.iter().any(|w| !word.is_match(w)) {
            return Err(VnsrlError::InvalidFrame(format!(
                "invalid word choice '{token}'"
            )));
        }
        return Ok(SlotDescriptor::choice(words));
    }

    if word.is_match(token) {
        return Ok(SlotDescriptor::word(token));
    }

    Err(VnsrlError::InvalidFrame(format!(
        "unrecognized frame token '{token}'"
    )))
}

// ============================================================================
// Official Frames
// ============================================================================

/// A frame licensed by a VerbNet class
///
/// `role_restrictions[i]` is the selectional restriction of argument slot
/// `i`. The list may be shorter than the number of slots when the source
/// data is incomplete; lookups past its end are reported by the matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficialFrame {
    pub vnclass: String,
    frame: Frame,
    role_restrictions: Vec<Restriction>,
}

// An element paired with the restriction it carries when it is an argument.
type Item = (SlotDescriptor, Option<Restriction>);

impl OfficialFrame {
    pub fn new(vnclass: impl Into<String>, frame: Frame, role_restrictions: Vec<Restriction>) -> Self {
        Self {
            vnclass: vnclass.into(),
            frame,
            role_restrictions,
        }
    }

    /// Build with restrictions looked up by role name
    ///
    /// Slots whose role has no entry get the vacuous restriction.
    pub fn with_role_map(
        vnclass: impl Into<String>,
        frame: Frame,
        restrictions: &BTreeMap<String, Restriction>,
    ) -> Self {
        let role_restrictions = frame
            .argument_slots()
            .map(|slot| {
                slot.role
                    .as_ref()
                    .and_then(|role| restrictions.get(role))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();
        Self::new(vnclass, frame, role_restrictions)
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn role_restrictions(&self) -> &[Restriction] {
        &self.role_restrictions
    }

    /// Restriction of argument slot `index`
    pub fn restriction(&self, index: usize) -> Result<&Restriction> {
        self.role_restrictions
            .get(index)
            .ok_or_else(|| VnsrlError::RestrictionIndex {
                vnclass: self.vnclass.clone(),
                index,
                available: self.role_restrictions.len(),
            })
    }

    /// Role of argument slot `index`
    pub fn role(&self, index: usize) -> Option<&str> {
        self.frame
            .argument_slots()
            .nth(index)
            .and_then(|slot| slot.role.as_deref())
    }

    /// Same frame with the lexical slots offering `word` removed
    pub fn without_word(&self, word: &str) -> OfficialFrame {
        Self {
            vnclass: self.vnclass.clone(),
            frame: self.frame.without_word(word),
            role_restrictions: self.role_restrictions.clone(),
        }
    }

    fn items(&self) -> Vec<Item> {
        let mut slot = 0;
        self.frame
            .structure()
            .iter()
            .map(|element| {
                if element.is_argument() {
                    let restriction = self.role_restrictions.get(slot).cloned().unwrap_or_default();
                    slot += 1;
                    (element.clone(), Some(restriction))
                } else {
                    (element.clone(), None)
                }
            })
            .collect()
    }

    fn from_items(&self, items: Vec<Item>) -> OfficialFrame {
        let verb_index = items.iter().position(|(e, _)| e.is_verb()).unwrap_or(0);
        let mut structure = Vec::with_capacity(items.len());
        let mut role_restrictions = Vec::new();
        for (element, restriction) in items {
            if let Some(restriction) = restriction {
                role_restrictions.push(restriction);
            }
            structure.push(element);
        }
        Self {
            vnclass: self.vnclass.clone(),
            frame: Frame::assemble(structure, verb_index),
            role_restrictions,
        }
    }

    /// Passive variants of a transitive frame
    ///
    /// The object NP right after the verb becomes the subject. The first
    /// variant drops the former subject; the others reinsert it as
    /// `by NP` right after the verb and after each later argument slot.
    ///
    /// Only a role-bearing NP directly before and directly after the verb
    /// qualifies. Frames whose first post-verb element is a clause, an
    /// adjective or a preposition (`NP.Agent V S.Topic`,
    /// `NP.Theme V at NP.Location`) have no passive and yield nothing.
    pub fn passivize(&self) -> Vec<OfficialFrame> {
        let items = self.items();
        let v = self.frame.verb_index();

        let is_role_np =
            |item: &Item| item.0.category == Category::Np && item.0.role.is_some();
        if v == 0 || v + 1 >= items.len() || !is_role_np(&items[v - 1]) || !is_role_np(&items[v + 1]) {
            return Vec::new();
        }

        let subject = items[v - 1].clone();
        let object = items[v + 1].clone();

        let mut base: Vec<Item> = items[..v - 1].to_vec();
        base.push(object);
        let new_verb = base.len();
        base.push(items[v].clone());
        base.extend_from_slice(&items[v + 2..]);

        let by_agent = [(SlotDescriptor::word("by"), None), subject];

        let insertion_points: Vec<usize> = (new_verb + 1..=base.len())
            .filter(|&k| k == new_verb + 1 || base[k - 1].0.is_argument())
            .collect();

        let mut frames = vec![self.from_items(base.clone())];
        for k in insertion_points {
            let mut variant = base[..k].to_vec();
            variant.extend_from_slice(&by_agent);
            variant.extend_from_slice(&base[k..]);
            frames.push(self.from_items(variant));
        }
        frames
    }

    /// Relative-clause variants
    ///
    /// Each role-bearing NP after the verb is extracted to the front of the
    /// frame, as in "the cake John ate": `NP.Patient NP.Agent V`. A
    /// governing preposition stays stranded in place.
    pub fn relatives(&self) -> Vec<OfficialFrame> {
        let items = self.items();
        let v = self.frame.verb_index();

        (v + 1..items.len())
            .filter(|&i| items[i].0.category == Category::Np && items[i].0.role.is_some())
            .map(|i| {
                let mut variant = Vec::with_capacity(items.len());
                variant.push(items[i].clone());
                variant.extend(
                    items
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| *j != i)
                        .map(|(_, item)| item.clone()),
                );
                self.from_items(variant)
            })
            .collect()
    }
}

impl std::fmt::Display for OfficialFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.vnclass, self.frame)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn frame(notation: &str) -> Frame {
        notation.parse().unwrap()
    }

    fn official(notation: &str) -> OfficialFrame {
        let f = frame(notation);
        let n = f.num_slots();
        OfficialFrame::new("XX", f, vec![Restriction::build_empty(); n])
    }

    fn notations(frames: &[OfficialFrame]) -> Vec<String> {
        frames.iter().map(|f| f.frame().to_string()).collect()
    }

    #[test]
    fn test_parse_and_display() {
        let f = frame("NP.Agent V NP.Theme {with|using} NP.Instrument");
        assert_eq!(f.len(), 5);
        assert_eq!(f.verb_index(), 1);
        assert_eq!(f.num_slots(), 3);
        assert_eq!(f.roles(), vec![Some("Agent"), Some("Theme"), Some("Instrument")]);
        assert_eq!(f.to_string(), "NP.Agent V NP.Theme {using|with} NP.Instrument");
    }

    #[test]
    fn test_parse_rejects_bad_frames() {
        assert!("NP V NP V".parse::<Frame>().is_err());
        assert!("NP NP".parse::<Frame>().is_err());
        assert!("NP V XP".parse::<Frame>().is_err());
        assert!("NP V {with|} NP".parse::<Frame>().is_err());
    }

    #[test]
    fn test_single_choice_collapses() {
        let f = frame("NP V {with} NP");
        assert_eq!(f.structure()[2], SlotDescriptor::word("with"));
    }

    #[test]
    fn test_slot_types() {
        let f = frame("NP V NP NP with NP");
        assert_eq!(
            f.slot_types(),
            &[
                SlotClass::Subject,
                SlotClass::Object,
                SlotClass::IndirectObject,
                SlotClass::PrepObject
            ]
        );
        assert_eq!(
            f.slot_preps(),
            &[None, None, None, Some(Preposition::fixed("with"))]
        );
    }

    #[test]
    fn test_slot_types_prep_before_object() {
        let f = frame("NP V to NP NP");
        assert_eq!(
            f.slot_types(),
            &[SlotClass::Subject, SlotClass::PrepObject, SlotClass::Object]
        );
    }

    #[test]
    fn test_slot_types_keep_choice_sets() {
        let f = frame("NP V NP {into|onto} NP");
        assert_eq!(
            f.slot_preps()[2],
            Some(Preposition::one_of(["into", "onto"]))
        );
    }

    #[test]
    fn test_preposition_intersection() {
        let fixed = Preposition::fixed("with");
        let set = Preposition::one_of(["with", "using"]);
        let other = Preposition::one_of(["at", "in"]);

        assert!(fixed.intersects(&set));
        assert!(set.intersects(&fixed));
        assert!(!set.intersects(&other));
        assert!(!fixed.intersects(&Preposition::fixed("at")));
        assert_eq!(set.key(), "using|with");
    }

    #[test]
    fn test_element_matching() {
        let with = SlotDescriptor::word("with");
        let choice = SlotDescriptor::choice(["with", "using"]);
        let np = SlotDescriptor::phrase(Category::Np, None);
        let np_agent = SlotDescriptor::phrase(Category::Np, Some("Agent"));

        assert!(with.matches(&choice));
        assert!(np.matches(&np_agent));
        assert!(!np.matches(&with));
        assert!(!np.matches(&SlotDescriptor::verb()));
        assert!(SlotDescriptor::verb().matches(&SlotDescriptor::verb()));
    }

    #[test]
    fn test_without_word() {
        let f = frame("NP.Agent V NP.Recipient that S.Topic");
        assert!(f.contains_word("that"));

        let stripped = f.without_word("that");
        assert_eq!(stripped.to_string(), "NP.Agent V NP.Recipient S.Topic");
        assert_eq!(stripped.num_slots(), f.num_slots());
        assert!(!stripped.contains_word("that"));
    }

    #[test]
    fn test_without_word_keeps_other_choices() {
        let f = frame("NP.Agent V {that|whether} S.Topic");
        let stripped = f.without_word("that");
        assert_eq!(stripped.to_string(), "NP.Agent V whether S.Topic");
        assert_eq!(stripped.slot_types(), f.slot_types());

        let f = frame("NP.Agent V {that|whether|if} S.Topic");
        assert_eq!(
            f.without_word("that").to_string(),
            "NP.Agent V {if|whether} S.Topic"
        );
    }

    #[test]
    fn test_passivize_needs_object_np() {
        assert!(official("NP.Agent V S.Topic").passivize().is_empty());
        assert!(official("NP.Theme V at NP.Location").passivize().is_empty());
        assert!(official("NP.Agent V").passivize().is_empty());
        assert!(official("V NP.Theme").passivize().is_empty());
    }

    #[test]
    fn test_passivize_transitive() {
        let passives = official("NP.Agent V NP.Theme").passivize();
        assert_eq!(
            notations(&passives),
            vec!["NP.Theme V", "NP.Theme V by NP.Agent"]
        );
    }

    #[test]
    fn test_passivize_with_prepositional_object() {
        let passives = official("NP.Agent V NP.Theme at NP.Value").passivize();
        assert_eq!(
            notations(&passives),
            vec![
                "NP.Theme V at NP.Value",
                "NP.Theme V by NP.Agent at NP.Value",
                "NP.Theme V at NP.Value by NP.Agent",
            ]
        );
    }

    #[test]
    fn test_passivize_moves_restrictions_and_keeps_original() {
        let f = frame("NP.Agent V NP.Theme");
        let animate: Restriction = "animate".parse().unwrap();
        let concrete: Restriction = "concrete".parse().unwrap();
        let original = OfficialFrame::new("XX", f, vec![animate.clone(), concrete.clone()]);

        let passives = original.passivize();
        assert_eq!(passives[0].role_restrictions(), &[concrete.clone()]);
        assert_eq!(passives[1].role_restrictions(), &[concrete, animate]);
        assert_eq!(original.frame().to_string(), "NP.Agent V NP.Theme");
    }

    #[test]
    fn test_passivize_intransitive_yields_nothing() {
        assert!(official("NP.Theme V").passivize().is_empty());
        assert!(official("NP.Agent V with NP.Co-Agent").passivize().is_empty());
    }

    #[test]
    fn test_relatives() {
        let relatives = official("NP.Agent V NP.Theme on NP.Destination").relatives();
        assert_eq!(
            notations(&relatives),
            vec![
                "NP.Theme NP.Agent V on NP.Destination",
                "NP.Destination NP.Agent V NP.Theme on",
            ]
        );
        assert_eq!(relatives[0].frame().slot_types()[0], SlotClass::Subject);
    }

    #[test]
    fn test_restriction_lookup_out_of_range() {
        let f = frame("NP.Agent V NP.Theme");
        let short = OfficialFrame::new("cut-21.1", f, vec![Restriction::build_empty()]);
        assert!(short.restriction(0).is_ok());
        assert!(matches!(
            short.restriction(1),
            Err(VnsrlError::RestrictionIndex { index: 1, available: 1, .. })
        ));
        assert_eq!(short.role(1), Some("Theme"));
    }

    #[test]
    fn test_with_role_map() {
        let mut map = BTreeMap::new();
        map.insert("Agent".to_string(), "animate".parse::<Restriction>().unwrap());
        let f = OfficialFrame::with_role_map("XX", frame("NP.Agent V NP.Patient"), &map);

        assert_eq!(f.role_restrictions()[0].to_string(), "animate");
        assert!(f.role_restrictions()[1].is_empty());
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let f = frame("NP.Agent V NP.Theme with NP.Instrument");
        let json = serde_json::to_string(&f).unwrap();
        let back: Frame = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f);

        let bad = r#"[{"category": "NP"}]"#;
        assert!(serde_json::from_str::<Frame>(bad).is_err());
    }

    fn arb_element() -> impl Strategy<Value = SlotDescriptor> {
        prop_oneof![
            Just(SlotDescriptor::phrase(Category::Np, None)),
            Just(SlotDescriptor::phrase(Category::S, None)),
            Just(SlotDescriptor::phrase(Category::Adj, None)),
            Just(SlotDescriptor::word("with")),
            Just(SlotDescriptor::choice(["in", "on"])),
        ]
    }

    proptest! {
        #[test]
        fn prop_slot_typing_is_idempotent(
            before in proptest::collection::vec(arb_element(), 0..4),
            after in proptest::collection::vec(arb_element(), 0..6),
        ) {
            let mut structure = before;
            structure.push(SlotDescriptor::verb());
            structure.extend(after);

            let first = compute_slot_types(&structure);
            let snapshot = structure.clone();
            let second = compute_slot_types(&structure);

            prop_assert_eq!(&first, &second);
            prop_assert_eq!(&structure, &snapshot);
            let slots = structure.iter().filter(|e| e.is_argument()).count();
            prop_assert_eq!(first.slot_types.len(), slots);
            prop_assert_eq!(first.slot_preps.len(), slots);

            let built = Frame::new(structure).unwrap();
            prop_assert_eq!(built.typing(), &first);
        }
    }
}
