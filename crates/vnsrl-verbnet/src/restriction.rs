//! Selectional restrictions
//!
//! VerbNet attaches semantic preconditions to thematic roles ("the Agent is
//! animate or a machine"). A restriction is a small boolean tree over a
//! closed set of semantic classes. Equality is structural: AND/OR children
//! form a set, so child order and duplicates do not matter, but logically
//! equivalent trees with a different shape (De Morgan rewrites, nested
//! ANDs built by hand) compare unequal.
//!
//! Restriction expressions use a compact notation:
//!
//! ```text
//! animate                 leaf
//! +animate / -animate     VerbNet polarity, "-" negates
//! !animate                negation
//! animate | machine       disjunction
//! solid & elongated       conjunction
//! NORESTR                 the vacuous restriction
//! ```

use std::collections::{BTreeSet, HashMap};

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0, one_of},
    combinator::{all_consuming, cut, map, map_res, value, verify},
    error::ErrorKind,
    multi::separated_list1,
    sequence::{delimited, preceded},
    IResult,
};
use serde::{Deserialize, Serialize};
use vnsrl_core::{Result, VnsrlError};

use crate::lexicon::SemanticLexicon;

/// Literal used to print the vacuous restriction
pub const NO_RESTRICTION: &str = "NORESTR";

// ============================================================================
// Semantic Classes
// ============================================================================

/// Atomic semantic classes recognized in VerbNet restrictions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticClass {
    Abstract,
    Animal,
    Animate,
    BodyPart,
    Comestible,
    Communication,
    Concrete,
    Currency,
    Elongated,
    Force,
    Garment,
    Human,
    IntControl,
    Location,
    Machine,
    Natural,
    Nonrigid,
    Organization,
    Plural,
    Pointy,
    Refl,
    Region,
    Solid,
    Sound,
    Substance,
    Vehicle,
}

impl SemanticClass {
    pub const ALL: [SemanticClass; 26] = [
        Self::Abstract,
        Self::Animal,
        Self::Animate,
        Self::BodyPart,
        Self::Comestible,
        Self::Communication,
        Self::Concrete,
        Self::Currency,
        Self::Elongated,
        Self::Force,
        Self::Garment,
        Self::Human,
        Self::IntControl,
        Self::Location,
        Self::Machine,
        Self::Natural,
        Self::Nonrigid,
        Self::Organization,
        Self::Plural,
        Self::Pointy,
        Self::Refl,
        Self::Region,
        Self::Solid,
        Self::Sound,
        Self::Substance,
        Self::Vehicle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Abstract => "abstract",
            Self::Animal => "animal",
            Self::Animate => "animate",
            Self::BodyPart => "body_part",
            Self::Comestible => "comestible",
            Self::Communication => "communication",
            Self::Concrete => "concrete",
            Self::Currency => "currency",
            Self::Elongated => "elongated",
            Self::Force => "force",
            Self::Garment => "garment",
            Self::Human => "human",
            Self::IntControl => "int_control",
            Self::Location => "location",
            Self::Machine => "machine",
            Self::Natural => "natural",
            Self::Nonrigid => "nonrigid",
            Self::Organization => "organization",
            Self::Plural => "plural",
            Self::Pointy => "pointy",
            Self::Refl => "refl",
            Self::Region => "region",
            Self::Solid => "solid",
            Self::Sound => "sound",
            Self::Substance => "substance",
            Self::Vehicle => "vehicle",
        }
    }
}

impl std::fmt::Display for SemanticClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SemanticClass {
    type Err = VnsrlError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|class| class.as_str() == needle)
            .ok_or_else(|| VnsrlError::UnknownSemanticClass(s.to_string()))
    }
}

// ============================================================================
// Restriction Tree
// ============================================================================

/// A selectional restriction
///
/// `And` with no children is the vacuous restriction that every word
/// satisfies. `Or` always has at least two children when built through
/// [`Restriction::build_or`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Restriction {
    Leaf(SemanticClass),
    And(BTreeSet<Restriction>),
    Or(BTreeSet<Restriction>),
    Not(Box<Restriction>),
}

#[derive(Clone, Copy)]
enum Connective {
    And,
    Or,
}

impl Default for Restriction {
    fn default() -> Self {
        Self::build_empty()
    }
}

impl Restriction {
    /// Leaf restriction for one semantic class tag
    pub fn build(tag: &str) -> Result<Self> {
        Ok(Self::Leaf(tag.parse()?))
    }

    /// The vacuous restriction
    pub fn build_empty() -> Self {
        Self::And(BTreeSet::new())
    }

    pub fn build_and(left: Restriction, right: Restriction) -> Self {
        Self::combine(Connective::And, left, right)
    }

    pub fn build_or(left: Restriction, right: Restriction) -> Self {
        Self::combine(Connective::Or, left, right)
    }

    pub fn build_not(inner: Restriction) -> Self {
        Self::Not(Box::new(inner))
    }

    // Operands already joined by the same connective are flattened.
    fn combine(connective: Connective, left: Restriction, right: Restriction) -> Self {
        if left.is_empty() {
            return right;
        }
        if right.is_empty() || left == right {
            return left;
        }

        let mut children = BTreeSet::new();
        for operand in [left, right] {
            match (connective, operand) {
                (Connective::And, Self::And(inner)) | (Connective::Or, Self::Or(inner)) => {
                    children.extend(inner)
                }
                (_, other) => {
                    children.insert(other);
                }
            }
        }

        match connective {
            Connective::And => Self::And(children),
            Connective::Or => Self::Or(children),
        }
    }

    /// Whether this is the vacuous restriction
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::And(children) if children.is_empty())
    }

    /// Score how well `headword` fits this restriction
    ///
    /// The node's own co-occurrence count is added to the combined score of
    /// its children: maximum for OR, minimum for AND, negation for NOT.
    /// Negating a zero score yields +1, since no evidence is not a
    /// contradiction.
    pub fn match_score(&self, headword: &str, stats: &RestrictionStats) -> f64 {
        let own = stats.frequency(self, headword) as f64;

        let children = match self {
            Self::Leaf(_) => 0.0,
            Self::And(children) if children.is_empty() => 0.0,
            Self::Or(children) if children.is_empty() => 0.0,
            Self::And(children) => children
                .iter()
                .map(|c| c.match_score(headword, stats))
                .fold(f64::INFINITY, f64::min),
            Self::Or(children) => children
                .iter()
                .map(|c| c.match_score(headword, stats))
                .fold(f64::NEG_INFINITY, f64::max),
            Self::Not(inner) => {
                let score = inner.match_score(headword, stats);
                if score == 0.0 {
                    1.0
                } else {
                    -score
                }
            }
        };

        own + children
    }

    /// Evaluate the restriction against a semantic lexicon
    pub fn is_satisfied_by(&self, headword: &str, lexicon: &dyn SemanticLexicon) -> bool {
        match self {
            Self::Leaf(class) => lexicon.has_class(headword, *class),
            Self::And(children) => children
                .iter()
                .all(|c| c.is_satisfied_by(headword, lexicon)),
            Self::Or(children) => children
                .iter()
                .any(|c| c.is_satisfied_by(headword, lexicon)),
            Self::Not(inner) => !inner.is_satisfied_by(headword, lexicon),
        }
    }

    /// Every semantic class mentioned anywhere in the tree
    pub fn get_atomic_restrictions(&self) -> BTreeSet<SemanticClass> {
        let mut classes = BTreeSet::new();
        self.collect_atoms(&mut classes);
        classes
    }

    fn collect_atoms(&self, classes: &mut BTreeSet<SemanticClass>) {
        match self {
            Self::Leaf(class) => {
                classes.insert(*class);
            }
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.collect_atoms(classes);
                }
            }
            Self::Not(inner) => inner.collect_atoms(classes),
        }
    }
}

impl std::fmt::Display for Restriction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Leaf(class) => write!(f, "{class}"),
            Self::And(children) if children.is_empty() => write!(f, "{NO_RESTRICTION}"),
            Self::And(children) => write_joined(f, children, " & "),
            Self::Or(children) => write_joined(f, children, " | "),
            Self::Not(inner) => write!(f, "!{inner}"),
        }
    }
}

fn write_joined(
    f: &mut std::fmt::Formatter<'_>,
    children: &BTreeSet<Restriction>,
    separator: &str,
) -> std::fmt::Result {
    write!(f, "(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, "{separator}")?;
        }
        write!(f, "{child}")?;
    }
    write!(f, ")")
}

impl std::str::FromStr for Restriction {
    type Err = VnsrlError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Ok(Self::build_empty());
        }

        match all_consuming(parse_or)(s) {
            Ok((_, restriction)) => Ok(restriction),
            Err(nom::Err::Failure(e)) if e.code == ErrorKind::MapRes => {
                let name = e
                    .input
                    .split(|c: char| !is_class_char(c))
                    .next()
                    .unwrap_or_default();
                Err(VnsrlError::UnknownSemanticClass(name.to_string()))
            }
            Err(e) => Err(VnsrlError::InvalidRestriction(format!("'{s}': {e}"))),
        }
    }
}

// ============================================================================
// Expression Parser
// ============================================================================

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_class_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(is_class_char)(input)
}

/// `a | b | ...`, lowest precedence
fn parse_or(input: &str) -> IResult<&str, Restriction> {
    map(separated_list1(ws(char('|')), parse_and), |operands: Vec<Restriction>| {
        operands
            .into_iter()
            .reduce(Restriction::build_or)
            .unwrap_or_default()
    })(input)
}

fn parse_and(input: &str) -> IResult<&str, Restriction> {
    map(separated_list1(ws(char('&')), parse_unary), |operands: Vec<Restriction>| {
        operands
            .into_iter()
            .reduce(Restriction::build_and)
            .unwrap_or_default()
    })(input)
}

/// Negation (`!`, `-`), positive polarity (`+`), groups and classes
fn parse_unary(input: &str) -> IResult<&str, Restriction> {
    ws(alt((
        map(preceded(one_of("!-"), parse_unary), Restriction::build_not),
        preceded(char('+'), parse_unary),
        delimited(char('('), parse_or, char(')')),
        parse_no_restriction,
        parse_class,
    )))(input)
}

fn parse_no_restriction(input: &str) -> IResult<&str, Restriction> {
    value(
        Restriction::build_empty(),
        verify(identifier, |name: &str| name == NO_RESTRICTION),
    )(input)
}

// An unknown class name is a hard failure so the caller can report it.
fn parse_class(input: &str) -> IResult<&str, Restriction> {
    cut(map_res(identifier, Restriction::build))(input)
}

// ============================================================================
// Co-occurrence Statistics
// ============================================================================

/// Headword counts observed under each restriction
#[derive(Debug, Clone, Default)]
pub struct RestrictionStats {
    counts: HashMap<Restriction, HashMap<String, u32>>,
}

impl RestrictionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one observation of `headword` filling a slot restricted by `restriction`
    pub fn record(&mut self, restriction: &Restriction, headword: &str) {
        *self
            .counts
            .entry(restriction.clone())
            .or_default()
            .entry(headword.to_lowercase())
            .or_insert(0) += 1;
    }

    /// Observations of `headword` under exactly this restriction node
    pub fn frequency(&self, restriction: &Restriction, headword: &str) -> u32 {
        self.counts
            .get(restriction)
            .and_then(|words| words.get(&headword.to_lowercase()))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of distinct restrictions with observations
    pub fn len(&self) -> usize {
        self.counts.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
