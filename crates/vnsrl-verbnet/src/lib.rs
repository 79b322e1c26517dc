//! VNSRL VerbNet - Frames, selectional restrictions and the class catalogue
//!
//! Provides the VerbNet side of the labeler:
//! - Selectional restriction trees with a parser and statistical scoring
//! - Syntactic frames with slot typing, passive and relative variants
//! - Observed frame occurrences built from corpus instances
//! - The lemma to official frames catalogue
//! - The semantic lexicon seam for hard restriction checks

pub mod catalogue;
pub mod frame;
pub mod lexicon;
pub mod occurrence;
pub mod restriction;

pub use catalogue::VerbnetCatalogue;
pub use frame::{
    compute_slot_types, Category, Frame, OfficialFrame, Preposition, SlotDescriptor, SlotTyping,
};
pub use lexicon::{SemanticLexicon, WordClassLexicon};
pub use occurrence::{FrameMatch, FrameOccurrence};
pub use restriction::{Restriction, RestrictionStats, SemanticClass, NO_RESTRICTION};
