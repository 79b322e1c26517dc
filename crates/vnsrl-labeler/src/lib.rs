//! VNSRL Labeler - Role disambiguation over VerbNet frame matches
//!
//! This crate turns corpus frame instances into role assignments:
//! - Frame matching with three alignment strategies and tie keeping
//! - Selectional restriction filtering (co-occurrence statistics or a
//!   semantic lexicon)
//! - A four-level backoff probability model
//! - The bootstrap self-training loop
//! - The pipeline chaining these stages with per-occurrence diagnostics
//!
//! Author: hephaex@gmail.com

pub mod bootstrap;
pub mod matcher;
pub mod pipeline;
pub mod probability;

pub use bootstrap::{count_ambiguous, Bootstrap, BootstrapIteration, BootstrapReport};
pub use matcher::{
    alignment_score, collect_restriction_stats, handle_semantic_restrictions,
    restrict_headwords_with_lexicon, Alignment, FrameMatcher,
};
pub use pipeline::{Labeler, LabelingRun};
pub use probability::{ProbabilityModel, RoleCounts};
