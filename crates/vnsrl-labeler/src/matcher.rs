//! Frame matcher
//!
//! Aligns the observed frame of an occurrence against every candidate
//! official frame of its predicate, keeps all frames reaching the best
//! score and derives per-slot candidate role sets from them. Tied matches
//! can then be pruned by how well each slot's headword fits the selectional
//! restriction of the role it was aligned with.

use vnsrl_core::{MatchingAlgorithm, Result, VnsrlError};
use vnsrl_verbnet::{
    Frame, FrameMatch, FrameOccurrence, OfficialFrame, Restriction, RestrictionStats,
    SemanticLexicon,
};

/// Complementizer that official frames may list but sentences often drop
const OPTIONAL_COMPLEMENTIZER: &str = "that";

/// Result of aligning one occurrence frame with one official frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    /// Number of argument slots aligned
    pub matched: usize,

    /// Official slot aligned with each occurrence slot
    pub slot_assocs: Vec<Option<usize>>,
}

/// Alignment score of `matched` slots between frames of the given sizes
///
/// `floor(100 * (matched / occurrence_slots + matched / official_slots))`,
/// where a side with no argument slots contributes a full term.
pub fn alignment_score(matched: usize, occurrence_slots: usize, official_slots: usize) -> u32 {
    let term = |slots: usize| if slots == 0 { (1, 1) } else { (matched, slots) };
    let (a, b) = term(occurrence_slots);
    let (c, d) = term(official_slots);
    (100 * (a * d + c * b) / (b * d)) as u32
}

// ============================================================================
// Matcher
// ============================================================================

/// Aligns occurrences with official frames using one of the strategies
#[derive(Debug, Clone, Copy)]
pub struct FrameMatcher {
    algorithm: MatchingAlgorithm,
}

impl Default for FrameMatcher {
    fn default() -> Self {
        Self::new(MatchingAlgorithm::default())
    }
}

impl FrameMatcher {
    pub fn new(algorithm: MatchingAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> MatchingAlgorithm {
        self.algorithm
    }

    /// Align two frames with the configured strategy
    pub fn align(&self, occurrence: &Frame, official: &Frame) -> Alignment {
        match self.algorithm {
            MatchingAlgorithm::Baseline => align_baseline(occurrence, official),
            MatchingAlgorithm::SyncPredicates => align_lockstep(occurrence, official, true),
            MatchingAlgorithm::StopOnFail => align_lockstep(occurrence, official, false),
        }
    }

    /// Match an occurrence against its candidate frames
    ///
    /// Sets the occurrence's best score, its tied best matches and the
    /// per-slot role sets derived from them. Returns the best score, or
    /// `None` when there was no candidate.
    pub fn match_occurrence(
        &self,
        occurrence: &mut FrameOccurrence,
        candidates: &[OfficialFrame],
    ) -> Option<u32> {
        let drop_complementizer = !occurrence.frame().contains_word(OPTIONAL_COMPLEMENTIZER);

        let mut best_score: Option<u32> = None;
        let mut best_matches = Vec::new();

        for candidate in candidates {
            let alignment = if drop_complementizer
                && candidate.frame().contains_word(OPTIONAL_COMPLEMENTIZER)
            {
                let stripped = candidate.frame().without_word(OPTIONAL_COMPLEMENTIZER);
                self.align(occurrence.frame(), &stripped)
            } else {
                self.align(occurrence.frame(), candidate.frame())
            };

            let score = alignment_score(
                alignment.matched,
                occurrence.num_slots(),
                candidate.frame().num_slots(),
            );

            match best_score {
                Some(best) if score < best => continue,
                Some(best) if score == best => {}
                _ => {
                    best_score = Some(score);
                    best_matches.clear();
                }
            }
            best_matches.push(FrameMatch::new(candidate.clone(), alignment.slot_assocs));
        }

        tracing::debug!(
            occurrence = %occurrence.label(),
            frame = %occurrence.frame(),
            candidates = candidates.len(),
            score = ?best_score,
            ties = best_matches.len(),
            "Matched occurrence"
        );

        occurrence.best_score = best_score;
        occurrence.best_matches = best_matches;
        occurrence.refresh_roles();
        best_score
    }
}

/// Greedy first fit over argument slots, ignoring order and the verb
fn align_baseline(occurrence: &Frame, official: &Frame) -> Alignment {
    let official_slots: Vec<_> = official.argument_slots().collect();
    let mut consumed = vec![false; official_slots.len()];
    let mut slot_assocs = vec![None; occurrence.num_slots()];
    let mut matched = 0;

    for (i, slot) in occurrence.argument_slots().enumerate() {
        let prep = &occurrence.slot_preps()[i];
        let found = official_slots.iter().enumerate().position(|(j, candidate)| {
            let compatible = match (prep, &official.slot_preps()[j]) {
                (None, None) => true,
                (Some(a), Some(b)) => a.intersects(b),
                _ => false,
            };
            !consumed[j] && candidate.category == slot.category && compatible
        });

        if let Some(j) = found {
            consumed[j] = true;
            slot_assocs[i] = Some(j);
            matched += 1;
        }
    }

    Alignment {
        matched,
        slot_assocs,
    }
}

/// Element-by-element walk of both frames
///
/// With `sync_predicates`, a mismatch before either verb makes both cursors
/// jump to their verbs; any other mismatch ends the walk.
fn align_lockstep(occurrence: &Frame, official: &Frame, sync_predicates: bool) -> Alignment {
    let occ = occurrence.structure();
    let off = official.structure();
    let (occ_verb, off_verb) = (occurrence.verb_index(), official.verb_index());

    let mut slot_assocs = vec![None; occurrence.num_slots()];
    let mut matched = 0;
    let (mut i, mut j) = (0, 0);
    let (mut occ_slot, mut off_slot) = (0, 0);

    while i < occ.len() && j < off.len() {
        let (a, b) = (&occ[i], &off[j]);

        if a.matches(b) {
            if a.is_argument() {
                slot_assocs[occ_slot] = Some(off_slot);
                matched += 1;
                occ_slot += 1;
                off_slot += 1;
            }
            i += 1;
            j += 1;
        } else if sync_predicates && i <= occ_verb && j <= off_verb && (i, j) != (occ_verb, off_verb) {
            i = occ_verb;
            j = off_verb;
            occ_slot = occurrence.slots_before(occ_verb);
            off_slot = official.slots_before(off_verb);
        } else {
            break;
        }
    }

    Alignment {
        matched,
        slot_assocs,
    }
}

// ============================================================================
// Restriction Filtering
// ============================================================================

/// Keep only the tied matches whose restrictions best fit the headwords
///
/// Slots are filtered left to right: at each slot with a headword, every
/// remaining match is scored with `match_score` on the restriction it
/// aligns to that slot, and matches below the slot's best score are
/// dropped before the next slot is considered.
pub fn handle_semantic_restrictions(
    occurrence: &mut FrameOccurrence,
    stats: &RestrictionStats,
) -> Result<()> {
    filter_best_matches(occurrence, |restriction, headword| {
        restriction.match_score(headword, stats)
    })
}

/// Keep only the tied matches whose restrictions the lexicon confirms
///
/// Same slot by slot pruning as [`handle_semantic_restrictions`], scoring
/// 1 when the lexicon satisfies the aligned restriction and 0 otherwise.
/// The vacuous restriction is always satisfied.
pub fn restrict_headwords_with_lexicon(
    occurrence: &mut FrameOccurrence,
    lexicon: &dyn SemanticLexicon,
) -> Result<()> {
    filter_best_matches(occurrence, |restriction, headword| {
        if restriction.is_satisfied_by(headword, lexicon) {
            1.0
        } else {
            0.0
        }
    })
}

// A match leaving a slot unaligned is scored against the vacuous restriction.
fn filter_best_matches<F>(occurrence: &mut FrameOccurrence, score: F) -> Result<()>
where
    F: Fn(&Restriction, &str) -> f64,
{
    if occurrence.best_matches.is_empty() {
        return Err(VnsrlError::NoMatches);
    }

    let unrestricted = Restriction::build_empty();
    let before = occurrence.best_matches.len();

    for slot in 0..occurrence.num_slots() {
        let Some(headword) = occurrence.headwords.get(slot).and_then(Option::as_deref) else {
            continue;
        };

        let mut scores = Vec::with_capacity(occurrence.best_matches.len());
        for frame_match in &occurrence.best_matches {
            let restriction = match frame_match.slot_assocs.get(slot).copied().flatten() {
                Some(official) => frame_match.frame.restriction(official)?,
                None => &unrestricted,
            };
            scores.push(score(restriction, headword));
        }

        let best = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut scores = scores.into_iter();
        occurrence
            .best_matches
            .retain(|_| scores.next().is_some_and(|score| score >= best));
    }

    if occurrence.best_matches.len() < before {
        tracing::debug!(
            occurrence = %occurrence.label(),
            before,
            after = occurrence.best_matches.len(),
            "Pruned matches by selectional restrictions"
        );
    }

    occurrence.refresh_roles();
    Ok(())
}

/// Co-occurrence table of restrictions and headwords
///
/// Only occurrences with a single best match contribute: for each aligned
/// slot with a headword, the restriction of its official slot is recorded.
/// Vacuous restrictions and out of range slots are skipped.
pub fn collect_restriction_stats<'a, I>(occurrences: I) -> RestrictionStats
where
    I: IntoIterator<Item = &'a FrameOccurrence>,
{
    let mut stats = RestrictionStats::new();

    for occurrence in occurrences {
        let [frame_match] = occurrence.best_matches.as_slice() else {
            continue;
        };
        for (slot, official) in frame_match.slot_assocs.iter().enumerate() {
            let (Some(official), Some(headword)) =
                (official, occurrence.headwords.get(slot).and_then(Option::as_deref))
            else {
                continue;
            };
            if let Some(restriction) = frame_match.frame.role_restrictions().get(*official) {
                if !restriction.is_empty() {
                    stats.record(restriction, headword);
                }
            }
        }
    }

    stats
}

// ============================================================================
// Tests
// ============================================================================
