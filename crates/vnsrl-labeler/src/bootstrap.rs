//! Bootstrap loop
//!
//! Self-training over the whole corpus. Every pass first commits the slots
//! that became unambiguous to the probability model, then asks the model
//! to resolve the remaining ambiguous slots, accepting only confident
//! answers. The confidence threshold decays each pass until the final
//! relaxed passes accept any decision.
//!
//! Role sets only ever shrink, so the number of ambiguous slots is
//! non-increasing across passes.
//!
//! Author: hephaex@gmail.com

use serde::{Deserialize, Serialize};
use vnsrl_core::{BootstrapConfig, EvidenceThresholds, ProbabilityLevel, Result, Role, RoleSet};
use vnsrl_verbnet::FrameOccurrence;

use crate::probability::ProbabilityModel;

/// Levels consulted for each ambiguous slot, finest first
pub const BOOTSTRAP_LEVELS: [ProbabilityLevel; 3] = [
    ProbabilityLevel::PredicateSlot,
    ProbabilityLevel::Slot,
    ProbabilityLevel::SlotClass,
];

/// Statistics of one bootstrap pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapIteration {
    pub iteration: usize,

    /// Log-ratio threshold in effect
    pub ratio: f64,

    /// Whether any model decision was accepted
    pub relaxed: bool,

    /// Slots committed to the model at the start of the pass
    pub committed: usize,

    /// Slots collapsed to a single role during the pass
    pub resolved: usize,

    /// Ambiguous slots left after the pass
    pub ambiguous: usize,
}

/// Outcome of a full bootstrap run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapReport {
    pub initial_ambiguous: usize,
    pub iterations: Vec<BootstrapIteration>,
}

impl BootstrapReport {
    pub fn final_ambiguous(&self) -> usize {
        self.iterations
            .last()
            .map_or(self.initial_ambiguous, |it| it.ambiguous)
    }

    pub fn total_resolved(&self) -> usize {
        self.iterations.iter().map(|it| it.resolved).sum()
    }
}

/// Number of slots holding more than one candidate role
pub fn count_ambiguous(occurrences: &[FrameOccurrence]) -> usize {
    occurrences
        .iter()
        .flat_map(|occ| occ.roles.iter())
        .filter(|roles| roles.len() > 1)
        .count()
}

/// Iterative self-training driver
#[derive(Debug, Clone)]
pub struct Bootstrap {
    config: BootstrapConfig,
}

impl Bootstrap {
    /// Driver for a validated schedule
    pub fn new(config: BootstrapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Run every pass over the corpus, training `model` along the way
    pub fn run(
        &self,
        occurrences: &mut [FrameOccurrence],
        model: &mut ProbabilityModel,
    ) -> BootstrapReport {
        let mut committed: Vec<Vec<bool>> = occurrences
            .iter()
            .map(|occ| vec![false; occ.roles.len()])
            .collect();

        let mut report = BootstrapReport {
            initial_ambiguous: count_ambiguous(occurrences),
            iterations: Vec::new(),
        };

        for iteration in 0..self.config.iterations() {
            let ratio = self.config.ratio_at(iteration);
            if ratio <= 0.0 {
                break;
            }
            let relaxed = ratio <= self.config.relaxed_ratio;
            let thresholds = if relaxed {
                EvidenceThresholds::relaxed()
            } else {
                self.config.min_evidence
            };

            let newly_committed = commit_resolved(occurrences, &mut committed, model);
            let resolved = resolve_ambiguous(occurrences, model, ratio, relaxed, &thresholds);
            let ambiguous = count_ambiguous(occurrences);

            tracing::info!(
                iteration,
                ratio,
                relaxed,
                committed = newly_committed,
                resolved,
                ambiguous,
                "Bootstrap iteration"
            );

            report.iterations.push(BootstrapIteration {
                iteration,
                ratio,
                relaxed,
                committed: newly_committed,
                resolved,
                ambiguous,
            });
        }

        report
    }
}

/// Train the model on single-role slots not yet committed
fn commit_resolved(
    occurrences: &[FrameOccurrence],
    committed: &mut [Vec<bool>],
    model: &mut ProbabilityModel,
) -> usize {
    let mut count = 0;
    for (occ, flags) in occurrences.iter().zip(committed.iter_mut()) {
        for (slot, roles) in occ.roles.iter().enumerate() {
            if flags[slot] || roles.len() != 1 {
                continue;
            }
            let Some(role) = roles.iter().next() else {
                continue;
            };
            let prep = occ.frame().slot_preps()[slot].as_ref().map(|p| p.key());
            model.add_data(
                occ.frame().slot_types()[slot],
                role,
                prep.as_deref(),
                &occ.predicate,
            );
            flags[slot] = true;
            count += 1;
        }
    }
    count
}

/// Collapse ambiguous slots the model is confident about
fn resolve_ambiguous(
    occurrences: &mut [FrameOccurrence],
    model: &ProbabilityModel,
    ratio: f64,
    relaxed: bool,
    thresholds: &EvidenceThresholds,
) -> usize {
    let mut resolved = 0;
    for occ in occurrences.iter_mut() {
        for slot in 0..occ.roles.len() {
            if occ.roles[slot].len() < 2 {
                continue;
            }
            let slot_class = occ.frame().slot_types()[slot];
            let prep = occ.frame().slot_preps()[slot].as_ref().map(|p| p.key());

            let decision = BOOTSTRAP_LEVELS.iter().find_map(|&level| {
                let ranked = model.ranked_roles(
                    &occ.roles[slot],
                    slot_class,
                    prep.as_deref(),
                    &occ.predicate,
                    level,
                );
                accept(&ranked, level, ratio, relaxed, thresholds)
            });

            if let Some(role) = decision {
                occ.roles[slot] = RoleSet::from([role]);
                resolved += 1;
            }
        }
    }
    resolved
}

/// Decision rule for one level
///
/// Strict passes need two competing roles, enough evidence for the winner
/// and a log count ratio above the threshold. Relaxed passes take any
/// answer.
fn accept(
    ranked: &[(Role, u32)],
    level: ProbabilityLevel,
    ratio: f64,
    relaxed: bool,
    thresholds: &EvidenceThresholds,
) -> Option<Role> {
    let (top, top_count) = ranked.first()?;
    if relaxed {
        return Some(top.clone());
    }

    let (_, second_count) = ranked.get(1)?;
    if *top_count < thresholds.for_level(level) {
        return None;
    }
    let log_ratio = (*top_count as f64 / *second_count as f64).ln();
    (log_ratio > ratio).then(|| top.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use vnsrl_core::VnsrlError;
    use vnsrl_verbnet::Frame;

    fn roles(names: &[&str]) -> RoleSet {
        names.iter().map(|r| r.to_string()).collect()
    }

    fn occurrence(predicate: &str, notation: &str, slot_roles: &[&[&str]]) -> FrameOccurrence {
        let frame: Frame = notation.parse().unwrap();
        let mut occ = FrameOccurrence::new(predicate, frame);
        occ.roles = slot_roles.iter().map(|r| roles(r)).collect();
        occ
    }

    fn enabled() -> BootstrapConfig {
        BootstrapConfig {
            enabled: true,
            ..BootstrapConfig::default()
        }
    }

    #[test]
    fn test_accept_rule() {
        let thresholds = EvidenceThresholds::default();
        let ranked = vec![("Agent".to_string(), 30), ("Theme".to_string(), 1)];

        // ln(30) is about 3.4
        assert_eq!(accept(&ranked, ProbabilityLevel::Slot, 3.0, false, &thresholds), Some("Agent".into()));
        assert_eq!(accept(&ranked, ProbabilityLevel::Slot, 4.0, false, &thresholds), None);

        let weak = vec![("Agent".to_string(), 4), ("Theme".to_string(), 0)];
        assert_eq!(accept(&weak[..1], ProbabilityLevel::Slot, 0.5, false, &thresholds), None);
        assert_eq!(accept(&weak[..1], ProbabilityLevel::Slot, 0.5, true, &thresholds), Some("Agent".into()));

        let sparse = vec![("Agent".to_string(), 4), ("Theme".to_string(), 1)];
        assert_eq!(accept(&sparse, ProbabilityLevel::SlotClass, 1.2, false, &thresholds), None);
        assert_eq!(accept(&sparse, ProbabilityLevel::PredicateSlot, 1.2, false, &thresholds), Some("Agent".into()));
        assert_eq!(accept(&[], ProbabilityLevel::Slot, 0.5, true, &thresholds), None);
    }

    #[test]
    fn test_run_resolves_from_committed_evidence() {
        let mut occurrences = vec![
            occurrence("eat", "NP V NP", &[&["Agent"], &["Patient"]]),
            occurrence("eat", "NP V NP", &[&["Agent"], &["Patient"]]),
            occurrence("eat", "NP V NP", &[&["Agent", "Instrument"], &["Patient"]]),
        ];
        let mut model = ProbabilityModel::new();

        let report = Bootstrap::new(enabled()).unwrap().run(&mut occurrences, &mut model);

        assert_eq!(report.iterations.len(), 16);
        assert_eq!(report.initial_ambiguous, 1);
        assert_eq!(report.final_ambiguous(), 0);
        assert_eq!(report.total_resolved(), 1);
        assert_eq!(occurrences[2].roles[0], roles(&["Agent"]));
        assert!(report.iterations.last().unwrap().relaxed);
        // every single-role slot is committed in the first pass
        assert_eq!(report.iterations[0].committed, 5);
        assert_eq!(model.observations(), 6);
    }

    #[test]
    fn test_run_leaves_slots_without_evidence() {
        let mut occurrences = vec![occurrence("eat", "NP V", &[&["Agent", "Instrument"]])];
        let mut model = ProbabilityModel::new();

        let report = Bootstrap::new(enabled()).unwrap().run(&mut occurrences, &mut model);
        assert_eq!(report.final_ambiguous(), 1);
        assert!(model.is_empty());
    }

    #[test]
    fn test_run_honours_custom_schedule() {
        let config = BootstrapConfig {
            start_ratio: 2.0,
            step: 1.0,
            ..enabled()
        };
        let report = Bootstrap::new(config).unwrap().run(&mut [], &mut ProbabilityModel::new());
        let ratios: Vec<f64> = report.iterations.iter().map(|it| it.ratio).collect();
        assert_eq!(ratios, vec![2.0, 1.0]);
        assert_eq!(report.iterations.iter().filter(|it| it.relaxed).count(), 1);
    }

    #[test]
    fn test_new_rejects_invalid_schedule() {
        for step in [0.0, -1.0, 1e-12, f64::NAN] {
            let config = BootstrapConfig { step, ..enabled() };
            assert!(matches!(Bootstrap::new(config), Err(VnsrlError::Config(_))));
        }
    }

    fn arb_roles() -> impl Strategy<Value = Vec<String>> {
        proptest::sample::subsequence(
            vec![
                "Agent".to_string(),
                "Theme".to_string(),
                "Instrument".to_string(),
                "Location".to_string(),
            ],
            1..4,
        )
    }

    fn arb_occurrence() -> impl Strategy<Value = FrameOccurrence> {
        (
            prop_oneof![Just("cut"), Just("eat"), Just("hit")],
            prop_oneof![Just("NP V"), Just("NP V NP"), Just("NP V NP with NP")],
        )
            .prop_flat_map(|(predicate, notation)| {
                let frame: Frame = notation.parse().unwrap();
                let slots = frame.num_slots();
                proptest::collection::vec(arb_roles(), slots).prop_map(move |slot_roles| {
                    let mut occ = FrameOccurrence::new(predicate, frame.clone());
                    occ.roles = slot_roles.into_iter().map(|r| r.into_iter().collect()).collect();
                    occ
                })
            })
    }

    proptest! {
        #[test]
        fn prop_ambiguity_never_increases(
            mut occurrences in proptest::collection::vec(arb_occurrence(), 0..12)
        ) {
            let before: Vec<RoleSet> = occurrences.iter().flat_map(|o| o.roles.clone()).collect();
            let report = Bootstrap::new(enabled()).unwrap().run(&mut occurrences, &mut ProbabilityModel::new());

            let mut previous = report.initial_ambiguous;
            for iteration in &report.iterations {
                prop_assert!(iteration.ambiguous <= previous);
                previous = iteration.ambiguous;
            }

            let after: Vec<RoleSet> = occurrences.iter().flat_map(|o| o.roles.clone()).collect();
            for (old, new) in before.iter().zip(&after) {
                prop_assert!(new.is_subset(old));
                prop_assert!(!new.is_empty());
            }
        }
    }
}
