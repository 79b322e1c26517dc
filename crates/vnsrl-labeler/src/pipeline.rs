//! Labeling pipeline
//!
//! Chains the stages over a corpus: frame matching, optional restriction
//! filtering, then probability model or bootstrap disambiguation.
//! Occurrences with data problems are recorded in the run's diagnostics
//! and left out; only configuration-level failures abort the run.

use serde::{Deserialize, Serialize};
use vnsrl_core::{
    Diagnostic, DiagnosticKind, Diagnostics, FrameInstance, LabeledFrame, LabelerConfig,
    ProbabilityLevel, Result, VnsrlError,
};
use vnsrl_verbnet::{FrameOccurrence, SemanticLexicon, VerbnetCatalogue};

use crate::bootstrap::{count_ambiguous, Bootstrap, BootstrapReport};
use crate::matcher::{
    collect_restriction_stats, handle_semantic_restrictions, restrict_headwords_with_lexicon,
    FrameMatcher,
};
use crate::probability::ProbabilityModel;

/// Everything a labeling run produces
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelingRun {
    /// One entry per occurrence that was not skipped, in corpus order
    pub outputs: Vec<LabeledFrame>,

    pub diagnostics: Diagnostics,

    /// Present when the bootstrap loop ran
    pub bootstrap: Option<BootstrapReport>,
}

impl LabelingRun {
    pub fn resolved_slots(&self) -> usize {
        self.outputs.iter().map(LabeledFrame::resolved_count).sum()
    }

    pub fn ambiguous_slots(&self) -> usize {
        self.outputs.iter().map(LabeledFrame::ambiguous_count).sum()
    }
}

/// Runs the labeling stages over a corpus
pub struct Labeler<'a> {
    config: LabelerConfig,
    catalogue: &'a VerbnetCatalogue,
    lexicon: Option<&'a dyn SemanticLexicon>,
    matcher: FrameMatcher,
}

impl<'a> Labeler<'a> {
    pub fn new(config: LabelerConfig, catalogue: &'a VerbnetCatalogue) -> Self {
        let matcher = FrameMatcher::new(config.matching.algorithm);
        Self {
            config,
            catalogue,
            lexicon: None,
            matcher,
        }
    }

    /// Lexicon consulted when lexicon-based restriction filtering is on
    pub fn with_lexicon(mut self, lexicon: &'a dyn SemanticLexicon) -> Self {
        self.lexicon = Some(lexicon);
        self
    }

    pub fn config(&self) -> &LabelerConfig {
        &self.config
    }

    /// Label every instance of a corpus
    pub fn label(&self, instances: &[FrameInstance]) -> Result<LabelingRun> {
        let mut diagnostics = Diagnostics::new();

        tracing::info!(
            instances = instances.len(),
            algorithm = %self.config.matching.algorithm,
            "Matching corpus against VerbNet frames"
        );

        let mut occurrences = Vec::with_capacity(instances.len());
        for instance in instances {
            match self.match_instance(instance) {
                Ok(occurrence) => {
                    if occurrence.num_slots() > 0 && occurrence.roles.iter().all(|r| r.is_empty()) {
                        diagnostics.record(Diagnostic::new(
                            DiagnosticKind::NoFrameMatched,
                            occurrence.label(),
                            format!("no frame matched {}", occurrence.frame()),
                        ));
                    }
                    occurrences.push(occurrence);
                }
                Err(e) => skip(&mut diagnostics, instance.label(), e)?,
            }
        }

        if self.config.matching.wordnet_restrictions {
            match self.lexicon {
                Some(lexicon) => {
                    occurrences = filter_stage(occurrences, &mut diagnostics, |occ| {
                        restrict_headwords_with_lexicon(occ, lexicon)
                    })?;
                }
                None => tracing::warn!("Lexicon restriction filtering enabled without a lexicon"),
            }
        }

        if self.config.matching.semantic_restrictions {
            let stats = collect_restriction_stats(&occurrences);
            tracing::debug!(entries = stats.len(), "Collected restriction statistics");
            occurrences = filter_stage(occurrences, &mut diagnostics, |occ| {
                handle_semantic_restrictions(occ, &stats)
            })?;
        }

        let mut model = ProbabilityModel::new();
        let bootstrap = if self.config.bootstrap.enabled {
            let report = Bootstrap::new(self.config.bootstrap.clone())?.run(&mut occurrences, &mut model);
            Some(report)
        } else {
            if self.config.model.level.is_some() {
                train(&occurrences, &mut model);
            }
            None
        };

        if let Some(level) = self.config.model.level {
            let resolved = resolve_with_model(&mut occurrences, &model, level);
            tracing::info!(level = %level, resolved, "Resolved slots with probability model");
        }

        let run = LabelingRun {
            outputs: occurrences.into_iter().map(FrameOccurrence::into_labeled).collect(),
            diagnostics,
            bootstrap,
        };

        tracing::info!(
            labeled = run.outputs.len(),
            resolved = run.resolved_slots(),
            ambiguous = run.ambiguous_slots(),
            diagnostics = %run.diagnostics.summary(),
            "Labeling finished"
        );
        Ok(run)
    }

    /// Build an instance's occurrence and match it against its frames
    pub fn match_instance(&self, instance: &FrameInstance) -> Result<FrameOccurrence> {
        let mut occurrence = FrameOccurrence::from_instance(instance)?;
        let candidates = self.catalogue.candidate_frames(
            &instance.predicate.lemma,
            self.config.matching.passivize,
            self.config.matching.relatives,
        )?;
        self.matcher.match_occurrence(&mut occurrence, &candidates);
        Ok(occurrence)
    }
}

/// Record a per-occurrence data error, or propagate anything else
fn skip(diagnostics: &mut Diagnostics, occurrence: String, error: VnsrlError) -> Result<()> {
    match Diagnostic::from_error(occurrence, &error) {
        Some(diagnostic) => {
            tracing::warn!(
                occurrence = %diagnostic.occurrence,
                kind = %diagnostic.kind,
                "Skipping occurrence: {}",
                diagnostic.message
            );
            diagnostics.record(diagnostic);
            Ok(())
        }
        None => Err(error),
    }
}

/// Apply a filter to every matched occurrence, dropping those that fail
fn filter_stage<F>(
    occurrences: Vec<FrameOccurrence>,
    diagnostics: &mut Diagnostics,
    mut filter: F,
) -> Result<Vec<FrameOccurrence>>
where
    F: FnMut(&mut FrameOccurrence) -> Result<()>,
{
    let mut kept = Vec::with_capacity(occurrences.len());
    for mut occurrence in occurrences {
        if occurrence.best_matches.is_empty() {
            kept.push(occurrence);
            continue;
        }
        match filter(&mut occurrence) {
            Ok(()) => kept.push(occurrence),
            Err(e) => skip(diagnostics, occurrence.label(), e)?,
        }
    }
    Ok(kept)
}

/// Train on every slot with exactly one candidate role
fn train(occurrences: &[FrameOccurrence], model: &mut ProbabilityModel) {
    for occurrence in occurrences {
        for (slot, roles) in occurrence.roles.iter().enumerate() {
            if roles.len() != 1 {
                continue;
            }
            if let Some(role) = roles.iter().next() {
                let prep = occurrence.frame().slot_preps()[slot].as_ref().map(|p| p.key());
                model.add_data(
                    occurrence.frame().slot_types()[slot],
                    role,
                    prep.as_deref(),
                    &occurrence.predicate,
                );
            }
        }
    }
}

/// Collapse ambiguous slots along the backoff chain from `level`
fn resolve_with_model(
    occurrences: &mut [FrameOccurrence],
    model: &ProbabilityModel,
    level: ProbabilityLevel,
) -> usize {
    let before = count_ambiguous(occurrences);
    for occurrence in occurrences.iter_mut() {
        for slot in 0..occurrence.roles.len() {
            if occurrence.roles[slot].len() < 2 {
                continue;
            }
            let slot_class = occurrence.frame().slot_types()[slot];
            let prep = occurrence.frame().slot_preps()[slot].as_ref().map(|p| p.key());

            if let Some((role, used)) = model.best_role_with_backoff(
                &occurrence.roles[slot],
                slot_class,
                prep.as_deref(),
                &occurrence.predicate,
                level,
            ) {
                tracing::debug!(
                    occurrence = %occurrence.label(),
                    slot,
                    role = %role,
                    level = %used,
                    "Resolved slot"
                );
                occurrence.roles[slot] = [role].into_iter().collect();
            }
        }
    }
    before - count_ambiguous(occurrences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vnsrl_core::{Argument, MatchingAlgorithm, Span};
    use vnsrl_verbnet::WordClassLexicon;

    const CATALOGUE: &str = r#"{
        "cut": [
            {"vnclass": "cut-21.1", "syntax": "NP.Agent V NP.Patient",
             "restrictions": {"Agent": "int_control"}},
            {"vnclass": "cut-21.1", "syntax": "NP.Instrument V NP.Patient",
             "restrictions": {"Instrument": "solid"}}
        ]
    }"#;

    fn cut(id: &str, subject: &str) -> FrameInstance {
        FrameInstance::new(
            format!("{subject} cut the bread"),
            "cut",
            Span::new(subject.len() + 1, subject.len() + 4),
            vec![
                Argument::new(subject, Span::new(0, subject.len()), "NP").with_headword(subject),
                Argument::new("the bread", Span::new(subject.len() + 5, subject.len() + 14), "NP")
                    .with_headword("bread"),
            ],
        )
        .with_id(id)
    }

    #[test]
    fn test_label_plain_matching() {
        let catalogue = VerbnetCatalogue::from_json_str(CATALOGUE).unwrap();
        let labeler = Labeler::new(LabelerConfig::default(), &catalogue);

        let run = labeler.label(&[cut("s1", "john")]).unwrap();
        assert_eq!(run.outputs.len(), 1);
        assert_eq!(run.outputs[0].best_score, Some(200));
        assert_eq!(run.outputs[0].ambiguous_count(), 1);
        assert_eq!(run.outputs[0].resolved_count(), 1);
        assert!(run.diagnostics.is_empty());
        assert!(run.bootstrap.is_none());
    }

    #[test]
    fn test_label_skips_unknown_predicates() {
        let catalogue = VerbnetCatalogue::from_json_str(CATALOGUE).unwrap();
        let labeler = Labeler::new(LabelerConfig::default(), &catalogue);

        let mut unknown = cut("s2", "john");
        unknown.predicate.lemma = "zorp".into();

        let run = labeler.label(&[cut("s1", "john"), unknown]).unwrap();
        assert_eq!(run.outputs.len(), 1);
        assert_eq!(run.diagnostics.count(DiagnosticKind::MissingPredicate), 1);
        assert_eq!(run.diagnostics.entries()[0].occurrence, "s2");
    }

    #[test]
    fn test_label_with_default_model() {
        let catalogue = VerbnetCatalogue::from_json_str(CATALOGUE).unwrap();
        let mut config = LabelerConfig::default();
        config.model.level = Some(ProbabilityLevel::Default);

        let run = Labeler::new(config, &catalogue).label(&[cut("s1", "john")]).unwrap();
        let agent: Vec<&str> = run.outputs[0].roles[0].iter().map(String::as_str).collect();
        assert_eq!(agent, vec!["Agent"]);
        assert_eq!(run.ambiguous_slots(), 0);
    }

    #[test]
    fn test_label_with_lexicon() {
        let catalogue = VerbnetCatalogue::from_json_str(CATALOGUE).unwrap();
        let lexicon =
            WordClassLexicon::from_json_str(r#"{"knife": ["solid"], "john": ["int_control"]}"#).unwrap();
        let mut config = LabelerConfig::default();
        config.matching.wordnet_restrictions = true;

        let run = Labeler::new(config, &catalogue)
            .with_lexicon(&lexicon)
            .label(&[cut("s1", "john"), cut("s2", "knife")])
            .unwrap();

        let first: Vec<&str> = run.outputs[0].roles[0].iter().map(String::as_str).collect();
        let second: Vec<&str> = run.outputs[1].roles[0].iter().map(String::as_str).collect();
        assert_eq!(first, vec!["Agent"]);
        assert_eq!(second, vec!["Instrument"]);
    }

    #[test]
    fn test_label_rejects_runaway_bootstrap() {
        let catalogue = VerbnetCatalogue::from_json_str(CATALOGUE).unwrap();
        let mut config = LabelerConfig::default();
        config.bootstrap.enabled = true;
        config.bootstrap.step = 1e-12;

        let result = Labeler::new(config, &catalogue).label(&[cut("s1", "john")]);
        assert!(matches!(result, Err(VnsrlError::Config(_))));
    }

    #[test]
    fn test_label_records_unmatched_frames() {
        let catalogue = VerbnetCatalogue::from_json_str(r#"{"cut": []}"#).unwrap();
        let mut config = LabelerConfig::default();
        config.matching.algorithm = MatchingAlgorithm::StopOnFail;

        let run = Labeler::new(config, &catalogue).label(&[cut("s1", "john")]).unwrap();
        assert_eq!(run.outputs.len(), 1);
        assert_eq!(run.diagnostics.count(DiagnosticKind::NoFrameMatched), 1);
        assert!(run.outputs[0].roles.iter().all(|r| r.is_empty()));
    }
}
