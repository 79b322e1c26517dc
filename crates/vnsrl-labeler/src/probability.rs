//! Backoff probability model
//!
//! Role frequency tables at three granularities: slot class, slot class
//! with preposition, and predicate with slot class and preposition. A
//! fourth level needs no data and maps each slot class to a canonical role.
//! Queries never answer outside the caller's candidate roles.

use std::collections::{BTreeMap, HashMap};

use vnsrl_core::{ProbabilityLevel, Role, RoleSet, SlotClass, NO_PREP};

/// Observed count per role, ordered by role name
pub type RoleCounts = BTreeMap<Role, u32>;

/// Frequency tables trained from confidently labeled slots
#[derive(Debug, Clone, Default)]
pub struct ProbabilityModel {
    slot_class: HashMap<SlotClass, RoleCounts>,
    slot: HashMap<(SlotClass, String), RoleCounts>,
    predicate_slot: HashMap<(String, SlotClass, String), RoleCounts>,
    observations: usize,
}

/// Preposition dimension of the keys; collapses for non-prepositional slots
fn prep_key(slot_class: SlotClass, preposition: Option<&str>) -> String {
    match (slot_class, preposition) {
        (SlotClass::PrepObject, Some(prep)) => prep.to_lowercase(),
        _ => NO_PREP.to_string(),
    }
}

fn bump(counts: &mut RoleCounts, role: &str) {
    *counts.entry(role.to_string()).or_insert(0) += 1;
}

impl ProbabilityModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one slot labeled with a single role, at every level
    pub fn add_data(
        &mut self,
        slot_class: SlotClass,
        role: &str,
        preposition: Option<&str>,
        predicate: &str,
    ) {
        let prep = prep_key(slot_class, preposition);

        bump(self.slot_class.entry(slot_class).or_default(), role);
        bump(self.slot.entry((slot_class, prep.clone())).or_default(), role);
        bump(
            self.predicate_slot
                .entry((predicate.to_lowercase(), slot_class, prep))
                .or_default(),
            role,
        );

        self.observations += 1;
    }

    /// Number of `add_data` calls folded into the model
    pub fn observations(&self) -> usize {
        self.observations
    }

    pub fn is_empty(&self) -> bool {
        self.observations == 0
    }

    /// Raw table for a key at one level; `None` at the default level
    pub fn counts(
        &self,
        level: ProbabilityLevel,
        slot_class: SlotClass,
        preposition: Option<&str>,
        predicate: &str,
    ) -> Option<&RoleCounts> {
        match level {
            ProbabilityLevel::Default => None,
            ProbabilityLevel::SlotClass => self.slot_class.get(&slot_class),
            ProbabilityLevel::Slot => self
                .slot
                .get(&(slot_class, prep_key(slot_class, preposition))),
            ProbabilityLevel::PredicateSlot => self.predicate_slot.get(&(
                predicate.to_lowercase(),
                slot_class,
                prep_key(slot_class, preposition),
            )),
        }
    }

    /// Candidate roles with data at a level, most frequent first
    ///
    /// Equal counts are ordered by role name.
    pub fn ranked_roles(
        &self,
        candidates: &RoleSet,
        slot_class: SlotClass,
        preposition: Option<&str>,
        predicate: &str,
        level: ProbabilityLevel,
    ) -> Vec<(Role, u32)> {
        let Some(counts) = self.counts(level, slot_class, preposition, predicate) else {
            return Vec::new();
        };

        let mut ranked: Vec<(Role, u32)> = counts
            .iter()
            .filter(|(role, count)| **count > 0 && candidates.contains(*role))
            .map(|(role, count)| (role.clone(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    /// Most likely candidate role at one level, or `None` for no decision
    pub fn best_role(
        &self,
        candidates: &RoleSet,
        slot_class: SlotClass,
        preposition: Option<&str>,
        predicate: &str,
        level: ProbabilityLevel,
    ) -> Option<Role> {
        if level == ProbabilityLevel::Default {
            let role = slot_class.default_role();
            return candidates.contains(role).then(|| role.to_string());
        }

        self.ranked_roles(candidates, slot_class, preposition, predicate, level)
            .into_iter()
            .next()
            .map(|(role, _)| role)
    }

    /// First decision along the backoff chain starting at `level`
    pub fn best_role_with_backoff(
        &self,
        candidates: &RoleSet,
        slot_class: SlotClass,
        preposition: Option<&str>,
        predicate: &str,
        level: ProbabilityLevel,
    ) -> Option<(Role, ProbabilityLevel)> {
        level.backoff_chain().into_iter().find_map(|level| {
            self.best_role(candidates, slot_class, preposition, predicate, level)
                .map(|role| (role, level))
        })
    }

    /// Fold another model's counts into this one
    pub fn merge(&mut self, other: ProbabilityModel) {
        fn merge_table<K: std::hash::Hash + Eq>(
            into: &mut HashMap<K, RoleCounts>,
            from: HashMap<K, RoleCounts>,
        ) {
            for (key, counts) in from {
                let target = into.entry(key).or_default();
                for (role, count) in counts {
                    *target.entry(role).or_insert(0) += count;
                }
            }
        }

        merge_table(&mut self.slot_class, other.slot_class);
        merge_table(&mut self.slot, other.slot);
        merge_table(&mut self.predicate_slot, other.predicate_slot);
        self.observations += other.observations;
    }
}
