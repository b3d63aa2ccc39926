//! Composite-set selection by footprint matching.
//!
//! Sets are atomic. Each step keeps only the unconsumed sets whose footprint
//! fits inside the remaining difficulty quota, picks one uniformly with the
//! run generator, and subtracts its footprint. Running out of candidates is
//! a hard failure; there is no backtracking.

use std::collections::BTreeSet;

use crate::error::AssemblyError;
use crate::model::{CompositeSet, DifficultyCounts};
use crate::rng::SelectionRng;

/// Outcome of choosing composite sets for one section.
#[derive(Debug, Clone)]
pub struct CompositeSelection<'a> {
    /// Chosen sets, in pick order.
    pub sets: Vec<&'a CompositeSet>,
    /// Quota left for standalone topics.
    pub remaining_quota: DifficultyCounts,
}

impl CompositeSelection<'_> {
    /// Summed footprint of every chosen set.
    pub fn consumed_footprint(&self) -> DifficultyCounts {
        self.sets
            .iter()
            .fold(DifficultyCounts::ZERO, |acc, set| acc.saturating_add(&set.footprint()))
    }
}

/// Sets that are still selectable under `quota`, in input order.
///
/// A set is dropped when any member was already consumed by the run, when it
/// was already chosen, or when its footprint exceeds `quota` at any level.
pub fn eligible<'a>(
    candidates: &[&'a CompositeSet],
    quota: &DifficultyCounts,
    consumed: &BTreeSet<String>,
    chosen: &[&'a CompositeSet],
) -> Vec<&'a CompositeSet> {
    candidates
        .iter()
        .copied()
        .filter(|set| !chosen.iter().any(|c| c.set_id == set.set_id))
        .filter(|set| !set.member_ids().any(|id| consumed.contains(id)))
        .filter(|set| set.footprint().fits_within(quota))
        .collect()
}

/// Choose `count` sets from `candidates` without exceeding `quota`.
///
/// `candidates` must be in canonical (set id) order.
pub fn select_composite<'a>(
    candidates: &[&'a CompositeSet],
    count: u32,
    quota: DifficultyCounts,
    consumed: &BTreeSet<String>,
    rng: &mut SelectionRng,
) -> Result<CompositeSelection<'a>, AssemblyError> {
    let mut chosen: Vec<&'a CompositeSet> = Vec::with_capacity(candidates.len().min(count as usize));
    let mut remaining = quota;

    while (chosen.len() as u32) < count {
        let pool = eligible(candidates, &remaining, consumed, &chosen);
        if pool.is_empty() {
            return Err(AssemblyError::NoValidCompositeSet {
                remaining_quota: remaining,
                needed_count: count - chosen.len() as u32,
            });
        }

        let set = pool[rng.pick(pool.len())];
        let footprint = set.footprint();
        remaining = remaining
            .checked_sub(&footprint)
            .ok_or(AssemblyError::NoValidCompositeSet {
                remaining_quota: remaining,
                needed_count: count - chosen.len() as u32,
            })?;
        tracing::debug!(
            set_id = %set.set_id,
            %footprint,
            %remaining,
            candidates = pool.len(),
            "picked composite set"
        );
        chosen.push(set);
    }

    Ok(CompositeSelection {
        sets: chosen,
        remaining_quota: remaining,
    })
}
