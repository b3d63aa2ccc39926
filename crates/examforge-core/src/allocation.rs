//! Proportional difficulty allocation.
//!
//! Every place that splits a question count across difficulty levels goes
//! through [`proportional_split`], so the rounding rule is applied
//! identically everywhere.

use crate::error::AssemblyError;
use crate::model::{Difficulty, DifficultyCounts};

/// Order in which exact remainder ties are broken.
const TIE_PRIORITY: [Difficulty; 3] = [Difficulty::Hard, Difficulty::Medium, Difficulty::Easy];

/// Split `count` questions across difficulties in proportion to `weights`.
///
/// Each level gets the floor of its proportional share; the leftover goes one
/// each to the levels with the largest fractional remainder, exact ties going
/// Hard, then Medium, then Easy. All-zero weights are treated as equal weights.
pub fn proportional_split(count: u32, weights: &DifficultyCounts) -> DifficultyCounts {
    let weights = if weights.is_zero() {
        DifficultyCounts::new(1, 1, 1)
    } else {
        *weights
    };
    let total = u64::from(weights.total());
    let count64 = u64::from(count);

    let mut split = DifficultyCounts::ZERO;
    let mut remainders = [(0u64, Difficulty::Easy); 3];
    for (slot, &difficulty) in TIE_PRIORITY.iter().enumerate() {
        let scaled = count64 * u64::from(weights[difficulty]);
        // Bounded by `count`, so it fits back into u32.
        split[difficulty] = (scaled / total) as u32;
        remainders[slot] = (scaled % total, difficulty);
    }

    // Stable sort keeps TIE_PRIORITY order among equal remainders.
    remainders.sort_by(|a, b| b.0.cmp(&a.0));
    let leftover = count - split.total();
    for &(_, difficulty) in remainders.iter().take(leftover as usize) {
        split[difficulty] += 1;
    }
    split
}

/// Split a standalone budget across topics.
///
/// Topics are processed in the given order. Each topic is split in proportion
/// to the budget still unassigned, which keeps every split within the budget
/// and makes the topic splits sum to the budget exactly.
pub fn apportion_topics<'a>(
    topics: impl IntoIterator<Item = (&'a str, u32)>,
    budget: DifficultyCounts,
) -> Result<Vec<(&'a str, DifficultyCounts)>, AssemblyError> {
    let topics: Vec<(&str, u32)> = topics.into_iter().collect();
    let requested: u32 = topics.iter().map(|(_, c)| c).sum();
    if requested != budget.total() {
        return Err(AssemblyError::blueprint(
            None,
            "standalone topic counts do not match remaining difficulty budget",
            budget.total(),
            requested,
        ));
    }

    let mut remaining = budget;
    let mut out = Vec::with_capacity(topics.len());
    for (topic, count) in topics {
        let split = proportional_split(count, &remaining);
        remaining = remaining.checked_sub(&split).ok_or_else(|| {
            AssemblyError::blueprint(
                None,
                format!("difficulty split for topic '{topic}' exceeds remaining budget"),
                remaining,
                split,
            )
        })?;
        tracing::debug!(topic, %split, %remaining, "apportioned topic");
        out.push((topic, split));
    }
    Ok(out)
}
