//! Standalone question selection.

use std::collections::BTreeSet;

use crate::error::AssemblyError;
use crate::model::{Difficulty, DifficultyCounts, Question};
use crate::rng::SelectionRng;

/// Draw exactly `need` questions for `topic` without replacement.
///
/// `candidates` must be in canonical (id) order. Questions whose ids are in
/// `consumed` are skipped. Each difficulty level is drawn independently,
/// Easy first, and the result lists picks in that order.
pub fn select_standalone<'a>(
    topic: &str,
    candidates: &[&'a Question],
    need: DifficultyCounts,
    consumed: &BTreeSet<String>,
    rng: &mut SelectionRng,
) -> Result<Vec<&'a Question>, AssemblyError> {
    let mut picked = Vec::with_capacity(candidates.len().min(need.total() as usize));

    for (difficulty, required) in need.iter() {
        if required == 0 {
            continue;
        }
        let bucket = unconsumed(candidates, difficulty, consumed);
        let available = bucket.len() as u32;
        if available < required {
            return Err(AssemblyError::InsufficientQuestions {
                topic: topic.to_string(),
                difficulty,
                required,
                available,
                missing: required - available,
            });
        }

        for idx in rng.sample_indices(bucket.len(), required as usize) {
            picked.push(bucket[idx]);
        }
        tracing::debug!(topic, %difficulty, required, available, "drew standalone questions");
    }

    Ok(picked)
}

/// Unconsumed candidates of one difficulty, in input order.
pub fn unconsumed<'a>(
    candidates: &[&'a Question],
    difficulty: Difficulty,
    consumed: &BTreeSet<String>,
) -> Vec<&'a Question> {
    candidates
        .iter()
        .copied()
        .filter(|q| q.difficulty == difficulty && !consumed.contains(&q.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::question;

    fn topic_pool() -> Vec<Question> {
        let mut out = Vec::new();
        for i in 0..6 {
            out.push(question(&format!("E{i}"), "Syllogism", Difficulty::Easy));
        }
        for i in 0..6 {
            out.push(question(&format!("M{i}"), "Syllogism", Difficulty::Medium));
        }
        for i in 0..3 {
            out.push(question(&format!("H{i}"), "Syllogism", Difficulty::Hard));
        }
        out
    }

    #[test]
    fn draws_exact_breakdown() {
        let pool = topic_pool();
        let refs: Vec<&Question> = pool.iter().collect();
        let mut rng = SelectionRng::from_test_id("T1");
        let picked = select_standalone(
            "Syllogism",
            &refs,
            DifficultyCounts::new(2, 4, 2),
            &BTreeSet::new(),
            &mut rng,
        )
        .unwrap();

        assert_eq!(picked.len(), 8);
        assert_eq!(DifficultyCounts::tally(picked.iter().copied()), DifficultyCounts::new(2, 4, 2));
        let ids: BTreeSet<_> = picked.iter().map(|q| &q.id).collect();
        assert_eq!(ids.len(), 8);
    }

    #[test]
    fn insufficient_hard_reports_missing() {
        let pool = topic_pool();
        let refs: Vec<&Question> = pool.iter().collect();
        let mut rng = SelectionRng::from_test_id("T1");
        let err = select_standalone(
            "Syllogism",
            &refs,
            DifficultyCounts::new(0, 0, 5),
            &BTreeSet::new(),
            &mut rng,
        )
        .unwrap_err();

        assert_eq!(
            err,
            AssemblyError::InsufficientQuestions {
                topic: "Syllogism".into(),
                difficulty: Difficulty::Hard,
                required: 5,
                available: 3,
                missing: 2,
            }
        );
    }

    #[test]
    fn huge_request_from_tiny_pool_reports_shortfall() {
        let pool = vec![question("E0", "Syllogism", Difficulty::Easy)];
        let refs: Vec<&Question> = pool.iter().collect();
        let mut rng = SelectionRng::from_test_id("T1");
        let err = select_standalone(
            "Syllogism",
            &refs,
            DifficultyCounts::new(u32::MAX, 0, 0),
            &BTreeSet::new(),
            &mut rng,
        )
        .unwrap_err();

        assert_eq!(
            err,
            AssemblyError::InsufficientQuestions {
                topic: "Syllogism".into(),
                difficulty: Difficulty::Easy,
                required: u32::MAX,
                available: 1,
                missing: u32::MAX - 1,
            }
        );
    }

    #[test]
    fn consumed_questions_are_skipped() {
        let pool = topic_pool();
        let refs: Vec<&Question> = pool.iter().collect();
        let consumed: BTreeSet<String> = ["H0".to_string(), "H1".to_string()].into_iter().collect();
        let mut rng = SelectionRng::from_test_id("T1");

        let picked = select_standalone(
            "Syllogism",
            &refs,
            DifficultyCounts::new(0, 0, 1),
            &consumed,
            &mut rng,
        )
        .unwrap();
        assert_eq!(picked[0].id, "H2");

        let err = select_standalone(
            "Syllogism",
            &refs,
            DifficultyCounts::new(0, 0, 2),
            &consumed,
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AssemblyError::InsufficientQuestions { available: 1, missing: 1, .. }
        ));
    }

    #[test]
    fn never_substitutes_other_difficulties() {
        let pool = topic_pool();
        let refs: Vec<&Question> = pool.iter().collect();
        let mut rng = SelectionRng::from_test_id("T1");
        // Plenty of Easy and Medium, but Hard is short.
        let result = select_standalone(
            "Syllogism",
            &refs,
            DifficultyCounts::new(1, 1, 4),
            &BTreeSet::new(),
            &mut rng,
        );
        assert!(result.is_err());
    }

    #[test]
    fn same_seed_same_picks() {
        let pool = topic_pool();
        let refs: Vec<&Question> = pool.iter().collect();
        let need = DifficultyCounts::new(3, 3, 1);
        let draw = |id: &str| {
            let mut rng = SelectionRng::from_test_id(id);
            select_standalone("Syllogism", &refs, need, &BTreeSet::new(), &mut rng)
                .unwrap()
                .iter()
                .map(|q| q.id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(draw("MOCK_07"), draw("MOCK_07"));
    }
}
