//! Property-based tests for test assembly.
//!
//! Key invariants:
//! - The same blueprint, pools and test id always yield the same test
//! - No question id appears twice in a test, even across sections
//! - Composite sets are atomic and their footprints are subtracted exactly
//! - Proportional splits and topic apportionment always sum to their budget

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use serde_json::{json, Value};

use examforge_core::allocation::{apportion_topics, proportional_split};
use examforge_core::blueprint::BlueprintDocument;
use examforge_core::catalog::PoolCatalog;
use examforge_core::composite::select_composite;
use examforge_core::engine::{EngineConfig, NoopReporter, TestAssembler};
use examforge_core::error::AssemblyError;
use examforge_core::model::{Difficulty, DifficultyCounts, COMPOSITE_SET_SIZE};
use examforge_core::normalizer::{normalize_source, SourceKind};
use examforge_core::rng::SelectionRng;

const LEVELS: [&str; 3] = ["Easy", "Medium", "Hard"];

fn raw_question(id: &str, difficulty: &str, topic: Option<&str>) -> Value {
    let mut q = json!({
        "question_id": id,
        "question": format!("Question {id}"),
        "options": {"A": "10", "B": "20", "C": "30", "D": "40"},
        "correct_answer": "A",
        "explanation": "Worked solution.",
        "difficulty": difficulty,
    });
    if let Some(topic) = topic {
        q["topic"] = json!(topic);
    }
    q
}

/// A data-interpretation set whose members have the listed difficulties.
fn raw_set(set_id: &str, members: [&str; 5]) -> Value {
    let questions: Vec<Value> = members
        .iter()
        .enumerate()
        .map(|(i, d)| raw_question(&format!("{set_id}_Q{}", i + 1), d, None))
        .collect();
    json!({"di_set_id": set_id, "topic": "Line Graph", "data": {"rows": 4}, "questions": questions})
}

fn arithmetic(per_level: usize) -> Value {
    let mut questions = Vec::new();
    for topic in ["Percentages", "Simplification"] {
        for level in LEVELS {
            for i in 0..per_level {
                let id = format!("{}_{level}_{i:02}", &topic[..3].to_uppercase());
                questions.push(raw_question(&id, level, Some(topic)));
            }
        }
    }
    json!({ "questions": questions })
}

/// 20 per topic per level, plus three sets that fit together under any quota
/// used below.
fn catalog() -> PoolCatalog {
    let arith = normalize_source(&arithmetic(20), SourceKind::Quantitative, "arith.json").unwrap();
    let di = normalize_source(
        &json!([
            raw_set("DI_001", ["Easy", "Easy", "Medium", "Medium", "Hard"]),
            raw_set("DI_002", ["Easy", "Medium", "Medium", "Hard", "Hard"]),
            raw_set("DI_003", ["Easy", "Easy", "Medium", "Hard", "Hard"]),
        ]),
        SourceKind::DataInterpretation,
        "di.json",
    )
    .unwrap();
    [arith, di].into_iter().collect()
}

fn two_section_blueprint(test_id: &str) -> BlueprintDocument {
    serde_json::from_value(json!({
        "test_id": test_id,
        "total_questions": 44,
        "sections": [
            {
                "section_id": "QUANT_A",
                "section_name": "Quant A",
                "total_questions": 22,
                "source_files": ["arith.json", "di.json"],
                "topic_distribution": {
                    "Data Interpretation": 2,
                    "Percentages": 6,
                    "Simplification": 6
                },
                "difficulty_distribution": {"Easy": 8, "Medium": 8, "Hard": 6}
            },
            {
                "section_id": "QUANT_B",
                "section_name": "Quant B",
                "total_questions": 22,
                "source_files": ["arith.json"],
                "topic_distribution": {"Percentages": 11, "Simplification": 11},
                "difficulty_distribution": {"Easy": 8, "Medium": 8, "Hard": 6}
            }
        ]
    }))
    .unwrap()
}

fn test_id() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][A-Z0-9_]{0,15}").unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Identical inputs produce an identical document.
    #[test]
    fn generation_is_deterministic(id in test_id()) {
        let catalog = catalog();
        let assembler = TestAssembler::new(&catalog, EngineConfig::default());
        let doc = two_section_blueprint(&id);
        let a = assembler.generate(&doc, &NoopReporter).unwrap();
        let b = assembler.generate(&doc, &NoopReporter).unwrap();
        prop_assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    /// Sections drawing from the same source never repeat a question.
    #[test]
    fn no_question_repeats_across_sections(id in test_id()) {
        let catalog = catalog();
        let test = TestAssembler::new(&catalog, EngineConfig::default())
            .generate(&two_section_blueprint(&id), &NoopReporter)
            .unwrap();
        let ids: Vec<&str> = test.question_ids().collect();
        let unique: BTreeSet<&str> = ids.iter().copied().collect();
        prop_assert_eq!(ids.len(), 44);
        prop_assert_eq!(unique.len(), 44);
        for section in &test.sections {
            prop_assert_eq!(section.difficulty_counts, DifficultyCounts::new(8, 8, 6));
        }
    }

    /// Composite sets appear whole and in member order, whatever the shuffle.
    #[test]
    fn composite_sets_stay_atomic(id in test_id(), shuffle in any::<bool>()) {
        let catalog = catalog();
        let config = EngineConfig { shuffle_questions: shuffle, ..EngineConfig::default() };
        let test = TestAssembler::new(&catalog, config)
            .generate(&two_section_blueprint(&id), &NoopReporter)
            .unwrap();
        let section = &test.sections[0];
        prop_assert_eq!(section.composite_sets.len(), 2);
        for summary in &section.composite_sets {
            let start = section
                .questions
                .iter()
                .position(|q| q.set_id.as_deref() == Some(summary.set_id.as_str()))
                .unwrap();
            let run: Vec<&str> = section.questions[start..start + COMPOSITE_SET_SIZE]
                .iter()
                .map(|q| q.question.id.as_str())
                .collect();
            prop_assert_eq!(run, summary.question_ids.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }

    /// Only sets that fit the quota are chosen; the quota shrinks by exactly
    /// their footprints.
    #[test]
    fn composite_footprints_are_conserved(id in test_id()) {
        let di = normalize_source(
            &json!([
                raw_set("A", ["Easy", "Easy", "Medium", "Medium", "Hard"]),
                raw_set("B", ["Easy", "Medium", "Hard", "Hard", "Hard"]),
                raw_set("C", ["Hard", "Hard", "Hard", "Hard", "Hard"]),
                raw_set("D", ["Easy", "Easy", "Easy", "Medium", "Medium"]),
            ]),
            SourceKind::DataInterpretation,
            "di.json",
        )
        .unwrap();
        let sets: Vec<_> = di.composite_sets().collect();
        // D needs three Easy slots and never fits.
        let quota = DifficultyCounts::new(2, 15, 5);
        let mut rng = SelectionRng::from_test_id(&id);

        match select_composite(&sets, 2, quota, &BTreeSet::new(), &mut rng) {
            Ok(selection) => {
                prop_assert_eq!(selection.sets.len(), 2);
                prop_assert!(selection.sets.iter().all(|s| s.set_id != "D"));
                prop_assert_eq!(
                    quota.checked_sub(&selection.consumed_footprint()),
                    Some(selection.remaining_quota)
                );
                prop_assert!(selection.consumed_footprint().fits_within(&quota));
            }
            Err(err) => {
                let is_exhausted = matches!(err, AssemblyError::NoValidCompositeSet { .. });
                prop_assert!(is_exhausted);
            }
        }
    }

    /// Splitting never exceeds a weight and always sums to the count.
    #[test]
    fn proportional_split_sums_to_count(
        easy in 0u32..40,
        medium in 0u32..40,
        hard in 1u32..40,
        fraction in 0.0f64..=1.0,
    ) {
        let weights = DifficultyCounts::new(easy, medium, hard);
        let count = (f64::from(weights.total()) * fraction).floor() as u32;
        let split = proportional_split(count, &weights);
        prop_assert_eq!(split.total(), count);
        prop_assert!(split.fits_within(&weights));
        prop_assert_eq!(split, proportional_split(count, &weights));
    }

    /// Topic splits partition the budget exactly.
    #[test]
    fn apportionment_partitions_budget(
        easy in 0u32..30,
        medium in 0u32..30,
        hard in 0u32..30,
        topics in 1usize..6,
    ) {
        let budget = DifficultyCounts::new(easy, medium, hard);
        let total = budget.total();
        let names: Vec<String> = (0..topics).map(|i| format!("Topic {i}")).collect();
        let base = total / topics as u32;
        let extra = total % topics as u32;
        let counts: Vec<(&str, u32)> = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), base + u32::from((i as u32) < extra)))
            .collect();

        let splits = apportion_topics(counts.iter().copied(), budget).unwrap();
        let summed = splits
            .iter()
            .fold(DifficultyCounts::ZERO, |acc, (_, s)| acc.saturating_add(s));
        prop_assert_eq!(summed, budget);
        for ((_, split), (_, count)) in splits.iter().zip(&counts) {
            prop_assert_eq!(split.total(), *count);
        }
    }
}

#[test]
fn different_test_ids_select_differently() {
    const RUNS: usize = 50;
    let catalog = catalog();
    let assembler = TestAssembler::new(&catalog, EngineConfig::default());
    let selections: Vec<BTreeSet<String>> = (0..RUNS)
        .map(|n| {
            let test = assembler
                .generate(&two_section_blueprint(&format!("SERIES_{n:03}")), &NoopReporter)
                .unwrap();
            test.question_ids().map(str::to_string).collect()
        })
        .collect();

    let mut pairs = 0;
    let mut differing = 0;
    for i in 0..RUNS {
        for j in i + 1..RUNS {
            pairs += 1;
            if selections[i] != selections[j] {
                differing += 1;
            }
        }
    }
    // At least 95% of the 1225 pairs must select a different question set.
    assert_eq!(pairs, RUNS * (RUNS - 1) / 2);
    assert!(
        differing * 100 >= pairs * 95,
        "only {differing} of {pairs} pairs differ"
    );
}

#[test]
fn topic_sum_mismatch_is_rejected() {
    let catalog = catalog();
    let mut raw = serde_json::to_value(two_section_blueprint("BAD_SUM")).unwrap();
    raw["sections"][1]["topic_distribution"]["Percentages"] = json!(10);
    let doc: BlueprintDocument = serde_json::from_value(raw).unwrap();

    let err = TestAssembler::new(&catalog, EngineConfig::default())
        .generate(&doc, &NoopReporter)
        .unwrap_err();
    let report = err.report();
    assert_eq!(report.kind, "BlueprintValidationError");
    assert_eq!(report.section_id.as_deref(), Some("QUANT_B"));
}

#[test]
fn short_topic_reports_exact_shortfall() {
    let mut questions: Vec<Value> = (0..3)
        .map(|i| raw_question(&format!("PCT_H{i}"), "Hard", Some("Percentages")))
        .collect();
    questions.extend((0..6).map(|i| raw_question(&format!("PCT_E{i}"), "Easy", Some("Percentages"))));
    let pool = normalize_source(&json!(questions), SourceKind::Quantitative, "pct.json").unwrap();
    let catalog: PoolCatalog = [pool].into_iter().collect();

    let doc: BlueprintDocument = serde_json::from_value(json!({
        "test_id": "SHORT",
        "total_questions": 5,
        "sections": [{
            "section_id": "QUANT",
            "section_name": "Quant",
            "total_questions": 5,
            "source_files": ["pct.json"],
            "topic_distribution": {"Percentages": 5},
            "difficulty_distribution": {"Easy": 0, "Medium": 0, "Hard": 5}
        }]
    }))
    .unwrap();

    let err = TestAssembler::new(&catalog, EngineConfig::default())
        .generate(&doc, &NoopReporter)
        .unwrap_err();
    let report = err.report();
    assert_eq!(report.kind, "InsufficientQuestionsError");
    assert_eq!(report.section_id.as_deref(), Some("QUANT"));
    assert_eq!(report.topic.as_deref(), Some("Percentages"));
    assert_eq!(report.difficulty, Some(Difficulty::Hard));
    assert_eq!(report.required, Some(5));
    assert_eq!(report.available, Some(3));
    assert_eq!(report.missing, Some(2));
}

#[test]
fn consumed_footprint_matches_reported_remainder() {
    let catalog = catalog();
    let test = TestAssembler::new(&catalog, EngineConfig::default())
        .generate(&two_section_blueprint("REMAINDER"), &NoopReporter)
        .unwrap();
    let section = &test.sections[0];
    let consumed = section
        .composite_sets
        .iter()
        .fold(DifficultyCounts::ZERO, |acc, s| acc.saturating_add(&s.footprint));
    assert_eq!(
        DifficultyCounts::new(8, 8, 6).checked_sub(&consumed),
        Some(section.remaining_quota_after_composite)
    );
    let topics: BTreeMap<String, u32> = section.topic_counts.clone();
    assert_eq!(topics["Data Interpretation"], 2);
    assert_eq!(topics["Percentages"], 6);
}
