//! Post-generation audit of a [`GeneratedTest`] against its blueprint.
//!
//! The engine already guarantees these properties; the audit re-derives them
//! from the emitted document so a stored test can be checked independently.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::blueprint::Blueprint;
use crate::model::{DifficultyCounts, COMPOSITE_SET_SIZE};
use crate::report::{topic_counts, GeneratedSection, GeneratedTest};

/// Result of auditing one generated test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub test_id: String,
    pub passed: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub total_questions: usize,
    pub overall_difficulty: DifficultyCounts,
    pub section_difficulty: BTreeMap<String, DifficultyCounts>,
    pub section_topics: BTreeMap<String, BTreeMap<String, u32>>,
}

/// Re-check a generated test against the blueprint it was built from.
pub fn audit_test(test: &GeneratedTest, blueprint: &Blueprint) -> AuditReport {
    let mut report = AuditReport {
        test_id: test.test_id.clone(),
        ..Default::default()
    };

    if test.test_id != blueprint.test_id {
        report.warnings.push(format!(
            "test_id '{}' differs from blueprint test_id '{}'",
            test.test_id, blueprint.test_id
        ));
    }

    report.total_questions = test.questions().count();
    if report.total_questions != blueprint.total_questions as usize {
        report.errors.push(format!(
            "question count mismatch: expected {}, got {}",
            blueprint.total_questions, report.total_questions
        ));
    }

    let mut seen_sections = BTreeSet::new();
    for section in &test.sections {
        if !seen_sections.insert(section.section_id.as_str()) {
            report
                .errors
                .push(format!("duplicate section id: {}", section.section_id));
        }
        match blueprint.section(&section.section_id) {
            Some(expected) => audit_section(section, expected, &mut report),
            None => report.errors.push(format!(
                "section '{}' is not in the blueprint",
                section.section_id
            )),
        }
    }
    for expected in &blueprint.sections {
        if !seen_sections.contains(expected.section_id.as_str()) {
            report
                .errors
                .push(format!("section '{}' is missing", expected.section_id));
        }
    }

    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();
    for id in test.question_ids() {
        if !seen.insert(id) {
            duplicates.insert(id);
        }
    }
    if !duplicates.is_empty() {
        let shown: Vec<&str> = duplicates.iter().take(5).copied().collect();
        report.errors.push(format!(
            "found {} duplicate question ids: {}",
            duplicates.len(),
            shown.join(", ")
        ));
    }

    report.passed = report.errors.is_empty();
    report
}

fn audit_section(
    section: &GeneratedSection,
    expected: &crate::blueprint::Section,
    report: &mut AuditReport,
) {
    let sid = &section.section_id;

    if section.questions.len() != expected.total_questions as usize {
        report.errors.push(format!(
            "section '{sid}': expected {} questions, got {}",
            expected.total_questions,
            section.questions.len()
        ));
    }

    let difficulty = DifficultyCounts::tally(section.questions.iter().map(|q| &q.question));
    if difficulty != expected.difficulty_distribution {
        report.errors.push(format!(
            "section '{sid}': difficulty {difficulty} does not match blueprint {}",
            expected.difficulty_distribution
        ));
    }
    report.overall_difficulty = report.overall_difficulty.saturating_add(&difficulty);
    report.section_difficulty.insert(sid.clone(), difficulty);

    let topics = topic_counts(&section.questions);
    let wanted: BTreeMap<String, u32> = expected
        .topic_distribution
        .iter()
        .filter(|(_, &count)| count > 0)
        .map(|(topic, &count)| (topic.clone(), count))
        .collect();
    if topics != wanted {
        report.errors.push(format!(
            "section '{sid}': topic counts {topics:?} do not match blueprint {wanted:?}"
        ));
    }
    report.section_topics.insert(sid.clone(), topics);

    // Each tagged set must appear once, whole, in one contiguous run.
    let mut runs: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (pos, q) in section.questions.iter().enumerate() {
        if let Some(set_id) = &q.set_id {
            runs.entry(set_id.as_str()).or_default().push(pos);
        }
    }
    for (set_id, positions) in &runs {
        if positions.len() != COMPOSITE_SET_SIZE {
            report.errors.push(format!(
                "section '{sid}': composite set {set_id} has {} members (expected {COMPOSITE_SET_SIZE})",
                positions.len()
            ));
        } else if positions.windows(2).any(|w| w[1] != w[0] + 1) {
            report.errors.push(format!(
                "section '{sid}': composite set {set_id} is not contiguous"
            ));
        }
    }

    for q in &section.questions {
        if !q.question.options.contains_key(&q.question.correct_answer) {
            report.errors.push(format!(
                "question {}: correct answer {} is not an option",
                q.question.id, q.question.correct_answer
            ));
        }
        if q.question.explanation.trim().is_empty() {
            report
                .warnings
                .push(format!("question {} has no explanation", q.question.id));
        }
    }

    let numbered = section
        .questions
        .iter()
        .zip(1u32..)
        .all(|(q, n)| q.question_number == n);
    if !numbered {
        report.warnings.push(format!(
            "section '{sid}': question numbers are not sequential from 1"
        ));
    }
}
