//! Pool statistics, capacity estimates and series overlap.
//!
//! Read-only analysis. Nothing here feeds back into selection.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::blueprint::Blueprint;
use crate::catalog::PoolCatalog;
use crate::error::AssemblyError;
use crate::model::{Difficulty, DifficultyCounts, QuestionPool};
use crate::report::GeneratedTest;

/// Counts for one loaded source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceStats {
    pub source: String,
    /// Standalone questions plus composite members.
    pub total_questions: u32,
    pub standalone_questions: u32,
    pub composite_sets: u32,
    pub by_topic: BTreeMap<String, u32>,
    pub by_difficulty: DifficultyCounts,
    /// Composite footprint key (`easy-medium-hard`) to number of sets.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub footprints: BTreeMap<String, u32>,
}

pub fn source_stats(pool: &QuestionPool) -> SourceStats {
    let mut stats = SourceStats {
        source: pool.source.clone(),
        ..Default::default()
    };

    for (topic, questions) in &pool.standalone {
        let n = questions.len() as u32;
        *stats.by_topic.entry(topic.clone()).or_insert(0) += n;
        stats.standalone_questions += n;
        stats.by_difficulty = stats
            .by_difficulty
            .saturating_add(&DifficultyCounts::tally(questions));
    }

    for set in pool.composite_sets() {
        let footprint = set.footprint();
        stats.composite_sets += 1;
        *stats.by_topic.entry(set.topic.clone()).or_insert(0) += footprint.total();
        *stats.footprints.entry(footprint.key()).or_insert(0) += 1;
        stats.by_difficulty = stats.by_difficulty.saturating_add(&footprint);
    }

    stats.total_questions = stats.by_difficulty.total();
    stats
}

/// Statistics for every source in the catalog, keyed by source id.
pub fn pool_statistics(catalog: &PoolCatalog) -> BTreeMap<String, SourceStats> {
    catalog
        .pools()
        .map(|pool| (pool.source.clone(), source_stats(pool)))
        .collect()
}

/// One capacity constraint of a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityLine {
    /// A difficulty name, or `sets` for the composite set count.
    pub requirement: String,
    pub available: u32,
    pub required: u32,
    pub max_tests: u32,
}

/// Capacity of one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionCapacity {
    pub section_id: String,
    pub lines: Vec<CapacityLine>,
    pub max_tests: u32,
}

/// How many fully disjoint tests the pools can support for a blueprint.
///
/// Each section is estimated on its own; sections that share a source are
/// not discounted against each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityReport {
    pub sections: Vec<SectionCapacity>,
    pub max_tests: u32,
    /// `(section_id, requirement)` of the tightest constraint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottleneck: Option<(String, String)>,
}

pub fn capacity(blueprint: &Blueprint, catalog: &PoolCatalog) -> Result<CapacityReport, AssemblyError> {
    let mut sections = Vec::with_capacity(blueprint.sections.len());
    let mut overall: Option<(u32, String, String)> = None;

    for section in &blueprint.sections {
        let view = catalog
            .section_view(&section.source_files)
            .map_err(|e| e.in_section(&section.section_id))?;

        let mut available = DifficultyCounts::ZERO;
        for (topic, _) in section.standalone_topics() {
            available = available.saturating_add(&DifficultyCounts::tally(
                view.topic(topic).iter().copied(),
            ));
        }
        for set in view.composite() {
            available = available.saturating_add(&set.footprint());
        }

        let mut lines = Vec::new();
        for difficulty in Difficulty::ALL {
            let required = section.difficulty_distribution[difficulty];
            if required > 0 {
                lines.push(line(&difficulty.to_string(), available[difficulty], required));
            }
        }
        if section.composite_sets() > 0 {
            lines.push(line(
                "sets",
                view.composite().len() as u32,
                section.composite_sets(),
            ));
        }

        let tightest = lines.iter().min_by_key(|l| l.max_tests);
        let max_tests = tightest.map(|l| l.max_tests).unwrap_or(u32::MAX);
        if let Some(l) = tightest {
            if overall.as_ref().map_or(true, |(m, _, _)| l.max_tests < *m) {
                overall = Some((l.max_tests, section.section_id.clone(), l.requirement.clone()));
            }
        }

        sections.push(SectionCapacity {
            section_id: section.section_id.clone(),
            lines,
            max_tests,
        });
    }

    Ok(match overall {
        Some((max_tests, section_id, requirement)) => CapacityReport {
            sections,
            max_tests,
            bottleneck: Some((section_id, requirement)),
        },
        None => CapacityReport {
            sections,
            max_tests: 0,
            bottleneck: None,
        },
    })
}

fn line(requirement: &str, available: u32, required: u32) -> CapacityLine {
    CapacityLine {
        requirement: requirement.to_string(),
        available,
        required,
        max_tests: available / required,
    }
}

/// Reuse of question ids within a test series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapEntry {
    pub test_id: String,
    pub total_count: usize,
    pub unique_count: usize,
    pub repeated_count: usize,
    /// Share of this test's questions already seen in earlier tests, 0-100.
    pub overlap_percent: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repeated_ids: Vec<String>,
}

/// For each test, how many of its ids appeared in any earlier test.
pub fn overlap_report(tests: &[GeneratedTest]) -> Vec<OverlapEntry> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut entries = Vec::with_capacity(tests.len());

    for test in tests {
        let ids: BTreeSet<&str> = test.question_ids().collect();
        let repeated: Vec<String> = ids
            .iter()
            .filter(|id| seen.contains(*id))
            .map(|id| id.to_string())
            .collect();
        let total = ids.len();
        entries.push(OverlapEntry {
            test_id: test.test_id.clone(),
            total_count: total,
            unique_count: total - repeated.len(),
            repeated_count: repeated.len(),
            overlap_percent: if total == 0 {
                0.0
            } else {
                repeated.len() as f64 / total as f64 * 100.0
            },
            repeated_ids: repeated,
        });
        seen.extend(ids);
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::Section;
    use crate::engine::{EngineConfig, NoopReporter, TestAssembler};
    use crate::model::fixtures::{composite, question};
    use crate::model::COMPOSITE_TOPIC;

    fn catalog() -> PoolCatalog {
        let mut arith = QuestionPool::new("arith.json");
        let bucket = arith.standalone.entry("Percentages".into()).or_default();
        for i in 0..9 {
            bucket.push(question(&format!("E{i}"), "Percentages", Difficulty::Easy));
        }
        for i in 0..4 {
            bucket.push(question(&format!("H{i}"), "Percentages", Difficulty::Hard));
        }

        let mut di = QuestionPool::new("di.json");
        di.composite.insert(
            COMPOSITE_TOPIC.into(),
            vec![
                composite("DI_1", 2, 2, 1),
                composite("DI_2", 2, 2, 1),
                composite("DI_3", 0, 0, 5),
            ],
        );
        [arith, di].into_iter().collect()
    }

    fn blueprint() -> Blueprint {
        let mut topics = BTreeMap::new();
        topics.insert("Percentages".to_string(), 4);
        topics.insert(COMPOSITE_TOPIC.to_string(), 1);
        Blueprint {
            test_id: "CAP".into(),
            test_name: "CAP".into(),
            total_questions: 9,
            sections: vec![Section {
                section_id: "QUANT".into(),
                section_name: "Quant".into(),
                total_questions: 9,
                source_files: vec!["arith.json".into(), "di.json".into()],
                topic_distribution: topics,
                difficulty_distribution: DifficultyCounts::new(5, 2, 2),
            }],
            duration_minutes: None,
            total_marks: None,
            marks_per_question: None,
            shuffle_questions: None,
        }
    }

    #[test]
    fn source_stats_include_footprints() {
        let stats = pool_statistics(&catalog());
        let di = &stats["di.json"];
        assert_eq!(di.composite_sets, 3);
        assert_eq!(di.total_questions, 15);
        assert_eq!(di.footprints["2-2-1"], 2);
        assert_eq!(di.footprints["0-0-5"], 1);
        assert_eq!(di.by_difficulty, DifficultyCounts::new(4, 4, 7));

        let arith = &stats["arith.json"];
        assert_eq!(arith.standalone_questions, 13);
        assert_eq!(arith.by_topic["Percentages"], 13);
        assert!(arith.footprints.is_empty());
    }

    #[test]
    fn capacity_finds_bottleneck() {
        let report = capacity(&blueprint(), &catalog()).unwrap();
        let section = &report.sections[0];
        // Easy: 9 + 4 = 13 / 5 = 2; Medium: 4 / 2 = 2; Hard: 4 + 7 = 11 / 2 = 5; sets: 3 / 1.
        let maxes: Vec<(&str, u32)> = section
            .lines
            .iter()
            .map(|l| (l.requirement.as_str(), l.max_tests))
            .collect();
        assert_eq!(maxes, vec![("Easy", 2), ("Medium", 2), ("Hard", 5), ("sets", 3)]);
        assert_eq!(report.max_tests, 2);
        assert_eq!(
            report.bottleneck,
            Some(("QUANT".to_string(), "Easy".to_string()))
        );
    }

    #[test]
    fn overlap_counts_ids_seen_earlier() {
        let catalog = catalog();
        let tests = TestAssembler::new(&catalog, EngineConfig::default())
            .generate_series(&blueprint(), 3, "OV", &NoopReporter)
            .unwrap();
        let report = overlap_report(&tests);

        assert_eq!(report.len(), 3);
        assert_eq!(report[0].repeated_count, 0);
        assert_eq!(report[0].overlap_percent, 0.0);
        for entry in &report {
            assert_eq!(entry.total_count, 9);
            assert_eq!(entry.unique_count + entry.repeated_count, 9);
        }
        // Two eligible sets across three tests: some later test repeats one.
        assert!(report[1].repeated_count + report[2].repeated_count >= 5);
    }
}
