//! Test assembly orchestrator.
//!
//! Validates a blueprint once, then assembles each section in blueprint order
//! with a single seeded generator and a per-run consumed-question set.
//! Any failure aborts the whole run.

use std::collections::BTreeSet;

use crate::allocation::apportion_topics;
use crate::blueprint::{Blueprint, BlueprintDocument, Section};
use crate::catalog::{PoolCatalog, SectionPool};
use crate::composite::select_composite;
use crate::error::AssemblyError;
use crate::model::{CompositeSet, DifficultyCounts};
use crate::report::{topic_counts, CompositeSummary, GeneratedSection, GeneratedTest, SelectedQuestion};
use crate::rng::SelectionRng;
use crate::selector::select_standalone;
use crate::validator::{check_test_id, validate_blueprint};

/// Defaults applied when a blueprint leaves a field unset.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub marks_per_question: f64,
    pub duration_minutes: u32,
    pub shuffle_questions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            marks_per_question: 1.0,
            duration_minutes: 120,
            shuffle_questions: false,
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_section_start(&self, section_id: &str, total_questions: u32);
    fn on_section_complete(&self, section: &GeneratedSection);
    fn on_test_complete(&self, test: &GeneratedTest);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_section_start(&self, _: &str, _: u32) {}
    fn on_section_complete(&self, _: &GeneratedSection) {}
    fn on_test_complete(&self, _: &GeneratedTest) {}
}

/// State owned by exactly one generation run.
struct RunState {
    rng: SelectionRng,
    consumed: BTreeSet<String>,
}

impl RunState {
    fn new(test_id: &str) -> Self {
        Self {
            rng: SelectionRng::from_test_id(test_id),
            consumed: BTreeSet::new(),
        }
    }

    fn consume<'q>(&mut self, ids: impl IntoIterator<Item = &'q str>) -> Result<(), AssemblyError> {
        for id in ids {
            if !self.consumed.insert(id.to_string()) {
                return Err(AssemblyError::DuplicateQuestion {
                    question_id: id.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Assembles tests from a fixed pool catalog.
pub struct TestAssembler<'a> {
    catalog: &'a PoolCatalog,
    config: EngineConfig,
}

impl<'a> TestAssembler<'a> {
    pub fn new(catalog: &'a PoolCatalog, config: EngineConfig) -> Self {
        Self { catalog, config }
    }

    /// Validate a raw blueprint and assemble it.
    pub fn generate(
        &self,
        doc: &BlueprintDocument,
        progress: &dyn ProgressReporter,
    ) -> Result<GeneratedTest, AssemblyError> {
        let validated = validate_blueprint(doc, self.catalog)?;
        for warning in &validated.warnings {
            tracing::warn!(
                section = warning.section_id.as_deref().unwrap_or("-"),
                "{}",
                warning.message
            );
        }
        self.assemble(&validated.blueprint, progress)
    }

    /// Assemble an already validated blueprint.
    pub fn assemble(
        &self,
        blueprint: &Blueprint,
        progress: &dyn ProgressReporter,
    ) -> Result<GeneratedTest, AssemblyError> {
        check_test_id(&blueprint.test_id)?;
        let shuffle = blueprint
            .shuffle_questions
            .unwrap_or(self.config.shuffle_questions);
        let mut state = RunState::new(&blueprint.test_id);
        let seed = state.rng.seed_hex();

        let mut sections = Vec::with_capacity(blueprint.sections.len());
        for section in &blueprint.sections {
            progress.on_section_start(&section.section_id, section.total_questions);
            let generated = self
                .catalog
                .section_view(&section.source_files)
                .and_then(|view| assemble_section(section, &view, &mut state, shuffle))
                .map_err(|e| e.in_section(&section.section_id))?;
            tracing::info!(
                section = %generated.section_id,
                questions = generated.questions.len(),
                composite_sets = generated.composite_sets.len(),
                "section assembled"
            );
            progress.on_section_complete(&generated);
            sections.push(generated);
        }

        let marks_per_question = blueprint
            .marks_per_question
            .unwrap_or(self.config.marks_per_question);
        let test = GeneratedTest {
            test_id: blueprint.test_id.clone(),
            test_name: blueprint.test_name.clone(),
            seed,
            total_questions: blueprint.total_questions,
            total_marks: blueprint
                .total_marks
                .unwrap_or(f64::from(blueprint.total_questions) * marks_per_question),
            marks_per_question,
            duration_minutes: blueprint
                .duration_minutes
                .unwrap_or(self.config.duration_minutes),
            shuffled: shuffle,
            sections,
        };

        ensure_unique(&test)?;
        tracing::info!(
            test_id = %test.test_id,
            questions = test.questions().count(),
            "test assembled"
        );
        progress.on_test_complete(&test);
        Ok(test)
    }

    /// Assemble `count` independent tests with ids `{prefix}_01`, `{prefix}_02`, ...
    ///
    /// Each run has its own consumed set; nothing carries over between tests.
    pub fn generate_series(
        &self,
        blueprint: &Blueprint,
        count: u32,
        prefix: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<Vec<GeneratedTest>, AssemblyError> {
        (1..=count)
            .map(|n| self.assemble(&blueprint.with_test_id(format!("{prefix}_{n:02}")), progress))
            .collect()
    }
}

fn assemble_section(
    section: &Section,
    view: &SectionPool<'_>,
    state: &mut RunState,
    shuffle: bool,
) -> Result<GeneratedSection, AssemblyError> {
    // Composite sets first, against the full difficulty quota.
    let set_count = section.composite_sets();
    let (chosen_sets, remaining): (Vec<&CompositeSet>, DifficultyCounts) = if set_count > 0 {
        let selection = select_composite(
            view.composite(),
            set_count,
            section.difficulty_distribution,
            &state.consumed,
            &mut state.rng,
        )?;
        for set in &selection.sets {
            state.consume(set.member_ids())?;
        }
        (selection.sets, selection.remaining_quota)
    } else {
        (Vec::new(), section.difficulty_distribution)
    };

    // One unit per composite set or standalone question.
    let mut units: Vec<Vec<SelectedQuestion>> = chosen_sets
        .iter()
        .map(|set| {
            set.questions
                .iter()
                .map(|q| SelectedQuestion {
                    question_number: 0,
                    question: q.clone(),
                    set_id: Some(set.set_id.clone()),
                })
                .collect()
        })
        .collect();

    for (topic, need) in apportion_topics(section.standalone_topics(), remaining)? {
        let picked = select_standalone(topic, view.topic(topic), need, &state.consumed, &mut state.rng)?;
        state.consume(picked.iter().map(|q| q.id.as_str()))?;
        units.extend(picked.into_iter().map(|q| {
            vec![SelectedQuestion {
                question_number: 0,
                question: q.clone(),
                set_id: None,
            }]
        }));
    }

    if shuffle {
        state.rng.shuffle(&mut units);
    }

    let questions: Vec<SelectedQuestion> = units
        .into_iter()
        .flatten()
        .zip(1..)
        .map(|(mut q, number)| {
            q.question_number = number;
            q
        })
        .collect();

    Ok(GeneratedSection {
        section_id: section.section_id.clone(),
        section_name: section.section_name.clone(),
        total_questions: section.total_questions,
        difficulty_counts: DifficultyCounts::tally(questions.iter().map(|q| &q.question)),
        topic_counts: topic_counts(&questions),
        composite_sets: chosen_sets
            .iter()
            .map(|set| CompositeSummary {
                set_id: set.set_id.clone(),
                topic: set.topic.clone(),
                footprint: set.footprint(),
                question_ids: set.member_ids().map(str::to_string).collect(),
                context: set.context.clone(),
            })
            .collect(),
        remaining_quota_after_composite: remaining,
        questions,
    })
}

/// Fail on the first question id that appears twice in `test`.
pub fn ensure_unique(test: &GeneratedTest) -> Result<(), AssemblyError> {
    let mut seen = BTreeSet::new();
    for id in test.question_ids() {
        if !seen.insert(id) {
            return Err(AssemblyError::DuplicateQuestion {
                question_id: id.to_string(),
            });
        }
    }
    Ok(())
}
