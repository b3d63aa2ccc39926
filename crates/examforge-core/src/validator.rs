//! Blueprint validation.
//!
//! Checks structure and quota arithmetic before any selection work. The first
//! violation aborts validation with [`AssemblyError::BlueprintValidation`];
//! recoverable oddities are collected as [`ValidationWarning`]s.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;

use crate::blueprint::{topic_question_total, Blueprint, BlueprintDocument, Section, SectionDocument};
use crate::error::AssemblyError;
use crate::model::{Difficulty, DifficultyCounts, COMPOSITE_TOPIC};
use crate::traits::SourceResolver;

/// A non-fatal finding from blueprint validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationWarning {
    /// The section ID (if applicable).
    pub section_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// A blueprint that passed validation, plus anything worth telling the author.
#[derive(Debug, Clone)]
pub struct ValidatedBlueprint {
    pub blueprint: Blueprint,
    pub warnings: Vec<ValidationWarning>,
}

/// Validate a raw blueprint document against the pools `resolver` knows about.
pub fn validate_blueprint(
    doc: &BlueprintDocument,
    resolver: &dyn SourceResolver,
) -> Result<ValidatedBlueprint, AssemblyError> {
    let test_id = doc
        .test_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| missing(None, "test_id"))?
        .to_string();
    check_test_id(&test_id)?;
    let total_questions = match &doc.total_questions {
        Some(value) => positive_count(value, None, "total_questions")?,
        None => return Err(missing(None, "total_questions")),
    };
    let section_docs = match &doc.sections {
        Some(sections) if !sections.is_empty() => sections,
        Some(_) => {
            return Err(AssemblyError::blueprint(
                None,
                "sections cannot be empty",
                "at least 1 section",
                0,
            ))
        }
        None => return Err(missing(None, "sections")),
    };

    let mut warnings = Vec::new();
    let mut seen_ids = BTreeSet::new();
    let mut sections = Vec::with_capacity(section_docs.len());

    for (idx, section_doc) in section_docs.iter().enumerate() {
        let section = validate_section(section_doc, idx, resolver, &mut warnings)?;
        if !seen_ids.insert(section.section_id.clone()) {
            return Err(AssemblyError::blueprint(
                Some(&section.section_id),
                "duplicate section_id",
                "unique section_id",
                &section.section_id,
            ));
        }
        sections.push(section);
    }

    let section_sum: u64 = sections.iter().map(|s| u64::from(s.total_questions)).sum();
    if section_sum != u64::from(total_questions) {
        return Err(AssemblyError::blueprint(
            None,
            "sum of section total_questions",
            total_questions,
            section_sum,
        ));
    }

    for &(name, value) in &[
        ("marks_per_question", doc.marks_per_question),
        ("total_marks", doc.total_marks),
    ] {
        if let Some(v) = value {
            if !(v.is_finite() && v > 0.0) {
                return Err(AssemblyError::blueprint(
                    None,
                    format!("{name} must be positive"),
                    "> 0",
                    v,
                ));
            }
        }
    }

    let blueprint = Blueprint {
        test_name: doc
            .test_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| test_id.clone()),
        test_id,
        total_questions,
        sections,
        duration_minutes: doc.duration_minutes,
        total_marks: doc.total_marks,
        marks_per_question: doc.marks_per_question,
        shuffle_questions: doc.shuffle_questions,
    };

    tracing::debug!(
        test_id = %blueprint.test_id,
        sections = blueprint.sections.len(),
        warnings = warnings.len(),
        "blueprint validated"
    );

    Ok(ValidatedBlueprint {
        blueprint,
        warnings,
    })
}

/// Reject test ids that cannot be used as a single file name.
///
/// Generated tests are written as `<test_id>.json` inside the output
/// directory, so an id must not contain a path separator or be `.`/`..`.
pub fn check_test_id(test_id: &str) -> Result<(), AssemblyError> {
    if test_id.contains(['/', '\\', '\0']) || test_id == "." || test_id == ".." {
        return Err(AssemblyError::blueprint(
            None,
            "test_id must be usable as a file name",
            "no path separators",
            test_id,
        ));
    }
    Ok(())
}

fn validate_section(
    doc: &SectionDocument,
    idx: usize,
    resolver: &dyn SourceResolver,
    warnings: &mut Vec<ValidationWarning>,
) -> Result<Section, AssemblyError> {
    let fallback_id = format!("section #{}", idx + 1);
    let section_id = doc
        .section_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| missing(Some(&fallback_id), "section_id"))?
        .to_string();
    let sid = Some(section_id.as_str());

    // Required fields first, in declaration order.
    let section_name = doc
        .section_name
        .clone()
        .ok_or_else(|| missing(sid, "section_name"))?;
    let total_value = doc
        .total_questions
        .as_ref()
        .ok_or_else(|| missing(sid, "total_questions"))?;
    let source_files = doc
        .source_files
        .as_ref()
        .ok_or_else(|| missing(sid, "source_files"))?;
    let topic_doc = doc
        .topic_distribution
        .as_ref()
        .ok_or_else(|| missing(sid, "topic_distribution"))?;
    let difficulty_doc = doc
        .difficulty_distribution
        .as_ref()
        .ok_or_else(|| missing(sid, "difficulty_distribution"))?;

    let total_questions = positive_count(total_value, sid, "total_questions")?;

    // Topic quotas. The composite entry counts sets of five.
    if topic_doc.is_empty() {
        return Err(AssemblyError::blueprint(
            sid,
            "topic_distribution cannot be empty",
            "at least 1 topic",
            0,
        ));
    }
    let mut topic_distribution = BTreeMap::new();
    for (topic, value) in topic_doc {
        let count = if topic == COMPOSITE_TOPIC {
            count_value(value).ok_or_else(|| {
                AssemblyError::blueprint(
                    sid,
                    format!("'{COMPOSITE_TOPIC}' must be a non-negative integer number of sets"),
                    "non-negative integer",
                    value,
                )
            })?
        } else {
            non_negative(value, sid, &format!("topic_distribution['{topic}']"))?
        };
        topic_distribution.insert(topic.clone(), count);
    }
    let topic_sum = topic_question_total(&topic_distribution);
    if topic_sum != u64::from(total_questions) {
        return Err(AssemblyError::blueprint(
            sid,
            "topic_distribution sum",
            total_questions,
            topic_sum,
        ));
    }

    // Difficulty quotas.
    let mut difficulty_distribution = DifficultyCounts::ZERO;
    let mut present = BTreeSet::new();
    for (key, value) in difficulty_doc {
        let difficulty: Difficulty = key.parse().map_err(|_| {
            AssemblyError::blueprint(
                sid,
                "unknown difficulty level in difficulty_distribution",
                "Easy, Medium or Hard",
                key,
            )
        })?;
        let count = non_negative(value, sid, &format!("difficulty_distribution['{key}']"))?;
        difficulty_distribution[difficulty] = count;
        present.insert(difficulty);
    }
    for difficulty in Difficulty::ALL {
        if !present.contains(&difficulty) {
            warnings.push(ValidationWarning {
                section_id: Some(section_id.clone()),
                message: format!("difficulty '{difficulty}' missing, treated as 0"),
            });
        }
    }
    if difficulty_distribution.sum() != u64::from(total_questions) {
        return Err(AssemblyError::blueprint(
            sid,
            "difficulty_distribution sum",
            total_questions,
            difficulty_distribution.sum(),
        ));
    }

    // Sources.
    if source_files.is_empty() {
        return Err(AssemblyError::blueprint(
            sid,
            "source_files cannot be empty",
            "at least 1 source",
            0,
        ));
    }
    for source in source_files {
        if source.trim().is_empty() {
            return Err(AssemblyError::blueprint(
                sid,
                "empty entry in source_files",
                "source identifier",
                "\"\"",
            ));
        }
        if !resolver.resolves(source) {
            return Err(AssemblyError::blueprint(
                sid,
                "unresolvable source file",
                "loaded pool",
                source,
            ));
        }
    }

    Ok(Section {
        section_id,
        section_name,
        total_questions,
        source_files: source_files.clone(),
        topic_distribution,
        difficulty_distribution,
    })
}

fn missing(section_id: Option<&str>, field: &str) -> AssemblyError {
    AssemblyError::blueprint(
        section_id,
        format!("missing required field '{field}'"),
        field,
        "missing",
    )
}

fn count_value(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|n| u32::try_from(n).ok())
}

fn non_negative(value: &Value, section_id: Option<&str>, field: &str) -> Result<u32, AssemblyError> {
    count_value(value).ok_or_else(|| {
        AssemblyError::blueprint(
            section_id,
            format!("{field} must be a non-negative integer"),
            "non-negative integer",
            value,
        )
    })
}

fn positive_count(value: &Value, section_id: Option<&str>, field: &str) -> Result<u32, AssemblyError> {
    match count_value(value) {
        Some(n) if n > 0 => Ok(n),
        _ => Err(AssemblyError::blueprint(
            section_id,
            format!("{field} must be a positive integer"),
            "positive integer",
            value,
        )),
    }
}
