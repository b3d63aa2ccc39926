//! Assembly error types.
//!
//! Every failure of the engine is a hard failure carrying structured fields,
//! so a caller can render a deterministic diagnostic without string matching.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Difficulty, DifficultyCounts};

/// Errors that can occur while normalizing pools or assembling a test.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssemblyError {
    /// A raw source record is missing a required field or has the wrong shape.
    #[error("schema mismatch in {source_id} (record {record}): field '{field}' {reason}")]
    SchemaMismatch {
        source_id: String,
        record: String,
        field: String,
        reason: String,
    },

    /// A composite set does not have exactly five members.
    #[error("composite set {set_id} in {source_id} has {actual} members (expected {expected})")]
    InvalidCompositeSet {
        source_id: String,
        set_id: String,
        expected: usize,
        actual: usize,
    },

    /// The blueprint failed structural or quota validation.
    #[error("blueprint validation failed{}: {message} (expected {expected}, actual {actual})", fmt_section(.section_id))]
    BlueprintValidation {
        section_id: Option<String>,
        message: String,
        expected: String,
        actual: String,
    },

    /// A topic/difficulty bucket has fewer candidates than required.
    #[error("insufficient questions for topic '{topic}' at {difficulty}: required {required}, available {available} (missing {missing})")]
    InsufficientQuestions {
        topic: String,
        difficulty: Difficulty,
        required: u32,
        available: u32,
        missing: u32,
    },

    /// Footprint matching ran out of candidates before reaching the set count.
    #[error("no composite set fits remaining quota {remaining_quota}: {needed_count} more set(s) needed")]
    NoValidCompositeSet {
        remaining_quota: DifficultyCounts,
        needed_count: u32,
    },

    /// A question id was selected twice within one run.
    #[error("question {question_id} selected more than once")]
    DuplicateQuestion { question_id: String },

    /// A selection failure annotated with the section it occurred in.
    #[error("section {section_id}: {source}")]
    Section {
        section_id: String,
        #[source]
        source: Box<AssemblyError>,
    },
}

fn fmt_section(section_id: &Option<String>) -> String {
    match section_id {
        Some(id) => format!(" in section {id}"),
        None => String::new(),
    }
}

impl AssemblyError {
    pub(crate) fn schema(
        source_id: &str,
        record: impl Into<String>,
        field: &str,
        reason: impl Into<String>,
    ) -> Self {
        AssemblyError::SchemaMismatch {
            source_id: source_id.to_string(),
            record: record.into(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn blueprint(
        section_id: Option<&str>,
        message: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        AssemblyError::BlueprintValidation {
            section_id: section_id.map(str::to_string),
            message: message.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Wrap this error with the owning section id.
    pub fn in_section(self, section_id: &str) -> Self {
        AssemblyError::Section {
            section_id: section_id.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping section annotations.
    pub fn root(&self) -> &AssemblyError {
        match self {
            AssemblyError::Section { source, .. } => source.root(),
            other => other,
        }
    }

    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self.root() {
            AssemblyError::SchemaMismatch { .. } => "SchemaMismatchError",
            AssemblyError::InvalidCompositeSet { .. } => "InvalidCompositeSetError",
            AssemblyError::BlueprintValidation { .. } => "BlueprintValidationError",
            AssemblyError::InsufficientQuestions { .. } => "InsufficientQuestionsError",
            AssemblyError::NoValidCompositeSet { .. } => "NoValidCompositeSetError",
            AssemblyError::DuplicateQuestion { .. } => "DuplicateQuestionError",
            AssemblyError::Section { .. } => "SectionError",
        }
    }

    /// Build the structured report a caller can print or log.
    pub fn report(&self) -> ErrorReport {
        let mut report = ErrorReport {
            kind: self.kind().to_string(),
            message: self.to_string(),
            ..Default::default()
        };

        let mut current = self;
        while let AssemblyError::Section { section_id, source } = current {
            report.section_id.get_or_insert_with(|| section_id.clone());
            current = source.as_ref();
        }

        match current {
            AssemblyError::SchemaMismatch {
                source_id, field, ..
            } => {
                report.source = Some(source_id.clone());
                report.field = Some(field.clone());
            }
            AssemblyError::InvalidCompositeSet {
                source_id,
                set_id,
                expected,
                actual,
            } => {
                report.source = Some(source_id.clone());
                report.set_id = Some(set_id.clone());
                report.expected = Some(expected.to_string());
                report.actual = Some(actual.to_string());
            }
            AssemblyError::BlueprintValidation {
                section_id,
                expected,
                actual,
                ..
            } => {
                if report.section_id.is_none() {
                    report.section_id = section_id.clone();
                }
                report.expected = Some(expected.clone());
                report.actual = Some(actual.clone());
            }
            AssemblyError::InsufficientQuestions {
                topic,
                difficulty,
                required,
                available,
                missing,
            } => {
                report.topic = Some(topic.clone());
                report.difficulty = Some(*difficulty);
                report.required = Some(*required);
                report.available = Some(*available);
                report.missing = Some(*missing);
            }
            AssemblyError::NoValidCompositeSet {
                remaining_quota,
                needed_count,
            } => {
                report.remaining_quota = Some(*remaining_quota);
                report.required = Some(*needed_count);
            }
            AssemblyError::DuplicateQuestion { question_id } => {
                report.question_id = Some(question_id.clone());
            }
            AssemblyError::Section { .. } => {}
        }

        report
    }
}

/// Serializable diagnostic for a failed run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_quota: Option<DifficultyCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
}
