//! Generated test documents with JSON persistence.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ErrorReport;
use crate::model::{DifficultyCounts, Question, COMPOSITE_TOPIC};

/// The assembled test. This is the engine's only output artifact.
///
/// Contains no wall-clock data, so the same blueprint, pools and test id
/// always serialize to the same bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedTest {
    pub test_id: String,
    pub test_name: String,
    /// Hex SHA-256 of the test id; the selection seed.
    pub seed: String,
    pub total_questions: u32,
    pub total_marks: f64,
    pub marks_per_question: f64,
    pub duration_minutes: u32,
    /// Whether selection units were shuffled after drawing.
    pub shuffled: bool,
    pub sections: Vec<GeneratedSection>,
}

/// One assembled section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedSection {
    pub section_id: String,
    pub section_name: String,
    pub total_questions: u32,
    pub questions: Vec<SelectedQuestion>,
    pub difficulty_counts: DifficultyCounts,
    /// Keyed like the blueprint's `topic_distribution`: composite sets are
    /// counted as sets under the composite topic.
    pub topic_counts: BTreeMap<String, u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub composite_sets: Vec<CompositeSummary>,
    pub remaining_quota_after_composite: DifficultyCounts,
}

/// A question as placed in a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedQuestion {
    /// 1-based position within the section.
    pub question_number: u32,
    #[serde(flatten)]
    pub question: Question,
    /// Originating composite set, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_id: Option<String>,
}

/// A composite set chosen for a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeSummary {
    pub set_id: String,
    pub topic: String,
    pub footprint: DifficultyCounts,
    pub question_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl GeneratedTest {
    /// Every selected question across all sections, in order.
    pub fn questions(&self) -> impl Iterator<Item = &SelectedQuestion> {
        self.sections.iter().flat_map(|s| s.questions.iter())
    }

    pub fn question_ids(&self) -> impl Iterator<Item = &str> {
        self.questions().map(|q| q.question.id.as_str())
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        load_json(path)
    }
}

/// Count questions per topic, counting each tagged composite set once under
/// the composite topic.
pub fn topic_counts(questions: &[SelectedQuestion]) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    let mut sets = std::collections::BTreeSet::new();
    for q in questions {
        match &q.set_id {
            Some(set_id) => {
                if sets.insert(set_id.as_str()) {
                    *counts.entry(COMPOSITE_TOPIC.to_string()).or_insert(0) += 1;
                }
            }
            None => *counts.entry(q.question.topic.clone()).or_insert(0) += 1,
        }
    }
    counts
}

/// Outcome of one blueprint in a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEntry {
    pub blueprint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

/// Summary of generating every blueprint in a directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub created_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub entries: Vec<PipelineEntry>,
}

impl PipelineReport {
    pub fn new(entries: Vec<PipelineEntry>) -> Self {
        let succeeded = entries.iter().filter(|e| e.success).count();
        Self {
            created_at: Utc::now(),
            total: entries.len(),
            succeeded,
            failed: entries.len() - succeeded,
            entries,
        }
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }
}

/// Write `value` as pretty JSON, creating parent directories.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize document")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Read a JSON document from `path`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse JSON in {}", path.display()))
}
