//! Blueprint documents.
//!
//! [`BlueprintDocument`] is the loosely-typed shape read from disk. Only the
//! validator turns it into a [`Blueprint`], so every typed blueprint has
//! already passed the quota arithmetic checks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{DifficultyCounts, COMPOSITE_SET_SIZE, COMPOSITE_TOPIC};

/// Raw blueprint as authored. Every field is optional here so that a missing
/// field is reported by the validator rather than by the deserializer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlueprintDocument {
    #[serde(default)]
    pub test_id: Option<String>,
    #[serde(default)]
    pub test_name: Option<String>,
    #[serde(default)]
    pub total_questions: Option<Value>,
    #[serde(default)]
    pub sections: Option<Vec<SectionDocument>>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub total_marks: Option<f64>,
    #[serde(default)]
    pub marks_per_question: Option<f64>,
    #[serde(default)]
    pub shuffle_questions: Option<bool>,
}

/// Raw section entry of a [`BlueprintDocument`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionDocument {
    #[serde(default)]
    pub section_id: Option<String>,
    #[serde(default)]
    pub section_name: Option<String>,
    #[serde(default)]
    pub total_questions: Option<Value>,
    #[serde(default)]
    pub source_files: Option<Vec<String>>,
    #[serde(default)]
    pub topic_distribution: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub difficulty_distribution: Option<BTreeMap<String, Value>>,
}

/// A validated blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    /// Unique test identifier; also the selection seed.
    pub test_id: String,
    pub test_name: String,
    pub total_questions: u32,
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_marks: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks_per_question: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shuffle_questions: Option<bool>,
}

impl Blueprint {
    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.section_id == section_id)
    }

    /// Every source identifier referenced by any section, deduplicated.
    pub fn source_files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self
            .sections
            .iter()
            .flat_map(|s| s.source_files.iter().map(String::as_str))
            .collect();
        files.sort_unstable();
        files.dedup();
        files
    }

    /// Return a copy with a different test id (and therefore a different seed).
    pub fn with_test_id(&self, test_id: impl Into<String>) -> Blueprint {
        let test_id = test_id.into();
        let test_name = if self.test_name == self.test_id {
            test_id.clone()
        } else {
            self.test_name.clone()
        };
        Blueprint {
            test_id,
            test_name,
            ..self.clone()
        }
    }
}

/// One validated section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub section_id: String,
    pub section_name: String,
    pub total_questions: u32,
    pub source_files: Vec<String>,
    /// Topic to question count; the composite topic maps to a set count.
    pub topic_distribution: BTreeMap<String, u32>,
    pub difficulty_distribution: DifficultyCounts,
}

impl Section {
    /// Number of whole composite sets this section requires.
    pub fn composite_sets(&self) -> u32 {
        self.topic_distribution
            .get(COMPOSITE_TOPIC)
            .copied()
            .unwrap_or(0)
    }

    /// Question slots taken by composite sets.
    pub fn composite_questions(&self) -> u64 {
        u64::from(self.composite_sets()) * COMPOSITE_SET_SIZE as u64
    }

    /// Standalone topics and their question counts, in topic order.
    pub fn standalone_topics(&self) -> impl Iterator<Item = (&str, u32)> {
        self.topic_distribution
            .iter()
            .filter(|(topic, _)| topic.as_str() != COMPOSITE_TOPIC)
            .map(|(topic, &count)| (topic.as_str(), count))
    }

    /// Topic total in question units.
    pub fn topic_question_total(&self) -> u64 {
        topic_question_total(&self.topic_distribution)
    }
}

/// Sum a topic distribution in question units, counting the composite entry
/// as sets of [`COMPOSITE_SET_SIZE`]. Widened so that no quota can wrap.
pub fn topic_question_total(topics: &BTreeMap<String, u32>) -> u64 {
    topics
        .iter()
        .map(|(topic, &count)| {
            let count = u64::from(count);
            if topic == COMPOSITE_TOPIC {
                count * COMPOSITE_SET_SIZE as u64
            } else {
                count
            }
        })
        .sum()
}
