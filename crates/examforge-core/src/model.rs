//! Core data model types for examforge.
//!
//! These are the canonical shapes every question source is normalized into,
//! and the per-difficulty counters used for quotas and composite footprints.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Topic tag reserved for composite (data-interpretation) sets.
///
/// In a blueprint's `topic_distribution` the count under this key is a number
/// of whole sets, not of questions.
pub const COMPOSITE_TOPIC: &str = "Data Interpretation";

/// Every composite set has exactly this many member questions.
pub const COMPOSITE_SET_SIZE: usize = 5;

/// Question difficulty.
///
/// Variants are ordered `Easy < Medium < Hard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// All difficulty levels in ascending order.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    fn slot(self) -> usize {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// Option label from the fixed answer alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
    E,
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
            OptionLabel::E => "E",
        };
        f.write_str(label)
    }
}

impl FromStr for OptionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(OptionLabel::A),
            "B" => Ok(OptionLabel::B),
            "C" => Ok(OptionLabel::C),
            "D" => Ok(OptionLabel::D),
            "E" => Ok(OptionLabel::E),
            other => Err(format!("unknown option label: {other}")),
        }
    }
}

/// A single multiple-choice question in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier across all pools.
    pub id: String,
    /// Question stem.
    pub text: String,
    /// Option label to option text.
    pub options: BTreeMap<OptionLabel, String>,
    /// Always a key of `options`.
    pub correct_answer: OptionLabel,
    #[serde(default)]
    pub explanation: String,
    pub difficulty: Difficulty,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_topic: Option<String>,
    /// Resolved subject label.
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Identifier of the source this question was loaded from.
    pub source: String,
}

/// Per-difficulty counts.
///
/// Used both as a quota (how many questions of each difficulty are still
/// needed) and as the footprint of a composite set (how many members of each
/// difficulty it contains).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DifficultyCounts([u32; 3]);

impl DifficultyCounts {
    pub const ZERO: DifficultyCounts = DifficultyCounts([0; 3]);

    pub fn new(easy: u32, medium: u32, hard: u32) -> Self {
        Self([easy, medium, hard])
    }

    /// Count the difficulties of a sequence of questions.
    pub fn tally<'a>(questions: impl IntoIterator<Item = &'a Question>) -> Self {
        let mut counts = Self::ZERO;
        for q in questions {
            counts[q.difficulty] += 1;
        }
        counts
    }

    pub fn get(&self, difficulty: Difficulty) -> u32 {
        self[difficulty]
    }

    pub fn total(&self) -> u32 {
        self.0.iter().fold(0, |acc, &c| acc.saturating_add(c))
    }

    /// Exact sum, widened so quota checks never saturate.
    pub fn sum(&self) -> u64 {
        self.0.iter().map(|&c| u64::from(c)).sum()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&c| c == 0)
    }

    /// Component-wise `self <= other`.
    pub fn fits_within(&self, other: &DifficultyCounts) -> bool {
        Difficulty::ALL.iter().all(|&d| self[d] <= other[d])
    }

    /// Component-wise subtraction, `None` if any component would go negative.
    pub fn checked_sub(&self, other: &DifficultyCounts) -> Option<DifficultyCounts> {
        let mut out = *self;
        for d in Difficulty::ALL {
            out[d] = self[d].checked_sub(other[d])?;
        }
        Some(out)
    }

    pub fn saturating_add(&self, other: &DifficultyCounts) -> DifficultyCounts {
        let mut out = *self;
        for d in Difficulty::ALL {
            out[d] = self[d].saturating_add(other[d]);
        }
        out
    }

    /// Iterate `(difficulty, count)` in ascending difficulty order.
    pub fn iter(&self) -> impl Iterator<Item = (Difficulty, u32)> + '_ {
        Difficulty::ALL.iter().map(move |&d| (d, self[d]))
    }

    /// Footprint key in `easy-medium-hard` form, e.g. `2-2-1`.
    pub fn key(&self) -> String {
        format!("{}-{}-{}", self.0[0], self.0[1], self.0[2])
    }

    pub fn to_map(&self) -> BTreeMap<Difficulty, u32> {
        self.iter().collect()
    }
}

impl Index<Difficulty> for DifficultyCounts {
    type Output = u32;

    fn index(&self, difficulty: Difficulty) -> &u32 {
        &self.0[difficulty.slot()]
    }
}

impl IndexMut<Difficulty> for DifficultyCounts {
    fn index_mut(&mut self, difficulty: Difficulty) -> &mut u32 {
        &mut self.0[difficulty.slot()]
    }
}

impl fmt::Display for DifficultyCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Easy:{}, Medium:{}, Hard:{}}}",
            self.0[0], self.0[1], self.0[2]
        )
    }
}

impl From<&BTreeMap<Difficulty, u32>> for DifficultyCounts {
    fn from(map: &BTreeMap<Difficulty, u32>) -> Self {
        let mut counts = Self::ZERO;
        for (&d, &c) in map {
            counts[d] = c;
        }
        counts
    }
}

// Serialized as `{"Easy": n, "Medium": n, "Hard": n}` so documents stay readable.
impl Serialize for DifficultyCounts {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DifficultyCounts {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<Difficulty, u32>::deserialize(deserializer)?;
        Ok(DifficultyCounts::from(&map))
    }
}

/// An atomic group of questions sharing one data context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeSet {
    pub set_id: String,
    /// Descriptive only; never used for difficulty accounting.
    pub topic: String,
    /// Shared context (table, chart data, passage) kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
    /// Exactly [`COMPOSITE_SET_SIZE`] members, in authored order.
    pub questions: Vec<Question>,
}

impl CompositeSet {
    /// Multiset of member difficulties.
    pub fn footprint(&self) -> DifficultyCounts {
        DifficultyCounts::tally(&self.questions)
    }

    pub fn member_ids(&self) -> impl Iterator<Item = &str> {
        self.questions.iter().map(|q| q.id.as_str())
    }
}

/// Normalized, read-only questions from one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionPool {
    /// Source identifier (e.g. `english_master_question_bank.json`).
    pub source: String,
    /// Standalone questions keyed by topic.
    pub standalone: BTreeMap<String, Vec<Question>>,
    /// Composite sets keyed by reserved topic tag.
    pub composite: BTreeMap<String, Vec<CompositeSet>>,
}

impl QuestionPool {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn standalone_count(&self) -> usize {
        self.standalone.values().map(Vec::len).sum()
    }

    pub fn composite_sets(&self) -> impl Iterator<Item = &CompositeSet> {
        self.composite.values().flatten()
    }

    pub fn has_composite(&self) -> bool {
        self.composite.values().any(|sets| !sets.is_empty())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_display_and_parse() {
        assert_eq!(Difficulty::Hard.to_string(), "Hard");
        assert_eq!("easy".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!(" Medium ".parse::<Difficulty>().unwrap(), Difficulty::Medium);
        assert!("extreme".parse::<Difficulty>().is_err());
    }

    #[test]
    fn option_label_parse() {
        assert_eq!("c".parse::<OptionLabel>().unwrap(), OptionLabel::C);
        assert!("F".parse::<OptionLabel>().is_err());
    }

    #[test]
    fn counts_arithmetic() {
        let quota = DifficultyCounts::new(10, 15, 5);
        let a = DifficultyCounts::new(2, 2, 1);
        let d = DifficultyCounts::new(0, 0, 6);

        assert!(a.fits_within(&quota));
        assert!(!d.fits_within(&quota));
        assert_eq!(quota.checked_sub(&a), Some(DifficultyCounts::new(8, 13, 4)));
        assert_eq!(quota.checked_sub(&d), None);
        assert_eq!(quota.total(), 30);
        assert_eq!(a.key(), "2-2-1");

        let huge = DifficultyCounts::new(u32::MAX, 5, 0);
        assert_eq!(huge.total(), u32::MAX);
        assert_eq!(huge.sum(), u64::from(u32::MAX) + 5);
    }

    #[test]
    fn counts_serialize_as_named_map() {
        let counts = DifficultyCounts::new(1, 2, 3);
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"Easy":1,"Medium":2,"Hard":3}"#);

        let back: DifficultyCounts = serde_json::from_str(r#"{"Hard":4}"#).unwrap();
        assert_eq!(back, DifficultyCounts::new(0, 0, 4));
    }

    #[test]
    fn footprint_is_derived_from_members() {
        let set = fixtures::composite("DI_001", 2, 2, 1);
        assert_eq!(set.questions.len(), COMPOSITE_SET_SIZE);
        assert_eq!(set.footprint(), DifficultyCounts::new(2, 2, 1));
    }

    #[test]
    fn question_serde_uses_label_keys() {
        let q = fixtures::question("Q1", "Percentages", Difficulty::Easy);
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["options"]["A"], "alpha");
        assert_eq!(json["correct_answer"], "B");
        assert!(json.get("sub_topic").is_none());
    }
}
