//! Question pool normalizer.
//!
//! Each known source schema is a [`SourceKind`] with one fixed field mapping.
//! Normalization is a pure transform from a raw JSON document into a
//! [`QuestionPool`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AssemblyError;
use crate::model::{
    CompositeSet, Difficulty, OptionLabel, Question, QuestionPool, COMPOSITE_SET_SIZE,
    COMPOSITE_TOPIC,
};

type Record = Map<String, Value>;

/// Known source schema variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    English,
    GeneralAwareness,
    Reasoning,
    Quantitative,
    /// Composite data-interpretation sets of five questions each.
    DataInterpretation,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        SourceKind::English,
        SourceKind::GeneralAwareness,
        SourceKind::Reasoning,
        SourceKind::Quantitative,
        SourceKind::DataInterpretation,
    ];

    /// Subject label used when a record carries no `subject` field.
    pub fn default_subject(self) -> &'static str {
        match self {
            SourceKind::English => "English Language",
            SourceKind::GeneralAwareness => "General Awareness",
            SourceKind::Reasoning => "Reasoning Ability",
            SourceKind::Quantitative | SourceKind::DataInterpretation => "Quantitative Aptitude",
        }
    }

    /// Field names tried, in order, to resolve a question's topic.
    fn topic_fields(self) -> &'static [&'static str] {
        match self {
            SourceKind::Reasoning => &["topic", "reasoning_topic"],
            _ => &["topic"],
        }
    }

    pub fn is_composite(self) -> bool {
        matches!(self, SourceKind::DataInterpretation)
    }

    /// Guess the kind from a source identifier such as a file name.
    pub fn infer(source_id: &str) -> Option<SourceKind> {
        let name = source_id.to_lowercase();
        if name.starts_with("di_") || name.contains("data_interpretation") || name.contains("di_master")
        {
            Some(SourceKind::DataInterpretation)
        } else if name.contains("english") {
            Some(SourceKind::English)
        } else if name.contains("general_awareness") || name.starts_with("ga_") {
            Some(SourceKind::GeneralAwareness)
        } else if name.contains("reasoning") {
            Some(SourceKind::Reasoning)
        } else if name.contains("arithmetic") || name.contains("quant") {
            Some(SourceKind::Quantitative)
        } else {
            None
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::English => write!(f, "english"),
            SourceKind::GeneralAwareness => write!(f, "general_awareness"),
            SourceKind::Reasoning => write!(f, "reasoning"),
            SourceKind::Quantitative => write!(f, "quantitative"),
            SourceKind::DataInterpretation => write!(f, "data_interpretation"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "english" => Ok(SourceKind::English),
            "general_awareness" | "ga" => Ok(SourceKind::GeneralAwareness),
            "reasoning" => Ok(SourceKind::Reasoning),
            "quantitative" | "quant" | "arithmetic" => Ok(SourceKind::Quantitative),
            "data_interpretation" | "di" => Ok(SourceKind::DataInterpretation),
            other => Err(format!("unknown source kind: {other}")),
        }
    }
}

/// Normalize a raw source document into a pool.
///
/// The document is either `{"questions": [...]}` or a bare array of records.
pub fn normalize_source(
    raw: &Value,
    kind: SourceKind,
    source_id: &str,
) -> Result<QuestionPool, AssemblyError> {
    let records = records_of(raw, source_id)?;
    let mut pool = QuestionPool::new(source_id);

    if kind.is_composite() {
        let mut sets = Vec::with_capacity(records.len());
        for (idx, value) in records.iter().enumerate() {
            let record = as_record(value, source_id, idx)?;
            sets.push(normalize_composite(record, kind, source_id, idx)?);
        }
        pool.composite.insert(COMPOSITE_TOPIC.to_string(), sets);
    } else {
        for (idx, value) in records.iter().enumerate() {
            let record = as_record(value, source_id, idx)?;
            let question = normalize_question(record, kind, source_id, idx, None)?;
            pool.standalone
                .entry(question.topic.clone())
                .or_default()
                .push(question);
        }
    }

    tracing::debug!(
        source = source_id,
        kind = %kind,
        standalone = pool.standalone_count(),
        composite = pool.composite_sets().count(),
        "normalized source"
    );

    Ok(pool)
}

fn records_of<'a>(raw: &'a Value, source_id: &str) -> Result<&'a Vec<Value>, AssemblyError> {
    match raw {
        Value::Array(items) => Ok(items),
        Value::Object(obj) => match obj.get("questions") {
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(AssemblyError::schema(
                source_id,
                "<document>",
                "questions",
                "must be an array",
            )),
            None => Err(AssemblyError::schema(
                source_id,
                "<document>",
                "questions",
                "is missing",
            )),
        },
        _ => Err(AssemblyError::schema(
            source_id,
            "<document>",
            "questions",
            "document must be an object or an array",
        )),
    }
}

fn as_record<'a>(value: &'a Value, source_id: &str, idx: usize) -> Result<&'a Record, AssemblyError> {
    value.as_object().ok_or_else(|| {
        AssemblyError::schema(source_id, format!("#{idx}"), "<record>", "must be an object")
    })
}

/// Human-readable record locator for diagnostics.
fn locator(record: &Record, idx: usize) -> String {
    ["question_id", "di_set_id"]
        .iter()
        .find_map(|k| record.get(*k).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{idx}"))
}

/// First present, non-empty string among `fields`.
fn string_field(record: &Record, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|f| {
        record
            .get(*f)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn required_string(
    record: &Record,
    fields: &[&str],
    source_id: &str,
    at: &str,
) -> Result<String, AssemblyError> {
    string_field(record, fields)
        .ok_or_else(|| AssemblyError::schema(source_id, at, fields[0], "is missing or empty"))
}

fn normalize_question(
    record: &Record,
    kind: SourceKind,
    source_id: &str,
    idx: usize,
    inherited_topic: Option<&str>,
) -> Result<Question, AssemblyError> {
    let at = locator(record, idx);

    let id = required_string(record, &["question_id"], source_id, &at)?;
    let text = required_string(record, &["question", "question_text"], source_id, &at)?;

    let options = match record.get("options") {
        Some(Value::Object(raw_options)) => {
            let mut options = BTreeMap::new();
            for (label, text) in raw_options {
                let label: OptionLabel = label
                    .parse()
                    .map_err(|e: String| AssemblyError::schema(source_id, &at, "options", e))?;
                let text = text.as_str().ok_or_else(|| {
                    AssemblyError::schema(source_id, &at, "options", "option text must be a string")
                })?;
                options.insert(label, text.to_string());
            }
            options
        }
        Some(_) => {
            return Err(AssemblyError::schema(
                source_id,
                &at,
                "options",
                "must be an object of label to text",
            ))
        }
        None => return Err(AssemblyError::schema(source_id, &at, "options", "is missing")),
    };
    if options.is_empty() {
        return Err(AssemblyError::schema(source_id, &at, "options", "is empty"));
    }

    let correct_answer: OptionLabel =
        required_string(record, &["correct_answer", "answer"], source_id, &at)?
            .parse()
            .map_err(|e: String| AssemblyError::schema(source_id, &at, "correct_answer", e))?;
    if !options.contains_key(&correct_answer) {
        return Err(AssemblyError::schema(
            source_id,
            &at,
            "correct_answer",
            format!("'{correct_answer}' is not one of the options"),
        ));
    }

    let difficulty: Difficulty = required_string(record, &["difficulty"], source_id, &at)?
        .parse()
        .map_err(|e: String| AssemblyError::schema(source_id, &at, "difficulty", e))?;

    let topic = match (string_field(record, kind.topic_fields()), inherited_topic) {
        (Some(topic), _) => topic,
        (None, Some(inherited)) => inherited.to_string(),
        (None, None) => {
            return Err(AssemblyError::schema(
                source_id,
                &at,
                kind.topic_fields()[0],
                "is missing or empty",
            ))
        }
    };

    Ok(Question {
        id,
        text,
        options,
        correct_answer,
        explanation: string_field(record, &["explanation"]).unwrap_or_default(),
        difficulty,
        topic,
        sub_topic: string_field(record, &["sub_topic", "subtopic"]),
        subject: string_field(record, &["subject"])
            .unwrap_or_else(|| kind.default_subject().to_string()),
        category: string_field(record, &["category"]),
        source: source_id.to_string(),
    })
}

fn normalize_composite(
    record: &Record,
    kind: SourceKind,
    source_id: &str,
    idx: usize,
) -> Result<CompositeSet, AssemblyError> {
    let at = locator(record, idx);
    let set_id = required_string(record, &["di_set_id", "set_id"], source_id, &at)?;
    let topic = required_string(record, &["topic"], source_id, &at)?;

    // The set-level `difficulty` field is a human label and is never read.
    let members = match record.get("questions") {
        Some(Value::Array(members)) => members,
        Some(_) => {
            return Err(AssemblyError::schema(
                source_id,
                &at,
                "questions",
                "must be an array",
            ))
        }
        None => return Err(AssemblyError::schema(source_id, &at, "questions", "is missing")),
    };

    if members.len() != COMPOSITE_SET_SIZE {
        return Err(AssemblyError::InvalidCompositeSet {
            source_id: source_id.to_string(),
            set_id,
            expected: COMPOSITE_SET_SIZE,
            actual: members.len(),
        });
    }

    let questions = members
        .iter()
        .enumerate()
        .map(|(member_idx, value)| {
            let member = as_record(value, source_id, member_idx)?;
            normalize_question(member, kind, source_id, member_idx, Some(&topic))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CompositeSet {
        set_id,
        topic,
        context: record
            .get("data")
            .or_else(|| record.get("passage"))
            .cloned(),
        questions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_question(id: &str, difficulty: &str) -> Value {
        json!({
            "question_id": id,
            "question": "What is 2 + 2?",
            "options": {"A": "3", "B": "4", "C": "5", "D": "6"},
            "correct_answer": "B",
            "explanation": "Basic addition.",
            "difficulty": difficulty,
            "topic": "Simplification"
        })
    }

    fn raw_set(id: &str, members: usize) -> Value {
        let questions: Vec<Value> = (0..members)
            .map(|i| {
                let mut q = raw_question(&format!("{id}_Q{i}"), "Medium");
                q.as_object_mut().unwrap().remove("topic");
                q
            })
            .collect();
        json!({
            "di_set_id": id,
            "topic": "Bar Chart - Sales",
            "difficulty": "Easy",
            "data": {"2019": 120, "2020": 140},
            "questions": questions
        })
    }

    #[test]
    fn normalizes_standalone_document() {
        let raw = json!({"questions": [raw_question("Q1", "Easy"), raw_question("Q2", "Hard")]});
        let pool = normalize_source(&raw, SourceKind::Quantitative, "arith.json").unwrap();

        let topic = &pool.standalone["Simplification"];
        assert_eq!(topic.len(), 2);
        assert_eq!(topic[0].subject, "Quantitative Aptitude");
        assert_eq!(topic[0].source, "arith.json");
        assert_eq!(topic[1].difficulty, Difficulty::Hard);
        assert!(!pool.has_composite());
    }

    #[test]
    fn accepts_bare_array_and_aliases() {
        let raw = json!([{
            "question_id": "R1",
            "question_text": "Pick the odd one",
            "options": {"A": "x", "B": "y", "C": "z", "D": "w", "E": "v"},
            "answer": "e",
            "difficulty": "medium",
            "reasoning_topic": "Syllogism",
            "subtopic": "Either-or",
            "subject": "Reasoning"
        }]);
        let pool = normalize_source(&raw, SourceKind::Reasoning, "reasoning.json").unwrap();
        let q = &pool.standalone["Syllogism"][0];
        assert_eq!(q.correct_answer, OptionLabel::E);
        assert_eq!(q.sub_topic.as_deref(), Some("Either-or"));
        assert_eq!(q.subject, "Reasoning");
    }

    #[test]
    fn reasoning_alias_not_used_for_other_kinds() {
        let mut q = raw_question("E1", "Easy");
        let obj = q.as_object_mut().unwrap();
        obj.remove("topic");
        obj.insert("reasoning_topic".into(), json!("Syllogism"));

        let err = normalize_source(&json!([q]), SourceKind::English, "english.json").unwrap_err();
        assert!(matches!(
            err,
            AssemblyError::SchemaMismatch { ref field, .. } if field == "topic"
        ));
    }

    #[test]
    fn missing_required_field_is_schema_mismatch() {
        let mut q = raw_question("Q1", "Easy");
        q.as_object_mut().unwrap().remove("difficulty");
        let err = normalize_source(&json!([q]), SourceKind::English, "english.json").unwrap_err();
        match err {
            AssemblyError::SchemaMismatch { record, field, .. } => {
                assert_eq!(record, "Q1");
                assert_eq!(field, "difficulty");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn correct_answer_must_be_an_option() {
        let mut q = raw_question("Q1", "Easy");
        q["correct_answer"] = json!("E");
        let err = normalize_source(&json!([q]), SourceKind::English, "english.json").unwrap_err();
        assert!(matches!(
            err,
            AssemblyError::SchemaMismatch { ref field, .. } if field == "correct_answer"
        ));
    }

    #[test]
    fn composite_sets_inherit_topic_and_ignore_set_difficulty() {
        let raw = json!({"questions": [raw_set("DI_BAR_001", 5)]});
        let pool = normalize_source(&raw, SourceKind::DataInterpretation, "di.json").unwrap();

        let sets = &pool.composite[COMPOSITE_TOPIC];
        assert_eq!(sets.len(), 1);
        let set = &sets[0];
        assert_eq!(set.set_id, "DI_BAR_001");
        assert_eq!(set.questions[0].topic, "Bar Chart - Sales");
        // Set is labelled Easy but every member is Medium.
        assert_eq!(set.footprint().get(Difficulty::Medium), 5);
        assert_eq!(set.footprint().get(Difficulty::Easy), 0);
        assert_eq!(set.context.as_ref().unwrap()["2020"], 140);
        assert!(pool.standalone.is_empty());
    }

    #[test]
    fn composite_with_wrong_member_count_fails() {
        let raw = json!([raw_set("DI_PIE_002", 4)]);
        let err = normalize_source(&raw, SourceKind::DataInterpretation, "di.json").unwrap_err();
        assert_eq!(
            err,
            AssemblyError::InvalidCompositeSet {
                source_id: "di.json".into(),
                set_id: "DI_PIE_002".into(),
                expected: 5,
                actual: 4,
            }
        );
    }

    #[test]
    fn infer_kind_from_file_name() {
        assert_eq!(
            SourceKind::infer("di_master_question_bank.json"),
            Some(SourceKind::DataInterpretation)
        );
        assert_eq!(
            SourceKind::infer("english_master_question_bank.json"),
            Some(SourceKind::English)
        );
        assert_eq!(
            SourceKind::infer("general_awareness_master_question_bank.json"),
            Some(SourceKind::GeneralAwareness)
        );
        assert_eq!(
            SourceKind::infer("arithmetic_master_question_bank.json"),
            Some(SourceKind::Quantitative)
        );
        assert_eq!(SourceKind::infer("misc.json"), None);
        assert_eq!("di".parse::<SourceKind>().unwrap(), SourceKind::DataInterpretation);
    }
}
