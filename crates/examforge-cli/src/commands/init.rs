//! The `examforge init` command.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Value};

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("examforge.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("pools")?;
    write_if_missing(
        Path::new("pools/english_sample.json"),
        &serde_json::to_string_pretty(&english_pool())?,
    )?;
    write_if_missing(
        Path::new("pools/di_sample.json"),
        &serde_json::to_string_pretty(&di_pool())?,
    )?;

    std::fs::create_dir_all("blueprints")?;
    write_if_missing(Path::new("blueprints/example.json"), EXAMPLE_BLUEPRINT)?;

    println!("\nNext steps:");
    println!("  1. Add your question banks to pools/");
    println!("  2. Run: examforge validate --blueprint blueprints/example.json");
    println!("  3. Run: examforge generate --blueprint blueprints/example.json");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const LEVELS: [&str; 3] = ["Easy", "Medium", "Hard"];

fn sample_question(id: &str, difficulty: &str, topic: Option<&str>) -> Value {
    let mut q = json!({
        "question_id": id,
        "question": format!("Sample question {id}"),
        "options": {"A": "first", "B": "second", "C": "third", "D": "fourth"},
        "correct_answer": "B",
        "explanation": "Replace with a worked explanation.",
        "difficulty": difficulty,
    });
    if let Some(topic) = topic {
        q["topic"] = json!(topic);
    }
    q
}

fn english_pool() -> Value {
    let mut questions = Vec::new();
    for (prefix, topic) in [("SYN", "Synonyms"), ("ANT", "Antonyms")] {
        for level in LEVELS {
            for i in 1..=4 {
                let id = format!("ENG_{prefix}_{}_{i}", &level[..1]);
                questions.push(sample_question(&id, level, Some(topic)));
            }
        }
    }
    json!({ "questions": questions })
}

fn di_pool() -> Value {
    let sets: Vec<Value> = (1..=3)
        .map(|n| {
            let set_id = format!("DI_SAMPLE_{n:03}");
            let members: Vec<Value> = ["Easy", "Easy", "Medium", "Medium", "Hard"]
                .iter()
                .enumerate()
                .map(|(i, level)| sample_question(&format!("{set_id}_Q{}", i + 1), level, None))
                .collect();
            json!({
                "di_set_id": set_id,
                "topic": "Table - Quarterly Sales",
                "data": {"Q1": 120, "Q2": 135, "Q3": 150, "Q4": 110},
                "questions": members
            })
        })
        .collect();
    json!({ "questions": sets })
}

const SAMPLE_CONFIG: &str = r#"# examforge configuration

pool_dir = "./pools"
output_dir = "./generated-tests"
marks_per_question = 1.0
duration_minutes = 60
shuffle_questions = false

# Source kinds are inferred from file names; list any that are not.
[sources]
"english_sample.json" = "english"
"di_sample.json" = "data_interpretation"
"#;

const EXAMPLE_BLUEPRINT: &str = r#"{
  "test_id": "SAMPLE_01",
  "test_name": "Sample Mock Test 1",
  "total_questions": 18,
  "sections": [
    {
      "section_id": "ENG",
      "section_name": "English Language",
      "total_questions": 8,
      "source_files": ["english_sample.json"],
      "topic_distribution": {"Synonyms": 4, "Antonyms": 4},
      "difficulty_distribution": {"Easy": 3, "Medium": 3, "Hard": 2}
    },
    {
      "section_id": "DI",
      "section_name": "Data Interpretation",
      "total_questions": 10,
      "source_files": ["di_sample.json"],
      "topic_distribution": {"Data Interpretation": 2},
      "difficulty_distribution": {"Easy": 4, "Medium": 4, "Hard": 2}
    }
  ]
}
"#;
