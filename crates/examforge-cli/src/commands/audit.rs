//! The `examforge audit` command.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use examforge_core::audit::audit_test;
use examforge_core::model::Difficulty;
use examforge_core::parser;
use examforge_core::report::GeneratedTest;
use examforge_core::validator::validate_blueprint;

pub fn execute(test_path: PathBuf, blueprint_path: PathBuf, json: bool) -> Result<()> {
    let test = GeneratedTest::load_json(&test_path)?;
    let doc = parser::parse_blueprint(&blueprint_path)?;

    // Pools are not reread for an audit; every named source counts as known.
    let sources: BTreeSet<String> = doc
        .sections
        .iter()
        .flatten()
        .flat_map(|s| s.source_files.iter().flatten().cloned())
        .collect();
    let blueprint = validate_blueprint(&doc, &sources)
        .with_context(|| format!("invalid blueprint: {}", blueprint_path.display()))?
        .blueprint;

    let report = audit_test(&test, &blueprint);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let status = if report.passed { "PASSED" } else { "FAILED" };
        println!(
            "Audit {}: {status} ({} questions)",
            report.test_id, report.total_questions
        );

        let mut table = Table::new();
        table.set_header(vec!["Section", "Easy", "Medium", "Hard"]);
        for (section_id, counts) in &report.section_difficulty {
            table.add_row(vec![
                Cell::new(section_id),
                Cell::new(counts.get(Difficulty::Easy)),
                Cell::new(counts.get(Difficulty::Medium)),
                Cell::new(counts.get(Difficulty::Hard)),
            ]);
        }
        println!("{table}");

        for e in &report.errors {
            println!("  ERROR: {e}");
        }
        for w in &report.warnings {
            println!("  WARNING: {w}");
        }
    }

    if !report.passed {
        anyhow::bail!("audit failed with {} error(s)", report.errors.len());
    }
    Ok(())
}
