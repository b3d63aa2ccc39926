//! The `examforge generate` command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use comfy_table::{Cell, Table};

use examforge_core::engine::TestAssembler;
use examforge_core::model::Difficulty;
use examforge_core::parser;
use examforge_core::report::{GeneratedTest, PipelineEntry, PipelineReport};

use super::{
    blueprint_paths, error_report, load_catalog, print_error_report, resolve_config, test_output_path,
    ConsoleReporter,
};

pub fn execute(
    blueprint_path: PathBuf,
    pool_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    test_id: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = resolve_config(config_path.as_deref(), pool_dir, output)?;
    let catalog = load_catalog(&config)?;
    let assembler = TestAssembler::new(&catalog, config.engine_config());

    if !blueprint_path.is_dir() {
        let paths = blueprint_paths(&blueprint_path)?;
        return match generate_one(&assembler, &paths[0], test_id, &config.output_dir) {
            Ok((test, path)) => {
                print_summary(&test);
                println!("Saved {} to {}", test.test_id, path.display());
                Ok(())
            }
            Err(e) => {
                print_error_report(&error_report(&e));
                Err(e)
            }
        };
    }

    anyhow::ensure!(
        test_id.is_none(),
        "--test-id can only be used with a single blueprint file"
    );

    let mut entries = Vec::new();
    for path in blueprint_paths(&blueprint_path)? {
        eprintln!("Blueprint: {}", path.display());
        let entry = match generate_one(&assembler, &path, None, &config.output_dir) {
            Ok((test, out)) => {
                println!("  {} -> {}", test.test_id, out.display());
                PipelineEntry {
                    blueprint: path.display().to_string(),
                    test_id: Some(test.test_id),
                    success: true,
                    output: Some(out.display().to_string()),
                    error: None,
                }
            }
            Err(e) => {
                let report = error_report(&e);
                println!("  FAILED: {}", report.message);
                tracing::warn!(blueprint = %path.display(), kind = %report.kind, "generation failed");
                PipelineEntry {
                    blueprint: path.display().to_string(),
                    test_id: None,
                    success: false,
                    output: None,
                    error: Some(report),
                }
            }
        };
        entries.push(entry);
    }

    let report = PipelineReport::new(entries);
    let report_path = config.output_dir.join("pipeline_report.json");
    report.save_json(&report_path)?;
    println!(
        "\n{}/{} blueprints generated. Report: {}",
        report.succeeded,
        report.total,
        report_path.display()
    );

    if report.failed > 0 {
        anyhow::bail!("{} of {} blueprints failed", report.failed, report.total);
    }
    Ok(())
}

fn generate_one(
    assembler: &TestAssembler<'_>,
    path: &Path,
    test_id: Option<String>,
    output_dir: &Path,
) -> Result<(GeneratedTest, PathBuf)> {
    let mut doc = parser::parse_blueprint(path)?;
    if test_id.is_some() {
        doc.test_id = test_id;
    }
    let test = assembler.generate(&doc, &ConsoleReporter)?;
    let out = test_output_path(output_dir, &test.test_id)?;
    test.save_json(&out)?;
    Ok((test, out))
}

fn print_summary(test: &GeneratedTest) {
    let mut table = Table::new();
    table.set_header(vec!["Section", "Questions", "Easy", "Medium", "Hard", "Sets"]);
    for section in &test.sections {
        let counts = section.difficulty_counts;
        table.add_row(vec![
            Cell::new(&section.section_id),
            Cell::new(section.questions.len()),
            Cell::new(counts.get(Difficulty::Easy)),
            Cell::new(counts.get(Difficulty::Medium)),
            Cell::new(counts.get(Difficulty::Hard)),
            Cell::new(section.composite_sets.len()),
        ]);
    }
    println!("{} ({})\n{table}", test.test_name, test.test_id);
}
