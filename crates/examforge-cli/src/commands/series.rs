//! The `examforge series` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use examforge_core::engine::TestAssembler;
use examforge_core::parser;
use examforge_core::statistics::overlap_report;
use examforge_core::validator::validate_blueprint;

use super::{load_catalog, print_error_report, resolve_config, test_output_path, ConsoleReporter};

pub fn execute(
    blueprint_path: PathBuf,
    count: u32,
    prefix: Option<String>,
    pool_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(count >= 1, "count must be at least 1");

    let config = resolve_config(config_path.as_deref(), pool_dir, output)?;
    let catalog = load_catalog(&config)?;
    let doc = parser::parse_blueprint(&blueprint_path)?;
    let validated = validate_blueprint(&doc, &catalog)
        .with_context(|| format!("invalid blueprint: {}", blueprint_path.display()))?;
    for w in &validated.warnings {
        tracing::warn!(section = w.section_id.as_deref().unwrap_or("-"), "{}", w.message);
    }

    let blueprint = validated.blueprint;
    let prefix = prefix.unwrap_or_else(|| blueprint.test_id.clone());
    let assembler = TestAssembler::new(&catalog, config.engine_config());
    let tests = match assembler.generate_series(&blueprint, count, &prefix, &ConsoleReporter) {
        Ok(tests) => tests,
        Err(e) => {
            print_error_report(&e.report());
            return Err(e.into());
        }
    };

    for test in &tests {
        let path = test_output_path(&config.output_dir, &test.test_id)?;
        test.save_json(&path)?;
        println!("Saved {} to {}", test.test_id, path.display());
    }

    let mut table = Table::new();
    table.set_header(vec!["Test", "Questions", "Unique", "Repeated", "Overlap"]);
    for entry in overlap_report(&tests) {
        table.add_row(vec![
            Cell::new(&entry.test_id),
            Cell::new(entry.total_count),
            Cell::new(entry.unique_count),
            Cell::new(entry.repeated_count),
            Cell::new(format!("{:.1}%", entry.overlap_percent)),
        ]);
    }
    println!("\n{table}");

    Ok(())
}
