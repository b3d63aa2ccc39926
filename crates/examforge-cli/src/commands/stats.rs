//! The `examforge stats` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use examforge_core::model::Difficulty;
use examforge_core::parser;
use examforge_core::statistics::{capacity, pool_statistics};
use examforge_core::validator::validate_blueprint;

use super::{load_catalog, resolve_config};

pub fn execute(
    pool_dir: Option<PathBuf>,
    blueprint_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = resolve_config(config_path.as_deref(), pool_dir, None)?;
    let catalog = load_catalog(&config)?;
    let stats = pool_statistics(&catalog);

    let mut table = Table::new();
    table.set_header(vec![
        "Source",
        "Questions",
        "Standalone",
        "Sets",
        "Easy",
        "Medium",
        "Hard",
        "Footprints",
    ]);
    for s in stats.values() {
        let footprints: Vec<String> = s
            .footprints
            .iter()
            .map(|(key, n)| format!("{key} x{n}"))
            .collect();
        table.add_row(vec![
            Cell::new(&s.source),
            Cell::new(s.total_questions),
            Cell::new(s.standalone_questions),
            Cell::new(s.composite_sets),
            Cell::new(s.by_difficulty.get(Difficulty::Easy)),
            Cell::new(s.by_difficulty.get(Difficulty::Medium)),
            Cell::new(s.by_difficulty.get(Difficulty::Hard)),
            Cell::new(footprints.join(", ")),
        ]);
    }
    println!("{} source(s) in {}\n{table}", stats.len(), config.pool_dir.display());

    let Some(path) = blueprint_path else {
        return Ok(());
    };

    let doc = parser::parse_blueprint(&path)?;
    let blueprint = validate_blueprint(&doc, &catalog)
        .with_context(|| format!("invalid blueprint: {}", path.display()))?
        .blueprint;
    let report = capacity(&blueprint, &catalog)?;

    let mut table = Table::new();
    table.set_header(vec!["Section", "Requirement", "Available", "Required", "Max tests"]);
    for section in &report.sections {
        for line in &section.lines {
            table.add_row(vec![
                Cell::new(&section.section_id),
                Cell::new(&line.requirement),
                Cell::new(line.available),
                Cell::new(line.required),
                Cell::new(line.max_tests),
            ]);
        }
    }
    println!("\nCapacity for {}\n{table}", blueprint.test_id);
    match &report.bottleneck {
        Some((section_id, requirement)) => println!(
            "Max disjoint tests: {} (bottleneck: {section_id} {requirement})",
            report.max_tests
        ),
        None => println!("Max disjoint tests: {}", report.max_tests),
    }

    Ok(())
}
