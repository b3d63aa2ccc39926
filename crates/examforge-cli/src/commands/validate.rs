//! The `examforge validate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use examforge_core::parser;
use examforge_core::validator::validate_blueprint;

use super::{blueprint_paths, load_catalog, resolve_config};

pub fn execute(
    blueprint_path: PathBuf,
    pool_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = resolve_config(config_path.as_deref(), pool_dir, None)?;
    let catalog = load_catalog(&config)?;

    let mut total_warnings = 0;
    for path in blueprint_paths(&blueprint_path)? {
        let doc = parser::parse_blueprint(&path)?;
        let validated = validate_blueprint(&doc, &catalog)
            .with_context(|| format!("invalid blueprint: {}", path.display()))?;
        let blueprint = &validated.blueprint;

        println!(
            "Blueprint: {} ({} sections, {} questions)",
            blueprint.test_name,
            blueprint.sections.len(),
            blueprint.total_questions
        );
        for w in &validated.warnings {
            let prefix = w
                .section_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += validated.warnings.len();
    }

    if total_warnings == 0 {
        println!("All blueprints valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
