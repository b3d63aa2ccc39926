//! Subcommand implementations and the helpers they share.

pub mod audit;
pub mod generate;
pub mod init;
pub mod series;
pub mod stats;
pub mod validate;

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

use examforge_core::catalog::PoolCatalog;
use examforge_core::config::{load_config_from, ExamforgeConfig};
use examforge_core::engine::ProgressReporter;
use examforge_core::error::{AssemblyError, ErrorReport};
use examforge_core::parser;
use examforge_core::report::{GeneratedSection, GeneratedTest};

/// Prints progress lines to stderr.
pub struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_section_start(&self, section_id: &str, total_questions: u32) {
        eprintln!("  Assembling: {section_id} ({total_questions} questions)");
    }

    fn on_section_complete(&self, section: &GeneratedSection) {
        eprintln!(
            "  Done: {} {} composite set(s), difficulty {}",
            section.section_id,
            section.composite_sets.len(),
            section.difficulty_counts
        );
    }

    fn on_test_complete(&self, test: &GeneratedTest) {
        eprintln!(
            "Complete: {} ({} questions, seed {}...)",
            test.test_id,
            test.total_questions,
            &test.seed[..test.seed.len().min(12)]
        );
    }
}

/// Config with command-line overrides applied.
pub fn resolve_config(
    config_path: Option<&Path>,
    pool_dir: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<ExamforgeConfig> {
    let mut config = load_config_from(config_path)?;
    if let Some(dir) = pool_dir {
        config.pool_dir = dir;
    }
    if let Some(dir) = output {
        config.output_dir = dir;
    }
    Ok(config)
}

pub fn load_catalog(config: &ExamforgeConfig) -> Result<PoolCatalog> {
    parser::load_catalog(&config.pool_dir, &config.sources)
        .with_context(|| format!("failed to load pools from {}", config.pool_dir.display()))
}

/// A single blueprint file, or every blueprint under a directory.
pub fn blueprint_paths(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_dir() {
        let files = parser::blueprint_files(path)?;
        anyhow::ensure!(!files.is_empty(), "no blueprints found in {}", path.display());
        Ok(files)
    } else if path.exists() {
        Ok(vec![path.to_path_buf()])
    } else {
        anyhow::bail!("blueprint not found: {}", path.display())
    }
}

/// `<output_dir>/<test_id>.json`, refusing ids that would leave `output_dir`.
pub fn test_output_path(output_dir: &Path, test_id: &str) -> Result<PathBuf> {
    let file_name = format!("{test_id}.json");
    let mut components = Path::new(&file_name).components();
    anyhow::ensure!(
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ),
        "test id '{test_id}' is not a plain file name"
    );
    Ok(output_dir.join(file_name))
}

/// Structured report for any failure, engine or otherwise.
pub fn error_report(err: &anyhow::Error) -> ErrorReport {
    match err.downcast_ref::<AssemblyError>() {
        Some(e) => e.report(),
        None => ErrorReport {
            kind: "LoadError".to_string(),
            message: format!("{err:#}"),
            ..Default::default()
        },
    }
}

pub fn print_error_report(report: &ErrorReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!("{}: {}", report.kind, report.message),
    }
}
