//! Loading pools and blueprints from disk.
//!
//! Pool sources are JSON documents named after their source identifier
//! (e.g. `english_master_question_bank.json`). Blueprints are JSON or TOML.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::blueprint::BlueprintDocument;
use crate::catalog::PoolCatalog;
use crate::model::QuestionPool;
use crate::normalizer::{normalize_source, SourceKind};

/// Source identifier of a pool file: its file name.
pub fn source_id(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("invalid source file name: {}", path.display()))
}

/// Load and normalize one source file.
pub fn load_source(path: &Path, kind: SourceKind) -> Result<QuestionPool> {
    let id = source_id(path)?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read source file: {}", path.display()))?;
    let raw: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse JSON: {}", path.display()))?;
    let pool = normalize_source(&raw, kind, &id)
        .with_context(|| format!("failed to normalize {}", path.display()))?;
    Ok(pool)
}

/// Recursively load every `.json` source under `dir`.
///
/// The kind of each source comes from `kinds` when listed there, otherwise
/// from its file name. Files whose kind cannot be determined are skipped.
/// A source that fails to normalize fails the whole load.
pub fn load_catalog(dir: &Path, kinds: &BTreeMap<String, SourceKind>) -> Result<PoolCatalog> {
    let mut catalog = PoolCatalog::new();
    load_into(dir, kinds, &mut catalog)?;
    tracing::info!(dir = %dir.display(), sources = catalog.len(), "loaded question pools");
    Ok(catalog)
}

fn load_into(
    dir: &Path,
    kinds: &BTreeMap<String, SourceKind>,
    catalog: &mut PoolCatalog,
) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            load_into(&path, kinds, catalog)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            let id = source_id(&path)?;
            let Some(kind) = kinds.get(&id).copied().or_else(|| SourceKind::infer(&id)) else {
                tracing::warn!("skipping {}: unknown source kind", path.display());
                continue;
            };
            if catalog.get(&id).is_some() {
                tracing::warn!("source {id} loaded twice, keeping {}", path.display());
            }
            let pool = load_source(&path, kind)?;
            tracing::debug!(source = %id, %kind, "loaded source");
            catalog.insert(pool);
        }
    }

    Ok(())
}

/// Parse a blueprint file, choosing the format by extension.
pub fn parse_blueprint(path: &Path) -> Result<BlueprintDocument> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read blueprint file: {}", path.display()))?;
    parse_blueprint_str(&content, path)
}

/// Parse blueprint text; `.toml` paths are read as TOML, anything else as JSON.
pub fn parse_blueprint_str(content: &str, source_path: &Path) -> Result<BlueprintDocument> {
    if source_path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display()))
    } else {
        serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display()))
    }
}

/// Recursively list `.json` and `.toml` blueprint files under `dir`, sorted.
pub fn blueprint_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(blueprint_files(&path)?);
        } else if path
            .extension()
            .is_some_and(|ext| ext == "json" || ext == "toml")
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
