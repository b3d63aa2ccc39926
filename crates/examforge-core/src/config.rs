//! Tool configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;
use crate::normalizer::SourceKind;

/// Top-level examforge configuration, read from `examforge.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamforgeConfig {
    /// Directory scanned recursively for question pool sources.
    #[serde(default = "default_pool_dir")]
    pub pool_dir: PathBuf,
    /// Where generated tests and pipeline reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Used when a blueprint does not set its own.
    #[serde(default = "default_marks_per_question")]
    pub marks_per_question: f64,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub shuffle_questions: bool,
    /// Explicit source kinds by file name. Unlisted files are inferred.
    #[serde(default)]
    pub sources: BTreeMap<String, SourceKind>,
}

fn default_pool_dir() -> PathBuf {
    PathBuf::from("./pools")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./generated-tests")
}
fn default_marks_per_question() -> f64 {
    1.0
}
fn default_duration() -> u32 {
    120
}

impl Default for ExamforgeConfig {
    fn default() -> Self {
        Self {
            pool_dir: default_pool_dir(),
            output_dir: default_output_dir(),
            marks_per_question: default_marks_per_question(),
            duration_minutes: default_duration(),
            shuffle_questions: false,
            sources: BTreeMap::new(),
        }
    }
}

impl ExamforgeConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            marks_per_question: self.marks_per_question,
            duration_minutes: self.duration_minutes,
            shuffle_questions: self.shuffle_questions,
        }
    }
}

/// Replace `${NAME}` references with the variable's value (empty if unset).
fn resolve_env_vars(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let name = &rest[start + 2..start + len];
        out.push_str(&std::env::var(name).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    out
}

fn resolve_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) if s.contains("${") => PathBuf::from(resolve_env_vars(s)),
        _ => path.to_path_buf(),
    }
}

/// Load configuration from the default locations.
///
/// Search order:
/// 1. `examforge.toml` in the current directory
/// 2. `~/.config/examforge/config.toml`
///
/// `EXAMFORGE_POOL_DIR` and `EXAMFORGE_OUTPUT_DIR` override the file.
pub fn load_config() -> Result<ExamforgeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamforgeConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("examforge.toml");
            if local.exists() {
                Some(local)
            } else {
                global_config_path().filter(|p| p.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<ExamforgeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => ExamforgeConfig::default(),
    };

    if let Ok(dir) = std::env::var("EXAMFORGE_POOL_DIR") {
        config.pool_dir = PathBuf::from(dir);
    }
    if let Ok(dir) = std::env::var("EXAMFORGE_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }

    config.pool_dir = resolve_path(&config.pool_dir);
    config.output_dir = resolve_path(&config.output_dir);

    if config.marks_per_question <= 0.0 {
        anyhow::bail!(
            "marks_per_question must be positive, got {}",
            config.marks_per_question
        );
    }

    Ok(config)
}

fn global_config_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|h| {
        PathBuf::from(h)
            .join(".config")
            .join("examforge")
            .join("config.toml")
    })
}
