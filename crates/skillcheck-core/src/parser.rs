//! Question-set loader.
//!
//! Reads listening and behavioural question sets from JSON (the format the
//! web client ships) or TOML files. Content is trusted as already validated.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{BehaviourQuestionSet, ListeningQuestionSet, ScenarioQuestion};

/// On-disk encoding of a question set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetFormat {
    Json,
    Toml,
}

impl SetFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(SetFormat::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(SetFormat::Toml),
            _ => anyhow::bail!(
                "unsupported question-set file (expected .json or .toml): {}",
                path.display()
            ),
        }
    }
}

/// Behavioural sets are a bare array in JSON and a `questions` table array in TOML.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BehaviourFile {
    Bare(Vec<ScenarioQuestion>),
    Wrapped(BehaviourQuestionSet),
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question set: {}", path.display()))
}

/// Load a listening question set from a `.json` or `.toml` file.
pub fn load_listening_set(path: &Path) -> Result<ListeningQuestionSet> {
    let format = SetFormat::from_path(path)?;
    parse_listening_str(&read(path)?, format, path)
}

/// Parse a listening question set from a string.
pub fn parse_listening_str(
    content: &str,
    format: SetFormat,
    source_path: &Path,
) -> Result<ListeningQuestionSet> {
    let set: ListeningQuestionSet = match format {
        SetFormat::Json => serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?,
        SetFormat::Toml => toml::from_str(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?,
    };
    tracing::debug!(
        path = %source_path.display(),
        mcq = set.mcq.len(),
        written = set.written.len(),
        "listening set loaded"
    );
    Ok(set)
}

/// Load a behavioural question set from a `.json` or `.toml` file.
pub fn load_behaviour_set(path: &Path) -> Result<BehaviourQuestionSet> {
    let format = SetFormat::from_path(path)?;
    parse_behaviour_str(&read(path)?, format, path)
}

/// Parse a behavioural question set from a string.
pub fn parse_behaviour_str(
    content: &str,
    format: SetFormat,
    source_path: &Path,
) -> Result<BehaviourQuestionSet> {
    let file: BehaviourFile = match format {
        SetFormat::Json => serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?,
        SetFormat::Toml => toml::from_str(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?,
    };
    let set = match file {
        BehaviourFile::Bare(questions) => BehaviourQuestionSet::new(questions),
        BehaviourFile::Wrapped(set) => set,
    };
    tracing::debug!(path = %source_path.display(), scenarios = set.len(), "behaviour set loaded");
    Ok(set)
}
