//! Event scripts replayed by `skillcheck simulate`.
//!
//! A script is a TOML file with one `[[steps]]` table per display-layer
//! event, tagged by `action`:
//!
//! ```toml
//! [[steps]]
//! action = "media"
//! media = "play_requested"
//! position = 0.0
//!
//! [[steps]]
//! action = "submit"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Script<E> {
    #[serde(default = "Vec::new")]
    pub steps: Vec<E>,
}

pub fn load_script<E: DeserializeOwned>(path: &Path) -> Result<Script<E>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script: {}", path.display()))?;
    let script: Script<E> = toml::from_str(&content)
        .with_context(|| format!("failed to parse script: {}", path.display()))?;
    tracing::debug!(path = %path.display(), steps = script.steps.len(), "script loaded");
    Ok(script)
}
