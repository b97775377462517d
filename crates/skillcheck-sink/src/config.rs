//! Sink configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use skillcheck_core::playback::DEFAULT_MAX_PLAYS;
use skillcheck_core::session::{SessionOptions, DEFAULT_USER_ID};
use skillcheck_core::traits::SubmissionSink;

use crate::http::{HttpSink, DEFAULT_BEHAVIOUR_PATH, DEFAULT_LISTENING_PATH};
use crate::log::LogSink;

/// Environment variable that points the `backend` sink at an API.
pub const API_BASE_URL_ENV: &str = "SKILLCHECK_API_BASE_URL";

/// Name of the sink created from [`API_BASE_URL_ENV`].
pub const BACKEND_SINK: &str = "backend";

/// Configuration for a single submission sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    Http {
        base_url: String,
        #[serde(default = "default_listening_path")]
        listening_path: String,
        #[serde(default = "default_behaviour_path")]
        behaviour_path: String,
        /// No client-side timeout when absent.
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    Log,
}

fn default_listening_path() -> String {
    DEFAULT_LISTENING_PATH.to_string()
}

fn default_behaviour_path() -> String {
    DEFAULT_BEHAVIOUR_PATH.to_string()
}

/// Top-level skillcheck configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillcheckConfig {
    /// Sink configurations keyed by name.
    #[serde(default)]
    pub sinks: HashMap<String, SinkConfig>,
    /// Sink used when none is named explicitly.
    #[serde(default = "default_sink")]
    pub default_sink: String,
    /// Candidate id used when none is supplied.
    #[serde(default = "default_user_id")]
    pub user_id: u64,
    /// Play credits for the listening clip.
    #[serde(default = "default_max_plays")]
    pub max_plays: u32,
}

fn default_sink() -> String {
    BACKEND_SINK.to_string()
}
fn default_user_id() -> u64 {
    DEFAULT_USER_ID
}
fn default_max_plays() -> u32 {
    DEFAULT_MAX_PLAYS
}

impl Default for SkillcheckConfig {
    fn default() -> Self {
        Self {
            sinks: HashMap::new(),
            default_sink: default_sink(),
            user_id: default_user_id(),
            max_plays: default_max_plays(),
        }
    }
}

impl SkillcheckConfig {
    /// Session settings derived from this configuration.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            max_plays: self.max_plays,
            user_id: self.user_id,
        }
    }

    /// Look up a sink by name, or the default sink when `name` is `None`.
    pub fn sink(&self, name: Option<&str>) -> Result<(&str, &SinkConfig)> {
        let name = name.unwrap_or(&self.default_sink);
        self.sinks
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .with_context(|| {
                let mut available: Vec<&String> = self.sinks.keys().collect();
                available.sort();
                format!("sink '{name}' not found in config. Available: {available:?}")
            })
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not scanned again. An unterminated `${` is kept as-is.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_sink_config(config: &SinkConfig) -> SinkConfig {
    match config {
        SinkConfig::Http {
            base_url,
            listening_path,
            behaviour_path,
            timeout_secs,
        } => SinkConfig::Http {
            base_url: resolve_env_vars(base_url),
            listening_path: resolve_env_vars(listening_path),
            behaviour_path: resolve_env_vars(behaviour_path),
            timeout_secs: *timeout_secs,
        },
        SinkConfig::Log => SinkConfig::Log,
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `skillcheck.toml` in the current directory
/// 2. `~/.config/skillcheck/config.toml`
///
/// `SKILLCHECK_API_BASE_URL` overrides the base URL of the `backend` sink,
/// creating it when absent.
pub fn load_config() -> Result<SkillcheckConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<SkillcheckConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("skillcheck.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<SkillcheckConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), sinks = config.sinks.len(), "config loaded");
            config
        }
        None => SkillcheckConfig::default(),
    };

    if let Ok(url) = std::env::var(API_BASE_URL_ENV) {
        apply_base_url_override(&mut config, url);
    }

    config.sinks = config
        .sinks
        .iter()
        .map(|(k, v)| (k.clone(), resolve_sink_config(v)))
        .collect();

    Ok(config)
}

fn apply_base_url_override(config: &mut SkillcheckConfig, url: String) {
    let entry = config
        .sinks
        .entry(BACKEND_SINK.into())
        .or_insert_with(|| SinkConfig::Http {
            base_url: String::new(),
            listening_path: default_listening_path(),
            behaviour_path: default_behaviour_path(),
            timeout_secs: None,
        });
    if let SinkConfig::Http { base_url, .. } = entry {
        *base_url = url;
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("skillcheck"))
}

/// Create a sink instance from its configuration.
pub fn create_sink(name: &str, config: &SinkConfig) -> Result<Box<dyn SubmissionSink>> {
    match config {
        SinkConfig::Http {
            base_url,
            listening_path,
            behaviour_path,
            timeout_secs,
        } => {
            anyhow::ensure!(!base_url.is_empty(), "sink '{name}' has an empty base_url");
            let sink = HttpSink::new(base_url, *timeout_secs)?
                .with_paths(listening_path, behaviour_path);
            Ok(Box::new(sink))
        }
        SinkConfig::Log => Ok(Box::new(LogSink)),
    }
}
