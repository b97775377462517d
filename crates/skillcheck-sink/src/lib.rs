//! skillcheck-sink: Submission sinks.
//!
//! Implements the `SubmissionSink` trait over HTTP, over the log, and as a
//! recording mock, plus the configuration that selects between them.

pub mod config;
pub mod http;
pub mod log;
pub mod mock;

pub use config::{create_sink, load_config, load_config_from, SinkConfig, SkillcheckConfig};
pub use skillcheck_core::error::SinkError;
