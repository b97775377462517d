//! Collaborator contracts: the submission sink and the host media element.
//!
//! `SubmissionSink` is implemented by the `skillcheck-sink` crate; the media
//! element is whatever plays the audio clip in the display layer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SinkError;
use crate::model::TestKind;
use crate::payload::{BehaviourPayload, ListeningPayload};

// ---------------------------------------------------------------------------
// Submission sink
// ---------------------------------------------------------------------------

/// A normalized payload ready to be recorded by a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Submission {
    Listening(ListeningPayload),
    Behaviour(BehaviourPayload),
}

impl Submission {
    pub fn kind(&self) -> TestKind {
        match self {
            Submission::Listening(_) => TestKind::Listening,
            Submission::Behaviour(_) => TestKind::Behaviour,
        }
    }

    pub fn user_id(&self) -> u64 {
        match self {
            Submission::Listening(p) => p.user_id,
            Submission::Behaviour(p) => p.user_id,
        }
    }
}

/// What a sink returns when it accepted a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkReceipt {
    /// Acknowledgment text from the backend, if it sent one.
    #[serde(default)]
    pub message: Option<String>,
}

impl SinkReceipt {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

/// Trait for endpoints that durably record a candidate's answers.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    /// Human-readable sink name (e.g. "http").
    fn name(&self) -> &str;

    /// Record one submission.
    async fn submit(&self, submission: &Submission) -> Result<SinkReceipt, SinkError>;
}

// ---------------------------------------------------------------------------
// Media element
// ---------------------------------------------------------------------------

/// The imperative half of the host media primitive.
///
/// The notification half arrives as [`crate::playback::MediaEvent`]s.
pub trait MediaElement {
    /// Stop playback, keeping the current position.
    fn pause(&mut self);

    /// Move the playback position to `seconds` from the start.
    fn set_position(&mut self, seconds: f64);
}
