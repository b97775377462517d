//! Pieces shared by both progression components.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::playback::{MediaCommand, DEFAULT_MAX_PLAYS};
use crate::traits::Submission;

/// Candidate id used when the display layer has no signed-in user.
pub const DEFAULT_USER_ID: u64 = 1;

/// Per-session settings, fixed at test entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Play credits for the listening clip.
    pub max_plays: u32,
    /// Candidate id placed in the submission payload.
    pub user_id: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_plays: DEFAULT_MAX_PLAYS,
            user_id: DEFAULT_USER_ID,
        }
    }
}

/// Identifies one session from test entry until navigation away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Where the display layer should go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// The test-selection entry point. The session is discarded.
    TestSelection,
}

/// Work the host must carry out after an event was applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    /// Apply a correction to the media element.
    Media(MediaCommand),
    /// Hand this payload to the submission sink, then report the result back.
    Submit(Submission),
    /// Leave the test; drop the session.
    Navigate(Destination),
}

/// Submission progress shown next to the submit control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmitStatus {
    /// A submission is in flight; the submit control is disabled.
    pub submitting: bool,
    /// Inline error from the last attempt, shown verbatim.
    pub error: Option<String>,
}

impl SubmitStatus {
    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.submitting = false;
        self.error = Some(message.into());
    }

    pub(crate) fn start(&mut self) {
        self.submitting = true;
        self.error = None;
    }
}
