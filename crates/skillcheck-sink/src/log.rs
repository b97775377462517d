//! A sink that records submissions in the log instead of sending them.

use async_trait::async_trait;

use skillcheck_core::error::SinkError;
use skillcheck_core::traits::{SinkReceipt, Submission, SubmissionSink};

/// Acknowledgment returned by [`LogSink`].
pub const LOGGED_MESSAGE: &str = "Responses recorded locally";

/// Logs each submission as JSON at `info` level and always succeeds.
///
/// Used for dry runs and for tests that have no backend.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl SubmissionSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn submit(&self, submission: &Submission) -> Result<SinkReceipt, SinkError> {
        let body = serde_json::to_string(submission)
            .map_err(|e| SinkError::InvalidResponse(e.to_string()))?;
        tracing::info!(kind = %submission.kind(), user_id = submission.user_id(), %body, "submission");
        Ok(SinkReceipt::with_message(LOGGED_MESSAGE))
    }
}
