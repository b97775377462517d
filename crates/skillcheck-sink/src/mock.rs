//! Mock sink for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use skillcheck_core::error::SinkError;
use skillcheck_core::traits::{SinkReceipt, Submission, SubmissionSink};

/// A mock sink for exercising sessions without a backend.
///
/// Replies are taken from a queue first and from the default reply once the
/// queue is empty. Every submission is recorded.
pub struct MockSink {
    /// Replies used in order before falling back to `default_reply`.
    queued: Mutex<VecDeque<Result<SinkReceipt, SinkError>>>,
    default_reply: Result<SinkReceipt, SinkError>,
    call_count: AtomicU32,
    received: Mutex<Vec<Submission>>,
}

impl MockSink {
    /// A sink that accepts everything.
    pub fn accepting() -> Self {
        Self::with_default(Ok(SinkReceipt::default()))
    }

    /// A sink that rejects everything with `status` and `message`.
    pub fn rejecting(status: u16, message: &str) -> Self {
        Self::with_default(Err(SinkError::Rejected {
            status,
            message: message.to_string(),
        }))
    }

    fn with_default(default_reply: Result<SinkReceipt, SinkError>) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            default_reply,
            call_count: AtomicU32::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Queue replies to use, in order, before the default reply.
    pub fn then(self, replies: impl IntoIterator<Item = Result<SinkReceipt, SinkError>>) -> Self {
        self.queued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(replies);
        self
    }

    /// Number of submissions received.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// All submissions received, oldest first.
    pub fn received(&self) -> Vec<Submission> {
        self.received
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn last_submission(&self) -> Option<Submission> {
        self.received().pop()
    }
}

#[async_trait]
impl SubmissionSink for MockSink {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(&self, submission: &Submission) -> Result<SinkReceipt, SinkError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.received
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(submission.clone());

        let queued = self
            .queued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        queued.unwrap_or_else(|| self.default_reply.clone())
    }
}
