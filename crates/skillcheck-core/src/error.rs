//! Session and sink error types.
//!
//! Sink errors are defined here rather than in `skillcheck-sink` so that the
//! progression components can surface them without depending on a transport.

use thiserror::Error;

/// Message shown when a listening submission is attempted with unanswered
/// multiple-choice questions.
pub const INCOMPLETE_MCQ_MESSAGE: &str =
    "Please answer all multiple choice questions before submitting.";

/// Message shown when a behavioural submission is attempted before every
/// scenario has an answer.
pub const INCOMPLETE_SCENARIO_MESSAGE: &str =
    "Please answer every scenario before submitting.";

/// Message shown when the submission endpoint cannot be reached at all.
pub const CONNECTION_FAILED_MESSAGE: &str = "Unable to connect to the server. Please check your internet connection and ensure the backend is running.";

/// Errors that can occur while handing a payload to a submission sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The sink answered with a non-success status. `message` is shown verbatim.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The sink could not be reached.
    #[error("{}", CONNECTION_FAILED_MESSAGE)]
    Network(String),

    /// The request did not settle within the configured timeout.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The sink answered with a success status but an unreadable body.
    #[error("invalid response from submission endpoint: {0}")]
    InvalidResponse(String),
}

impl SinkError {
    /// HTTP status carried by a rejection, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            SinkError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if the candidate may simply press submit again.
    ///
    /// Every sink failure leaves the answers in place and re-enables submit.
    /// Nothing is retried automatically; this only drives what the display
    /// layer offers.
    pub fn is_retryable(&self) -> bool {
        match self {
            SinkError::Rejected { .. }
            | SinkError::Network(_)
            | SinkError::Timeout(_)
            | SinkError::InvalidResponse(_) => true,
        }
    }
}

/// Errors returned by session operations.
///
/// None of these are fatal: the session stays usable after every one of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Submission precondition failed; nothing was sent.
    #[error("{0}")]
    Incomplete(&'static str),

    /// The question panel is not visible, so answers cannot be recorded.
    #[error("questions are not available until the audio has been heard")]
    QuestionsLocked,

    /// The instructions have not been dismissed yet.
    #[error("the test has not started yet")]
    NotStarted,

    #[error("unknown question: {0}")]
    UnknownQuestion(String),

    #[error("option {option:?} is not offered by question {question_id}")]
    UnknownOption { question_id: String, option: String },

    /// A submission is already in flight.
    #[error("a submission is already in progress")]
    AlreadySubmitting,

    /// `finish_submit` was called without a matching `begin_submit`.
    #[error("no submission is in progress")]
    NotSubmitting,

    /// The session has already been submitted successfully.
    #[error("the test has already been completed")]
    Completed,

    /// The completion acknowledgment was dismissed before it was shown.
    #[error("the test has not been completed yet")]
    NotCompleted,

    /// The sink rejected or failed the submission.
    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl SessionError {
    /// Returns `true` for local validation failures that never reached the network.
    pub fn is_validation(&self) -> bool {
        matches!(self, SessionError::Incomplete(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_displays_server_message_verbatim() {
        let err = SinkError::Rejected {
            status: 422,
            message: "Candidate already submitted".into(),
        };
        assert_eq!(err.to_string(), "Candidate already submitted");
        assert_eq!(err.status(), Some(422));
        assert!(err.is_retryable());
    }

    #[test]
    fn network_error_uses_connection_message() {
        let err = SinkError::Network("connection refused".into());
        assert_eq!(err.to_string(), CONNECTION_FAILED_MESSAGE);
        assert!(err.is_retryable());
    }

    #[test]
    fn every_sink_failure_is_retryable() {
        let errors = [
            SinkError::Rejected {
                status: 400,
                message: "Bad request".into(),
            },
            SinkError::Rejected {
                status: 503,
                message: "Unavailable".into(),
            },
            SinkError::Network("reset".into()),
            SinkError::Timeout(30),
            SinkError::InvalidResponse("expected value".into()),
        ];
        for err in errors {
            assert!(err.is_retryable(), "{err:?}");
        }
    }

    #[test]
    fn session_error_wraps_sink_error_transparently() {
        let err: SessionError = SinkError::Rejected {
            status: 500,
            message: "boom".into(),
        }
        .into();
        assert_eq!(err.to_string(), "boom");
        assert!(!err.is_validation());
        assert!(SessionError::Incomplete(INCOMPLETE_MCQ_MESSAGE).is_validation());
    }
}
