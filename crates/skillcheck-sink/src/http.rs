//! HTTP submission sink.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};

use skillcheck_core::error::SinkError;
use skillcheck_core::model::TestKind;
use skillcheck_core::traits::{SinkReceipt, Submission, SubmissionSink};

pub const DEFAULT_LISTENING_PATH: &str = "/test/submit";
pub const DEFAULT_BEHAVIOUR_PATH: &str = "/test/behaviour/submit";

/// Fallback shown when a rejected listening submission carries no message.
pub const LISTENING_FAILURE_MESSAGE: &str =
    "Unable to submit listening responses. Please try again.";
/// Fallback shown when a rejected behavioural submission carries no message.
pub const BEHAVIOUR_FAILURE_MESSAGE: &str =
    "Unable to submit behavioural responses. Please try again.";

/// Posts submissions as JSON to the assessment backend.
pub struct HttpSink {
    base_url: String,
    listening_path: String,
    behaviour_path: String,
    timeout_secs: Option<u64>,
    client: reqwest::Client,
}

impl HttpSink {
    /// Create a sink for `base_url` using the default endpoint paths.
    ///
    /// Without `timeout_secs` a pending submission never times out.
    pub fn new(base_url: &str, timeout_secs: Option<u64>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            listening_path: DEFAULT_LISTENING_PATH.to_string(),
            behaviour_path: DEFAULT_BEHAVIOUR_PATH.to_string(),
            timeout_secs,
            client,
        })
    }

    /// Override the endpoint paths.
    pub fn with_paths(mut self, listening_path: &str, behaviour_path: &str) -> Self {
        self.listening_path = listening_path.to_string();
        self.behaviour_path = behaviour_path.to_string();
        self
    }

    /// Full URL a submission of `kind` is posted to.
    pub fn endpoint(&self, kind: TestKind) -> String {
        let path = match kind {
            TestKind::Listening => &self.listening_path,
            TestKind::Behaviour => &self.behaviour_path,
        };
        format!("{}{}", self.base_url, path)
    }
}

fn default_failure_message(kind: TestKind) -> &'static str {
    match kind {
        TestKind::Listening => LISTENING_FAILURE_MESSAGE,
        TestKind::Behaviour => BEHAVIOUR_FAILURE_MESSAGE,
    }
}

fn is_json(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

/// Pull a human-readable message out of an error body.
///
/// JSON bodies contribute their `message` field; a JSON body without one
/// falls back to the default. Bodies that are not JSON, or fail to parse as
/// JSON, contribute their raw text unchanged unless it is blank.
fn extract_failure_message(body: &str, json: bool, default: &str) -> String {
    if json {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
            return value
                .get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
                .unwrap_or(default)
                .to_string();
        }
    }
    if body.trim().is_empty() {
        default.to_string()
    } else {
        body.to_string()
    }
}

#[async_trait]
impl SubmissionSink for HttpSink {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, submission), fields(kind = %submission.kind(), url = tracing::field::Empty))]
    async fn submit(&self, submission: &Submission) -> Result<SinkReceipt, SinkError> {
        let kind = submission.kind();
        let url = self.endpoint(kind);
        tracing::Span::current().record("url", url.as_str());

        let response = self
            .client
            .post(&url)
            .json(submission)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SinkError::Timeout(self.timeout_secs.unwrap_or_default())
                } else {
                    SinkError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let json = is_json(&response);
        let body = response
            .text()
            .await
            .map_err(|e| SinkError::Network(e.to_string()))?;
        debug!(status = status.as_u16(), json, len = body.len(), "submission response");

        if !status.is_success() {
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                message: extract_failure_message(&body, json, default_failure_message(kind)),
            });
        }

        if json {
            let value: serde_json::Value = serde_json::from_str(&body)
                .map_err(|e| SinkError::InvalidResponse(e.to_string()))?;
            let message = value
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string);
            Ok(SinkReceipt { message })
        } else if body.is_empty() {
            Ok(SinkReceipt::default())
        } else {
            Ok(SinkReceipt::with_message(body))
        }
    }
}
