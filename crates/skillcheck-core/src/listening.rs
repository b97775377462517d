//! Assessment progression for the audio-comprehension test.
//!
//! A [`ListeningSession`] owns the Playback Gate and the Answer Map for one
//! candidate visit. The question panel is re-derived from the gate on every
//! query and never cached.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::answers::AnswerMap;
use crate::error::{SessionError, SinkError, INCOMPLETE_MCQ_MESSAGE};
use crate::model::ListeningQuestionSet;
use crate::payload::ListeningPayload;
use crate::playback::{MediaCommand, MediaEvent, PlaybackGate, PlaybackState};
use crate::session::{Destination, Effect, SessionId, SessionOptions, SubmitStatus};
use crate::traits::{SinkReceipt, Submission, SubmissionSink};

/// Lifecycle of the listening page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListeningPhase {
    /// The instructions modal is open.
    Instructions,
    /// Listening and answering.
    InProgress,
    /// The sink accepted the answers; the acknowledgment is shown.
    Completed,
}

/// Inputs the display layer feeds into a listening session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ListeningEvent {
    DismissInstructions,
    Media(MediaEvent),
    SelectOption { question_id: String, option: String },
    WriteAnswer { question_id: String, text: String },
    Submit,
    DismissCompletion,
}

/// One candidate's pass through the listening test.
#[derive(Debug, Clone)]
pub struct ListeningSession {
    id: SessionId,
    questions: ListeningQuestionSet,
    gate: PlaybackGate,
    answers: AnswerMap,
    phase: ListeningPhase,
    status: SubmitStatus,
    user_id: u64,
    receipt: Option<SinkReceipt>,
}

impl ListeningSession {
    pub fn new(questions: ListeningQuestionSet, options: SessionOptions) -> Self {
        let id = SessionId::new();
        info!(
            session = %id,
            mcq = questions.mcq.len(),
            written = questions.written.len(),
            max_plays = options.max_plays,
            "listening session created"
        );
        Self {
            id,
            questions,
            gate: PlaybackGate::new(options.max_plays),
            answers: AnswerMap::new(),
            phase: ListeningPhase::Instructions,
            status: SubmitStatus::default(),
            user_id: options.user_id,
            receipt: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> ListeningPhase {
        self.phase
    }

    pub fn questions(&self) -> &ListeningQuestionSet {
        &self.questions
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn playback(&self) -> PlaybackState {
        self.gate.state()
    }

    pub fn submit_status(&self) -> &SubmitStatus {
        &self.status
    }

    /// Acknowledgment returned by the sink once the test is completed.
    pub fn receipt(&self) -> Option<&SinkReceipt> {
        self.receipt.as_ref()
    }

    pub fn questions_visible(&self) -> bool {
        self.gate.questions_visible()
    }

    pub fn playback_limit_reached(&self) -> bool {
        self.gate.state().playback_limit_reached()
    }

    /// Ids of MCQ questions that still lack an answer, in question order.
    pub fn unanswered_mcq(&self) -> Vec<&str> {
        self.questions
            .mcq
            .iter()
            .filter(|q| !self.answers.has_answer(&q.id))
            .map(|q| q.id.as_str())
            .collect()
    }

    /// Close the instructions modal and start the test.
    pub fn dismiss_instructions(&mut self) {
        if self.phase == ListeningPhase::Instructions {
            self.phase = ListeningPhase::InProgress;
            info!(session = %self.id, "instructions dismissed");
        }
    }

    /// Route one media notification through the Playback Gate.
    pub fn handle_media(&mut self, event: MediaEvent) -> Option<MediaCommand> {
        if self.phase == ListeningPhase::Instructions {
            // The clip is behind the modal; nothing may start yet.
            return match event {
                MediaEvent::PlayRequested { .. } => Some(MediaCommand::StopAndRewind),
                _ => None,
            };
        }
        self.gate.handle(event)
    }

    fn ensure_answerable(&self) -> Result<(), SessionError> {
        match self.phase {
            ListeningPhase::Instructions => Err(SessionError::NotStarted),
            ListeningPhase::Completed => Err(SessionError::Completed),
            ListeningPhase::InProgress if !self.questions_visible() => {
                Err(SessionError::QuestionsLocked)
            }
            ListeningPhase::InProgress => Ok(()),
        }
    }

    /// Record the selected option text for an MCQ question.
    pub fn record_mcq_answer(
        &mut self,
        question_id: &str,
        option_text: &str,
    ) -> Result<(), SessionError> {
        self.ensure_answerable()?;
        let question = self
            .questions
            .mcq_question(question_id)
            .ok_or_else(|| SessionError::UnknownQuestion(question_id.to_string()))?;
        if question.option(option_text).is_none() {
            return Err(SessionError::UnknownOption {
                question_id: question_id.to_string(),
                option: option_text.to_string(),
            });
        }
        self.answers.record(question_id, option_text);
        debug!(session = %self.id, question_id, option_text, "mcq answer recorded");
        Ok(())
    }

    /// Record free text for a written question. Length is not limited.
    pub fn record_written_answer(&mut self, question_id: &str, text: &str) -> Result<(), SessionError> {
        self.ensure_answerable()?;
        if self.questions.written_question(question_id).is_none() {
            return Err(SessionError::UnknownQuestion(question_id.to_string()));
        }
        self.answers.record(question_id, text);
        debug!(session = %self.id, question_id, len = text.len(), "written answer recorded");
        Ok(())
    }

    /// Validate completeness and build the payload, marking the session as submitting.
    ///
    /// Written answers are optional. On a validation failure the inline error
    /// is set and nothing else changes.
    pub fn begin_submit(&mut self) -> Result<Submission, SessionError> {
        self.ensure_answerable()?;
        if self.status.submitting {
            return Err(SessionError::AlreadySubmitting);
        }

        let missing = self.unanswered_mcq();
        if !missing.is_empty() {
            warn!(session = %self.id, ?missing, "submission blocked: unanswered questions");
            self.status.fail(INCOMPLETE_MCQ_MESSAGE);
            return Err(SessionError::Incomplete(INCOMPLETE_MCQ_MESSAGE));
        }

        self.status.start();
        let payload = ListeningPayload::build(&self.questions, &self.answers, self.user_id);
        debug!(session = %self.id, ?payload, "listening payload built");
        Ok(Submission::Listening(payload))
    }

    /// Settle the in-flight submission with the sink's result.
    ///
    /// Success completes the test. Failure keeps every answer, re-enables
    /// submit, and surfaces the sink message.
    pub fn finish_submit(
        &mut self,
        result: Result<SinkReceipt, SinkError>,
    ) -> Result<(), SessionError> {
        if !self.status.submitting {
            return Err(SessionError::NotSubmitting);
        }
        match result {
            Ok(receipt) => {
                self.status = SubmitStatus::default();
                self.phase = ListeningPhase::Completed;
                info!(session = %self.id, message = ?receipt.message, "listening responses submitted");
                self.receipt = Some(receipt);
                Ok(())
            }
            Err(err) => {
                warn!(session = %self.id, error = %err, "listening submission failed");
                self.status.fail(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Validate, send to `sink`, and settle in one call.
    #[instrument(skip_all, fields(session = %self.id, sink = sink.name()))]
    pub async fn submit(&mut self, sink: &dyn SubmissionSink) -> Result<(), SessionError> {
        let submission = self.begin_submit()?;
        let result = sink.submit(&submission).await;
        self.finish_submit(result)
    }

    /// Leave the completed test, discarding the session.
    ///
    /// Hands the session back unchanged if the test is not completed yet.
    pub fn dismiss_completion(self) -> Result<Destination, Self> {
        if self.phase == ListeningPhase::Completed {
            info!(session = %self.id, "listening session closed");
            Ok(Destination::TestSelection)
        } else {
            Err(self)
        }
    }

    /// Apply one display-layer event.
    pub fn apply(&mut self, event: ListeningEvent) -> Result<Effect, SessionError> {
        match event {
            ListeningEvent::DismissInstructions => {
                self.dismiss_instructions();
                Ok(Effect::None)
            }
            ListeningEvent::Media(media) => {
                Ok(self.handle_media(media).map_or(Effect::None, Effect::Media))
            }
            ListeningEvent::SelectOption {
                question_id,
                option,
            } => {
                self.record_mcq_answer(&question_id, &option)?;
                Ok(Effect::None)
            }
            ListeningEvent::WriteAnswer { question_id, text } => {
                self.record_written_answer(&question_id, &text)?;
                Ok(Effect::None)
            }
            ListeningEvent::Submit => self.begin_submit().map(Effect::Submit),
            ListeningEvent::DismissCompletion => {
                if self.phase == ListeningPhase::Completed {
                    Ok(Effect::Navigate(Destination::TestSelection))
                } else {
                    Err(SessionError::NotCompleted)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{McqQuestion, WrittenQuestion};
    use std::sync::Mutex;

    use async_trait::async_trait;

    fn question_set() -> ListeningQuestionSet {
        ListeningQuestionSet {
            mcq: vec![
                McqQuestion {
                    id: "q1".into(),
                    prompt: "Where is the meeting?".into(),
                    options: vec!["A. Room 1".into(), "B. Room 2".into()],
                },
                McqQuestion {
                    id: "q2".into(),
                    prompt: "When?".into(),
                    options: vec!["A. Monday".into(), "B. Friday".into()],
                },
            ],
            written: vec![WrittenQuestion {
                id: "w1".into(),
                prompt: "Summarize the briefing".into(),
            }],
        }
    }

    fn started(max_plays: u32) -> ListeningSession {
        let mut session = ListeningSession::new(
            question_set(),
            SessionOptions {
                max_plays,
                user_id: 42,
            },
        );
        session.dismiss_instructions();
        session
    }

    fn listen_once(session: &mut ListeningSession) {
        session.handle_media(MediaEvent::PlayRequested { position: 0.0 });
        session.handle_media(MediaEvent::PositionAdvanced { position: 12.0 });
        session.handle_media(MediaEvent::Ended);
    }

    struct ScriptedSink {
        result: Result<SinkReceipt, SinkError>,
        seen: Mutex<Vec<Submission>>,
    }

    #[async_trait]
    impl SubmissionSink for ScriptedSink {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn submit(&self, submission: &Submission) -> Result<SinkReceipt, SinkError> {
            self.seen.lock().unwrap().push(submission.clone());
            self.result.clone()
        }
    }

    #[test]
    fn starts_behind_instructions() {
        let mut session = ListeningSession::new(question_set(), SessionOptions::default());
        assert_eq!(session.phase(), ListeningPhase::Instructions);
        assert_eq!(
            session.handle_media(MediaEvent::PlayRequested { position: 0.0 }),
            Some(MediaCommand::StopAndRewind)
        );
        assert_eq!(session.playback().plays_remaining, 2);
        assert_eq!(
            session.record_written_answer("w1", "x"),
            Err(SessionError::NotStarted)
        );
    }

    #[test]
    fn answers_locked_until_audio_heard() {
        let mut session = started(2);
        assert!(!session.questions_visible());
        assert_eq!(
            session.record_mcq_answer("q1", "A. Room 1"),
            Err(SessionError::QuestionsLocked)
        );

        listen_once(&mut session);
        assert!(session.questions_visible());
        session.record_mcq_answer("q1", "A. Room 1").unwrap();
    }

    #[test]
    fn replay_hides_questions_but_keeps_answers() {
        let mut session = started(2);
        listen_once(&mut session);
        session.record_mcq_answer("q1", "B. Room 2").unwrap();

        session.handle_media(MediaEvent::PlayRequested { position: 0.0 });
        assert!(!session.questions_visible());
        assert_eq!(
            session.record_mcq_answer("q2", "A. Monday"),
            Err(SessionError::QuestionsLocked)
        );
        session.handle_media(MediaEvent::Paused);
        assert_eq!(session.answers().get("q1"), Some("B. Room 2"));
    }

    #[test]
    fn rejects_unknown_question_and_option() {
        let mut session = started(2);
        listen_once(&mut session);
        assert!(matches!(
            session.record_mcq_answer("nope", "A. Room 1"),
            Err(SessionError::UnknownQuestion(_))
        ));
        assert!(matches!(
            session.record_mcq_answer("q1", "C. Roof"),
            Err(SessionError::UnknownOption { .. })
        ));
        assert!(matches!(
            session.record_written_answer("q1", "text"),
            Err(SessionError::UnknownQuestion(_))
        ));
    }

    #[test]
    fn submit_blocked_while_mcq_missing() {
        let mut session = started(2);
        listen_once(&mut session);
        session.record_mcq_answer("q1", "A. Room 1").unwrap();

        let err = session.begin_submit().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), INCOMPLETE_MCQ_MESSAGE);
        assert_eq!(
            session.submit_status().error.as_deref(),
            Some(INCOMPLETE_MCQ_MESSAGE)
        );
        assert!(!session.submit_status().submitting);
        assert_eq!(session.unanswered_mcq(), vec!["q2"]);
    }

    #[test]
    fn submit_does_not_require_written_answers() {
        let mut session = started(2);
        listen_once(&mut session);
        session.record_mcq_answer("q1", "A. Room 1").unwrap();
        session.record_mcq_answer("q2", "B. Friday").unwrap();

        let Submission::Listening(payload) = session.begin_submit().unwrap() else {
            panic!("expected a listening submission");
        };
        assert_eq!(payload.user_id, 42);
        assert_eq!(payload.mcq[0].answer.as_deref(), Some("A"));
        assert_eq!(payload.mcq[1].answer.as_deref(), Some("B"));
        assert_eq!(payload.written[0].answer, "");
        assert!(session.submit_status().submitting);
        assert_eq!(session.begin_submit(), Err(SessionError::AlreadySubmitting));
    }

    #[test]
    fn answers_stay_writable_while_submitting() {
        let mut session = started(2);
        listen_once(&mut session);
        session.record_mcq_answer("q1", "A. Room 1").unwrap();
        session.record_mcq_answer("q2", "B. Friday").unwrap();
        session.begin_submit().unwrap();
        session.record_written_answer("w1", "late note").unwrap();
        assert_eq!(session.answers().get("w1"), Some("late note"));
    }

    #[test]
    fn failed_submission_is_retryable() {
        let mut session = started(2);
        listen_once(&mut session);
        session.record_mcq_answer("q1", "A. Room 1").unwrap();
        session.record_mcq_answer("q2", "A. Monday").unwrap();
        session.begin_submit().unwrap();

        let err = session
            .finish_submit(Err(SinkError::Rejected {
                status: 503,
                message: "Service unavailable".into(),
            }))
            .unwrap_err();
        assert_eq!(err.to_string(), "Service unavailable");
        assert_eq!(session.phase(), ListeningPhase::InProgress);
        assert_eq!(
            session.submit_status().error.as_deref(),
            Some("Service unavailable")
        );
        assert_eq!(session.answers().len(), 2);

        session.begin_submit().unwrap();
        session.finish_submit(Ok(SinkReceipt::default())).unwrap();
        assert_eq!(session.phase(), ListeningPhase::Completed);
    }

    #[test]
    fn finish_without_begin_is_rejected() {
        let mut session = started(2);
        assert_eq!(
            session.finish_submit(Ok(SinkReceipt::default())),
            Err(SessionError::NotSubmitting)
        );
    }

    #[test]
    fn dismiss_completion_only_after_success() {
        let session = started(2);
        let session = session.dismiss_completion().unwrap_err();

        let mut session = session;
        listen_once(&mut session);
        session.record_mcq_answer("q1", "A. Room 1").unwrap();
        session.record_mcq_answer("q2", "A. Monday").unwrap();
        session.begin_submit().unwrap();
        session.finish_submit(Ok(SinkReceipt::default())).unwrap();
        assert_eq!(session.dismiss_completion().ok(), Some(Destination::TestSelection));
    }

    #[test]
    fn apply_drives_the_same_transitions() {
        let mut session = ListeningSession::new(question_set(), SessionOptions::default());
        session.apply(ListeningEvent::DismissInstructions).unwrap();
        session
            .apply(ListeningEvent::Media(MediaEvent::PlayRequested { position: 0.0 }))
            .unwrap();
        session
            .apply(ListeningEvent::Media(MediaEvent::PositionAdvanced { position: 5.0 }))
            .unwrap();
        let effect = session
            .apply(ListeningEvent::Media(MediaEvent::SeekAttempted { position: 9.0 }))
            .unwrap();
        assert_eq!(effect, Effect::Media(MediaCommand::SeekTo { position: 5.0 }));
        session
            .apply(ListeningEvent::Media(MediaEvent::Ended))
            .unwrap();
        session
            .apply(ListeningEvent::SelectOption {
                question_id: "q1".into(),
                option: "A. Room 1".into(),
            })
            .unwrap();
        assert!(session.apply(ListeningEvent::Submit).is_err());
        assert_eq!(
            session.apply(ListeningEvent::DismissCompletion),
            Err(SessionError::NotCompleted)
        );
    }

    #[test]
    fn events_deserialize_from_script_form() {
        let events: Vec<ListeningEvent> = serde_json::from_str(
            r#"[
                {"action": "dismiss_instructions"},
                {"action": "media", "media": "play_requested", "position": 0.0},
                {"action": "select_option", "question_id": "q1", "option": "A. Room 1"},
                {"action": "submit"}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            events[1],
            ListeningEvent::Media(MediaEvent::PlayRequested { position: 0.0 })
        );
        assert_eq!(events[3], ListeningEvent::Submit);
    }

    #[tokio::test]
    async fn end_to_end_three_plays() {
        let mut session = started(3);
        listen_once(&mut session);
        assert_eq!(session.playback().plays_remaining, 2);
        assert!(session.questions_visible());

        session.record_mcq_answer("q1", "B. Room 2").unwrap();
        session.record_mcq_answer("q2", "A. Monday").unwrap();

        let sink = ScriptedSink {
            result: Ok(SinkReceipt::with_message("Responses submitted successfully")),
            seen: Mutex::new(Vec::new()),
        };
        session.submit(&sink).await.unwrap();

        let seen = sink.seen.lock().unwrap();
        let Submission::Listening(payload) = &seen[0] else {
            panic!("expected a listening submission");
        };
        assert_eq!(payload.mcq[0].answer.as_deref(), Some("B"));
        assert_eq!(payload.mcq[1].answer.as_deref(), Some("A"));
        assert!(payload.written.iter().all(|w| w.answer.is_empty()));
        assert_eq!(session.phase(), ListeningPhase::Completed);
        assert_eq!(
            session.receipt().and_then(|r| r.message.as_deref()),
            Some("Responses submitted successfully")
        );
    }

    #[tokio::test]
    async fn sink_failure_keeps_session_answering() {
        let mut session = started(2);
        listen_once(&mut session);
        session.record_mcq_answer("q1", "B. Room 2").unwrap();
        session.record_mcq_answer("q2", "A. Monday").unwrap();

        let sink = ScriptedSink {
            result: Err(SinkError::Network("refused".into())),
            seen: Mutex::new(Vec::new()),
        };
        let err = session.submit(&sink).await.unwrap_err();
        assert!(matches!(err, SessionError::Sink(SinkError::Network(_))));
        assert_eq!(session.phase(), ListeningPhase::InProgress);
        assert!(!session.submit_status().submitting);
    }
}
