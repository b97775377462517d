//! Assessment progression for the scenario-based behavioural quiz.
//!
//! One scenario is shown at a time. Moving forward requires an answer to the
//! current scenario; moving back is always allowed down to the first one.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::answers::AnswerMap;
use crate::error::{SessionError, SinkError, INCOMPLETE_SCENARIO_MESSAGE};
use crate::model::{BehaviourQuestionSet, ScenarioQuestion};
use crate::payload::BehaviourPayload;
use crate::session::{Destination, Effect, SessionId, SessionOptions, SubmitStatus};
use crate::traits::{SinkReceipt, Submission, SubmissionSink};

/// Answer token stored for the option at `index`.
pub fn option_token(index: usize) -> String {
    format!("option-{index}")
}

/// Lifecycle of the behavioural page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviourPhase {
    InProgress,
    Completed,
}

/// Inputs the display layer feeds into a behavioural session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BehaviourEvent {
    /// Pick the option at `index` for the current scenario.
    SelectOption { index: usize },
    Next,
    Previous,
    Submit,
    DismissCompletion,
}

/// One candidate's pass through the behavioural quiz.
#[derive(Debug, Clone)]
pub struct BehaviourSession {
    id: SessionId,
    questions: BehaviourQuestionSet,
    answers: AnswerMap,
    current: usize,
    /// Latched once every scenario has been answered.
    show_submit: bool,
    phase: BehaviourPhase,
    status: SubmitStatus,
    user_id: u64,
    receipt: Option<SinkReceipt>,
}

impl BehaviourSession {
    pub fn new(questions: BehaviourQuestionSet, options: SessionOptions) -> Self {
        let id = SessionId::new();
        info!(session = %id, scenarios = questions.len(), "behavioural session created");
        Self {
            id,
            questions,
            answers: AnswerMap::new(),
            current: 0,
            show_submit: false,
            phase: BehaviourPhase::InProgress,
            status: SubmitStatus::default(),
            user_id: options.user_id,
            receipt: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> BehaviourPhase {
        self.phase
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn submit_status(&self) -> &SubmitStatus {
        &self.status
    }

    pub fn receipt(&self) -> Option<&SinkReceipt> {
        self.receipt.as_ref()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&ScenarioQuestion> {
        self.questions.questions.get(self.current)
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Share of answered scenarios, rounded to the nearest whole percent.
    pub fn progress_percent(&self) -> u32 {
        let total = self.total_questions();
        if total == 0 {
            return 0;
        }
        ((self.answered_count() as f64 / total as f64) * 100.0).round() as u32
    }

    /// "Question N of M" label for the current position.
    pub fn position_label(&self) -> String {
        let total = self.total_questions();
        let number = if total == 0 { 0 } else { self.current + 1 };
        format!("Question {number} of {total}")
    }

    pub fn is_current_answered(&self) -> bool {
        self.current_question()
            .is_some_and(|q| self.answers.get(&q.id).is_some())
    }

    pub fn is_last_question(&self) -> bool {
        self.current + 1 >= self.total_questions()
    }

    pub fn can_go_previous(&self) -> bool {
        self.current > 0
    }

    pub fn can_go_next(&self) -> bool {
        self.is_current_answered() && !self.is_last_question()
    }

    /// The submit control is enabled only once every scenario is answered.
    pub fn submit_enabled(&self) -> bool {
        self.show_submit
            && self.answered_count() == self.total_questions()
            && !self.status.submitting
    }

    /// Answer the current scenario with the option at `index`.
    pub fn select_option(&mut self, index: usize) -> Result<(), SessionError> {
        let question_id = self
            .current_question()
            .map(|q| q.id.clone())
            .ok_or_else(|| SessionError::UnknownQuestion(format!("#{}", self.current + 1)))?;
        self.record_answer(&question_id, index)
    }

    /// Answer any scenario by id. Re-selecting overwrites the previous choice.
    pub fn record_answer(&mut self, question_id: &str, index: usize) -> Result<(), SessionError> {
        if self.phase == BehaviourPhase::Completed {
            return Err(SessionError::Completed);
        }
        let question = self
            .questions
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| SessionError::UnknownQuestion(question_id.to_string()))?;
        if index >= question.options.len() {
            return Err(SessionError::UnknownOption {
                question_id: question_id.to_string(),
                option: option_token(index),
            });
        }

        self.answers.record(question_id, &option_token(index));
        if self.answered_count() == self.total_questions() && !self.show_submit {
            self.show_submit = true;
            info!(session = %self.id, "all scenarios answered");
        }
        debug!(session = %self.id, question_id, index, "scenario answer recorded");
        Ok(())
    }

    /// Advance one scenario. A no-op when the current one is unanswered or
    /// already the last; returns whether the index moved.
    pub fn go_next(&mut self) -> bool {
        if !self.can_go_next() {
            return false;
        }
        self.current += 1;
        debug!(session = %self.id, index = self.current, "advanced");
        true
    }

    /// Step back one scenario, clamping at the first.
    pub fn go_previous(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        debug!(session = %self.id, index = self.current, "went back");
        true
    }

    /// Check completeness and build the opaque payload.
    pub fn begin_submit(&mut self) -> Result<Submission, SessionError> {
        if self.phase == BehaviourPhase::Completed {
            return Err(SessionError::Completed);
        }
        if self.status.submitting {
            return Err(SessionError::AlreadySubmitting);
        }
        if self.answered_count() < self.total_questions() {
            warn!(
                session = %self.id,
                answered = self.answered_count(),
                total = self.total_questions(),
                "submission blocked: unanswered scenarios"
            );
            self.status.fail(INCOMPLETE_SCENARIO_MESSAGE);
            return Err(SessionError::Incomplete(INCOMPLETE_SCENARIO_MESSAGE));
        }

        self.status.start();
        let payload = BehaviourPayload {
            user_id: self.user_id,
            answers: self.answers.to_map(),
        };
        info!(session = %self.id, answers = ?payload.answers, "behavioural answers submitted");
        Ok(Submission::Behaviour(payload))
    }

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
                self.phase = BehaviourPhase::Completed;
                self.receipt = Some(receipt);
                Ok(())
            }
            Err(err) => {
                warn!(session = %self.id, error = %err, "behavioural submission failed");
                self.status.fail(err.to_string());
                Err(err.into())
            }
        }
    }

    #[instrument(skip_all, fields(session = %self.id, sink = sink.name()))]
    pub async fn submit(&mut self, sink: &dyn SubmissionSink) -> Result<(), SessionError> {
        let submission = self.begin_submit()?;
        let result = sink.submit(&submission).await;
        self.finish_submit(result)
    }

    /// Leave the completed quiz, discarding the session.
    pub fn dismiss_completion(self) -> Result<Destination, Self> {
        if self.phase == BehaviourPhase::Completed {
            info!(session = %self.id, "behavioural session closed");
            Ok(Destination::TestSelection)
        } else {
            Err(self)
        }
    }

    /// Apply one display-layer event.
    pub fn apply(&mut self, event: BehaviourEvent) -> Result<Effect, SessionError> {
        match event {
            BehaviourEvent::SelectOption { index } => {
                self.select_option(index)?;
                Ok(Effect::None)
            }
            BehaviourEvent::Next => {
                self.go_next();
                Ok(Effect::None)
            }
            BehaviourEvent::Previous => {
                self.go_previous();
                Ok(Effect::None)
            }
            BehaviourEvent::Submit => self.begin_submit().map(Effect::Submit),
            BehaviourEvent::DismissCompletion => {
                if self.phase == BehaviourPhase::Completed {
                    Ok(Effect::Navigate(Destination::TestSelection))
                } else {
                    Err(SessionError::NotCompleted)
                }
            }
        }
    }
}
