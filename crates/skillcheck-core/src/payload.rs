//! Submission payload shapes and the answer normalization that builds them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::answers::AnswerMap;
use crate::model::ListeningQuestionSet;

/// Derive the single-letter token from option text shaped `"<letter>. <text>"`.
///
/// Text without a `.` delimiter yields `None`; this is the defined degradation
/// for options that do not follow the lettered convention.
pub fn option_letter(option_text: &str) -> Option<String> {
    let trimmed = option_text.trim();
    if trimmed.is_empty() || !trimmed.contains('.') {
        return None;
    }
    trimmed.chars().next().map(String::from)
}

/// One normalized multiple-choice answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqAnswer {
    pub id: String,
    /// Letter token, or `null` when no token could be derived.
    pub answer: Option<String>,
}

/// One free-text answer, empty when the candidate left it blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenAnswer {
    pub id: String,
    pub answer: String,
}

/// Payload posted for a completed listening test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListeningPayload {
    pub user_id: u64,
    pub mcq: Vec<McqAnswer>,
    pub written: Vec<WrittenAnswer>,
}

impl ListeningPayload {
    /// Build the payload in question-set order.
    ///
    /// Every MCQ and written question gets an entry, answered or not. Answers
    /// are looked up through the question set so explicit option labels win
    /// over the string-parsing fallback.
    pub fn build(questions: &ListeningQuestionSet, answers: &AnswerMap, user_id: u64) -> Self {
        let mcq = questions
            .mcq
            .iter()
            .map(|question| {
                let answer = answers.get(&question.id).and_then(|selected| {
                    match question.option(selected) {
                        Some(option) => option.answer_token(),
                        None => option_letter(selected),
                    }
                });
                McqAnswer {
                    id: question.id.clone(),
                    answer,
                }
            })
            .collect();

        let written = questions
            .written
            .iter()
            .map(|question| WrittenAnswer {
                id: question.id.clone(),
                answer: answers.get(&question.id).unwrap_or_default().to_string(),
            })
            .collect();

        Self {
            user_id,
            mcq,
            written,
        }
    }
}

/// Payload posted for a completed behavioural quiz. The answers are opaque
/// `option-<index>` tokens keyed by scenario id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviourPayload {
    pub user_id: u64,
    pub answers: BTreeMap<String, String>,
}
