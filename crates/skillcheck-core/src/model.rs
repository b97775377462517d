//! Question-set data model.
//!
//! These types are loaded once per session and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::payload::option_letter;

/// One selectable option of a multiple-choice question.
///
/// Question sets written in the legacy format carry options as plain strings
/// such as `"B. Paris"`; newer sets can state the label explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceOption {
    /// Free-form option text, optionally shaped `"<letter>. <text>"`.
    Plain(String),
    /// Option with an explicit answer label.
    Labeled { label: String, text: String },
}

impl ChoiceOption {
    /// The text presented to the candidate and stored in the Answer Map.
    pub fn display_text(&self) -> String {
        match self {
            ChoiceOption::Plain(text) => text.clone(),
            ChoiceOption::Labeled { label, text } => format!("{label}. {text}"),
        }
    }

    /// The token submitted for this option, if one can be determined.
    pub fn answer_token(&self) -> Option<String> {
        match self {
            ChoiceOption::Plain(text) => option_letter(text),
            ChoiceOption::Labeled { label, .. } => Some(label.clone()),
        }
    }
}

impl From<&str> for ChoiceOption {
    fn from(text: &str) -> Self {
        ChoiceOption::Plain(text.to_string())
    }
}

/// A multiple-choice comprehension question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqQuestion {
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
}

impl McqQuestion {
    /// Find the option whose display text equals `selected`.
    pub fn option(&self, selected: &str) -> Option<&ChoiceOption> {
        self.options.iter().find(|o| o.display_text() == selected)
    }
}

/// A free-text comprehension question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenQuestion {
    pub id: String,
    pub prompt: String,
}

/// A behavioural scenario with its multiple-choice reactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioQuestion {
    pub id: String,
    pub scenario: String,
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
}

/// Questions asked after the audio clip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListeningQuestionSet {
    #[serde(default)]
    pub mcq: Vec<McqQuestion>,
    #[serde(default)]
    pub written: Vec<WrittenQuestion>,
}

impl ListeningQuestionSet {
    pub fn mcq_question(&self, id: &str) -> Option<&McqQuestion> {
        self.mcq.iter().find(|q| q.id == id)
    }

    pub fn written_question(&self, id: &str) -> Option<&WrittenQuestion> {
        self.written.iter().find(|q| q.id == id)
    }

    pub fn len(&self) -> usize {
        self.mcq.len() + self.written.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered scenario questions for the behavioural quiz.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviourQuestionSet {
    #[serde(default)]
    pub questions: Vec<ScenarioQuestion>,
}

impl BehaviourQuestionSet {
    pub fn new(questions: Vec<ScenarioQuestion>) -> Self {
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// The two kinds of assessment offered to a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    Listening,
    Behaviour,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestKind::Listening => write!(f, "listening"),
            TestKind::Behaviour => write!(f, "behaviour"),
        }
    }
}

impl FromStr for TestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "listening" | "audio" => Ok(TestKind::Listening),
            "behaviour" | "behavior" | "behavioural" | "behavioral" => Ok(TestKind::Behaviour),
            other => Err(format!("unknown test kind: {other}")),
        }
    }
}
