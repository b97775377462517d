//! The per-session Answer Map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Currently recorded answers for one test session, keyed by question id.
///
/// Re-recording an id overwrites the previous value; entries are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap {
    entries: BTreeMap<String, String>,
}

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert an answer, returning the value it replaced.
    pub fn record(&mut self, question_id: &str, value: &str) -> Option<String> {
        self.entries
            .insert(question_id.to_string(), value.to_string())
    }

    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.entries.get(question_id).map(String::as_str)
    }

    /// Whether the question has a non-empty answer.
    pub fn has_answer(&self, question_id: &str) -> bool {
        self.get(question_id).is_some_and(|v| !v.is_empty())
    }

    /// Number of recorded entries, including empty ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_overwrites_and_reports_previous() {
        let mut answers = AnswerMap::new();
        assert_eq!(answers.record("q1", "A. One"), None);
        assert_eq!(answers.record("q1", "B. Two").as_deref(), Some("A. One"));
        assert_eq!(answers.get("q1"), Some("B. Two"));
        assert_eq!(answers.len(), 1);
    }

    #[test]
    fn empty_value_is_not_an_answer() {
        let mut answers = AnswerMap::new();
        answers.record("w1", "");
        assert!(!answers.has_answer("w1"));
        assert!(!answers.has_answer("missing"));
        assert_eq!(answers.len(), 1);
    }
}
