//! Per-question attempts and the result set a session produces.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::grading::{grade, normalize};
use crate::model::Question;

/// One user response to one question, with its verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub question_id: u32,
    /// The trimmed input as typed.
    pub raw_text: String,
    pub normalized_text: String,
    pub is_correct: bool,
    /// Blank input. Always counts as incorrect.
    #[serde(default)]
    pub skipped: bool,
}

impl Attempt {
    /// Grade `raw` against `question`. Blank input becomes a skip.
    pub fn evaluate(question: &Question, raw: &str) -> Self {
        let raw_text = raw.trim().to_string();
        if raw_text.is_empty() {
            return Self::skipped(question.id);
        }
        Self {
            question_id: question.id,
            normalized_text: normalize(&raw_text),
            is_correct: grade(&raw_text, &question.accepted_answers),
            raw_text,
            skipped: false,
        }
    }

    pub fn skipped(question_id: u32) -> Self {
        Self {
            question_id,
            raw_text: String::new(),
            normalized_text: String::new(),
            is_correct: false,
            skipped: true,
        }
    }
}

/// All attempts of one session pass, keyed by question id.
///
/// Entries are only ever added; a retake starts a new set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    attempts: BTreeMap<u32, Attempt>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attempt. Returns `false` (and keeps the existing entry) if the
    /// question already has one.
    pub fn record(&mut self, attempt: Attempt) -> bool {
        match self.attempts.entry(attempt.question_id) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(attempt);
                true
            }
        }
    }

    pub fn get(&self, question_id: u32) -> Option<&Attempt> {
        self.attempts.get(&question_id)
    }

    pub fn contains(&self, question_id: u32) -> bool {
        self.attempts.contains_key(&question_id)
    }

    /// Attempts in ascending question order.
    pub fn iter(&self) -> impl Iterator<Item = &Attempt> {
        self.attempts.values()
    }

    /// Wrong or skipped attempts in ascending question order.
    pub fn missed(&self) -> impl Iterator<Item = &Attempt> {
        self.attempts.values().filter(|a| !a.is_correct)
    }

    pub fn has_missed(&self) -> bool {
        self.missed().next().is_some()
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}
