//! Core data model types for linquiz.
//!
//! Difficulty levels, questions, and the per-level question bank that a
//! session reads from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Difficulty tier selecting which question bank is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Novice,
    Intermediate,
    Advanced,
}

impl Level {
    /// All levels in ascending difficulty.
    pub const ALL: [Level; 4] = [
        Level::Beginner,
        Level::Novice,
        Level::Intermediate,
        Level::Advanced,
    ];

    /// Short key used for file names (`q1`..`q4`).
    pub fn code(self) -> &'static str {
        match self {
            Level::Beginner => "q1",
            Level::Novice => "q2",
            Level::Intermediate => "q3",
            Level::Advanced => "q4",
        }
    }

    /// 1-based position in the level menu.
    pub fn number(self) -> u8 {
        match self {
            Level::Beginner => 1,
            Level::Novice => 2,
            Level::Intermediate => 3,
            Level::Advanced => 4,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Level::Beginner => "Beginner",
            Level::Novice => "Novice",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
        }
    }

    /// One-line description of what the level covers.
    pub fn topic(self) -> &'static str {
        match self {
            Level::Beginner => "server basics (pwd, cd, ls, vim ...)",
            Level::Novice => "files and directories (cp, mv, rm, head/tail ...)",
            Level::Intermediate => "search, pipes, permissions, processes (grep, find, chmod ...)",
            Level::Advanced => "networking, archives, real-world combos (scp, tar, nohup ...)",
        }
    }

    /// Study guide consulted when building remediation prompts.
    pub fn guide_file(self) -> &'static str {
        match self {
            Level::Beginner | Level::Novice => "guide_beginner.md",
            Level::Intermediate => "guide_intermediate.md",
            Level::Advanced => "guide_advanced.md",
        }
    }

    pub fn next(self) -> Option<Level> {
        match self {
            Level::Beginner => Some(Level::Novice),
            Level::Novice => Some(Level::Intermediate),
            Level::Intermediate => Some(Level::Advanced),
            Level::Advanced => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Beginner => write!(f, "beginner"),
            Level::Novice => write!(f, "novice"),
            Level::Intermediate => write!(f, "intermediate"),
            Level::Advanced => write!(f, "advanced"),
        }
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" | "q1" | "1" => Ok(Level::Beginner),
            "novice" | "q2" | "2" => Ok(Level::Novice),
            "intermediate" | "q3" | "3" => Ok(Level::Intermediate),
            "advanced" | "q4" | "4" => Ok(Level::Advanced),
            other => Err(format!("unknown level: {other}")),
        }
    }
}

/// A single quiz question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Position in the bank, starting at 1.
    pub id: u32,
    /// The question shown to the user.
    pub prompt: String,
    /// Accepted answers; the first one is the canonical display form.
    pub accepted_answers: Vec<String>,
    /// Shown when the user types `h`.
    pub hint: String,
}

impl Question {
    /// The answer printed after a wrong or skipped attempt.
    pub fn canonical_answer(&self) -> &str {
        self.accepted_answers
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// The ordered question set for one level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionBank {
    pub level: Level,
    /// Sorted by id; ids run 1..=len.
    pub questions: Vec<Question>,
}

impl QuestionBank {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Question> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.questions.get(index).filter(|q| q.id == id)
    }

    pub fn question_count(&self) -> u32 {
        self.questions.len() as u32
    }
}
