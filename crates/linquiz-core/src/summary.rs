//! Aggregate scoring for a finished (or aborted) session.

use serde::{Deserialize, Serialize};

use crate::results::ResultSet;

/// Derived view of a result set. Recomputed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub correct_count: u32,
    pub total: u32,
    /// 0.0..=100.0; 0 when the bank is empty.
    pub percentage: f64,
    /// Wrong and skipped question ids, ascending.
    pub wrong_ids: Vec<u32>,
    /// Ids in 1..=total with no attempt, ascending.
    pub unattempted_ids: Vec<u32>,
}

impl Summary {
    /// Summarize `results` against a bank of `question_count` questions.
    pub fn compute(results: &ResultSet, question_count: u32) -> Self {
        let correct_count = results.iter().filter(|a| a.is_correct).count() as u32;
        let wrong_ids = results.missed().map(|a| a.question_id).collect();
        let unattempted_ids = (1..=question_count)
            .filter(|id| !results.contains(*id))
            .collect();

        Self {
            correct_count,
            total: question_count,
            percentage: percentage(correct_count, question_count),
            wrong_ids,
            unattempted_ids,
        }
    }

    /// Every question that still needs work: missed, then unattempted.
    pub fn needs_review(&self) -> Vec<u32> {
        self.wrong_ids
            .iter()
            .chain(&self.unattempted_ids)
            .copied()
            .collect()
    }

    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.correct_count == self.total
    }

    /// Filled cells out of ten, one per full ten percent.
    pub fn filled_cells(&self) -> usize {
        ((self.percentage / 10.0).floor() as usize).min(10)
    }
}

/// `correct / total * 100`, or 0 for an empty total.
pub fn percentage(correct: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    }
}
