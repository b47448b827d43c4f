//! Answer normalization and grading.
//!
//! Comparison is exact string equality after whitespace normalization.
//! Case, punctuation and flag order are all significant: `ls -la` and
//! `ls -al` only both pass when both are listed as accepted answers.

/// Trim the input and collapse every internal whitespace run to one space.
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns `true` if the input asks for the current question's hint.
///
/// Checked on the trimmed, lowercased input before any normalization.
pub fn is_hint_request(raw: &str) -> bool {
    raw.trim().to_lowercase() == "h"
}

/// Grade a non-empty answer against the accepted-answer list.
///
/// Callers treat blank input as a skip and never pass it here.
pub fn grade<S: AsRef<str>>(raw_answer: &str, accepted_answers: &[S]) -> bool {
    let answer = normalize(raw_answer);
    accepted_answers
        .iter()
        .any(|accepted| normalize(accepted.as_ref()) == answer)
}
