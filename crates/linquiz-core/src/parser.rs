//! TOML question bank parser.
//!
//! Loads question banks from TOML files, directories, or the banks built
//! into the binary, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::BankError;
use crate::grading::normalize;
use crate::model::{Level, Question, QuestionBank};

const BUILTIN_BEGINNER: &str = include_str!("../questions/q1.toml");
const BUILTIN_NOVICE: &str = include_str!("../questions/q2.toml");
const BUILTIN_INTERMEDIATE: &str = include_str!("../questions/q3.toml");
const BUILTIN_ADVANCED: &str = include_str!("../questions/q4.toml");

/// Intermediate TOML structure for parsing question bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    level: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: u32,
    prompt: String,
    answers: Vec<String>,
    #[serde(default)]
    hint: String,
}

/// Parse a single TOML file into a `QuestionBank`.
pub fn parse_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse a TOML string into a `QuestionBank` (useful for testing).
///
/// Questions are sorted by id; the ids must then run exactly 1..=n and
/// every question needs at least one accepted answer.
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let level: Level = parsed
        .bank
        .level
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}: {}", source_path.display(), e))?;

    let mut questions: Vec<Question> = parsed
        .questions
        .into_iter()
        .map(|q| Question {
            id: q.id,
            prompt: q.prompt.trim().to_string(),
            accepted_answers: q.answers,
            hint: q.hint.trim().to_string(),
        })
        .collect();
    questions.sort_by_key(|q| q.id);

    check_structure(&questions)
        .with_context(|| format!("invalid question bank: {}", source_path.display()))?;

    Ok(QuestionBank { level, questions })
}

fn check_structure(questions: &[Question]) -> Result<(), BankError> {
    let expected_last = questions.len() as u32;
    for (position, question) in questions.iter().enumerate() {
        if question.id != position as u32 + 1 {
            return Err(BankError::NonContiguousIds {
                expected_last,
                found: question.id,
                position: position + 1,
            });
        }
        if question.accepted_answers.is_empty() {
            return Err(BankError::NoAnswers(question.id));
        }
    }
    Ok(())
}

/// The question bank compiled into the binary for `level`.
pub fn builtin_bank(level: Level) -> Result<QuestionBank> {
    let content = match level {
        Level::Beginner => BUILTIN_BEGINNER,
        Level::Novice => BUILTIN_NOVICE,
        Level::Intermediate => BUILTIN_INTERMEDIATE,
        Level::Advanced => BUILTIN_ADVANCED,
    };
    let source = format!("<builtin>/{}.toml", level.code());
    let bank = parse_bank_str(content, Path::new(&source))?;
    ensure_level(&bank, level)?;
    Ok(bank)
}

/// Load the bank for `level`, preferring `<dir>/<code>.toml` when a
/// directory override is given and the file exists.
pub fn load_bank(level: Level, dir: Option<&Path>) -> Result<QuestionBank> {
    if let Some(dir) = dir {
        let path = dir.join(format!("{}.toml", level.code()));
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading question bank override");
            let bank = parse_bank(&path)?;
            ensure_level(&bank, level)
                .with_context(|| format!("invalid question bank: {}", path.display()))?;
            return Ok(bank);
        }
        tracing::debug!(
            path = %path.display(),
            "no override for level, using builtin bank"
        );
    }
    builtin_bank(level)
}

fn ensure_level(bank: &QuestionBank, level: Level) -> Result<(), BankError> {
    if bank.level != level {
        return Err(BankError::LevelMismatch {
            expected: level.to_string(),
            found: bank.level.to_string(),
        });
    }
    Ok(())
}

/// Load every `.toml` question bank in a directory (not recursive).
pub fn load_bank_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut banks = Vec::new();
    for path in paths {
        match parse_bank(&path) {
            Ok(bank) => banks.push(bank),
            Err(e) => {
                tracing::warn!("skipping {}: {:#}", path.display(), e);
            }
        }
    }
    Ok(banks)
}

/// A warning from question bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<u32>,
    /// Warning message.
    pub message: String,
}

/// Validate a question bank for issues that do not stop it from loading.
pub fn validate_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for question in &bank.questions {
        let mut warn = |message: String| {
            warnings.push(ValidationWarning {
                question_id: Some(question.id),
                message,
            })
        };

        if question.prompt.is_empty() {
            warn("prompt is empty".into());
        }
        if question.hint.is_empty() {
            warn("hint is empty".into());
        }

        let mut seen = HashSet::new();
        for answer in &question.accepted_answers {
            let normalized = normalize(answer);
            if normalized.is_empty() {
                warn("accepted answer is blank and can never match".into());
            } else if !seen.insert(normalized.clone()) {
                warn(format!("duplicate accepted answer: {normalized}"));
            }
        }
    }

    if bank.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "bank has no questions".into(),
        });
    }

    warnings
}
