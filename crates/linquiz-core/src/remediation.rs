//! AI-backed follow-up for missed questions: review notes, supplemental
//! material, and a generated retest.
//!
//! Each phase depends only on the question bank and the result set, so a
//! failure in one phase never blocks the others. A result set with nothing
//! missed short-circuits every phase before the generator is called.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use crate::error::{RemediationError, RetestParseError};
use crate::model::{Level, Question, QuestionBank};
use crate::report::guide_excerpt;
use crate::results::ResultSet;
use crate::session::{run_session, SessionReporter};
use crate::summary::percentage;
use crate::traits::{
    strip_code_fence, DocumentKind, DocumentStore, GenerateRequest, GuideSource, TextGenerator,
};

/// New questions requested per missed question.
pub const RETEST_QUESTIONS_PER_MISS: usize = 2;

const SKIPPED_PLACEHOLDER: &str = "(skipped)";

/// Generation settings for the three phases.
#[derive(Debug, Clone)]
pub struct RemediationConfig {
    pub model: String,
    pub review_max_tokens: u32,
    pub supplement_max_tokens: u32,
    pub retest_max_tokens: u32,
    pub temperature: f64,
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".into(),
            review_max_tokens: 4000,
            supplement_max_tokens: 4000,
            retest_max_tokens: 2000,
            temperature: 1.0,
        }
    }
}

/// A missed question as presented to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissedQuestion {
    /// Display label, e.g. "Q3".
    pub number: String,
    pub question: String,
    /// Canonical accepted answer.
    pub answer: String,
    /// What the user typed, or a placeholder for a skip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<String>,
    pub hint: String,
}

/// A generated markdown document and where it was saved.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub content: String,
    pub path: PathBuf,
}

/// Aggregate score of a retest run. Retests are never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetestScore {
    pub correct: u32,
    pub total: u32,
}

impl RetestScore {
    pub fn percentage(&self) -> f64 {
        percentage(self.correct, self.total)
    }
}

/// Collect the missed (wrong or skipped) questions in ascending order.
///
/// Attempts whose id is not in the bank are ignored.
pub fn missed_questions(bank: &QuestionBank, results: &ResultSet) -> Vec<MissedQuestion> {
    results
        .missed()
        .filter_map(|attempt| {
            let Some(question) = bank.get(attempt.question_id) else {
                tracing::warn!(
                    question = attempt.question_id,
                    level = %bank.level,
                    "attempt refers to a question outside the bank"
                );
                return None;
            };
            let user_answer = if attempt.skipped || attempt.raw_text.is_empty() {
                SKIPPED_PLACEHOLDER.to_string()
            } else {
                attempt.raw_text.clone()
            };
            Some(MissedQuestion {
                number: format!("Q{}", question.id),
                question: question.prompt.clone(),
                answer: question.canonical_answer().to_string(),
                user_answer: Some(user_answer),
                hint: question.hint.clone(),
            })
        })
        .collect()
}

fn to_json(items: &impl Serialize) -> String {
    serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string())
}

/// Prompt asking for review notes on each missed question.
pub fn review_prompt(level: Level, missed: &[MissedQuestion], guide: &str) -> String {
    let name = level.display_name();
    format!(
        r##"You are a Linux command-line tutor. A student took the {name} level quiz and got the questions below wrong.

## Missed questions
{missed}

## Reference guide
{guide}

## Task
For each missed question:
1. Explain why the student's answer was wrong by comparing it with the correct answer
2. Explain what the correct command means and how it is structured
3. Give a table of related commands and options
4. Show usage examples for similar situations

Write in markdown. Start with the title "# {name} Review Notes"."##,
        missed = to_json(&missed),
        guide = guide_excerpt(guide),
    )
}

/// Prompt asking for study material on the topics behind the missed
/// questions. Only the question texts are sent.
pub fn supplement_prompt(level: Level, missed: &[MissedQuestion], guide: &str) -> String {
    let name = level.display_name();
    let topics: Vec<&str> = missed.iter().map(|m| m.question.as_str()).collect();
    format!(
        r##"You are a Linux command-line tutor. A student has weak spots at the {name} level.

## Weak topics (missed questions)
{topics}

## Reference guide
{guide}

## Task
Analyze the topics of the missed questions and write supplemental study material:
1. Group the weak topics into 2-3 themes
2. For each theme:
   - Explain the core concepts
   - Give a table of frequently used commands and options
   - Show 3 real-world scenarios
   - Share memorization tips (what abbreviations stand for, mnemonics)

Write in markdown. Start with the title "# {name} Supplemental Material"."##,
        topics = serde_json::to_string(&topics).unwrap_or_else(|_| "[]".to_string()),
        guide = guide_excerpt(guide),
    )
}

/// Prompt asking for a JSON array of fresh questions on the same topics.
pub fn retest_prompt(level: Level, missed: &[MissedQuestion]) -> String {
    let name = level.display_name();
    let without_user_answers: Vec<MissedQuestion> = missed
        .iter()
        .cloned()
        .map(|m| MissedQuestion {
            user_answer: None,
            ..m
        })
        .collect();
    format!(
        r#"You are a Linux command-line tutor. A student got the questions below wrong on the {name} level quiz.

## Missed questions
{missed}

## Task
Write new questions on the same topics as the missed ones.
- {per_miss} similar questions for each missed question
- Each question has a "question", an "answer" and a "hint"
- The answer must be a single shell command
- Same difficulty as the original or slightly easier
- Output a JSON array

Output format (pure JSON only, no markdown code block):
[{{"q": "question", "a": "answer", "h": "hint"}}]"#,
        missed = to_json(&without_user_answers),
        per_miss = RETEST_QUESTIONS_PER_MISS,
    )
}

/// Parse generated retest output into questions with ids 1..=n.
///
/// A surrounding code fence is stripped first. The result must be a JSON
/// array of objects, each with non-empty string `q`, `a` and `h` fields;
/// any item that falls short rejects the whole response.
pub fn parse_retest(raw: &str) -> Result<Vec<Question>, RetestParseError> {
    let body = strip_code_fence(raw);
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| RetestParseError::Malformed(e.to_string()))?;

    let items = value
        .as_array()
        .ok_or_else(|| RetestParseError::Malformed("top-level value is not an array".into()))?;
    if items.is_empty() {
        return Err(RetestParseError::Empty);
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let object = item.as_object().ok_or_else(|| {
                RetestParseError::Malformed(format!("item {index} is not an object"))
            })?;
            let field = |name: &'static str| -> Result<String, RetestParseError> {
                object
                    .get(name)
                    .and_then(|v| v.as_str())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .ok_or(RetestParseError::MissingField { index, field: name })
            };
            Ok(Question {
                id: index as u32 + 1,
                prompt: field("q")?,
                accepted_answers: vec![field("a")?],
                hint: field("h")?,
            })
        })
        .collect()
}

/// Drive a retest over `questions` and count correct answers.
pub fn run_retest<R: BufRead + ?Sized>(
    questions: &[Question],
    input: &mut R,
    reporter: &dyn SessionReporter,
) -> std::io::Result<RetestScore> {
    let outcome = run_session(questions, input, reporter)?;
    Ok(RetestScore {
        correct: outcome.results.iter().filter(|a| a.is_correct).count() as u32,
        total: questions.len() as u32,
    })
}

/// Review, supplement and retest generation for one level.
pub struct RemediationPipeline {
    generator: Arc<dyn TextGenerator>,
    guides: Arc<dyn GuideSource>,
    documents: Arc<dyn DocumentStore>,
    config: RemediationConfig,
}

impl RemediationPipeline {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        guides: Arc<dyn GuideSource>,
        documents: Arc<dyn DocumentStore>,
        config: RemediationConfig,
    ) -> Self {
        Self {
            generator,
            guides,
            documents,
            config,
        }
    }

    /// Generate review notes. `Ok(None)` when nothing was missed.
    #[instrument(skip_all, fields(level = %bank.level))]
    pub async fn generate_review(
        &self,
        bank: &QuestionBank,
        results: &ResultSet,
    ) -> Result<Option<GeneratedDocument>, RemediationError> {
        let missed = missed_questions(bank, results);
        if missed.is_empty() {
            return Ok(None);
        }
        let guide = self.guides.load_guide(bank.level);
        let prompt = review_prompt(bank.level, &missed, &guide);
        self.generate_document(
            bank.level,
            DocumentKind::Review,
            prompt,
            self.config.review_max_tokens,
        )
        .await
        .map(Some)
    }

    /// Generate supplemental material. `Ok(None)` when nothing was missed.
    #[instrument(skip_all, fields(level = %bank.level))]
    pub async fn generate_supplement(
        &self,
        bank: &QuestionBank,
        results: &ResultSet,
    ) -> Result<Option<GeneratedDocument>, RemediationError> {
        let missed = missed_questions(bank, results);
        if missed.is_empty() {
            return Ok(None);
        }
        let guide = self.guides.load_guide(bank.level);
        let prompt = supplement_prompt(bank.level, &missed, &guide);
        self.generate_document(
            bank.level,
            DocumentKind::Supplement,
            prompt,
            self.config.supplement_max_tokens,
        )
        .await
        .map(Some)
    }

    /// Generate retest questions. `Ok(None)` when nothing was missed.
    #[instrument(skip_all, fields(level = %bank.level))]
    pub async fn generate_retest(
        &self,
        bank: &QuestionBank,
        results: &ResultSet,
    ) -> Result<Option<Vec<Question>>, RemediationError> {
        let missed = missed_questions(bank, results);
        if missed.is_empty() {
            return Ok(None);
        }
        let prompt = retest_prompt(bank.level, &missed);
        let raw = self.call(prompt, self.config.retest_max_tokens).await?;
        let questions = parse_retest(&raw)?;
        tracing::info!(count = questions.len(), "retest generated");
        Ok(Some(questions))
    }

    async fn generate_document(
        &self,
        level: Level,
        kind: DocumentKind,
        prompt: String,
        max_tokens: u32,
    ) -> Result<GeneratedDocument, RemediationError> {
        let content = self.call(prompt, max_tokens).await?;
        let path = self
            .documents
            .save_document(level, kind, &content)
            .map_err(|source| RemediationError::Persist {
                kind: kind.as_str(),
                source,
            })?;
        Ok(GeneratedDocument { content, path })
    }

    async fn call(&self, prompt: String, max_tokens: u32) -> Result<String, RemediationError> {
        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt,
            system_prompt: None,
            max_tokens,
            temperature: self.config.temperature,
        };
        let response = self
            .generator
            .generate(&request)
            .await
            .map_err(RemediationError::Generation)?;
        tracing::debug!(
            provider = self.generator.name(),
            model = %response.model,
            input_tokens = response.token_usage.input_tokens,
            output_tokens = response.token_usage.output_tokens,
            latency_ms = response.latency_ms,
            "generation complete"
        );
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::ProviderError;
    use crate::results::Attempt;
    use crate::session::NoopReporter;
    use crate::traits::{GenerateResponse, TokenUsage};

    /// Answers by prompt substring; fails for prompts listed in `failing`.
    struct ScriptedGenerator {
        responses: Vec<(&'static str, &'static str)>,
        failing: Vec<&'static str>,
        calls: AtomicU32,
    }

    impl ScriptedGenerator {
        fn new(responses: Vec<(&'static str, &'static str)>) -> Self {
            Self {
                responses,
                failing: Vec::new(),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if self.failing.iter().any(|k| request.prompt.contains(k)) {
                return Err(ProviderError::NetworkError("connection reset".into()).into());
            }
            let content = self
                .responses
                .iter()
                .find(|(key, _)| request.prompt.contains(key))
                .map(|(_, v)| v.to_string())
                .unwrap_or_default();
            Ok(GenerateResponse {
                content,
                model: request.model.clone(),
                token_usage: TokenUsage::default(),
                latency_ms: 1,
            })
        }
    }

    struct FixedGuide(&'static str);

    impl GuideSource for FixedGuide {
        fn load_guide(&self, _: Level) -> String {
            self.0.to_string()
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        saved: Mutex<HashMap<(Level, DocumentKind), String>>,
    }

    impl DocumentStore for MemoryStore {
        fn save_document(
            &self,
            level: Level,
            kind: DocumentKind,
            content: &str,
        ) -> anyhow::Result<PathBuf> {
            self.saved
                .lock()
                .unwrap()
                .insert((level, kind), content.to_string());
            Ok(PathBuf::from(format!("{}_{}.md", level.code(), kind.as_str())))
        }
    }

    fn bank() -> QuestionBank {
        QuestionBank {
            level: Level::Beginner,
            questions: vec![
                Question {
                    id: 1,
                    prompt: "Print the current directory".into(),
                    accepted_answers: vec!["pwd".into()],
                    hint: "print working directory".into(),
                },
                Question {
                    id: 2,
                    prompt: "List hidden files in long format".into(),
                    accepted_answers: vec!["ls -la".into(), "ls -al".into()],
                    hint: "-l and -a".into(),
                },
                Question {
                    id: 3,
                    prompt: "Go to the parent directory".into(),
                    accepted_answers: vec!["cd ..".into()],
                    hint: "two dots".into(),
                },
            ],
        }
    }

    fn results_with_misses(bank: &QuestionBank) -> ResultSet {
        let mut results = ResultSet::new();
        results.record(Attempt::evaluate(&bank.questions[0], "pwd"));
        results.record(Attempt::evaluate(&bank.questions[1], "ls -l"));
        results.record(Attempt::evaluate(&bank.questions[2], ""));
        results
    }

    fn perfect_results(bank: &QuestionBank) -> ResultSet {
        let mut results = ResultSet::new();
        for q in &bank.questions {
            results.record(Attempt::evaluate(q, q.canonical_answer()));
        }
        results
    }

    fn pipeline(generator: Arc<ScriptedGenerator>, store: Arc<MemoryStore>) -> RemediationPipeline {
        RemediationPipeline::new(
            generator,
            Arc::new(FixedGuide("# Guide\nUse ls to list files.")),
            store,
            RemediationConfig::default(),
        )
    }

    const RETEST_JSON: &str = r#"```json
[{"q": "List files one per line", "a": "ls -1", "h": "digit one"},
 {"q": "Show the parent path", "a": "cd .. && pwd", "h": "two commands"}]
```"#;

    #[test]
    fn missed_questions_label_skips() {
        let bank = bank();
        let missed = missed_questions(&bank, &results_with_misses(&bank));
        assert_eq!(missed.len(), 2);
        assert_eq!(missed[0].number, "Q2");
        assert_eq!(missed[0].answer, "ls -la");
        assert_eq!(missed[0].user_answer.as_deref(), Some("ls -l"));
        assert_eq!(missed[1].user_answer.as_deref(), Some("(skipped)"));
    }

    #[test]
    fn prompts_embed_missed_questions() {
        let bank = bank();
        let missed = missed_questions(&bank, &results_with_misses(&bank));

        let review = review_prompt(Level::Beginner, &missed, "guide text");
        assert!(review.contains("\"user_answer\": \"ls -l\""));
        assert!(review.contains("guide text"));
        assert!(review.contains("# Beginner Review Notes"));

        let supplement = supplement_prompt(Level::Beginner, &missed, "");
        assert!(supplement.contains("List hidden files in long format"));
        assert!(!supplement.contains("ls -l\""));
        assert!(supplement.ends_with("Start with the title \"# Beginner Supplemental Material\"."));

        let retest = retest_prompt(Level::Beginner, &missed);
        assert!(!retest.contains("user_answer"));
        assert!(retest.contains(r#"[{"q": "question", "a": "answer", "h": "hint"}]"#));
    }

    #[test]
    fn review_prompt_truncates_guide() {
        let guide = "x".repeat(5000);
        let prompt = review_prompt(Level::Novice, &[], &guide);
        assert!(prompt.contains(&"x".repeat(3000)));
        assert!(!prompt.contains(&"x".repeat(3001)));
    }

    #[test]
    fn parse_retest_strips_fence() {
        let questions =
            parse_retest("```json\n[{\"q\":\"a\",\"a\":\"b\",\"h\":\"c\"}]\n```").unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].id, 1);
        assert_eq!(questions[0].prompt, "a");
        assert_eq!(questions[0].accepted_answers, vec!["b".to_string()]);
        assert_eq!(questions[0].hint, "c");
    }

    #[test]
    fn parse_retest_rejects_non_json() {
        assert!(matches!(
            parse_retest("not json"),
            Err(RetestParseError::Malformed(_))
        ));
    }

    #[test]
    fn parse_retest_rejects_partial_objects() {
        let raw = r#"[{"q":"a","a":"b","h":"c"},{"q":"d","a":"e"}]"#;
        assert!(matches!(
            parse_retest(raw),
            Err(RetestParseError::MissingField {
                index: 1,
                field: "h"
            })
        ));

        let blank = r#"[{"q":"a","a":"  ","h":"c"}]"#;
        assert!(matches!(
            parse_retest(blank),
            Err(RetestParseError::MissingField { field: "a", .. })
        ));

        let wrong_type = r#"[{"q":"a","a":7,"h":"c"}]"#;
        assert!(parse_retest(wrong_type).is_err());
    }

    #[test]
    fn parse_retest_rejects_non_arrays() {
        assert!(matches!(
            parse_retest(r#"{"q":"a","a":"b","h":"c"}"#),
            Err(RetestParseError::Malformed(_))
        ));
        assert!(matches!(
            parse_retest(r#"["ls"]"#),
            Err(RetestParseError::Malformed(_))
        ));
        assert!(matches!(parse_retest("[]"), Err(RetestParseError::Empty)));
    }

    #[test]
    fn retest_is_graded_with_normal_rules() {
        let questions = parse_retest(RETEST_JSON).unwrap();
        let mut input = Cursor::new("h\nls   -1\nCD .. && pwd\n");
        let score = run_retest(&questions, &mut input, &NoopReporter).unwrap();
        assert_eq!(score, RetestScore { correct: 1, total: 2 });
        assert!((score.percentage() - 50.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn phases_short_circuit_without_misses() {
        let bank = bank();
        let generator = Arc::new(ScriptedGenerator::new(vec![]));
        let store = Arc::new(MemoryStore::default());
        let pipeline = pipeline(generator.clone(), store.clone());
        let results = perfect_results(&bank);

        assert!(pipeline.generate_review(&bank, &results).await.unwrap().is_none());
        assert!(pipeline
            .generate_supplement(&bank, &results)
            .await
            .unwrap()
            .is_none());
        assert!(pipeline.generate_retest(&bank, &results).await.unwrap().is_none());
        assert_eq!(generator.calls(), 0);
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn review_and_supplement_are_saved_verbatim() {
        let bank = bank();
        let generator = Arc::new(ScriptedGenerator::new(vec![
            ("Review Notes", "# Beginner Review Notes\n\nraw text"),
            ("Supplemental Material", "# Beginner Supplemental Material"),
        ]));
        let store = Arc::new(MemoryStore::default());
        let pipeline = pipeline(generator.clone(), store.clone());
        let results = results_with_misses(&bank);

        let review = pipeline
            .generate_review(&bank, &results)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(review.content, "# Beginner Review Notes\n\nraw text");
        assert_eq!(review.path, PathBuf::from("q1_review.md"));

        pipeline
            .generate_supplement(&bank, &results)
            .await
            .unwrap()
            .unwrap();

        let saved = store.saved.lock().unwrap();
        assert_eq!(
            saved.get(&(Level::Beginner, DocumentKind::Review)).unwrap(),
            "# Beginner Review Notes\n\nraw text"
        );
        assert!(saved.contains_key(&(Level::Beginner, DocumentKind::Supplement)));
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn retest_parses_generated_questions() {
        let bank = bank();
        let generator = Arc::new(ScriptedGenerator::new(vec![("JSON array", RETEST_JSON)]));
        let pipeline = pipeline(generator, Arc::new(MemoryStore::default()));

        let questions = pipeline
            .generate_retest(&bank, &results_with_misses(&bank))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].canonical_answer(), "cd .. && pwd");
    }

    #[tokio::test]
    async fn malformed_retest_is_an_error_not_a_panic() {
        let bank = bank();
        let generator = Arc::new(ScriptedGenerator::new(vec![(
            "JSON array",
            "Sure! Here are some questions.",
        )]));
        let pipeline = pipeline(generator, Arc::new(MemoryStore::default()));

        let err = pipeline
            .generate_retest(&bank, &results_with_misses(&bank))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RemediationError::Retest(RetestParseError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn failed_phase_does_not_block_later_phases() {
        let bank = bank();
        let mut scripted = ScriptedGenerator::new(vec![
            ("Supplemental Material", "# Supplement"),
            ("JSON array", RETEST_JSON),
        ]);
        scripted.failing.push("Review Notes");
        let generator = Arc::new(scripted);
        let store = Arc::new(MemoryStore::default());
        let pipeline = pipeline(generator.clone(), store.clone());
        let results = results_with_misses(&bank);

        let review = pipeline.generate_review(&bank, &results).await;
        assert!(matches!(review, Err(RemediationError::Generation(_))));

        let supplement = pipeline.generate_supplement(&bank, &results).await.unwrap();
        assert!(supplement.is_some());
        let retest = pipeline.generate_retest(&bank, &results).await.unwrap();
        assert_eq!(retest.map(|q| q.len()), Some(2));
        assert_eq!(generator.calls(), 3);
        assert!(!store
            .saved
            .lock()
            .unwrap()
            .contains_key(&(Level::Beginner, DocumentKind::Review)));
    }
}
