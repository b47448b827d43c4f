//! Saved session records, generated documents, and study guides on disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::Level;
use crate::results::ResultSet;
use crate::traits::{DocumentKind, DocumentStore, GuideSource};

/// Maximum guide length, in characters, embedded into a prompt.
pub const GUIDE_EXCERPT_CHARS: usize = 3000;

/// A saved session pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Unique id of the session pass.
    pub session_id: Uuid,
    /// When the record was written.
    pub saved_at: DateTime<Utc>,
    pub level: Level,
    pub level_name: String,
    pub results: ResultSet,
}

impl ResultRecord {
    pub fn new(level: Level, results: ResultSet) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            saved_at: Utc::now(),
            level,
            level_name: level.display_name().to_string(),
            results,
        }
    }

    /// Save the record as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize results")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write results to {}", path.display()))?;
        Ok(())
    }

    /// Load a record from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read results from {}", path.display()))?;
        let record: ResultRecord =
            serde_json::from_str(&content).context("failed to parse results JSON")?;
        Ok(record)
    }
}

/// The results directory: one JSON record per level plus generated
/// markdown documents.
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn results_path(&self, level: Level) -> PathBuf {
        self.dir.join(format!("{}.json", level.code()))
    }

    pub fn document_path(&self, level: Level, kind: DocumentKind) -> PathBuf {
        self.dir.join(format!("{}_{}.md", level.code(), kind.as_str()))
    }

    /// Write `results` as the latest record for `level`, replacing any
    /// previous one.
    pub fn save_results(&self, level: Level, results: &ResultSet) -> Result<PathBuf> {
        let path = self.results_path(level);
        ResultRecord::new(level, results.clone()).save_json(&path)?;
        tracing::info!(path = %path.display(), attempts = results.len(), "results saved");
        Ok(path)
    }

    pub fn load_results(&self, level: Level) -> Result<ResultRecord> {
        let path = self.results_path(level);
        let record = ResultRecord::load_json(&path)?;
        anyhow::ensure!(
            record.level == level,
            "{} holds results for level '{}', not '{}'",
            path.display(),
            record.level,
            level
        );
        Ok(record)
    }
}

impl DocumentStore for ResultStore {
    fn save_document(&self, level: Level, kind: DocumentKind, content: &str) -> Result<PathBuf> {
        let path = self.document_path(level, kind);
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), kind = kind.as_str(), "document saved");
        Ok(path)
    }
}

/// Study guides read from a directory, one markdown file per level group.
#[derive(Debug, Clone)]
pub struct GuideDirectory {
    dir: PathBuf,
}

impl GuideDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl GuideSource for GuideDirectory {
    fn load_guide(&self, level: Level) -> String {
        let path = self.dir.join(level.guide_file());
        match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "no study guide");
                String::new()
            }
        }
    }
}

/// The first [`GUIDE_EXCERPT_CHARS`] characters of a guide.
pub fn guide_excerpt(guide: &str) -> &str {
    match guide.char_indices().nth(GUIDE_EXCERPT_CHARS) {
        Some((end, _)) => &guide[..end],
        None => guide,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Question;
    use crate::results::Attempt;

    fn sample_results() -> ResultSet {
        let question = Question {
            id: 1,
            prompt: "Print the current directory".into(),
            accepted_answers: vec!["pwd".into()],
            hint: "print working directory".into(),
        };
        let mut results = ResultSet::new();
        results.record(Attempt::evaluate(&question, "pwd"));
        results.record(Attempt {
            question_id: 2,
            raw_text: "cd  /tmpp".into(),
            normalized_text: "cd /tmpp".into(),
            is_correct: false,
            skipped: false,
        });
        results.record(Attempt::skipped(3));
        results
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("results"));
        let results = sample_results();

        let path = store.save_results(Level::Beginner, &results).unwrap();
        assert_eq!(path, dir.path().join("results").join("q1.json"));

        let record = store.load_results(Level::Beginner).unwrap();
        assert_eq!(record.level, Level::Beginner);
        assert_eq!(record.level_name, "Beginner");
        for attempt in results.iter() {
            let loaded = record.results.get(attempt.question_id).unwrap();
            assert_eq!(loaded.is_correct, attempt.is_correct);
            assert_eq!(loaded.skipped, attempt.skipped);
        }
        assert_eq!(record.results, results);
    }

    #[test]
    fn load_rejects_record_for_other_level() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());
        ResultRecord::new(Level::Advanced, sample_results())
            .save_json(&store.results_path(Level::Novice))
            .unwrap();
        assert!(store.load_results(Level::Novice).is_err());
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());
        let err = store.load_results(Level::Intermediate).unwrap_err();
        assert!(err.to_string().contains("failed to read results"));
    }

    #[test]
    fn documents_are_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("out"));
        let path = store
            .save_document(Level::Novice, DocumentKind::Supplement, "# Notes\n")
            .unwrap();
        assert!(path.ends_with("q2_supplement.md"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "# Notes\n");
    }

    #[test]
    fn guide_directory_reads_level_guide() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("guide_beginner.md"), "# Basics").unwrap();
        let guides = GuideDirectory::new(dir.path());
        assert_eq!(guides.load_guide(Level::Novice), "# Basics");
        assert_eq!(guides.load_guide(Level::Advanced), "");
    }

    #[test]
    fn guide_excerpt_counts_characters() {
        let long = "가".repeat(GUIDE_EXCERPT_CHARS + 10);
        let excerpt = guide_excerpt(&long);
        assert_eq!(excerpt.chars().count(), GUIDE_EXCERPT_CHARS);
        assert_eq!(guide_excerpt("short"), "short");
    }
}
