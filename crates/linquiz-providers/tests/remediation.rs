//! Remediation pipeline integration tests.
//!
//! Runs the review → supplement → retest phases against the mock provider
//! and the on-disk result store, the same way the CLI wires them.

use std::sync::Arc;

use linquiz_core::error::RemediationError;
use linquiz_core::model::Level;
use linquiz_core::parser::builtin_bank;
use linquiz_core::remediation::{RemediationConfig, RemediationPipeline};
use linquiz_core::report::{GuideDirectory, ResultStore};
use linquiz_core::results::{Attempt, ResultSet};
use linquiz_core::traits::DocumentKind;
use linquiz_providers::mock::MockProvider;

const RETEST: &str = "```json\n[{\"q\": \"Show the current path\", \"a\": \"pwd\", \"h\": \"p-w-d\"}]\n```";

fn results_with_misses() -> ResultSet {
    let bank = builtin_bank(Level::Beginner).unwrap();
    let mut results = ResultSet::new();
    for q in &bank.questions {
        let answer = if q.id % 3 == 0 { "" } else { q.canonical_answer() };
        results.record(Attempt::evaluate(q, answer));
    }
    results
}

fn pipeline(
    provider: Arc<MockProvider>,
    dir: &std::path::Path,
) -> (RemediationPipeline, ResultStore) {
    let store = ResultStore::new(dir.join("results"));
    std::fs::write(dir.join("guide_beginner.md"), "# Beginner guide\npwd prints the path.").unwrap();
    let pipeline = RemediationPipeline::new(
        provider,
        Arc::new(GuideDirectory::new(dir)),
        Arc::new(store.clone()),
        RemediationConfig::default(),
    );
    (pipeline, store)
}

#[tokio::test]
async fn full_remediation_writes_documents() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(
        MockProvider::with_fixed_response("unused")
            .respond_to("Review Notes", "# Beginner Review Notes\n")
            .respond_to("Supplemental Material", "# Beginner Supplemental Material\n")
            .respond_to("JSON array", RETEST),
    );
    let (pipeline, store) = pipeline(provider.clone(), dir.path());
    let bank = builtin_bank(Level::Beginner).unwrap();
    let results = results_with_misses();

    let review = pipeline.generate_review(&bank, &results).await.unwrap().unwrap();
    assert_eq!(review.path, store.document_path(Level::Beginner, DocumentKind::Review));
    assert_eq!(
        std::fs::read_to_string(&review.path).unwrap(),
        "# Beginner Review Notes\n"
    );

    let supplement = pipeline
        .generate_supplement(&bank, &results)
        .await
        .unwrap()
        .unwrap();
    assert!(supplement.path.ends_with("q1_supplement.md"));

    let retest = pipeline.generate_retest(&bank, &results).await.unwrap().unwrap();
    assert_eq!(retest.len(), 1);

    let requests = provider.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].max_tokens, 4000);
    assert_eq!(requests[1].max_tokens, 4000);
    assert_eq!(requests[2].max_tokens, 2000);
    assert!(requests[0].prompt.contains("pwd prints the path."));
    assert!(requests[0].prompt.contains("(skipped)"));
    assert!(!requests[2].prompt.contains("Beginner guide"));
}

#[tokio::test]
async fn service_failure_is_surfaced_per_phase() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(MockProvider::failing("dns lookup failed"));
    let (pipeline, store) = pipeline(provider.clone(), dir.path());
    let bank = builtin_bank(Level::Beginner).unwrap();
    let results = results_with_misses();

    let review = pipeline.generate_review(&bank, &results).await.unwrap_err();
    assert!(review.to_string().contains("dns lookup failed"));
    let supplement = pipeline.generate_supplement(&bank, &results).await;
    assert!(matches!(supplement, Err(RemediationError::Generation(_))));
    let retest = pipeline.generate_retest(&bank, &results).await;
    assert!(matches!(retest, Err(RemediationError::Generation(_))));

    assert_eq!(provider.call_count(), 3);
    assert!(!store
        .document_path(Level::Beginner, DocumentKind::Review)
        .exists());
}

#[tokio::test]
async fn perfect_results_never_call_the_provider() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(MockProvider::with_fixed_response("# Notes"));
    let (pipeline, _store) = pipeline(provider.clone(), dir.path());
    let bank = builtin_bank(Level::Beginner).unwrap();
    let mut results = ResultSet::new();
    for q in &bank.questions {
        results.record(Attempt::evaluate(q, q.canonical_answer()));
    }

    assert!(pipeline.generate_review(&bank, &results).await.unwrap().is_none());
    assert!(pipeline
        .generate_supplement(&bank, &results)
        .await
        .unwrap()
        .is_none());
    assert!(pipeline.generate_retest(&bank, &results).await.unwrap().is_none());
    assert_eq!(provider.call_count(), 0);
}
