//! The `linquiz run` command: the interactive quiz.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use linquiz_core::error::RemediationError;
use linquiz_core::model::{Level, QuestionBank};
use linquiz_core::parser::load_bank;
use linquiz_core::remediation::{run_retest, RemediationPipeline};
use linquiz_core::report::{GuideDirectory, ResultStore};
use linquiz_core::results::ResultSet;
use linquiz_core::session::{read_input_line, run_session};
use linquiz_core::summary::Summary;
use linquiz_providers::config::{create_provider, load_config_from, resolve_api_key};

use crate::display::{self, ConsoleReporter};

pub async fn execute(
    level: Option<Level>,
    questions_dir: Option<PathBuf>,
    results_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
    offline: bool,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = ResultStore::new(results_dir.unwrap_or_else(|| config.results_dir.clone()));

    let stdin = std::io::stdin();
    let mut input = stdin.lock();

    display::print_banner();

    let api_key = if offline {
        None
    } else {
        resolve_api_key(&config)
    };
    let pipeline = api_key.map(|key| {
        RemediationPipeline::new(
            Arc::from(create_provider(&key, &config)),
            Arc::new(GuideDirectory::new(config.guide_dir.clone())),
            Arc::new(store.clone()),
            config.remediation(),
        )
    });
    if pipeline.is_some() {
        println!("\n  AI mode on (API key found)");
        println!("     Review notes, supplemental material and a retest are generated for misses");
    } else {
        println!("\n  Basic mode (quiz only, no AI)");
        println!("     Set ANTHROPIC_API_KEY in the environment or .env to enable AI features");
    }

    let level = match level {
        Some(level) => level,
        None => choose_level(&mut input, questions_dir.as_deref())?,
    };
    let bank = load_bank(level, questions_dir.as_deref())?;
    tracing::info!(level = %level, questions = bank.len(), "starting quiz");

    let mut results = take_quiz(&bank, &store, &mut input)?;

    match &pipeline {
        Some(pipeline) if results.has_missed() => {
            println!("\n{}", display::light_rule());
            println!("  Starting AI feedback");
            println!("{}", display::light_rule());

            if remediate(pipeline, &bank, &results, &mut input).await? {
                results = take_quiz(&bank, &store, &mut input)?;
            }
        }
        _ => {
            let summary = Summary::compute(&results, bank.question_count());
            if summary.needs_review().is_empty() && summary.total > 0 {
                println!("\n  Every question answered correctly! Move on to the next level.");
            }
        }
    }
    tracing::debug!(attempts = results.len(), "session finished");

    if let Some(next) = level.next() {
        println!(
            "\n  Next level: linquiz run --level {} ({})",
            next,
            next.display_name()
        );
    }
    println!();

    Ok(())
}

/// Ask for a level until a valid choice (1-4 or a level name) is entered.
fn choose_level<R: BufRead>(input: &mut R, questions_dir: Option<&std::path::Path>) -> Result<Level> {
    let mut menu = Vec::new();
    for level in Level::ALL {
        let count = match load_bank(level, questions_dir) {
            Ok(bank) => bank.len(),
            Err(e) => {
                tracing::warn!(level = %level, error = %e, "could not load question bank");
                0
            }
        };
        menu.push((level, count));
    }
    display::print_level_menu(&menu);

    loop {
        display::prompt("  Choice (1-4): ");
        let Some(line) = read_line(input)? else {
            anyhow::bail!("no level selected");
        };
        match line.parse::<Level>() {
            Ok(level) => return Ok(level),
            Err(_) => println!("  '{line}' is not a valid choice. Try again."),
        }
    }
}

/// Run one full pass over the bank, save it, and print the summary.
fn take_quiz<R: BufRead>(
    bank: &QuestionBank,
    store: &ResultStore,
    input: &mut R,
) -> Result<ResultSet> {
    display::print_quiz_header(bank);

    let outcome = run_session(&bank.questions, input, &ConsoleReporter::quiz())
        .context("failed to read answers")?;
    if !outcome.completed {
        println!("\n  Input closed, ending the quiz early.");
    }

    let path = store.save_results(bank.level, &outcome.results)?;
    let summary = Summary::compute(&outcome.results, bank.question_count());
    display::print_summary(bank, &outcome.results, &summary);
    println!("\n  Results saved: {}", path.display());

    Ok(outcome.results)
}

/// Run the three remediation phases. Returns `true` if the user asked to
/// retake the original quiz afterwards.
async fn remediate<R: BufRead>(
    pipeline: &RemediationPipeline,
    bank: &QuestionBank,
    results: &ResultSet,
    input: &mut R,
) -> Result<bool> {
    println!("\n  Generating review notes...");
    match pipeline.generate_review(bank, results).await {
        Ok(Some(doc)) => println!("  Saved: {}", doc.path.display()),
        Ok(None) => {}
        Err(e) => report_failure("review notes", &e),
    }

    println!("  Generating supplemental material...");
    match pipeline.generate_supplement(bank, results).await {
        Ok(Some(doc)) => println!("  Saved: {}", doc.path.display()),
        Ok(None) => {}
        Err(e) => report_failure("supplemental material", &e),
    }

    println!("  Generating a retest...");
    let questions = match pipeline.generate_retest(bank, results).await {
        Ok(Some(questions)) => questions,
        Ok(None) => return Ok(false),
        Err(RemediationError::Retest(e)) => {
            tracing::warn!(error = %e, "unusable retest output");
            println!("  Could not parse the generated retest, skipping it.");
            return Ok(false);
        }
        Err(e) => {
            report_failure("retest", &e);
            return Ok(false);
        }
    };

    println!();
    if !confirm(input, "  Take the retest? (y/n): ")? {
        return Ok(false);
    }

    println!("\n{}", display::light_rule());
    println!("  Retest - {} questions", questions.len());
    println!("  Type your answer (blank = skip, h = hint)");
    println!("{}\n", display::light_rule());

    let score = run_retest(&questions, input, &ConsoleReporter::retest())
        .context("failed to read answers")?;
    println!(
        "\n  Retest result: {}/{} ({:.0}%)",
        score.correct,
        score.total,
        score.percentage()
    );
    let pct = score.percentage();
    if score.total > 0 && score.correct == score.total {
        println!("  Perfect! You've beaten your weak spots!");
    } else if pct >= 50.0 {
        println!("  Getting better! Read the review notes once more.");
    } else {
        println!("  Read the review notes carefully and try again.");
    }

    println!();
    confirm(input, "  Retake the original quiz? (y/n): ")
}

fn report_failure(phase: &str, error: &RemediationError) {
    tracing::warn!(phase, error = %error, "remediation phase failed");
    println!("  Could not generate {phase}: {error}");
    if error.is_configuration() {
        println!("  Check ANTHROPIC_API_KEY and the `model` setting in linquiz.toml.");
    }
}

fn confirm<R: BufRead>(input: &mut R, question: &str) -> Result<bool> {
    display::prompt(question);
    Ok(read_line(input)?.is_some_and(|answer| answer.eq_ignore_ascii_case("y")))
}

/// Read one trimmed line; `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let line = read_input_line(input, &mut buf).context("failed to read input")?;
    Ok(line.map(|l| l.trim().to_string()))
}
