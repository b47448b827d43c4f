//! Console rendering: banner, question flow, and result summaries.

use std::io::Write;

use comfy_table::{Cell, Table};

use linquiz_core::model::{Level, Question, QuestionBank};
use linquiz_core::results::{Attempt, ResultSet};
use linquiz_core::session::SessionReporter;
use linquiz_core::summary::Summary;

const RULE_WIDTH: usize = 56;

pub fn heavy_rule() -> String {
    "=".repeat(RULE_WIDTH)
}

pub fn light_rule() -> String {
    "-".repeat(RULE_WIDTH)
}

pub fn print_banner() {
    println!("{}", heavy_rule());
    println!("   Linux Master Quiz");
    println!("   Learn Linux commands, then prove it");
    println!("{}", heavy_rule());
}

pub fn print_level_menu(banks: &[(Level, usize)]) {
    println!("\n  Choose a level:\n");
    for (level, count) in banks {
        println!(
            "    {}) {} - {} ({} questions)",
            level.number(),
            level.display_name(),
            level.topic(),
            count
        );
    }
    println!();
}

/// Print a prompt without a newline and flush it.
pub fn prompt(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
}

/// Renders a running session on stdout.
pub struct ConsoleReporter {
    /// Question label prefix: `Q` for the quiz, `R` for a retest.
    label: char,
    /// Show the canonical answer after a skip.
    reveal_on_skip: bool,
}

impl ConsoleReporter {
    pub fn quiz() -> Self {
        Self {
            label: 'Q',
            reveal_on_skip: false,
        }
    }

    pub fn retest() -> Self {
        Self {
            label: 'R',
            reveal_on_skip: true,
        }
    }
}

impl SessionReporter for ConsoleReporter {
    fn on_question(&self, index: usize, _total: usize, question: &Question) {
        println!("  {}{}. {}", self.label, index, question.prompt);
    }

    fn on_input_prompt(&self) {
        prompt("  > ");
    }

    fn on_hint(&self, _question: &Question, hint: &str) {
        println!("  Hint: {hint}");
    }

    fn on_attempt(&self, question: &Question, attempt: &Attempt) {
        if attempt.skipped {
            if self.reveal_on_skip {
                println!("  Skipped (answer: {})\n", question.canonical_answer());
            } else {
                println!("  Skipped\n");
            }
        } else if attempt.is_correct {
            println!("  Correct!\n");
        } else {
            println!("  Wrong (answer: {})\n", question.canonical_answer());
        }
    }
}

pub fn print_quiz_header(bank: &QuestionBank) {
    let level = bank.level;
    println!("\n{}", light_rule());
    println!(
        "  {} ({}) - {}",
        level.display_name(),
        level.code(),
        level.topic()
    );
    println!(
        "  {} questions | type your answer (blank = skip)",
        bank.len()
    );
    println!("  Need a hint? Type 'h'");
    println!("{}\n", light_rule());
}

/// Ten-cell bar, one filled cell per full ten percent.
pub fn progress_bar(summary: &Summary) -> String {
    let filled = summary.filled_cells();
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

fn id_list(ids: &[u32]) -> String {
    ids.iter()
        .map(|id| format!("Q{id}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn print_summary(bank: &QuestionBank, results: &ResultSet, summary: &Summary) {
    let level = bank.level;
    println!("\n{}", heavy_rule());
    println!("  {} ({}) results", level.display_name(), level.code());
    println!(
        "  {} {}/{} ({:.0}%)",
        progress_bar(summary),
        summary.correct_count,
        summary.total,
        summary.percentage
    );
    if !summary.wrong_ids.is_empty() {
        println!("  Wrong/skipped: {}", id_list(&summary.wrong_ids));
    }
    if !summary.unattempted_ids.is_empty() {
        println!("  Unanswered: {}", id_list(&summary.unattempted_ids));
    }
    println!("{}", heavy_rule());

    if !summary.wrong_ids.is_empty() {
        println!("\n{}", missed_table(bank, results, &summary.wrong_ids));
    }

    if summary.is_perfect() {
        println!("\n  Congratulations! {} cleared perfectly!", level.display_name());
    } else if summary.percentage >= 80.0 {
        println!("\n  Well done! Review the missed questions and you'll have it.");
    }
}

fn missed_table(bank: &QuestionBank, results: &ResultSet, ids: &[u32]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Question", "Your answer", "Answer"]);
    for id in ids {
        let Some(question) = bank.get(*id) else {
            continue;
        };
        let yours = match results.get(*id) {
            Some(a) if !a.skipped => a.raw_text.clone(),
            _ => "(skipped)".to_string(),
        };
        table.add_row(vec![
            Cell::new(format!("Q{id}")),
            Cell::new(&question.prompt),
            Cell::new(yours),
            Cell::new(question.canonical_answer()),
        ]);
    }
    table
}
