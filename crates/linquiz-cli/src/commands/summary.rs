//! The `linquiz summary` command.

use std::path::PathBuf;

use anyhow::Result;

use linquiz_core::model::Level;
use linquiz_core::parser::load_bank;
use linquiz_core::report::ResultStore;
use linquiz_core::summary::Summary;
use linquiz_providers::config::load_config_from;

use crate::display;

pub fn execute(
    level: Level,
    questions_dir: Option<PathBuf>,
    results_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = ResultStore::new(results_dir.unwrap_or(config.results_dir));

    let bank = load_bank(level, questions_dir.as_deref())?;
    let record = store.load_results(level)?;

    let unknown: Vec<u32> = record
        .results
        .iter()
        .map(|a| a.question_id)
        .filter(|id| bank.get(*id).is_none())
        .collect();
    if !unknown.is_empty() {
        tracing::warn!(?unknown, "saved results mention questions not in the current bank");
    }

    println!(
        "Saved {} at {}",
        record.level_name,
        record.saved_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let summary = Summary::compute(&record.results, bank.question_count());
    display::print_summary(&bank, &record.results, &summary);

    Ok(())
}
