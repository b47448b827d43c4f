//! The `linquiz levels` command.

use std::path::PathBuf;

use anyhow::Result;

use linquiz_core::model::Level;
use linquiz_core::parser::load_bank;

pub fn execute(questions_dir: Option<PathBuf>) -> Result<()> {
    for level in Level::ALL {
        let bank = load_bank(level, questions_dir.as_deref())?;
        println!(
            "  {}) {:<12} {} ({} questions)",
            level.number(),
            level.display_name(),
            level.topic(),
            bank.len()
        );
    }
    Ok(())
}
