//! The `linquiz validate` command.

use std::path::PathBuf;

use anyhow::Result;

use linquiz_core::model::Level;
use linquiz_core::parser::{builtin_bank, load_bank_directory, parse_bank, validate_bank};

pub fn execute(questions: Option<PathBuf>) -> Result<()> {
    let banks = match questions {
        Some(path) if path.is_dir() => load_bank_directory(&path)?,
        Some(path) => vec![parse_bank(&path)?],
        None => Level::ALL
            .into_iter()
            .map(builtin_bank)
            .collect::<Result<Vec<_>>>()?,
    };

    if banks.is_empty() {
        anyhow::bail!("no question banks found");
    }

    let mut total_warnings = 0;

    for bank in &banks {
        println!(
            "Level: {} ({} questions)",
            bank.level.display_name(),
            bank.len()
        );

        let warnings = validate_bank(bank);
        for w in &warnings {
            let prefix = w
                .question_id
                .map(|id| format!("  [Q{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All question banks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
