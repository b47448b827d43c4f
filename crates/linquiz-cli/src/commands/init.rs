//! The `linquiz init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("linquiz.toml").exists() {
        println!("linquiz.toml already exists, skipping.");
    } else {
        std::fs::write("linquiz.toml", SAMPLE_CONFIG)?;
        println!("Created linquiz.toml");
    }

    println!("\nNext steps:");
    println!("  1. Put ANTHROPIC_API_KEY in your environment or .env to enable AI feedback");
    println!("  2. Run: linquiz levels");
    println!("  3. Run: linquiz run --level beginner");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# linquiz configuration

# Leave unset to read ANTHROPIC_API_KEY from the environment or .env.
# api_key = "${ANTHROPIC_API_KEY}"

model = "claude-sonnet-4-20250514"
results_dir = "./results"
guide_dir = "."

review_max_tokens = 4000
supplement_max_tokens = 4000
retest_max_tokens = 2000
"#;
