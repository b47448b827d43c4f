//! linquiz CLI — the interactive Linux command quiz.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use linquiz_core::model::Level;

mod commands;
mod display;

#[derive(Parser)]
#[command(name = "linquiz", version, about = "Interactive quiz for memorizing Linux commands")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a quiz
    Run {
        /// Level to play: beginner, novice, intermediate, advanced (or 1-4).
        /// Asked interactively when omitted.
        #[arg(long)]
        level: Option<Level>,

        /// Directory with <q1..q4>.toml files overriding the builtin banks
        #[arg(long)]
        questions: Option<PathBuf>,

        /// Where to write results and generated notes
        #[arg(long)]
        results_dir: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Skip AI features even if an API key is available
        #[arg(long)]
        offline: bool,
    },

    /// Show the summary of the last saved quiz for a level
    Summary {
        /// Level whose saved results to show
        #[arg(long)]
        level: Level,

        /// Directory with <q1..q4>.toml files overriding the builtin banks
        #[arg(long)]
        questions: Option<PathBuf>,

        /// Where results were written
        #[arg(long)]
        results_dir: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate question bank TOML files
    Validate {
        /// Bank file or directory (defaults to the builtin banks)
        #[arg(long)]
        questions: Option<PathBuf>,
    },

    /// List levels and their topics
    Levels {
        /// Directory with <q1..q4>.toml files overriding the builtin banks
        #[arg(long)]
        questions: Option<PathBuf>,
    },

    /// Create a starter config file
    Init,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("linquiz=warn".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            level,
            questions,
            results_dir,
            config,
            offline,
        } => commands::run::execute(level, questions, results_dir, config, offline).await,
        Commands::Summary {
            level,
            questions,
            results_dir,
            config,
        } => commands::summary::execute(level, questions, results_dir, config),
        Commands::Validate { questions } => commands::validate::execute(questions),
        Commands::Levels { questions } => commands::levels::execute(questions),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
