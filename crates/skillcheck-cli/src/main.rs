//! skillcheck CLI: headless assessment sessions.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use skillcheck_core::model::TestKind;

mod commands;
mod media;
mod script;

#[derive(Parser)]
#[command(
    name = "skillcheck",
    version,
    about = "Headless assessment sessions: gated audio playback, answer tracking, submission"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scripted event log through a test session
    Simulate {
        /// Test to run: listening or behaviour
        #[arg(long)]
        test: TestKind,

        /// Question-set file (.json or .toml)
        #[arg(long)]
        question_set: PathBuf,

        /// Event script (.toml)
        #[arg(long)]
        script: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Sink to submit to (defaults to the configured default sink)
        #[arg(long)]
        sink: Option<String>,

        /// Log submissions instead of sending them
        #[arg(long)]
        dry_run: bool,

        /// Override the number of play credits
        #[arg(long)]
        max_plays: Option<u32>,

        /// Override the candidate id
        #[arg(long)]
        user_id: Option<u64>,

        /// Directory to write a JSON transcript into
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List configured submission sinks
    ListSinks {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and sample question sets
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("skillcheck=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            test,
            question_set,
            script,
            config,
            sink,
            dry_run,
            max_plays,
            user_id,
            output,
        } => {
            commands::simulate::execute(commands::simulate::SimulateArgs {
                test,
                question_set,
                script,
                config,
                sink,
                dry_run,
                max_plays,
                user_id,
                output,
            })
            .await
        }
        Commands::ListSinks { config } => commands::list_sinks::execute(config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
