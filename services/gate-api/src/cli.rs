use crate::commands::{run_categories, run_golden, run_sweep, run_validate, SweepArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use product_gate::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Product Quality Gate",
    about = "Validate, score, and gate authored product records",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Validate one RawInput JSON file; exits 0 write, 1 repair, 2 reject
    Validate {
        /// Path to the record JSON
        file: PathBuf,
    },
    /// Validate every record JSON in a directory; exits with the worst verdict
    Sweep(SweepArgs),
    /// Compare golden snapshots against freshly computed output; exits 1 on drift
    Golden {
        /// Directory of golden snapshot files (defaults to GATE_GOLDEN_DIR)
        dir: Option<PathBuf>,
    },
    /// List registered categories and their tiers
    Categories,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<i32, AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await.map(|()| 0),
        Command::Validate { file } => run_validate(&file),
        Command::Sweep(args) => run_sweep(args),
        Command::Golden { dir } => run_golden(dir),
        Command::Categories => run_categories(),
    }
}
