mod commands;
mod obs;

use clap::{Parser, Subcommand};
use commands::Command;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aion")]
#[command(about = "Aion backtesting CLI", version, arg_required_else_help = true)]
#[command(
    after_help = "Examples:\n  aion backtest --config configs/sample.toml --out runs/\n  aion download --config configs/sample.toml\n  aion validate --config configs/sample.toml\n  aion report --input runs/<run_id>/\n"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Run a backtest and write its artifacts.
    Backtest {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Download historical klines into the configured store.
    Download {
        #[arg(long)]
        config: PathBuf,
        /// Override run.start (RFC 3339).
        #[arg(long)]
        start: Option<String>,
        /// Override run.end (RFC 3339).
        #[arg(long)]
        end: Option<String>,
    },
    /// Check a config without running it.
    Validate {
        #[arg(long)]
        config: PathBuf,
    },
    /// Render the text report for a finished run directory.
    Report {
        #[arg(long)]
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    let command = match cli.command {
        CliCommand::Backtest { config, out } => Command::Backtest { config, out },
        CliCommand::Download { config, start, end } => Command::Download { config, start, end },
        CliCommand::Validate { config } => Command::Validate { config },
        CliCommand::Report { input } => Command::Report { input },
    };

    if let Err(err) = commands::run(command) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
