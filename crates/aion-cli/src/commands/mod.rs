mod backtest;
mod common;
mod download;
mod report;
mod validate;

use std::path::PathBuf;

pub enum Command {
    Backtest {
        config: PathBuf,
        out: Option<PathBuf>,
    },
    Download {
        config: PathBuf,
        start: Option<String>,
        end: Option<String>,
    },
    Validate {
        config: PathBuf,
    },
    Report {
        input: PathBuf,
    },
}

pub fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Backtest { config, out } => backtest::run(&config, out),
        Command::Download { config, start, end } => download::run(&config, start, end),
        Command::Validate { config } => validate::run(&config),
        Command::Report { input } => report::run(&input),
    }
}
