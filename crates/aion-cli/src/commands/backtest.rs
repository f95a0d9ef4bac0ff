use crate::commands::common::build_market_data;
use crate::obs;
use aion_application::backtesting::run_backtest;
use aion_application::config::load_config;
use aion_application::reporting::render_text_report;
use std::path::{Path, PathBuf};

pub fn run(config_path: &Path, out: Option<PathBuf>) -> Result<(), String> {
    let (config, config_toml) = load_config(config_path)?;
    obs::init_tracing(&config.log.level, &config.log.format)?;
    tracing::info!(config = %config_path.display(), run_id = %config.run.run_id, "loaded config");

    let market_data = build_market_data(&config.data)?;
    let output = run_backtest(&config, &config_toml, out, market_data.as_ref())?;

    println!("{}", render_text_report(&output.meta, &output.result));
    println!("artifacts: {}", output.out_dir.display());
    Ok(())
}
