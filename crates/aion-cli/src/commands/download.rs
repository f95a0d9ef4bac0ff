use crate::obs;
use aion_application::config::load_config;
use aion_core::timeframe::parse_utc_timestamp;
use aion_infrastructure::exchange::BinanceClient;
use aion_infrastructure::market_data::{write_csv, PostgresCandleStore};
use std::path::{Path, PathBuf};

pub fn run(
    config_path: &Path,
    start_override: Option<String>,
    end_override: Option<String>,
) -> Result<(), String> {
    let (config, _) = load_config(config_path)?;
    obs::init_tracing(&config.log.level, &config.log.format)?;

    let start = parse_utc_timestamp(start_override.as_deref().unwrap_or(&config.run.start))?;
    let end = parse_utc_timestamp(end_override.as_deref().unwrap_or(&config.run.end))?;
    if start >= end {
        return Err(format!("download start {start} must precede end {end}"));
    }

    let client = BinanceClient::new()?;
    let bars = client.download_klines(&config.run.symbol, &config.run.interval, start, end)?;
    if bars.is_empty() {
        return Err(format!(
            "no klines returned for {} {} in {start}..{end}",
            config.run.symbol, config.run.interval
        ));
    }

    match config.data.source.trim().to_lowercase().as_str() {
        "csv" => {
            let path = config
                .data
                .csv_path
                .as_ref()
                .ok_or_else(|| "data.source = csv requires data.csv_path".to_string())?;
            write_csv(&PathBuf::from(path), &bars)?;
            println!("wrote {} klines to {}", bars.len(), path);
        }
        "postgres" => {
            let db_url = config
                .data
                .db_url
                .as_ref()
                .ok_or_else(|| "data.source = postgres requires data.db_url".to_string())?;
            let table = config
                .data
                .table
                .as_ref()
                .ok_or_else(|| "data.source = postgres requires data.table".to_string())?;
            let store = PostgresCandleStore::new(db_url, table)?;
            let written = store.save_klines(&config.run.symbol, &config.run.interval, &bars)?;
            println!("saved {written} klines to {table}");
        }
        other => return Err(format!("data.source must be csv or postgres, got {other}")),
    }
    Ok(())
}
