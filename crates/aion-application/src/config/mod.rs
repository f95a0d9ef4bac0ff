use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub run: RunConfig,
    pub strategy: StrategyConfig,
    pub data: DataConfig,
    #[serde(default)]
    pub log: LogConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Deserialize)]
pub struct RunConfig {
    pub run_id: String,
    pub symbol: String,
    pub interval: String,
    /// UTC bound, inclusive. RFC 3339 with explicit offset.
    pub start: String,
    /// UTC bound, exclusive.
    pub end: String,
    pub initial_capital: f64,
    /// Commission as a fraction, charged on entry and exit value.
    pub commission: f64,
}

#[derive(Debug, Deserialize)]
pub struct StrategyConfig {
    pub id: String,
    pub fast_period: Option<usize>,
    pub slow_period: Option<usize>,
    pub adx_period: Option<usize>,
    pub adx_threshold: Option<f64>,
    pub slope_periods: Option<usize>,
    #[serde(default)]
    pub risk: RiskOverrides,
}

#[derive(Debug, Default, Deserialize)]
pub struct RiskOverrides {
    pub position_limit: Option<f64>,
    pub min_cash_reserve: Option<f64>,
    /// Interval label, e.g. "30m".
    pub min_trade_interval: Option<String>,
    pub max_trades_per_day: Option<u32>,
    pub max_drawdown: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct DataConfig {
    /// "csv" or "postgres".
    pub source: String,
    pub csv_path: Option<String>,
    pub db_url: Option<String>,
    pub table: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

#[derive(Debug, Deserialize)]
pub struct PathsConfig {
    pub out_dir: String,
}

pub fn load_config(path: &Path) -> Result<(Config, String), String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    let config = toml::from_str(&contents)
        .map_err(|err| format!("failed to parse TOML {}: {}", path.display(), err))?;
    Ok((config, contents))
}
