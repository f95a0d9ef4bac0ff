use crate::config::Config;
use crate::shared::{build_strategy, parse_time_bounds};
use aion_core::strategy::Strategy;
use aion_core::timeframe::Interval;

/// Check a config without running it. Hard failures return `Err`; softer
/// findings come back as warnings for the caller to print.
pub fn validate_config(config: &Config) -> Result<Vec<String>, String> {
    let (start, end) = parse_time_bounds(&config.run)?;
    let interval = Interval::parse(&config.run.interval)?;

    if !config.run.initial_capital.is_finite() || config.run.initial_capital <= 0.0 {
        return Err("run.initial_capital must be positive".to_string());
    }
    if !config.run.commission.is_finite() || !(0.0..1.0).contains(&config.run.commission) {
        return Err("run.commission must be a fraction in [0, 1)".to_string());
    }

    let strategy = build_strategy(&config.strategy)?;

    match config.data.source.trim().to_lowercase().as_str() {
        "csv" => {
            if config.data.csv_path.is_none() {
                return Err("data.source = csv requires data.csv_path".to_string());
            }
        }
        "postgres" => {
            if config.data.db_url.is_none() || config.data.table.is_none() {
                return Err("data.source = postgres requires data.db_url and data.table".to_string());
            }
        }
        other => return Err(format!("data.source must be csv or postgres, got {other}")),
    }

    let mut warnings = Vec::new();
    let span_seconds = (end - start).num_seconds();
    let warmup_seconds = strategy.lookback_periods() as i64 * interval.seconds;
    if span_seconds < warmup_seconds {
        warnings.push(format!(
            "run window ({span_seconds}s) is shorter than the strategy warm-up ({warmup_seconds}s); the run may process no data"
        ));
    }
    if config.run.commission > 0.01 {
        warnings.push(format!(
            "commission {} is unusually high for a fraction; did you mean bps?",
            config.run.commission
        ));
    }
    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::validate_config;
    use crate::config::Config;

    fn sample(mutate: impl Fn(&mut String)) -> Config {
        let mut toml_str = String::from(
            r#"
[run]
run_id = "validate_test"
symbol = "BTCUSDT"
interval = "1h"
start = "2024-01-01T00:00:00Z"
end = "2024-02-01T00:00:00Z"
initial_capital = 10000.0
commission = 0.0004

[strategy]
id = "sma-adx"

[data]
source = "csv"
csv_path = "data/candles.csv"

[paths]
out_dir = "runs/"
"#,
        );
        mutate(&mut toml_str);
        toml::from_str(&toml_str).expect("config should parse")
    }

    #[test]
    fn valid_config_passes_without_warnings() {
        let warnings = validate_config(&sample(|_| {})).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn unknown_strategy_fails() {
        let config = sample(|s| *s = s.replace("sma-adx", "nope"));
        assert!(validate_config(&config).unwrap_err().contains("unknown strategy"));
    }

    #[test]
    fn csv_source_requires_a_path() {
        let config = sample(|s| *s = s.replace("csv_path = \"data/candles.csv\"\n", ""));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn reversed_bounds_fail() {
        let config = sample(|s| *s = s.replace("2024-02-01", "2023-12-01"));
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn short_window_warns_about_warmup() {
        let config = sample(|s| *s = s.replace("2024-02-01T00:00:00Z", "2024-01-01T05:00:00Z"));
        let warnings = validate_config(&config).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("warm-up"));
    }
}
