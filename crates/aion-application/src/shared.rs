use crate::config::{RiskOverrides, RunConfig, StrategyConfig};
use aion_core::strategy::{
    MultiIndicatorStrategy, RiskConfig, SmaAdxStrategy, SmaDeviationStrategy, SmaSlopeStrategy,
    StrategyKind,
};
use aion_core::timeframe::{parse_utc_timestamp, Interval};
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

pub fn parse_time_bounds(run: &RunConfig) -> Result<(DateTime<Utc>, DateTime<Utc>), String> {
    let start = parse_utc_timestamp(&run.start)?;
    let end = parse_utc_timestamp(&run.end)?;
    if start >= end {
        return Err(format!("run.start {} must precede run.end {}", run.start, run.end));
    }
    Ok((start, end))
}

pub fn resolve_risk(base: RiskConfig, overrides: &RiskOverrides) -> Result<RiskConfig, String> {
    let mut risk = base;
    if let Some(value) = overrides.position_limit {
        if !(0.0..=1.0).contains(&value) {
            return Err("risk.position_limit must be in [0, 1]".to_string());
        }
        risk.position_limit = value;
    }
    if let Some(value) = overrides.min_cash_reserve {
        if !(0.0..=1.0).contains(&value) {
            return Err("risk.min_cash_reserve must be in [0, 1]".to_string());
        }
        risk.min_cash_reserve = value;
    }
    if let Some(label) = &overrides.min_trade_interval {
        let interval = Interval::parse(label)?;
        risk.min_trade_interval = Duration::seconds(interval.seconds);
    }
    if let Some(value) = overrides.max_trades_per_day {
        risk.max_trades_per_day = Some(value);
    }
    if let Some(value) = overrides.max_drawdown {
        if !(0.0..=1.0).contains(&value) {
            return Err("risk.max_drawdown must be in [0, 1]".to_string());
        }
        risk.max_drawdown = value;
    }
    if let Some(value) = overrides.stop_loss {
        if value <= 0.0 {
            return Err("risk.stop_loss must be positive".to_string());
        }
        risk.stop_loss = value;
    }
    if let Some(value) = overrides.take_profit {
        if value <= 0.0 {
            return Err("risk.take_profit must be positive".to_string());
        }
        risk.take_profit = value;
    }
    Ok(risk)
}

pub fn build_strategy(config: &StrategyConfig) -> Result<StrategyKind, String> {
    let id = config.id.trim().to_lowercase();
    match id.as_str() {
        "sma-adx" => {
            let risk = resolve_risk(RiskConfig::default(), &config.risk)?;
            Ok(StrategyKind::SmaAdx(SmaAdxStrategy::new(
                config.fast_period.unwrap_or(5),
                config.slow_period.unwrap_or(20),
                config.adx_period.unwrap_or(14),
                config.adx_threshold.unwrap_or(25.0),
                risk,
            )))
        }
        "sma-slope" => {
            let risk = resolve_risk(SmaSlopeStrategy::default_risk(), &config.risk)?;
            Ok(StrategyKind::SmaSlope(SmaSlopeStrategy::new(
                config.fast_period.unwrap_or(50),
                config.slow_period.unwrap_or(120),
                config.slope_periods.unwrap_or(5),
                risk,
            )))
        }
        "sma-deviation" => {
            let risk = resolve_risk(SmaDeviationStrategy::default_risk(), &config.risk)?;
            Ok(StrategyKind::SmaDeviation(SmaDeviationStrategy::new(
                config.fast_period.unwrap_or(50),
                config.slow_period.unwrap_or(120),
                risk,
            )))
        }
        "sma-multi" => {
            let risk = resolve_risk(MultiIndicatorStrategy::default_risk(), &config.risk)?;
            Ok(StrategyKind::MultiIndicator(MultiIndicatorStrategy::new(
                config.fast_period.unwrap_or(50),
                config.slow_period.unwrap_or(120),
                risk,
            )))
        }
        _ => Err(format!("unknown strategy id: {}", config.id)),
    }
}

pub fn sha256_hex(data: &str) -> String {
    let digest = Sha256::digest(data.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

pub fn config_snapshot_json(config_toml: &str) -> serde_json::Value {
    serde_json::json!({
        "sha256": sha256_hex(config_toml),
        "toml": config_toml,
    })
}
