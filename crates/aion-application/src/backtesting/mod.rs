use crate::config::Config;
use crate::shared::{build_strategy, config_snapshot_json, parse_time_bounds};
use aion_core::engine::{Backtest, BacktestResult};
use aion_core::feed::DataFeed;
use aion_core::report::{self, SummaryMeta};
use aion_core::repositories::{MarketDataRepository, OhlcvQuery};
use aion_core::strategy::Strategy;
use aion_core::timeframe::Interval;
use chrono::Duration;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, info_span};

#[derive(Debug)]
pub struct RunOutput {
    pub out_dir: PathBuf,
    pub meta: SummaryMeta,
    pub result: BacktestResult,
}

/// Resolve the config, pull candles (with a pre-start warm-up buffer so
/// the engine has history the moment the start gate opens), run the
/// simulation and write the run artifacts.
pub fn run_backtest(
    config: &Config,
    config_toml: &str,
    out: Option<PathBuf>,
    market_data: &dyn MarketDataRepository,
) -> Result<RunOutput, String> {
    let _span = info_span!(
        "run_backtest",
        run_id = %config.run.run_id,
        symbol = %config.run.symbol,
        interval = %config.run.interval
    )
    .entered();

    let (start, end) = parse_time_bounds(&config.run)?;
    let interval = Interval::parse(&config.run.interval)?;
    let strategy = build_strategy(&config.strategy)?;
    let lookback = strategy.lookback_periods();

    let fetch_start = start - Duration::seconds(lookback as i64 * interval.seconds);
    let stage = Instant::now();
    let bars = market_data.load_ohlcv(&OhlcvQuery {
        symbol: config.run.symbol.clone(),
        interval: interval.label.clone(),
        start: fetch_start,
        end,
    })?;
    metrics::histogram!("aion.backtest.load_ohlcv_ms").record(stage.elapsed().as_millis() as f64);
    info!(rows = bars.len(), warmup_bars = lookback, "loaded candles");

    let feed = DataFeed::new(bars)?;
    let engine = Backtest::new(
        feed,
        strategy,
        start,
        end,
        config.run.initial_capital,
        config.run.commission,
    )?;

    let stage = Instant::now();
    let result = engine.run()?;
    metrics::histogram!("aion.backtest.run_ms").record(stage.elapsed().as_millis() as f64);
    metrics::counter!("aion.backtest.trades").increment(result.trades.len() as u64);

    let out_root = out.unwrap_or_else(|| PathBuf::from(&config.paths.out_dir));
    let out_dir = out_root.join(&config.run.run_id);
    fs::create_dir_all(&out_dir)
        .map_err(|err| format!("failed to create output dir {}: {}", out_dir.display(), err))?;

    let meta = SummaryMeta {
        run_id: config.run.run_id.clone(),
        symbol: config.run.symbol.clone(),
        interval: interval.label.clone(),
        start: config.run.start.clone(),
        end: config.run.end.clone(),
        initial_capital: config.run.initial_capital,
        commission: config.run.commission,
    };
    report::write_trades_csv(&out_dir.join("trades.csv"), &result.trades)?;
    report::write_equity_csv(&out_dir.join("equity.csv"), &result.equity)?;
    report::write_summary_json(
        &out_dir.join("summary.json"),
        &result.summary,
        Some(&meta),
        Some(&config_snapshot_json(config_toml)),
    )?;
    info!(out_dir = %out_dir.display(), "wrote run artifacts");

    Ok(RunOutput {
        out_dir,
        meta,
        result,
    })
}
