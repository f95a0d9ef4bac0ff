use aion_core::engine::Backtest;
use aion_core::feed::DataFeed;
use aion_core::strategy::{RiskConfig, RiskEngine, SmaAdxStrategy, Strategy};
use aion_core::types::{Bar, Signal, TradeAction};
use chrono::{DateTime, TimeZone, Utc};

fn bar(minute: i64, close: f64) -> Bar {
    Bar {
        timestamp: Utc.timestamp_opt(minute * 60, 0).unwrap(),
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume: 1_000.0,
    }
}

fn wide_span() -> (DateTime<Utc>, DateTime<Utc>) {
    (
        Utc.timestamp_opt(0, 0).unwrap(),
        Utc.timestamp_opt(100_000_000, 0).unwrap(),
    )
}

/// Replays a fixed list of candidate signals through the composed
/// `on_data` path, so risk gating applies as it would for a real variant.
struct ScriptStrategy {
    script: Vec<Option<Signal>>,
    cursor: usize,
    risk: RiskEngine,
}

impl ScriptStrategy {
    fn new(script: Vec<Option<Signal>>, risk: RiskConfig) -> Self {
        Self {
            script,
            cursor: 0,
            risk: RiskEngine::new(risk),
        }
    }
}

impl Strategy for ScriptStrategy {
    fn name(&self) -> &str {
        "script"
    }

    fn lookback_periods(&self) -> usize {
        1
    }

    fn risk(&self) -> &RiskEngine {
        &self.risk
    }

    fn risk_mut(&mut self) -> &mut RiskEngine {
        &mut self.risk
    }

    fn generate_signal(&mut self, _bar: &Bar, _history: &[Bar]) -> Option<Signal> {
        let signal = self.script.get(self.cursor).cloned().flatten();
        self.cursor += 1;
        signal
    }
}

/// Bids a fraction of remaining cash on every consulted bar.
struct AlwaysBuyStrategy {
    fraction: f64,
    risk: RiskEngine,
}

impl Strategy for AlwaysBuyStrategy {
    fn name(&self) -> &str {
        "always-buy"
    }

    fn lookback_periods(&self) -> usize {
        1
    }

    fn risk(&self) -> &RiskEngine {
        &self.risk
    }

    fn risk_mut(&mut self) -> &mut RiskEngine {
        &mut self.risk
    }

    fn generate_signal(&mut self, bar: &Bar, _history: &[Bar]) -> Option<Signal> {
        Some(Signal::buy(self.fraction, bar.close, "scripted entry").percent())
    }
}

#[test]
fn full_capital_round_trip_yields_expected_pnl() {
    let bars = vec![
        bar(0, 100.0),
        bar(1, 100.0),
        bar(2, 105.0),
        bar(3, 110.0),
    ];
    let feed = DataFeed::new(bars).unwrap();
    let script = vec![
        Some(Signal::buy(1.0, 100.0, "enter").percent()),
        None,
        None,
        Some(Signal::sell(1.0, 110.0, "exit").percent()),
    ];
    let strategy = ScriptStrategy::new(script, RiskConfig::default());
    let (start, end) = wide_span();

    let result = Backtest::new(feed, strategy, start, end, 10_000.0, 0.0)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(result.trades.len(), 2);
    assert!((result.final_capital - 11_000.0).abs() < 1e-6);
    assert!((result.trades[1].pnl - 1_000.0).abs() < 1e-6);
    assert!((result.summary.total_return_pct - 10.0).abs() < 1e-6);
    assert!((result.summary.win_rate_pct - 100.0).abs() < 1e-9);
}

#[test]
fn drawdown_gate_suspends_entries_until_recovery() {
    // Two entries at the top, a 15% slide that trips the 10% limit, then a
    // recovery that re-opens the gate.
    let bars = vec![
        bar(0, 100.0),
        bar(1, 100.0),
        bar(2, 80.0),
        bar(3, 80.0),
        bar(4, 98.0),
    ];
    let feed = DataFeed::new(bars).unwrap();
    let strategy = AlwaysBuyStrategy {
        fraction: 0.5,
        risk: RiskEngine::new(RiskConfig {
            max_drawdown: 0.1,
            ..RiskConfig::default()
        }),
    };
    let (start, end) = wide_span();

    let result = Backtest::new(feed, strategy, start, end, 10_000.0, 0.0)
        .unwrap()
        .run()
        .unwrap();

    let trade_minutes: Vec<i64> = result
        .trades
        .iter()
        .map(|trade| trade.timestamp.timestamp() / 60)
        .collect();
    assert_eq!(trade_minutes, vec![0, 1, 4]);

    // The slide itself exceeded the configured tolerance.
    let worst = result
        .equity
        .iter()
        .map(|point| point.equity)
        .fold(f64::INFINITY, f64::min);
    assert!(worst < 10_000.0 * 0.9);
}

#[test]
fn exhausting_the_source_during_warmup_fails_the_run() {
    let bars: Vec<Bar> = (0..19).map(|i| bar(i, 100.0)).collect();
    let feed = DataFeed::new(bars).unwrap();
    let strategy = SmaAdxStrategy::new(5, 20, 14, 25.0, RiskConfig::default());
    let (start, end) = wide_span();

    let err = Backtest::new(feed, strategy, start, end, 10_000.0, 0.0)
        .unwrap()
        .run()
        .unwrap_err();
    assert_eq!(err, "no data processed during backtest");
}

#[test]
fn start_bar_included_end_bar_excluded() {
    let bars: Vec<Bar> = (0..10).map(|i| bar(i, 100.0)).collect();
    let feed = DataFeed::new(bars).unwrap();
    let strategy = ScriptStrategy::new(vec![None; 10], RiskConfig::default());
    let start = Utc.timestamp_opt(2 * 60, 0).unwrap();
    let end = Utc.timestamp_opt(8 * 60, 0).unwrap();

    let result = Backtest::new(feed, strategy, start, end, 10_000.0, 0.0)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(result.equity.first().unwrap().timestamp, start);
    assert!(result.equity.iter().all(|point| point.timestamp < end));
    assert_eq!(result.equity.len(), 6);
}

#[test]
fn sma_adx_trades_a_synthetic_trend_reversal() {
    // Flat base, strong rally, strong sell-off: the crossover strategy
    // should enter during the rally and be out by the end.
    let mut closes = vec![100.0; 30];
    for i in 0..30 {
        closes.push(100.0 + (i + 1) as f64 * 2.0);
    }
    for i in 0..30 {
        closes.push(160.0 - (i + 1) as f64 * 2.5);
    }
    let bars: Vec<Bar> = closes
        .iter()
        .enumerate()
        .map(|(i, close)| bar(i as i64, *close))
        .collect();

    let feed = DataFeed::new(bars).unwrap();
    let strategy = SmaAdxStrategy::default();
    let (start, end) = wide_span();

    let result = Backtest::new(feed, strategy, start, end, 10_000.0, 0.0004)
        .unwrap()
        .run()
        .unwrap();

    assert!(result
        .trades
        .iter()
        .any(|trade| trade.action == TradeAction::Buy));
    assert!(result
        .trades
        .iter()
        .any(|trade| trade.action == TradeAction::Sell));
    assert!(result.total_commission > 0.0);
    assert_eq!(
        result.equity.len(),
        90 - (SmaAdxStrategy::default().lookback_periods() - 1)
    );

    // Flat at the end of the reversal: equity equals cash.
    let last = result.equity.last().unwrap();
    if last.position == 0.0 {
        assert!((last.equity - result.final_capital).abs() < 1e-9);
    }
}
