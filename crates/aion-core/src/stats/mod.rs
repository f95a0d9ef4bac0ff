//! Performance statistics over a finished equity trajectory and trade log.
//!
//! `analyze` is a pure function: it never mutates engine state and calling
//! it twice on the same inputs yields identical output. Degenerate inputs
//! (short trajectories, zero variance, zero denominators) degrade to 0.

use crate::types::{EquityPoint, Trade, TradeAction};
use serde::Serialize;
use std::collections::BTreeMap;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    #[serde(rename = "Total Return (%)")]
    pub total_return_pct: f64,
    #[serde(rename = "Annual Return (%)")]
    pub annual_return_pct: f64,
    #[serde(rename = "Max Drawdown (%)")]
    pub max_drawdown_pct: f64,
    #[serde(rename = "Sharpe Ratio")]
    pub sharpe_ratio: f64,
    #[serde(rename = "Win Rate (%)")]
    pub win_rate_pct: f64,
}

impl Summary {
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("Total Return (%)".to_string(), self.total_return_pct),
            ("Annual Return (%)".to_string(), self.annual_return_pct),
            ("Max Drawdown (%)".to_string(), self.max_drawdown_pct),
            ("Sharpe Ratio".to_string(), self.sharpe_ratio),
            ("Win Rate (%)".to_string(), self.win_rate_pct),
        ])
    }
}

pub fn analyze(equity: &[EquityPoint], trades: &[Trade]) -> Summary {
    Summary {
        total_return_pct: equity.last().map(|point| point.returns_pct).unwrap_or(0.0),
        annual_return_pct: annual_return(equity),
        max_drawdown_pct: max_drawdown(equity),
        sharpe_ratio: sharpe_ratio(equity),
        win_rate_pct: win_rate(trades),
    }
}

/// Annualized return over the elapsed calendar days, floored at one day.
fn annual_return(equity: &[EquityPoint]) -> f64 {
    let (Some(first), Some(last)) = (equity.first(), equity.last()) else {
        return 0.0;
    };
    if first.equity <= 0.0 {
        return 0.0;
    }
    let days = (last.timestamp - first.timestamp).num_days().max(1) as f64;
    ((last.equity / first.equity).powf(365.0 / days) - 1.0) * 100.0
}

/// Largest decline from the running equity peak, as a positive percentage.
fn max_drawdown(equity: &[EquityPoint]) -> f64 {
    let mut running_max = f64::NEG_INFINITY;
    let mut worst: f64 = 0.0;
    for point in equity {
        running_max = running_max.max(point.equity);
        if running_max > 0.0 {
            worst = worst.min((point.equity - running_max) / running_max * 100.0);
        }
    }
    worst.abs()
}

/// Mean over sample standard deviation of the recorded per-bar
/// `returns_pct` column, annualized by sqrt(252).
fn sharpe_ratio(equity: &[EquityPoint]) -> f64 {
    if equity.len() < 2 {
        return 0.0;
    }
    let returns: Vec<f64> = equity.iter().map(|point| point.returns_pct).collect();
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let var = returns
        .iter()
        .map(|ret| {
            let diff = ret - mean;
            diff * diff
        })
        .sum::<f64>()
        / (n - 1.0);
    let std = var.sqrt();
    if std == 0.0 {
        return 0.0;
    }
    mean / std * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Fraction of winning round trips. A round trip is a BUY followed by the
/// SELL that closes (part of) it; the SELL's realized PnL decides the
/// outcome. Raw trade counts are not used.
fn win_rate(trades: &[Trade]) -> f64 {
    let mut entry_seen = false;
    let mut round_trips = 0usize;
    let mut wins = 0usize;

    for trade in trades {
        match trade.action {
            TradeAction::Buy => entry_seen = true,
            TradeAction::Sell if entry_seen => {
                round_trips += 1;
                if trade.pnl > 0.0 {
                    wins += 1;
                }
                entry_seen = false;
            }
            TradeAction::Sell => {}
        }
    }

    if round_trips == 0 {
        return 0.0;
    }
    wins as f64 / round_trips as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::{analyze, Summary};
    use crate::types::{EquityPoint, Trade, TradeAction};
    use chrono::{Duration, TimeZone, Utc};

    fn curve(values: &[f64]) -> Vec<EquityPoint> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, equity)| EquityPoint {
                timestamp: start + Duration::days(i as i64),
                equity: *equity,
                position: 0.0,
                returns_pct: (equity - values[0]) / values[0] * 100.0,
            })
            .collect()
    }

    fn trade(action: TradeAction, pnl: f64) -> Trade {
        Trade {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            action,
            price: 100.0,
            size: 1.0,
            pnl,
            reason: String::new(),
        }
    }

    #[test]
    fn empty_inputs_degrade_to_zero() {
        let summary = analyze(&[], &[]);
        assert_eq!(
            summary,
            Summary {
                total_return_pct: 0.0,
                annual_return_pct: 0.0,
                max_drawdown_pct: 0.0,
                sharpe_ratio: 0.0,
                win_rate_pct: 0.0,
            }
        );
    }

    #[test]
    fn total_return_is_the_last_recorded_value() {
        let summary = analyze(&curve(&[10_000.0, 10_500.0, 11_000.0]), &[]);
        assert!((summary.total_return_pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn annual_return_compounds_over_elapsed_days() {
        // 10% over 365 days is 10% annualized.
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let equity = vec![
            EquityPoint {
                timestamp: start,
                equity: 10_000.0,
                position: 0.0,
                returns_pct: 0.0,
            },
            EquityPoint {
                timestamp: start + Duration::days(365),
                equity: 11_000.0,
                position: 0.0,
                returns_pct: 10.0,
            },
        ];
        let summary = analyze(&equity, &[]);
        assert!((summary.annual_return_pct - 10.0).abs() < 1e-6);
    }

    #[test]
    fn max_drawdown_measures_fall_from_running_peak() {
        let summary = analyze(&curve(&[10_000.0, 12_000.0, 9_000.0, 11_000.0]), &[]);
        // Peak 12k, trough 9k: 25%.
        assert!((summary.max_drawdown_pct - 25.0).abs() < 1e-9);
    }

    #[test]
    fn sharpe_is_zero_for_flat_or_short_curves() {
        assert_eq!(analyze(&curve(&[10_000.0]), &[]).sharpe_ratio, 0.0);
        assert_eq!(
            analyze(&curve(&[10_000.0, 10_000.0, 10_000.0]), &[]).sharpe_ratio,
            0.0
        );
    }

    #[test]
    fn sharpe_is_positive_for_rising_curves() {
        let summary = analyze(&curve(&[10_000.0, 10_100.0, 10_250.0, 10_400.0]), &[]);
        assert!(summary.sharpe_ratio > 0.0);
    }

    #[test]
    fn win_rate_counts_round_trips_not_raw_trades() {
        let trades = vec![
            trade(TradeAction::Buy, 0.0),
            trade(TradeAction::Sell, 500.0),
            trade(TradeAction::Buy, 0.0),
            trade(TradeAction::Sell, -200.0),
            // Orphan sell before any entry is ignored.
            trade(TradeAction::Sell, 300.0),
        ];
        let summary = analyze(&[], &trades);
        assert!((summary.win_rate_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn analyzer_is_idempotent() {
        let equity = curve(&[10_000.0, 10_500.0, 9_800.0, 11_200.0]);
        let trades = vec![trade(TradeAction::Buy, 0.0), trade(TradeAction::Sell, 100.0)];
        assert_eq!(analyze(&equity, &trades), analyze(&equity, &trades));
    }

    #[test]
    fn fixed_key_map_round_trip() {
        let summary = analyze(&curve(&[10_000.0, 11_000.0]), &[]);
        let map = summary.to_map();
        assert_eq!(map.len(), 5);
        assert!(map.contains_key("Total Return (%)"));
        assert!(map.contains_key("Sharpe Ratio"));

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("Win Rate (%)").is_some());
    }
}
