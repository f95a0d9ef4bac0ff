use crate::feed::DataFeed;
use crate::stats::{self, Summary};
use crate::strategy::{AccountView, Strategy};
use crate::types::{Bar, EquityPoint, Signal, Trade, TradeAction};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Cash magnitudes below this are treated as exactly zero before risk
/// computations (floating dust suppression).
const CASH_DUST: f64 = 1e-10;

/// Orders below this size are discarded instead of executed.
const SIZE_DUST: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Warmup,
    Active,
    Done,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DayStats {
    pub trades: u32,
    pub pnl: f64,
}

#[derive(Debug)]
pub struct BacktestResult {
    pub equity: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    pub summary: Summary,
    pub total_commission: f64,
    pub daily_stats: BTreeMap<NaiveDate, DayStats>,
    pub final_capital: f64,
    pub final_position: f64,
}

/// Single-symbol, single-strategy simulation over one capital pool.
///
/// Bars before `start_time` are consumed to build warm-up history but
/// produce no signal evaluation and no equity point; a bar at or past
/// `end_time` ends the run (start inclusive, end exclusive).
pub struct Backtest<S: Strategy> {
    feed: DataFeed,
    strategy: S,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    initial_capital: f64,
    commission: f64,

    capital: f64,
    position: f64,
    position_cost: f64,
    trades: Vec<Trade>,
    equity_curve: Vec<EquityPoint>,
    total_commission: f64,
    daily_stats: BTreeMap<NaiveDate, DayStats>,
    phase: Phase,
}

impl<S: Strategy> Backtest<S> {
    pub fn new(
        feed: DataFeed,
        strategy: S,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        initial_capital: f64,
        commission: f64,
    ) -> Result<Self, String> {
        if start_time >= end_time {
            return Err(format!(
                "start_time {start_time} must precede end_time {end_time}"
            ));
        }
        if !initial_capital.is_finite() || initial_capital <= 0.0 {
            return Err("initial_capital must be positive".to_string());
        }
        if !commission.is_finite() || commission < 0.0 {
            return Err("commission must be a non-negative fraction".to_string());
        }

        Ok(Self {
            feed,
            strategy,
            start_time,
            end_time,
            initial_capital,
            commission,
            capital: initial_capital,
            position: 0.0,
            position_cost: 0.0,
            trades: Vec::new(),
            equity_curve: Vec::new(),
            total_commission: 0.0,
            daily_stats: BTreeMap::new(),
            phase: Phase::Warmup,
        })
    }

    pub fn run(mut self) -> Result<BacktestResult, String> {
        info!(
            strategy = self.strategy.name(),
            start = %self.start_time,
            end = %self.end_time,
            initial_capital = self.initial_capital,
            "starting backtest"
        );

        loop {
            let Some(bar) = self.feed.next() else {
                break;
            };
            let bar = bar.clone();

            if bar.timestamp < self.start_time {
                continue;
            }
            if bar.timestamp >= self.end_time {
                break;
            }

            let lookback = self.strategy.lookback_periods();
            if self.feed.look_back(lookback).len() < lookback {
                continue;
            }
            if self.phase == Phase::Warmup {
                self.phase = Phase::Active;
            }

            // Suppress cash dust, then hand the strategy its snapshot
            // before asking for a decision.
            if self.capital.abs() < CASH_DUST {
                self.capital = 0.0;
            }
            let equity = self.mark_to_market(bar.close);
            self.strategy.risk_mut().observe(AccountView {
                capital: self.capital,
                initial_capital: self.initial_capital,
                equity,
                position: self.position,
            });

            let history = self.feed.look_back(lookback);
            let signal = self.strategy.on_data(&bar, history);
            if let Some(signal) = signal {
                self.process_signal(&signal, bar.timestamp);
            }

            let equity = self.mark_to_market(bar.close);
            let returns_pct = (equity - self.initial_capital) / self.initial_capital * 100.0;
            self.equity_curve.push(EquityPoint {
                timestamp: bar.timestamp,
                equity,
                position: self.position,
                returns_pct,
            });
        }
        self.phase = Phase::Done;

        if self.equity_curve.is_empty() {
            return Err("no data processed during backtest".to_string());
        }

        let summary = stats::analyze(&self.equity_curve, &self.trades);
        info!(
            bars = self.equity_curve.len(),
            trades = self.trades.len(),
            total_return_pct = summary.total_return_pct,
            "backtest complete"
        );

        Ok(BacktestResult {
            equity: self.equity_curve,
            trades: self.trades,
            summary,
            total_commission: self.total_commission,
            daily_stats: self.daily_stats,
            final_capital: self.capital,
            final_position: self.position,
        })
    }

    fn process_signal(&mut self, signal: &Signal, now: DateTime<Utc>) {
        match signal.action {
            TradeAction::Buy => self.execute_buy(signal, now),
            TradeAction::Sell => self.execute_sell(signal, now),
        }
    }

    fn execute_buy(&mut self, signal: &Signal, now: DateTime<Utc>) {
        let price = signal.price;
        let mut reason = signal.reason.clone();

        let mut size = if signal.is_percent {
            signal.size * self.capital / (price * (1.0 + self.commission))
        } else {
            signal.size
        };

        let affordable = self.capital / (price * (1.0 + self.commission));
        let max_size = affordable.min(self.strategy.calculate_position_size(self.capital, price));

        if size > max_size {
            if signal.adjust_size {
                size = max_size;
                reason = format!("{reason} (Adjusted Size)");
            } else {
                warn!(%now, price, requested = size, max = max_size, "insufficient capital for BUY order");
                return;
            }
        }

        if size <= SIZE_DUST {
            warn!(%now, size, "size too small for BUY order");
            return;
        }

        let cost = size * price * (1.0 + self.commission);
        self.position_cost =
            (self.position_cost * self.position + size * price) / (self.position + size);
        self.capital = (self.capital - cost).max(0.0);
        self.position += size;

        self.record_trade(now, TradeAction::Buy, price, size, 0.0, reason);
    }

    fn execute_sell(&mut self, signal: &Signal, now: DateTime<Utc>) {
        if self.position <= 0.0 {
            return;
        }

        let price = signal.price;
        let size = if signal.is_percent {
            signal.size * self.position
        } else {
            signal.size.min(self.position)
        };
        if size <= SIZE_DUST {
            return;
        }

        let entry_value = self.position_cost * size;
        let exit_value = price * size * (1.0 - self.commission);
        let pnl = exit_value - entry_value;

        self.capital += exit_value;
        self.position -= size;
        if self.position <= 0.0 {
            self.position = 0.0;
            self.position_cost = 0.0;
        }

        self.record_trade(now, TradeAction::Sell, price, size, pnl, signal.reason.clone());
    }

    fn record_trade(
        &mut self,
        now: DateTime<Utc>,
        action: TradeAction,
        price: f64,
        size: f64,
        pnl: f64,
        reason: String,
    ) {
        info!(
            %now,
            %action,
            size,
            price,
            pnl,
            avg_cost = self.position_cost,
            capital = self.capital,
            position = self.position,
            reason = %reason,
            "executed trade"
        );

        self.trades.push(Trade {
            timestamp: now,
            action,
            price,
            size,
            pnl,
            reason,
        });

        self.strategy.update_trade_stats(now, action, price);

        self.total_commission += size * price * self.commission;

        let day = self.daily_stats.entry(now.date_naive()).or_default();
        day.trades += 1;
        day.pnl += pnl;
    }

    fn mark_to_market(&self, close: f64) -> f64 {
        if self.position > 0.0 {
            self.capital + self.position * close
        } else {
            self.capital
        }
    }
}
