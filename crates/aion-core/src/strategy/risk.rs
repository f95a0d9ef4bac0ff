use crate::types::{Signal, TradeAction};
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Per-strategy risk limits. Defaults impose no restriction; gating is
/// opt-in per strategy.
#[derive(Debug, Clone)]
pub struct RiskConfig {
    /// Fraction of capital a single position may consume.
    pub position_limit: f64,
    /// Fraction of initial capital that must stay in cash.
    pub min_cash_reserve: f64,
    pub min_trade_interval: Duration,
    pub max_trades_per_day: Option<u32>,
    /// Maximum tolerated drawdown from peak equity, as a fraction.
    pub max_drawdown: f64,
    /// Unrealized loss fraction that forces a full exit.
    pub stop_loss: f64,
    /// Unrealized gain fraction that forces a full exit.
    pub take_profit: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            position_limit: 1.0,
            min_cash_reserve: 0.0,
            min_trade_interval: Duration::zero(),
            max_trades_per_day: None,
            max_drawdown: 1.0,
            stop_loss: f64::INFINITY,
            take_profit: f64::INFINITY,
        }
    }
}

/// Ledger snapshot the engine pushes into the strategy before each
/// decision. The strategy never mutates the ledger through it.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountView {
    pub capital: f64,
    pub initial_capital: f64,
    pub equity: f64,
    pub position: f64,
}

/// Risk limit state owned by a strategy instance; one per backtest run.
#[derive(Debug)]
pub struct RiskEngine {
    pub config: RiskConfig,
    account: AccountView,
    last_trade_time: Option<DateTime<Utc>>,
    last_trade_date: Option<NaiveDate>,
    daily_trades: u32,
    peak_equity: f64,
    current_drawdown: f64,
    entry_price: Option<f64>,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            config,
            account: AccountView::default(),
            last_trade_time: None,
            last_trade_date: None,
            daily_trades: 0,
            peak_equity: 0.0,
            current_drawdown: 0.0,
            entry_price: None,
        }
    }

    pub fn account(&self) -> &AccountView {
        &self.account
    }

    pub fn current_drawdown(&self) -> f64 {
        self.current_drawdown
    }

    pub fn observe(&mut self, account: AccountView) {
        self.account = account;
    }

    /// Gate a candidate signal. Order: cash reserve, trade interval, daily
    /// trade count (reset on date change), drawdown from the ratcheting
    /// peak. Peak equity initializes to the greater of current equity and
    /// initial capital and only moves up.
    pub fn check_limits(&mut self, now: DateTime<Utc>) -> bool {
        let min_cash = self.config.min_cash_reserve * self.account.initial_capital;
        if self.account.capital < min_cash {
            return false;
        }

        if let Some(last) = self.last_trade_time {
            if now - last < self.config.min_trade_interval {
                return false;
            }
        }

        let current_date = now.date_naive();
        if self.last_trade_date != Some(current_date) {
            self.daily_trades = 0;
            self.last_trade_date = Some(current_date);
        }
        if let Some(max) = self.config.max_trades_per_day {
            if self.daily_trades >= max {
                return false;
            }
        }

        if self.peak_equity == 0.0 {
            self.peak_equity = self.account.equity.max(self.account.initial_capital);
        } else if self.account.equity > self.peak_equity {
            self.peak_equity = self.account.equity;
        }
        if self.peak_equity > 0.0 {
            self.current_drawdown = (self.peak_equity - self.account.equity) / self.peak_equity;
            if self.current_drawdown > self.config.max_drawdown {
                return false;
            }
        }

        true
    }

    /// Stop-loss / take-profit exit while holding a position with a
    /// recorded entry price. Always a full-size percent SELL.
    pub fn check_exit(&self, current_price: f64) -> Option<Signal> {
        if self.account.position <= 0.0 {
            return None;
        }
        let entry = self.entry_price?;
        let returns = (current_price - entry) / entry;

        if returns <= -self.config.stop_loss {
            return Some(
                Signal::sell(
                    1.0,
                    current_price,
                    format!("Stop Loss at {:.2}%", returns * 100.0),
                )
                .percent(),
            );
        }
        if returns >= self.config.take_profit {
            return Some(
                Signal::sell(
                    1.0,
                    current_price,
                    format!("Take Profit at {:.2}%", returns * 100.0),
                )
                .percent(),
            );
        }
        None
    }

    pub fn record_trade(&mut self, time: DateTime<Utc>, action: TradeAction, price: f64) {
        self.last_trade_time = Some(time);
        self.daily_trades += 1;
        if action == TradeAction::Buy {
            self.entry_price = Some(price);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AccountView, RiskConfig, RiskEngine};
    use crate::types::TradeAction;
    use chrono::{Duration, TimeZone, Utc};

    fn account(capital: f64, equity: f64, position: f64) -> AccountView {
        AccountView {
            capital,
            initial_capital: 10_000.0,
            equity,
            position,
        }
    }

    #[test]
    fn default_config_never_rejects() {
        let mut risk = RiskEngine::new(RiskConfig::default());
        risk.observe(account(0.0, 5_000.0, 1.0));
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(risk.check_limits(now));
    }

    #[test]
    fn cash_reserve_rejects_when_below_floor() {
        let mut risk = RiskEngine::new(RiskConfig {
            min_cash_reserve: 0.2,
            ..RiskConfig::default()
        });
        risk.observe(account(1_000.0, 10_000.0, 0.0));
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(!risk.check_limits(now));

        risk.observe(account(3_000.0, 10_000.0, 0.0));
        assert!(risk.check_limits(now));
    }

    #[test]
    fn trade_interval_gates_until_elapsed() {
        let mut risk = RiskEngine::new(RiskConfig {
            min_trade_interval: Duration::minutes(30),
            ..RiskConfig::default()
        });
        risk.observe(account(10_000.0, 10_000.0, 0.0));

        let first = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert!(risk.check_limits(first));
        risk.record_trade(first, TradeAction::Buy, 100.0);

        assert!(!risk.check_limits(first + Duration::minutes(10)));
        assert!(risk.check_limits(first + Duration::minutes(30)));
    }

    #[test]
    fn daily_trade_count_resets_on_date_change() {
        let mut risk = RiskEngine::new(RiskConfig {
            max_trades_per_day: Some(1),
            ..RiskConfig::default()
        });
        risk.observe(account(10_000.0, 10_000.0, 0.0));

        let day1 = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert!(risk.check_limits(day1));
        risk.record_trade(day1, TradeAction::Buy, 100.0);
        assert!(!risk.check_limits(day1 + Duration::hours(1)));

        let day2 = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
        assert!(risk.check_limits(day2));
    }

    #[test]
    fn drawdown_gate_uses_ratcheting_peak() {
        let mut risk = RiskEngine::new(RiskConfig {
            max_drawdown: 0.1,
            ..RiskConfig::default()
        });
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        risk.observe(account(12_000.0, 12_000.0, 0.0));
        assert!(risk.check_limits(now));

        // 15% below the 12k peak: rejected until equity recovers.
        risk.observe(account(10_200.0, 10_200.0, 0.0));
        assert!(!risk.check_limits(now));

        risk.observe(account(11_000.0, 11_000.0, 0.0));
        assert!(risk.check_limits(now));
    }

    #[test]
    fn exit_fires_on_stop_loss_and_take_profit() {
        let mut risk = RiskEngine::new(RiskConfig {
            stop_loss: 0.05,
            take_profit: 0.10,
            ..RiskConfig::default()
        });
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        risk.observe(account(0.0, 10_000.0, 1.0));
        risk.record_trade(now, TradeAction::Buy, 100.0);

        assert!(risk.check_exit(98.0).is_none());

        let stop = risk.check_exit(94.0).expect("stop loss");
        assert!(stop.is_percent);
        assert!(stop.reason.starts_with("Stop Loss"));

        let take = risk.check_exit(111.0).expect("take profit");
        assert!(take.reason.starts_with("Take Profit"));
    }

    #[test]
    fn exit_requires_position_and_entry_price() {
        let mut risk = RiskEngine::new(RiskConfig {
            stop_loss: 0.01,
            ..RiskConfig::default()
        });
        risk.observe(account(10_000.0, 10_000.0, 0.0));
        assert!(risk.check_exit(1.0).is_none());

        // Holding, but no recorded entry: nothing to measure against.
        risk.observe(account(0.0, 10_000.0, 1.0));
        assert!(risk.check_exit(1.0).is_none());
    }
}
