use crate::indicators;
use crate::types::{Bar, Signal, TradeAction};
use chrono::{DateTime, Utc};

mod risk;

pub use risk::{AccountView, RiskConfig, RiskEngine};

/// Polymorphic decision unit. Variants implement `generate_signal` only;
/// risk gating and stop-loss/take-profit exits are composed on top by the
/// provided `on_data`, so no variant can bypass them.
pub trait Strategy {
    fn name(&self) -> &str;

    /// Minimum history length required before the strategy is consulted.
    fn lookback_periods(&self) -> usize;

    fn risk(&self) -> &RiskEngine;

    fn risk_mut(&mut self) -> &mut RiskEngine;

    fn generate_signal(&mut self, bar: &Bar, history: &[Bar]) -> Option<Signal>;

    fn on_data(&mut self, bar: &Bar, history: &[Bar]) -> Option<Signal> {
        if let Some(signal) = self.generate_signal(bar, history) {
            if self.risk_mut().check_limits(bar.timestamp) {
                return Some(signal);
            }
        }
        self.risk().check_exit(bar.close)
    }

    /// Maximum affordable size under the configured position limit.
    fn calculate_position_size(&self, capital: f64, price: f64) -> f64 {
        capital * self.risk().config.position_limit / price
    }

    /// Engine callback after every executed trade.
    fn update_trade_stats(&mut self, time: DateTime<Utc>, action: TradeAction, price: f64) {
        self.risk_mut().record_trade(time, action, price);
    }
}

/// Fast/slow SMA crossover, trading only when ADX reports a strong trend.
#[derive(Debug)]
pub struct SmaAdxStrategy {
    fast_period: usize,
    slow_period: usize,
    adx_period: usize,
    adx_threshold: f64,
    risk: RiskEngine,
}

impl SmaAdxStrategy {
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        adx_period: usize,
        adx_threshold: f64,
        risk: RiskConfig,
    ) -> Self {
        Self {
            fast_period,
            slow_period,
            adx_period,
            adx_threshold,
            risk: RiskEngine::new(risk),
        }
    }
}

impl Default for SmaAdxStrategy {
    fn default() -> Self {
        Self::new(5, 20, 14, 25.0, RiskConfig::default())
    }
}

impl Strategy for SmaAdxStrategy {
    fn name(&self) -> &str {
        "sma-adx"
    }

    fn lookback_periods(&self) -> usize {
        self.fast_period.max(self.slow_period).max(self.adx_period)
    }

    fn risk(&self) -> &RiskEngine {
        &self.risk
    }

    fn risk_mut(&mut self) -> &mut RiskEngine {
        &mut self.risk
    }

    fn generate_signal(&mut self, bar: &Bar, history: &[Bar]) -> Option<Signal> {
        if history.len() < self.lookback_periods() {
            return None;
        }

        let closes = indicators::closes(history);
        let fast = *indicators::sma(&closes, self.fast_period).last()?;
        let slow = *indicators::sma(&closes, self.slow_period).last()?;
        let adx = *indicators::adx(history, self.adx_period).last()?;
        let price = bar.close;

        if adx > self.adx_threshold {
            if fast > slow {
                return Some(
                    Signal::buy(1.0, price, format!("Golden Cross with ADX={adx:.1}")).percent(),
                );
            }
            if fast < slow {
                return Some(
                    Signal::sell(1.0, price, format!("Death Cross with ADX={adx:.1}")).percent(),
                );
            }
        }
        None
    }
}

/// SMA crossover gated by the slope of the slow average.
#[derive(Debug)]
pub struct SmaSlopeStrategy {
    fast_period: usize,
    slow_period: usize,
    slope_periods: usize,
    slope_threshold: f64,
    risk: RiskEngine,
}

impl SmaSlopeStrategy {
    pub fn new(fast_period: usize, slow_period: usize, slope_periods: usize, risk: RiskConfig) -> Self {
        Self {
            fast_period,
            slow_period,
            slope_periods,
            slope_threshold: 0.0001,
            risk: RiskEngine::new(risk),
        }
    }

    /// Default limits for this variant: never fully invested.
    pub fn default_risk() -> RiskConfig {
        RiskConfig {
            position_limit: 0.95,
            ..RiskConfig::default()
        }
    }
}

impl Default for SmaSlopeStrategy {
    fn default() -> Self {
        Self::new(50, 120, 5, Self::default_risk())
    }
}

impl Strategy for SmaSlopeStrategy {
    fn name(&self) -> &str {
        "sma-slope"
    }

    fn lookback_periods(&self) -> usize {
        self.fast_period.max(self.slow_period) + self.slope_periods
    }

    fn risk(&self) -> &RiskEngine {
        &self.risk
    }

    fn risk_mut(&mut self) -> &mut RiskEngine {
        &mut self.risk
    }

    fn generate_signal(&mut self, bar: &Bar, history: &[Bar]) -> Option<Signal> {
        if history.len() < self.lookback_periods() || self.slope_periods == 0 {
            return None;
        }

        let closes = indicators::closes(history);
        let fast = *indicators::sma(&closes, self.fast_period).last()?;
        let slow_series = indicators::sma(&closes, self.slow_period);
        let slow = *slow_series.last()?;
        let earlier = slow_series[slow_series.len() - self.slope_periods];
        let slope = (slow - earlier) / self.slope_periods as f64;

        let price = bar.close;
        let position = self.risk.account().position;

        if slope.abs() > self.slope_threshold {
            if fast > slow && position <= 0.0 {
                return Some(Signal::buy(
                    0.01,
                    price,
                    format!("Golden Cross with slope={slope:.6}"),
                ));
            }
            if fast < slow && position > 0.0 {
                return Some(Signal::sell(
                    0.01,
                    price,
                    format!("Death Cross with slope={slope:.6}"),
                ));
            }
        }
        None
    }
}

/// SMA crossover that stands aside when price has run too far from the
/// slow average.
#[derive(Debug)]
pub struct SmaDeviationStrategy {
    fast_period: usize,
    slow_period: usize,
    max_deviation: f64,
    risk: RiskEngine,
}

impl SmaDeviationStrategy {
    pub fn new(fast_period: usize, slow_period: usize, risk: RiskConfig) -> Self {
        Self {
            fast_period,
            slow_period,
            max_deviation: 0.03,
            risk: RiskEngine::new(risk),
        }
    }

    pub fn default_risk() -> RiskConfig {
        RiskConfig {
            position_limit: 0.95,
            ..RiskConfig::default()
        }
    }
}

impl Default for SmaDeviationStrategy {
    fn default() -> Self {
        Self::new(50, 120, Self::default_risk())
    }
}

impl Strategy for SmaDeviationStrategy {
    fn name(&self) -> &str {
        "sma-deviation"
    }

    fn lookback_periods(&self) -> usize {
        self.fast_period.max(self.slow_period)
    }

    fn risk(&self) -> &RiskEngine {
        &self.risk
    }

    fn risk_mut(&mut self) -> &mut RiskEngine {
        &mut self.risk
    }

    fn generate_signal(&mut self, bar: &Bar, history: &[Bar]) -> Option<Signal> {
        if history.len() < self.lookback_periods() {
            return None;
        }

        let closes = indicators::closes(history);
        let fast = *indicators::sma(&closes, self.fast_period).last()?;
        let slow = *indicators::sma(&closes, self.slow_period).last()?;
        let price = bar.close;
        let deviation = (price - slow).abs() / slow;
        let position = self.risk.account().position;

        if deviation < self.max_deviation {
            if fast > slow && position <= 0.0 {
                return Some(Signal::buy(
                    0.01,
                    price,
                    format!("Golden Cross with deviation={:.2}%", deviation * 100.0),
                ));
            }
            if fast < slow && position > 0.0 {
                return Some(Signal::sell(
                    0.01,
                    price,
                    format!("Death Cross with deviation={:.2}%", deviation * 100.0),
                ));
            }
        }
        None
    }
}

/// SMA crossover confirmed by ADX, RSI and the MACD histogram together.
#[derive(Debug)]
pub struct MultiIndicatorStrategy {
    fast_period: usize,
    slow_period: usize,
    adx_period: usize,
    adx_threshold: f64,
    rsi_period: usize,
    risk: RiskEngine,
}

impl MultiIndicatorStrategy {
    pub fn new(fast_period: usize, slow_period: usize, risk: RiskConfig) -> Self {
        Self {
            fast_period,
            slow_period,
            adx_period: 14,
            adx_threshold: 25.0,
            rsi_period: 14,
            risk: RiskEngine::new(risk),
        }
    }

    pub fn default_risk() -> RiskConfig {
        RiskConfig {
            position_limit: 0.95,
            ..RiskConfig::default()
        }
    }
}

impl Default for MultiIndicatorStrategy {
    fn default() -> Self {
        Self::new(50, 120, Self::default_risk())
    }
}

impl Strategy for MultiIndicatorStrategy {
    fn name(&self) -> &str {
        "sma-multi"
    }

    fn lookback_periods(&self) -> usize {
        self.fast_period.max(self.slow_period) + self.adx_period
    }

    fn risk(&self) -> &RiskEngine {
        &self.risk
    }

    fn risk_mut(&mut self) -> &mut RiskEngine {
        &mut self.risk
    }

    fn generate_signal(&mut self, bar: &Bar, history: &[Bar]) -> Option<Signal> {
        if history.len() < self.lookback_periods() {
            return None;
        }

        let closes = indicators::closes(history);
        let fast = *indicators::sma(&closes, self.fast_period).last()?;
        let slow = *indicators::sma(&closes, self.slow_period).last()?;
        let adx = *indicators::adx(history, self.adx_period).last()?;
        let rsi = *indicators::rsi(&closes, self.rsi_period).last()?;
        let macd_hist = *indicators::macd(&closes, 12, 26, 9).hist.last()?;

        let price = bar.close;
        let position = self.risk.account().position;

        let uptrend_strong = adx > self.adx_threshold && rsi > 60.0 && macd_hist > 0.0;
        let downtrend_strong = adx > self.adx_threshold && rsi < 40.0 && macd_hist < 0.0;

        if fast > slow && uptrend_strong && position <= 0.0 {
            return Some(Signal::buy(
                0.01,
                price,
                format!("Strong Uptrend: ADX={adx:.1}, RSI={rsi:.1}"),
            ));
        }
        if fast < slow && downtrend_strong && position > 0.0 {
            return Some(Signal::sell(
                0.01,
                price,
                format!("Strong Downtrend: ADX={adx:.1}, RSI={rsi:.1}"),
            ));
        }
        None
    }
}

/// Closed set of built-in strategies, dispatched by configuration id.
#[derive(Debug)]
pub enum StrategyKind {
    SmaAdx(SmaAdxStrategy),
    SmaSlope(SmaSlopeStrategy),
    SmaDeviation(SmaDeviationStrategy),
    MultiIndicator(MultiIndicatorStrategy),
}

impl Strategy for StrategyKind {
    fn name(&self) -> &str {
        match self {
            StrategyKind::SmaAdx(strategy) => strategy.name(),
            StrategyKind::SmaSlope(strategy) => strategy.name(),
            StrategyKind::SmaDeviation(strategy) => strategy.name(),
            StrategyKind::MultiIndicator(strategy) => strategy.name(),
        }
    }

    fn lookback_periods(&self) -> usize {
        match self {
            StrategyKind::SmaAdx(strategy) => strategy.lookback_periods(),
            StrategyKind::SmaSlope(strategy) => strategy.lookback_periods(),
            StrategyKind::SmaDeviation(strategy) => strategy.lookback_periods(),
            StrategyKind::MultiIndicator(strategy) => strategy.lookback_periods(),
        }
    }

    fn risk(&self) -> &RiskEngine {
        match self {
            StrategyKind::SmaAdx(strategy) => strategy.risk(),
            StrategyKind::SmaSlope(strategy) => strategy.risk(),
            StrategyKind::SmaDeviation(strategy) => strategy.risk(),
            StrategyKind::MultiIndicator(strategy) => strategy.risk(),
        }
    }

    fn risk_mut(&mut self) -> &mut RiskEngine {
        match self {
            StrategyKind::SmaAdx(strategy) => strategy.risk_mut(),
            StrategyKind::SmaSlope(strategy) => strategy.risk_mut(),
            StrategyKind::SmaDeviation(strategy) => strategy.risk_mut(),
            StrategyKind::MultiIndicator(strategy) => strategy.risk_mut(),
        }
    }

    fn generate_signal(&mut self, bar: &Bar, history: &[Bar]) -> Option<Signal> {
        match self {
            StrategyKind::SmaAdx(strategy) => strategy.generate_signal(bar, history),
            StrategyKind::SmaSlope(strategy) => strategy.generate_signal(bar, history),
            StrategyKind::SmaDeviation(strategy) => strategy.generate_signal(bar, history),
            StrategyKind::MultiIndicator(strategy) => strategy.generate_signal(bar, history),
        }
    }
}
