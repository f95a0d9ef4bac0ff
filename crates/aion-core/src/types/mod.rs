use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeAction {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
        }
    }
}

/// Ephemeral per-bar decision produced by a strategy, consumed by the engine.
///
/// `size` is either absolute units or, when `is_percent` is set, a fraction
/// in [0, 1] of available capital (BUY) or of the open position (SELL).
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub action: TradeAction,
    pub size: f64,
    pub price: f64,
    pub reason: String,
    pub is_percent: bool,
    pub adjust_size: bool,
}

impl Signal {
    pub fn buy(size: f64, price: f64, reason: impl Into<String>) -> Self {
        Self {
            action: TradeAction::Buy,
            size,
            price,
            reason: reason.into(),
            is_percent: false,
            adjust_size: true,
        }
    }

    pub fn sell(size: f64, price: f64, reason: impl Into<String>) -> Self {
        Self {
            action: TradeAction::Sell,
            size,
            price,
            reason: reason.into(),
            is_percent: false,
            adjust_size: true,
        }
    }

    pub fn percent(mut self) -> Self {
        self.is_percent = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub timestamp: DateTime<Utc>,
    pub action: TradeAction,
    pub price: f64,
    pub size: f64,
    pub pnl: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
    pub position: f64,
    pub returns_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::{Signal, TradeAction};

    #[test]
    fn signal_defaults() {
        let signal = Signal::buy(1.0, 100.0, "test");
        assert!(!signal.is_percent);
        assert!(signal.adjust_size);
        assert_eq!(signal.action, TradeAction::Buy);

        let signal = Signal::sell(1.0, 100.0, "test").percent();
        assert!(signal.is_percent);
    }

    #[test]
    fn trade_action_display() {
        assert_eq!(TradeAction::Buy.to_string(), "BUY");
        assert_eq!(TradeAction::Sell.to_string(), "SELL");
    }
}
