//! Stateless indicator calculations over history slices.
//!
//! Every function is a pure function of the window it is handed; series
//! outputs are aligned with their input and carry `NAN` for positions where
//! the indicator is not yet defined. Exponential smoothing is seeded with
//! the first observation (`alpha = 2 / (span + 1)`).

use crate::types::Bar;

pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|bar| bar.close).collect()
}

/// Simple moving average; `NAN` until `period` values are available.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    let mut sum: f64 = values[..period].iter().sum();
    out[period - 1] = sum / period as f64;
    for i in period..values.len() {
        sum += values[i] - values[i - period];
        out[i] = sum / period as f64;
    }
    out
}

/// Exponentially weighted moving average over the full series.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if values.is_empty() || span == 0 {
        return out;
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut current = values[0];
    out[0] = current;
    for i in 1..values.len() {
        current = alpha * values[i] + (1.0 - alpha) * current;
        out[i] = current;
    }
    out
}

/// Relative strength index from rolling mean gain/loss; `NAN` until
/// `period + 1` closes are available.
pub fn rsi(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() <= period {
        return out;
    }

    let mut gains = vec![0.0; values.len()];
    let mut losses = vec![0.0; values.len()];
    for i in 1..values.len() {
        let delta = values[i] - values[i - 1];
        if delta > 0.0 {
            gains[i] = delta;
        } else {
            losses[i] = -delta;
        }
    }

    for i in period..values.len() {
        let window = (i + 1 - period)..=i;
        let gain: f64 = gains[window.clone()].iter().sum::<f64>() / period as f64;
        let loss: f64 = losses[window].iter().sum::<f64>() / period as f64;
        let rs = gain / loss;
        out[i] = 100.0 - 100.0 / (1.0 + rs);
    }
    out
}

#[derive(Debug, Clone)]
pub struct MacdOutput {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub hist: Vec<f64>,
}

pub fn macd(values: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> MacdOutput {
    let fast = ema(values, fast_period);
    let slow = ema(values, slow_period);
    let macd_line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal_line = ema(&macd_line, signal_period);
    let hist = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| m - s)
        .collect();
    MacdOutput {
        macd: macd_line,
        signal: signal_line,
        hist,
    }
}

fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut tr = vec![0.0; bars.len()];
    for (i, bar) in bars.iter().enumerate() {
        let mut range = bar.high - bar.low;
        if i > 0 {
            let prev_close = bars[i - 1].close;
            range = range
                .max((bar.high - prev_close).abs())
                .max((bar.low - prev_close).abs());
        }
        tr[i] = range;
    }
    tr
}

/// Average true range (exponentially smoothed true range).
pub fn atr(bars: &[Bar], period: usize) -> Vec<f64> {
    ema(&true_range(bars), period)
}

/// Average directional index with exponentially smoothed DM/TR components.
pub fn adx(bars: &[Bar], period: usize) -> Vec<f64> {
    if bars.is_empty() || period == 0 {
        return vec![f64::NAN; bars.len()];
    }

    let atr = ema(&true_range(bars), period);

    let mut pos_dm = vec![0.0; bars.len()];
    let mut neg_dm = vec![0.0; bars.len()];
    for i in 1..bars.len() {
        let up_move = bars[i].high - bars[i - 1].high;
        let down_move = bars[i - 1].low - bars[i].low;
        if up_move > down_move && up_move > 0.0 {
            pos_dm[i] = up_move;
        }
        if down_move > up_move && down_move > 0.0 {
            neg_dm[i] = down_move;
        }
    }
    let pos_smooth = ema(&pos_dm, period);
    let neg_smooth = ema(&neg_dm, period);

    let mut dx = vec![0.0; bars.len()];
    for i in 0..bars.len() {
        let pdi = if atr[i] > 0.0 {
            100.0 * pos_smooth[i] / atr[i]
        } else {
            0.0
        };
        let ndi = if atr[i] > 0.0 {
            100.0 * neg_smooth[i] / atr[i]
        } else {
            0.0
        };
        let denom = if pdi + ndi == 0.0 { 1.0 } else { pdi + ndi };
        dx[i] = 100.0 * (pdi - ndi).abs() / denom;
    }

    ema(&dx, period)
}

#[derive(Debug, Clone)]
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

pub fn bollinger_bands(values: &[f64], period: usize, std_dev: f64) -> BollingerBands {
    let middle = sma(values, period);
    let mut upper = vec![f64::NAN; values.len()];
    let mut lower = vec![f64::NAN; values.len()];

    if period > 1 && values.len() >= period {
        for i in (period - 1)..values.len() {
            let window = &values[i + 1 - period..=i];
            let mean = middle[i];
            let var = window.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>()
                / (period as f64 - 1.0);
            let std = var.sqrt();
            upper[i] = mean + std_dev * std;
            lower[i] = mean - std_dev * std;
        }
    }

    BollingerBands {
        upper,
        middle,
        lower,
    }
}

#[cfg(test)]
mod tests {
    use super::{adx, bollinger_bands, ema, macd, rsi, sma};
    use crate::types::Bar;
    use chrono::{TimeZone, Utc};

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| Bar {
                timestamp: Utc.timestamp_opt(i as i64 * 60, 0).unwrap(),
                open: *close,
                high: close + 1.0,
                low: close - 1.0,
                close: *close,
                volume: 1.0,
            })
            .collect()
    }

    #[test]
    fn sma_warmup_and_values() {
        let out = sma(&[1.0, 2.0, 3.0, 4.0], 2);
        assert!(out[0].is_nan());
        assert!((out[1] - 1.5).abs() < 1e-12);
        assert!((out[2] - 2.5).abs() < 1e-12);
        assert!((out[3] - 3.5).abs() < 1e-12);
    }

    #[test]
    fn ema_is_seeded_with_first_value() {
        let out = ema(&[10.0, 10.0, 10.0], 3);
        assert!(out.iter().all(|v| (v - 10.0).abs() < 1e-12));

        let out = ema(&[1.0, 2.0], 3);
        // alpha = 0.5: 0.5 * 2 + 0.5 * 1
        assert!((out[1] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn rsi_bounds() {
        let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&rising, 14);
        assert!(out[14..].iter().all(|v| (*v - 100.0).abs() < 1e-9));

        let falling: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let out = rsi(&falling, 14);
        assert!(out[14..].iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn macd_hist_positive_in_uptrend() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let out = macd(&closes, 12, 26, 9);
        assert!(out.hist.last().unwrap() > &0.0);
    }

    #[test]
    fn adx_is_finite_and_nonnegative() {
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64) * 0.5).collect();
        let out = adx(&bars_from_closes(&closes), 14);
        assert!(out.iter().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn adx_handles_flat_series() {
        let closes = vec![100.0; 30];
        let out = adx(&bars_from_closes(&closes), 14);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn bollinger_brackets_the_mean() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + (i % 5) as f64).collect();
        let bands = bollinger_bands(&closes, 20, 2.0);
        let last = closes.len() - 1;
        assert!(bands.upper[last] > bands.middle[last]);
        assert!(bands.lower[last] < bands.middle[last]);
    }
}
