use aion_core::timeframe::Interval;
use aion_core::types::Bar;
use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;

const BINANCE_SPOT_BASE: &str = "https://api.binance.com";
const KLINES_LIMIT: usize = 1000;

/// Thin wrapper over the Binance spot klines endpoint. Public market data
/// only; no credentials involved.
pub struct BinanceClient {
    base_url: String,
    client: reqwest::blocking::Client,
    sleep_between_pages: Duration,
}

impl BinanceClient {
    pub fn new() -> Result<Self, String> {
        Self::with_base_url(BINANCE_SPOT_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
            sleep_between_pages: Duration::from_millis(250),
        })
    }

    /// Download klines for `[start, end)`, paginating at the exchange
    /// page limit. Bars come back in ascending timestamp order.
    pub fn download_klines(
        &self,
        symbol: &str,
        interval: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, String> {
        let interval = Interval::parse(interval)?;
        let end_ms = end.timestamp_millis();
        let mut cursor_ms = start.timestamp_millis();
        let mut bars: Vec<Bar> = Vec::new();

        while cursor_ms < end_ms {
            let url = format!(
                "{}/api/v3/klines?symbol={}&interval={}&startTime={}&endTime={}&limit={}",
                self.base_url,
                symbol.to_uppercase(),
                interval.label,
                cursor_ms,
                end_ms,
                KLINES_LIMIT
            );

            let response = self
                .client
                .get(&url)
                .send()
                .map_err(|err| format!("klines request failed: {err}"))?;
            if !response.status().is_success() {
                return Err(format!(
                    "klines request for {symbol} returned {}",
                    response.status()
                ));
            }
            let rows: Vec<Vec<serde_json::Value>> = response
                .json()
                .map_err(|err| format!("failed to decode klines response: {err}"))?;
            if rows.is_empty() {
                break;
            }

            let page_len = rows.len();
            for row in rows {
                let bar = parse_kline_row(&row)?;
                if bar.timestamp >= end {
                    return Ok(bars);
                }
                cursor_ms = bar.timestamp.timestamp_millis() + interval.seconds * 1_000;
                bars.push(bar);
            }

            if page_len < KLINES_LIMIT {
                break;
            }
            std::thread::sleep(self.sleep_between_pages);
        }

        tracing::info!(symbol, interval = %interval.label, rows = bars.len(), "downloaded klines");
        Ok(bars)
    }
}

/// A Binance kline row is a mixed array:
/// `[open_time_ms, "open", "high", "low", "close", "volume", ...]`.
fn parse_kline_row(row: &[serde_json::Value]) -> Result<Bar, String> {
    if row.len() < 6 {
        return Err(format!("kline row too short: {} fields", row.len()));
    }
    let open_time_ms = row[0]
        .as_i64()
        .ok_or_else(|| "kline open time is not an integer".to_string())?;
    let timestamp = Utc
        .timestamp_millis_opt(open_time_ms)
        .single()
        .ok_or_else(|| format!("kline open time out of range: {open_time_ms}"))?;

    let field = |idx: usize, name: &str| -> Result<f64, String> {
        row[idx]
            .as_str()
            .ok_or_else(|| format!("kline {name} is not a string"))?
            .parse::<f64>()
            .map_err(|err| format!("kline {name} is not numeric: {err}"))
    };

    Ok(Bar {
        timestamp,
        open: field(1, "open")?,
        high: field(2, "high")?,
        low: field(3, "low")?,
        close: field(4, "close")?,
        volume: field(5, "volume")?,
    })
}
