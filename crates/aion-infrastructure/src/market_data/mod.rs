use aion_core::repositories::{MarketDataRepository, OhlcvQuery};
use aion_core::timeframe::parse_utc_timestamp;
use aion_core::types::Bar;
use postgres::{Client, NoTls};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct OhlcvRecord {
    timestamp_utc: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Load bars from a CSV file with header
/// `timestamp_utc,open,high,low,close,volume`. Rows are validated as they
/// are read; any malformed row fails the load.
pub fn load_csv(path: &Path) -> Result<Vec<Bar>, String> {
    let file = File::open(path)
        .map_err(|err| format!("failed to open OHLCV CSV {}: {}", path.display(), err))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut bars = Vec::new();
    for result in reader.deserialize::<OhlcvRecord>() {
        let record = result.map_err(|err| format!("failed to parse CSV row: {}", err))?;
        let timestamp = parse_utc_timestamp(&record.timestamp_utc)?;

        for (name, value) in [
            ("open", record.open),
            ("high", record.high),
            ("low", record.low),
            ("close", record.close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("invalid {name} at {}: {value}", record.timestamp_utc));
            }
        }
        if !record.volume.is_finite() || record.volume < 0.0 {
            return Err(format!(
                "invalid volume at {}: {}",
                record.timestamp_utc, record.volume
            ));
        }

        bars.push(Bar {
            timestamp,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        });
    }
    Ok(bars)
}

/// Write bars to a CSV file in the same layout `load_csv` reads.
pub fn write_csv(path: &Path, bars: &[Bar]) -> Result<(), String> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|err| format!("failed to create OHLCV CSV {}: {}", path.display(), err))?;
    writer
        .write_record(["timestamp_utc", "open", "high", "low", "close", "volume"])
        .map_err(|err| format!("failed to write CSV header: {}", err))?;
    for bar in bars {
        writer
            .write_record([
                bar.timestamp.to_rfc3339(),
                bar.open.to_string(),
                bar.high.to_string(),
                bar.low.to_string(),
                bar.close.to_string(),
                bar.volume.to_string(),
            ])
            .map_err(|err| format!("failed to write CSV row: {}", err))?;
    }
    writer
        .flush()
        .map_err(|err| format!("failed to flush OHLCV CSV: {}", err))
}

/// File-backed market data source for single-symbol runs. The query's
/// symbol and interval are informational; the file decides what it holds.
pub struct CsvCandleSource {
    path: PathBuf,
}

impl CsvCandleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MarketDataRepository for CsvCandleSource {
    fn load_ohlcv(&self, query: &OhlcvQuery) -> Result<Vec<Bar>, String> {
        let bars = load_csv(&self.path)?;
        Ok(bars
            .into_iter()
            .filter(|bar| bar.timestamp >= query.start && bar.timestamp < query.end)
            .collect())
    }
}

fn validate_table_name(table: &str) -> Result<(), String> {
    if table.is_empty() {
        return Err("table name is empty".to_string());
    }
    let valid = table
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '.');
    if !valid {
        return Err(format!("invalid table name: {table}"));
    }
    Ok(())
}

/// Candle store backed by a Postgres table keyed by
/// (symbol, timeframe, timestamp_utc).
pub struct PostgresCandleStore {
    db_url: String,
    table: String,
}

impl PostgresCandleStore {
    pub fn new(db_url: impl Into<String>, table: impl Into<String>) -> Result<Self, String> {
        let table = table.into();
        validate_table_name(&table)?;
        Ok(Self {
            db_url: db_url.into(),
            table,
        })
    }

    pub fn save_klines(&self, symbol: &str, interval: &str, bars: &[Bar]) -> Result<usize, String> {
        let mut client = Client::connect(&self.db_url, NoTls)
            .map_err(|err| format!("failed to connect to postgres: {err}"))?;

        let statement = format!(
            "INSERT INTO {} (symbol, timeframe, timestamp_utc, open, high, low, close, volume) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (symbol, timeframe, timestamp_utc) DO UPDATE SET \
             open = EXCLUDED.open, high = EXCLUDED.high, low = EXCLUDED.low, \
             close = EXCLUDED.close, volume = EXCLUDED.volume",
            self.table
        );

        let mut written = 0usize;
        for bar in bars {
            client
                .execute(
                    &statement,
                    &[
                        &symbol,
                        &interval,
                        &bar.timestamp,
                        &bar.open,
                        &bar.high,
                        &bar.low,
                        &bar.close,
                        &bar.volume,
                    ],
                )
                .map_err(|err| format!("failed to upsert kline: {err}"))?;
            written += 1;
        }
        tracing::debug!(symbol, interval, rows = written, "saved klines");
        Ok(written)
    }
}

impl MarketDataRepository for PostgresCandleStore {
    fn load_ohlcv(&self, query: &OhlcvQuery) -> Result<Vec<Bar>, String> {
        let mut client = Client::connect(&self.db_url, NoTls)
            .map_err(|err| format!("failed to connect to postgres: {err}"))?;

        let statement = format!(
            "SELECT timestamp_utc, open, high, low, close, volume FROM {} \
             WHERE symbol = $1 AND timeframe = $2 AND timestamp_utc >= $3 AND timestamp_utc < $4 \
             ORDER BY timestamp_utc ASC",
            self.table
        );
        let rows = client
            .query(&statement, &[&query.symbol, &query.interval, &query.start, &query.end])
            .map_err(|err| format!("failed to query klines: {err}"))?;

        let mut bars = Vec::with_capacity(rows.len());
        for row in rows {
            bars.push(Bar {
                timestamp: row.get(0),
                open: row.get(1),
                high: row.get(2),
                low: row.get(3),
                close: row.get(4),
                volume: row.get(5),
            });
        }
        Ok(bars)
    }
}
