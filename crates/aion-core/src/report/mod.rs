use crate::stats::Summary;
use crate::types::{EquityPoint, Trade};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct SummaryMeta {
    pub run_id: String,
    pub symbol: String,
    pub interval: String,
    pub start: String,
    pub end: String,
    pub initial_capital: f64,
    pub commission: f64,
}

pub fn write_trades_csv(path: &Path, trades: &[Trade]) -> Result<(), String> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|err| format!("failed to create trades csv {}: {}", path.display(), err))?;
    for trade in trades {
        writer
            .serialize(trade)
            .map_err(|err| format!("failed to write trade row: {}", err))?;
    }
    writer
        .flush()
        .map_err(|err| format!("failed to flush trades csv: {}", err))
}

pub fn write_equity_csv(path: &Path, points: &[EquityPoint]) -> Result<(), String> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|err| format!("failed to create equity csv {}: {}", path.display(), err))?;
    for point in points {
        writer
            .serialize(point)
            .map_err(|err| format!("failed to write equity row: {}", err))?;
    }
    writer
        .flush()
        .map_err(|err| format!("failed to flush equity csv: {}", err))
}

pub fn write_summary_json(
    path: &Path,
    summary: &Summary,
    meta: Option<&SummaryMeta>,
    config_snapshot: Option<&serde_json::Value>,
) -> Result<(), String> {
    let json = serde_json::json!({
        "meta": meta,
        "config_snapshot": config_snapshot,
        "stats": summary,
    });
    let json = serde_json::to_string_pretty(&json)
        .map_err(|err| format!("failed to serialize summary: {}", err))?;
    let mut file = fs::File::create(path)
        .map_err(|err| format!("failed to create summary {}: {}", path.display(), err))?;
    file.write_all(json.as_bytes())
        .map_err(|err| format!("failed to write summary: {}", err))
}

pub fn read_trades_csv(path: &Path) -> Result<Vec<Trade>, String> {
    let file = fs::File::open(path)
        .map_err(|err| format!("failed to open trades csv {}: {}", path.display(), err))?;
    let mut reader = csv::Reader::from_reader(file);
    let mut trades = Vec::new();
    for result in reader.deserialize::<Trade>() {
        trades.push(result.map_err(|err| format!("failed to parse trades row: {}", err))?);
    }
    Ok(trades)
}

pub fn read_equity_csv(path: &Path) -> Result<Vec<EquityPoint>, String> {
    let file = fs::File::open(path)
        .map_err(|err| format!("failed to open equity csv {}: {}", path.display(), err))?;
    let mut reader = csv::Reader::from_reader(file);
    let mut points = Vec::new();
    for result in reader.deserialize::<EquityPoint>() {
        points.push(result.map_err(|err| format!("failed to parse equity row: {}", err))?);
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::{
        read_equity_csv, read_trades_csv, write_equity_csv, write_summary_json, write_trades_csv,
        SummaryMeta,
    };
    use crate::stats::Summary;
    use crate::types::{EquityPoint, Trade, TradeAction};
    use chrono::{TimeZone, Utc};
    use std::fs;
    use std::path::Path;

    #[test]
    fn artifacts_round_trip() {
        let dir = Path::new("/tmp/aion_report_test");
        let _ = fs::create_dir_all(dir);

        let trades = vec![Trade {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            action: TradeAction::Buy,
            price: 100.0,
            size: 1.5,
            pnl: 0.0,
            // Commas in free-text reasons must survive the CSV layer.
            reason: "Strong Uptrend: ADX=30.1, RSI=65.2".to_string(),
        }];
        let equity = vec![EquityPoint {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            equity: 10_000.0,
            position: 1.5,
            returns_pct: 0.0,
        }];
        let summary = Summary {
            total_return_pct: 0.0,
            annual_return_pct: 0.0,
            max_drawdown_pct: 0.0,
            sharpe_ratio: 0.0,
            win_rate_pct: 0.0,
        };
        let meta = SummaryMeta {
            run_id: "test".to_string(),
            symbol: "BTCUSDT".to_string(),
            interval: "1h".to_string(),
            start: "2024-01-01T00:00:00Z".to_string(),
            end: "2024-02-01T00:00:00Z".to_string(),
            initial_capital: 10_000.0,
            commission: 0.0004,
        };

        write_trades_csv(dir.join("trades.csv").as_path(), &trades).expect("trades");
        write_equity_csv(dir.join("equity.csv").as_path(), &equity).expect("equity");
        write_summary_json(dir.join("summary.json").as_path(), &summary, Some(&meta), None)
            .expect("summary");

        let trades_back = read_trades_csv(dir.join("trades.csv").as_path()).expect("read trades");
        assert_eq!(trades_back, trades);

        let equity_back = read_equity_csv(dir.join("equity.csv").as_path()).expect("read equity");
        assert_eq!(equity_back, equity);

        let raw = fs::read_to_string(dir.join("summary.json")).expect("read summary");
        assert!(raw.contains("Total Return (%)"));
        assert!(raw.contains("BTCUSDT"));
    }
}
