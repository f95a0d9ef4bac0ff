use aion_core::engine::{BacktestResult, DayStats};
use aion_core::report::{read_equity_csv, read_trades_csv, SummaryMeta};
use aion_core::stats;
use aion_core::timeframe::parse_utc_timestamp;
use aion_core::types::{Trade, TradeAction};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;

const SEPARATOR: &str =
    "════════════════════════════════════════════════════════════";
const SUBSEPARATOR: &str =
    "────────────────────────────────────────────────────────────";

/// Sectioned plain-text report for a finished run.
pub fn render_text_report(meta: &SummaryMeta, result: &BacktestResult) -> String {
    let mut out = String::new();
    let summary = &result.summary;

    let duration_days = match (
        parse_utc_timestamp(&meta.start),
        parse_utc_timestamp(&meta.end),
    ) {
        (Ok(start), Ok(end)) => (end - start).num_days(),
        _ => 0,
    };

    out.push_str(&format!("{SEPARATOR}\n"));
    out.push_str(&format!("{:^60}\n", "BACKTEST REPORT"));
    out.push_str(&format!("{SEPARATOR}\n\n"));

    out.push_str("BASIC INFORMATION\n");
    out.push_str(&format!("{SUBSEPARATOR}\n"));
    out.push_str(&format!("{:<20} {}\n", "Run:", meta.run_id));
    out.push_str(&format!("{:<20} {}\n", "Symbol:", meta.symbol));
    out.push_str(&format!("{:<20} {}\n", "Interval:", meta.interval));
    out.push_str(&format!(
        "{:<20} {} to {}\n",
        "Period:", meta.start, meta.end
    ));
    out.push_str(&format!("{:<20} {} days\n\n", "Duration:", duration_days));

    let final_equity = result
        .equity
        .last()
        .map(|point| point.equity)
        .unwrap_or(meta.initial_capital);
    let position_value = final_equity - result.final_capital;

    out.push_str("CAPITAL SUMMARY\n");
    out.push_str(&format!("{SUBSEPARATOR}\n"));
    out.push_str(&format!(
        "{:<20} ${:.2}\n",
        "Initial Capital:", meta.initial_capital
    ));
    out.push_str(&format!(
        "{:<20} ${:.2}\n",
        "Final Capital:", result.final_capital
    ));
    out.push_str(&format!(
        "{:<20} {:.4} units\n",
        "Current Position:", result.final_position
    ));
    out.push_str(&format!("{:<20} ${:.2}\n", "Position Value:", position_value));
    out.push_str(&format!("{:<20} ${:.2}\n\n", "Final Equity:", final_equity));

    out.push_str("RETURN ANALYSIS\n");
    out.push_str(&format!("{SUBSEPARATOR}\n"));
    out.push_str(&format!(
        "{:<20} {:.2}%\n",
        "Total Return:", summary.total_return_pct
    ));
    out.push_str(&format!(
        "{:<20} {:.2}%\n",
        "Annual Return:", summary.annual_return_pct
    ));
    out.push_str(&format!(
        "{:<20} {:.2}%\n",
        "Max Drawdown:", summary.max_drawdown_pct
    ));
    out.push_str(&format!(
        "{:<20} {:.2}\n\n",
        "Sharpe Ratio:", summary.sharpe_ratio
    ));

    out.push_str("TRADE STATISTICS\n");
    out.push_str(&format!("{SUBSEPARATOR}\n"));
    let total_trades = result.trades.len();
    let trades_per_day = if duration_days > 0 {
        total_trades as f64 / duration_days as f64
    } else {
        0.0
    };
    out.push_str(&format!("{:<20} {}\n", "Number of Trades:", total_trades));
    out.push_str(&format!("{:<20} {:.2}\n", "Trades per Day:", trades_per_day));
    out.push_str(&format!("{:<20} {:.2}%\n", "Win Rate:", summary.win_rate_pct));

    if !result.trades.is_empty() {
        let risk_reward = if summary.max_drawdown_pct != 0.0 {
            (summary.annual_return_pct / summary.max_drawdown_pct).abs()
        } else {
            f64::INFINITY
        };
        out.push_str(&format!("{:<20} {:.2}\n", "Risk/Reward Ratio:", risk_reward));
        out.push_str(&format!(
            "{:<20} {:.2}\n",
            "Profit Factor:",
            profit_factor(&result.trades)
        ));
        out.push_str(&format!(
            "{:<20} ${:.2}\n",
            "Total Commission:", result.total_commission
        ));

        let profitable_days = result
            .daily_stats
            .values()
            .filter(|day| day.pnl > 0.0)
            .count();
        let total_days = result.daily_stats.len();
        if total_days > 0 {
            out.push_str(&format!(
                "{:<20} {:.1}%\n",
                "Profitable Days:",
                profitable_days as f64 / total_days as f64 * 100.0
            ));
            if let Some((date, day)) = result
                .daily_stats
                .iter()
                .max_by_key(|(_, day)| day.trades)
            {
                out.push_str(&format!(
                    "{:<20} {} ({} trades)\n",
                    "Most Active Day:", date, day.trades
                ));
            }
        }
    }

    out.push_str(&format!("\n{SEPARATOR}\n"));
    out
}

fn profit_factor(trades: &[Trade]) -> f64 {
    let wins: f64 = trades.iter().map(|t| t.pnl).filter(|pnl| *pnl > 0.0).sum();
    let losses: f64 = trades
        .iter()
        .map(|t| t.pnl)
        .filter(|pnl| *pnl <= 0.0)
        .sum::<f64>()
        .abs();
    if losses > 0.0 {
        wins / losses
    } else if wins > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

pub fn daily_stats_from_trades(trades: &[Trade]) -> BTreeMap<NaiveDate, DayStats> {
    let mut daily: BTreeMap<NaiveDate, DayStats> = BTreeMap::new();
    for trade in trades {
        let day = daily.entry(trade.timestamp.date_naive()).or_default();
        day.trades += 1;
        day.pnl += trade.pnl;
    }
    daily
}

/// Rebuild a run from its artifacts directory and render the text report.
/// The summary is recomputed from the stored trajectory rather than
/// trusted from summary.json.
pub fn report_from_dir(input: &Path) -> Result<String, String> {
    let summary_path = input.join("summary.json");
    let raw = std::fs::read_to_string(&summary_path)
        .map_err(|err| format!("failed to read {}: {}", summary_path.display(), err))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|err| format!("failed to parse {}: {}", summary_path.display(), err))?;
    let meta: SummaryMeta = serde_json::from_value(
        value
            .get("meta")
            .cloned()
            .ok_or_else(|| "summary.json has no meta section".to_string())?,
    )
    .map_err(|err| format!("failed to parse summary meta: {err}"))?;

    let trades = read_trades_csv(&input.join("trades.csv"))?;
    let equity = read_equity_csv(&input.join("equity.csv"))?;
    let summary = stats::analyze(&equity, &trades);

    // Replay the trade log with the engine's arithmetic to recover the
    // ledger values that are not stored as artifacts.
    let mut capital = meta.initial_capital;
    let mut position = 0.0f64;
    let mut total_commission = 0.0f64;
    for trade in &trades {
        match trade.action {
            TradeAction::Buy => {
                capital = (capital - trade.size * trade.price * (1.0 + meta.commission)).max(0.0);
                position += trade.size;
            }
            TradeAction::Sell => {
                capital += trade.price * trade.size * (1.0 - meta.commission);
                position = (position - trade.size).max(0.0);
            }
        }
        total_commission += trade.size * trade.price * meta.commission;
    }

    let result = BacktestResult {
        daily_stats: daily_stats_from_trades(&trades),
        equity,
        trades,
        summary,
        total_commission,
        final_capital: capital,
        final_position: position,
    };
    Ok(render_text_report(&meta, &result))
}
