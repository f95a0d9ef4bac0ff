use chrono::{DateTime, Utc};

/// Parse a timestamp, requiring an explicit UTC offset. A naive timestamp
/// cannot be normalized and is rejected as invalid input.
pub fn parse_utc_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%z") {
        return Ok(dt.with_timezone(&Utc));
    }
    if chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").is_ok() {
        return Err(format!(
            "timestamp {value} has no timezone offset; timestamps must be explicit"
        ));
    }
    Err(format!("unsupported timestamp format: {value}"))
}

/// Candle interval label, e.g. "1m", "4h", "1d".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub label: String,
    pub seconds: i64,
}

impl Interval {
    pub fn parse(value: &str) -> Result<Self, String> {
        let trimmed = value.trim().to_lowercase();
        if trimmed.len() < 2 {
            return Err(format!("invalid interval: {value}"));
        }
        let (digits, unit) = trimmed.split_at(trimmed.len() - 1);
        let count: i64 = digits
            .parse()
            .map_err(|_| format!("invalid interval: {value}"))?;
        if count <= 0 {
            return Err(format!("invalid interval: {value}"));
        }
        let unit_seconds = match unit {
            "s" => 1,
            "m" => 60,
            "h" => 3_600,
            "d" => 86_400,
            "w" => 604_800,
            _ => return Err(format!("invalid interval unit: {value}")),
        };
        Ok(Self {
            label: trimmed,
            seconds: count * unit_seconds,
        })
    }
}
