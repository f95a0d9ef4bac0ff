use crate::types::Bar;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct OhlcvQuery {
    pub symbol: String,
    pub interval: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Port for the external data-acquisition collaborator. Implementations
/// must return bars in ascending timestamp order, normalized to UTC.
pub trait MarketDataRepository {
    fn load_ohlcv(&self, query: &OhlcvQuery) -> Result<Vec<Bar>, String>;
}
