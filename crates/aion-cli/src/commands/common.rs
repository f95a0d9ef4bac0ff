use aion_application::config::DataConfig;
use aion_core::repositories::MarketDataRepository;
use aion_infrastructure::market_data::{CsvCandleSource, PostgresCandleStore};

pub fn build_market_data(data: &DataConfig) -> Result<Box<dyn MarketDataRepository>, String> {
    match data.source.trim().to_lowercase().as_str() {
        "csv" => {
            let path = data
                .csv_path
                .as_ref()
                .ok_or_else(|| "data.source = csv requires data.csv_path".to_string())?;
            Ok(Box::new(CsvCandleSource::new(path)))
        }
        "postgres" => {
            let db_url = data
                .db_url
                .as_ref()
                .ok_or_else(|| "data.source = postgres requires data.db_url".to_string())?;
            let table = data
                .table
                .as_ref()
                .ok_or_else(|| "data.source = postgres requires data.table".to_string())?;
            Ok(Box::new(PostgresCandleStore::new(db_url, table)?))
        }
        other => Err(format!("data.source must be csv or postgres, got {other}")),
    }
}
