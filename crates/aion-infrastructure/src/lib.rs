pub mod exchange;
pub mod market_data;
