pub mod engine;
pub mod feed;
pub mod indicators;
pub mod report;
pub mod repositories;
pub mod stats;
pub mod strategy;
pub mod timeframe;
pub mod types;

pub fn engine_name() -> &'static str {
    "aion"
}
