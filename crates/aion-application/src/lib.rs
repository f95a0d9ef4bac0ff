pub mod backtesting;
pub mod config;
pub mod reporting;
pub mod shared;
pub mod validation;
