pub mod candle;
pub mod request;
pub mod series_store;

// Re-export the core types for convenient access (e.g. `use crate::market_data::Candle`).
pub use candle::{parse_candles, parse_timestamp, Candle, ParsedBatch};
pub use request::{HistoryRequest, HistoryWindows};
pub use series_store::{CandleKey, HistoricalStore, MergeStats};
