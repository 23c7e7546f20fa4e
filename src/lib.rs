// =============================================================================
// Aurora Analytics: historical candle store and derived analytics core
// =============================================================================
//
// Module map:
//   types / error / calendar   shared vocabulary
//   indicators                 pure indicator primitives
//   market_data                candle parsing, request planning, series store
//   instruments                instrument feed loading, pruning, export
//   analytics                  daily / 5-minute calculators and snapshots
//   app_state                  `DataCore`, the owner of all of the above
//   dispatcher                 ordered event delivery into a shared core
//   runtime_config             file + environment configuration
// =============================================================================

pub mod analytics;
pub mod app_state;
pub mod calendar;
pub mod dispatcher;
pub mod error;
pub mod indicators;
pub mod instruments;
pub mod market_data;
pub mod runtime_config;
pub mod types;

pub use analytics::AnalyticsSnapshot;
pub use app_state::DataCore;
pub use calendar::{HolidayCalendar, TradingCalendar};
pub use dispatcher::{run_dispatcher, MarketEvent, SharedCore};
pub use error::{CoreError, CoreResult};
pub use market_data::Candle;
pub use runtime_config::RuntimeConfig;
pub use types::{Interval, Segment};
