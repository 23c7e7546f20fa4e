pub mod export;
pub mod instrument;
pub mod registry;

pub use export::{export_snapshot, snapshot_file_name};
pub use instrument::{parse_expiry, Instrument};
pub use registry::{
    default_underlyings, InstrumentRegistry, LoadSummary, UnderlyingExpiries, NIFTY_50_TOKEN,
    NIFTY_BANK_TOKEN,
};
