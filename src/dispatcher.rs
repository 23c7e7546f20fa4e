// =============================================================================
// Event Dispatcher
// =============================================================================
//
// Collaborators (instrument fetcher, history fetcher, file replay) publish
// `MarketEvent`s on an mpsc channel.  A single task drains the channel and
// applies each event to the shared core to completion before taking the
// next, so events are handled strictly in arrival order.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::app_state::DataCore;
use crate::types::Interval;

/// Shared handle on the core.  Readers take the read lock for queries; the
/// dispatcher is the only writer.
pub type SharedCore = Arc<RwLock<DataCore>>;

pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub enum MarketEvent {
    /// A fresh instrument feed is available on disk.
    InstrumentsReloaded { source: PathBuf },
    /// A historical-data payload for one token and interval.
    CandlesArrived {
        token: String,
        interval: Interval,
        candles: Value,
    },
}

/// Counters returned when the channel closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub reloads: usize,
    pub reload_failures: usize,
    pub payloads: usize,
    pub merges: usize,
}

pub fn shared(core: DataCore) -> SharedCore {
    Arc::new(RwLock::new(core))
}

pub fn event_channel() -> (mpsc::Sender<MarketEvent>, mpsc::Receiver<MarketEvent>) {
    mpsc::channel(EVENT_CHANNEL_CAPACITY)
}

/// Apply one event to the core.
pub fn dispatch(core: &mut DataCore, event: MarketEvent, stats: &mut DispatchStats) {
    match event {
        MarketEvent::InstrumentsReloaded { source } => {
            stats.reloads += 1;
            match core.on_instruments_fetched(&source) {
                Ok(summary) => info!(
                    source = %source.display(),
                    retained = summary.retained,
                    skipped = summary.rows_skipped,
                    "instruments reloaded"
                ),
                Err(e) => {
                    stats.reload_failures += 1;
                    error!(source = %source.display(), error = %e, "instrument reload failed");
                }
            }
        }
        MarketEvent::CandlesArrived {
            token,
            interval,
            candles,
        } => {
            stats.payloads += 1;
            match core.on_historical_data_received(&token, interval, &candles) {
                Some(merge) => {
                    stats.merges += 1;
                    debug!(token = %token, %interval, after = merge.after, "payload merged");
                }
                None => debug!(token = %token, %interval, "payload carried no candles"),
            }
        }
    }
}

/// Drain `rx` until every sender is dropped.
pub async fn run_dispatcher(core: SharedCore, mut rx: mpsc::Receiver<MarketEvent>) -> DispatchStats {
    let mut stats = DispatchStats::default();
    info!("dispatcher started");

    while let Some(event) = rx.recv().await {
        let mut guard = core.write();
        dispatch(&mut guard, event, &mut stats);
    }

    info!(
        reloads = stats.reloads,
        reload_failures = stats.reload_failures,
        payloads = stats.payloads,
        merges = stats.merges,
        "dispatcher stopped"
    );
    stats
}
