// =============================================================================
// Aurora Analytics: Main Entry Point
// =============================================================================
//
// Replays on-disk inputs through the analytics core: the instrument feed
// first, then every `<token>_<interval>.json` payload found in the history
// directory.  Network fetching lives outside this binary; the planned history
// requests are logged so a fetcher can pick them up.
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use aurora_analytics::dispatcher::{event_channel, run_dispatcher, shared, MarketEvent};
use aurora_analytics::runtime_config::{RuntimeConfig, DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH};
use aurora_analytics::{DataCore, Interval};

/// A payload file found in the history directory.
struct PayloadFile {
    path: PathBuf,
    token: String,
    interval: Interval,
}

/// `<token>_<interval>.json`, split on the last underscore.
fn payload_file(path: &Path) -> Option<PayloadFile> {
    if path.extension()?.to_str()? != "json" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (token, interval) = stem.rsplit_once('_')?;
    if token.is_empty() {
        return None;
    }
    let interval = interval.parse::<Interval>().ok()?;
    Some(PayloadFile {
        path: path.to_path_buf(),
        token: token.to_string(),
        interval,
    })
}

fn scan_history_dir(dir: &Path) -> Result<Vec<PayloadFile>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to list history directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        match payload_file(&path) {
            Some(file) => files.push(file),
            None => warn!(path = %path.display(), "skipping unrecognised history file"),
        }
    }
    // Day payloads first so 5-minute recomputations see daily snapshots.
    files.sort_by(|a, b| (a.interval, &a.token).cmp(&(b.interval, &b.token)));
    Ok(files)
}

fn read_payload(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read payload {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse payload {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Aurora Analytics starting up");

    let config_path = std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let mut config = RuntimeConfig::load_or_default(&config_path);
    config.apply_env_overrides();

    info!(
        underlyings = ?config.underlyings,
        instruments = %config.instruments_file.display(),
        history_dir = %config.history_dir.display(),
        "configuration resolved"
    );

    let instruments_file = config.instruments_file.clone();
    let history_dir = config.history_dir.clone();

    // ── 2. Build the shared core and the dispatcher ──────────────────────
    let core = shared(DataCore::new(config));
    let (tx, rx) = event_channel();
    let dispatcher = tokio::spawn(run_dispatcher(core.clone(), rx));

    // ── 3. Instrument feed ───────────────────────────────────────────────
    tx.send(MarketEvent::InstrumentsReloaded {
        source: instruments_file,
    })
    .await
    .context("dispatcher stopped before the instrument reload")?;

    // ── 4. Historical payloads ───────────────────────────────────────────
    let files = match scan_history_dir(&history_dir) {
        Ok(files) => files,
        Err(e) => {
            warn!(error = %e, "no history replayed");
            Vec::new()
        }
    };
    info!(count = files.len(), "history payloads found");

    for file in files {
        let candles = match read_payload(&file.path) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "payload skipped");
                continue;
            }
        };
        tx.send(MarketEvent::CandlesArrived {
            token: file.token,
            interval: file.interval,
            candles,
        })
        .await
        .context("dispatcher stopped during history replay")?;
    }

    // ── 5. Drain ─────────────────────────────────────────────────────────
    drop(tx);
    let stats = dispatcher.await.context("dispatcher task panicked")?;
    info!(?stats, "replay complete");

    // ── 6. Report ────────────────────────────────────────────────────────
    let core = core.read();
    for token in core.snapshot_tokens() {
        if let Some(snapshot) = core.snapshot(token) {
            let json = serde_json::to_string(snapshot).context("failed to serialise snapshot")?;
            info!(token, snapshot = %json, "analytics snapshot");
        }
    }

    for request in core.history_requests(core.today()) {
        info!(
            token = %request.token,
            interval = %request.interval,
            from = %request.from_param(),
            to = %request.to_param(),
            "history request planned"
        );
    }

    info!("Aurora Analytics shut down complete.");
    Ok(())
}
