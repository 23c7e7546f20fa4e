use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use super::instrument::Instrument;
use super::registry::InstrumentRegistry;
use crate::error::{CoreError, CoreResult};

/// One exported row: the feed columns in feed order plus the parsed expiry.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    instrument_token: &'a str,
    exchange_token: &'a str,
    tradingsymbol: &'a str,
    name: &'a str,
    last_price: f64,
    expiry: &'a str,
    strike: f64,
    tick_size: f64,
    lot_size: u32,
    instrument_type: &'a str,
    segment: &'a str,
    exchange: &'a str,
    expiry_date: Option<NaiveDate>,
}

impl<'a> From<&'a Instrument> for ExportRow<'a> {
    fn from(i: &'a Instrument) -> Self {
        Self {
            instrument_token: &i.token,
            exchange_token: &i.exchange_token,
            tradingsymbol: &i.trading_symbol,
            name: &i.underlying,
            last_price: i.last_price,
            expiry: &i.expiry,
            strike: i.strike,
            tick_size: i.tick_size,
            lot_size: i.lot_size,
            instrument_type: &i.instrument_type,
            segment: i.segment.feed_name(),
            exchange: &i.exchange,
            expiry_date: i.expiry_date,
        }
    }
}

pub fn snapshot_file_name(today: NaiveDate) -> String {
    format!("parsed_instruments_{}.csv", today.format("%Y%m%d"))
}

/// Write every registered instrument to `dir/parsed_instruments_YYYYMMDD.csv`.
///
/// The file is written to a temporary sibling and renamed into place, so a
/// failed export never leaves a truncated snapshot behind.  The temporary
/// file is removed when any step fails.
pub fn export_snapshot(registry: &InstrumentRegistry, dir: &Path, today: NaiveDate) -> CoreResult<PathBuf> {
    let path = dir.join(snapshot_file_name(today));
    let tmp_path = path.with_extension("csv.tmp");

    fs::create_dir_all(dir).map_err(|source| CoreError::Export {
        path: path.clone(),
        source,
    })?;

    let instruments = registry.list();
    let written = write_rows(&tmp_path, &instruments).and_then(|()| {
        fs::rename(&tmp_path, &path).map_err(|source| CoreError::Export {
            path: path.clone(),
            source,
        })
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    info!(path = %path.display(), count = instruments.len(), "instrument snapshot exported");
    Ok(path)
}

fn write_rows(tmp_path: &Path, instruments: &[&Instrument]) -> CoreResult<()> {
    let io_err = |source| CoreError::Export {
        path: tmp_path.to_path_buf(),
        source,
    };

    let file = fs::File::create(tmp_path).map_err(io_err)?;
    let mut wtr = csv::Writer::from_writer(file);
    for inst in instruments {
        wtr.serialize(ExportRow::from(*inst))?;
    }
    wtr.flush().map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    const FEED: &str = "instrument_token,exchange_token,tradingsymbol,name,last_price,expiry,strike,tick_size,lot_size,instrument_type,segment,exchange
101,1,NIFTY24MAR22000CE,\"NIFTY\",12.5,2024-03-07,22000,0.05,50,CE,NFO-OPT,NFO
201,2,NIFTY24MARFUT,\"NIFTY\",22400,2024-03-28,0,0.05,50,FUT,NFO-FUT,NFO
";

    #[test]
    fn file_name_is_date_stamped() {
        assert_eq!(snapshot_file_name(d(2024, 3, 4)), "parsed_instruments_20240304.csv");
    }

    #[test]
    fn export_writes_header_and_all_instruments() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = InstrumentRegistry::default();
        reg.load(FEED.as_bytes(), d(2024, 3, 4)).unwrap();

        let path = export_snapshot(&reg, dir.path(), d(2024, 3, 4)).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("instrument_token,exchange_token,tradingsymbol,name"));
        assert!(lines[0].ends_with(",exchange,expiry_date"));
        assert_eq!(lines.len(), 1 + 4);
        assert!(lines.iter().any(|l| l.starts_with("101,1,NIFTY24MAR22000CE,NIFTY,12.5,2024-03-07")));
        assert!(!dir.path().join("parsed_instruments_20240304.csv.tmp").exists());
    }

    #[test]
    fn failed_export_removes_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = InstrumentRegistry::default();
        reg.load(FEED.as_bytes(), d(2024, 3, 4)).unwrap();

        // A non-empty directory squatting on the target name makes the rename fail.
        let target = dir.path().join("parsed_instruments_20240304.csv");
        fs::create_dir_all(target.join("occupied")).unwrap();

        let err = export_snapshot(&reg, dir.path(), d(2024, 3, 4)).unwrap_err();
        assert!(matches!(err, CoreError::Export { .. }));
        assert!(!dir.path().join("parsed_instruments_20240304.csv.tmp").exists());
        assert!(target.is_dir());
    }

    #[test]
    fn exported_snapshot_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = InstrumentRegistry::default();
        reg.load(FEED.as_bytes(), d(2024, 3, 4)).unwrap();
        let path = export_snapshot(&reg, dir.path(), d(2024, 3, 4)).unwrap();

        let mut reloaded = InstrumentRegistry::default();
        let summary = reloaded.load(File::open(&path).unwrap(), d(2024, 3, 4)).unwrap();
        assert_eq!(summary.rows_skipped, 0);
        assert_eq!(reloaded.list(), reg.list());
    }
}
