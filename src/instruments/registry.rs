// =============================================================================
// Instrument Registry
// =============================================================================
//
// Token → Instrument map.  The two index instruments are seeded at
// construction and survive every reload; derivatives are replaced wholesale
// by each `load` and pruned down to the contracts the analytics care about:
//
//   options  -> nearest weekly expiry or the monthly expiry
//   futures  -> the monthly futures expiry
//
// Only the configured underlyings are considered (exact, case-insensitive
// match on the trimmed feed name, so `NIFTYNXT50` never sneaks in).

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use csv::{ReaderBuilder, Trim};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::instrument::{Instrument, RowRejection};
use crate::error::{CoreError, CoreResult};
use crate::types::Segment;

pub const NIFTY_50_TOKEN: &str = "256265";
pub const NIFTY_BANK_TOKEN: &str = "260105";

/// Underlyings analysed when none are configured.
pub fn default_underlyings() -> Vec<String> {
    vec!["NIFTY".to_string(), "BANKNIFTY".to_string()]
}

/// Expiries resolved for one underlying during a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnderlyingExpiries {
    pub underlying: String,
    pub weekly: Option<NaiveDate>,
    pub monthly: Option<NaiveDate>,
    pub future_monthly: Option<NaiveDate>,
}

/// Outcome of one feed load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub rows_read: usize,
    /// Malformed rows (short, bad expiry, undecodable).
    pub rows_skipped: usize,
    /// Derivatives of a configured underlying.
    pub candidates: usize,
    /// Derivatives left after pruning.
    pub retained: usize,
    pub expiries: Vec<UnderlyingExpiries>,
}

#[derive(Debug)]
pub struct InstrumentRegistry {
    instruments: HashMap<String, Instrument>,
    underlyings: Vec<String>,
}

impl Default for InstrumentRegistry {
    fn default() -> Self {
        Self::new(default_underlyings())
    }
}

impl InstrumentRegistry {
    pub fn new(underlyings: Vec<String>) -> Self {
        let underlyings: Vec<String> = underlyings
            .into_iter()
            .map(|u| u.trim().to_ascii_uppercase())
            .filter(|u| !u.is_empty())
            .collect();

        let mut instruments = HashMap::new();
        for index in [
            Instrument::index(NIFTY_50_TOKEN, "1001", "NIFTY 50"),
            Instrument::index(NIFTY_BANK_TOKEN, "1016", "NIFTY BANK"),
        ] {
            instruments.insert(index.token.clone(), index);
        }
        info!(underlyings = ?underlyings, "instrument registry initialised with NIFTY 50 and NIFTY BANK");

        Self {
            instruments,
            underlyings,
        }
    }

    pub fn underlyings(&self) -> &[String] {
        &self.underlyings
    }

    /// Canonical configured underlying for a feed name, if it is one.
    fn configured_underlying(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.underlyings
            .iter()
            .find(|u| u.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    /// Open `path` and [`load`](Self::load) it.  An unreadable file leaves the
    /// registry untouched.
    pub fn load_file(&mut self, path: &Path, today: NaiveDate) -> CoreResult<LoadSummary> {
        let file = File::open(path).map_err(|source| CoreError::FeedUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        self.load(file, today)
    }

    /// Replace all derivatives with the relevant contracts from a feed.
    ///
    /// The feed is read completely before anything is modified, so an I/O
    /// failure mid-stream leaves the registry as it was.
    pub fn load<R: Read>(&mut self, reader: R, today: NaiveDate) -> CoreResult<LoadSummary> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let mut summary = LoadSummary::default();
        let mut candidates: Vec<Instrument> = Vec::new();

        for (line, result) in rdr.records().enumerate() {
            let record = match result {
                Ok(record) => record,
                Err(e) if e.is_io_error() => return Err(CoreError::Csv(e)),
                Err(e) => {
                    summary.rows_read += 1;
                    summary.rows_skipped += 1;
                    warn!(line = line + 2, error = %e, "undecodable instrument row skipped");
                    continue;
                }
            };
            if record.iter().all(str::is_empty) {
                continue;
            }
            summary.rows_read += 1;

            match Instrument::from_record(&record) {
                Ok(inst) if inst.segment.is_derivative() => {
                    if let Some(canonical) = self.configured_underlying(&inst.underlying) {
                        let mut inst = inst;
                        inst.underlying = canonical.to_string();
                        candidates.push(inst);
                    }
                }
                Ok(_) => {}
                Err(RowRejection::OtherSegment(_)) => {}
                Err(RowRejection::TooFewFields(n)) => {
                    summary.rows_skipped += 1;
                    warn!(line = line + 2, fields = n, "instrument row has too few fields, skipped");
                }
                Err(RowRejection::BadExpiry(raw)) => {
                    summary.rows_skipped += 1;
                    warn!(
                        line = line + 2,
                        expiry = %raw,
                        "derivative row without a valid expiry, skipped"
                    );
                }
            }
        }
        summary.candidates = candidates.len();

        let removed = self.clear_derivatives();
        debug!(removed, "cleared previous derivatives");

        if candidates.is_empty() {
            warn!(underlyings = ?self.underlyings, "no derivative candidates found in instrument feed");
            return Ok(summary);
        }

        for underlying in &self.underlyings {
            let options = expiries_from(
                candidates.iter().filter(|i| i.is_option() && i.underlying == *underlying),
                today,
            );
            let futures = expiries_from(
                candidates.iter().filter(|i| i.is_future() && i.underlying == *underlying),
                today,
            );

            let expiries = UnderlyingExpiries {
                underlying: underlying.clone(),
                weekly: options.iter().next().copied(),
                monthly: monthly_expiry(&options),
                future_monthly: monthly_expiry(&futures),
            };
            info!(
                underlying = %underlying,
                weekly = ?expiries.weekly,
                monthly = ?expiries.monthly,
                future_monthly = ?expiries.future_monthly,
                "resolved expiries"
            );
            summary.expiries.push(expiries);
        }

        for inst in candidates {
            let Some(expiries) = summary.expiries.iter().find(|e| e.underlying == inst.underlying) else {
                continue;
            };
            let keep = match inst.segment {
                Segment::OptionDerivative => {
                    inst.expiry_date.is_some()
                        && (inst.expiry_date == expiries.weekly || inst.expiry_date == expiries.monthly)
                }
                Segment::FutureDerivative => {
                    inst.expiry_date.is_some() && inst.expiry_date == expiries.future_monthly
                }
                Segment::Index => false,
            };
            if keep {
                self.instruments.insert(inst.token.clone(), inst);
            }
        }
        summary.retained = self
            .instruments
            .values()
            .filter(|i| i.segment.is_derivative())
            .count();

        info!(
            rows = summary.rows_read,
            skipped = summary.rows_skipped,
            candidates = summary.candidates,
            retained = summary.retained,
            total = self.instruments.len(),
            "instrument feed loaded"
        );
        Ok(summary)
    }

    fn clear_derivatives(&mut self) -> usize {
        let before = self.instruments.len();
        self.instruments.retain(|_, i| !i.segment.is_derivative());
        before - self.instruments.len()
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn get(&self, token: &str) -> Option<&Instrument> {
        self.instruments.get(token)
    }

    /// Every registered instrument, sorted by token.
    pub fn list(&self) -> Vec<&Instrument> {
        let mut all: Vec<&Instrument> = self.instruments.values().collect();
        all.sort_by(|a, b| a.token.cmp(&b.token));
        all
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    fn options_of(&self, underlying: &str) -> Vec<&Instrument> {
        self.instruments
            .values()
            .filter(|i| i.is_option() && i.has_underlying(underlying))
            .collect()
    }

    /// Earliest registered option expiry on or after `from`.
    pub fn nearest_weekly_expiry(&self, underlying: &str, from: NaiveDate) -> Option<NaiveDate> {
        expiries_from(self.options_of(underlying).into_iter(), from)
            .into_iter()
            .next()
    }

    /// Last option expiry of the earliest month (≥ `from`'s month) that has
    /// one.  Falls back to the latest available expiry.
    pub fn monthly_expiry_in_month(&self, underlying: &str, from: NaiveDate) -> Option<NaiveDate> {
        monthly_expiry(&expiries_from(self.options_of(underlying).into_iter(), from))
    }

    /// Options for an underlying at one expiry, sorted by strike then symbol.
    pub fn options_for(&self, underlying: &str, expiry: NaiveDate) -> Vec<&Instrument> {
        let mut out: Vec<&Instrument> = self
            .options_of(underlying)
            .into_iter()
            .filter(|i| i.expiry_date == Some(expiry))
            .collect();
        out.sort_by(|a, b| {
            a.strike
                .total_cmp(&b.strike)
                .then_with(|| a.trading_symbol.cmp(&b.trading_symbol))
        });
        out
    }

    /// Token of the `FUT` contract expiring earliest within `today`'s month.
    pub fn current_month_future_token(&self, underlying: &str, today: NaiveDate) -> Option<&str> {
        self.instruments
            .values()
            .filter(|i| i.is_future() && i.instrument_type == "FUT" && i.has_underlying(underlying))
            .filter_map(|i| i.expiry_date.map(|d| (d, i)))
            .filter(|(d, _)| d.year() == today.year() && d.month() == today.month())
            .min_by(|(da, a), (db, b)| da.cmp(db).then_with(|| a.token.cmp(&b.token)))
            .map(|(_, i)| i.token.as_str())
    }
}

// -----------------------------------------------------------------------------
// Expiry helpers
// -----------------------------------------------------------------------------

/// Distinct expiries on or after `from`, ascending.
fn expiries_from<'a>(instruments: impl Iterator<Item = &'a Instrument>, from: NaiveDate) -> BTreeSet<NaiveDate> {
    instruments
        .filter_map(|i| i.expiry_date)
        .filter(|d| *d >= from)
        .collect()
}

/// Last expiry within the month of the earliest expiry in the set.
fn monthly_expiry(expiries: &BTreeSet<NaiveDate>) -> Option<NaiveDate> {
    let first = expiries.iter().next()?;
    let target = (first.year(), first.month());
    expiries
        .iter()
        .rev()
        .find(|d| (d.year(), d.month()) == target)
        .copied()
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "instrument_token,exchange_token,tradingsymbol,name,last_price,expiry,strike,tick_size,lot_size,instrument_type,segment,exchange\n";

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn opt_row(token: &str, name: &str, expiry: &str, strike: u32, kind: &str) -> String {
        format!("{token},1,{name}{strike}{kind},\"{name}\",0,{expiry},{strike},0.05,50,{kind},NFO-OPT,NFO\n")
    }

    fn fut_row(token: &str, name: &str, expiry: &str) -> String {
        format!("{token},1,{name}FUT,\"{name}\",0,{expiry},0,0.05,50,FUT,NFO-FUT,NFO\n")
    }

    /// Feed with three NIFTY option expiries in March, one in April, two
    /// futures, a BANKNIFTY chain, a NIFTYNXT50 contract and junk rows.
    fn sample_feed() -> String {
        let mut feed = String::from(HEADER);
        feed += &opt_row("101", "NIFTY", "2024-03-07", 22000, "CE");
        feed += &opt_row("102", "NIFTY", "2024-03-07", 21900, "PE");
        feed += &opt_row("103", "NIFTY", "2024-03-14", 22000, "CE");
        feed += &opt_row("104", "NIFTY", "2024-03-28", 22000, "CE");
        feed += &opt_row("105", "NIFTY", "2024-04-25", 22000, "CE");
        feed += &opt_row("106", "NIFTY", "2024-02-29", 22000, "CE");
        feed += &fut_row("201", "NIFTY", "2024-03-28");
        feed += &fut_row("202", "NIFTY", "2024-04-25");
        feed += &opt_row("301", "BANKNIFTY", "2024-03-06", 47000, "CE");
        feed += &opt_row("302", "BANKNIFTY", "2024-03-27", 47000, "CE");
        feed += &fut_row("303", "BANKNIFTY", "2024-03-27");
        feed += &opt_row("401", "NIFTYNXT50", "2024-03-07", 60000, "CE");
        feed += "999,1,INFY,INFOSYS,0,,0,0.05,1,EQ,NSE,NSE\n";
        feed += "bad,row\n";
        feed += "501,1,NIFTYX,NIFTY,0,NA,0,0.05,50,CE,NFO-OPT,NFO\n";
        feed
    }

    fn loaded() -> (InstrumentRegistry, LoadSummary) {
        let mut reg = InstrumentRegistry::default();
        let summary = reg.load(sample_feed().as_bytes(), d(2024, 3, 4)).unwrap();
        (reg, summary)
    }

    // ---- construction ----

    #[test]
    fn seeds_both_indices() {
        let reg = InstrumentRegistry::default();
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get(NIFTY_50_TOKEN).unwrap().trading_symbol, "NIFTY 50");
        assert_eq!(reg.get(NIFTY_BANK_TOKEN).unwrap().segment, Segment::Index);
    }

    // ---- load ----

    #[test]
    fn load_counts_rows() {
        let (_, summary) = loaded();
        assert_eq!(summary.rows_read, 15);
        assert_eq!(summary.rows_skipped, 2);
        // 6 NIFTY options + 2 NIFTY futures + 3 BANKNIFTY.
        assert_eq!(summary.candidates, 11);
    }

    #[test]
    fn load_resolves_expiries() {
        let (_, summary) = loaded();
        let nifty = summary.expiries.iter().find(|e| e.underlying == "NIFTY").unwrap();
        assert_eq!(nifty.weekly, Some(d(2024, 3, 7)));
        assert_eq!(nifty.monthly, Some(d(2024, 3, 28)));
        assert_eq!(nifty.future_monthly, Some(d(2024, 3, 28)));

        let bank = summary.expiries.iter().find(|e| e.underlying == "BANKNIFTY").unwrap();
        assert_eq!(bank.weekly, Some(d(2024, 3, 6)));
        assert_eq!(bank.monthly, Some(d(2024, 3, 27)));
    }

    #[test]
    fn load_prunes_to_weekly_and_monthly() {
        let (reg, summary) = loaded();
        let tokens: Vec<&str> = reg.list().iter().map(|i| i.token.as_str()).collect();
        assert_eq!(
            tokens,
            vec!["101", "102", "104", "201", "256265", "260105", "301", "302", "303"]
        );
        assert_eq!(summary.retained, 7);
        assert!(reg.get("103").is_none(), "mid-month weekly is pruned");
        assert!(reg.get("401").is_none(), "NIFTYNXT50 is not a configured underlying");
        assert!(reg.get("999").is_none());
    }

    #[test]
    fn reload_replaces_derivatives_but_keeps_indices() {
        let (mut reg, _) = loaded();
        let feed = format!("{HEADER}{}", fut_row("777", "NIFTY", "2024-03-28"));
        reg.load(feed.as_bytes(), d(2024, 3, 4)).unwrap();
        let tokens: Vec<&str> = reg.list().iter().map(|i| i.token.as_str()).collect();
        assert_eq!(tokens, vec!["256265", "260105", "777"]);
    }

    #[test]
    fn load_without_candidates_leaves_only_indices() {
        let (mut reg, _) = loaded();
        let summary = reg.load(HEADER.as_bytes(), d(2024, 3, 4)).unwrap();
        assert_eq!(summary.candidates, 0);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn missing_file_leaves_registry_untouched() {
        let (mut reg, _) = loaded();
        let before = reg.len();
        let err = reg
            .load_file(Path::new("/nonexistent/instruments.csv"), d(2024, 3, 4))
            .unwrap_err();
        assert!(matches!(err, CoreError::FeedUnavailable { .. }));
        assert_eq!(reg.len(), before);
    }

    #[test]
    fn configured_underlyings_are_respected() {
        let mut reg = InstrumentRegistry::new(vec![" banknifty ".to_string()]);
        let summary = reg.load(sample_feed().as_bytes(), d(2024, 3, 4)).unwrap();
        assert_eq!(summary.candidates, 3);
        assert!(reg.get("101").is_none());
        assert!(reg.get("303").is_some());
    }

    // ---- queries ----

    #[test]
    fn expiry_queries_after_load() {
        let (reg, _) = loaded();
        assert_eq!(reg.nearest_weekly_expiry("nifty", d(2024, 3, 4)), Some(d(2024, 3, 7)));
        assert_eq!(reg.nearest_weekly_expiry("NIFTY", d(2024, 3, 8)), Some(d(2024, 3, 28)));
        assert_eq!(reg.monthly_expiry_in_month("NIFTY", d(2024, 3, 4)), Some(d(2024, 3, 28)));
        assert_eq!(reg.nearest_weekly_expiry("NIFTY", d(2024, 4, 1)), None);
        assert_eq!(reg.nearest_weekly_expiry("FINNIFTY", d(2024, 3, 4)), None);
    }

    #[test]
    fn options_sorted_by_strike() {
        let (reg, _) = loaded();
        let chain = reg.options_for("NIFTY", d(2024, 3, 7));
        let strikes: Vec<f64> = chain.iter().map(|i| i.strike).collect();
        assert_eq!(strikes, vec![21900.0, 22000.0]);
        assert!(reg.options_for("NIFTY", d(2024, 3, 14)).is_empty());
    }

    #[test]
    fn option_chain_outlives_query_name() {
        let (reg, _) = loaded();
        let chain = {
            let name = String::from(" nifty ");
            reg.options_for(&name, d(2024, 3, 7))
        };
        assert_eq!(chain.len(), 2);
        assert!(chain.iter().all(|i| i.has_underlying("NIFTY")));
    }

    #[test]
    fn current_month_future() {
        let (reg, _) = loaded();
        assert_eq!(reg.current_month_future_token("NIFTY", d(2024, 3, 4)), Some("201"));
        assert_eq!(reg.current_month_future_token("BANKNIFTY", d(2024, 3, 20)), Some("303"));
        assert_eq!(reg.current_month_future_token("NIFTY", d(2024, 4, 2)), None);
    }

    #[test]
    fn monthly_expiry_helper() {
        let set: BTreeSet<NaiveDate> = [d(2024, 3, 7), d(2024, 3, 28), d(2024, 4, 25)].into();
        assert_eq!(monthly_expiry(&set), Some(d(2024, 3, 28)));
        assert_eq!(monthly_expiry(&BTreeSet::new()), None);
    }
}
