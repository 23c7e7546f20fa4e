// =============================================================================
// Intraday VWAP
// =============================================================================
//
//   TP_t   = (H_t + L_t + C_t) / 3
//   VWAP_t = Σ(TP · V) / ΣV       accumulated since the first bar of the day
//
// Accumulation restarts whenever the calendar date of the timestamp changes.
// Bars with a non-finite typical price or a non-positive volume do not
// contribute; they report the running value (or `None` if nothing has
// accumulated yet that day).

use chrono::{NaiveDate, NaiveDateTime};

pub fn vwap(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    volume: &[f64],
    timestamps: &[NaiveDateTime],
) -> Vec<Option<f64>> {
    let n = close.len();
    let mut out = vec![None; n];

    let mut cum_pv = 0.0_f64;
    let mut cum_vol = 0.0_f64;
    let mut current_date: Option<NaiveDate> = None;

    for i in 0..n {
        let date = timestamps.get(i).map(NaiveDateTime::date);
        if date != current_date {
            current_date = date;
            cum_pv = 0.0;
            cum_vol = 0.0;
        }

        let sample = |s: &[f64]| s.get(i).copied().unwrap_or(f64::NAN);
        let typical = (sample(high) + sample(low) + close[i]) / 3.0;
        let vol = sample(volume);

        if typical.is_finite() && vol.is_finite() && vol > 0.0 {
            cum_pv += typical * vol;
            cum_vol += vol;
        }

        out[i] = if cum_vol > 0.0 { Some(cum_pv / cum_vol) } else { None };
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn vwap_accumulates_within_day() {
        let high = [11.0, 21.0];
        let low = [9.0, 19.0];
        let close = [10.0, 20.0];
        let volume = [100.0, 300.0];
        let stamps = [ts(4, 9, 15), ts(4, 9, 20)];

        let out = vwap(&high, &low, &close, &volume, &stamps);
        assert!((out[0].unwrap() - 10.0).abs() < 1e-12);
        // (10*100 + 20*300) / 400 = 17.5
        assert!((out[1].unwrap() - 17.5).abs() < 1e-12);
    }

    #[test]
    fn vwap_resets_on_date_change() {
        let high = [11.0, 21.0, 33.0];
        let low = [9.0, 19.0, 27.0];
        let close = [10.0, 20.0, 30.0];
        let volume = [100.0, 300.0, 50.0];
        let stamps = [ts(4, 15, 20), ts(4, 15, 25), ts(5, 9, 15)];

        let out = vwap(&high, &low, &close, &volume, &stamps);
        // First bar of the second day is its own typical price.
        assert!((out[2].unwrap() - 30.0).abs() < 1e-12);
    }

    #[test]
    fn vwap_skips_non_positive_volume_without_reset() {
        let high = [11.0, 100.0, 21.0];
        let low = [9.0, 100.0, 19.0];
        let close = [10.0, 100.0, 20.0];
        let volume = [100.0, 0.0, 100.0];
        let stamps = [ts(4, 9, 15), ts(4, 9, 20), ts(4, 9, 25)];

        let out = vwap(&high, &low, &close, &volume, &stamps);
        assert!((out[1].unwrap() - 10.0).abs() < 1e-12);
        assert!((out[2].unwrap() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn vwap_leading_zero_volume_is_none() {
        let out = vwap(&[1.0], &[1.0], &[1.0], &[0.0], &[ts(4, 9, 15)]);
        assert_eq!(out, vec![None]);
    }
}
