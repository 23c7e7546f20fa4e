// =============================================================================
// Rolling Standard Deviation (population)
// =============================================================================
//
//   σ_t = sqrt( Σx²/period − (Σx/period)² )
//
// Divides by `period`, not `period - 1`.  Cancellation in the running sums
// can push the variance slightly below zero; such values floor to 0.

use super::{apply_warmup, finite};

/// Rolling population standard deviation over a window of exactly `period`
/// finite samples.  `period <= 1` yields an all-`None` series.
pub fn stddev(values: &[f64], period: usize, warmup: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut out = vec![None; n];
    if period <= 1 || n == 0 {
        return out;
    }

    let p = period as f64;
    let mut sum = 0.0_f64;
    let mut sum_sq = 0.0_f64;
    let mut count = 0_usize;

    for i in 0..n {
        if let Some(x) = finite(values[i]) {
            sum += x;
            sum_sq += x * x;
            count += 1;
        }
        if i >= period {
            if let Some(old) = finite(values[i - period]) {
                sum -= old;
                sum_sq -= old * old;
                count -= 1;
            }
        }
        if i + 1 >= period && count == period {
            let mean = sum / p;
            let variance = sum_sq / p - mean * mean;
            out[i] = Some(if variance > 0.0 { variance.sqrt() } else { 0.0 });
        }
    }

    apply_warmup(&mut out, warmup);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stddev_population_known_value() {
        // Population σ of [2,4,4,4,5,5,7,9] is exactly 2.
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let out = stddev(&values, 8, 0);
        assert!(out[..7].iter().all(Option::is_none));
        assert!((out[7].unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn stddev_flat_series_is_zero() {
        let out = stddev(&[4.0; 6], 3, 0);
        for v in &out[2..] {
            assert_eq!(*v, Some(0.0));
        }
    }

    #[test]
    fn stddev_period_one_is_all_none() {
        assert!(stddev(&[1.0, 2.0, 3.0], 1, 0).iter().all(Option::is_none));
    }

    #[test]
    fn stddev_warmup_masks_full_windows() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let out = stddev(&values, 3, 5);
        assert!(out[..4].iter().all(Option::is_none));
        assert!(out[4].is_some());
    }

    #[test]
    fn stddev_non_finite_blanks_window() {
        let out = stddev(&[1.0, 2.0, f64::NAN, 4.0, 5.0, 6.0], 2, 0);
        assert!(out[1].is_some());
        assert!(out[2].is_none());
        assert!(out[3].is_none());
        assert!((out[4].unwrap() - 0.5).abs() < 1e-9);
    }
}
