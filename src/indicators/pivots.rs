// =============================================================================
// Pivot Point Sets: Classic, Fibonacci, Camarilla
// =============================================================================
//
// All three sets share the central pivot P = (H + L + C) / 3 and differ in
// how the five resistance (R) / support (S) levels are spaced around it.
// Inputs are normally the previous session's high, low and close.

use serde::Serialize;

/// Fibonacci ratios applied to the range for levels 1..=5.
const FIBONACCI_RATIOS: [f64; 5] = [0.382, 0.618, 1.0, 1.272, 1.618];

/// Camarilla divisors for levels 1..=4; level 5 is the full range.
const CAMARILLA_DIVISORS: [f64; 4] = [12.0, 6.0, 4.0, 2.0];
const CAMARILLA_SCALE: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PivotLevels {
    pub p: f64,
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub r4: f64,
    pub r5: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
    pub s4: f64,
    pub s5: f64,
}

impl PivotLevels {
    fn from_offsets(p: f64, anchor: f64, offsets: [f64; 5]) -> Self {
        Self {
            p,
            r1: anchor + offsets[0],
            r2: anchor + offsets[1],
            r3: anchor + offsets[2],
            r4: anchor + offsets[3],
            r5: anchor + offsets[4],
            s1: anchor - offsets[0],
            s2: anchor - offsets[1],
            s3: anchor - offsets[2],
            s4: anchor - offsets[3],
            s5: anchor - offsets[4],
        }
    }
}

/// All three pivot families for one session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PivotSet {
    pub classic: PivotLevels,
    pub fibonacci: PivotLevels,
    pub camarilla: PivotLevels,
}

impl PivotSet {
    pub fn from_hlc(high: f64, low: f64, close: f64) -> Self {
        Self {
            classic: pivots_classic(high, low, close),
            fibonacci: pivots_fibonacci(high, low, close),
            camarilla: pivots_camarilla(high, low, close),
        }
    }
}

fn central_pivot(high: f64, low: f64, close: f64) -> f64 {
    (high + low + close) / 3.0
}

pub fn pivots_classic(high: f64, low: f64, close: f64) -> PivotLevels {
    let p = central_pivot(high, low, close);
    let range = high - low;

    let r1 = 2.0 * p - low;
    let s1 = 2.0 * p - high;
    let r2 = p + range;
    let s2 = p - range;
    let r3 = high + 2.0 * (p - low);
    let s3 = low - 2.0 * (high - p);
    let r4 = r3 + range;
    let s4 = s3 - range;

    PivotLevels {
        p,
        r1,
        r2,
        r3,
        r4,
        r5: r4 + range,
        s1,
        s2,
        s3,
        s4,
        s5: s4 - range,
    }
}

pub fn pivots_fibonacci(high: f64, low: f64, close: f64) -> PivotLevels {
    let p = central_pivot(high, low, close);
    let range = high - low;
    PivotLevels::from_offsets(p, p, FIBONACCI_RATIOS.map(|ratio| ratio * range))
}

pub fn pivots_camarilla(high: f64, low: f64, close: f64) -> PivotLevels {
    let p = central_pivot(high, low, close);
    let range = high - low;
    let [d1, d2, d3, d4] = CAMARILLA_DIVISORS.map(|div| range * CAMARILLA_SCALE / div);
    PivotLevels::from_offsets(p, close, [d1, d2, d3, d4, range])
}
