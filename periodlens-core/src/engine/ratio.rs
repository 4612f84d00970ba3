//! Difference, relative change and per-active-day normalization.
//!
//! Ratios are percent numbers: 12.5 means +12.5%.

use serde::{Deserialize, Serialize};

/// Decimal places kept on ratio values.
pub const RATIO_DECIMALS: i32 = 2;

/// What a relative change reports when the baseline is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroBaselinePolicy {
    /// Report 0%.
    Zero,
    /// Report "no value".
    #[default]
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Percent(f64),
    Undefined,
}

pub fn compute_diff(current: f64, baseline: f64) -> f64 {
    current - baseline
}

/// `(current / baseline - 1) * 100`, rounded to `RATIO_DECIMALS`.
pub fn compute_ratio(current: f64, baseline: f64, policy: ZeroBaselinePolicy) -> Ratio {
    if baseline == 0.0 {
        return match policy {
            ZeroBaselinePolicy::Zero => Ratio::Percent(0.0),
            ZeroBaselinePolicy::Undefined => Ratio::Undefined,
        };
    }
    let pct = (current - baseline) / baseline * 100.0;
    if pct.is_finite() {
        Ratio::Percent(round_to(pct, RATIO_DECIMALS))
    } else {
        Ratio::Undefined
    }
}

/// Per-active-day value; 0 when the period had no active days.
pub fn normalize(raw: f64, active_days: usize) -> f64 {
    if active_days == 0 {
        0.0
    } else {
        raw / active_days as f64
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    let rounded = (value * scale).round() / scale;
    // Avoid printing "-0".
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_is_percent_change() {
        assert_eq!(compute_ratio(150.0, 100.0, ZeroBaselinePolicy::Undefined), Ratio::Percent(50.0));
        assert_eq!(compute_ratio(0.0, 100.0, ZeroBaselinePolicy::Undefined), Ratio::Percent(-100.0));
        assert_eq!(compute_ratio(1.0, 3.0, ZeroBaselinePolicy::Zero), Ratio::Percent(-66.67));
    }

    #[test]
    fn zero_baseline_follows_policy() {
        assert_eq!(compute_ratio(5.0, 0.0, ZeroBaselinePolicy::Undefined), Ratio::Undefined);
        assert_eq!(compute_ratio(5.0, 0.0, ZeroBaselinePolicy::Zero), Ratio::Percent(0.0));
        assert_eq!(compute_ratio(0.0, 0.0, ZeroBaselinePolicy::Zero), Ratio::Percent(0.0));
    }

    #[test]
    fn diff_and_normalize() {
        assert_eq!(compute_diff(3.0, 5.0), -2.0);
        assert_eq!(normalize(30.0, 3), 10.0);
        assert_eq!(normalize(30.0, 0), 0.0);
    }

    #[test]
    fn rounding_never_yields_negative_zero() {
        let r = round_to(-0.001, 2);
        assert!(r == 0.0 && r.is_sign_positive());
        assert_eq!(round_to(2.345678, 2), 2.35);
    }
}
