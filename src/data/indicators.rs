//! Derived indicators over labeled arrays.
//!
//! All functions are pure: they take arrays by reference and return new
//! ones. `NaN` propagates through every arithmetic step.

use super::array::LabeledArray;
use crate::error::{PipelineError, Result};

/// Energy labels counted as fossil fuels (no coal-equivalent conversion).
pub const FOSSIL: &[&str] = &["COL", "GAS", "OIL"];

/// Non-fossil electricity labels converted to coal equivalent.
pub const NONFOSSIL: &[&str] = &["NUC", "WND", "SOL", "HYD"];

/// Values at or above this magnitude are the model's "undefined" marker.
pub const SPECIAL_VALUE: f64 = 1e300;

/// Average annual growth rate in percent between consecutive steps of `axis`.
///
/// The rate for step `k` is `((a[k+1] / a[k]) ^ (1 / period) - 1) * 100`,
/// labeled at `k`. The last step has no successor and is `NaN`.
///
/// # Errors
///
/// Returns `MissingAxis` if `axis` does not exist.
pub fn growth_rate(a: &LabeledArray, axis: &str, period: f64) -> Result<LabeledArray> {
    a.map_lanes(axis, |src, mut dst| {
        let n = src.len();
        for k in 0..n {
            dst[k] = if k + 1 < n {
                ((src[k + 1] / src[k]).powf(1.0 / period) - 1.0) * 100.0
            } else {
                f64::NAN
            };
        }
    })
}

/// Percent change of every case relative to `baseline` on the `case` axis.
///
/// The baseline itself is exactly 0 wherever its value is finite and
/// non-zero.
///
/// # Errors
///
/// Returns `MissingAxis` or `LabelNotFound` if the baseline cannot be
/// selected.
pub fn delta_vs_baseline(a: &LabeledArray, baseline: &str) -> Result<LabeledArray> {
    let base = a.sel("case", baseline)?;
    a.zip_with(&base, |v, b| (v / b - 1.0) * 100.0)
}

/// `part / total * 100`.
///
/// # Errors
///
/// See [`LabeledArray::zip_with`].
pub fn share(part: &LabeledArray, total: &LabeledArray) -> Result<LabeledArray> {
    part.zip_with(total, |p, t| p / t * 100.0)
}

/// Multiplies every slice of `axis` by the factor `factor_for(label)`.
///
/// # Errors
///
/// Returns `MissingAxis` if `axis` does not exist.
pub fn convert_energy(
    a: &LabeledArray,
    axis: &str,
    factor_for: impl Fn(&str) -> f64,
) -> Result<LabeledArray> {
    let factors: Vec<f64> = a.labels(axis)?.iter().map(|l| factor_for(l)).collect();
    a.map_lanes(axis, |src, mut dst| {
        for ((d, s), f) in dst.iter_mut().zip(src.iter()).zip(&factors) {
            *d = s * f;
        }
    })
}

/// Coal-equivalent factor of an energy label: 1 for fossil fuels,
/// `nonfossil_factor` otherwise.
pub fn coal_equivalent(label: &str, nonfossil_factor: f64) -> f64 {
    if FOSSIL.contains(&label) {
        1.0
    } else {
        nonfossil_factor
    }
}

/// Replaces the model's special values (`>= 1e300`, `NaN`) with 0.
pub fn zero_special(a: &LabeledArray) -> LabeledArray {
    a.map(|v| if v.is_nan() || v >= SPECIAL_VALUE { 0.0 } else { v })
}

/// Renders the digits 2 and 3 as subscripts (`SO2` → `SO₂`).
pub fn subscript_digits(label: &str) -> String {
    label
        .chars()
        .map(|c| match c {
            '2' => '₂',
            '3' => '₃',
            other => other,
        })
        .collect()
}

/// Fills a series in place from two known points on a year axis.
///
/// Steps before `from` copy the value at `from`; steps strictly between
/// `from` and `to` are interpolated linearly by year. Steps after `to` are
/// left untouched.
///
/// # Errors
///
/// Returns `MissingAxis`/`LabelNotFound` if the axis or either endpoint is
/// absent, and `Shape` if an axis label is not an integer year.
pub fn interpolate_years(a: &LabeledArray, axis: &str, from: &str, to: &str) -> Result<LabeledArray> {
    let labels = a.labels(axis)?;
    let years = labels
        .iter()
        .map(|l| parse_year(l))
        .collect::<Result<Vec<i32>>>()?;
    let position = |label: &str| {
        labels
            .iter()
            .position(|l| l == label)
            .ok_or_else(|| PipelineError::LabelNotFound {
                axis: axis.to_string(),
                label: label.to_string(),
            })
    };
    let (i0, i1) = (position(from)?, position(to)?);
    let (y0, y1) = (f64::from(years[i0]), f64::from(years[i1]));

    a.map_lanes(axis, |src, mut dst| {
        let (v0, v1) = (src[i0], src[i1]);
        for (k, &year) in years.iter().enumerate() {
            let y = f64::from(year);
            dst[k] = if y < y0 {
                v0
            } else if y > y0 && y < y1 {
                v0 + (v1 - v0) * (y - y0) / (y1 - y0)
            } else {
                src[k]
            };
        }
    })
}

/// Parses a time label as an integer year.
///
/// # Errors
///
/// Returns `Shape` if the label is not an integer.
pub fn parse_year(label: &str) -> Result<i32> {
    label
        .trim()
        .parse()
        .map_err(|_| PipelineError::Shape(format!("time label `{label}` is not a year")))
}
