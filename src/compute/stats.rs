//! Dispersion statistics over scalar samples.
//!
//! All functions accept an empty slice and return `0.0` for it. The weighting
//! step reads a zero dispersion as "no information" and substitutes a unit
//! value, so empty columns never collapse a dimension.

use std::collections::BTreeMap;

/// Arithmetic mean.
pub fn average(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f32>() / data.len() as f32
}

/// Largest sample minus smallest sample.
pub fn range(data: &[f32]) -> f32 {
    let Some(&first) = data.first() else {
        return 0.0;
    };
    let max = data.iter().copied().fold(first, f32::max);
    let min = data.iter().copied().fold(first, f32::min);
    max - min
}

/// Inner quartile range using a half-split convention.
///
/// With `half = n / 2`: when `half` is odd the quartiles are single elements
/// of the two halves, otherwise adjacent pairs are averaged. This is not the
/// textbook quartile method. Fewer than two samples yield `0.0`.
pub fn inner_quartile_range(data: &[f32]) -> f32 {
    let n = data.len();
    if n < 2 {
        return 0.0;
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(f32::total_cmp);

    let half = n / 2;
    let quarter = half / 2;
    let (q1, q3) = if half % 2 == 1 {
        (sorted[quarter], sorted[n - quarter - 1])
    } else {
        (
            (sorted[quarter] + sorted[quarter - 1]) / 2.0,
            (sorted[n - quarter] + sorted[n - 1 - quarter]) / 2.0,
        )
    };
    q3 - q1
}

/// Mean of absolute deviations from the mean.
pub fn mean_absolute_deviation(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    let avg = average(data);
    data.iter().map(|x| (x - avg).abs()).sum::<f32>() / data.len() as f32
}

/// Population variance (divisor `n`).
pub fn variance(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    let avg = average(data);
    data.iter().map(|x| (x - avg).powi(2)).sum::<f32>() / data.len() as f32
}

/// Square root of the population variance.
pub fn standard_deviation(data: &[f32]) -> f32 {
    variance(data).sqrt()
}

/// Shannon entropy (bits) of the exact values in `data`.
///
/// Values are grouped by exact equality, not by histogram bins.
pub fn entropy(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }

    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for &value in data {
        // +0.0 and -0.0 compare equal
        let key = if value == 0.0 { 0 } else { value.to_bits() };
        *counts.entry(key).or_insert(0) += 1;
    }

    let n = data.len() as f32;
    -counts
        .values()
        .map(|&count| {
            let p = count as f32 / n;
            p * p.log2()
        })
        .sum::<f32>()
}

/// Divide every element by the sum of all elements.
///
/// Returns `None` when the sum is zero or not finite.
pub fn normalize(data: &[f32]) -> Option<Vec<f32>> {
    let sum: f32 = data.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return None;
    }
    Some(data.iter().map(|value| value / sum).collect())
}
