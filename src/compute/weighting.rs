//! Per-dimension distance weights derived from behavior dispersion.
//!
//! Dimensions that rarely vary receive the largest weights: each dimension's
//! dispersion is sum-normalized, inverted, and sum-normalized again.

use super::stats;
use crate::schema::DispersionMethod;

impl DispersionMethod {
    /// The statistic this method selects.
    pub fn function(self) -> fn(&[f32]) -> f32 {
        match self {
            DispersionMethod::Entropy => stats::entropy,
            DispersionMethod::StandardDeviation => stats::standard_deviation,
            DispersionMethod::MeanAbsoluteDeviation => stats::mean_absolute_deviation,
            DispersionMethod::InnerQuartileRange => stats::inner_quartile_range,
            DispersionMethod::Range => stats::range,
            DispersionMethod::Variance => stats::variance,
        }
    }

    /// Evaluate the selected statistic over `data`.
    #[inline]
    pub fn measure(self, data: &[f32]) -> f32 {
        (self.function())(data)
    }
}

/// Compute one weight per behavior dimension.
///
/// Only the first `dimensions` components of each descriptor are weighted.
/// An empty collection yields unit weights. If a normalization step has a
/// zero or non-finite sum the weights fall back to uniform `1 / dimensions`.
pub fn component_weights<'a, I>(
    descriptors: I,
    dimensions: usize,
    method: DispersionMethod,
) -> Vec<f32>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut columns: Vec<Vec<f32>> = vec![Vec::new(); dimensions];
    let mut any = false;
    for descriptor in descriptors {
        any = true;
        for (column, &value) in columns.iter_mut().zip(descriptor) {
            column.push(value);
        }
    }

    if !any {
        return vec![1.0; dimensions];
    }

    let dispersion: Vec<f32> = columns
        .iter()
        .map(|column| {
            let value = method.measure(column);
            // Constant or single-sample dimension
            if value == 0.0 { 1.0 } else { value }
        })
        .collect();

    let uniform = || vec![1.0 / dimensions as f32; dimensions];

    let Some(normalized) = stats::normalize(&dispersion) else {
        return uniform();
    };
    let inverted: Vec<f32> = normalized.iter().map(|value| 1.0 / value).collect();
    stats::normalize(&inverted).unwrap_or_else(uniform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn weights_of(descriptors: &[Vec<f32>], method: DispersionMethod) -> Vec<f32> {
        component_weights(descriptors.iter().map(Vec::as_slice), 4, method)
    }

    #[test]
    fn test_empty_collection_gives_unit_weights() {
        let weights = weights_of(&[], DispersionMethod::Entropy);
        assert_eq!(weights, vec![1.0; 4]);
    }

    #[test]
    fn test_single_item_gives_uniform_weights() {
        let weights = weights_of(&[vec![3.0, 4.0, 3.0, 4.0]], DispersionMethod::Entropy);
        for w in weights {
            assert!((w - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn test_low_dispersion_dimension_weighted_higher() {
        let descriptors = vec![vec![0.0, 0.0, 0.0, 0.0], vec![2.0, 1.0, 1.0, 1.0]];
        let weights = weights_of(&descriptors, DispersionMethod::Variance);

        // Variances [1, 0.25, 0.25, 0.25] -> weights [1/13, 4/13, 4/13, 4/13]
        assert!((weights[0] - 1.0 / 13.0).abs() < 1e-5);
        assert!((weights[1] - 4.0 / 13.0).abs() < 1e-5);
        assert!(weights[0] < weights[1]);
        assert!((weights.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_extra_components_ignored() {
        let descriptors = vec![vec![0.0, 0.0, 0.0, 0.0, 100.0], vec![0.0, 0.0, 0.0, 0.0, -5.0]];
        let weights = weights_of(&descriptors, DispersionMethod::Range);
        assert_eq!(weights.len(), 4);
    }

    #[test]
    fn test_short_descriptors_fall_back_to_unit_dispersion() {
        let descriptors = vec![vec![0.0, 1.0], vec![2.0, 5.0]];
        let weights = weights_of(&descriptors, DispersionMethod::Range);
        assert_eq!(weights.len(), 4);
        assert!(weights.iter().all(|w| w.is_finite() && *w > 0.0));
        assert!((weights.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_non_finite_dispersion_falls_back_to_uniform() {
        let descriptors = vec![vec![f32::NAN, 0.0, 0.0, 0.0], vec![1.0, 0.0, 0.0, 0.0]];
        let weights = weights_of(&descriptors, DispersionMethod::Variance);
        assert_eq!(weights, vec![0.25; 4]);
    }

    #[test]
    fn test_method_dispatch() {
        let data = [1.0, 1.0, 2.0, 3.0];
        assert_eq!(DispersionMethod::Entropy.measure(&data), stats::entropy(&data));
        assert_eq!(DispersionMethod::Range.measure(&data), 2.0);
        assert_eq!(
            DispersionMethod::InnerQuartileRange.measure(&data),
            stats::inner_quartile_range(&data)
        );
    }

    proptest! {
        #[test]
        fn prop_weights_sum_to_one_without_zeros(
            descriptors in prop::collection::vec(
                prop::collection::vec(-50.0f32..50.0, 4),
                1..32,
            ),
            code in 1u8..=6,
        ) {
            let method = DispersionMethod::try_from(code).unwrap();
            let weights = weights_of(&descriptors, method);
            prop_assert_eq!(weights.len(), 4);
            prop_assert!(weights.iter().all(|w| *w > 0.0 && w.is_finite()));
            prop_assert!((weights.iter().sum::<f32>() - 1.0).abs() < 1e-4);
        }
    }
}
