//! Distance functions between behavior descriptors.

/// Distance between two behaviors under per-dimension weights.
///
/// Arguments are `(archived, candidate, weights)`. The weight vector follows
/// the dimension order of the flattened behavior.
pub type DistanceFn = Box<dyn Fn(&[Vec<f32>], &[Vec<f32>], &[f32]) -> f32 + Send + Sync>;

/// Weighted Euclidean distance over the flattened behaviors.
///
/// Components past the end of `weights` use weight `1.0`. Extra components in
/// the longer behavior are ignored.
pub fn weighted_euclidean(a: &[Vec<f32>], b: &[Vec<f32>], weights: &[f32]) -> f32 {
    weighted_terms(a, b, weights, |diff| diff * diff).sqrt()
}

/// Weighted Manhattan (L1) distance over the flattened behaviors.
pub fn weighted_manhattan(a: &[Vec<f32>], b: &[Vec<f32>], weights: &[f32]) -> f32 {
    weighted_terms(a, b, weights, f32::abs)
}

fn weighted_terms(
    a: &[Vec<f32>],
    b: &[Vec<f32>],
    weights: &[f32],
    term: impl Fn(f32) -> f32,
) -> f32 {
    a.iter()
        .flatten()
        .zip(b.iter().flatten())
        .enumerate()
        .map(|(i, (x, y))| weights.get(i).copied().unwrap_or(1.0) * term(x - y))
        .sum()
}
