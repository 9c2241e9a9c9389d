//! The distance metric used for descriptor matching and branch pruning.

use crate::r#type::IndexableFloat;

/// Returns the squared euclidean distance between two points.
///
/// Faster than euclidean distance due to not needing a square root, but still
/// preserves the same distance ordering, which is all the nearest-neighbour
/// search relies on.
///
/// # Examples
///
/// ```rust
/// use cbir_index::distance::squared_euclidean;
///
/// assert_eq!(0f64, squared_euclidean(&[0f64, 0f64], &[0f64, 0f64]));
/// assert_eq!(1f64, squared_euclidean(&[0f64, 0f64], &[1f64, 0f64]));
/// assert_eq!(2f64, squared_euclidean(&[0f64, 0f64], &[1f64, 1f64]));
/// ```
#[inline]
pub fn squared_euclidean<N: IndexableFloat>(a: &[N], b: &[N]) -> N {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(&a_val, &b_val)| (a_val - b_val) * (a_val - b_val))
        .fold(N::zero(), |acc, term| acc + term)
}
