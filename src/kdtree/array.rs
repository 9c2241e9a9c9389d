use std::cmp::Ordering;

use crate::descriptor::Descriptor;
use crate::error::{CbirIndexError, Result};
use crate::r#type::IndexableFloat;

/// A set of descriptors of common dimension, ordered once per axis.
///
/// For each axis the array keeps a permutation of `0..n` sorting the
/// descriptors ascending by that axis's coordinate (ties by original index).
/// A median split hands each half down with all of its per-axis orders
/// intact, so the tree build sorts only once, at the root.
///
/// Build-time transient: the tree build consumes it and none of it survives
/// into the finished tree.
#[derive(Debug)]
pub struct KdArray<N: IndexableFloat> {
    descriptors: Vec<Descriptor<N>>,
    /// One row per axis; row `a` sorts `descriptors` ascending by axis `a`.
    sorted: Vec<Vec<u32>>,
    dim: usize,
}

impl<N: IndexableFloat> KdArray<N> {
    /// Build the per-axis sort permutations over `descriptors`.
    ///
    /// ## Errors
    ///
    /// - If `descriptors` is empty.
    /// - If the descriptors do not all share one dimension.
    pub fn build(descriptors: Vec<Descriptor<N>>) -> Result<Self> {
        let Some(first) = descriptors.first() else {
            return Err(CbirIndexError::InvalidArgument(
                "cannot build a kd-array over zero descriptors".to_string(),
            ));
        };
        let dim = first.dim();
        if let Some(mismatch) = descriptors.iter().find(|p| p.dim() != dim) {
            return Err(CbirIndexError::InvalidArgument(format!(
                "descriptor dimension mismatch: expected {dim}, got {}",
                mismatch.dim()
            )));
        }

        let n = descriptors.len() as u32;
        let sorted = (0..dim)
            .map(|axis| {
                let mut order: Vec<u32> = (0..n).collect();
                // Stable by construction: ties keep ascending original index.
                order.sort_by(|&a, &b| {
                    descriptors[a as usize]
                        .coord(axis)
                        .partial_cmp(&descriptors[b as usize].coord(axis))
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| a.cmp(&b))
                });
                order
            })
            .collect();

        Ok(Self {
            descriptors,
            sorted,
            dim,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn descriptor(&self, index: usize) -> &Descriptor<N> {
        &self.descriptors[index]
    }

    /// The permutation sorting the descriptors ascending on `axis`.
    #[inline]
    pub fn sorted_indices(&self, axis: usize) -> &[u32] {
        &self.sorted[axis]
    }

    /// The coordinate spread covered on `axis`.
    pub fn spread(&self, axis: usize) -> N {
        let order = &self.sorted[axis];
        let lowest = self.descriptors[order[0] as usize].coord(axis);
        let highest = self.descriptors[order[order.len() - 1] as usize].coord(axis);
        highest - lowest
    }

    /// The coordinate the tree records when splitting on `axis`: the value of
    /// the last element that lands on the left side.
    pub fn split_value(&self, axis: usize) -> N {
        let order = &self.sorted[axis];
        let median = order[(order.len() - 1) / 2] as usize;
        self.descriptors[median].coord(axis)
    }

    /// Split around the median of `split_axis` into a left array holding the
    /// `⌈n/2⌉` smallest entries on that axis and a right array holding the
    /// rest. Ties follow the stable build order, so the partition is
    /// deterministic.
    ///
    /// Every per-axis permutation of both halves is derived from the parent's
    /// without re-sorting.
    ///
    /// ## Errors
    ///
    /// - If the array holds fewer than two descriptors.
    /// - If `split_axis` is out of range.
    pub fn split(self, split_axis: usize) -> Result<(Self, Self)> {
        let n = self.descriptors.len();
        if n < 2 {
            return Err(CbirIndexError::InvalidArgument(
                "cannot split a kd-array of fewer than two descriptors".to_string(),
            ));
        }
        if split_axis >= self.dim {
            return Err(CbirIndexError::InvalidArgument(format!(
                "split axis {split_axis} out of range for dimension {}",
                self.dim
            )));
        }

        let n_left = n.div_ceil(2);

        // Position of every original index in the split-axis order; the first
        // n_left positions go left.
        let mut position = vec![0usize; n];
        for (at, &original) in self.sorted[split_axis].iter().enumerate() {
            position[original as usize] = at;
        }

        // Each original index's slot in its side, assigned in ascending
        // original order.
        let mut new_index = vec![0u32; n];
        let (mut next_left, mut next_right) = (0u32, 0u32);
        for (original, slot) in new_index.iter_mut().enumerate() {
            if position[original] < n_left {
                *slot = next_left;
                next_left += 1;
            } else {
                *slot = next_right;
                next_right += 1;
            }
        }

        // Walk each parent permutation in order, translating indices; the
        // relative order inside each side is untouched.
        let mut left_sorted: Vec<Vec<u32>> =
            (0..self.dim).map(|_| Vec::with_capacity(n_left)).collect();
        let mut right_sorted: Vec<Vec<u32>> = (0..self.dim)
            .map(|_| Vec::with_capacity(n - n_left))
            .collect();
        for axis in 0..self.dim {
            for &original in &self.sorted[axis] {
                if position[original as usize] < n_left {
                    left_sorted[axis].push(new_index[original as usize]);
                } else {
                    right_sorted[axis].push(new_index[original as usize]);
                }
            }
        }

        let mut left_descriptors = Vec::with_capacity(n_left);
        let mut right_descriptors = Vec::with_capacity(n - n_left);
        for (original, descriptor) in self.descriptors.into_iter().enumerate() {
            if position[original] < n_left {
                left_descriptors.push(descriptor);
            } else {
                right_descriptors.push(descriptor);
            }
        }

        let left = Self {
            descriptors: left_descriptors,
            sorted: left_sorted,
            dim: self.dim,
        };
        let right = Self {
            descriptors: right_descriptors,
            sorted: right_sorted,
            dim: self.dim,
        };
        Ok((left, right))
    }

    pub(crate) fn into_descriptors(self) -> Vec<Descriptor<N>> {
        self.descriptors
    }
}
