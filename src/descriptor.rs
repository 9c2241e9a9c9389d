use crate::distance::squared_euclidean;
use crate::error::{CbirIndexError, Result};
use crate::r#type::IndexableFloat;

/// A feature point extracted from a catalog or query image.
///
/// Immutable after creation: a fixed-dimension coordinate vector tagged with
/// the identifier of the image it was extracted from. Catalog descriptors are
/// owned by the tree once it is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor<N: IndexableFloat> {
    image_id: usize,
    coords: Box<[N]>,
}

impl<N: IndexableFloat> Descriptor<N> {
    /// Create a descriptor from an image identifier and its coordinates.
    ///
    /// ## Errors
    ///
    /// - If `coords` is empty.
    pub fn new(image_id: usize, coords: impl Into<Box<[N]>>) -> Result<Self> {
        let coords = coords.into();
        if coords.is_empty() {
            return Err(CbirIndexError::InvalidArgument(
                "descriptor must have at least one coordinate".to_string(),
            ));
        }
        Ok(Self { image_id, coords })
    }

    /// The dimension of this descriptor.
    #[inline]
    pub fn dim(&self) -> usize {
        self.coords.len()
    }

    /// The identifier of the image this descriptor was extracted from.
    #[inline]
    pub fn image_id(&self) -> usize {
        self.image_id
    }

    /// The coordinate on `axis`. Panics if `axis >= dim()`.
    #[inline]
    pub fn coord(&self, axis: usize) -> N {
        self.coords[axis]
    }

    /// All coordinates, in axis order.
    #[inline]
    pub fn coords(&self) -> &[N] {
        &self.coords
    }

    /// Squared L2 distance to `other`. Both descriptors must share a
    /// dimension.
    #[inline]
    pub fn squared_l2(&self, other: &Self) -> N {
        squared_euclidean(&self.coords, &other.coords)
    }
}
