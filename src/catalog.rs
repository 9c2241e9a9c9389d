//! Per-image descriptor sets and their concatenation into the tree's build
//! input.

use tracing::info;

use crate::config::Config;
use crate::descriptor::Descriptor;
use crate::error::{CbirIndexError, Result};
use crate::feats;
use crate::r#type::IndexableFloat;

/// The descriptor sets of a whole image catalog, image id = position.
///
/// The boundary between the external feature extractor and the index: the
/// extractor (or the feature-cache loader) fills it one image at a time, the
/// tree builder consumes it.
#[derive(Debug, Clone, Default)]
pub struct Catalog<N: IndexableFloat> {
    images: Vec<Vec<Descriptor<N>>>,
    dim: Option<usize>,
}

impl<N: IndexableFloat> Catalog<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the descriptor set of the next image and return its id.
    ///
    /// ## Errors
    ///
    /// - If `descriptors` is empty.
    /// - If a descriptor's dimension differs from the catalog's.
    /// - If a descriptor carries an image id other than the one being
    ///   assigned.
    pub fn push_image(&mut self, descriptors: Vec<Descriptor<N>>) -> Result<usize> {
        let image_id = self.images.len();
        let Some(first) = descriptors.first() else {
            return Err(CbirIndexError::InvalidArgument(format!(
                "image {image_id} has no descriptors"
            )));
        };
        let dim = *self.dim.get_or_insert(first.dim());
        for descriptor in &descriptors {
            if descriptor.dim() != dim {
                return Err(CbirIndexError::InvalidArgument(format!(
                    "image {image_id} holds a descriptor of dimension {}, catalog uses {dim}",
                    descriptor.dim()
                )));
            }
            if descriptor.image_id() != image_id {
                return Err(CbirIndexError::InvalidArgument(format!(
                    "descriptor tagged with image {} pushed as image {image_id}",
                    descriptor.image_id()
                )));
            }
        }
        self.images.push(descriptors);
        Ok(image_id)
    }

    /// Load every image's feature-cache file named by `config`.
    pub fn load(config: &Config) -> Result<Self> {
        let mut catalog = Self::new();
        for index in 0..config.num_images {
            let path = config.features_path(index)?;
            let descriptors = feats::load_features(&path, index, config.pca_dimension)?;
            info!(image = index, count = descriptors.len(), "loaded feature cache");
            catalog.push_image(descriptors)?;
        }
        Ok(catalog)
    }

    /// The number of images added so far.
    #[inline]
    pub fn num_images(&self) -> usize {
        self.images.len()
    }

    /// The total descriptor count across all images.
    pub fn num_descriptors(&self) -> usize {
        self.images.iter().map(Vec::len).sum()
    }

    /// The catalog's descriptor dimension; `None` until an image is added.
    #[inline]
    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// The descriptor set of one image.
    pub fn image(&self, image_id: usize) -> Option<&[Descriptor<N>]> {
        self.images.get(image_id).map(Vec::as_slice)
    }

    /// Iterate over the per-image descriptor sets in id order.
    pub fn iter(&self) -> impl Iterator<Item = &[Descriptor<N>]> {
        self.images.iter().map(Vec::as_slice)
    }

    /// Concatenate all descriptor sets in image order.
    pub fn into_descriptors(self) -> Vec<Descriptor<N>> {
        self.images.into_iter().flatten().collect()
    }
}
