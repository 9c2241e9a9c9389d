use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::debug;

use crate::catalog::Catalog;
use crate::descriptor::Descriptor;
use crate::error::Result;
use crate::kdtree::array::KdArray;
use crate::kdtree::index::{KdTree, Node};
use crate::r#type::IndexableFloat;

/// The rule picking the split axis at each internal node during the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMethod {
    /// Cycle through the axes, one per tree level, starting at axis 0.
    Incremental,
    /// Draw the axis uniformly from a seeded generator.
    Random,
    /// The axis whose coordinates cover the widest range; ties break to the
    /// lowest axis.
    #[default]
    MaxSpread,
}

/// A builder to create a [`KdTree`].
///
/// Collect the catalog's descriptors (directly, per image, or from a
/// [`Catalog`]), then call [`finish`][Self::finish].
#[derive(Debug, Default)]
pub struct KdTreeBuilder<N: IndexableFloat> {
    descriptors: Vec<Descriptor<N>>,
    split_method: SplitMethod,
    seed: u64,
}

impl<N: IndexableFloat> KdTreeBuilder<N> {
    /// Create a builder with the default split method and seed 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder expecting around `n` descriptors.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            descriptors: Vec::with_capacity(n),
            ..Self::default()
        }
    }

    /// Set the split-axis selection rule.
    pub fn split_method(mut self, split_method: SplitMethod) -> Self {
        self.split_method = split_method;
        self
    }

    /// Seed the generator behind [`SplitMethod::Random`]. Builds with the
    /// same seed and input produce identical trees.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Add a single descriptor.
    pub fn push(&mut self, descriptor: Descriptor<N>) {
        self.descriptors.push(descriptor);
    }

    /// Add one image's descriptors from raw coordinate rows.
    ///
    /// ## Errors
    ///
    /// - If any row is empty.
    pub fn add_image<I>(&mut self, image_id: usize, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = Vec<N>>,
    {
        for row in rows {
            self.descriptors.push(Descriptor::new(image_id, row)?);
        }
        Ok(())
    }

    /// Move every descriptor of `catalog` into the builder.
    pub fn extend_from_catalog(&mut self, catalog: Catalog<N>) {
        self.descriptors.extend(catalog.into_descriptors());
    }

    /// Consume the builder, producing a tree ready for queries.
    ///
    /// ## Errors
    ///
    /// - If no descriptors were added.
    /// - If the descriptors do not all share one dimension.
    pub fn finish(self) -> Result<KdTree<N>> {
        let len = self.descriptors.len();
        let num_images = self
            .descriptors
            .iter()
            .map(|p| p.image_id())
            .max()
            .map_or(0, |highest| highest + 1);

        let array = KdArray::build(self.descriptors)?;
        let dim = array.dim();
        debug!(
            descriptors = len,
            dim,
            num_images,
            method = ?self.split_method,
            "building descriptor tree"
        );

        let mut rng = StdRng::seed_from_u64(self.seed);
        // Seeding the incremental cycle with the last axis makes the root
        // split on axis 0.
        let root = build_node(array, self.split_method, dim - 1, &mut rng)?;

        Ok(KdTree {
            root,
            dim,
            len,
            num_images,
        })
    }
}

fn build_node<N: IndexableFloat>(
    array: KdArray<N>,
    split_method: SplitMethod,
    prev_axis: usize,
    rng: &mut StdRng,
) -> Result<Node<N>> {
    if array.len() == 1 {
        return Ok(Node::Leaf(array.into_descriptors().swap_remove(0)));
    }

    let dim = array.dim();
    let axis = match split_method {
        SplitMethod::Incremental => (prev_axis + 1) % dim,
        SplitMethod::Random => rng.gen_range(0..dim),
        SplitMethod::MaxSpread => {
            let mut axis = 0;
            let mut widest = array.spread(0);
            for candidate in 1..dim {
                let spread = array.spread(candidate);
                if spread > widest {
                    axis = candidate;
                    widest = spread;
                }
            }
            axis
        }
    };

    let value = array.split_value(axis);
    let (left, right) = array.split(axis)?;
    Ok(Node::Internal {
        axis,
        value,
        left: Box::new(build_node(left, split_method, axis, rng)?),
        right: Box::new(build_node(right, split_method, axis, rng)?),
    })
}
