use crate::descriptor::Descriptor;
use crate::r#type::IndexableFloat;

/// A node of the built tree.
///
/// Leaves own exactly one descriptor; internal nodes record the split axis
/// and the split value. Everything reachable through `left` sits at or below
/// `value` on `axis`, everything through `right` at or above it (a descriptor
/// equal to the median can appear on either side).
#[derive(Debug, Clone, PartialEq)]
pub enum Node<N: IndexableFloat> {
    Leaf(Descriptor<N>),
    Internal {
        axis: usize,
        value: N,
        left: Box<Node<N>>,
        right: Box<Node<N>>,
    },
}

impl<N: IndexableFloat> Node<N> {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }
}

/// An immutable k-d tree over all descriptors of an image catalog.
///
/// Built once through [`KdTreeBuilder`][crate::kdtree::KdTreeBuilder]; owns
/// its descriptors until dropped. Searches take `&self`, so independent
/// queries may run concurrently as long as each carries its own queue.
#[derive(Debug, Clone)]
pub struct KdTree<N: IndexableFloat> {
    pub(crate) root: Node<N>,
    pub(crate) dim: usize,
    pub(crate) len: usize,
    pub(crate) num_images: usize,
}

impl<N: IndexableFloat> KdTree<N> {
    /// The root node, for manual traversal.
    #[inline]
    pub fn root(&self) -> &Node<N> {
        &self.root
    }

    /// The common dimension of the indexed descriptors.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The number of indexed descriptors.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the highest image identifier seen at build time.
    #[inline]
    pub fn num_images(&self) -> usize {
        self.num_images
    }
}
