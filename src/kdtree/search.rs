use crate::bpq::BoundedPriorityQueue;
use crate::distance::squared_euclidean;
use crate::error::{CbirIndexError, Result};
use crate::kdtree::index::{KdTree, Node};
use crate::r#type::IndexableFloat;

/// The axis-aligned box known to contain every descriptor of the subtree
/// currently being visited. Axes without a recorded bound are open.
///
/// One frame per search; the traversal narrows one bound on the way into a
/// child and restores it on the way out.
struct Limits<N: IndexableFloat> {
    low: Vec<N>,
    high: Vec<N>,
    low_used: Vec<bool>,
    high_used: Vec<bool>,
}

impl<N: IndexableFloat> Limits<N> {
    fn new(dim: usize) -> Self {
        Self {
            low: vec![N::zero(); dim],
            high: vec![N::zero(); dim],
            low_used: vec![false; dim],
            high_used: vec![false; dim],
        }
    }

    /// Squared distance from `query` to the nearest point of the box. Zero
    /// when the query lies inside it.
    fn min_squared_distance(&self, query: &[N]) -> N {
        let mut total = N::zero();
        for (axis, &q) in query.iter().enumerate() {
            if self.low_used[axis] && q < self.low[axis] {
                let gap = self.low[axis] - q;
                total = total + gap * gap;
            }
            if self.high_used[axis] && q > self.high[axis] {
                let gap = q - self.high[axis];
                total = total + gap * gap;
            }
        }
        total
    }
}

impl<N: IndexableFloat> KdTree<N> {
    /// Collect the `k` indexed descriptors nearest to `query` into a bounded
    /// priority queue of `(squared distance, image id)` pairs, nearest first.
    ///
    /// Subtrees whose bounding box provably cannot improve on the current
    /// k-th best match are skipped.
    ///
    /// ## Errors
    ///
    /// - If `k` is zero.
    /// - If `query` does not match the tree's dimension.
    pub fn nearest(&self, query: &[N], k: usize) -> Result<BoundedPriorityQueue<N>> {
        self.nearest_impl(query, k, true)
    }

    /// Same contract as [`nearest`][Self::nearest] with the branch pruning
    /// switched off; the exhaustive oracle the pruned search is checked
    /// against.
    #[cfg(test)]
    pub(crate) fn nearest_unpruned(&self, query: &[N], k: usize) -> Result<BoundedPriorityQueue<N>> {
        self.nearest_impl(query, k, false)
    }

    fn nearest_impl(&self, query: &[N], k: usize, prune: bool) -> Result<BoundedPriorityQueue<N>> {
        if query.len() != self.dim {
            return Err(CbirIndexError::InvalidArgument(format!(
                "query dimension {} does not match tree dimension {}",
                query.len(),
                self.dim
            )));
        }
        let mut queue = BoundedPriorityQueue::new(k)?;
        let mut limits = Limits::new(self.dim);
        visit(&self.root, query, &mut queue, &mut limits, prune);
        Ok(queue)
    }
}

fn visit<N: IndexableFloat>(
    node: &Node<N>,
    query: &[N],
    queue: &mut BoundedPriorityQueue<N>,
    limits: &mut Limits<N>,
    prune: bool,
) {
    match node {
        Node::Leaf(descriptor) => {
            queue.enqueue(
                descriptor.image_id(),
                squared_euclidean(query, descriptor.coords()),
            );
        }
        Node::Internal {
            axis,
            value,
            left,
            right,
        } => {
            let (axis, value) = (*axis, *value);

            // Left child: everything at or below the split value.
            let saved = (limits.high[axis], limits.high_used[axis]);
            limits.high[axis] = value;
            limits.high_used[axis] = true;
            if !should_skip(query, queue, limits, prune) {
                visit(left, query, queue, limits, prune);
            }
            (limits.high[axis], limits.high_used[axis]) = saved;

            // Right child: everything at or above it.
            let saved = (limits.low[axis], limits.low_used[axis]);
            limits.low[axis] = value;
            limits.low_used[axis] = true;
            if !should_skip(query, queue, limits, prune) {
                visit(right, query, queue, limits, prune);
            }
            (limits.low[axis], limits.low_used[axis]) = saved;
        }
    }
}

/// A subtree can be skipped once the queue is full and no point of the
/// subtree's box lies closer than the current worst match.
fn should_skip<N: IndexableFloat>(
    query: &[N],
    queue: &BoundedPriorityQueue<N>,
    limits: &Limits<N>,
    prune: bool,
) -> bool {
    prune
        && queue.is_full()
        && queue
            .max_distance()
            .is_some_and(|worst| limits.min_squared_distance(query) >= worst)
}
