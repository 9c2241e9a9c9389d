//! Ranked image search: one bounded k-NN pass per query descriptor, then
//! de-duplicated per-image voting.

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use tracing::debug;

use crate::bpq::BoundedPriorityQueue;
use crate::descriptor::Descriptor;
use crate::error::{CbirIndexError, Result};
use crate::kdtree::KdTree;
use crate::r#type::IndexableFloat;

/// Rank the `m` catalog images most similar to the query image described by
/// `queries`.
///
/// Every query descriptor contributes at most one vote to any catalog image,
/// no matter how many of its `k` nearest matches that image holds. Images
/// are ranked by descending vote count, ties to the lowest image id; if
/// fewer than `m` images received votes the tail is padded with the
/// lowest-index unranked ids, ascending.
///
/// ## Errors
///
/// - If `queries` is empty, or `k`, `m` or `num_images` is zero.
/// - If `m` exceeds `num_images`.
/// - If a query descriptor does not match the tree's dimension.
/// - If an indexed descriptor carries an image id at or above `num_images`.
pub fn find_similar<N: IndexableFloat>(
    tree: &KdTree<N>,
    queries: &[Descriptor<N>],
    k: usize,
    m: usize,
    num_images: usize,
) -> Result<Vec<usize>> {
    if queries.is_empty() {
        return Err(CbirIndexError::InvalidArgument(
            "query descriptor set is empty".to_string(),
        ));
    }
    if k == 0 || m == 0 || num_images == 0 {
        return Err(CbirIndexError::InvalidArgument(
            "k, m and the image count must all be positive".to_string(),
        ));
    }
    if m > num_images {
        return Err(CbirIndexError::InvalidArgument(format!(
            "cannot rank {m} images out of a catalog of {num_images}"
        )));
    }
    debug!(
        queries = queries.len(),
        k, m, num_images, "running similarity search"
    );

    let queues = search_all(tree, queries, k)?;

    let mut votes = vec![0u32; num_images];
    let mut last_seen: Vec<Option<usize>> = vec![None; num_images];
    for (i, queue) in queues.into_iter().enumerate() {
        for neighbour in queue {
            let image_id = neighbour.image_id;
            if image_id >= num_images {
                return Err(CbirIndexError::InvalidArgument(format!(
                    "image id {image_id} out of range for a catalog of {num_images} images"
                )));
            }
            if last_seen[image_id] != Some(i) {
                votes[image_id] += 1;
                last_seen[image_id] = Some(i);
            }
        }
    }

    let mut ranking: Vec<usize> = (0..num_images).collect();
    ranking.sort_by(|&a, &b| votes[b].cmp(&votes[a]).then_with(|| a.cmp(&b)));
    ranking.truncate(m);
    Ok(ranking)
}

#[cfg(not(feature = "rayon"))]
fn search_all<N: IndexableFloat>(
    tree: &KdTree<N>,
    queries: &[Descriptor<N>],
    k: usize,
) -> Result<Vec<BoundedPriorityQueue<N>>> {
    queries.iter().map(|q| tree.nearest(q.coords(), k)).collect()
}

/// Each search carries its own queue and limits frame, so the per-descriptor
/// passes fan out cleanly; the vote merge stays sequential.
#[cfg(feature = "rayon")]
fn search_all<N: IndexableFloat>(
    tree: &KdTree<N>,
    queries: &[Descriptor<N>],
    k: usize,
) -> Result<Vec<BoundedPriorityQueue<N>>> {
    queries
        .par_iter()
        .map(|q| tree.nearest(q.coords(), k))
        .collect()
}

impl<N: IndexableFloat> KdTree<N> {
    /// [`find_similar`] against the image count recorded at build time.
    pub fn find_similar(
        &self,
        queries: &[Descriptor<N>],
        k: usize,
        m: usize,
    ) -> Result<Vec<usize>> {
        find_similar(self, queries, k, m, self.num_images())
    }
}
