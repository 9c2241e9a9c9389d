//! An immutable k-d tree over the feature descriptors of an image catalog.

mod array;
mod builder;
mod index;
mod search;

pub use array::KdArray;
pub use builder::{KdTreeBuilder, SplitMethod};
pub use index::{KdTree, Node};
