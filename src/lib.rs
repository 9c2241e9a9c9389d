#![doc = include_str!("../README.md")]

pub mod bpq;
pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod distance;
mod error;
pub mod feats;
pub mod kdtree;
pub mod query;
mod r#type;

pub use bpq::{BoundedPriorityQueue, Neighbour};
pub use catalog::Catalog;
pub use config::{Config, ConfigError};
pub use descriptor::Descriptor;
pub use error::{CbirIndexError, Result};
pub use kdtree::{KdTree, KdTreeBuilder, SplitMethod};
pub use query::find_similar;
pub use r#type::IndexableFloat;

#[cfg(test)]
pub(crate) mod test;
