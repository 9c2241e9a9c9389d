use std::fmt::{Debug, Display};
use std::str::FromStr;

use num_traits::Float;

/// The scalar type of descriptor coordinates. This will be `f64` or `f32`.
///
/// `FromStr`/`Display` are required by the plain-text feature-cache format.
pub trait IndexableFloat:
    Float + Default + Debug + Display + FromStr + Send + Sync + 'static
{
}

impl<T> IndexableFloat for T where
    T: Float + Default + Debug + Display + FromStr + Send + Sync + 'static
{
}
