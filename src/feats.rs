//! The plain-text feature-cache format.
//!
//! One file per catalog image: the first line carries the descriptor count,
//! followed by `count · dim` whitespace-separated coordinates (one descriptor
//! per line when written by [`save_features`]). Lets a catalog be indexed
//! without re-running the feature extractor.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::descriptor::Descriptor;
use crate::error::{CbirIndexError, Result};
use crate::r#type::IndexableFloat;

/// Read one image's descriptors from a feature-cache file, tagging them with
/// `image_id`.
///
/// ## Errors
///
/// - If `dim` is zero.
/// - If the file cannot be read.
/// - If the count line is malformed, a coordinate fails to parse, or the
///   number of coordinates is not `count · dim`.
pub fn load_features<N: IndexableFloat>(
    path: impl AsRef<Path>,
    image_id: usize,
    dim: usize,
) -> Result<Vec<Descriptor<N>>> {
    let path = path.as_ref();
    if dim == 0 {
        return Err(CbirIndexError::InvalidArgument(
            "descriptor dimension must be positive".to_string(),
        ));
    }

    let text = fs::read_to_string(path)?;
    let mut parts = text.splitn(2, '\n');
    let header = parts.next().unwrap_or("");
    let body = parts.next().unwrap_or("");

    let count: usize = header.trim().parse().map_err(|_| {
        CbirIndexError::FeatureCache(format!(
            "bad descriptor count line {header:?} in {}",
            path.display()
        ))
    })?;
    if count == 0 {
        return Err(CbirIndexError::FeatureCache(format!(
            "{} declares zero descriptors",
            path.display()
        )));
    }

    let tokens: Vec<&str> = body.split_whitespace().collect();
    if tokens.len() != count * dim {
        return Err(CbirIndexError::FeatureCache(format!(
            "{} holds {} coordinates, expected {} ({count} descriptors of dimension {dim})",
            path.display(),
            tokens.len(),
            count * dim
        )));
    }

    let mut values = Vec::with_capacity(tokens.len());
    for token in tokens {
        let value: N = token.parse().map_err(|_| {
            CbirIndexError::FeatureCache(format!(
                "unparsable coordinate {token:?} in {}",
                path.display()
            ))
        })?;
        values.push(value);
    }

    let descriptors = values
        .chunks_exact(dim)
        .map(|coords| Descriptor::new(image_id, coords.to_vec()))
        .collect::<Result<Vec<_>>>()?;
    debug!(path = %path.display(), count, "loaded feature cache");
    Ok(descriptors)
}

/// Write one image's descriptors as a feature-cache file.
///
/// ## Errors
///
/// - If `descriptors` is empty.
/// - If the file cannot be written.
pub fn save_features<N: IndexableFloat>(
    path: impl AsRef<Path>,
    descriptors: &[Descriptor<N>],
) -> Result<()> {
    let path = path.as_ref();
    if descriptors.is_empty() {
        return Err(CbirIndexError::InvalidArgument(
            "cannot save an empty descriptor set".to_string(),
        ));
    }

    let mut out = format!("{}\n", descriptors.len());
    for descriptor in descriptors {
        let row: Vec<String> = descriptor.coords().iter().map(|c| c.to_string()).collect();
        out.push_str(&row.join(" "));
        out.push('\n');
    }
    fs::write(path, out)?;
    debug!(path = %path.display(), count = descriptors.len(), "saved feature cache");
    Ok(())
}
