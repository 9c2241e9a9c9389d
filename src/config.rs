//! TOML configuration for a retrieval run.
//!
//! Names the catalog on disk (directory, file name pattern, image count) and
//! the engine parameters (descriptor dimension, per-image feature budget,
//! `knn`, result count, split method). Only the four catalog fields are
//! required; everything else has a default.
//!
//! ```toml
//! images_directory = "./images/"
//! images_prefix = "img"
//! images_suffix = ".png"
//! num_images = 17
//!
//! pca_dimension = 20
//! knn = 4
//! num_similar_images = 3
//! split_method = "max_spread"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::kdtree::SplitMethod;

const ALLOWED_SUFFIXES: [&str; 4] = [".jpg", ".png", ".bmp", ".gif"];
const FEATURES_SUFFIX: &str = ".feats";

const PCA_DIMENSION_MIN: usize = 10;
const PCA_DIMENSION_MAX: usize = 28;

/// Enum with all configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("constraint not met for `{field}`: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },

    #[error("image index {index} out of range for a catalog of {num_images} images")]
    IndexOutOfRange { index: usize, num_images: usize },
}

/// Engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding the catalog images and their feature caches.
    pub images_directory: PathBuf,
    /// Image file name prefix; image `i` is `<prefix><i><suffix>`.
    pub images_prefix: String,
    /// Image file name suffix, one of `.jpg`, `.png`, `.bmp`, `.gif`.
    pub images_suffix: String,
    /// Number of images in the catalog.
    pub num_images: usize,
    /// Dimension of the extracted descriptors.
    #[serde(default = "default_pca_dimension")]
    pub pca_dimension: usize,
    /// Name of the PCA basis file inside `images_directory`.
    #[serde(default = "default_pca_filename")]
    pub pca_filename: String,
    /// Upper bound on the number of features extracted per image.
    #[serde(default = "default_num_features")]
    pub num_features: usize,
    /// Extract features from the images, as opposed to loading the
    /// feature-cache files written by an earlier run.
    #[serde(default = "default_extraction_mode")]
    pub extraction_mode: bool,
    /// How many similar images a query reports.
    #[serde(default = "default_num_similar_images")]
    pub num_similar_images: usize,
    /// How many nearest descriptors each query descriptor retrieves.
    #[serde(default = "default_knn")]
    pub knn: usize,
    /// Split-axis selection rule for the tree build.
    #[serde(default)]
    pub split_method: SplitMethod,
}

fn default_pca_dimension() -> usize {
    20
}

fn default_pca_filename() -> String {
    "pca.yml".to_string()
}

fn default_num_features() -> usize {
    100
}

fn default_extraction_mode() -> bool {
    true
}

fn default_num_similar_images() -> usize {
    1
}

fn default_knn() -> usize {
    1
}

impl Config {
    /// Load and validate a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.num_images == 0 {
            return Err(ConfigError::InvalidValue {
                field: "num_images",
                reason: "must be at least 1".to_string(),
            });
        }
        if !ALLOWED_SUFFIXES.contains(&self.images_suffix.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "images_suffix",
                reason: format!("must be one of {}", ALLOWED_SUFFIXES.join(", ")),
            });
        }
        if !(PCA_DIMENSION_MIN..=PCA_DIMENSION_MAX).contains(&self.pca_dimension) {
            return Err(ConfigError::InvalidValue {
                field: "pca_dimension",
                reason: format!("must lie in {PCA_DIMENSION_MIN}..={PCA_DIMENSION_MAX}"),
            });
        }
        if self.num_features == 0 {
            return Err(ConfigError::InvalidValue {
                field: "num_features",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.knn == 0 {
            return Err(ConfigError::InvalidValue {
                field: "knn",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.num_similar_images == 0 {
            return Err(ConfigError::InvalidValue {
                field: "num_similar_images",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Path of catalog image `index`.
    pub fn image_path(&self, index: usize) -> Result<PathBuf, ConfigError> {
        self.indexed_path(index, &self.images_suffix)
    }

    /// Path of the feature-cache file of catalog image `index`.
    pub fn features_path(&self, index: usize) -> Result<PathBuf, ConfigError> {
        self.indexed_path(index, FEATURES_SUFFIX)
    }

    /// Path of the PCA basis file.
    pub fn pca_path(&self) -> PathBuf {
        self.images_directory.join(&self.pca_filename)
    }

    fn indexed_path(&self, index: usize, suffix: &str) -> Result<PathBuf, ConfigError> {
        if index >= self.num_images {
            return Err(ConfigError::IndexOutOfRange {
                index,
                num_images: self.num_images,
            });
        }
        Ok(self
            .images_directory
            .join(format!("{}{}{}", self.images_prefix, index, suffix)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        images_directory = "./images/"
        images_prefix = "img"
        images_suffix = ".png"
        num_images = 17
    "#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = Config::from_toml(MINIMAL).unwrap();
        assert_eq!(config.num_images, 17);
        assert_eq!(config.pca_dimension, 20);
        assert_eq!(config.pca_filename, "pca.yml");
        assert_eq!(config.num_features, 100);
        assert!(config.extraction_mode);
        assert_eq!(config.num_similar_images, 1);
        assert_eq!(config.knn, 1);
        assert_eq!(config.split_method, SplitMethod::MaxSpread);
    }

    #[test]
    fn overrides_are_honoured() {
        let text = format!(
            "{MINIMAL}\npca_dimension = 28\nknn = 5\nsplit_method = \"incremental\"\nextraction_mode = false"
        );
        let config = Config::from_toml(&text).unwrap();
        assert_eq!(config.pca_dimension, 28);
        assert_eq!(config.knn, 5);
        assert_eq!(config.split_method, SplitMethod::Incremental);
        assert!(!config.extraction_mode);
    }

    #[test]
    fn missing_required_field_fails() {
        let text = r#"
            images_directory = "./images/"
            images_prefix = "img"
            images_suffix = ".png"
        "#;
        assert!(matches!(
            Config::from_toml(text),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn unknown_field_fails() {
        let text = format!("{MINIMAL}\nimages_sufix = \".png\"");
        assert!(matches!(
            Config::from_toml(&text),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn suffix_constraint_is_enforced() {
        let text = MINIMAL.replace(".png", ".tiff");
        assert!(matches!(
            Config::from_toml(&text),
            Err(ConfigError::InvalidValue {
                field: "images_suffix",
                ..
            })
        ));
    }

    #[test]
    fn pca_dimension_constraint_is_enforced() {
        for bad in [9, 29] {
            let text = format!("{MINIMAL}\npca_dimension = {bad}");
            assert!(matches!(
                Config::from_toml(&text),
                Err(ConfigError::InvalidValue {
                    field: "pca_dimension",
                    ..
                })
            ));
        }
    }

    #[test]
    fn paths_follow_the_naming_pattern() {
        let config = Config::from_toml(MINIMAL).unwrap();
        assert_eq!(
            config.image_path(4).unwrap(),
            PathBuf::from("./images/img4.png")
        );
        assert_eq!(
            config.features_path(16).unwrap(),
            PathBuf::from("./images/img16.feats")
        );
        assert_eq!(config.pca_path(), PathBuf::from("./images/pca.yml"));
        assert!(matches!(
            config.image_path(17),
            Err(ConfigError::IndexOutOfRange { .. })
        ));
    }
}
