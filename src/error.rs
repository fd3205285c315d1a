use std::path::PathBuf;

use thiserror::Error;

use crate::util::ViewportSize;

/// Reasons a frame can be refused. Nothing is published when one is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("sphere {sphere} references material {material_index}, but the scene only has {material_count} materials")]
    InvalidMaterialIndex {
        sphere: usize,
        material_index: usize,
        material_count: usize,
    },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: ViewportSize,
        actual: ViewportSize,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid camera forward direction {forward:?}: must be non-zero and not parallel to world up")]
    InvalidCamera { forward: [f32; 3] },
}
