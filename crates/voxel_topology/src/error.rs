//! Error type for the simplification engine.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal conditions reported by the engine.
///
/// Solver timeouts and non-simple candidates are not errors; they are handled
/// inside the stages that meet them.
#[derive(Debug, Error)]
pub enum TopologyError {
  #[error("volume dimensions must all be at least 1, got {x}x{y}x{z}")]
  InvalidDimensions { x: u32, y: u32, z: u32 },

  #[error("padded volume {x}x{y}x{z} exceeds {max} voxels")]
  VolumeTooLarge { x: u32, y: u32, z: u32, max: u64 },

  #[error("volume data has {found} samples, dimensions require {expected}")]
  DataLength { expected: usize, found: usize },

  #[error("volume is empty")]
  EmptyVolume,

  #[error("intensity at sample {index} is not finite")]
  NonFiniteIntensity { index: usize },

  #[error("invalid thresholds: {0}")]
  InvalidThresholds(String),

  #[error("downsampling factor must be at least 1")]
  InvalidDownsample,

  #[error("failed to read simple-point dictionary {path}: {source}")]
  TableIo {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("simple-point dictionary {path} has {found} bytes, expected {expected} or {packed}")]
  TableSize {
    path: PathBuf,
    found: usize,
    expected: usize,
    packed: usize,
  },

  #[error("failed to build worker pool: {0}")]
  WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T, E = TopologyError> = std::result::Result<T, E>;
