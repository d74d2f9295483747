//! On-disk simple-point dictionary.
//!
//! One entry per (26,6) neighborhood code, either one byte per entry (nonzero =
//! simple) or bit-packed, least significant bit first.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use web_time::Instant;

use super::computed;
use crate::constants::{PACKED_TABLE_BYTES, TABLE_BYTES};
use crate::error::{Result, TopologyError};
use crate::types::Connectivity;

/// Codes evaluated per parallel work item during generation.
const GENERATION_CHUNK: usize = 4096;

/// Loaded simple-point dictionary. Immutable once built.
pub struct SimpleTable {
  bytes: Box<[u8]>,
  packed: bool,
}

impl std::fmt::Debug for SimpleTable {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SimpleTable")
      .field("bytes", &self.bytes.len())
      .field("packed", &self.packed)
      .finish()
  }
}

impl SimpleTable {
  /// Read a dictionary from disk. Missing or truncated files are fatal.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| TopologyError::TableIo {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_vec(bytes, path)
  }

  /// Wrap an in-memory dictionary.
  pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
    Self::from_vec(bytes, Path::new("<memory>"))
  }

  fn from_vec(bytes: Vec<u8>, path: &Path) -> Result<Self> {
    let packed = match bytes.len() {
      TABLE_BYTES => false,
      PACKED_TABLE_BYTES => true,
      found => {
        return Err(TopologyError::TableSize {
          path: PathBuf::from(path),
          found,
          expected: TABLE_BYTES,
          packed: PACKED_TABLE_BYTES,
        })
      }
    };
    Ok(Self {
      bytes: bytes.into_boxed_slice(),
      packed,
    })
  }

  /// Compute the full bit-packed dictionary in parallel.
  pub fn generate() -> Self {
    let start = Instant::now();
    let mut bytes = vec![0u8; PACKED_TABLE_BYTES];
    bytes
      .par_chunks_mut(GENERATION_CHUNK)
      .enumerate()
      .for_each(|(chunk, out)| {
        for (i, byte) in out.iter_mut().enumerate() {
          let base = ((chunk * GENERATION_CHUNK + i) * 8) as u32;
          let mut bits = 0u8;
          for k in 0..8 {
            if computed::is_simple(base + k, Connectivity::TwentySix) {
              bits |= 1 << k;
            }
          }
          *byte = bits;
        }
      });
    tracing::info!(
      elapsed_ms = start.elapsed().as_millis() as u64,
      "generated simple-point dictionary"
    );
    Self {
      bytes: bytes.into_boxed_slice(),
      packed: true,
    }
  }

  pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, &self.bytes).map_err(|source| TopologyError::TableIo {
      path: path.to_path_buf(),
      source,
    })
  }

  #[inline]
  pub fn is_packed(&self) -> bool {
    self.packed
  }

  /// (26,6) simplicity of the center of `code`.
  #[inline]
  pub fn lookup(&self, code: u32) -> bool {
    let code = code as usize & (TABLE_BYTES - 1);
    if self.packed {
      self.bytes[code >> 3] & (1 << (code & 7)) != 0
    } else {
      self.bytes[code] != 0
    }
  }
}
