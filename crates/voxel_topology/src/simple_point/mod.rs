//! Connectivity and simplicity oracle.
//!
//! Callers assemble a 27-bit code of the set being grown or shrunk around a
//! voxel (see [`crate::constants`]) and ask whether the center is simple for
//! that set under the set's connectivity. 6-connected queries are answered
//! through the (26,6) test on the complemented code.

mod computed;
mod table;

pub use computed::{is_simple, topological_number, topological_numbers};
pub use table::SimpleTable;

use std::path::Path;

use crate::constants::NEIGHBOR_MASK;
use crate::error::Result;
use crate::types::Connectivity;

/// Source of simple-point answers, shared read-only by every stage.
#[derive(Debug, Default)]
pub enum SimplePointOracle {
  /// Topological numbers evaluated per query.
  #[default]
  Computed,
  /// Precomputed (26,6) dictionary.
  Table(SimpleTable),
}

impl SimplePointOracle {
  pub fn computed() -> Self {
    SimplePointOracle::Computed
  }

  /// Load a dictionary from disk.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    Ok(SimplePointOracle::Table(SimpleTable::load(path)?))
  }

  /// Whether the center of `code` is simple for a set with `connectivity`.
  #[inline]
  pub fn is_simple(&self, code: u32, connectivity: Connectivity) -> bool {
    match self {
      SimplePointOracle::Computed => computed::is_simple(code, connectivity),
      SimplePointOracle::Table(table) => match connectivity {
        Connectivity::TwentySix => table.lookup(code),
        Connectivity::Six => table.lookup(!code & NEIGHBOR_MASK),
      },
    }
  }
}
