//! Betti numbers of a binary volume.
//!
//! ```text
//! h0 = foreground components          (foreground connectivity)
//! h2 = background components - 1      (complement connectivity, exterior included)
//! χ  = V - E + F - C                  (counted on the cubical complex)
//! h1 = h0 + h2 - χ
//! ```

use glam::IVec3;

use super::dsu::DisjointSet;
use super::euler::{count_complex, EulerCounts};
use crate::constants::{offset_to_bit, CENTER_BIT};
use crate::types::Connectivity;

/// Component, handle and cavity counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BettiNumbers {
  pub h0: u32,
  pub h1: u32,
  pub h2: u32,
}

impl BettiNumbers {
  /// Betti numbers of `foreground` (one flag per voxel of a `dims` grid whose
  /// outer layer is background).
  pub fn of_mask(
    dims: IVec3,
    foreground: &[bool],
    connectivity: Connectivity,
  ) -> (Self, EulerCounts) {
    let h0 = count_components(dims, foreground, true, connectivity) as i64;
    let background = count_components(dims, foreground, false, connectivity.complement()) as i64;
    let h2 = (background - 1).max(0);
    let index = |p: IVec3| (p.x + dims.x * (p.y + dims.y * p.z)) as usize;
    let counts = count_complex(dims, connectivity, |p| {
      p.cmpge(IVec3::ZERO).all() && p.cmplt(dims).all() && foreground[index(p)]
    });
    let h1 = h0 + h2 - counts.chi();
    debug_assert!(h1 >= 0, "negative h1: h0={h0} h2={h2} chi={}", counts.chi());
    (
      Self {
        h0: h0 as u32,
        h1: h1.max(0) as u32,
        h2: h2 as u32,
      },
      counts,
    )
  }

  /// χ = h0 − h1 + h2.
  #[inline]
  pub fn euler_characteristic(&self) -> i64 {
    self.h0 as i64 - self.h1 as i64 + self.h2 as i64
  }

  #[inline]
  pub fn total(&self) -> u32 {
    self.h0 + self.h1 + self.h2
  }
}

impl std::fmt::Display for BettiNumbers {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "(h0={}, h1={}, h2={})", self.h0, self.h1, self.h2)
  }
}

/// Signed change of the Betti numbers caused by one edit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BettiDelta {
  pub h0: i64,
  pub h1: i64,
  pub h2: i64,
}

impl BettiDelta {
  /// Derive ΔH1 from ΔH0, ΔH2 and Δχ.
  #[inline]
  pub fn from_parts(h0: i64, h2: i64, chi: i64) -> Self {
    Self {
      h0,
      h1: h0 + h2 - chi,
      h2,
    }
  }

  #[inline]
  pub fn total(&self) -> i64 {
    self.h0 + self.h1 + self.h2
  }
}

/// Number of connected components of voxels whose mask equals `value`.
pub fn count_components(
  dims: IVec3,
  mask: &[bool],
  value: bool,
  connectivity: Connectivity,
) -> usize {
  // Offsets that precede the center in index order; each pair is visited once.
  let backward: Vec<IVec3> = connectivity
    .offsets()
    .iter()
    .copied()
    .filter(|d| offset_to_bit(d.x, d.y, d.z) < CENTER_BIT)
    .collect();

  let index = |p: IVec3| (p.x + dims.x * (p.y + dims.y * p.z)) as usize;
  let mut dsu = DisjointSet::new(mask.len());
  for z in 0..dims.z {
    for y in 0..dims.y {
      for x in 0..dims.x {
        let p = IVec3::new(x, y, z);
        let i = index(p);
        if mask[i] != value {
          continue;
        }
        for &d in &backward {
          let q = p + d;
          if q.cmpge(IVec3::ZERO).all() && q.cmplt(dims).all() && mask[index(q)] == value {
            dsu.union(i as u32, index(q) as u32);
          }
        }
      }
    }
  }

  (0..mask.len())
    .filter(|&i| mask[i] == value && dsu.find(i as u32) == i as u32)
    .count()
}

#[cfg(test)]
#[path = "betti_test.rs"]
mod betti_test;
