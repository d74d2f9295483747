//! Cubical complex counting on the doubled lattice.
//!
//! ```text
//! voxel (x,y,z) has doubled center (2x+1, 2y+1, 2z+1)
//!
//! cell c on the doubled lattice:
//!   odd coords   dimension   incident voxels
//!       0        vertex            8
//!       1        edge              4
//!       2        face              2
//!       3        cube              1
//! ```
//!
//! With a 26-connected foreground a cell belongs to the complex if any
//! incident voxel is foreground (closed cells). With a 6-connected foreground
//! a cell belongs to it only if all incident voxels are, and it is counted as
//! its dual: a cube of the primal lattice is a vertex at the voxel center, a
//! primal vertex is the cube spanned by its 8 voxel centers.
//!
//! ```text
//! primal dimension   closed (26)   dual (6)
//!        0             vertex        cube
//!        1             edge          face
//!        2             face          edge
//!        3             cube          vertex
//! ```

use std::collections::HashSet;

use glam::IVec3;
use smallvec::SmallVec;

use crate::types::Connectivity;

/// Cell counts by dimension. Also used for signed deltas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EulerCounts {
  pub vertices: i64,
  pub edges: i64,
  pub faces: i64,
  pub cubes: i64,
}

impl EulerCounts {
  /// χ = V − E + F − C.
  #[inline]
  pub fn chi(&self) -> i64 {
    self.vertices - self.edges + self.faces - self.cubes
  }

  #[inline]
  fn add(&mut self, dimension: u32, amount: i64) {
    match dimension {
      0 => self.vertices += amount,
      1 => self.edges += amount,
      2 => self.faces += amount,
      _ => self.cubes += amount,
    }
  }
}

impl std::ops::Add for EulerCounts {
  type Output = Self;

  fn add(self, rhs: Self) -> Self {
    Self {
      vertices: self.vertices + rhs.vertices,
      edges: self.edges + rhs.edges,
      faces: self.faces + rhs.faces,
      cubes: self.cubes + rhs.cubes,
    }
  }
}

#[inline]
fn cell_dimension(cell: IVec3, closed: bool) -> u32 {
  let odd = (cell.x & 1) as u32 + (cell.y & 1) as u32 + (cell.z & 1) as u32;
  if closed {
    odd
  } else {
    3 - odd
  }
}

/// Voxels incident to a doubled-lattice cell.
fn incident_voxels(cell: IVec3) -> SmallVec<[IVec3; 8]> {
  let axis = |c: i32| -> SmallVec<[i32; 2]> {
    if c & 1 == 1 {
      smallvec::smallvec![(c - 1) / 2]
    } else {
      smallvec::smallvec![c / 2 - 1, c / 2]
    }
  };
  let (xs, ys, zs) = (axis(cell.x), axis(cell.y), axis(cell.z));
  let mut out = SmallVec::new();
  for &z in &zs {
    for &y in &ys {
      for &x in &xs {
        out.push(IVec3::new(x, y, z));
      }
    }
  }
  out
}

#[inline]
fn cell_included(cell: IVec3, closed: bool, foreground: &impl Fn(IVec3) -> bool) -> bool {
  let voxels = incident_voxels(cell);
  if closed {
    voxels.iter().any(|&v| foreground(v))
  } else {
    voxels.iter().all(|&v| foreground(v))
  }
}

/// Count the complex of the whole grid. `foreground` is queried with grid
/// coordinates and must return false outside `dims`.
pub fn count_complex(
  dims: IVec3,
  connectivity: Connectivity,
  foreground: impl Fn(IVec3) -> bool,
) -> EulerCounts {
  let closed = connectivity.closed_cells();
  let mut counts = EulerCounts::default();
  for cz in 0..=2 * dims.z {
    for cy in 0..=2 * dims.y {
      for cx in 0..=2 * dims.x {
        let cell = IVec3::new(cx, cy, cz);
        if cell_included(cell, closed, &foreground) {
          counts.add(cell_dimension(cell, closed), 1);
        }
      }
    }
  }
  counts
}

/// Change in cell counts when every voxel of `flipped` changes side.
pub fn flip_delta(
  flipped: &[IVec3],
  connectivity: Connectivity,
  foreground: impl Fn(IVec3) -> bool,
) -> EulerCounts {
  let closed = connectivity.closed_cells();
  let flipped_set: HashSet<IVec3> = flipped.iter().copied().collect();
  let after = |v: IVec3| foreground(v) ^ flipped_set.contains(&v);

  let mut cells: HashSet<IVec3> = HashSet::with_capacity(flipped.len() * 8);
  for &p in flipped {
    let center = 2 * p + IVec3::ONE;
    for dz in -1..=1 {
      for dy in -1..=1 {
        for dx in -1..=1 {
          cells.insert(center + IVec3::new(dx, dy, dz));
        }
      }
    }
  }

  let mut delta = EulerCounts::default();
  for cell in cells {
    let before = cell_included(cell, closed, &foreground);
    let now = cell_included(cell, closed, &after);
    if before != now {
      delta.add(cell_dimension(cell, closed), if now { 1 } else { -1 });
    }
  }
  delta
}

/// Change in χ when the single voxel `p` changes side.
pub fn voxel_flip_chi(
  p: IVec3,
  connectivity: Connectivity,
  foreground: impl Fn(IVec3) -> bool,
) -> i64 {
  let closed = connectivity.closed_cells();
  let after = |v: IVec3| if v == p { !foreground(v) } else { foreground(v) };
  let center = 2 * p + IVec3::ONE;
  let mut delta = EulerCounts::default();
  for dz in -1..=1 {
    for dy in -1..=1 {
      for dx in -1..=1 {
        let cell = center + IVec3::new(dx, dy, dz);
        let before = cell_included(cell, closed, &foreground);
        let now = cell_included(cell, closed, &after);
        if before != now {
          delta.add(cell_dimension(cell, closed), if now { 1 } else { -1 });
        }
      }
    }
  }
  delta.chi()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn solid(lo: IVec3, hi: IVec3) -> impl Fn(IVec3) -> bool {
    move |v: IVec3| v.cmpge(lo).all() && v.cmple(hi).all()
  }

  #[test]
  fn test_single_voxel_closed() {
    let counts = count_complex(IVec3::splat(3), Connectivity::TwentySix, |v| v == IVec3::ONE);
    assert_eq!(
      counts,
      EulerCounts {
        vertices: 8,
        edges: 12,
        faces: 6,
        cubes: 1
      }
    );
    assert_eq!(counts.chi(), 1);
  }

  #[test]
  fn test_single_voxel_open() {
    let counts = count_complex(IVec3::splat(3), Connectivity::Six, |v| v == IVec3::ONE);
    assert_eq!(
      counts,
      EulerCounts {
        vertices: 1,
        edges: 0,
        faces: 0,
        cubes: 0
      }
    );
    assert_eq!(counts.chi(), 1);
  }

  #[test]
  fn test_block_is_contractible() {
    let f = solid(IVec3::splat(1), IVec3::splat(3));
    assert_eq!(count_complex(IVec3::splat(5), Connectivity::TwentySix, &f).chi(), 1);
  }

  #[test]
  fn test_flip_delta_matches_recount() {
    let dims = IVec3::splat(5);
    let shell = |v: IVec3| {
      v.cmpge(IVec3::ONE).all() && v.cmple(IVec3::splat(3)).all() && v != IVec3::splat(2)
    };
    for connectivity in [Connectivity::Six, Connectivity::TwentySix] {
      let before = count_complex(dims, connectivity, shell);
      let filled = count_complex(dims, connectivity, solid(IVec3::ONE, IVec3::splat(3)));
      let delta = flip_delta(&[IVec3::splat(2)], connectivity, shell);
      assert_eq!(before + delta, filled);
      assert_eq!(
        voxel_flip_chi(IVec3::splat(2), connectivity, shell),
        filled.chi() - before.chi()
      );
    }
  }

  #[test]
  fn test_diagonal_pair_depends_on_connectivity() {
    let pair = |v: IVec3| v == IVec3::new(1, 1, 1) || v == IVec3::new(2, 2, 1);
    // Closed cells share an edge, so the pair is one piece.
    assert_eq!(count_complex(IVec3::splat(4), Connectivity::TwentySix, pair).chi(), 1);
    // Dual cells do not connect diagonal voxels, so there are two pieces.
    let open = count_complex(IVec3::splat(4), Connectivity::Six, pair);
    assert_eq!(open.vertices, 2);
    assert_eq!(open.chi(), 2);
  }
}
