//! Topological numbers computed directly from a neighborhood code.
//!
//! For a voxel x with object X, the topological numbers are:
//!
//! ```text
//! (26,6):  T26(x, X)  = #26-components of N26*(x) ∩ X
//!          T6(x, X̄)  = #6-components of N18*(x) ∩ X̄ that are 6-adjacent to x
//! (6,26):  T6(x, X)   = #6-components of N18*(x) ∩ X that are 6-adjacent to x
//!          T26(x, X̄) = #26-components of N26*(x) ∩ X̄
//! ```
//!
//! x is simple iff both numbers are 1.

use crate::constants::{bit_to_offset, NEIGHBORHOOD_SIZE, NEIGHBOR_MASK, N18_MASK, N26_MASK, N6_MASK};
use crate::types::Connectivity;

const fn position_adjacency(max_order: i32) -> [u32; NEIGHBORHOOD_SIZE] {
  let mut adj = [0u32; NEIGHBORHOOD_SIZE];
  let mut p = 0;
  while p < NEIGHBORHOOD_SIZE {
    let a = bit_to_offset(p as u32);
    let mut q = 0;
    while q < NEIGHBORHOOD_SIZE {
      if p != q {
        let b = bit_to_offset(q as u32);
        let dx = (a.x - b.x).abs();
        let dy = (a.y - b.y).abs();
        let dz = (a.z - b.z).abs();
        if dx <= 1 && dy <= 1 && dz <= 1 && dx + dy + dz <= max_order {
          adj[p] |= 1 << q;
        }
      }
      q += 1;
    }
    p += 1;
  }
  adj
}

/// Face adjacency between positions of the 3×3×3 block.
const ADJ6: [u32; NEIGHBORHOOD_SIZE] = position_adjacency(1);

/// Full adjacency between positions of the 3×3×3 block.
const ADJ26: [u32; NEIGHBORHOOD_SIZE] = position_adjacency(3);

/// Grow `seed` inside `set` along `adj`.
#[inline]
fn flood(seed: u32, set: u32, adj: &[u32; NEIGHBORHOOD_SIZE]) -> u32 {
  let mut component = 0u32;
  let mut frontier = seed;
  while frontier != 0 {
    component |= frontier;
    let mut next = 0u32;
    let mut f = frontier;
    while f != 0 {
      let bit = f.trailing_zeros();
      f &= f - 1;
      next |= adj[bit as usize];
    }
    frontier = next & set & !component;
  }
  component
}

/// Number of components of `set` that intersect `anchor`.
#[inline]
fn components_touching(set: u32, adj: &[u32; NEIGHBORHOOD_SIZE], anchor: u32) -> u32 {
  let mut remaining = set;
  let mut count = 0;
  while remaining != 0 {
    let seed = 1 << remaining.trailing_zeros();
    let component = flood(seed, set, adj);
    remaining &= !component;
    if component & anchor != 0 {
      count += 1;
    }
  }
  count
}

/// Topological numbers `(object, complement)` of the center of `code`, where
/// the object uses `connectivity` and the complement its dual.
pub fn topological_numbers(code: u32, connectivity: Connectivity) -> (u32, u32) {
  let object = code & NEIGHBOR_MASK;
  let complement = !code & NEIGHBOR_MASK;
  match connectivity {
    Connectivity::TwentySix => (
      components_touching(object & N26_MASK, &ADJ26, N26_MASK),
      components_touching(complement & N18_MASK, &ADJ6, N6_MASK),
    ),
    Connectivity::Six => (
      components_touching(object & N18_MASK, &ADJ6, N6_MASK),
      components_touching(complement & N26_MASK, &ADJ26, N26_MASK),
    ),
  }
}

/// Number of object components around the center that touch it.
#[inline]
pub fn topological_number(code: u32, connectivity: Connectivity) -> u32 {
  let object = code & NEIGHBOR_MASK;
  match connectivity {
    Connectivity::TwentySix => components_touching(object & N26_MASK, &ADJ26, N26_MASK),
    Connectivity::Six => components_touching(object & N18_MASK, &ADJ6, N6_MASK),
  }
}

/// Whether the center of `code` is simple for an object with `connectivity`.
#[inline]
pub fn is_simple(code: u32, connectivity: Connectivity) -> bool {
  let (t, t_bar) = topological_numbers(code, connectivity);
  t == 1 && t_bar == 1
}

#[cfg(test)]
#[path = "computed_test.rs"]
mod computed_test;
