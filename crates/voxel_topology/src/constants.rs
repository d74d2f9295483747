//! Neighborhood layout constants for 3×3×3 digital topology queries.
//!
//! Every local query (simplicity, topological numbers, cell incidence) works on
//! the 27 voxels around a center voxel. Those voxels are packed into a 27-bit
//! code, one bit per offset.
//!
//! # Neighborhood Code Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      27-BIT NEIGHBORHOOD CODE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   dz = -1 (bits 0-8)      dz = 0 (bits 9-17)      dz = +1 (bits 18-26)  │
//! │                                                                         │
//! │    6  7  8                 15 16 17                24 25 26             │
//! │    3  4  5    dy           12 [13] 14              21 22 23             │
//! │    0  1  2    ↑            9  10 11                18 19 20             │
//! │          dx →                                                           │
//! │                                                                         │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │  bit = (dx + 1) + 3 (dy + 1) + 9 (dz + 1)                               │
//! │  bit 13 is the center voxel and is never part of a code                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Neighbor Classes
//!
//! ```text
//! nonzero components   class    count   in N6   in N18   in N26
//!        1             face       6       ✓       ✓        ✓
//!        2             edge      12               ✓        ✓
//!        3             vertex     8                        ✓
//! ```
//!
//! # Dictionary Size
//!
//! A simple-point dictionary has one entry per possible code: 2^27 entries,
//! stored either as one byte per entry or bit-packed (2^24 bytes).

use glam::IVec3;

/// Number of voxels in a 3×3×3 neighborhood (including the center).
pub const NEIGHBORHOOD_SIZE: usize = 27;

/// Bit index of the center voxel.
pub const CENTER_BIT: u32 = 13;

/// All 27 bits of a neighborhood code.
pub const FULL_MASK: u32 = (1 << NEIGHBORHOOD_SIZE) - 1;

/// The 26 neighbor bits (center excluded).
pub const NEIGHBOR_MASK: u32 = FULL_MASK & !(1 << CENTER_BIT);

/// Number of entries in a simple-point dictionary.
pub const TABLE_ENTRIES: usize = 1 << NEIGHBORHOOD_SIZE;

/// Byte length of a dictionary stored with one byte per entry.
pub const TABLE_BYTES: usize = TABLE_ENTRIES;

/// Byte length of a bit-packed dictionary.
pub const PACKED_TABLE_BYTES: usize = TABLE_ENTRIES / 8;

/// Code bit for a neighbor offset with components in {-1, 0, 1}.
#[inline(always)]
pub const fn offset_to_bit(dx: i32, dy: i32, dz: i32) -> u32 {
  ((dx + 1) + 3 * (dy + 1) + 9 * (dz + 1)) as u32
}

/// Neighbor offset for a code bit.
#[inline(always)]
pub const fn bit_to_offset(bit: u32) -> IVec3 {
  IVec3::new(
    (bit % 3) as i32 - 1,
    ((bit / 3) % 3) as i32 - 1,
    (bit / 9) as i32 - 1,
  )
}

/// Number of nonzero components of an offset (1 face, 2 edge, 3 vertex).
#[inline(always)]
pub const fn offset_order(offset: IVec3) -> u32 {
  (offset.x != 0) as u32 + (offset.y != 0) as u32 + (offset.z != 0) as u32
}

/// The six face neighbors, in code-bit order.
pub const FACE_OFFSETS: [IVec3; 6] = [
  IVec3::new(0, 0, -1),
  IVec3::new(0, -1, 0),
  IVec3::new(-1, 0, 0),
  IVec3::new(1, 0, 0),
  IVec3::new(0, 1, 0),
  IVec3::new(0, 0, 1),
];

/// The 26 neighbors, in code-bit order.
pub const NEIGHBOR_OFFSETS: [IVec3; 26] = {
  let mut out = [IVec3::ZERO; 26];
  let mut bit = 0;
  let mut i = 0;
  while bit < NEIGHBORHOOD_SIZE as u32 {
    if bit != CENTER_BIT {
      out[i] = bit_to_offset(bit);
      i += 1;
    }
    bit += 1;
  }
  out
};

const fn order_mask(max_order: u32) -> u32 {
  let mut mask = 0;
  let mut bit = 0;
  while bit < NEIGHBORHOOD_SIZE as u32 {
    let order = offset_order(bit_to_offset(bit));
    if order >= 1 && order <= max_order {
      mask |= 1 << bit;
    }
    bit += 1;
  }
  mask
}

/// Code bits of the 6-neighborhood.
pub const N6_MASK: u32 = order_mask(1);

/// Code bits of the 18-neighborhood.
pub const N18_MASK: u32 = order_mask(2);

/// Code bits of the 26-neighborhood.
pub const N26_MASK: u32 = order_mask(3);

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
