//! Input volumes and the padded voxel grid the engine works on.
//!
//! # Padding
//!
//! ```text
//! input (W×H×D)               grid ((W+2)×(H+2)×(D+2))
//!
//!                             ┌───────────────┐
//!   ┌─────────┐               │ -∞ -∞ -∞ -∞ -∞│  one layer of definite
//!   │ v  v  v │      ──▶      │ -∞  v  v  v -∞│  background around the
//!   │ v  v  v │               │ -∞  v  v  v -∞│  input, so the exterior is
//!   └─────────┘               │ -∞ -∞ -∞ -∞ -∞│  always one Neighborhood
//!                             └───────────────┘
//! ```
//!
//! Linear index: `x + W * (y + H * z)` (x fastest) for both.

use glam::{IVec3, UVec3};

use crate::constants::{bit_to_offset, CENTER_BIT, NEIGHBORHOOD_SIZE};
use crate::error::{Result, TopologyError};
use crate::types::{Connectivity, Intensity, RegionId, NO_REGION};

/// Largest padded grid the engine indexes; grid coordinates are `i32`.
pub const MAX_PADDED_VOXELS: u64 = i32::MAX as u64;

/// Dense scalar volume supplied by the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct Volume {
  dims: UVec3,
  data: Vec<Intensity>,
}

impl Volume {
  /// Wrap `data` (x fastest) after validating it.
  pub fn new(dims: UVec3, data: Vec<Intensity>) -> Result<Self> {
    if dims.x == 0 || dims.y == 0 || dims.z == 0 {
      return Err(TopologyError::InvalidDimensions {
        x: dims.x,
        y: dims.y,
        z: dims.z,
      });
    }
    let padded = (dims.as_u64vec3() + glam::U64Vec3::splat(2)).element_product();
    if padded > MAX_PADDED_VOXELS {
      return Err(TopologyError::VolumeTooLarge {
        x: dims.x,
        y: dims.y,
        z: dims.z,
        max: MAX_PADDED_VOXELS,
      });
    }
    if data.is_empty() {
      return Err(TopologyError::EmptyVolume);
    }
    let expected = dims.x as usize * dims.y as usize * dims.z as usize;
    if data.len() != expected {
      return Err(TopologyError::DataLength {
        expected,
        found: data.len(),
      });
    }
    if let Some(index) = data.iter().position(|v| !v.is_finite()) {
      return Err(TopologyError::NonFiniteIntensity { index });
    }
    Ok(Self { dims, data })
  }

  /// Build a volume by sampling `f` at every coordinate.
  pub fn from_fn(dims: UVec3, mut f: impl FnMut(UVec3) -> Intensity) -> Result<Self> {
    let mut data = Vec::with_capacity(dims.x as usize * dims.y as usize * dims.z as usize);
    for z in 0..dims.z {
      for y in 0..dims.y {
        for x in 0..dims.x {
          data.push(f(UVec3::new(x, y, z)));
        }
      }
    }
    Self::new(dims, data)
  }

  #[inline]
  pub fn dims(&self) -> UVec3 {
    self.dims
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.data.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  #[inline]
  pub fn data(&self) -> &[Intensity] {
    &self.data
  }

  #[inline]
  pub fn index(&self, p: UVec3) -> usize {
    p.x as usize + self.dims.x as usize * (p.y as usize + self.dims.y as usize * p.z as usize)
  }

  #[inline]
  pub fn get(&self, p: UVec3) -> Intensity {
    self.data[self.index(p)]
  }

  /// Block-average by `factor` along every axis. Partial blocks at the far
  /// edges average the samples they contain.
  pub fn downsample(&self, factor: u32) -> Result<Self> {
    if factor == 0 {
      return Err(TopologyError::InvalidDownsample);
    }
    if factor == 1 {
      return Ok(self.clone());
    }
    let dims = (self.dims + UVec3::splat(factor - 1)) / factor;
    Self::from_fn(dims, |p| {
      let lo = p * factor;
      let hi = (lo + UVec3::splat(factor)).min(self.dims);
      let mut sum = 0.0f64;
      let mut count = 0u32;
      for z in lo.z..hi.z {
        for y in lo.y..hi.y {
          for x in lo.x..hi.x {
            sum += self.get(UVec3::new(x, y, z)) as f64;
            count += 1;
          }
        }
      }
      (sum / count as f64) as Intensity
    })
  }
}

/// Padded working grid: fixed intensities plus the mutable per-voxel region id
/// and pending flag.
#[derive(Clone, Debug)]
pub struct Grid {
  dims: IVec3,
  intensity: Vec<Intensity>,
  region: Vec<RegionId>,
  pending: Vec<bool>,
}

impl Grid {
  /// Copy `volume` into a grid with one layer of `-∞` padding.
  pub fn from_volume(volume: &Volume) -> Self {
    let inner = volume.dims().as_ivec3();
    let dims = inner + IVec3::splat(2);
    let len = (dims.x * dims.y * dims.z) as usize;
    let mut intensity = vec![Intensity::NEG_INFINITY; len];
    for z in 0..inner.z {
      for y in 0..inner.y {
        for x in 0..inner.x {
          let src = volume.index(UVec3::new(x as u32, y as u32, z as u32));
          let dst = (x + 1 + dims.x * (y + 1 + dims.y * (z + 1))) as usize;
          intensity[dst] = volume.data()[src];
        }
      }
    }
    Self {
      dims,
      intensity,
      region: vec![NO_REGION; len],
      pending: vec![false; len],
    }
  }

  /// Padded dimensions.
  #[inline]
  pub fn dims(&self) -> IVec3 {
    self.dims
  }

  /// Dimensions of the unpadded input.
  #[inline]
  pub fn inner_dims(&self) -> UVec3 {
    (self.dims - IVec3::splat(2)).as_uvec3()
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.intensity.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.intensity.is_empty()
  }

  #[inline]
  pub fn index(&self, p: IVec3) -> usize {
    (p.x + self.dims.x * (p.y + self.dims.y * p.z)) as usize
  }

  #[inline]
  pub fn coord(&self, idx: usize) -> IVec3 {
    let i = idx as i32;
    IVec3::new(
      i % self.dims.x,
      (i / self.dims.x) % self.dims.y,
      i / (self.dims.x * self.dims.y),
    )
  }

  #[inline]
  pub fn contains(&self, p: IVec3) -> bool {
    p.cmpge(IVec3::ZERO).all() && p.cmplt(self.dims).all()
  }

  /// True for voxels of the padding layer.
  #[inline]
  pub fn is_padding(&self, idx: usize) -> bool {
    let p = self.coord(idx);
    p.cmpeq(IVec3::ZERO).any() || p.cmpeq(self.dims - IVec3::ONE).any()
  }

  /// Grid index of input coordinate `p`.
  #[inline]
  pub fn padded_index(&self, p: UVec3) -> usize {
    self.index(p.as_ivec3() + IVec3::ONE)
  }

  /// Index of the voxel at `offset` from `idx`, if inside the grid.
  #[inline]
  pub fn offset(&self, idx: usize, offset: IVec3) -> Option<usize> {
    let p = self.coord(idx) + offset;
    self.contains(p).then(|| self.index(p))
  }

  #[inline]
  pub fn intensity(&self, idx: usize) -> Intensity {
    self.intensity[idx]
  }

  #[inline]
  pub fn region(&self, idx: usize) -> RegionId {
    self.region[idx]
  }

  #[inline]
  pub fn set_region(&mut self, idx: usize, region: RegionId) {
    self.region[idx] = region;
  }

  #[inline]
  pub fn is_labeled(&self, idx: usize) -> bool {
    self.region[idx] != NO_REGION
  }

  #[inline]
  pub fn pending(&self, idx: usize) -> bool {
    self.pending[idx]
  }

  #[inline]
  pub fn set_pending(&mut self, idx: usize, pending: bool) {
    self.pending[idx] = pending;
  }

  /// In-grid neighbors of `idx` under `connectivity`, with their offsets.
  pub fn neighbors(
    &self,
    idx: usize,
    connectivity: Connectivity,
  ) -> impl Iterator<Item = (usize, IVec3)> + '_ {
    let p = self.coord(idx);
    connectivity.offsets().iter().filter_map(move |&d| {
      let q = p + d;
      self.contains(q).then(|| (self.index(q), d))
    })
  }

  /// 27-bit neighborhood code of `idx`: bit set where `member` holds.
  /// Out-of-grid positions and the center are never set.
  pub fn code(&self, idx: usize, mut member: impl FnMut(usize) -> bool) -> u32 {
    let p = self.coord(idx);
    let mut code = 0u32;
    for bit in 0..NEIGHBORHOOD_SIZE as u32 {
      if bit == CENTER_BIT {
        continue;
      }
      let q = p + bit_to_offset(bit);
      if self.contains(q) && member(self.index(q)) {
        code |= 1 << bit;
      }
    }
    code
  }

  /// Indices of all non-padding voxels, in index order.
  pub fn interior(&self) -> impl Iterator<Item = usize> + '_ {
    let d = self.dims;
    (1..d.z - 1).flat_map(move |z| {
      (1..d.y - 1).flat_map(move |y| (1..d.x - 1).map(move |x| (x + d.x * (y + d.y * z)) as usize))
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ramp(dims: UVec3) -> Volume {
    Volume::from_fn(dims, |p| (p.x + 10 * p.y + 100 * p.z) as f32).unwrap()
  }

  #[test]
  fn test_volume_validation() {
    assert!(matches!(
      Volume::new(UVec3::new(0, 1, 1), vec![]),
      Err(TopologyError::InvalidDimensions { .. })
    ));
    assert!(matches!(
      Volume::new(UVec3::new(2, 1, 1), vec![1.0]),
      Err(TopologyError::DataLength { expected: 2, found: 1 })
    ));
    assert!(matches!(
      Volume::new(UVec3::new(2, 1, 1), vec![1.0, f32::NAN]),
      Err(TopologyError::NonFiniteIntensity { index: 1 })
    ));
  }

  #[test]
  fn test_volume_rejects_oversized_grid() {
    // 1290³ padded is just above i32::MAX; checked before the data.
    assert!(matches!(
      Volume::new(UVec3::splat(1290), vec![]),
      Err(TopologyError::VolumeTooLarge { x: 1290, .. })
    ));
    assert!(matches!(
      Volume::new(UVec3::new(u32::MAX, 1, 1), vec![]),
      Err(TopologyError::VolumeTooLarge { .. })
    ));
    // 1288³ padded fits, so only the empty data is reported.
    assert!(matches!(
      Volume::new(UVec3::splat(1288), vec![]),
      Err(TopologyError::EmptyVolume)
    ));
  }

  #[test]
  fn test_grid_padding() {
    let volume = ramp(UVec3::new(3, 2, 2));
    let grid = Grid::from_volume(&volume);
    assert_eq!(grid.dims(), IVec3::new(5, 4, 4));
    assert_eq!(grid.inner_dims(), UVec3::new(3, 2, 2));
    assert_eq!(grid.interior().count(), volume.len());
    for z in 0..2 {
      for y in 0..2 {
        for x in 0..3 {
          let p = UVec3::new(x, y, z);
          let idx = grid.padded_index(p);
          assert!(!grid.is_padding(idx));
          assert_eq!(grid.intensity(idx), volume.get(p));
        }
      }
    }
    assert!(grid.is_padding(0));
    assert_eq!(grid.intensity(0), f32::NEG_INFINITY);
  }

  #[test]
  fn test_coord_roundtrip() {
    let grid = Grid::from_volume(&ramp(UVec3::new(4, 3, 2)));
    for idx in 0..grid.len() {
      assert_eq!(grid.index(grid.coord(idx)), idx);
    }
  }

  #[test]
  fn test_neighbors_clip_at_border() {
    let grid = Grid::from_volume(&ramp(UVec3::new(1, 1, 1)));
    assert_eq!(grid.neighbors(0, Connectivity::Six).count(), 3);
    assert_eq!(grid.neighbors(0, Connectivity::TwentySix).count(), 7);
    let center = grid.padded_index(UVec3::ZERO);
    assert_eq!(grid.neighbors(center, Connectivity::TwentySix).count(), 26);
  }

  #[test]
  fn test_code_ignores_center() {
    let grid = Grid::from_volume(&ramp(UVec3::new(1, 1, 1)));
    let center = grid.padded_index(UVec3::ZERO);
    assert_eq!(grid.code(center, |_| true), crate::constants::NEIGHBOR_MASK);
    assert_eq!(grid.code(0, |_| true).count_ones(), 7);
  }

  #[test]
  fn test_downsample_averages_blocks() {
    let volume = Volume::new(UVec3::new(3, 1, 1), vec![1.0, 3.0, 5.0]).unwrap();
    let half = volume.downsample(2).unwrap();
    assert_eq!(half.dims(), UVec3::new(2, 1, 1));
    assert_eq!(half.data(), &[2.0, 5.0]);
    assert!(volume.downsample(0).is_err());
  }
}
