//! Test utilities: fixture volumes with known topology and helpers that run
//! the labeling stages on them.

use glam::UVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::generators::{resolve_isolated, simplify_generators};
use crate::regions::{grow, label_generators, label_terminals, SimplifyContext};
use crate::types::{CostMode, Intensity, RegionKind, SimplifyConfig, Thresholds};
use crate::volume::Volume;

// =============================================================================
// Fixture Volumes
// =============================================================================

/// True if every coordinate of `p` lies in `lo..=hi`.
pub fn in_box(p: UVec3, lo: UVec3, hi: UVec3) -> bool {
  p.cmpge(lo).all() && p.cmple(hi).all()
}

/// 5×5×5 background (−1) holding a 3×3×3 cube (+1) whose center sits exactly
/// at the iso-value. With S = K = N = 0 the center is a one-voxel Fill.
pub fn hollow_cube() -> Volume {
  Volume::from_fn(UVec3::splat(5), |p| {
    if p == UVec3::splat(2) {
      0.0
    } else if in_box(p, UVec3::ONE, UVec3::splat(3)) {
      1.0
    } else {
      -1.0
    }
  })
  .unwrap()
}

/// Two 3×3×3 blobs (+2) joined by one voxel at 0.5, in a −2 background.
/// With S = 0, K = 1, N = −1 the joint is a one-voxel Cut.
pub fn bridge() -> Volume {
  Volume::from_fn(UVec3::new(9, 5, 5), |p| {
    let left = in_box(p, UVec3::ONE, UVec3::splat(3));
    let right = in_box(p, UVec3::new(5, 1, 1), UVec3::new(7, 3, 3));
    if left || right {
      2.0
    } else if p == UVec3::new(4, 2, 2) {
      0.5
    } else {
      -2.0
    }
  })
  .unwrap()
}

/// Bridge voxel coordinate of [`bridge`].
pub const BRIDGE_JOINT: UVec3 = UVec3::new(4, 2, 2);

/// The two blobs of [`bridge`] joined by two separate one-voxel bridges at
/// [`DOUBLE_JOINTS`]: one handle.
pub fn double_bridge() -> Volume {
  Volume::from_fn(UVec3::new(9, 5, 5), |p| {
    let left = in_box(p, UVec3::ONE, UVec3::splat(3));
    let right = in_box(p, UVec3::new(5, 1, 1), UVec3::new(7, 3, 3));
    if left || right {
      2.0
    } else if DOUBLE_JOINTS.contains(&p) {
      0.5
    } else {
      -2.0
    }
  })
  .unwrap()
}

pub const DOUBLE_JOINTS: [UVec3; 2] = [UVec3::new(4, 1, 1), UVec3::new(4, 3, 3)];

/// Square ring of Core (+2) one voxel thick in the middle plane of a 7×7×3
/// volume, with one side voxel at 0.5 ([`WEAK_SEGMENT`]). With S = 0, K = 1,
/// N = −1 the ring is a handle that can be cut at the weak voxel.
pub fn weak_torus() -> Volume {
  Volume::from_fn(UVec3::new(7, 7, 3), |p| {
    let on_ring = p.z == 1 && in_box(p, UVec3::new(1, 1, 1), UVec3::new(5, 5, 1)) && !in_box(p, UVec3::new(2, 2, 1), UVec3::new(4, 4, 1));
    if p == WEAK_SEGMENT {
      0.5
    } else if on_ring {
      2.0
    } else {
      -2.0
    }
  })
  .unwrap()
}

pub const WEAK_SEGMENT: UVec3 = UVec3::new(3, 1, 1);

/// Square Core ring (+2) with a 2×2 cross-section in an 8×8×4 volume. One
/// arm, the box [`THICK_RING_SEGMENT`], sits at 0.5. With S = 0, K = 1,
/// N = −1 growth absorbs half of the arm and leaves a 2×2 Cut slab that
/// closes the handle; no single voxel of the slab can open it.
pub fn thick_ring() -> Volume {
  Volume::from_fn(UVec3::new(8, 8, 4), |p| {
    let on_ring = in_box(p, UVec3::new(1, 1, 1), UVec3::new(6, 6, 2)) && !in_box(p, UVec3::new(3, 3, 1), UVec3::new(4, 4, 2));
    if in_box(p, THICK_RING_SEGMENT[0], THICK_RING_SEGMENT[1]) {
      0.5
    } else if on_ring {
      2.0
    } else {
      -2.0
    }
  })
  .unwrap()
}

/// Corners of the weak arm of [`thick_ring`].
pub const THICK_RING_SEGMENT: [UVec3; 2] = [UVec3::new(3, 1, 1), UVec3::new(4, 2, 2)];

/// 3×3×3 Core cube (+2) in a −2 background whose center ([`SOFT_CENTER`])
/// sits at 0.5. With S = 0, K = 1, N = −1 the center is a one-voxel Cut;
/// removing it opens a cavity.
pub fn soft_core() -> Volume {
  Volume::from_fn(UVec3::splat(5), |p| {
    if p == SOFT_CENTER {
      0.5
    } else if in_box(p, UVec3::ONE, UVec3::splat(3)) {
      2.0
    } else {
      -2.0
    }
  })
  .unwrap()
}

pub const SOFT_CENTER: UVec3 = UVec3::splat(2);

/// 3×3 ring (+1) in the middle plane of a 5×5×3 volume whose hole is exactly
/// at the iso-value. With S = K = N = 0 the hole is a one-voxel Fill.
pub fn plugged_ring() -> Volume {
  Volume::from_fn(UVec3::new(5, 5, 3), |p| {
    if p.z != 1 || !in_box(p, UVec3::new(1, 1, 1), UVec3::new(3, 3, 1)) {
      -1.0
    } else if p.x == 2 && p.y == 2 {
      0.0
    } else {
      1.0
    }
  })
  .unwrap()
}

/// Hole coordinate of [`plugged_ring`].
pub const RING_HOLE: UVec3 = UVec3::new(2, 2, 1);

/// 2×2×2 ambiguous foreground blob (0.5) inside a −2 background. With
/// S = 0, K = 1, N = −1 it is a Cut with no foreground terminal anywhere.
pub fn isolated_blob() -> Volume {
  Volume::from_fn(UVec3::splat(6), |p| {
    if in_box(p, UVec3::splat(2), UVec3::splat(3)) {
      0.5
    } else {
      -2.0
    }
  })
  .unwrap()
}

/// Smoothed uniform noise in [−1, 1]: blobby shapes with tunnels and cavities.
pub fn random_blobs(seed: u64, dims: UVec3) -> Volume {
  let mut rng = StdRng::seed_from_u64(seed);
  let raw: Vec<Intensity> = (0..dims.x * dims.y * dims.z)
    .map(|_| rng.random_range(-1.0..1.0))
    .collect();
  let at = |x: i64, y: i64, z: i64| -> Option<Intensity> {
    if x < 0 || y < 0 || z < 0 || x >= dims.x as i64 || y >= dims.y as i64 || z >= dims.z as i64 {
      return None;
    }
    Some(raw[(x + dims.x as i64 * (y + dims.y as i64 * z)) as usize])
  };
  Volume::from_fn(dims, |p| {
    let (mut sum, mut count) = (0.0, 0);
    for dz in -1..=1i64 {
      for dy in -1..=1i64 {
        for dx in -1..=1i64 {
          if let Some(v) = at(p.x as i64 + dx, p.y as i64 + dy, p.z as i64 + dz) {
            sum += v;
            count += 1;
          }
        }
      }
    }
    // Stretch back toward [−1, 1] after averaging.
    (3.0 * sum / count as Intensity).clamp(-1.0, 1.0)
  })
  .unwrap()
}

// =============================================================================
// Configurations
// =============================================================================

/// S = K = N = 0, one unit per flipped voxel.
pub fn uniform_config() -> SimplifyConfig {
  SimplifyConfig::new(Thresholds::uniform(0.0)).with_cost_mode(CostMode::VoxelCount)
}

/// S = 0, K = 1, N = −1.
pub fn banded_config() -> SimplifyConfig {
  SimplifyConfig::new(Thresholds::new(0.0, 1.0, -1.0))
}

/// Band used with [`random_blobs`].
pub fn blob_config() -> SimplifyConfig {
  SimplifyConfig::new(Thresholds::new(0.0, 0.35, -0.35))
}

// =============================================================================
// Stage Helpers
// =============================================================================

/// Label terminals, grow them, label generators and build adjacency.
pub fn labeled(ctx: &mut SimplifyContext) {
  let mut queues = label_terminals(ctx);
  grow(ctx, &mut queues.core, RegionKind::Core);
  grow(ctx, &mut queues.neighborhood, RegionKind::Neighborhood);
  label_generators(ctx);
  ctx.build_adjacency();
}

/// [`labeled`], then generator simplification and isolation.
pub fn prepared(ctx: &mut SimplifyContext) {
  labeled(ctx);
  simplify_generators(ctx);
  resolve_isolated(ctx);
}

/// Label terminals and generators without growing.
pub fn labeled_without_growth(ctx: &mut SimplifyContext) {
  label_terminals(ctx);
  label_generators(ctx);
  ctx.build_adjacency();
}
