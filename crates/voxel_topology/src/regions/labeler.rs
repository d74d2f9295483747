//! Region labeler: one sweep for the terminals, one for the generators.

use std::collections::HashSet;

use glam::IVec3;
use smallvec::SmallVec;
use tracing::debug;

use super::grower::{enqueue_candidate, GrowthQueue};
use super::SimplifyContext;
use crate::constants::offset_order;
use crate::types::{Connectivity, RegionId, RegionKind, Side};

/// Growth queues collected while flood-filling the terminals.
#[derive(Debug, Default)]
pub struct GrowthQueues {
  pub core: GrowthQueue,
  pub neighborhood: GrowthQueue,
}

/// Flood-fill every Core (foreground connectivity) and Neighborhood
/// (background connectivity) region. Ambiguous same-polarity voxels touching
/// a filled terminal are queued for the grower.
pub fn label_terminals(ctx: &mut SimplifyContext) -> GrowthQueues {
  let mut queues = GrowthQueues::default();
  for seed in 0..ctx.grid.len() {
    if ctx.grid.is_labeled(seed) {
      continue;
    }
    let kind = ctx.classify(seed);
    match kind {
      RegionKind::Core => flood_terminal(ctx, seed, kind, &mut queues.core),
      RegionKind::Neighborhood => flood_terminal(ctx, seed, kind, &mut queues.neighborhood),
      _ => {}
    }
  }
  debug!(
    core = ctx.regions.count(RegionKind::Core),
    neighborhood = ctx.regions.count(RegionKind::Neighborhood),
    queued = queues.core.len() + queues.neighborhood.len(),
    "terminals labeled"
  );
  queues
}

fn flood_terminal(ctx: &mut SimplifyContext, seed: usize, kind: RegionKind, queue: &mut GrowthQueue) {
  let connectivity = ctx.connectivity(kind.native_side());
  let id = ctx.new_region(kind);
  ctx.assign(seed, id);
  let mut stack = vec![seed];
  while let Some(v) = stack.pop() {
    let neighbors: SmallVec<[usize; 26]> =
      ctx.grid.neighbors(v, connectivity).map(|(n, _)| n).collect();
    for n in neighbors {
      if ctx.grid.is_labeled(n) {
        continue;
      }
      if ctx.classify(n) == kind {
        ctx.assign(n, id);
        stack.push(n);
      } else {
        enqueue_candidate(ctx, queue, n, kind);
      }
    }
  }
}

/// Label every voxel left unlabeled after growth as a Cut or Fill region.
pub fn label_generators(ctx: &mut SimplifyContext) -> usize {
  let mut created = 0;
  let mut visited = HashSet::new();
  for seed in 0..ctx.grid.len() {
    if ctx.grid.is_labeled(seed) {
      continue;
    }
    let kind = ctx.classify(seed);
    debug_assert!(kind.is_generator(), "terminal voxel {seed} left unlabeled");
    let voxels = collect_component(ctx, seed, kind.native_side(), &mut visited, |ctx, n| {
      !ctx.grid.is_labeled(n) && ctx.classify(n) == kind
    });
    let id = ctx.new_region(kind);
    for v in voxels {
      ctx.assign(v, id);
    }
    created += 1;
  }
  debug!(created, "generators labeled");
  created
}

/// Whether a diagonal step `d` from `v` is a valid connection for a region of
/// `side`: none of the voxels the step corners around may sit on the
/// opposite side.
pub(crate) fn corner_clear(ctx: &SimplifyContext, v: usize, d: IVec3, side: Side) -> bool {
  if offset_order(d) <= 1 {
    return true;
  }
  let mut seen: SmallVec<[IVec3; 6]> = SmallVec::new();
  for mask in 1..7u32 {
    let s = IVec3::new(
      if mask & 1 != 0 { d.x } else { 0 },
      if mask & 2 != 0 { d.y } else { 0 },
      if mask & 4 != 0 { d.z } else { 0 },
    );
    if s == IVec3::ZERO || s == d || seen.contains(&s) {
      continue;
    }
    seen.push(s);
    match ctx.grid.offset(v, s) {
      Some(q) if ctx.current_side(q) == side => {}
      _ => return false,
    }
  }
  true
}

/// Flood from `seed` over voxels accepted by `member`, joining diagonal
/// neighbors under the corner rule for `side`.
pub(crate) fn collect_component(
  ctx: &SimplifyContext,
  seed: usize,
  side: Side,
  visited: &mut HashSet<usize>,
  member: impl Fn(&SimplifyContext, usize) -> bool,
) -> Vec<usize> {
  let mut out = vec![seed];
  visited.insert(seed);
  let mut stack = vec![seed];
  while let Some(v) = stack.pop() {
    for (n, d) in ctx.grid.neighbors(v, Connectivity::TwentySix) {
      if visited.contains(&n) || !member(ctx, n) || !corner_clear(ctx, v, d, side) {
        continue;
      }
      visited.insert(n);
      out.push(n);
      stack.push(n);
    }
  }
  out
}

/// Re-flood what is left of generator `id`. The first piece keeps `id`, every
/// other piece becomes a fresh generator of the same kind. Returns all pieces
/// (empty if `id` lost every voxel and was invalidated).
pub fn split_generator(ctx: &mut SimplifyContext, id: RegionId) -> Vec<RegionId> {
  if !ctx.refresh_region(id) {
    return Vec::new();
  }
  let kind = ctx.regions.kind(id);
  let voxels = ctx.regions.get(id).voxels.clone();
  let mut visited = HashSet::with_capacity(voxels.len());
  let mut pieces = Vec::new();
  for &seed in &voxels {
    if visited.contains(&seed) {
      continue;
    }
    pieces.push(collect_component(ctx, seed, kind.native_side(), &mut visited, |ctx, n| {
      ctx.grid.region(n) == id
    }));
  }

  let mut ids = vec![id];
  if pieces.len() > 1 {
    for piece in pieces.into_iter().skip(1) {
      let fresh = ctx.new_region(kind);
      for v in piece {
        ctx.assign(v, fresh);
      }
      ids.push(fresh);
    }
    ctx.refresh_region(id);
    debug!(region = id, pieces = ids.len(), "generator split");
  }
  for &piece in &ids {
    ctx.rebuild_adjacency(piece);
  }
  ids
}
