//! Boundary grower: absorbs ambiguous voxels into adjacent terminals while
//! the absorption is simple.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use smallvec::SmallVec;
use tracing::debug;

use super::SimplifyContext;
use crate::types::{RegionId, RegionKind, NO_REGION};

/// Candidate voxel with its growth priority.
#[derive(Clone, Copy, Debug)]
pub struct GrowthRequest {
  pub voxel: usize,
  /// |v − S|; smaller values are absorbed first.
  pub priority: f64,
}

impl PartialEq for GrowthRequest {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for GrowthRequest {}

impl PartialOrd for GrowthRequest {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for GrowthRequest {
  fn cmp(&self, other: &Self) -> Ordering {
    // Reversed so the max-heap pops the closest voxel, lower index first on ties.
    other
      .priority
      .total_cmp(&self.priority)
      .then_with(|| other.voxel.cmp(&self.voxel))
  }
}

/// Priority queue feeding one terminal kind's growth pass.
#[derive(Debug, Default)]
pub struct GrowthQueue {
  heap: BinaryHeap<GrowthRequest>,
}

impl GrowthQueue {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, voxel: usize, priority: f64) {
    self.heap.push(GrowthRequest { voxel, priority });
  }

  pub fn pop(&mut self) -> Option<GrowthRequest> {
    self.heap.pop()
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.heap.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.heap.is_empty()
  }
}

/// Queue `idx` for growth unless it is labeled, already pending, or not an
/// ambiguous voxel of `terminal`'s side.
pub(crate) fn enqueue_candidate(
  ctx: &mut SimplifyContext,
  queue: &mut GrowthQueue,
  idx: usize,
  terminal: RegionKind,
) {
  if ctx.grid.is_labeled(idx) || ctx.grid.pending(idx) {
    return;
  }
  let kind = ctx.classify(idx);
  if !kind.is_generator() || kind.native_side() != terminal.native_side() {
    return;
  }
  ctx.grid.set_pending(idx, true);
  let shape = ctx.config.thresholds.shape as f64;
  queue.push(idx, (ctx.grid.intensity(idx) as f64 - shape).abs());
}

/// Drain `queue`, absorbing simple voxels into the adjacent region of kind
/// `terminal`. Returns the number of absorbed voxels.
pub fn grow(ctx: &mut SimplifyContext, queue: &mut GrowthQueue, terminal: RegionKind) -> usize {
  debug_assert!(terminal.is_terminal());
  let connectivity = ctx.connectivity(terminal.native_side());
  let mut absorbed = 0;

  while let Some(GrowthRequest { voxel, .. }) = queue.pop() {
    ctx.grid.set_pending(voxel, false);
    if ctx.grid.is_labeled(voxel) {
      continue;
    }

    let mut touching: SmallVec<[RegionId; 4]> = SmallVec::new();
    for (n, _) in ctx.grid.neighbors(voxel, connectivity) {
      let id = ctx.grid.region(n);
      if id != NO_REGION && ctx.regions.kind(id) == terminal && !touching.contains(&id) {
        touching.push(id);
      }
    }
    if touching.len() != 1 {
      continue;
    }

    let code = ctx
      .grid
      .code(voxel, |q| ctx.kind_at(q) == Some(terminal));
    if !ctx.oracle.is_simple(code, connectivity) {
      continue;
    }

    ctx.assign(voxel, touching[0]);
    absorbed += 1;
    let exposed: SmallVec<[usize; 26]> = ctx
      .grid
      .neighbors(voxel, connectivity)
      .map(|(n, _)| n)
      .collect();
    for n in exposed {
      enqueue_candidate(ctx, queue, n, terminal);
    }
  }

  debug!(?terminal, absorbed, "boundary growth finished");
  absorbed
}
