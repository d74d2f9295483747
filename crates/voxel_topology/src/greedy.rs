//! Greedy post-pass: flip whole generators while the Betti total drops.
//!
//! Generators start on their native side. Each round evaluates flipping
//! every generator to the other side and applies the flip with the most
//! negative ΔH0 + ΔH1 + ΔH2 among those that add no component and no
//! cavity. Once nothing improves, every generator is decided on the side it
//! ended up on.
//!
//! The side graphs are built once; each flip refreshes the flipped region
//! in both.

use std::collections::HashMap;

use glam::IVec3;
use tracing::{debug, info, trace};

use crate::regions::SimplifyContext;
use crate::topology::{flip_delta, BettiDelta, DisjointSet, SideGraph};
use crate::types::{RegionId, Side, NO_REGION};

/// Counters of one greedy pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GreedyStats {
  pub flips: usize,
  pub evaluations: usize,
  /// Side-graph refreshes after flips.
  pub refreshes: usize,
  /// Generators committed at the end.
  pub decided: usize,
}

/// Flip state of the generators on top of the context.
struct Overlay {
  sides: HashMap<RegionId, Side>,
}

impl Overlay {
  fn side(&self, ctx: &SimplifyContext, id: RegionId) -> Side {
    self
      .sides
      .get(&id)
      .copied()
      .unwrap_or_else(|| ctx.regions.kind(id).native_side())
  }

  fn voxel_side(&self, ctx: &SimplifyContext, idx: usize) -> Side {
    match ctx.grid.region(idx) {
      NO_REGION => ctx.polarity(idx),
      id => self.side(ctx, id),
    }
  }

  /// Betti change of moving generator `id` to the other side.
  fn flip(&self, ctx: &SimplifyContext, graphs: &[SideGraph; 2], id: RegionId) -> BettiDelta {
    let current = self.side(ctx, id);
    let target = current.opposite();
    let leaving = graphs[current.index()].split_count(id) as i64 - 1;
    let joining = self.joining_delta(ctx, &graphs[target.index()], id, target);

    let coords: Vec<IVec3> = ctx.coords_of(ctx.regions.get(id));
    let chi = flip_delta(&coords, ctx.config.foreground, |q| {
      ctx.grid.contains(q) && self.voxel_side(ctx, ctx.grid.index(q)).is_foreground()
    })
    .chi();

    match current {
      Side::Foreground => BettiDelta::from_parts(leaving, joining, chi),
      Side::Background => BettiDelta::from_parts(joining, leaving, chi),
    }
  }

  /// Components on `target` after `id` joins it, minus before. Counted on
  /// voxels since a generator need not be connected under `target`'s
  /// connectivity.
  fn joining_delta(&self, ctx: &SimplifyContext, graph: &SideGraph, id: RegionId, target: Side) -> i64 {
    let voxels: Vec<usize> = ctx
      .regions
      .get(id)
      .voxels
      .iter()
      .copied()
      .filter(|&v| ctx.grid.region(v) == id)
      .collect();
    let slot: HashMap<usize, u32> = voxels.iter().enumerate().map(|(i, &v)| (v, i as u32)).collect();
    let mut dsu = DisjointSet::new(voxels.len());
    let mut components: HashMap<u32, u32> = HashMap::new();
    let connectivity = ctx.connectivity(target);
    for (i, &v) in voxels.iter().enumerate() {
      for (n, _) in ctx.grid.neighbors(v, connectivity) {
        if let Some(&j) = slot.get(&n) {
          dsu.union(i as u32, j);
          continue;
        }
        let r = ctx.grid.region(n);
        if r == NO_REGION || self.side(ctx, r) != target {
          continue;
        }
        if let Some(c) = graph.component(r) {
          let e = *components.entry(c).or_insert_with(|| dsu.push());
          dsu.union(i as u32, e);
        }
      }
    }
    dsu.set_count() as i64 - components.len() as i64
  }
}

/// Flip generators greedily, then decide every generator.
pub fn greedy_pass(ctx: &mut SimplifyContext) -> GreedyStats {
  let mut stats = GreedyStats::default();
  let generators = ctx.regions.generator_ids();
  let mut overlay = Overlay {
    sides: generators
      .iter()
      .map(|&g| (g, ctx.regions.kind(g).native_side()))
      .collect(),
  };

  let mut graphs = [
    SideGraph::build_with(ctx, Side::Foreground, |r| overlay.side(ctx, r.id)),
    SideGraph::build_with(ctx, Side::Background, |r| overlay.side(ctx, r.id)),
  ];
  // Every flip lowers the Betti total by at least one.
  let limit = ctx.betti().0.total() as usize;
  while stats.flips < limit {
    let mut best: Option<(i64, f64, RegionId)> = None;
    for &g in &generators {
      stats.evaluations += 1;
      let delta = overlay.flip(ctx, &graphs, g);
      if delta.h0 > 0 || delta.h2 > 0 || delta.total() >= 0 {
        continue;
      }
      let cost = ctx.regions.get(g).cost_to(overlay.side(ctx, g).opposite());
      let better = match best {
        None => true,
        Some((total, best_cost, _)) => {
          delta.total() < total || (delta.total() == total && cost < best_cost - 1e-12)
        }
      };
      if better {
        best = Some((delta.total(), cost, g));
      }
    }
    let Some((total, cost, g)) = best else {
      break;
    };
    let side = overlay.side(ctx, g).opposite();
    trace!(region = g, ?side, total, cost, "greedy flip");
    overlay.sides.insert(g, side);
    for graph in &mut graphs {
      graph.refresh(ctx, |r| overlay.side(ctx, r.id), &[g]);
    }
    stats.refreshes += 1;
    stats.flips += 1;
  }

  for &g in &generators {
    if ctx.regions.try_get(g).is_some_and(|r| r.kind.is_generator()) {
      let side = overlay.side(ctx, g);
      ctx.decide(g, side);
      stats.decided += 1;
    }
  }
  debug!(
    flips = stats.flips,
    evaluations = stats.evaluations,
    "greedy flips finished"
  );
  info!(decided = stats.decided, "greedy pass decided generators");
  stats
}

#[cfg(test)]
#[path = "greedy_test.rs"]
mod greedy_test;
