//! Voxel-by-voxel shrinking of generators under a Betti acceptance rule.
//!
//! Removing a voxel v from generator G (native side s) moves v to the
//! opposite side o. Its effect on the Betti numbers is assembled from three
//! local quantities:
//!
//! ```text
//! ΔH_s  change in s-side components: mini-graph of G's voxels plus the
//!       groups of s-side regions that stay connected once G is gone
//! ΔH_o  1 − (distinct o-side components touching v)
//! Δχ    from the cells incident to v
//!
//! Cut  (s = fg):  ΔH0 = ΔH_s, ΔH2 = ΔH_o
//! Fill (s = bg):  ΔH0 = ΔH_o, ΔH2 = ΔH_s
//! ΔH1 = ΔH0 + ΔH2 − Δχ
//! ```

use std::collections::HashMap;

use glam::IVec3;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::constants::offset_order;
use crate::regions::{split_generator, SimplifyContext};
use crate::simple_point::topological_number;
use crate::topology::{voxel_flip_chi, BettiDelta, DisjointSet, Piece, SideGraph};
use crate::types::{AcceptanceRule, Connectivity, RegionId, RegionKind, Side, NO_REGION};

/// Counters of one simplifier run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimplifierStats {
  /// Voxels moved to the opposite side.
  pub removed: usize,
  /// Candidate evaluations that were rejected.
  pub rejected: usize,
  /// Extra generators created by re-flooding a split remainder.
  pub split: usize,
  /// Generators that lost every voxel.
  pub emptied: usize,
  /// Full passes over the generators.
  pub passes: usize,
  /// Incremental side-graph updates, one per changed generator.
  pub graph_refreshes: usize,
}

/// Shrink every generator until a whole pass accepts nothing, at most
/// `simplifier_passes` times.
///
/// Both side graphs are built once and refreshed around each generator
/// that changed.
pub fn simplify_generators(ctx: &mut SimplifyContext) -> SimplifierStats {
  let mut stats = SimplifierStats::default();
  let mut graphs = [
    SideGraph::build(ctx, Side::Foreground),
    SideGraph::build(ctx, Side::Background),
  ];
  for _ in 0..ctx.config.simplifier_passes {
    stats.passes += 1;
    let before = stats.removed;
    for id in ctx.regions.generator_ids() {
      let still_generator = ctx.regions.try_get(id).is_some_and(|r| r.kind.is_generator());
      if !still_generator {
        continue;
      }
      let touched = simplify_generator(ctx, id, &graphs, &mut stats);
      if !touched.is_empty() {
        for graph in &mut graphs {
          graph.refresh(ctx, |r| r.kind.native_side(), &touched);
        }
        stats.graph_refreshes += 1;
      }
    }
    if stats.removed == before {
      break;
    }
  }
  debug!(
    removed = stats.removed,
    rejected = stats.rejected,
    split = stats.split,
    emptied = stats.emptied,
    passes = stats.passes,
    refreshes = stats.graph_refreshes,
    "generator simplification finished"
  );
  stats
}

/// Per-generator state for evaluating removals.
struct Removal<'g> {
  generator: RegionId,
  own: Side,
  own_connectivity: Connectivity,
  other_connectivity: Connectivity,
  /// s-side neighbor region → group index.
  groups: HashMap<RegionId, u32>,
  group_count: u32,
  /// o-side graph as it was before this generator changed.
  other_graph: &'g SideGraph,
  /// o-side region → element of `other_components`.
  other_elements: HashMap<RegionId, u32>,
  /// Component label in `other_graph` → element of `other_components`.
  component_elements: HashMap<u32, u32>,
  other_components: DisjointSet,
  /// Regions whose voxels or edges changed.
  touched: Vec<RegionId>,
}

impl<'g> Removal<'g> {
  fn new(ctx: &SimplifyContext, generator: RegionId, own_graph: &SideGraph, other_graph: &'g SideGraph) -> Self {
    let own = ctx.regions.kind(generator).native_side();
    let mut groups = HashMap::new();
    let mut pieces: HashMap<Piece, u32> = HashMap::new();
    for neighbor in own_graph.neighbors(generator) {
      if let Some(piece) = own_graph.piece_of(generator, neighbor) {
        let next = pieces.len() as u32;
        let group = *pieces.entry(piece).or_insert(next);
        groups.insert(neighbor, group);
      }
    }
    Self {
      generator,
      own,
      own_connectivity: ctx.connectivity(own),
      other_connectivity: ctx.connectivity(own.opposite()),
      group_count: pieces.len() as u32,
      groups,
      other_graph,
      other_elements: HashMap::new(),
      component_elements: HashMap::new(),
      other_components: DisjointSet::new(0),
      touched: vec![generator],
    }
  }

  /// Element of `region`, shared by every region of one o-side component.
  fn other_element(&mut self, region: RegionId) -> u32 {
    if let Some(&e) = self.other_elements.get(&region) {
      return e;
    }
    let e = match self.other_graph.component(region) {
      Some(c) => *self
        .component_elements
        .entry(c)
        .or_insert_with(|| self.other_components.push()),
      None => self.other_components.push(),
    };
    self.other_elements.insert(region, e);
    e
  }

  /// Distinct o-side regions touching `v` under the o-side connectivity.
  fn other_neighbors(&self, ctx: &SimplifyContext, v: usize) -> SmallVec<[RegionId; 8]> {
    let mut out: SmallVec<[RegionId; 8]> = SmallVec::new();
    for (n, _) in ctx.grid.neighbors(v, self.other_connectivity) {
      let id = ctx.grid.region(n);
      if id != NO_REGION && ctx.current_side(n) != self.own && !out.contains(&id) {
        out.push(id);
      }
    }
    out
  }

  fn other_delta(&mut self, ctx: &SimplifyContext, v: usize) -> i64 {
    let neighbors = self.other_neighbors(ctx, v);
    let mut roots: SmallVec<[u32; 8]> = SmallVec::new();
    for id in neighbors {
      let e = self.other_element(id);
      let root = self.other_components.find(e);
      if !roots.contains(&root) {
        roots.push(root);
      }
    }
    1 - roots.len() as i64
  }

  /// ΔH on the generator's own side.
  fn own_delta(&self, ctx: &SimplifyContext, v: usize) -> i64 {
    let code = ctx.grid.code(v, |q| ctx.current_side(q) == self.own);
    match topological_number(code, self.own_connectivity) {
      0 => -1,
      1 => 0,
      _ => self.mini_graph_delta(ctx, v),
    }
  }

  /// Components of G's voxels plus neighbor groups, with and without `v`.
  fn mini_graph_delta(&self, ctx: &SimplifyContext, v: usize) -> i64 {
    let members: Vec<usize> = ctx
      .regions
      .get(self.generator)
      .voxels
      .iter()
      .copied()
      .filter(|&m| ctx.grid.region(m) == self.generator)
      .collect();
    let slot: HashMap<usize, u32> = members
      .iter()
      .enumerate()
      .map(|(i, &m)| (m, self.group_count + i as u32))
      .collect();

    let count = |excluded: Option<usize>| -> usize {
      let mut dsu = DisjointSet::new(self.group_count as usize + members.len());
      for &m in &members {
        if Some(m) == excluded {
          continue;
        }
        let a = slot[&m];
        for (n, _) in ctx.grid.neighbors(m, self.own_connectivity) {
          if Some(n) == excluded {
            continue;
          }
          if let Some(&b) = slot.get(&n) {
            dsu.union(a, b);
          } else if let Some(&g) = self.groups.get(&ctx.grid.region(n)) {
            dsu.union(a, g);
          }
        }
      }
      dsu.set_count() - usize::from(excluded.is_some())
    };

    count(Some(v)) as i64 - count(None) as i64
  }

  fn delta(&self, own: i64, other: i64, chi: i64) -> BettiDelta {
    match self.own {
      Side::Foreground => BettiDelta::from_parts(own, other, chi),
      Side::Background => BettiDelta::from_parts(other, own, chi),
    }
  }

  /// Evaluate removing `v`; returns the delta when `rule` accepts it.
  fn evaluate(&mut self, ctx: &SimplifyContext, v: usize, rule: AcceptanceRule) -> Option<BettiDelta> {
    let other = self.other_delta(ctx, v);
    let p = ctx.grid.coord(v);
    let chi = voxel_flip_chi(p, ctx.config.foreground, |q: IVec3| {
      ctx.grid.contains(q) && ctx.current_side(ctx.grid.index(q)).is_foreground()
    });

    // ΔH_s ≥ 0 whenever v has own-side neighbors, so a strict rejection
    // with ΔH_s = 0 is final.
    if rule == AcceptanceRule::Strict && !rule.accepts(&self.delta(0, other, chi)) {
      let code = ctx.grid.code(v, |q| ctx.current_side(q) == self.own);
      if topological_number(code, self.own_connectivity) > 0 {
        return None;
      }
    }

    let delta = self.delta(self.own_delta(ctx, v), other, chi);
    rule.accepts(&delta).then_some(delta)
  }

  /// Move `v` to the opposite side and record the new o-side connections.
  fn apply(&mut self, ctx: &mut SimplifyContext, v: usize) {
    let other = self.own.opposite();
    let terminal = RegionKind::terminal(other);
    let neighbors = self.other_neighbors(ctx, v);
    let elements: SmallVec<[u32; 8]> = neighbors.iter().map(|&id| self.other_element(id)).collect();

    let adjacent = neighbors
      .iter()
      .copied()
      .filter(|&id| ctx.regions.kind(id) == terminal)
      .min();
    let host = match adjacent {
      Some(id) => id,
      None => ctx.new_region(terminal),
    };
    ctx.assign(v, host);
    let contacts: SmallVec<[(usize, IVec3); 26]> =
      ctx.grid.neighbors(v, Connectivity::TwentySix).collect();
    for (n, d) in contacts {
      let id = ctx.grid.region(n);
      if id != NO_REGION && id != host {
        ctx.graph.add(host, id, offset_order(d) == 1);
        self.touched.push(id);
      }
    }
    self.touched.push(host);
    // Terminals merged into the host all touch `v`.
    let survivor = ctx.coalesce(host);

    let joined = self.other_element(survivor);
    for e in elements {
      self.other_components.union(joined, e);
    }
  }
}

/// Shrink one generator. Returns the regions whose voxels or edges changed,
/// or nothing when no voxel moved.
fn simplify_generator(
  ctx: &mut SimplifyContext,
  generator: RegionId,
  graphs: &[SideGraph; 2],
  stats: &mut SimplifierStats,
) -> Vec<RegionId> {
  let own = ctx.regions.kind(generator).native_side();
  let mut removal = Removal::new(ctx, generator, &graphs[own.index()], &graphs[own.opposite().index()]);
  let rule = ctx.config.acceptance;
  let start = ctx.regions.get(generator).voxels.len();
  let mut removed = 0;

  loop {
    let mut candidates: Vec<(f64, usize)> = ctx
      .regions
      .get(generator)
      .voxels
      .iter()
      .filter(|&&v| ctx.grid.region(v) == generator)
      .map(|&v| (ctx.voxel_cost(v, own.opposite()), v))
      .collect();
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut accepted = 0;
    for (_, v) in candidates {
      match removal.evaluate(ctx, v, rule) {
        Some(delta) => {
          trace!(voxel = v, region = generator, ?delta, "voxel removed");
          removal.apply(ctx, v);
          accepted += 1;
        }
        None => stats.rejected += 1,
      }
    }
    removed += accepted;
    let emptied = !ctx
      .regions
      .get(generator)
      .voxels
      .iter()
      .any(|&v| ctx.grid.region(v) == generator);
    if accepted == 0 || emptied {
      break;
    }
  }

  if removed == 0 {
    return Vec::new();
  }
  stats.removed += removed;
  let pieces = split_generator(ctx, generator);
  if pieces.is_empty() {
    stats.emptied += 1;
  } else {
    stats.split += pieces.len() - 1;
  }
  debug!(region = generator, start, removed, pieces = pieces.len(), "generator shrunk");

  let mut touched = removal.touched;
  touched.extend(pieces);
  touched.sort_unstable();
  touched.dedup();
  touched
}
