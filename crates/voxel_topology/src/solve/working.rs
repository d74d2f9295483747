//! Owned working copies of a slice of the region graph.
//!
//! Workers never touch the shared context: every cluster is copied into a
//! `WorkingGraph` holding its generators, the terminals adjacent to them and
//! the edges among those. Forcing decisions during repair only mutates the
//! copy. The voxel geometry is shared between the copies of one cluster.

use std::collections::HashMap;
use std::sync::Arc;

use smallvec::SmallVec;

use super::handles::ClusterGeometry;
use crate::regions::SimplifyContext;
use crate::types::{Connectivity, RegionId, RegionKind, Side};

/// One region of a working graph.
#[derive(Clone, Debug)]
pub struct WorkNode {
  pub region: RegionId,
  pub kind: RegionKind,
  pub cost_fg: f64,
  pub cost_bg: f64,
  /// Side fixed during repair; only set on generators.
  pub forced: Option<Side>,
}

impl WorkNode {
  /// Side of a terminal or forced generator.
  #[inline]
  pub fn side(&self) -> Option<Side> {
    if self.kind.is_terminal() {
      Some(self.kind.native_side())
    } else {
      self.forced
    }
  }

  #[inline]
  pub fn is_undecided(&self) -> bool {
    self.kind.is_generator() && self.forced.is_none()
  }

  #[inline]
  pub fn cost_to(&self, side: Side) -> f64 {
    match side {
      Side::Foreground => self.cost_fg,
      Side::Background => self.cost_bg,
    }
  }

  #[inline]
  pub fn magnitude(&self) -> f64 {
    self.cost_fg.max(self.cost_bg)
  }
}

/// Generators plus adjacent terminals, with their edges.
#[derive(Clone, Debug)]
pub struct WorkingGraph {
  nodes: Vec<WorkNode>,
  adjacency: Vec<SmallVec<[(u32, bool); 8]>>,
  index: HashMap<RegionId, u32>,
  connectivity: [Connectivity; 2],
  geometry: Arc<ClusterGeometry>,
}

impl WorkingGraph {
  /// Copy `generators` (ascending ids) and every terminal adjacent to them.
  pub fn cluster(ctx: &SimplifyContext, generators: &[RegionId]) -> Self {
    let mut ids: Vec<RegionId> = generators.to_vec();
    for &g in generators {
      ids.extend(ctx.graph.neighbors(g).map(|(n, _)| n).filter(|&n| ctx.regions.kind(n).is_terminal()));
    }
    ids.sort_unstable();
    ids.dedup();

    let index: HashMap<RegionId, u32> = ids.iter().enumerate().map(|(i, &id)| (id, i as u32)).collect();
    let nodes = ids
      .iter()
      .map(|&id| {
        let region = ctx.regions.get(id);
        WorkNode {
          region: id,
          kind: region.kind,
          cost_fg: region.cost_fg,
          cost_bg: region.cost_bg,
          forced: None,
        }
      })
      .collect();
    let adjacency = ids
      .iter()
      .map(|&id| {
        ctx
          .graph
          .neighbors(id)
          .filter_map(|(n, strong)| index.get(&n).map(|&j| (j, strong)))
          .collect()
      })
      .collect();
    let geometry = Arc::new(ClusterGeometry::capture(ctx, &ids, &index));

    Self {
      nodes,
      adjacency,
      index,
      connectivity: [
        ctx.connectivity(Side::Foreground),
        ctx.connectivity(Side::Background),
      ],
      geometry,
    }
  }

  /// Every remaining generator with its adjacent terminals.
  pub fn global(ctx: &SimplifyContext) -> Self {
    Self::cluster(ctx, &ctx.regions.generator_ids())
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  #[inline]
  pub fn node(&self, i: u32) -> &WorkNode {
    &self.nodes[i as usize]
  }

  pub fn nodes(&self) -> &[WorkNode] {
    &self.nodes
  }

  #[inline]
  pub fn index_of(&self, region: RegionId) -> Option<u32> {
    self.index.get(&region).copied()
  }

  #[inline]
  pub fn neighbors(&self, i: u32) -> &[(u32, bool)] {
    &self.adjacency[i as usize]
  }

  #[inline]
  pub fn connectivity(&self, side: Side) -> Connectivity {
    self.connectivity[side.index()]
  }

  #[inline]
  pub fn geometry(&self) -> &ClusterGeometry {
    &self.geometry
  }

  /// Whether an edge joins its endpoints on `side`.
  #[inline]
  pub fn admits(&self, side: Side, strong: bool) -> bool {
    self.connectivity(side).admits(strong)
  }

  pub fn generators(&self) -> impl Iterator<Item = u32> + '_ {
    (0..self.nodes.len() as u32).filter(|&i| self.nodes[i as usize].kind.is_generator())
  }

  pub fn undecided(&self) -> impl Iterator<Item = u32> + '_ {
    (0..self.nodes.len() as u32).filter(|&i| self.nodes[i as usize].is_undecided())
  }

  pub fn undecided_count(&self) -> usize {
    self.nodes.iter().filter(|n| n.is_undecided()).count()
  }

  /// Fix generator `i` to `side`. Forcing a Fill to the foreground drags its
  /// face-adjacent undecided Cuts along; forcing a Cut to the background drags
  /// its face-adjacent undecided Fills. Returns every node forced.
  pub fn force(&mut self, i: u32, side: Side) -> SmallVec<[u32; 8]> {
    let mut forced = SmallVec::new();
    let node = &mut self.nodes[i as usize];
    debug_assert!(node.is_undecided(), "node {i} already decided");
    node.forced = Some(side);
    forced.push(i);

    let native = node.kind.native_side();
    if side == native {
      return forced;
    }
    let dragged = RegionKind::generator(side);
    for k in 0..self.adjacency[i as usize].len() {
      let (j, strong) = self.adjacency[i as usize][k];
      let other = &mut self.nodes[j as usize];
      if strong && other.is_undecided() && other.kind == dragged {
        other.forced = Some(side);
        forced.push(j);
      }
    }
    forced
  }

  /// Cost of every forced node on its forced side.
  pub fn forced_cost(&self) -> f64 {
    self
      .nodes
      .iter()
      .filter_map(|n| n.forced.map(|s| n.cost_to(s)))
      .sum()
  }

  /// Final side of every generator: forced side, otherwise `decision`.
  pub fn decisions(&self, mut decision: impl FnMut(u32) -> Side) -> Vec<(RegionId, Side)> {
    self
      .generators()
      .map(|i| {
        let node = self.node(i);
        (node.region, node.forced.unwrap_or_else(|| decision(i)))
      })
      .collect()
  }
}
