//! Exact Betti changes of generator flips on a working graph.
//!
//! A tree can claim every generator for exactly one side and still keep a
//! handle that flipping one of them would open. With a side fixed for every
//! node, the change of a flip is assembled the way the greedy pass does it:
//!
//! ```text
//! leaving side   pieces the node's component falls into, minus one
//! joining side   voxel union of the flipped voxels with the components
//!                they touch, minus those components
//! Δχ             cells around the flipped voxels
//! ```

use std::collections::{HashMap, HashSet};

use glam::IVec3;
use smallvec::{smallvec, SmallVec};

use super::WorkingGraph;
use crate::hypergraph::Grouping;
use crate::regions::SimplifyContext;
use crate::topology::{flip_delta, AdjacencyLists, BettiDelta, DisjointSet, LowLink};
use crate::types::{Connectivity, RegionId, RegionKind, Side};

/// Voxels of the generators of a working graph and the node owning every
/// voxel around them.
#[derive(Clone, Debug, Default)]
pub struct ClusterGeometry {
  /// Per working node, padded grid coordinates; empty for terminals.
  voxels: Vec<Vec<IVec3>>,
  /// Node of every voxel within one step of a generator voxel.
  owners: HashMap<IVec3, u32>,
}

impl ClusterGeometry {
  pub(super) fn capture(ctx: &SimplifyContext, ids: &[RegionId], index: &HashMap<RegionId, u32>) -> Self {
    let mut voxels = vec![Vec::new(); ids.len()];
    let mut owners = HashMap::new();
    for (i, &id) in ids.iter().enumerate() {
      let region = ctx.regions.get(id);
      if !region.kind.is_generator() {
        continue;
      }
      let coords = ctx.coords_of(region);
      for &p in &coords {
        for &d in std::iter::once(&IVec3::ZERO).chain(Connectivity::TwentySix.offsets()) {
          let q = p + d;
          if owners.contains_key(&q) || !ctx.grid.contains(q) {
            continue;
          }
          if let Some(&node) = index.get(&ctx.grid.region(ctx.grid.index(q))) {
            owners.insert(q, node);
          }
        }
      }
      voxels[i] = coords;
    }
    Self { voxels, owners }
  }

  #[inline]
  pub fn voxels(&self, node: u32) -> &[IVec3] {
    self.voxels.get(node as usize).map_or(&[], Vec::as_slice)
  }

  #[inline]
  pub fn owner(&self, p: IVec3) -> Option<u32> {
    self.owners.get(&p).copied()
  }
}

/// A side for every node of a working graph, with per-side connectivity.
pub struct Assignment<'a> {
  graph: &'a WorkingGraph,
  sides: Vec<Side>,
  /// Grouped terminal pairs as working indices.
  joins: Vec<(u32, u32)>,
  lowlink: [LowLink; 2],
}

impl<'a> Assignment<'a> {
  pub fn new(graph: &'a WorkingGraph, sides: Vec<Side>, grouping: &Grouping) -> Self {
    debug_assert_eq!(sides.len(), graph.len());
    let joins: Vec<(u32, u32)> = grouping
      .joins()
      .iter()
      .filter_map(|&(a, b)| Some((graph.index_of(a)?, graph.index_of(b)?)))
      .collect();
    let lowlink = [Side::Foreground, Side::Background].map(|side| {
      let lists = side_lists(graph, &sides, &joins, side);
      LowLink::compute_from(&lists, (0..graph.len() as u32).filter(|&i| sides[i as usize] == side))
    });
    Self {
      graph,
      sides,
      joins,
      lowlink,
    }
  }

  #[inline]
  pub fn side(&self, i: u32) -> Side {
    self.sides[i as usize]
  }

  /// Nodes that move along when undecided generator `g` goes to `target`:
  /// `g` and, off its native side, the face-adjacent undecided generators
  /// native to `target` that sit elsewhere.
  pub fn moved_with(&self, g: u32, target: Side) -> SmallVec<[u32; 8]> {
    let mut moved: SmallVec<[u32; 8]> = smallvec![g];
    if self.graph.node(g).kind.native_side() == target {
      return moved;
    }
    let dragged = RegionKind::generator(target);
    for &(j, strong) in self.graph.neighbors(g) {
      let other = self.graph.node(j);
      if strong && other.is_undecided() && other.kind == dragged && self.side(j) != target {
        moved.push(j);
      }
    }
    moved
  }

  /// Betti change of moving node `g` alone to the other side.
  pub fn flip(&self, g: u32) -> BettiDelta {
    let current = self.side(g);
    let target = current.opposite();
    let leaving = self.lowlink[current.index()].split_count(g) as i64 - 1;

    let voxels = self.graph.geometry().voxels(g);
    let slot: HashMap<IVec3, u32> = voxels.iter().enumerate().map(|(i, &p)| (p, i as u32)).collect();
    let mut dsu = DisjointSet::new(voxels.len());
    let mut components: HashMap<u32, u32> = HashMap::new();
    let lowlink = &self.lowlink[target.index()];
    for (i, &p) in voxels.iter().enumerate() {
      for &d in self.graph.connectivity(target).offsets() {
        let q = p + d;
        if let Some(&j) = slot.get(&q) {
          dsu.union(i as u32, j);
        } else if let Some(n) = self.owner_on(q, target) {
          let e = *components
            .entry(lowlink.component(n))
            .or_insert_with(|| dsu.push());
          dsu.union(i as u32, e);
        }
      }
    }
    let joining = dsu.set_count() as i64 - components.len() as i64;

    self.delta(current, leaving, joining, voxels)
  }

  /// Betti change of moving every node of `moved` (all on one side) to the
  /// other side. Counts both sides from scratch.
  pub fn flip_all(&self, moved: &[u32]) -> BettiDelta {
    let Some(&first) = moved.first() else {
      return BettiDelta::default();
    };
    if moved.len() == 1 {
      return self.flip(first);
    }
    let current = self.side(first);
    debug_assert!(moved.iter().all(|&m| self.side(m) == current));
    let moved_set: HashSet<u32> = moved.iter().copied().collect();
    let leaving = self.count_without(current, &moved_set) as i64 - self.lowlink[current.index()].component_count() as i64;
    let joining = self.count_joined(current.opposite(), &moved_set) as i64
      - self.lowlink[current.opposite().index()].component_count() as i64;
    let voxels: Vec<IVec3> = moved
      .iter()
      .flat_map(|&m| self.graph.geometry().voxels(m).iter().copied())
      .collect();
    self.delta(current, leaving, joining, &voxels)
  }

  fn delta(&self, current: Side, leaving: i64, joining: i64, flipped: &[IVec3]) -> BettiDelta {
    let chi = flip_delta(flipped, self.graph.connectivity(Side::Foreground), |q| {
      self
        .graph
        .geometry()
        .owner(q)
        .is_some_and(|n| self.side(n).is_foreground())
    })
    .chi();
    match current {
      Side::Foreground => BettiDelta::from_parts(leaving, joining, chi),
      Side::Background => BettiDelta::from_parts(joining, leaving, chi),
    }
  }

  fn owner_on(&self, q: IVec3, side: Side) -> Option<u32> {
    self.graph.geometry().owner(q).filter(|&n| self.side(n) == side)
  }

  /// Node-level union over `side` with `skip` left out.
  fn union_side(&self, side: Side, skip: &HashSet<u32>, dsu: &mut DisjointSet) {
    let kept = |i: u32| self.side(i) == side && !skip.contains(&i);
    for i in (0..self.graph.len() as u32).filter(|&i| kept(i)) {
      for &(j, strong) in self.graph.neighbors(i) {
        if kept(j) && self.graph.admits(side, strong) {
          dsu.union(i, j);
        }
      }
    }
    for &(a, b) in &self.joins {
      if kept(a) && kept(b) {
        dsu.union(a, b);
      }
    }
  }

  /// Components of `side` once `removed` leave it.
  fn count_without(&self, side: Side, removed: &HashSet<u32>) -> usize {
    let mut dsu = DisjointSet::new(self.graph.len());
    self.union_side(side, removed, &mut dsu);
    let mut roots: HashSet<u32> = HashSet::new();
    for i in 0..self.graph.len() as u32 {
      if self.side(i) == side && !removed.contains(&i) {
        roots.insert(dsu.find(i));
      }
    }
    roots.len()
  }

  /// Components of `side` once the voxels of `added` join it.
  fn count_joined(&self, side: Side, added: &HashSet<u32>) -> usize {
    let n = self.graph.len() as u32;
    let mut dsu = DisjointSet::new(n as usize);
    self.union_side(side, added, &mut dsu);
    let voxels: Vec<IVec3> = added
      .iter()
      .flat_map(|&m| self.graph.geometry().voxels(m).iter().copied())
      .collect();
    let slot: HashMap<IVec3, u32> = voxels.iter().map(|&p| (p, dsu.push())).collect();
    for &p in &voxels {
      let a = slot[&p];
      for &d in self.graph.connectivity(side).offsets() {
        let q = p + d;
        if let Some(&b) = slot.get(&q) {
          dsu.union(a, b);
        } else if let Some(node) = self.owner_on(q, side) {
          dsu.union(a, node);
        }
      }
    }
    let mut roots: HashSet<u32> = HashSet::new();
    for i in 0..n {
      if self.side(i) == side {
        roots.insert(dsu.find(i));
      }
    }
    for &e in slot.values() {
      roots.insert(dsu.find(e));
    }
    roots.len()
  }
}

/// Whether a flip lowers the Betti total without adding a component or a
/// cavity.
#[inline]
pub fn lowers_betti(delta: &BettiDelta) -> bool {
  delta.h0 <= 0 && delta.h2 <= 0 && delta.total() < 0
}

fn side_lists(graph: &WorkingGraph, sides: &[Side], joins: &[(u32, u32)], side: Side) -> AdjacencyLists {
  let on = |i: u32| sides[i as usize] == side;
  let mut edges: Vec<(u32, u32)> = Vec::new();
  for i in (0..graph.len() as u32).filter(|&i| on(i)) {
    for &(j, strong) in graph.neighbors(i) {
      if j > i && on(j) && graph.admits(side, strong) {
        edges.push((i, j));
      }
    }
  }
  edges.extend(joins.iter().copied().filter(|&(a, b)| on(a) && on(b)));
  AdjacencyLists::from_edges(graph.len(), &edges)
}
