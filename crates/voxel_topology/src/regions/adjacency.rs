//! Region adjacency graph.

use std::collections::BTreeMap;

use crate::types::RegionId;

/// Undirected region graph. Each edge carries a strength flag: strong when
/// the regions touch through at least one voxel face, weak when they only
/// touch diagonally.
#[derive(Clone, Debug, Default)]
pub struct AdjacencyGraph {
  edges: Vec<BTreeMap<RegionId, bool>>,
}

impl AdjacencyGraph {
  pub fn new() -> Self {
    Self::default()
  }

  fn ensure(&mut self, id: RegionId) {
    if self.edges.len() <= id as usize {
      self.edges.resize_with(id as usize + 1, BTreeMap::new);
    }
  }

  /// Record a contact between `a` and `b`. A strong contact upgrades a weak
  /// edge; self contacts are ignored.
  pub fn add(&mut self, a: RegionId, b: RegionId, strong: bool) {
    if a == b {
      return;
    }
    self.ensure(a.max(b));
    *self.edges[a as usize].entry(b).or_insert(false) |= strong;
    *self.edges[b as usize].entry(a).or_insert(false) |= strong;
  }

  /// Drop every edge of `id`.
  pub fn remove_region(&mut self, id: RegionId) {
    let Some(map) = self.edges.get_mut(id as usize) else {
      return;
    };
    let neighbors = std::mem::take(map);
    for n in neighbors.keys() {
      self.edges[*n as usize].remove(&id);
    }
  }

  /// Neighbors of `id` with edge strength, in id order.
  pub fn neighbors(&self, id: RegionId) -> impl Iterator<Item = (RegionId, bool)> + '_ {
    self
      .edges
      .get(id as usize)
      .into_iter()
      .flat_map(|m| m.iter().map(|(&n, &s)| (n, s)))
  }

  #[inline]
  pub fn strength(&self, a: RegionId, b: RegionId) -> Option<bool> {
    self.edges.get(a as usize).and_then(|m| m.get(&b).copied())
  }

  #[inline]
  pub fn degree(&self, id: RegionId) -> usize {
    self.edges.get(id as usize).map_or(0, BTreeMap::len)
  }

  pub fn edge_count(&self) -> usize {
    self.edges.iter().map(BTreeMap::len).sum::<usize>() / 2
  }

  /// Every edge is stored in both directions with the same strength.
  pub fn is_symmetric(&self) -> bool {
    self.edges.iter().enumerate().all(|(a, map)| {
      map
        .iter()
        .all(|(&b, &s)| b as usize != a && self.strength(b, a as RegionId) == Some(s))
    })
  }
}
