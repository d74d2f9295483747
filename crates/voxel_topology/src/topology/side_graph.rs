//! Region-level connectivity of one side, with low-link data for removal
//! queries.
//!
//! The graph is kept across edits: [`SideGraph::refresh`] re-reads the
//! touched regions from the context and re-explores only the components
//! they belonged to or now join.

use std::collections::HashMap;

use super::{AdjacencyLists, LowLink, Piece};
use crate::regions::{Region, SimplifyContext};
use crate::types::{RegionId, Side};

/// Graph over the regions currently on `side`, joined by edges admitted by
/// that side's connectivity.
#[derive(Clone, Debug)]
pub struct SideGraph {
  pub side: Side,
  /// Slot → region. Slots of regions that left the side stay allocated.
  nodes: Vec<RegionId>,
  index: HashMap<RegionId, u32>,
  present: Vec<bool>,
  len: usize,
  adjacency: AdjacencyLists,
  lowlink: LowLink,
}

impl SideGraph {
  /// Regions count as their native side.
  pub fn build(ctx: &SimplifyContext, side: Side) -> Self {
    Self::build_with(ctx, side, |r| r.kind.native_side())
  }

  /// Regions count as `side_of` says; lets the greedy pass overlay flips.
  pub fn build_with(ctx: &SimplifyContext, side: Side, side_of: impl Fn(&Region) -> Side) -> Self {
    let connectivity = ctx.connectivity(side);
    let nodes: Vec<RegionId> = ctx
      .regions
      .iter()
      .filter(|r| side_of(r) == side)
      .map(|r| r.id)
      .collect();
    let index: HashMap<RegionId, u32> = nodes
      .iter()
      .enumerate()
      .map(|(i, &id)| (id, i as u32))
      .collect();
    let mut edges = Vec::new();
    for (i, &id) in nodes.iter().enumerate() {
      for (n, strong) in ctx.graph.neighbors(id) {
        if n > id && connectivity.admits(strong) {
          if let Some(&j) = index.get(&n) {
            edges.push((i as u32, j));
          }
        }
      }
    }
    let adjacency = AdjacencyLists::from_edges(nodes.len(), &edges);
    let lowlink = LowLink::compute(&adjacency);
    Self {
      side,
      present: vec![true; nodes.len()],
      len: nodes.len(),
      nodes,
      index,
      adjacency,
      lowlink,
    }
  }

  /// Re-read `touched` regions: drop them with their edges, add back those
  /// that are still valid and on this side, and re-explore the affected
  /// components. Edges among untouched regions must not have changed.
  pub fn refresh(&mut self, ctx: &SimplifyContext, side_of: impl Fn(&Region) -> Side, touched: &[RegionId]) {
    let connectivity = ctx.connectivity(self.side);
    let mut seeds: Vec<u32> = Vec::new();
    let mut removed: Vec<u32> = Vec::new();

    for &id in touched {
      let Some(slot) = self.node(id) else {
        continue;
      };
      seeds.extend(self.adjacency.isolate(slot));
      self.present[slot as usize] = false;
      self.len -= 1;
      removed.push(slot);
    }

    for &id in touched {
      let Some(region) = ctx.regions.try_get(id) else {
        continue;
      };
      if side_of(region) != self.side || self.contains(id) {
        continue;
      }
      let slot = match self.index.get(&id) {
        Some(&slot) => slot,
        None => {
          let slot = self.adjacency.add_node();
          self.nodes.push(id);
          self.present.push(false);
          self.index.insert(id, slot);
          slot
        }
      };
      self.present[slot as usize] = true;
      self.len += 1;
      for (n, strong) in ctx.graph.neighbors(id) {
        if connectivity.admits(strong) {
          if let Some(j) = self.node(n) {
            self.adjacency.connect(slot, j);
          }
        }
      }
      seeds.push(slot);
    }

    seeds.retain(|&s| self.present[s as usize]);
    seeds.sort_unstable();
    seeds.dedup();
    self.lowlink.refresh(&self.adjacency, &seeds, &removed);
  }

  #[inline]
  pub fn node(&self, id: RegionId) -> Option<u32> {
    self
      .index
      .get(&id)
      .copied()
      .filter(|&slot| self.present[slot as usize])
  }

  #[inline]
  pub fn contains(&self, id: RegionId) -> bool {
    self.node(id).is_some()
  }

  #[inline]
  pub fn region(&self, node: u32) -> RegionId {
    self.nodes[node as usize]
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn component_count(&self) -> usize {
    self.lowlink.component_count()
  }

  /// Component label of region `id`, if it is on this side.
  pub fn component(&self, id: RegionId) -> Option<u32> {
    self.node(id).map(|n| self.lowlink.component(n))
  }

  /// Regions adjacent to `id` in this graph.
  pub fn neighbors(&self, id: RegionId) -> impl Iterator<Item = RegionId> + '_ {
    self
      .node(id)
      .into_iter()
      .flat_map(move |n| self.adjacency.neighbors(n).iter().map(move |&m| self.nodes[m as usize]))
  }

  /// Pieces `id`'s component falls into once `id` is removed.
  pub fn split_count(&self, id: RegionId) -> usize {
    self.node(id).map_or(0, |n| self.lowlink.split_count(n))
  }

  /// Piece that `neighbor` lands in once `removed` is gone. Both must be on
  /// this side and adjacent.
  pub fn piece_of(&self, removed: RegionId, neighbor: RegionId) -> Option<Piece> {
    let r = self.node(removed)?;
    let n = self.node(neighbor)?;
    Some(self.lowlink.piece_of(r, n))
  }
}
