//! Shared state passed by reference through every stage.

use glam::{IVec3, UVec3};

use super::{AdjacencyGraph, Region, RegionArena};
use crate::constants::offset_order;
use crate::error::Result;
use crate::simple_point::SimplePointOracle;
use crate::topology::{BettiNumbers, EulerCounts};
use crate::types::{Connectivity, RegionId, RegionKind, Side, SimplifyConfig, NO_REGION};
use crate::volume::{Grid, Volume};

/// Grid store, region arena and adjacency graph of one simplification run.
#[derive(Clone, Debug)]
pub struct SimplifyContext<'o> {
  pub grid: Grid,
  pub regions: RegionArena,
  pub graph: AdjacencyGraph,
  pub config: SimplifyConfig,
  pub oracle: &'o SimplePointOracle,
}

impl<'o> SimplifyContext<'o> {
  /// Validate `config` and copy `volume` into a padded, unlabeled grid.
  pub fn new(volume: &Volume, config: SimplifyConfig, oracle: &'o SimplePointOracle) -> Result<Self> {
    config.validate()?;
    Ok(Self {
      grid: Grid::from_volume(volume),
      regions: RegionArena::new(),
      graph: AdjacencyGraph::new(),
      config,
      oracle,
    })
  }

  #[inline]
  pub fn connectivity(&self, side: Side) -> Connectivity {
    self.config.connectivity(side)
  }

  /// Side of voxel `idx` in the pre-simplification shape.
  #[inline]
  pub fn polarity(&self, idx: usize) -> Side {
    self.config.thresholds.polarity(self.grid.intensity(idx))
  }

  /// Kind voxel `idx` starts as.
  #[inline]
  pub fn classify(&self, idx: usize) -> RegionKind {
    self.config.thresholds.classify(self.grid.intensity(idx))
  }

  /// Cost of voxel `idx` ending on `side`.
  #[inline]
  pub fn voxel_cost(&self, idx: usize, side: Side) -> f64 {
    if self.grid.is_padding(idx) {
      return 0.0;
    }
    self
      .config
      .cost_mode
      .voxel_cost(self.grid.intensity(idx), side, &self.config.thresholds)
  }

  /// Side voxel `idx` currently occupies. Undecided generators count as their
  /// native side, unlabeled voxels as their polarity.
  #[inline]
  pub fn current_side(&self, idx: usize) -> Side {
    match self.grid.region(idx) {
      NO_REGION => self.polarity(idx),
      id => self.regions.kind(id).native_side(),
    }
  }

  /// Kind of the region holding `idx`, if labeled.
  #[inline]
  pub fn kind_at(&self, idx: usize) -> Option<RegionKind> {
    match self.grid.region(idx) {
      NO_REGION => None,
      id => Some(self.regions.kind(id)),
    }
  }

  pub fn new_region(&mut self, kind: RegionKind) -> RegionId {
    self.regions.alloc(kind)
  }

  /// Label voxel `idx` with `id` and add its costs to the region.
  pub fn assign(&mut self, idx: usize, id: RegionId) {
    let cost_fg = self.voxel_cost(idx, Side::Foreground);
    let cost_bg = self.voxel_cost(idx, Side::Background);
    self.grid.set_region(idx, id);
    let region = self.regions.get_mut(id);
    region.voxels.push(idx);
    region.cost_fg += cost_fg;
    region.cost_bg += cost_bg;
  }

  /// Drop stale voxel entries of `id` and recompute its costs. An emptied
  /// region is invalidated and loses its edges. Returns whether `id` survives.
  pub fn refresh_region(&mut self, id: RegionId) -> bool {
    let mut voxels = std::mem::take(&mut self.regions.get_mut(id).voxels);
    voxels.retain(|&v| self.grid.region(v) == id);
    voxels.sort_unstable();
    voxels.dedup();
    if voxels.is_empty() {
      self.regions.invalidate(id);
      self.graph.remove_region(id);
      return false;
    }
    let cost_fg: f64 = voxels.iter().map(|&v| self.voxel_cost(v, Side::Foreground)).sum();
    let cost_bg: f64 = voxels.iter().map(|&v| self.voxel_cost(v, Side::Background)).sum();
    let region = self.regions.get_mut(id);
    region.voxels = voxels;
    region.cost_fg = cost_fg;
    region.cost_bg = cost_bg;
    true
  }

  /// Move every voxel of `absorb` into `keep`, take over its edges and
  /// invalidate it.
  pub fn merge_into(&mut self, keep: RegionId, absorb: RegionId) {
    debug_assert_ne!(keep, absorb);
    let moved: Vec<usize> = self
      .regions
      .invalidate(absorb)
      .into_iter()
      .filter(|&v| self.grid.region(v) == absorb)
      .collect();
    for &v in &moved {
      self.grid.set_region(v, keep);
    }
    let edges: Vec<(RegionId, bool)> = self.graph.neighbors(absorb).collect();
    self.graph.remove_region(absorb);
    for (n, strong) in edges {
      if n != keep {
        self.graph.add(keep, n, strong);
      }
    }
    let generator = self.regions.kind(keep).is_generator();
    self.regions.get_mut(keep).voxels.extend(moved);
    // Terminal costs are never read.
    if generator {
      self.refresh_region(keep);
    }
  }

  /// Recompute the edges of `id` by scanning its voxels.
  pub fn rebuild_adjacency(&mut self, id: RegionId) {
    self.graph.remove_region(id);
    let region = self.regions.get(id);
    for &v in &region.voxels {
      if self.grid.region(v) != id {
        continue;
      }
      for (n, d) in self.grid.neighbors(v, Connectivity::TwentySix) {
        let other = self.grid.region(n);
        if other != id && other != NO_REGION {
          self.graph.add(id, other, offset_order(d) == 1);
        }
      }
    }
  }

  /// Build the whole adjacency graph from the labeled grid.
  pub fn build_adjacency(&mut self) {
    self.graph = AdjacencyGraph::new();
    for idx in self.grid.interior() {
      let id = self.grid.region(idx);
      if id == NO_REGION {
        continue;
      }
      for (n, d) in self.grid.neighbors(idx, Connectivity::TwentySix) {
        let other = self.grid.region(n);
        if other != id && other != NO_REGION {
          self.graph.add(id, other, offset_order(d) == 1);
        }
      }
    }
  }

  /// Turn generator `id` into a terminal of `side` and coalesce it.
  /// Returns the surviving region id.
  pub fn decide(&mut self, id: RegionId, side: Side) -> RegionId {
    let region = self.regions.get_mut(id);
    debug_assert!(region.kind.is_generator(), "region {id} already decided");
    region.kind = RegionKind::terminal(side);
    self.coalesce(id)
  }

  /// Merge terminal `id` with every same-kind terminal adjacent under its
  /// side's connectivity. The lowest id survives and is returned.
  pub fn coalesce(&mut self, id: RegionId) -> RegionId {
    let kind = self.regions.kind(id);
    if !kind.is_terminal() {
      return id;
    }
    let connectivity = self.connectivity(kind.native_side());
    let mut current = id;
    loop {
      let partner = self
        .graph
        .neighbors(current)
        .find(|&(n, strong)| connectivity.admits(strong) && self.regions.kind(n) == kind)
        .map(|(n, _)| n);
      let Some(other) = partner else {
        return current;
      };
      let (keep, absorb) = (current.min(other), current.max(other));
      self.merge_into(keep, absorb);
      current = keep;
    }
  }

  /// Region holding the voxel at input coordinate `p`.
  #[inline]
  pub fn region_at(&self, p: UVec3) -> RegionId {
    self.grid.region(self.grid.padded_index(p))
  }

  /// Current side of every padded grid voxel.
  pub fn foreground_mask(&self) -> Vec<bool> {
    (0..self.grid.len())
      .map(|idx| self.current_side(idx).is_foreground())
      .collect()
  }

  /// Betti numbers and cell counts of the current configuration.
  pub fn betti(&self) -> (BettiNumbers, EulerCounts) {
    BettiNumbers::of_mask(self.grid.dims(), &self.foreground_mask(), self.config.foreground)
  }

  /// Betti numbers of the pre-simplification shape.
  pub fn polarity_betti(&self) -> (BettiNumbers, EulerCounts) {
    let mask: Vec<bool> = (0..self.grid.len())
      .map(|idx| self.polarity(idx).is_foreground())
      .collect();
    BettiNumbers::of_mask(self.grid.dims(), &mask, self.config.foreground)
  }

  /// Current side of every input voxel, x fastest.
  pub fn labels(&self) -> Vec<Side> {
    let d = self.grid.inner_dims();
    let mut out = Vec::with_capacity((d.x * d.y * d.z) as usize);
    for z in 0..d.z {
      for y in 0..d.y {
        for x in 0..d.x {
          out.push(self.current_side(self.grid.padded_index(UVec3::new(x, y, z))));
        }
      }
    }
    out
  }

  /// Grid coordinates of the voxels of `region`.
  pub fn coords_of(&self, region: &Region) -> Vec<IVec3> {
    region
      .voxels
      .iter()
      .filter(|&&v| self.grid.region(v) == region.id)
      .map(|&v| self.grid.coord(v))
      .collect()
  }

  /// Check the structural invariants; returns one message per violation.
  pub fn check_invariants(&self) -> Vec<String> {
    let mut problems = Vec::new();
    for idx in 0..self.grid.len() {
      let id = self.grid.region(idx);
      if id == NO_REGION {
        problems.push(format!("voxel {idx} is unlabeled"));
      } else if !self.regions.is_valid(id) {
        problems.push(format!("voxel {idx} points at invalidated region {id}"));
      }
    }
    if !self.graph.is_symmetric() {
      problems.push("adjacency graph is not symmetric".to_string());
    }
    for slot in 0..self.regions.slot_count() as RegionId {
      if !self.regions.is_valid(slot) && self.graph.degree(slot) > 0 {
        problems.push(format!("invalidated region {slot} still has edges"));
      }
    }
    for region in self.regions.iter() {
      if region.voxels.iter().any(|&v| self.grid.region(v) != region.id) {
        problems.push(format!("region {} lists foreign voxels", region.id));
      }
      if !region.kind.is_terminal() {
        continue;
      }
      let connectivity = self.connectivity(region.kind.native_side());
      for (n, strong) in self.graph.neighbors(region.id) {
        if !self.regions.is_valid(n) {
          problems.push(format!("region {} has an edge to invalid {n}", region.id));
        } else if connectivity.admits(strong) && self.regions.kind(n) == region.kind {
          problems.push(format!(
            "terminals {} and {n} of kind {:?} are adjacent",
            region.id, region.kind
          ));
        }
      }
    }
    problems
  }
}
