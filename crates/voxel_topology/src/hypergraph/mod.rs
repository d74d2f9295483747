//! Steiner formulation of the remaining generator decisions.
//!
//! Every undecided generator g becomes a double node: a foreground
//! hypernode H_f(g), a zero-weight mid node m_g and a background hypernode
//! H_b(g). A tree that reaches m_g through H_s(g) puts g (and the other
//! members of H_s(g)) on side s. Decided regions collapse into one required
//! terminal node per connected group, and a Pi-root wires the instance
//! together:
//!
//! ```text
//!                 Pi-root
//!            ┌───────┴───────┐
//!         T_fg ── H_f(g) ── m_g ── H_b(g) ── T_bg
//! ```
//!
//! Hypernodes of the same side are joined when their members touch under
//! that side's connectivity, so a chain of hypernodes is a path of regions
//! that would become connected on that side.
//!
//! Besides the per-generator pairs, each side gets group hypernodes: every
//! connected group of undecided generators under that side's connectivity
//! and, for small groups, the pieces left when one member is taken out. A
//! group hypernode feeds the mid node of each of its members.

mod build;

pub use build::{GROUP_PIECE_LIMIT, HYPERNODE_EPSILON};

use smallvec::SmallVec;

use crate::steiner::{SteinerInstance, SteinerSolution};
use crate::types::{RegionId, Side};

/// Terminals assumed connected outside the working graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Grouping {
  joins: Vec<(RegionId, RegionId)>,
}

impl Grouping {
  pub fn new() -> Self {
    Self::default()
  }

  /// Treat terminals `a` and `b` as one component.
  pub fn join(&mut self, a: RegionId, b: RegionId) {
    self.joins.push((a, b));
  }

  pub fn joins(&self) -> &[(RegionId, RegionId)] {
    &self.joins
  }

  pub fn is_empty(&self) -> bool {
    self.joins.is_empty()
  }
}

/// What an instance node stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeRole {
  PiRoot,
  /// Group of decided regions of one side.
  Terminal(Side),
  /// Mid-transit node of a generator (working graph index).
  Mid(u32),
  /// Index into [`Hypergraph::hypernodes`].
  Hyper(u32),
}

/// Generators decided jointly on one side.
#[derive(Clone, Debug)]
pub struct HyperNode {
  pub side: Side,
  /// Generator whose double node owns this hypernode; the lowest member for
  /// groups.
  pub owner: u32,
  /// Members decided by this hypernode: the first `size` are the group,
  /// the rest are dragged along.
  pub members: SmallVec<[u32; 8]>,
  pub size: usize,
  pub weight: f64,
  /// Node in the Steiner instance.
  pub node: u32,
}

/// A built Steiner instance and the bookkeeping to read its solutions back.
#[derive(Clone, Debug)]
pub struct Hypergraph {
  pub instance: SteinerInstance,
  pub roles: Vec<NodeRole>,
  pub hypernodes: Vec<HyperNode>,
  /// Terminal node of every decided working node.
  terminal_of: Vec<Option<u32>>,
  /// Pi-root wires per side (foreground, background).
  pub wires: [usize; 2],
}

impl Hypergraph {
  /// Terminal instance node of a decided working node.
  #[inline]
  pub fn terminal_of(&self, i: u32) -> Option<u32> {
    self.terminal_of[i as usize]
  }

  pub fn terminal_count(&self) -> usize {
    self
      .roles
      .iter()
      .filter(|r| matches!(r, NodeRole::Terminal(_)))
      .count()
  }

  pub fn total_wires(&self) -> usize {
    self.wires[0] + self.wires[1]
  }

  /// Per working node: claimed by an in-tree hypernode of (foreground,
  /// background).
  pub fn claims(&self, solution: &SteinerSolution) -> Vec<[bool; 2]> {
    let mut claims = vec![[false; 2]; self.terminal_of.len()];
    for hyper in &self.hypernodes {
      if solution.contains(hyper.node) {
        for &m in &hyper.members {
          claims[m as usize][hyper.side.index()] = true;
        }
      }
    }
    claims
  }

  /// Generators claimed by both sides, ascending.
  pub fn violators(&self, solution: &SteinerSolution) -> Vec<u32> {
    self
      .claims(solution)
      .iter()
      .enumerate()
      .filter(|(_, c)| c[0] && c[1])
      .map(|(i, _)| i as u32)
      .collect()
  }

  /// Side claimed for node `i`, `None` when unclaimed or contested.
  pub fn claimed_side(claims: &[[bool; 2]], i: u32) -> Option<Side> {
    match claims[i as usize] {
      [true, false] => Some(Side::Foreground),
      [false, true] => Some(Side::Background),
      _ => None,
    }
  }
}

#[cfg(test)]
#[path = "hypergraph_test.rs"]
mod hypergraph_test;
