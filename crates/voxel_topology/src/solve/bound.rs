//! Bounding the grouping hypotheses of a cluster.
//!
//! Terminals touching a cluster may already be connected, or become
//! connected later, through regions outside it. Terminals that can meet
//! outside the cluster form a block, and every set partition of a block is
//! one hypothesis about which of them end up joined. The number of
//! hypotheses is the product of the Bell numbers of the block sizes.

use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::hypergraph::Grouping;
use crate::regions::SimplifyContext;
use crate::types::{RegionId, RegionKind, Side};

/// Bell number B(n) from the Bell triangle, saturating at `u64::MAX`.
pub fn bell(n: usize) -> u64 {
  if n == 0 {
    return 1;
  }
  let mut row = vec![1u64];
  for _ in 1..n {
    let mut next = Vec::with_capacity(row.len() + 1);
    next.push(row[row.len() - 1]);
    for &v in &row {
      let prev = next[next.len() - 1];
      next.push(u64::saturating_add(prev, v));
    }
    row = next;
  }
  row[row.len() - 1]
}

/// Blocks of same-side terminals touching `cluster` that are connected
/// outside it (through same-side terminals and generators of other
/// clusters). Foreground blocks come first; each block is sorted.
pub fn terminal_blocks(ctx: &SimplifyContext, cluster: &[RegionId]) -> Vec<Vec<RegionId>> {
  let inside: HashSet<RegionId> = cluster.iter().copied().collect();
  let mut blocks = Vec::new();
  for side in [Side::Foreground, Side::Background] {
    let terminal = RegionKind::terminal(side);
    let connectivity = ctx.connectivity(side);
    let touching: BTreeSet<RegionId> = cluster
      .iter()
      .flat_map(|&g| ctx.graph.neighbors(g))
      .map(|(n, _)| n)
      .filter(|&n| ctx.regions.kind(n) == terminal)
      .collect();

    let mut assigned: HashSet<RegionId> = HashSet::new();
    for &start in &touching {
      if assigned.contains(&start) {
        continue;
      }
      let mut visited = HashSet::from([start]);
      let mut queue = VecDeque::from([start]);
      while let Some(r) = queue.pop_front() {
        for (n, strong) in ctx.graph.neighbors(r) {
          if !connectivity.admits(strong) || inside.contains(&n) || visited.contains(&n) {
            continue;
          }
          let kind = ctx.regions.kind(n);
          if kind == terminal || kind.is_generator() {
            visited.insert(n);
            queue.push_back(n);
          }
        }
      }
      let block: Vec<RegionId> = touching.iter().copied().filter(|t| visited.contains(t)).collect();
      assigned.extend(block.iter().copied());
      blocks.push(block);
    }
  }
  blocks
}

/// Number of grouping hypotheses for `blocks`, saturating.
pub fn combinations(blocks: &[Vec<RegionId>]) -> u64 {
  blocks.iter().fold(1u64, |acc, b| acc.saturating_mul(bell(b.len())))
}

/// Every set partition of `0..n` as a restricted growth string.
fn restricted_growth_strings(n: usize) -> Vec<Vec<u32>> {
  fn extend(prefix: &mut Vec<u32>, max: u32, n: usize, out: &mut Vec<Vec<u32>>) {
    if prefix.len() == n {
      out.push(prefix.clone());
      return;
    }
    for label in 0..=max + 1 {
      prefix.push(label);
      extend(prefix, max.max(label), n, out);
      prefix.pop();
    }
  }

  let mut out = Vec::new();
  if n == 0 {
    return vec![Vec::new()];
  }
  extend(&mut vec![0], 0, n, &mut out);
  out
}

/// One grouping per combination of block partitions. The first grouping
/// joins every block completely, the last joins nothing.
pub fn groupings(blocks: &[Vec<RegionId>]) -> Vec<Grouping> {
  let mut out = vec![Grouping::new()];
  for block in blocks.iter().filter(|b| b.len() > 1) {
    let partitions = restricted_growth_strings(block.len());
    let mut next = Vec::with_capacity(out.len() * partitions.len());
    for base in &out {
      for labels in &partitions {
        let mut grouping = base.clone();
        for i in 1..block.len() {
          if let Some(j) = (0..i).find(|&j| labels[j] == labels[i]) {
            grouping.join(block[j], block[i]);
          }
        }
        next.push(grouping);
      }
    }
    out = next;
  }
  out
}
