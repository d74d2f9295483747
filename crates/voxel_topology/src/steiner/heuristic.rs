//! Shortest-path heuristic with pruning and drop-node local search.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use tracing::trace;
use web_time::Instant;

use super::{SteinerInstance, SteinerSolution, SteinerSolver};

const NO_PRED: u32 = u32::MAX;

#[derive(Clone, Copy, Debug)]
struct Entry {
  dist: f64,
  node: u32,
}

impl PartialEq for Entry {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Entry {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap on distance, lower node first.
    other
      .dist
      .total_cmp(&self.dist)
      .then_with(|| other.node.cmp(&self.node))
  }
}

/// Node-weighted Dijkstra from every node in `sources` (distance 0). Entering
/// a node outside `sources` costs its weight.
fn dijkstra(instance: &SteinerInstance, sources: &[bool]) -> (Vec<f64>, Vec<u32>) {
  let n = instance.node_count();
  let mut dist = vec![f64::INFINITY; n];
  let mut pred = vec![NO_PRED; n];
  let mut heap = BinaryHeap::new();
  for (node, &source) in sources.iter().enumerate() {
    if source {
      dist[node] = 0.0;
      heap.push(Entry {
        dist: 0.0,
        node: node as u32,
      });
    }
  }
  while let Some(Entry { dist: d, node: u }) = heap.pop() {
    if d > dist[u as usize] {
      continue;
    }
    for &w in instance.neighbors(u) {
      let next = d + instance.weight(w);
      if next < dist[w as usize] {
        dist[w as usize] = next;
        pred[w as usize] = u;
        heap.push(Entry { dist: next, node: w });
      }
    }
  }
  (dist, pred)
}

/// Shortest-path heuristic: repeatedly attach the closest required node.
/// Starts from `start`.
#[derive(Clone, Debug)]
pub struct PathHeuristicSolver {
  /// Extra runs started from other required nodes while budget remains.
  pub restarts: usize,
}

impl Default for PathHeuristicSolver {
  fn default() -> Self {
    Self { restarts: 8 }
  }
}

impl PathHeuristicSolver {
  fn grow(&self, instance: &SteinerInstance, start: u32, deadline: Instant) -> Vec<bool> {
    let mut chosen = vec![false; instance.node_count()];
    chosen[start as usize] = true;
    let mut remaining: Vec<u32> = instance.required_nodes().filter(|&n| n != start).collect();

    while !remaining.is_empty() {
      let (dist, pred) = dijkstra(instance, &chosen);
      let attach = |chosen: &mut Vec<bool>, mut node: u32| {
        while node != NO_PRED && !chosen[node as usize] {
          chosen[node as usize] = true;
          node = pred[node as usize];
        }
      };
      if Instant::now() > deadline {
        // Out of time: hang everything left on the current paths.
        for &r in &remaining {
          attach(&mut chosen, r);
        }
        break;
      }
      let Some(&next) = remaining
        .iter()
        .filter(|&&r| dist[r as usize].is_finite())
        .min_by(|&&a, &&b| dist[a as usize].total_cmp(&dist[b as usize]).then(a.cmp(&b)))
      else {
        break;
      };
      attach(&mut chosen, next);
      remaining.retain(|&r| !chosen[r as usize]);
    }
    chosen
  }

  /// Drop non-required nodes with at most one chosen neighbor until none
  /// are left.
  fn prune(instance: &SteinerInstance, chosen: &mut [bool]) {
    loop {
      let mut removed = false;
      for node in instance.optional_nodes() {
        if !chosen[node as usize] {
          continue;
        }
        let degree = instance
          .neighbors(node)
          .iter()
          .filter(|&&w| chosen[w as usize])
          .count();
        if degree <= 1 {
          chosen[node as usize] = false;
          removed = true;
        }
      }
      if !removed {
        return;
      }
    }
  }

  /// Try removing optional nodes, heaviest first.
  fn drop_nodes(instance: &SteinerInstance, chosen: &mut [bool], deadline: Instant) {
    let mut candidates: Vec<u32> = instance
      .optional_nodes()
      .filter(|&n| chosen[n as usize])
      .collect();
    candidates.sort_by(|&a, &b| instance.weight(b).total_cmp(&instance.weight(a)).then(a.cmp(&b)));
    for node in candidates {
      if Instant::now() > deadline {
        return;
      }
      if !chosen[node as usize] {
        continue;
      }
      chosen[node as usize] = false;
      if instance.covers(chosen) {
        Self::prune(instance, chosen);
      } else {
        chosen[node as usize] = true;
      }
    }
  }

  fn cost(instance: &SteinerInstance, chosen: &[bool]) -> f64 {
    (0..instance.node_count() as u32)
      .filter(|&n| chosen[n as usize])
      .map(|n| instance.weight(n))
      .sum()
  }
}

impl SteinerSolver for PathHeuristicSolver {
  fn name(&self) -> &'static str {
    "path-heuristic"
  }

  fn solve(&self, instance: &SteinerInstance, budget: Duration) -> SteinerSolution {
    let start = Instant::now();
    let deadline = start + budget;

    let (root_dist, _) = {
      let mut sources = vec![false; instance.node_count()];
      sources[instance.root() as usize] = true;
      dijkstra(instance, &sources)
    };
    let path_bound = instance
      .required_nodes()
      .map(|r| root_dist[r as usize])
      .fold(0.0, f64::max);
    let lower_bound = if path_bound.is_finite() {
      path_bound.max(instance.required_weight())
    } else {
      instance.required_weight()
    };

    let mut best = self.grow(instance, instance.root(), deadline);
    Self::prune(instance, &mut best);
    Self::drop_nodes(instance, &mut best, deadline);
    let mut best_cost = Self::cost(instance, &best);

    let mut timed_out = Instant::now() > deadline;
    let starts: Vec<u32> = instance
      .required_nodes()
      .filter(|&r| r != instance.root())
      .take(self.restarts)
      .collect();
    for (run, r) in starts.into_iter().enumerate() {
      if Instant::now() > deadline {
        timed_out = true;
        break;
      }
      let mut candidate = self.grow(instance, r, deadline);
      Self::prune(instance, &mut candidate);
      Self::drop_nodes(instance, &mut candidate, deadline);
      let cost = Self::cost(instance, &candidate);
      if cost < best_cost - 1e-12 && instance.covers(&candidate) {
        trace!(run, cost, best_cost, "restart improved the tree");
        best = candidate;
        best_cost = cost;
      }
    }

    SteinerSolution::from_nodes(instance, &best, lower_bound.min(best_cost), timed_out)
  }
}
