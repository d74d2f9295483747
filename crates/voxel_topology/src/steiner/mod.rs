//! Node-weighted Steiner tree solvers.
//!
//! An instance is an undirected graph with non-negative node weights, a set
//! of required nodes and a root. A solution is a connected node set holding
//! every required node; its cost is the sum of its node weights. Solvers run
//! under a wall-clock budget and return their best incumbent when it runs
//! out.

mod exhaustive;
mod heuristic;

pub use exhaustive::ExhaustiveSolver;
pub use heuristic::PathHeuristicSolver;

use std::collections::VecDeque;
use std::time::Duration;

/// Steiner tree instance.
#[derive(Clone, Debug, Default)]
pub struct SteinerInstance {
  weights: Vec<f64>,
  required: Vec<bool>,
  adjacency: Vec<Vec<u32>>,
  root: u32,
}

impl SteinerInstance {
  /// Instance holding only the (required, zero-weight) root.
  pub fn new() -> Self {
    Self {
      weights: vec![0.0],
      required: vec![true],
      adjacency: vec![Vec::new()],
      root: 0,
    }
  }

  pub fn add_node(&mut self, weight: f64, required: bool) -> u32 {
    debug_assert!(weight >= 0.0);
    self.weights.push(weight);
    self.required.push(required);
    self.adjacency.push(Vec::new());
    (self.weights.len() - 1) as u32
  }

  /// Undirected edge; duplicates and self-loops are ignored.
  pub fn add_edge(&mut self, a: u32, b: u32) {
    if a == b || self.adjacency[a as usize].contains(&b) {
      return;
    }
    self.adjacency[a as usize].push(b);
    self.adjacency[b as usize].push(a);
  }

  #[inline]
  pub fn root(&self) -> u32 {
    self.root
  }

  #[inline]
  pub fn node_count(&self) -> usize {
    self.weights.len()
  }

  pub fn edge_count(&self) -> usize {
    self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
  }

  #[inline]
  pub fn weight(&self, node: u32) -> f64 {
    self.weights[node as usize]
  }

  #[inline]
  pub fn is_required(&self, node: u32) -> bool {
    self.required[node as usize]
  }

  #[inline]
  pub fn neighbors(&self, node: u32) -> &[u32] {
    &self.adjacency[node as usize]
  }

  pub fn required_nodes(&self) -> impl Iterator<Item = u32> + '_ {
    (0..self.node_count() as u32).filter(|&n| self.required[n as usize])
  }

  pub fn optional_nodes(&self) -> impl Iterator<Item = u32> + '_ {
    (0..self.node_count() as u32).filter(|&n| !self.required[n as usize])
  }

  pub fn optional_count(&self) -> usize {
    self.required.iter().filter(|r| !**r).count()
  }

  /// Weight every solution pays.
  pub fn required_weight(&self) -> f64 {
    self.required_nodes().map(|n| self.weight(n)).sum()
  }

  /// BFS over `chosen` from the root. Returns the reached flags and the BFS
  /// tree edges.
  pub(crate) fn span(&self, chosen: &[bool]) -> (Vec<bool>, Vec<(u32, u32)>) {
    let mut reached = vec![false; self.node_count()];
    let mut edges = Vec::new();
    if !chosen[self.root as usize] {
      return (reached, edges);
    }
    let mut queue = VecDeque::from([self.root]);
    reached[self.root as usize] = true;
    while let Some(u) = queue.pop_front() {
      for &w in self.neighbors(u) {
        if chosen[w as usize] && !reached[w as usize] {
          reached[w as usize] = true;
          edges.push((u, w));
          queue.push_back(w);
        }
      }
    }
    (reached, edges)
  }

  /// Whether `chosen` connects every required node to the root.
  pub(crate) fn covers(&self, chosen: &[bool]) -> bool {
    let (reached, _) = self.span(chosen);
    self.required_nodes().all(|n| reached[n as usize])
  }
}

/// Result of one solver call.
#[derive(Clone, Debug, Default)]
pub struct SteinerSolution {
  /// Per-node membership in the tree.
  pub in_tree: Vec<bool>,
  pub tree_edges: Vec<(u32, u32)>,
  pub cost: f64,
  pub lower_bound: f64,
  /// Every required node is connected to the root.
  pub valid: bool,
  /// The budget ran out before the search finished.
  pub timed_out: bool,
}

impl SteinerSolution {
  /// Build a solution from a node set, keeping only the part reachable from
  /// the root.
  pub fn from_nodes(instance: &SteinerInstance, chosen: &[bool], lower_bound: f64, timed_out: bool) -> Self {
    let (in_tree, tree_edges) = instance.span(chosen);
    let valid = instance.required_nodes().all(|n| in_tree[n as usize]);
    let cost = (0..instance.node_count() as u32)
      .filter(|&n| in_tree[n as usize])
      .map(|n| instance.weight(n))
      .sum();
    Self {
      in_tree,
      tree_edges,
      cost,
      lower_bound,
      valid,
      timed_out,
    }
  }

  #[inline]
  pub fn contains(&self, node: u32) -> bool {
    self.in_tree.get(node as usize).copied().unwrap_or(false)
  }

  /// Relative gap between cost and lower bound.
  pub fn gap(&self) -> f64 {
    if self.cost <= 0.0 {
      0.0
    } else {
      ((self.cost - self.lower_bound) / self.cost).max(0.0)
    }
  }
}

/// A Steiner tree solver callable from worker threads.
pub trait SteinerSolver: Send + Sync {
  fn name(&self) -> &'static str;

  /// Solve within `budget`; on exhaustion return the best incumbent.
  fn solve(&self, instance: &SteinerInstance, budget: Duration) -> SteinerSolution;
}

/// Exhaustive search for small instances, the path heuristic otherwise.
#[derive(Clone, Debug)]
pub struct AutoSolver {
  pub exact_node_limit: usize,
  exhaustive: ExhaustiveSolver,
  heuristic: PathHeuristicSolver,
}

impl AutoSolver {
  pub fn new(exact_node_limit: usize) -> Self {
    Self {
      exact_node_limit,
      exhaustive: ExhaustiveSolver,
      heuristic: PathHeuristicSolver::default(),
    }
  }
}

impl SteinerSolver for AutoSolver {
  fn name(&self) -> &'static str {
    "auto"
  }

  fn solve(&self, instance: &SteinerInstance, budget: Duration) -> SteinerSolution {
    if instance.optional_count() <= self.exact_node_limit {
      self.exhaustive.solve(instance, budget)
    } else {
      self.heuristic.solve(instance, budget)
    }
  }
}

#[cfg(test)]
#[path = "steiner_test.rs"]
mod steiner_test;
