//! Solve-and-repair loop on one working graph.
//!
//! A tree that claims a generator for both sides is infeasible. The loop
//! picks one violator, tries forcing it to each side, rebuilds and re-solves
//! both variants, keeps the better one and repeats until no violator is
//! left.
//!
//! A tree without such violators can still leave a handle open: the region
//! graph cannot see loops that run through several voxels of one region.
//! Once the claims are consistent, every undecided generator is flipped
//! tentatively on the voxel geometry; the cheapest flip that lowers the Betti
//! total without adding a component or a cavity is forced and the instance
//! re-solved.
//!
//! Every iteration forces at least one undecided generator, so the loop ends
//! after at most as many iterations as there are generators.

use std::cmp::{Ordering, Reverse};
use std::time::Duration;

use smallvec::SmallVec;
use tracing::{trace, warn};

use super::handles::{lowers_betti, Assignment};
use super::WorkingGraph;
use crate::hypergraph::{Grouping, Hypergraph};
use crate::steiner::{SteinerSolution, SteinerSolver};
use crate::types::{RegionId, Side};

/// Outcome of [`resolve`].
#[derive(Clone, Debug)]
pub struct Resolution {
  /// Final side of every generator of the working graph, ascending index.
  pub decisions: Vec<(RegionId, Side)>,
  pub iterations: usize,
  /// Generators forced off a handle.
  pub handle_flips: usize,
  /// Any solver call ran out of budget.
  pub timed_out: bool,
  /// The final tree covered every required node.
  pub valid: bool,
  /// Forced cost plus tree cost of the final instance.
  pub cost: f64,
  pub wires: [usize; 2],
}

struct Attempt {
  graph: WorkingGraph,
  hypergraph: Hypergraph,
  solution: SteinerSolution,
}

/// Lexicographic: wires added above the starting instance, total wires,
/// then cost.
#[derive(Clone, Copy, Debug)]
struct Score {
  added: usize,
  wires: usize,
  cost: f64,
}

impl Score {
  fn is_better_than(&self, other: &Score) -> bool {
    let cost = if (self.cost - other.cost).abs() <= 1e-9 {
      Ordering::Equal
    } else {
      self.cost.total_cmp(&other.cost)
    };
    (self.added, self.wires).cmp(&(other.added, other.wires)).then(cost) == Ordering::Less
  }
}

impl Attempt {
  fn solve(graph: WorkingGraph, grouping: &Grouping, solver: &dyn SteinerSolver, budget: Duration) -> Self {
    let hypergraph = Hypergraph::build(&graph, grouping);
    let solution = solver.solve(&hypergraph.instance, budget);
    if solution.timed_out {
      warn!(
        solver = solver.name(),
        nodes = hypergraph.instance.node_count(),
        cost = solution.cost,
        gap = solution.gap(),
        "steiner solve ran out of budget; using incumbent"
      );
    }
    Self {
      graph,
      hypergraph,
      solution,
    }
  }

  fn cost(&self) -> f64 {
    self.graph.forced_cost() + self.solution.cost
  }

  fn score(&self, start: [usize; 2]) -> Score {
    if !self.solution.valid {
      return Score {
        added: usize::MAX,
        wires: usize::MAX,
        cost: f64::INFINITY,
      };
    }
    let wires = self.hypergraph.wires;
    Score {
      added: wires[0].saturating_sub(start[0]) + wires[1].saturating_sub(start[1]),
      wires: wires[0] + wires[1],
      cost: self.cost(),
    }
  }

  /// Cheapest violator, then the one touching most terminal nodes, then the
  /// lowest index.
  fn violator(&self) -> Option<u32> {
    let graph = &self.graph;
    self
      .hypergraph
      .violators(&self.solution)
      .into_iter()
      .filter(|&v| graph.node(v).is_undecided())
      .min_by(|&a, &b| {
        graph
          .node(a)
          .magnitude()
          .total_cmp(&graph.node(b).magnitude())
          .then_with(|| Reverse(self.terminal_contacts(a)).cmp(&Reverse(self.terminal_contacts(b))))
          .then(a.cmp(&b))
      })
  }

  /// Side of every node: decided side, then claimed side, then native.
  fn sides(&self) -> Vec<Side> {
    let claims = self.hypergraph.claims(&self.solution);
    self
      .graph
      .nodes()
      .iter()
      .enumerate()
      .map(|(i, node)| {
        node
          .side()
          .or_else(|| Hypergraph::claimed_side(&claims, i as u32))
          .unwrap_or_else(|| node.kind.native_side())
      })
      .collect()
  }

  /// Cheapest undecided generator whose flip lowers the Betti total without
  /// adding a component or a cavity, with the side it should go to.
  fn handle_violator(&self, grouping: &Grouping) -> Option<(u32, Side)> {
    let graph = &self.graph;
    let assignment = Assignment::new(graph, self.sides(), grouping);
    let mut best: Option<(f64, u32, Side)> = None;
    for g in graph.undecided() {
      let target = assignment.side(g).opposite();
      let moved = assignment.moved_with(g, target);
      let delta = if moved.len() == 1 {
        assignment.flip(g)
      } else {
        assignment.flip_all(&moved)
      };
      if !lowers_betti(&delta) {
        continue;
      }
      let cost: f64 = moved.iter().map(|&m| graph.node(m).cost_to(target)).sum();
      trace!(region = graph.node(g).region, ?target, ?delta, cost, "handle flip");
      if best.map_or(true, |(c, _, _)| cost < c - 1e-12) {
        best = Some((cost, g, target));
      }
    }
    best.map(|(_, g, side)| (g, side))
  }

  fn terminal_contacts(&self, i: u32) -> usize {
    let mut seen: SmallVec<[u32; 8]> = SmallVec::new();
    for &(j, _) in self.graph.neighbors(i) {
      if let Some(t) = self.hypergraph.terminal_of(j) {
        if !seen.contains(&t) {
          seen.push(t);
        }
      }
    }
    seen.len()
  }
}

/// Solve `graph` under `grouping`, repairing violations until none remain.
/// Generators left unclaimed keep their native side.
pub fn resolve(graph: WorkingGraph, grouping: &Grouping, solver: &dyn SteinerSolver, budget: Duration) -> Resolution {
  let mut current = Attempt::solve(graph, grouping, solver, budget);
  let start = current.hypergraph.wires;
  let limit = current.graph.undecided_count();
  let mut timed_out = current.solution.timed_out;
  let mut iterations = 0;
  let mut handle_flips = 0;

  while iterations < limit {
    if let Some(v) = current.violator() {
      iterations += 1;
      current = repair(current, v, grouping, solver, budget, start, &mut timed_out);
      continue;
    }
    if !current.solution.valid {
      break;
    }
    let Some((g, side)) = current.handle_violator(grouping) else {
      break;
    };
    iterations += 1;
    handle_flips += 1;
    let mut graph = current.graph.clone();
    let forced = graph.force(g, side);
    trace!(region = graph.node(g).region, ?side, forced = forced.len(), "forced off a handle");
    current = Attempt::solve(graph, grouping, solver, budget);
    timed_out |= current.solution.timed_out;
  }

  let claims = current.hypergraph.claims(&current.solution);
  let graph = &current.graph;
  let decisions = graph.decisions(|i| {
    Hypergraph::claimed_side(&claims, i).unwrap_or_else(|| graph.node(i).kind.native_side())
  });
  Resolution {
    decisions,
    iterations,
    handle_flips,
    timed_out,
    valid: current.solution.valid,
    cost: current.cost(),
    wires: current.hypergraph.wires,
  }
}

/// Force violator `v` to each side, re-solve both and keep the better
/// attempt.
fn repair(
  current: Attempt,
  v: u32,
  grouping: &Grouping,
  solver: &dyn SteinerSolver,
  budget: Duration,
  start: [usize; 2],
  timed_out: &mut bool,
) -> Attempt {
  let native = current.graph.node(v).kind.native_side();
  let mut best: Option<(Score, Attempt)> = None;
  for side in [native, native.opposite()] {
    let mut graph = current.graph.clone();
    let forced = graph.force(v, side);
    let attempt = Attempt::solve(graph, grouping, solver, budget);
    *timed_out |= attempt.solution.timed_out;
    let score = attempt.score(start);
    trace!(
      region = current.graph.node(v).region,
      ?side,
      forced = forced.len(),
      added = score.added,
      wires = score.wires,
      cost = score.cost,
      "repair candidate"
    );
    let replace = match &best {
      Some((incumbent, _)) => score.is_better_than(incumbent),
      None => true,
    };
    if replace {
      best = Some((score, attempt));
    }
  }
  best.map_or(current, |(_, attempt)| attempt)
}
