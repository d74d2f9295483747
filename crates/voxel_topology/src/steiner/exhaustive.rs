//! Exact search over subsets of optional nodes.

use std::time::Duration;

use web_time::Instant;

use super::{PathHeuristicSolver, SteinerInstance, SteinerSolution, SteinerSolver};

/// Subsets checked between two budget checks.
const CHECK_INTERVAL: u64 = 1024;

/// Instances with more optional nodes than this go to the path heuristic.
pub const MAX_EXHAUSTIVE_NODES: usize = 30;

/// Enumerates every subset of optional nodes. Exact when it finishes inside
/// the budget; ties go to the subset with the lowest mask.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExhaustiveSolver;

impl SteinerSolver for ExhaustiveSolver {
  fn name(&self) -> &'static str {
    "exhaustive"
  }

  fn solve(&self, instance: &SteinerInstance, budget: Duration) -> SteinerSolution {
    let optional: Vec<u32> = instance.optional_nodes().collect();
    if optional.len() > MAX_EXHAUSTIVE_NODES {
      return PathHeuristicSolver::default().solve(instance, budget);
    }

    let start = Instant::now();
    let base: Vec<bool> = (0..instance.node_count() as u32)
      .map(|n| instance.is_required(n))
      .collect();
    let required_weight = instance.required_weight();

    // Incumbent: every node.
    let mut best = vec![true; instance.node_count()];
    let mut best_cost = if instance.covers(&best) {
      required_weight + optional.iter().map(|&n| instance.weight(n)).sum::<f64>()
    } else {
      f64::INFINITY
    };

    let mut timed_out = false;
    let mut chosen = base.clone();
    for mask in 0..(1u64 << optional.len()) {
      if mask % CHECK_INTERVAL == 0 && start.elapsed() > budget {
        timed_out = true;
        break;
      }
      let mut cost = required_weight;
      for (bit, &node) in optional.iter().enumerate() {
        let on = mask & (1 << bit) != 0;
        chosen[node as usize] = on;
        if on {
          cost += instance.weight(node);
        }
      }
      if cost < best_cost - 1e-12 && instance.covers(&chosen) {
        best_cost = cost;
        best.clone_from(&chosen);
      }
    }

    let lower_bound = if timed_out { required_weight } else { best_cost };
    SteinerSolution::from_nodes(instance, &best, lower_bound.min(best_cost), timed_out)
  }
}
