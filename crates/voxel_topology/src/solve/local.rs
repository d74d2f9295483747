//! Local phase task queue.
//!
//! Enqueue → Tick → Completions: clusters are enqueued with their grouping
//! hypotheses, `tick` solves every pending cluster on the worker pool and
//! the completions are drained in request order.

use std::sync::Arc;
use std::time::Duration;

use web_time::Instant;

use super::pool::WorkerPool;
use super::repair::resolve;
use super::WorkingGraph;
use crate::hypergraph::Grouping;
use crate::steiner::SteinerSolver;
use crate::types::{RegionId, Side};

/// A cluster to solve under every grouping.
#[derive(Clone, Debug)]
pub struct ClusterRequest {
  /// Unique identifier for this request
  pub id: u64,
  pub graph: WorkingGraph,
  pub groupings: Vec<Grouping>,
}

/// Decisions a cluster agreed on under every grouping.
#[derive(Clone, Debug)]
pub struct ClusterCompletion {
  /// Request ID this completion corresponds to
  pub id: u64,
  /// Generators decided identically under every grouping, ascending id.
  /// Empty unless every solve produced a valid tree.
  pub decisions: Vec<(RegionId, Side)>,
  /// Generators in the cluster.
  pub generators: usize,
  pub groupings: usize,
  pub iterations: usize,
  /// Generators forced off a handle, over every grouping.
  pub handle_flips: usize,
  pub timed_out: bool,
  /// Wall clock time for all groupings in microseconds.
  pub solve_time_us: u64,
}

/// Solves clusters in parallel on a bounded pool.
pub struct LocalSolveStage {
  pool: WorkerPool,
  solver: Arc<dyn SteinerSolver>,
  budget: Duration,
  pending: Vec<ClusterRequest>,
  completed: Vec<ClusterCompletion>,
  next_id: u64,
}

impl LocalSolveStage {
  pub fn new(pool: WorkerPool, solver: Arc<dyn SteinerSolver>, budget: Duration) -> Self {
    Self {
      pool,
      solver,
      budget,
      pending: Vec::new(),
      completed: Vec::new(),
      next_id: 0,
    }
  }

  /// Enqueue a cluster, returning the assigned ID.
  pub fn enqueue(&mut self, graph: WorkingGraph, groupings: Vec<Grouping>) -> u64 {
    let id = self.next_id;
    self.next_id += 1;
    self.pending.push(ClusterRequest { id, graph, groupings });
    id
  }

  /// Solve every pending cluster and move the results to the completions.
  /// Returns the number of clusters processed this tick.
  pub fn tick(&mut self) -> usize {
    if self.pending.is_empty() {
      return 0;
    }
    let requests = std::mem::take(&mut self.pending);
    let count = requests.len();

    let (tx, rx) = crossbeam_channel::unbounded();
    let solver: &dyn SteinerSolver = &*self.solver;
    let budget = self.budget;
    self.pool.scope(|s| {
      for request in requests {
        let tx = tx.clone();
        s.spawn(move |_| {
          let _ = tx.send(solve_cluster(request, solver, budget));
        });
      }
    });
    drop(tx);

    let mut completions: Vec<ClusterCompletion> = rx.try_iter().collect();
    completions.sort_by_key(|c| c.id);
    self.completed.extend(completions);
    count
  }

  /// Take all completed clusters.
  pub fn drain_completions(&mut self) -> Vec<ClusterCompletion> {
    std::mem::take(&mut self.completed)
  }

  pub fn pending_count(&self) -> usize {
    self.pending.len()
  }

  pub fn completed_count(&self) -> usize {
    self.completed.len()
  }

  /// True when no work remains.
  pub fn is_idle(&self) -> bool {
    self.pending.is_empty() && self.completed.is_empty()
  }

  pub fn num_threads(&self) -> usize {
    self.pool.num_threads()
  }
}

/// Solve one cluster for every grouping and keep the agreed decisions.
pub fn solve_cluster(request: ClusterRequest, solver: &dyn SteinerSolver, budget: Duration) -> ClusterCompletion {
  let start = Instant::now();
  let generators = request.graph.generators().count();
  let mut agreed: Option<Vec<(RegionId, Option<Side>)>> = None;
  let mut all_valid = true;
  let mut iterations = 0;
  let mut handle_flips = 0;
  let mut timed_out = false;

  for grouping in &request.groupings {
    let resolution = resolve(request.graph.clone(), grouping, solver, budget);
    iterations += resolution.iterations;
    handle_flips += resolution.handle_flips;
    timed_out |= resolution.timed_out;
    all_valid &= resolution.valid;
    agreed = Some(match agreed.take() {
      None => resolution.decisions.iter().map(|&(r, s)| (r, Some(s))).collect(),
      Some(mut previous) => {
        for (slot, &(region, side)) in previous.iter_mut().zip(&resolution.decisions) {
          debug_assert_eq!(slot.0, region);
          if slot.1 != Some(side) {
            slot.1 = None;
          }
        }
        previous
      }
    });
  }

  let decisions = if all_valid {
    agreed
      .unwrap_or_default()
      .into_iter()
      .filter_map(|(r, s)| s.map(|s| (r, s)))
      .collect()
  } else {
    Vec::new()
  };
  ClusterCompletion {
    id: request.id,
    decisions,
    generators,
    groupings: request.groupings.len(),
    iterations,
    handle_flips,
    timed_out,
    solve_time_us: start.elapsed().as_micros() as u64,
  }
}
