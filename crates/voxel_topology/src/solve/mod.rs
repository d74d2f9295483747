//! Local/global decision stages.
//!
//! ```text
//!   clusters ─► bound ─► solve (pool) ─► commit ─┐
//!      ▲                                         │  repeat while a round
//!      └─────────────────────────────────────────┘  commits something
//!   global working graph ─► solve + repair ─► commit all
//! ```
//!
//! Both stages work on owned [`WorkingGraph`] copies; only commits touch
//! the context. If the committed configuration ends up with more components
//! or cavities than it started with, the context is restored and the greedy
//! pass decides instead.

mod bound;
mod cluster;
mod handles;
mod local;
mod pool;
mod repair;
mod working;

pub use bound::{bell, combinations, groupings, terminal_blocks};
pub use cluster::clusters;
pub use handles::{lowers_betti, Assignment, ClusterGeometry};
pub use local::{solve_cluster, ClusterCompletion, ClusterRequest, LocalSolveStage};
pub use pool::WorkerPool;
pub use repair::{resolve, Resolution};
pub use working::{WorkNode, WorkingGraph};

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::greedy::{greedy_pass, GreedyStats};
use crate::hypergraph::Grouping;
use crate::metrics::{RollingWindow, Stage, StageTimings};
use crate::regions::SimplifyContext;
use crate::steiner::SteinerSolver;
use crate::types::{RegionId, Side};

/// Counters of the decision stages.
#[derive(Clone, Debug, Default)]
pub struct SolveStats {
  pub local_rounds: usize,
  pub clusters_solved: usize,
  /// Clusters deferred to the global stage in the last local round.
  pub clusters_deferred: usize,
  pub local_committed: usize,
  /// Generators handed to the global stage.
  pub global_generators: usize,
  pub repair_iterations: usize,
  /// Generators forced off a handle during repair.
  pub handle_flips: usize,
  /// Solves that ran out of budget.
  pub timeouts: usize,
  /// Per-cluster solve times in microseconds.
  pub cluster_times_us: RollingWindow<u64>,
  /// Set when the Steiner decisions were discarded for the greedy pass.
  pub fallback: Option<GreedyStats>,
}

/// Decide every remaining generator with the Steiner stages.
pub fn solve_generators(
  ctx: &mut SimplifyContext,
  solver: Arc<dyn SteinerSolver>,
  timings: &mut StageTimings,
) -> Result<SolveStats> {
  let mut stats = SolveStats::default();
  if ctx.regions.generator_ids().is_empty() {
    return Ok(stats);
  }
  let snapshot = ctx.clone();
  let (before, _) = ctx.betti();

  let pool = WorkerPool::new(ctx.config.worker_threads)?;
  info!(
    generators = ctx.regions.generator_ids().len(),
    threads = pool.num_threads(),
    solver = solver.name(),
    "decision stages starting"
  );
  let mut stage = LocalSolveStage::new(pool, Arc::clone(&solver), ctx.config.local_budget);
  timings.time(Stage::Local, || run_local(ctx, &mut stage, &mut stats));
  timings.time(Stage::Global, || run_global(ctx, &*solver, &mut stats));

  let (after, _) = ctx.betti();
  if after.h0 > before.h0 || after.h2 > before.h2 {
    warn!(%before, %after, "decisions raised a Betti number; deciding greedily instead");
    *ctx = snapshot;
    stats.fallback = Some(timings.time(Stage::Greedy, || greedy_pass(ctx)));
  }
  Ok(stats)
}

fn run_local(ctx: &mut SimplifyContext, stage: &mut LocalSolveStage, stats: &mut SolveStats) {
  loop {
    stats.local_rounds += 1;
    let mut deferred = 0;
    for cluster in clusters(ctx) {
      let blocks = terminal_blocks(ctx, &cluster);
      let combinations = combinations(&blocks);
      if combinations > ctx.config.combination_limit {
        warn!(
          first = cluster[0],
          generators = cluster.len(),
          combinations,
          "cluster deferred to the global stage"
        );
        deferred += 1;
        continue;
      }
      stage.enqueue(WorkingGraph::cluster(ctx, &cluster), groupings(&blocks));
    }
    stats.clusters_deferred = deferred;
    if stage.pending_count() == 0 {
      break;
    }
    stage.tick();

    let mut committed = 0;
    for completion in stage.drain_completions() {
      stats.clusters_solved += 1;
      stats.repair_iterations += completion.iterations;
      stats.handle_flips += completion.handle_flips;
      stats.timeouts += usize::from(completion.timed_out);
      stats.cluster_times_us.push(completion.solve_time_us);
      debug!(
        cluster = completion.id,
        generators = completion.generators,
        groupings = completion.groupings,
        agreed = completion.decisions.len(),
        time_us = completion.solve_time_us,
        "cluster solved"
      );
      committed += commit(ctx, &completion.decisions);
    }
    stats.local_committed += committed;
    info!(round = stats.local_rounds, committed, deferred, "local round finished");
    if committed == 0 {
      break;
    }
  }
}

fn run_global(ctx: &mut SimplifyContext, solver: &dyn SteinerSolver, stats: &mut SolveStats) {
  let graph = WorkingGraph::global(ctx);
  let generators = graph.generators().count();
  if generators == 0 {
    return;
  }
  let resolution = resolve(graph, &Grouping::new(), solver, ctx.config.global_budget);
  stats.global_generators = generators;
  stats.repair_iterations += resolution.iterations;
  stats.handle_flips += resolution.handle_flips;
  stats.timeouts += usize::from(resolution.timed_out);
  let committed = commit(ctx, &resolution.decisions);
  info!(
    generators,
    committed,
    iterations = resolution.iterations,
    handle_flips = resolution.handle_flips,
    cost = resolution.cost,
    "global stage finished"
  );
}

/// Decide generators in ascending id, skipping ids that are no longer
/// generators. Returns how many were decided.
pub fn commit(ctx: &mut SimplifyContext, decisions: &[(RegionId, Side)]) -> usize {
  let mut ordered = decisions.to_vec();
  ordered.sort_by_key(|&(id, _)| id);
  let mut committed = 0;
  for (id, side) in ordered {
    if ctx.regions.try_get(id).is_some_and(|r| r.kind.is_generator()) {
      ctx.decide(id, side);
      committed += 1;
    }
  }
  committed
}

#[cfg(test)]
#[path = "solve_test.rs"]
mod solve_test;
