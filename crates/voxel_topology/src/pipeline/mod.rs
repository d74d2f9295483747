//! Simplification Pipeline
//!
//! Runs every stage on one volume and packages the result.
//!
//! ```text
//! ┌───────┐    ┌──────┐    ┌────────────┐    ┌──────────┐    ┌───────────┐    ┌──────────────┐
//! │ Label ├───►│ Grow ├───►│ Generators ├───►│ Simplify ├───►│ Isolation ├───►│ Local/Global │
//! └───────┘    └──────┘    └────────────┘    └──────────┘    └───────────┘    └──────┬───────┘
//!  Core/N       simple       Cut/Fill          shrink         lone regions           │
//!  flood        boundary     flood +           generators     flipped                ▼
//!               voxels       adjacency                                         SimplifyOutcome
//!                                                               (greedy mode: Greedy pass instead)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use voxel_topology::{simplify, SimplePointOracle, SimplifyConfig, Thresholds};
//!
//! let oracle = SimplePointOracle::computed();
//! let config = SimplifyConfig::new(Thresholds::new(0.0, 0.3, -0.3));
//! let outcome = simplify(&volume, config, &oracle)?;
//! println!("{outcome}");
//! ```

mod outcome;

pub use outcome::{BaselineReport, CostSummary, RegionRecord, SimplifyOutcome};

use std::sync::Arc;

use tracing::{debug, info};
use web_time::Instant;

use crate::error::Result;
use crate::generators::{resolve_isolated, simplify_generators};
use crate::greedy::greedy_pass;
use crate::metrics::{PipelineStats, Stage};
use crate::regions::{grow, label_generators, label_terminals, SimplifyContext};
use crate::simple_point::SimplePointOracle;
use crate::solve::solve_generators;
use crate::steiner::{AutoSolver, SteinerSolver};
use crate::types::{RegionKind, SimplifyConfig, SolverMode};
use crate::volume::Volume;

use outcome::RegionSnapshot;

/// Simplify `volume` with the default solver for `config`.
pub fn simplify(volume: &Volume, config: SimplifyConfig, oracle: &SimplePointOracle) -> Result<SimplifyOutcome> {
  let solver: Arc<dyn SteinerSolver> = Arc::new(AutoSolver::new(config.exact_node_limit));
  simplify_with_solver(volume, config, oracle, solver)
}

/// Simplify `volume`, deciding generators with `solver` in Steiner mode.
pub fn simplify_with_solver(
  volume: &Volume,
  config: SimplifyConfig,
  oracle: &SimplePointOracle,
  solver: Arc<dyn SteinerSolver>,
) -> Result<SimplifyOutcome> {
  let start = Instant::now();
  let mut ctx = SimplifyContext::new(volume, config, oracle)?;
  let mut stats = PipelineStats::default();
  let (betti_before, euler_before) = ctx.polarity_betti();
  info!(dims = ?volume.dims(), betti = %betti_before, "simplification starting");

  // 1. Terminals and their boundary growth
  let mut queues = stats.timings.time(Stage::Label, || label_terminals(&mut ctx));
  stats.grown = stats.timings.time(Stage::Grow, || {
    [
      grow(&mut ctx, &mut queues.core, RegionKind::Core),
      grow(&mut ctx, &mut queues.neighborhood, RegionKind::Neighborhood),
    ]
  });

  // 2. Generators and region adjacency
  stats.timings.time(Stage::Generators, || {
    label_generators(&mut ctx);
    ctx.build_adjacency();
  });
  let snapshots = RegionSnapshot::capture(&ctx);
  stats.initial_generators = snapshots.len();
  info!(
    core = ctx.regions.count(RegionKind::Core),
    neighborhood = ctx.regions.count(RegionKind::Neighborhood),
    cuts = ctx.regions.count(RegionKind::Cut),
    fills = ctx.regions.count(RegionKind::Fill),
    "regions labeled"
  );

  // 3. Local shrinking before any global decision
  stats.simplifier = stats.timings.time(Stage::Simplify, || simplify_generators(&mut ctx));
  stats.isolated = stats.timings.time(Stage::Isolation, || resolve_isolated(&mut ctx));
  info!(
    removed = stats.simplifier.removed,
    isolated = stats.isolated,
    remaining = ctx.regions.generator_ids().len(),
    "generators simplified"
  );

  let baseline = (ctx.config.greedy_baseline && ctx.config.solver == SolverMode::Steiner).then(|| {
    let mut copy = ctx.clone();
    let greedy = stats.timings.time(Stage::Greedy, || greedy_pass(&mut copy));
    let report = BaselineReport {
      betti: copy.betti().0,
      applied_cost: CostSummary::measure(&copy).applied,
      flips: greedy.flips,
    };
    debug!(betti = %report.betti, cost = report.applied_cost, "greedy baseline");
    report
  });

  // 4. Decide what is left
  match ctx.config.solver {
    SolverMode::Steiner => {
      stats.solve = solve_generators(&mut ctx, solver, &mut stats.timings)?;
    }
    SolverMode::Greedy => {
      stats.greedy = Some(stats.timings.time(Stage::Greedy, || greedy_pass(&mut ctx)));
    }
  }
  debug_assert!(ctx.regions.generator_ids().is_empty());

  let (betti_after, euler_after) = ctx.betti();
  let costs = CostSummary::measure(&ctx);
  let regions = snapshots.iter().map(|s| s.record(&ctx)).collect();
  info!(
    betti = %betti_after,
    cost = costs.applied,
    timings = %stats.timings,
    elapsed_ms = start.elapsed().as_millis() as u64,
    "simplification finished"
  );

  Ok(SimplifyOutcome {
    labels: ctx.labels(),
    dims: volume.dims(),
    thresholds: ctx.config.thresholds,
    betti_before,
    betti_after,
    euler_before,
    euler_after,
    costs,
    regions,
    stats,
    baseline,
  })
}
