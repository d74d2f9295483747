use std::sync::Arc;
use std::time::Duration;

use glam::UVec3;

use super::*;
use crate::metrics::StageTimings;
use crate::simple_point::SimplePointOracle;
use crate::steiner::{AutoSolver, PathHeuristicSolver, SteinerInstance, SteinerSolution};
use crate::test_utils::*;
use crate::types::RegionKind;

const BUDGET: Duration = Duration::from_secs(5);

fn auto() -> Arc<dyn SteinerSolver> {
  Arc::new(AutoSolver::new(16))
}

/// Takes every required node and every optional node that costs something.
/// For lone generators that is the hypernode of the side they are not
/// native to.
struct CostlySideSolver;

impl SteinerSolver for CostlySideSolver {
  fn name(&self) -> &'static str {
    "costly-side"
  }

  fn solve(&self, instance: &SteinerInstance, _budget: Duration) -> SteinerSolution {
    let chosen: Vec<bool> = (0..instance.node_count() as u32)
      .map(|n| instance.is_required(n) || instance.weight(n) > 1e-3)
      .collect();
    SteinerSolution::from_nodes(instance, &chosen, 0.0, false)
  }
}

#[test]
fn test_clusters_split_on_terminals() {
  let oracle = SimplePointOracle::computed();
  let mut ctx = SimplifyContext::new(&double_bridge(), banded_config(), &oracle).unwrap();
  labeled(&mut ctx);
  let joints: Vec<RegionId> = DOUBLE_JOINTS.iter().map(|&p| ctx.region_at(p)).collect();
  assert_eq!(clusters(&ctx), vec![vec![joints[0]], vec![joints[1]]]);
}

#[test]
fn test_blocks_join_terminals_connected_elsewhere() {
  let oracle = SimplePointOracle::computed();
  let mut ctx = SimplifyContext::new(&double_bridge(), banded_config(), &oracle).unwrap();
  labeled(&mut ctx);
  let joint = ctx.region_at(DOUBLE_JOINTS[0]);
  let left = ctx.region_at(UVec3::splat(2));
  let right = ctx.region_at(UVec3::new(6, 2, 2));
  let exterior = ctx.region_at(UVec3::ZERO);

  // The other joint links the blobs outside this cluster.
  let blocks = terminal_blocks(&ctx, &[joint]);
  let mut pair = vec![left, right];
  pair.sort_unstable();
  assert_eq!(blocks, vec![pair, vec![exterior]]);
  assert_eq!(combinations(&blocks), 2);
  assert_eq!(groupings(&blocks).len(), 2);
}

#[test]
fn test_single_bridge_blocks_stay_apart() {
  let oracle = SimplePointOracle::computed();
  let mut ctx = SimplifyContext::new(&bridge(), banded_config(), &oracle).unwrap();
  labeled(&mut ctx);
  let joint = ctx.region_at(BRIDGE_JOINT);
  let blocks = terminal_blocks(&ctx, &[joint]);
  assert_eq!(blocks.len(), 3);
  assert_eq!(combinations(&blocks), 1);
}

#[test]
fn test_bridge_is_kept() {
  let oracle = SimplePointOracle::computed();
  let mut ctx = SimplifyContext::new(&bridge(), banded_config(), &oracle).unwrap();
  prepared(&mut ctx);
  assert_eq!(ctx.regions.generator_ids().len(), 1);

  let stats = solve_generators(&mut ctx, auto(), &mut StageTimings::default()).unwrap();
  assert!(ctx.regions.generator_ids().is_empty());
  assert_eq!(stats.local_committed, 1);
  assert_eq!(stats.clusters_solved, 1);
  assert_eq!(stats.cluster_times_us.len(), 1);
  assert!(stats.fallback.is_none());
  assert_eq!(ctx.regions.kind(ctx.region_at(BRIDGE_JOINT)), RegionKind::Core);
  assert_eq!(ctx.betti().0.h0, 1);
  assert!(ctx.check_invariants().is_empty(), "{:?}", ctx.check_invariants());
}

#[test]
fn test_local_stage_round_trip() {
  let oracle = SimplePointOracle::computed();
  let mut ctx = SimplifyContext::new(&bridge(), banded_config(), &oracle).unwrap();
  labeled(&mut ctx);
  let joint = ctx.region_at(BRIDGE_JOINT);

  let mut stage = LocalSolveStage::new(WorkerPool::new(Some(2)).unwrap(), auto(), BUDGET);
  let id = stage.enqueue(WorkingGraph::cluster(&ctx, &[joint]), vec![Grouping::new()]);
  assert_eq!(id, 0);
  assert_eq!(stage.pending_count(), 1);

  assert_eq!(stage.tick(), 1);
  assert_eq!(stage.pending_count(), 0);
  assert_eq!(stage.completed_count(), 1);
  let completions = stage.drain_completions();
  assert!(stage.is_idle());
  assert_eq!(completions[0].decisions, vec![(joint, Side::Foreground)]);
  assert_eq!(completions[0].generators, 1);
}

#[test]
fn test_completions_come_back_in_request_order() {
  let oracle = SimplePointOracle::computed();
  let mut ctx = SimplifyContext::new(&double_bridge(), banded_config(), &oracle).unwrap();
  labeled(&mut ctx);

  let mut stage = LocalSolveStage::new(WorkerPool::new(Some(4)).unwrap(), auto(), BUDGET);
  for _ in 0..3 {
    for cluster in clusters(&ctx) {
      let blocks = terminal_blocks(&ctx, &cluster);
      stage.enqueue(WorkingGraph::cluster(&ctx, &cluster), groupings(&blocks));
    }
  }
  assert_eq!(stage.tick(), 6);
  let ids: Vec<u64> = stage.drain_completions().iter().map(|c| c.id).collect();
  assert_eq!(ids, (0..6).collect::<Vec<_>>());
}

#[test]
fn test_commit_skips_stale_ids() {
  let oracle = SimplePointOracle::computed();
  let mut ctx = SimplifyContext::new(&bridge(), banded_config(), &oracle).unwrap();
  labeled(&mut ctx);
  let joint = ctx.region_at(BRIDGE_JOINT);
  let exterior = ctx.region_at(UVec3::ZERO);

  assert_eq!(commit(&mut ctx, &[(joint, Side::Foreground), (exterior, Side::Foreground)]), 1);
  assert_eq!(commit(&mut ctx, &[(joint, Side::Background)]), 0);
  assert_eq!(ctx.regions.count(RegionKind::Core), 1);
}

#[test]
fn test_repair_stays_within_generator_count() {
  let oracle = SimplePointOracle::computed();
  for seed in 0..4 {
    let volume = random_blobs(seed, UVec3::splat(10));
    let mut ctx = SimplifyContext::new(&volume, blob_config(), &oracle).unwrap();
    prepared(&mut ctx);
    let graph = WorkingGraph::global(&ctx);
    let undecided = graph.undecided_count();
    let resolution = resolve(graph, &Grouping::new(), &PathHeuristicSolver::default(), BUDGET);

    assert!(resolution.valid, "seed {seed}");
    assert!(resolution.iterations <= undecided, "seed {seed}");
    assert_eq!(resolution.decisions.len(), ctx.regions.generator_ids().len(), "seed {seed}");
  }
}

#[test]
fn test_random_blobs_end_fully_decided() {
  let oracle = SimplePointOracle::computed();
  for seed in 0..4 {
    let volume = random_blobs(seed, UVec3::splat(10));
    let mut ctx = SimplifyContext::new(&volume, blob_config().with_worker_threads(2), &oracle).unwrap();
    labeled(&mut ctx);
    let (before, _) = ctx.polarity_betti();
    simplify_and_isolate(&mut ctx);
    solve_generators(&mut ctx, auto(), &mut StageTimings::default()).unwrap();

    let (after, counts) = ctx.betti();
    assert!(ctx.regions.generator_ids().is_empty(), "seed {seed}");
    assert!(after.h0 <= before.h0, "seed {seed}: {before} -> {after}");
    assert!(after.h2 <= before.h2, "seed {seed}: {before} -> {after}");
    assert_eq!(after.euler_characteristic(), counts.chi(), "seed {seed}");
    assert!(ctx.check_invariants().is_empty(), "seed {seed}: {:?}", ctx.check_invariants());
  }
}

#[test]
fn test_resolve_cuts_thick_slab() {
  let oracle = SimplePointOracle::computed();
  let mut ctx = SimplifyContext::new(&thick_ring(), banded_config(), &oracle).unwrap();
  prepared(&mut ctx);
  let slab = ctx.regions.generator_ids();
  assert_eq!(slab.len(), 1);

  let resolution = resolve(WorkingGraph::global(&ctx), &Grouping::new(), &*auto(), BUDGET);
  assert!(resolution.valid);
  assert_eq!(resolution.handle_flips, 1);
  assert_eq!(resolution.iterations, 1);
  assert_eq!(resolution.decisions, vec![(slab[0], Side::Background)]);
  assert!((resolution.cost - 2.0).abs() < 1e-3);
}

#[test]
fn test_thick_slab_opened_without_fallback() {
  let oracle = SimplePointOracle::computed();
  let mut ctx = SimplifyContext::new(&thick_ring(), banded_config(), &oracle).unwrap();
  prepared(&mut ctx);
  assert_eq!(ctx.betti().0.h1, 1);

  let stats = solve_generators(&mut ctx, auto(), &mut StageTimings::default()).unwrap();
  assert!(stats.fallback.is_none());
  assert_eq!(stats.handle_flips, 1);
  let (after, _) = ctx.betti();
  assert_eq!((after.h0, after.h1, after.h2), (1, 0, 0));
}

#[test]
fn test_handle_flip_skips_bridges() {
  // Cutting either joint opens the handle; afterwards the other one is a
  // bridge and stays.
  let oracle = SimplePointOracle::computed();
  let mut ctx = SimplifyContext::new(&double_bridge(), banded_config(), &oracle).unwrap();
  labeled(&mut ctx);
  let graph = WorkingGraph::global(&ctx);
  assert_eq!(graph.undecided_count(), 2);

  let resolution = resolve(graph, &Grouping::new(), &*auto(), BUDGET);
  assert_eq!(resolution.handle_flips, 1);
  let kept = resolution
    .decisions
    .iter()
    .filter(|(_, side)| side.is_foreground())
    .count();
  assert_eq!(kept, 1);
}

#[test]
fn test_cluster_over_limit_deferred_to_global() {
  let oracle = SimplePointOracle::computed();
  let config = banded_config().with_combination_limit(1);
  let mut ctx = SimplifyContext::new(&double_bridge(), config, &oracle).unwrap();
  labeled(&mut ctx);

  let stats = solve_generators(&mut ctx, auto(), &mut StageTimings::default()).unwrap();
  assert_eq!(stats.clusters_deferred, 2);
  assert_eq!(stats.local_committed, 0);
  assert_eq!(stats.global_generators, 2);
  assert!(stats.fallback.is_none());
  assert!(ctx.regions.generator_ids().is_empty());
  let (after, _) = ctx.betti();
  assert_eq!((after.h0, after.h1, after.h2), (1, 0, 0));
}

#[test]
fn test_component_increase_falls_back_to_greedy() {
  let oracle = SimplePointOracle::computed();
  let mut ctx = SimplifyContext::new(&bridge(), banded_config(), &oracle).unwrap();
  prepared(&mut ctx);

  let stats = solve_generators(&mut ctx, Arc::new(CostlySideSolver), &mut StageTimings::default()).unwrap();
  let fallback = stats.fallback.expect("greedy fallback");
  assert_eq!(fallback.decided, 1);
  assert_eq!(ctx.regions.kind(ctx.region_at(BRIDGE_JOINT)), RegionKind::Core);
  assert_eq!(ctx.betti().0.h0, 1);
}

fn simplify_and_isolate(ctx: &mut SimplifyContext) {
  crate::generators::simplify_generators(ctx);
  crate::generators::resolve_isolated(ctx);
}
