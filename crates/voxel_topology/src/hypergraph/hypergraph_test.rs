use std::time::Duration;

use glam::UVec3;

use super::*;
use crate::regions::SimplifyContext;
use crate::simple_point::SimplePointOracle;
use crate::solve::WorkingGraph;
use crate::steiner::{ExhaustiveSolver, SteinerSolver};
use crate::test_utils::*;
use crate::types::RegionKind;
use crate::volume::Volume;

const BUDGET: Duration = Duration::from_secs(5);

/// Cut (0.5) next to a Fill (−0.5) in a definite background.
fn cut_fill_pair() -> Volume {
  Volume::from_fn(UVec3::new(5, 3, 3), |p| match (p.x, p.y, p.z) {
    (1, 1, 1) => 0.5,
    (2, 1, 1) => -0.5,
    _ => -2.0,
  })
  .unwrap()
}

#[test]
fn test_bridge_instance_layout() {
  let oracle = SimplePointOracle::computed();
  let mut ctx = SimplifyContext::new(&bridge(), banded_config(), &oracle).unwrap();
  labeled(&mut ctx);
  let joint = ctx.region_at(BRIDGE_JOINT);
  let graph = WorkingGraph::cluster(&ctx, &[joint]);
  assert_eq!(graph.len(), 4);

  let hypergraph = Hypergraph::build(&graph, &Grouping::new());
  // Pi-root, two Cores, the exterior, one mid and two hypernodes.
  assert_eq!(hypergraph.instance.node_count(), 7);
  assert_eq!(hypergraph.terminal_count(), 3);
  assert_eq!(hypergraph.hypernodes.len(), 2);
  assert_eq!(hypergraph.wires, [1, 1]);
  assert_eq!(hypergraph.roles[0], NodeRole::PiRoot);

  let fg = &hypergraph.hypernodes[0];
  let bg = &hypergraph.hypernodes[1];
  assert_eq!(fg.side, Side::Foreground);
  assert_eq!(bg.side, Side::Background);
  assert!((fg.weight - HYPERNODE_EPSILON).abs() < 1e-12);
  assert!((bg.weight - 0.5 - HYPERNODE_EPSILON).abs() < 1e-9);
}

#[test]
fn test_bridge_tree_keeps_joint_foreground() {
  let oracle = SimplePointOracle::computed();
  let mut ctx = SimplifyContext::new(&bridge(), banded_config(), &oracle).unwrap();
  labeled(&mut ctx);
  let joint = ctx.region_at(BRIDGE_JOINT);
  let graph = WorkingGraph::cluster(&ctx, &[joint]);
  let hypergraph = Hypergraph::build(&graph, &Grouping::new());

  let solution = ExhaustiveSolver.solve(&hypergraph.instance, BUDGET);
  assert!(solution.valid);
  assert!(solution.cost < 1e-3);
  assert!(hypergraph.violators(&solution).is_empty());
  let claims = hypergraph.claims(&solution);
  let i = graph.index_of(joint).unwrap();
  assert_eq!(Hypergraph::claimed_side(&claims, i), Some(Side::Foreground));
}

#[test]
fn test_grouping_merges_terminal_nodes() {
  let oracle = SimplePointOracle::computed();
  let mut ctx = SimplifyContext::new(&double_bridge(), banded_config(), &oracle).unwrap();
  labeled(&mut ctx);
  let joint = ctx.region_at(DOUBLE_JOINTS[0]);
  let left = ctx.region_at(UVec3::splat(2));
  let right = ctx.region_at(UVec3::new(6, 2, 2));
  let graph = WorkingGraph::cluster(&ctx, &[joint]);

  let separate = Hypergraph::build(&graph, &Grouping::new());
  assert_eq!(separate.terminal_count(), 3);
  assert_eq!(separate.wires, [1, 1]);

  let mut grouping = Grouping::new();
  grouping.join(left, right);
  let joined = Hypergraph::build(&graph, &grouping);
  assert_eq!(joined.terminal_count(), 2);
  let (l, r) = (graph.index_of(left).unwrap(), graph.index_of(right).unwrap());
  assert_eq!(joined.terminal_of(l), joined.terminal_of(r));
}

#[test]
fn test_hypernode_members_follow_face_adjacency() {
  let oracle = SimplePointOracle::computed();
  let mut ctx = SimplifyContext::new(&cut_fill_pair(), banded_config(), &oracle).unwrap();
  labeled_without_growth(&mut ctx);
  let cut = ctx.region_at(UVec3::new(1, 1, 1));
  let fill = ctx.region_at(UVec3::new(2, 1, 1));
  assert_eq!(ctx.regions.kind(cut), RegionKind::Cut);
  assert_eq!(ctx.regions.kind(fill), RegionKind::Fill);

  let graph = WorkingGraph::global(&ctx);
  let (c, f) = (graph.index_of(cut).unwrap(), graph.index_of(fill).unwrap());
  let hypergraph = Hypergraph::build(&graph, &Grouping::new());
  let members = |owner: u32, side: Side| -> Vec<u32> {
    let hyper = hypergraph
      .hypernodes
      .iter()
      .find(|h| h.size == 1 && h.owner == owner && h.side == side)
      .unwrap();
    hyper.members.to_vec()
  };
  assert_eq!(members(c, Side::Foreground), vec![c]);
  assert_eq!(members(c, Side::Background), vec![c, f]);
  assert_eq!(members(f, Side::Foreground), vec![f, c]);
  assert_eq!(members(f, Side::Background), vec![f]);
  // No Core anywhere: only the background side is wired.
  assert_eq!(hypergraph.wires, [0, 1]);

  let solution = ExhaustiveSolver.solve(&hypergraph.instance, BUDGET);
  assert!(solution.valid);
  assert!(hypergraph.violators(&solution).is_empty());
  let claims = hypergraph.claims(&solution);
  assert_eq!(Hypergraph::claimed_side(&claims, c), Some(Side::Background));
  assert_eq!(Hypergraph::claimed_side(&claims, f), Some(Side::Background));
}

/// Cut, Fill, Cut in a row, each its own generator.
fn alternating_row() -> Volume {
  Volume::from_fn(UVec3::new(5, 3, 3), |p| match (p.x, p.y, p.z) {
    (1, 1, 1) | (3, 1, 1) => 0.5,
    (2, 1, 1) => -0.5,
    _ => -2.0,
  })
  .unwrap()
}

fn sorted(members: &[u32]) -> Vec<u32> {
  let mut out = members.to_vec();
  out.sort_unstable();
  out
}

#[test]
fn test_adjacent_generators_get_group_hypernodes() {
  let oracle = SimplePointOracle::computed();
  let mut ctx = SimplifyContext::new(&cut_fill_pair(), banded_config(), &oracle).unwrap();
  labeled_without_growth(&mut ctx);
  let graph = WorkingGraph::global(&ctx);
  let c = graph.index_of(ctx.region_at(UVec3::new(1, 1, 1))).unwrap();
  let f = graph.index_of(ctx.region_at(UVec3::new(2, 1, 1))).unwrap();
  let hypergraph = Hypergraph::build(&graph, &Grouping::new());

  let groups: Vec<&HyperNode> = hypergraph.hypernodes.iter().filter(|h| h.size > 1).collect();
  assert_eq!(groups.len(), 2);
  assert_eq!(hypergraph.hypernodes.len(), 6);
  for hyper in groups {
    assert_eq!(sorted(&hyper.members), sorted(&[c, f]));
    assert!((hyper.weight - 0.5 - HYPERNODE_EPSILON).abs() < 1e-9);
    // A group feeds the mid node of every member.
    let mids: Vec<u32> = hypergraph
      .instance
      .neighbors(hyper.node)
      .iter()
      .filter_map(|&n| match hypergraph.roles[n as usize] {
        NodeRole::Mid(g) => Some(g),
        _ => None,
      })
      .collect();
    assert_eq!(sorted(&mids), sorted(&[c, f]));
  }
}

#[test]
fn test_group_pieces_without_one_member() {
  let oracle = SimplePointOracle::computed();
  let mut ctx = SimplifyContext::new(&alternating_row(), banded_config(), &oracle).unwrap();
  labeled_without_growth(&mut ctx);
  let graph = WorkingGraph::global(&ctx);
  let [a, b, c] = [1, 2, 3].map(|x| graph.index_of(ctx.region_at(UVec3::new(x, 1, 1))).unwrap());
  assert_eq!(graph.undecided_count(), 3);
  let hypergraph = Hypergraph::build(&graph, &Grouping::new());

  for side in [Side::Foreground, Side::Background] {
    let mut groups: Vec<Vec<u32>> = hypergraph
      .hypernodes
      .iter()
      .filter(|h| h.side == side && h.size > 1)
      .map(|h| sorted(&h.members[..h.size]))
      .collect();
    groups.sort();
    let mut expected = vec![sorted(&[a, b, c]), sorted(&[a, b]), sorted(&[b, c])];
    expected.sort();
    assert_eq!(groups, expected, "{side:?}");
  }

  let solution = ExhaustiveSolver.solve(&hypergraph.instance, BUDGET);
  assert!(solution.valid);
  assert!(hypergraph.violators(&solution).is_empty());
}

#[test]
fn test_forcing_drags_face_neighbors() {
  let oracle = SimplePointOracle::computed();
  let mut ctx = SimplifyContext::new(&cut_fill_pair(), banded_config(), &oracle).unwrap();
  labeled_without_growth(&mut ctx);
  let graph = WorkingGraph::global(&ctx);
  let c = graph.index_of(ctx.region_at(UVec3::new(1, 1, 1))).unwrap();
  let f = graph.index_of(ctx.region_at(UVec3::new(2, 1, 1))).unwrap();

  let mut native = graph.clone();
  assert_eq!(native.force(c, Side::Foreground).to_vec(), vec![c]);
  assert!(native.node(f).is_undecided());

  let mut cut_away = graph.clone();
  assert_eq!(cut_away.force(c, Side::Background).to_vec(), vec![c, f]);
  assert_eq!(cut_away.node(f).forced, Some(Side::Background));
  assert!((cut_away.forced_cost() - 0.5).abs() < 1e-9);

  // Decided nodes leave the hypergraph.
  let hypergraph = Hypergraph::build(&cut_away, &Grouping::new());
  assert!(hypergraph.hypernodes.is_empty());
  assert_eq!(hypergraph.terminal_count(), 1);
}
