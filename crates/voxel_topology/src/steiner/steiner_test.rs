use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;

const BUDGET: Duration = Duration::from_secs(5);

/// root ─ a(5) ─ r and root ─ b(1) ─ c(1) ─ r.
fn two_paths() -> (SteinerInstance, [u32; 4]) {
  let mut instance = SteinerInstance::new();
  let a = instance.add_node(5.0, false);
  let b = instance.add_node(1.0, false);
  let c = instance.add_node(1.0, false);
  let r = instance.add_node(0.0, true);
  instance.add_edge(0, a);
  instance.add_edge(a, r);
  instance.add_edge(0, b);
  instance.add_edge(b, c);
  instance.add_edge(c, r);
  (instance, [a, b, c, r])
}

/// Three required leaves reachable through one hub (3) or through one
/// private node each (2).
fn hub() -> SteinerInstance {
  let mut instance = SteinerInstance::new();
  let h = instance.add_node(3.0, false);
  instance.add_edge(0, h);
  for _ in 0..3 {
    let x = instance.add_node(2.0, false);
    let r = instance.add_node(0.0, true);
    instance.add_edge(0, x);
    instance.add_edge(x, r);
    instance.add_edge(h, r);
  }
  instance
}

fn random_instance(seed: u64, optional: usize) -> SteinerInstance {
  let mut rng = StdRng::seed_from_u64(seed);
  let mut instance = SteinerInstance::new();
  let mut nodes = vec![0];
  let mut optional_left = optional;
  while optional_left > 0 || nodes.len() < 4 {
    let required = optional_left == 0 || rng.random_bool(0.3);
    let node = if required {
      instance.add_node(0.0, true)
    } else {
      optional_left -= 1;
      instance.add_node(rng.random_range(0.0..5.0), false)
    };
    let anchor = nodes[rng.random_range(0..nodes.len())];
    instance.add_edge(anchor, node);
    nodes.push(node);
  }
  for _ in 0..nodes.len() {
    let a = nodes[rng.random_range(0..nodes.len())];
    let b = nodes[rng.random_range(0..nodes.len())];
    instance.add_edge(a, b);
  }
  instance
}

#[test]
fn test_instance_edges_are_deduplicated() {
  let (mut instance, [a, ..]) = two_paths();
  let before = instance.edge_count();
  instance.add_edge(a, 0);
  instance.add_edge(a, a);
  assert_eq!(instance.edge_count(), before);
  assert_eq!(instance.optional_count(), 3);
  assert_eq!(instance.required_nodes().collect::<Vec<_>>(), vec![0, 4]);
}

#[test]
fn test_exhaustive_prefers_cheaper_path() {
  let (instance, [a, b, c, r]) = two_paths();
  let solution = ExhaustiveSolver.solve(&instance, BUDGET);
  assert!(solution.valid);
  assert!(!solution.timed_out);
  assert!((solution.cost - 2.0).abs() < 1e-9);
  assert!(solution.contains(b) && solution.contains(c) && solution.contains(r));
  assert!(!solution.contains(a));
  assert_eq!(solution.tree_edges.len(), 3);
  assert_eq!(solution.gap(), 0.0);
}

#[test]
fn test_exhaustive_finds_shared_hub() {
  let solution = ExhaustiveSolver.solve(&hub(), BUDGET);
  assert!(solution.valid);
  assert!((solution.cost - 3.0).abs() < 1e-9);
}

#[test]
fn test_heuristic_follows_shortest_path() {
  let (instance, [a, b, c, _]) = two_paths();
  let solution = PathHeuristicSolver::default().solve(&instance, BUDGET);
  assert!(solution.valid);
  assert!((solution.cost - 2.0).abs() < 1e-9);
  assert!(solution.contains(b) && solution.contains(c));
  assert!(!solution.contains(a));
}

#[test]
fn test_heuristic_on_hub_is_valid_and_bounded() {
  let solution = PathHeuristicSolver::default().solve(&hub(), BUDGET);
  assert!(solution.valid);
  assert!(solution.cost >= 3.0 - 1e-9);
  assert!(solution.cost <= 6.0 + 1e-9);
  assert!(solution.lower_bound <= 3.0 + 1e-9);
}

#[test]
fn test_unreachable_required_node_is_invalid() {
  let mut instance = SteinerInstance::new();
  let x = instance.add_node(1.0, false);
  instance.add_edge(0, x);
  instance.add_node(0.0, true);
  assert!(!ExhaustiveSolver.solve(&instance, BUDGET).valid);
  assert!(!PathHeuristicSolver::default().solve(&instance, BUDGET).valid);
}

#[test]
fn test_zero_budget_still_connects_everything() {
  let instance = random_instance(7, 40);
  let solution = PathHeuristicSolver::default().solve(&instance, Duration::ZERO);
  assert!(solution.valid);
  assert!(solution.lower_bound <= solution.cost + 1e-9);
}

#[test]
fn test_heuristic_never_beats_exhaustive() {
  for seed in 0..20 {
    let instance = random_instance(seed, 10);
    let exact = ExhaustiveSolver.solve(&instance, BUDGET);
    let heuristic = PathHeuristicSolver::default().solve(&instance, BUDGET);
    assert!(exact.valid && heuristic.valid, "seed {seed}");
    assert!(exact.cost <= heuristic.cost + 1e-9, "seed {seed}");
    assert!(heuristic.lower_bound <= exact.cost + 1e-9, "seed {seed}");
    assert!(instance.covers(&heuristic.in_tree), "seed {seed}");
  }
}

#[test]
fn test_auto_solver_switches_on_optional_count() {
  let instance = hub();
  let exact = AutoSolver::new(16).solve(&instance, BUDGET);
  assert!((exact.cost - 3.0).abs() < 1e-9);
  let approximate = AutoSolver::new(0).solve(&instance, BUDGET);
  assert!(approximate.valid);
  assert!(approximate.cost >= exact.cost - 1e-9);
}
