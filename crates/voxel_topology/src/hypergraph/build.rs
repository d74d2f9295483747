//! Instance construction. Everything is computed into local tables first and
//! the instance is assembled from them; the working graph is never mutated.

use std::collections::{HashMap, HashSet, VecDeque};

use smallvec::{smallvec, SmallVec};
use tracing::warn;

use super::{Grouping, HyperNode, Hypergraph, NodeRole};
use crate::solve::WorkingGraph;
use crate::steiner::SteinerInstance;
use crate::topology::DisjointSet;
use crate::types::{RegionKind, Side};

/// Added to every hypernode weight so that zero-cost detours are never free.
pub const HYPERNODE_EPSILON: f64 = 1e-6;

/// Largest generator component whose pieces without one member are also
/// offered as groups.
pub const GROUP_PIECE_LIMIT: usize = 8;

const SIDES: [Side; 2] = [Side::Foreground, Side::Background];

type Members = SmallVec<[u32; 8]>;

/// Nodes and edges of an instance before it is assembled.
struct Plan {
  roles: Vec<NodeRole>,
  weights: Vec<f64>,
  required: Vec<bool>,
  edges: Vec<(u32, u32)>,
}

impl Plan {
  fn new() -> Self {
    Self {
      roles: vec![NodeRole::PiRoot],
      weights: vec![0.0],
      required: vec![true],
      edges: Vec::new(),
    }
  }

  fn node(&mut self, role: NodeRole, weight: f64, required: bool) -> u32 {
    self.roles.push(role);
    self.weights.push(weight);
    self.required.push(required);
    (self.roles.len() - 1) as u32
  }

  fn len(&self) -> usize {
    self.roles.len()
  }

  fn commit(mut self) -> (SteinerInstance, Vec<NodeRole>) {
    let mut instance = SteinerInstance::new();
    for (&weight, &required) in self.weights.iter().zip(&self.required).skip(1) {
      instance.add_node(weight, required);
    }
    for edge in &mut self.edges {
      *edge = (edge.0.min(edge.1), edge.0.max(edge.1));
    }
    self.edges.sort_unstable();
    self.edges.dedup();
    for (a, b) in self.edges {
      instance.add_edge(a, b);
    }
    (instance, self.roles)
  }
}

impl Hypergraph {
  /// Build the instance for `graph` under the terminal `grouping`.
  pub fn build(graph: &WorkingGraph, grouping: &Grouping) -> Self {
    let n = graph.len();
    let mut plan = Plan::new();

    // Decided nodes of one side that touch (or are grouped) share a terminal.
    let mut decided = DisjointSet::new(n);
    for i in 0..n as u32 {
      let Some(side) = graph.node(i).side() else {
        continue;
      };
      for &(j, strong) in graph.neighbors(i) {
        if graph.node(j).side() == Some(side) && graph.admits(side, strong) {
          decided.union(i, j);
        }
      }
    }
    for &(a, b) in grouping.joins() {
      if let (Some(i), Some(j)) = (graph.index_of(a), graph.index_of(b)) {
        let side = graph.node(i).side();
        if side.is_some() && side == graph.node(j).side() {
          decided.union(i, j);
        }
      }
    }
    let mut terminal_of = vec![None; n];
    let mut terminal_nodes: HashMap<u32, u32> = HashMap::new();
    for i in 0..n as u32 {
      let Some(side) = graph.node(i).side() else {
        continue;
      };
      let root = decided.find(i);
      let node = *terminal_nodes
        .entry(root)
        .or_insert_with(|| plan.node(NodeRole::Terminal(side), 0.0, true));
      terminal_of[i as usize] = Some(node);
    }

    // Double nodes; per-generator hypernodes come in (foreground,
    // background) pairs.
    let mut hypernodes: Vec<HyperNode> = Vec::new();
    let mut mid_of: Vec<Option<u32>> = vec![None; n];
    let mut pairs: Vec<[usize; 2]> = Vec::new();
    for g in graph.undecided() {
      let mid = plan.node(NodeRole::Mid(g), 0.0, true);
      mid_of[g as usize] = Some(mid);
      let mut pair = [0; 2];
      for side in SIDES {
        pair[side.index()] = hypernodes.len();
        let hyper = hypernode(graph, &mut plan, hypernodes.len(), side, smallvec![g]);
        plan.edges.push((mid, hyper.node));
        hypernodes.push(hyper);
      }
      pairs.push(pair);
    }

    // Group hypernodes decide whole generator groups at once.
    for side in SIDES {
      for group in groups(graph, side) {
        let hyper = hypernode(graph, &mut plan, hypernodes.len(), side, group);
        for &m in &hyper.members[..hyper.size] {
          if let Some(mid) = mid_of[m as usize] {
            plan.edges.push((mid, hyper.node));
          }
        }
        hypernodes.push(hyper);
      }
    }

    // Same-side edges, mirrored in a reach structure per side.
    let mut member_of: [Vec<SmallVec<[u32; 4]>>; 2] = [vec![SmallVec::new(); n], vec![SmallVec::new(); n]];
    for (h, hyper) in hypernodes.iter().enumerate() {
      for &m in &hyper.members {
        member_of[hyper.side.index()][m as usize].push(h as u32);
      }
    }
    let mut reach = DisjointSet::new(plan.len());
    for hyper in &hypernodes {
      let side = hyper.side;
      let mut link = |other: u32, plan: &mut Plan| {
        if other != hyper.node {
          plan.edges.push((hyper.node, other));
          reach.union(hyper.node, other);
        }
      };
      for &m in &hyper.members {
        for &h in &member_of[side.index()][m as usize] {
          link(hypernodes[h as usize].node, &mut plan);
        }
        for &(j, strong) in graph.neighbors(m) {
          if !graph.admits(side, strong) {
            continue;
          }
          if graph.node(j).side() == Some(side) {
            if let Some(t) = terminal_of[j as usize] {
              link(t, &mut plan);
            }
          }
          for &h in &member_of[side.index()][j as usize] {
            link(hypernodes[h as usize].node, &mut plan);
          }
        }
      }
    }

    // One wire per reach component holding a terminal, lowest terminal first.
    let root = 0;
    let mut wires = [0; 2];
    let mut wired: HashSet<u32> = HashSet::new();
    for node in 1..plan.len() as u32 {
      if let NodeRole::Terminal(side) = plan.roles[node as usize] {
        if wired.insert(reach.find(node)) {
          plan.edges.push((root, node));
          wires[side.index()] += 1;
        }
      }
    }
    // Generators that cannot reach a terminal on either side hang on the
    // native hypernode.
    for pair in &pairs {
      let reaches = |h: usize, reach: &mut DisjointSet| wired.contains(&reach.find(hypernodes[h].node));
      if reaches(pair[0], &mut reach) || reaches(pair[1], &mut reach) {
        continue;
      }
      let owner = hypernodes[pair[0]].owner;
      let native = graph.node(owner).kind.native_side();
      let hyper = &hypernodes[pair[native.index()]];
      if wired.insert(reach.find(hyper.node)) {
        warn!(
          region = graph.node(owner).region,
          side = ?native,
          "no terminal reachable on either side; anchoring native hypernode"
        );
        plan.edges.push((root, hyper.node));
        wires[native.index()] += 1;
      }
    }

    let (instance, roles) = plan.commit();
    Self {
      instance,
      roles,
      hypernodes,
      terminal_of,
      wires,
    }
  }
}

/// Plan a hypernode for `group` on `side`. Off their native side, members
/// drag their face-adjacent undecided generators native to `side`.
fn hypernode(graph: &WorkingGraph, plan: &mut Plan, index: usize, side: Side, group: Members) -> HyperNode {
  let size = group.len();
  let mut members = group;
  let dragged = RegionKind::generator(side);
  for k in 0..size {
    let m = members[k];
    if graph.node(m).kind.native_side() == side {
      continue;
    }
    for &(j, strong) in graph.neighbors(m) {
      let other = graph.node(j);
      if strong && other.is_undecided() && other.kind == dragged && !members.contains(&j) {
        members.push(j);
      }
    }
  }
  let weight = members.iter().map(|&m| graph.node(m).cost_to(side)).sum::<f64>() + HYPERNODE_EPSILON;
  let node = plan.node(NodeRole::Hyper(index as u32), weight, false);
  HyperNode {
    side,
    owner: members[0],
    size,
    members,
    weight,
    node,
  }
}

/// Member sets of the group hypernodes of `side`: every connected component
/// of the undecided generators under `side`'s connectivity with two or more
/// members and, for components of at most [`GROUP_PIECE_LIMIT`] members,
/// each piece left when one member is taken out. Single generators already
/// have their own hypernodes.
fn groups(graph: &WorkingGraph, side: Side) -> Vec<Members> {
  let undecided: Vec<u32> = graph.undecided().collect();
  let mut seen: HashSet<Members> = HashSet::new();
  let mut out = Vec::new();
  for component in components(graph, side, &undecided, None) {
    if component.len() < 2 {
      continue;
    }
    if seen.insert(component.clone()) {
      out.push(component.clone());
    }
    if component.len() > GROUP_PIECE_LIMIT {
      continue;
    }
    for &g in &component {
      for piece in components(graph, side, &component, Some(g)) {
        if piece.len() >= 2 && seen.insert(piece.clone()) {
          out.push(piece);
        }
      }
    }
  }
  out
}

/// Connected components of `within` (ascending) without `skip`, joined by
/// edges admitted on `side`. Members ascend; components come in order of
/// their lowest member.
fn components(graph: &WorkingGraph, side: Side, within: &[u32], skip: Option<u32>) -> Vec<Members> {
  let allowed: HashSet<u32> = within.iter().copied().filter(|&g| Some(g) != skip).collect();
  let mut visited: HashSet<u32> = HashSet::with_capacity(allowed.len());
  let mut out = Vec::new();
  for &start in within {
    if !allowed.contains(&start) || !visited.insert(start) {
      continue;
    }
    let mut component: Members = smallvec![start];
    let mut queue = VecDeque::from([start]);
    while let Some(u) = queue.pop_front() {
      for &(j, strong) in graph.neighbors(u) {
        if graph.admits(side, strong) && allowed.contains(&j) && visited.insert(j) {
          component.push(j);
          queue.push_back(j);
        }
      }
    }
    component.sort_unstable();
    out.push(component);
  }
  out
}
