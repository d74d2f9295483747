//! Low-link analysis of undirected graphs with an explicit DFS stack.
//!
//! Besides articulation points, the analysis answers "if node g were removed,
//! which piece would neighbor w land in?" in O(log deg) per query: w is in the
//! piece of g's DFS child c whose subtree contains w when low(c) ≥ tin(g),
//! otherwise in the piece that still reaches g's parent.
//!
//! Edits only invalidate the components they touch: [`LowLink::refresh`]
//! re-explores those and leaves every other DFS tree as it was.

use std::collections::HashSet;

use smallvec::SmallVec;

const UNSET: u32 = u32::MAX;

/// Undirected adjacency lists over nodes `0..n`.
#[derive(Clone, Debug, Default)]
pub struct AdjacencyLists {
  lists: Vec<SmallVec<[u32; 8]>>,
}

impl AdjacencyLists {
  /// Build from an undirected edge list. Duplicates and self-loops are dropped.
  pub fn from_edges(node_count: usize, edges: &[(u32, u32)]) -> Self {
    let mut lists: Vec<SmallVec<[u32; 8]>> = vec![SmallVec::new(); node_count];
    for &(a, b) in edges {
      if a != b {
        lists[a as usize].push(b);
        lists[b as usize].push(a);
      }
    }
    for list in &mut lists {
      list.sort_unstable();
      list.dedup();
    }
    Self { lists }
  }

  #[inline]
  pub fn node_count(&self) -> usize {
    self.lists.len()
  }

  #[inline]
  pub fn neighbors(&self, node: u32) -> &[u32] {
    &self.lists[node as usize]
  }

  /// Append an isolated node.
  pub fn add_node(&mut self) -> u32 {
    self.lists.push(SmallVec::new());
    (self.lists.len() - 1) as u32
  }

  /// Join `a` and `b`; false if they already were (or `a == b`).
  pub fn connect(&mut self, a: u32, b: u32) -> bool {
    if a == b || self.lists[a as usize].contains(&b) {
      return false;
    }
    self.lists[a as usize].push(b);
    self.lists[b as usize].push(a);
    true
  }

  /// Drop every edge of `node`; returns its former neighbors.
  pub fn isolate(&mut self, node: u32) -> SmallVec<[u32; 8]> {
    let former = std::mem::take(&mut self.lists[node as usize]);
    for &n in &former {
      self.lists[n as usize].retain(|m| *m != node);
    }
    former
  }
}

/// Piece a neighbor falls into when a node is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Piece {
  /// The piece containing the removed node's DFS parent.
  Parent,
  /// The separated subtree of this DFS child.
  Child(u32),
}

/// DFS entry/exit times, low-links and tree structure for every node.
#[derive(Clone, Debug, Default)]
pub struct LowLink {
  tin: Vec<u32>,
  tout: Vec<u32>,
  low: Vec<u32>,
  parent: Vec<u32>,
  root: Vec<u32>,
  children: Vec<Vec<u32>>,
  components: usize,
  timer: u32,
}

impl LowLink {
  pub fn compute(graph: &AdjacencyLists) -> Self {
    Self::compute_from(graph, 0..graph.node_count() as u32)
  }

  /// Explore only the components reachable from `starts`; other nodes stay
  /// unvisited and count for nothing.
  pub fn compute_from(graph: &AdjacencyLists, starts: impl IntoIterator<Item = u32>) -> Self {
    let mut lowlink = Self::default();
    lowlink.resize(graph.node_count());
    for start in starts {
      lowlink.explore(graph, start);
    }
    lowlink
  }

  fn resize(&mut self, n: usize) {
    if self.tin.len() >= n {
      return;
    }
    self.tin.resize(n, UNSET);
    self.tout.resize(n, 0);
    self.low.resize(n, 0);
    self.parent.resize(n, UNSET);
    self.root.resize(n, UNSET);
    self.children.resize_with(n, Vec::new);
  }

  fn reset(&mut self, node: u32) {
    let u = node as usize;
    self.tin[u] = UNSET;
    self.parent[u] = UNSET;
    self.root[u] = UNSET;
    self.children[u].clear();
  }

  /// DFS from `start` unless it was already visited.
  fn explore(&mut self, graph: &AdjacencyLists, start: u32) {
    if self.tin[start as usize] != UNSET {
      return;
    }
    self.components += 1;
    self.tin[start as usize] = self.timer;
    self.low[start as usize] = self.timer;
    self.root[start as usize] = start;
    self.timer += 1;
    // (node, next neighbor position)
    let mut stack: Vec<(u32, usize)> = vec![(start, 0)];

    while let Some(&(u, pos)) = stack.last() {
      let neighbors = graph.neighbors(u);
      if pos < neighbors.len() {
        let top = stack.len() - 1;
        stack[top].1 += 1;
        let w = neighbors[pos];
        if self.tin[w as usize] == UNSET {
          self.parent[w as usize] = u;
          self.root[w as usize] = self.root[u as usize];
          self.tin[w as usize] = self.timer;
          self.low[w as usize] = self.timer;
          self.timer += 1;
          self.children[u as usize].push(w);
          stack.push((w, 0));
        } else if w != self.parent[u as usize] {
          self.low[u as usize] = self.low[u as usize].min(self.tin[w as usize]);
        }
      } else {
        stack.pop();
        self.tout[u as usize] = self.timer;
        let p = self.parent[u as usize];
        if p != UNSET {
          self.low[p as usize] = self.low[p as usize].min(self.low[u as usize]);
        }
      }
    }
  }

  /// Re-explore after an edit. `removed` nodes lost every edge and drop out
  /// unless they are seeds again. `seeds` must reach every node whose
  /// component changed: the former neighbors of edited nodes and the edited
  /// nodes still in the graph.
  pub fn refresh(&mut self, graph: &AdjacencyLists, seeds: &[u32], removed: &[u32]) {
    self.resize(graph.node_count());
    if self.timer as u64 + graph.node_count() as u64 >= UNSET as u64 {
      let visited: Vec<u32> = (0..graph.node_count() as u32)
        .filter(|&u| self.root[u as usize] != UNSET && !removed.contains(&u))
        .chain(seeds.iter().copied())
        .collect();
      *self = Self::compute_from(graph, visited);
      return;
    }

    let mut stale: HashSet<u32> = HashSet::new();
    for &r in removed {
      if self.root[r as usize] != UNSET {
        stale.insert(self.root[r as usize]);
      }
      self.reset(r);
    }
    let mut reached: Vec<u32> = Vec::new();
    let mut seen: HashSet<u32> = HashSet::new();
    let mut stack: Vec<u32> = seeds.to_vec();
    while let Some(u) = stack.pop() {
      if !seen.insert(u) {
        continue;
      }
      reached.push(u);
      stack.extend(graph.neighbors(u).iter().copied().filter(|w| !seen.contains(w)));
    }
    for &u in &reached {
      if self.root[u as usize] != UNSET {
        stale.insert(self.root[u as usize]);
      }
      self.reset(u);
    }
    self.components -= stale.len();
    reached.sort_unstable();
    for u in reached {
      self.explore(graph, u);
    }
  }

  #[inline]
  pub fn node_count(&self) -> usize {
    self.tin.len()
  }

  /// Number of connected components among visited nodes.
  #[inline]
  pub fn component_count(&self) -> usize {
    self.components
  }

  /// DFS root of `node`'s component; equal roots mean connected.
  #[inline]
  pub fn component(&self, node: u32) -> u32 {
    self.root[node as usize]
  }

  #[inline]
  fn is_descendant(&self, node: u32, ancestor: u32) -> bool {
    let t = self.tin[node as usize];
    self.tin[ancestor as usize] <= t && t < self.tout[ancestor as usize]
  }

  /// Number of pieces `node`'s component falls into when `node` is removed
  /// (0 when `node` is isolated).
  pub fn split_count(&self, node: u32) -> usize {
    let u = node as usize;
    let separated = self.children[u]
      .iter()
      .filter(|&&c| self.parent[u] == UNSET || self.low[c as usize] >= self.tin[u])
      .count();
    separated + usize::from(self.parent[u] != UNSET)
  }

  pub fn is_articulation(&self, node: u32) -> bool {
    self.split_count(node) > 1
  }

  /// Piece that `neighbor` (adjacent to `node`) lands in once `node` is gone.
  pub fn piece_of(&self, node: u32, neighbor: u32) -> Piece {
    let u = node as usize;
    if neighbor == node || !self.is_descendant(neighbor, node) {
      return Piece::Parent;
    }
    let kids = &self.children[u];
    let t = self.tin[neighbor as usize];
    let slot = kids.partition_point(|&c| self.tin[c as usize] <= t);
    let Some(&child) = slot.checked_sub(1).and_then(|i| kids.get(i)) else {
      return Piece::Parent;
    };
    if self.parent[u] == UNSET || self.low[child as usize] >= self.tin[u] {
      Piece::Child(child)
    } else {
      Piece::Parent
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// 0 - 1 - 2      triangle 2-3-4 hangs off node 2
  ///         | \
  ///         3 - 4
  fn lollipop() -> AdjacencyLists {
    AdjacencyLists::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 2)])
  }

  #[test]
  fn test_articulation_points() {
    let ll = LowLink::compute(&lollipop());
    assert!(ll.is_articulation(1));
    assert!(ll.is_articulation(2));
    assert!(!ll.is_articulation(0));
    assert!(!ll.is_articulation(3));
    assert_eq!(ll.component_count(), 1);
  }

  #[test]
  fn test_pieces_after_removal() {
    let ll = LowLink::compute(&lollipop());
    // Removing 2 separates {0,1} from {3,4}.
    assert_ne!(ll.piece_of(2, 1), ll.piece_of(2, 3));
    assert_eq!(ll.piece_of(2, 3), ll.piece_of(2, 4));
    assert_eq!(ll.split_count(2), 2);
    // Removing 3 keeps 2 and 4 together through their edge.
    assert_eq!(ll.piece_of(3, 2), ll.piece_of(3, 4));
    assert_eq!(ll.split_count(3), 1);
  }

  #[test]
  fn test_root_pieces() {
    // Star centered on 0 (the DFS root).
    let ll = LowLink::compute(&AdjacencyLists::from_edges(4, &[(0, 1), (0, 2), (0, 3)]));
    let pieces: std::collections::BTreeSet<Piece> = (1..4).map(|w| ll.piece_of(0, w)).collect();
    assert_eq!(pieces.len(), 3);
    assert_eq!(ll.split_count(0), 3);
  }

  #[test]
  fn test_isolated_and_disconnected() {
    let ll = LowLink::compute(&AdjacencyLists::from_edges(4, &[(0, 1)]));
    assert_eq!(ll.component_count(), 3);
    assert_eq!(ll.split_count(2), 0);
    assert_eq!(ll.component(0), ll.component(1));
    assert_ne!(ll.component(0), ll.component(3));
  }

  #[test]
  fn test_refresh_matches_recompute() {
    let mut graph = lollipop();
    let mut ll = LowLink::compute(&graph);

    // Cut node 2 out: {0,1} and {3,4} remain.
    let former = graph.isolate(2);
    ll.refresh(&graph, &former, &[2]);
    assert_eq!(ll.component_count(), 2);
    assert_eq!(ll.component(3), ll.component(4));
    assert_ne!(ll.component(0), ll.component(3));
    assert_eq!(ll.split_count(2), 0);

    // A new node 5 joins 0 and 4 into the path 1-0-5-4-3.
    let n = graph.add_node();
    assert!(graph.connect(n, 0));
    assert!(graph.connect(n, 4));
    assert!(!graph.connect(4, n));
    ll.refresh(&graph, &[n], &[]);
    let fresh = LowLink::compute_from(&graph, [0, 1, 3, 4, 5]);
    assert_eq!(ll.component_count(), 1);
    assert_eq!(fresh.component_count(), 1);
    for u in [0, 1, 3, 4, 5] {
      assert_eq!(ll.split_count(u), fresh.split_count(u), "node {u}");
    }
    assert!(ll.is_articulation(4));
    assert_ne!(ll.piece_of(5, 0), ll.piece_of(5, 4));
  }

  #[test]
  fn test_deep_path_does_not_overflow() {
    let n = 200_000u32;
    let edges: Vec<(u32, u32)> = (1..n).map(|i| (i - 1, i)).collect();
    let ll = LowLink::compute(&AdjacencyLists::from_edges(n as usize, &edges));
    assert!(ll.is_articulation(n / 2));
    assert_eq!(ll.split_count(n - 1), 1);
  }
}
