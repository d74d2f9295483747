//! Disjoint-set union with path compression and union by size.

/// Disjoint-set forest over dense `u32` ids.
#[derive(Clone, Debug, Default)]
pub struct DisjointSet {
  parent: Vec<u32>,
  size: Vec<u32>,
}

impl DisjointSet {
  /// `n` singleton sets `0..n`.
  pub fn new(n: usize) -> Self {
    Self {
      parent: (0..n as u32).collect(),
      size: vec![1; n],
    }
  }

  /// Add a new singleton set and return its id.
  pub fn push(&mut self) -> u32 {
    let id = self.parent.len() as u32;
    self.parent.push(id);
    self.size.push(1);
    id
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.parent.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.parent.is_empty()
  }

  /// Representative of `x`'s set.
  pub fn find(&mut self, x: u32) -> u32 {
    let mut root = x;
    while self.parent[root as usize] != root {
      root = self.parent[root as usize];
    }
    let mut node = x;
    while self.parent[node as usize] != root {
      let next = self.parent[node as usize];
      self.parent[node as usize] = root;
      node = next;
    }
    root
  }

  /// Merge the sets of `a` and `b`. Returns false if they were already joined.
  pub fn union(&mut self, a: u32, b: u32) -> bool {
    let mut ra = self.find(a);
    let mut rb = self.find(b);
    if ra == rb {
      return false;
    }
    if self.size[ra as usize] < self.size[rb as usize] {
      std::mem::swap(&mut ra, &mut rb);
    }
    self.parent[rb as usize] = ra;
    self.size[ra as usize] += self.size[rb as usize];
    true
  }

  #[inline]
  pub fn same(&mut self, a: u32, b: u32) -> bool {
    self.find(a) == self.find(b)
  }

  /// Number of distinct sets.
  pub fn set_count(&self) -> usize {
    self
      .parent
      .iter()
      .enumerate()
      .filter(|&(i, &p)| i as u32 == p)
      .count()
  }
}
