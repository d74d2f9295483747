use std::collections::HashSet;

use crate::regions::SimplifyContext;
use crate::types::RegionId;

/// Connected components of the generator-to-generator adjacency, each sorted,
/// ordered by their lowest id. Terminals never join two clusters.
pub fn clusters(ctx: &SimplifyContext) -> Vec<Vec<RegionId>> {
  let mut seen = HashSet::new();
  let mut out = Vec::new();
  for seed in ctx.regions.generator_ids() {
    if !seen.insert(seed) {
      continue;
    }
    let mut cluster = vec![seed];
    let mut stack = vec![seed];
    while let Some(r) = stack.pop() {
      for (n, _) in ctx.graph.neighbors(r) {
        if ctx.regions.kind(n).is_generator() && seen.insert(n) {
          cluster.push(n);
          stack.push(n);
        }
      }
    }
    cluster.sort_unstable();
    out.push(cluster);
  }
  out
}
