//! Generators with no neighbor on their own side.

use tracing::debug;

use crate::regions::SimplifyContext;
use crate::types::RegionId;

/// Move every isolated generator to the opposite side: into a face-adjacent
/// generator of the opposite native side when there is one, otherwise as a
/// terminal. Repeats until no isolated generator remains; returns how many
/// were resolved.
pub fn resolve_isolated(ctx: &mut SimplifyContext) -> usize {
  let mut resolved = 0;
  loop {
    let mut changed = 0;
    for id in ctx.regions.generator_ids() {
      let still_generator = ctx.regions.try_get(id).is_some_and(|r| r.kind.is_generator());
      if !still_generator || !is_isolated(ctx, id) {
        continue;
      }
      let side = ctx.regions.kind(id).native_side();
      match opposite_partner(ctx, id) {
        Some(partner) => {
          debug!(region = id, partner, "isolated generator merged");
          ctx.merge_into(partner, id);
        }
        None => {
          let survivor = ctx.decide(id, side.opposite());
          debug!(region = id, survivor, side = ?side.opposite(), "isolated generator decided");
        }
      }
      changed += 1;
    }
    resolved += changed;
    if changed == 0 {
      return resolved;
    }
  }
}

/// No adjacent region shares `id`'s native side under that side's
/// connectivity.
pub fn is_isolated(ctx: &SimplifyContext, id: RegionId) -> bool {
  let side = ctx.regions.kind(id).native_side();
  let connectivity = ctx.connectivity(side);
  !ctx
    .graph
    .neighbors(id)
    .any(|(n, strong)| connectivity.admits(strong) && ctx.regions.kind(n).native_side() == side)
}

fn opposite_partner(ctx: &SimplifyContext, id: RegionId) -> Option<RegionId> {
  let side = ctx.regions.kind(id).native_side();
  ctx
    .graph
    .neighbors(id)
    .find(|&(n, strong)| {
      let kind = ctx.regions.kind(n);
      strong && kind.is_generator() && kind.native_side() != side
    })
    .map(|(n, _)| n)
}
