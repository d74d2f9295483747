//! Result of one simplification run.

use std::fmt;

use glam::UVec3;

use crate::error::Result;
use crate::metrics::PipelineStats;
use crate::regions::SimplifyContext;
use crate::topology::{BettiNumbers, EulerCounts};
use crate::types::{RegionId, RegionKind, Side, Thresholds};
use crate::volume::Volume;

/// Geometric cost totals, in the configured cost mode.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CostSummary {
  /// Cost of the flips actually applied.
  pub applied: f64,
  /// Cost of cutting every Cut voxel.
  pub all_cut: f64,
  /// Cost of filling every Fill voxel.
  pub all_fill: f64,
}

impl CostSummary {
  pub(crate) fn measure(ctx: &SimplifyContext) -> Self {
    let mut summary = Self::default();
    for idx in ctx.grid.interior() {
      summary.applied += ctx.voxel_cost(idx, ctx.current_side(idx));
      match ctx.classify(idx) {
        RegionKind::Cut => summary.all_cut += ctx.voxel_cost(idx, Side::Background),
        RegionKind::Fill => summary.all_fill += ctx.voxel_cost(idx, Side::Foreground),
        _ => {}
      }
    }
    summary
  }
}

/// What became of one generator that survived labeling.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionRecord {
  pub id: RegionId,
  pub kind: RegionKind,
  pub voxels: usize,
  /// Cost of moving the whole region off its native side.
  pub cost: f64,
  /// Voxels that ended off the native side.
  pub flipped: usize,
  /// Side most of its voxels ended on; ties keep the native side.
  pub final_side: Side,
}

/// Generator voxels captured before any of them move.
#[derive(Clone, Debug)]
pub(crate) struct RegionSnapshot {
  id: RegionId,
  kind: RegionKind,
  cost: f64,
  voxels: Vec<usize>,
}

impl RegionSnapshot {
  pub(crate) fn capture(ctx: &SimplifyContext) -> Vec<Self> {
    ctx
      .regions
      .generator_ids()
      .into_iter()
      .map(|id| {
        let region = ctx.regions.get(id);
        Self {
          id,
          kind: region.kind,
          cost: region.cost_to(region.kind.native_side().opposite()),
          voxels: region.voxels.clone(),
        }
      })
      .collect()
  }

  pub(crate) fn record(&self, ctx: &SimplifyContext) -> RegionRecord {
    let native = self.kind.native_side();
    let flipped = self
      .voxels
      .iter()
      .filter(|&&v| ctx.current_side(v) != native)
      .count();
    let final_side = if 2 * flipped > self.voxels.len() {
      native.opposite()
    } else {
      native
    };
    RegionRecord {
      id: self.id,
      kind: self.kind,
      voxels: self.voxels.len(),
      cost: self.cost,
      flipped,
      final_side,
    }
  }
}

/// Greedy pass run on a copy of the prepared context, for comparison.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BaselineReport {
  pub betti: BettiNumbers,
  pub applied_cost: f64,
  pub flips: usize,
}

/// Labels, topology and costs of a finished run.
#[derive(Clone, Debug)]
pub struct SimplifyOutcome {
  /// Final side of every input voxel, x fastest.
  pub labels: Vec<Side>,
  pub dims: UVec3,
  pub thresholds: Thresholds,
  pub betti_before: BettiNumbers,
  pub betti_after: BettiNumbers,
  pub euler_before: EulerCounts,
  pub euler_after: EulerCounts,
  pub costs: CostSummary,
  /// One record per generator present after labeling, by id.
  pub regions: Vec<RegionRecord>,
  pub stats: PipelineStats,
  pub baseline: Option<BaselineReport>,
}

impl SimplifyOutcome {
  #[inline]
  pub fn label(&self, p: UVec3) -> Side {
    self.labels[(p.x + self.dims.x * (p.y + self.dims.y * p.z)) as usize]
  }

  pub fn foreground_count(&self) -> usize {
    self.labels.iter().filter(|s| s.is_foreground()).count()
  }

  /// Binary volume of the labels: foreground just above the kernel
  /// threshold, background just below the neighborhood threshold. Running
  /// the pipeline on it finds no generators.
  pub fn to_volume(&self) -> Result<Volume> {
    let fg = step_away(self.thresholds.kernel, 1.0);
    let bg = step_away(self.thresholds.neighborhood, -1.0);
    let data = self
      .labels
      .iter()
      .map(|s| if s.is_foreground() { fg } else { bg })
      .collect();
    Volume::new(self.dims, data)
  }

  /// Labels as bytes: 255 foreground, 0 background.
  pub fn to_bytes(&self) -> Vec<u8> {
    self
      .labels
      .iter()
      .map(|s| if s.is_foreground() { 255 } else { 0 })
      .collect()
  }
}

/// A value strictly past `v` in `direction`: one unit, or a few ulps once
/// a unit step no longer changes `v`. Overflows to infinity past `f32::MAX`.
fn step_away(v: f32, direction: f32) -> f32 {
  let step = 1.0f32.max(v.abs() * 4.0 * f32::EPSILON);
  v + direction * step
}

impl fmt::Display for SimplifyOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} -> {} cost={:.3} (cut all {:.3}, fill all {:.3}) regions={}",
      self.betti_before,
      self.betti_after,
      self.costs.applied,
      self.costs.all_cut,
      self.costs.all_fill,
      self.regions.len()
    )
  }
}
