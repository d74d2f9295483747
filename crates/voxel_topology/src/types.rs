//! Core data types for topology simplification.

use std::time::Duration;

use glam::IVec3;

use crate::constants::{FACE_OFFSETS, N26_MASK, N6_MASK, NEIGHBOR_OFFSETS};
use crate::error::{Result, TopologyError};
use crate::topology::BettiDelta;

/// Scalar intensity of one voxel.
pub type Intensity = f32;

/// Stable identifier of a region in the arena.
pub type RegionId = u32;

/// Region id of a voxel that has not been labeled yet.
pub const NO_REGION: RegionId = RegionId::MAX;

/// Digital connectivity of one side of the partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Connectivity {
  /// Face neighbors only.
  Six,
  /// Face, edge and vertex neighbors.
  TwentySix,
}

impl Default for Connectivity {
  fn default() -> Self {
    Connectivity::TwentySix
  }
}

impl Connectivity {
  /// The connectivity the opposite side must use for a consistent topology.
  #[inline]
  pub fn complement(self) -> Self {
    match self {
      Connectivity::Six => Connectivity::TwentySix,
      Connectivity::TwentySix => Connectivity::Six,
    }
  }

  /// Neighbor offsets reachable in one step.
  #[inline]
  pub fn offsets(self) -> &'static [IVec3] {
    match self {
      Connectivity::Six => &FACE_OFFSETS,
      Connectivity::TwentySix => &NEIGHBOR_OFFSETS,
    }
  }

  /// Neighborhood code bits reachable in one step.
  #[inline]
  pub fn mask(self) -> u32 {
    match self {
      Connectivity::Six => N6_MASK,
      Connectivity::TwentySix => N26_MASK,
    }
  }

  /// Whether an adjacency edge of the given strength connects under this
  /// connectivity. Weak (diagonal-only) edges connect only 26-sides.
  #[inline]
  pub fn admits(self, strong: bool) -> bool {
    strong || self == Connectivity::TwentySix
  }

  /// 26-connected sides use closed cells in the cubical complex.
  #[inline]
  pub fn closed_cells(self) -> bool {
    self == Connectivity::TwentySix
  }
}

/// Final assignment of a voxel or region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
  Foreground,
  Background,
}

impl Side {
  #[inline]
  pub fn opposite(self) -> Self {
    match self {
      Side::Foreground => Side::Background,
      Side::Background => Side::Foreground,
    }
  }

  #[inline]
  pub fn is_foreground(self) -> bool {
    self == Side::Foreground
  }

  /// Index into per-side arrays (`0` foreground, `1` background).
  #[inline]
  pub fn index(self) -> usize {
    match self {
      Side::Foreground => 0,
      Side::Background => 1,
    }
  }
}

/// Classification of a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegionKind {
  /// Definite foreground terminal (intensity above K).
  Core,
  /// Definite background terminal (intensity below N).
  Neighborhood,
  /// Ambiguous foreground-leaning generator (S < v ≤ K).
  Cut,
  /// Ambiguous background-leaning generator (N ≤ v ≤ S).
  Fill,
}

impl RegionKind {
  /// The side a region of this kind occupies in the pre-simplification shape.
  #[inline]
  pub fn native_side(self) -> Side {
    match self {
      RegionKind::Core | RegionKind::Cut => Side::Foreground,
      RegionKind::Neighborhood | RegionKind::Fill => Side::Background,
    }
  }

  #[inline]
  pub fn is_terminal(self) -> bool {
    matches!(self, RegionKind::Core | RegionKind::Neighborhood)
  }

  #[inline]
  pub fn is_generator(self) -> bool {
    !self.is_terminal()
  }

  /// Terminal kind for a side.
  #[inline]
  pub fn terminal(side: Side) -> Self {
    match side {
      Side::Foreground => RegionKind::Core,
      Side::Background => RegionKind::Neighborhood,
    }
  }

  /// Generator kind whose native side is `side`.
  #[inline]
  pub fn generator(side: Side) -> Self {
    match side {
      Side::Foreground => RegionKind::Cut,
      Side::Background => RegionKind::Fill,
    }
  }
}

/// Iso-value S with the kernel (K) and neighborhood (N) brackets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
  /// Iso-value S separating the pre-simplification shape from background.
  pub shape: Intensity,
  /// Kernel threshold K ≥ S; voxels above it must stay foreground.
  pub kernel: Intensity,
  /// Neighborhood threshold N ≤ S; voxels below it must stay background.
  pub neighborhood: Intensity,
}

impl Default for Thresholds {
  fn default() -> Self {
    Self::uniform(0.0)
  }
}

impl Thresholds {
  pub fn new(shape: Intensity, kernel: Intensity, neighborhood: Intensity) -> Self {
    Self {
      shape,
      kernel,
      neighborhood,
    }
  }

  /// S = K = N: only voxels exactly at the iso-value are ambiguous.
  pub fn uniform(shape: Intensity) -> Self {
    Self::new(shape, shape, shape)
  }

  pub fn validate(&self) -> Result<()> {
    if !(self.shape.is_finite() && self.kernel.is_finite() && self.neighborhood.is_finite()) {
      return Err(TopologyError::InvalidThresholds(
        "thresholds must be finite".to_string(),
      ));
    }
    if self.kernel < self.shape {
      return Err(TopologyError::InvalidThresholds(format!(
        "kernel {} is below shape {}",
        self.kernel, self.shape
      )));
    }
    if self.neighborhood > self.shape {
      return Err(TopologyError::InvalidThresholds(format!(
        "neighborhood {} is above shape {}",
        self.neighborhood, self.shape
      )));
    }
    Ok(())
  }

  /// Region kind a voxel of intensity `v` starts as.
  #[inline]
  pub fn classify(&self, v: Intensity) -> RegionKind {
    if v > self.kernel {
      RegionKind::Core
    } else if v < self.neighborhood {
      RegionKind::Neighborhood
    } else if v > self.shape {
      RegionKind::Cut
    } else {
      RegionKind::Fill
    }
  }

  /// Side of a voxel in the pre-simplification shape.
  #[inline]
  pub fn polarity(&self, v: Intensity) -> Side {
    if v > self.shape {
      Side::Foreground
    } else {
      Side::Background
    }
  }
}

/// How the geometric penalty of flipping a voxel is measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CostMode {
  /// Distance of the intensity from the iso-value.
  #[default]
  Intensity,
  /// Every flipped voxel costs 1.
  VoxelCount,
}

impl CostMode {
  /// Cost of moving a voxel of intensity `v` to `side`.
  /// Zero when `side` is the voxel's polarity.
  #[inline]
  pub fn voxel_cost(self, v: Intensity, side: Side, thresholds: &Thresholds) -> f64 {
    if thresholds.polarity(v) == side {
      return 0.0;
    }
    match self {
      CostMode::Intensity => (v as f64 - thresholds.shape as f64).abs(),
      CostMode::VoxelCount => 1.0,
    }
  }
}

/// Predicate deciding whether a voxel removal may be committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AcceptanceRule {
  /// No Betti number increases and at least one strictly decreases.
  #[default]
  Strict,
  /// `Strict`, or a cavity increase alone (ΔH2 > 0 with ΔH0, ΔH1 ≤ 0).
  Roots,
}

impl AcceptanceRule {
  pub fn accepts(self, delta: &BettiDelta) -> bool {
    let strict = delta.h0 <= 0
      && delta.h1 <= 0
      && delta.h2 <= 0
      && (delta.h0 < 0 || delta.h1 < 0 || delta.h2 < 0);
    match self {
      AcceptanceRule::Strict => strict,
      AcceptanceRule::Roots => strict || (delta.h2 > 0 && delta.h0 <= 0 && delta.h1 <= 0),
    }
  }
}

/// Which decision stage assigns the remaining generators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SolverMode {
  /// Hypergraph Steiner formulation with local/global repair.
  #[default]
  Steiner,
  /// Greedy monotone region flips only.
  Greedy,
}

/// Configuration for one simplification run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimplifyConfig {
  pub thresholds: Thresholds,
  /// Foreground connectivity; background uses the complement.
  pub foreground: Connectivity,
  pub cost_mode: CostMode,
  pub acceptance: AcceptanceRule,
  pub solver: SolverMode,
  /// Largest number of terminal groupings a Local cluster may enumerate.
  pub combination_limit: u64,
  /// Wall clock budget per solver call in the Local stage.
  pub local_budget: Duration,
  /// Wall clock budget per solver call in the Global stage.
  pub global_budget: Duration,
  /// Instances with at most this many optional nodes are solved exhaustively.
  pub exact_node_limit: usize,
  /// Size of the Local stage worker pool (`None` = rayon default).
  pub worker_threads: Option<usize>,
  /// Upper bound on generator simplifier passes.
  pub simplifier_passes: usize,
  /// Also run the greedy pass on a copy and report it.
  pub greedy_baseline: bool,
}

impl Default for SimplifyConfig {
  fn default() -> Self {
    Self::new(Thresholds::default())
  }
}

impl SimplifyConfig {
  pub fn new(thresholds: Thresholds) -> Self {
    Self {
      thresholds,
      foreground: Connectivity::TwentySix,
      cost_mode: CostMode::Intensity,
      acceptance: AcceptanceRule::Strict,
      solver: SolverMode::Steiner,
      combination_limit: 16,
      local_budget: Duration::from_secs(1),
      global_budget: Duration::from_secs(10),
      exact_node_limit: 16,
      worker_threads: None,
      simplifier_passes: 8,
      greedy_baseline: false,
    }
  }

  pub fn with_foreground(mut self, connectivity: Connectivity) -> Self {
    self.foreground = connectivity;
    self
  }

  pub fn with_cost_mode(mut self, mode: CostMode) -> Self {
    self.cost_mode = mode;
    self
  }

  pub fn with_acceptance(mut self, rule: AcceptanceRule) -> Self {
    self.acceptance = rule;
    self
  }

  pub fn with_solver(mut self, solver: SolverMode) -> Self {
    self.solver = solver;
    self
  }

  pub fn with_combination_limit(mut self, limit: u64) -> Self {
    self.combination_limit = limit.max(1);
    self
  }

  pub fn with_budgets(mut self, local: Duration, global: Duration) -> Self {
    self.local_budget = local;
    self.global_budget = global;
    self
  }

  pub fn with_exact_node_limit(mut self, limit: usize) -> Self {
    self.exact_node_limit = limit;
    self
  }

  pub fn with_worker_threads(mut self, threads: usize) -> Self {
    self.worker_threads = Some(threads.max(1));
    self
  }

  pub fn with_simplifier_passes(mut self, passes: usize) -> Self {
    self.simplifier_passes = passes;
    self
  }

  pub fn with_greedy_baseline(mut self, enabled: bool) -> Self {
    self.greedy_baseline = enabled;
    self
  }

  /// Connectivity used by `side`.
  #[inline]
  pub fn connectivity(&self, side: Side) -> Connectivity {
    match side {
      Side::Foreground => self.foreground,
      Side::Background => self.foreground.complement(),
    }
  }

  pub fn validate(&self) -> Result<()> {
    self.thresholds.validate()
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
