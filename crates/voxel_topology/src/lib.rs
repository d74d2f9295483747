//! voxel_topology - Topology simplification for 3D scalar volumes
//!
//! Given an intensity volume and three thresholds (shape, kernel and
//! neighborhood), this crate picks a binary segmentation inside the band
//! they allow with as few components, handles and cavities as it can, at a
//! small geometric cost.
//!
//! # Stages
//!
//! - **Labeling**: Core and Neighborhood terminals are flood filled and grown
//!   through simple boundary voxels; the remaining band splits into Cut and
//!   Fill generators
//! - **Generator simplification**: generators shrink voxel by voxel while no
//!   Betti number grows
//! - **Decision**: the remaining generators are assigned a side by a
//!   node-weighted Steiner tree formulation solved per cluster on a worker
//!   pool, then globally (or by a greedy pass)
//!
//! # Example
//!
//! ```ignore
//! use voxel_topology::{simplify, SimplePointOracle, SimplifyConfig, Thresholds, Volume};
//!
//! let volume = Volume::new(dims, data)?;
//! let oracle = SimplePointOracle::computed();
//! let outcome = simplify(&volume, SimplifyConfig::new(Thresholds::new(0.0, 0.3, -0.3)), &oracle)?;
//!
//! println!("{} -> {}", outcome.betti_before, outcome.betti_after);
//! ```

pub mod constants;
pub mod error;
pub mod types;
pub mod volume;

// Re-export commonly used items
pub use error::{Result, TopologyError};
pub use types::{
  AcceptanceRule, Connectivity, CostMode, Intensity, RegionId, RegionKind, Side, SimplifyConfig,
  SolverMode, Thresholds, NO_REGION,
};
pub use volume::{Grid, Volume};

// Simple point oracle (computed or table backed)
pub mod simple_point;
pub use simple_point::{SimplePointOracle, SimpleTable};

// Betti numbers, Euler counts and side graphs
pub mod topology;
pub use topology::{BettiDelta, BettiNumbers, EulerCounts};

// Region labeling and shared context
pub mod regions;
pub use regions::SimplifyContext;

// Generator shrinking and isolation
pub mod generators;

// Steiner formulation and solvers
pub mod hypergraph;
pub mod steiner;
pub use steiner::{AutoSolver, ExhaustiveSolver, PathHeuristicSolver, SteinerSolver};

// Local/global decision stages
pub mod solve;
pub use solve::{LocalSolveStage, SolveStats, WorkerPool};

pub mod greedy;
pub use greedy::{greedy_pass, GreedyStats};

pub mod metrics;
pub use metrics::{PipelineStats, Stage, StageTimings};

// End-to-end simplification
pub mod pipeline;
pub use pipeline::{simplify, simplify_with_solver, BaselineReport, CostSummary, RegionRecord, SimplifyOutcome};

// Test utilities
#[cfg(test)]
pub mod test_utils;
