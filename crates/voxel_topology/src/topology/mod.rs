//! Digital topology primitives: union-find, cubical complex counts, Betti
//! numbers, low-link analysis and region-level side graphs.

mod betti;
mod dsu;
mod euler;
mod lowlink;
mod side_graph;

pub use betti::{count_components, BettiDelta, BettiNumbers};
pub use dsu::DisjointSet;
pub use euler::{count_complex, flip_delta, voxel_flip_chi, EulerCounts};
pub use lowlink::{AdjacencyLists, LowLink, Piece};
pub use side_graph::SideGraph;
