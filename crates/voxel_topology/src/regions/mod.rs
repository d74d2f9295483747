//! Regions: arena, adjacency, labeling, boundary growth and the shared
//! context object.

mod adjacency;
mod arena;
mod context;
mod grower;
mod labeler;

pub use adjacency::AdjacencyGraph;
pub use arena::{Region, RegionArena};
pub use context::SimplifyContext;
pub use grower::{grow, GrowthQueue, GrowthRequest};
pub use labeler::{label_generators, label_terminals, split_generator, GrowthQueues};
