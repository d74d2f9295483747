//! Generator simplification: shrink Cut and Fill regions voxel by voxel while
//! the Betti numbers only go down, then settle generators that have no
//! neighbor on their own side.

mod isolation;
mod simplifier;

pub use isolation::{is_isolated, resolve_isolated};
pub use simplifier::{simplify_generators, SimplifierStats};
