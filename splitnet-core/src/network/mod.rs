pub mod convex_hull;
pub mod graph;

pub use convex_hull::{
    build_network, extend_network, extract_splits, split_bipartition, star_network,
};
pub use graph::SplitGraph;

#[cfg(test)]
mod tests;
