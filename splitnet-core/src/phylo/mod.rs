pub mod clusters;
pub mod tree;

pub use clusters::{compute_splits, extract_clusters, tree_from_compatible_splits};
pub use tree::{PhyloNode, PhyloTree};
