pub mod diag;
pub mod error;
pub mod network;
pub mod newick;
pub mod ordering;
pub mod phylo;
pub mod progress;
pub mod splits;
pub mod taxa;
