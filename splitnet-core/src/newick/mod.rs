//! Split-Newick text, in both directions.
//!
//! The format is rooted Newick extended with split markers: `<id|` opens a
//! marker and `|id:weight>` closes it, and the marked split separates the
//! leaf taxa between the two from everything else. A tree is the special
//! case with no markers.

mod lexer;
pub mod reader;
pub mod writer;

pub use reader::{parse, parse_with_labels, ParsedSplits};
pub use writer::{write, WriteOptions};
