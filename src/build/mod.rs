//! # Dictionary Build
//!
//! - `stager`: per-region external sort of input lines
//! - `tree`: sorted lines -> address tree with parent and sibling links
//! - `session`: `DictionaryBuilder`, the owner of one build

mod session;
mod stager;
mod tree;

pub use session::{BuildOptions, BuildSummary, DictionaryBuilder, RegionSummary};
pub use stager::{SortMergeStager, SortedLines, StagedEntry};
pub use tree::{TreeBuilder, TreeStats};
