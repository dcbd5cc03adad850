//! Staged diff extraction from the repository index.

pub mod staged;

pub use staged::{MAX_DIFF_BYTES, StagedDiff, collect_staged_diff};
