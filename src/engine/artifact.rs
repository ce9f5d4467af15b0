//! On-disk artifact naming
//!
//! The names are a fixed compatibility contract: `split-{index}` for
//! splits, `mr-{index}.itm` for intermediate artifacts, and `mr.rst` for
//! the final result, all relative to the job's working directory. Names
//! carry no per-job namespace, so concurrent jobs sharing a directory
//! can overwrite each other's artifacts.

use std::path::{Path, PathBuf};

/// File name of the final result artifact
pub const RESULT_FILENAME: &str = "mr.rst";

/// Path of the split artifact for one split index
pub fn split_path(working_dir: &Path, index: usize) -> PathBuf {
    working_dir.join(format!("split-{index}"))
}

/// Path of the intermediate artifact produced from one split
pub fn intermediate_path(working_dir: &Path, index: usize) -> PathBuf {
    working_dir.join(format!("mr-{index}.itm"))
}

/// Path of the final result artifact
pub fn result_path(working_dir: &Path) -> PathBuf {
    working_dir.join(RESULT_FILENAME)
}
