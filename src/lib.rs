//! # Gristmill
//!
//! A single-host parallel computation engine: a large input file is
//! partitioned into record-aligned splits, each split is transformed
//! concurrently by an independent worker, and the partial outputs are
//! merged by one aggregate worker into a final result.
//!
//! The transform and aggregate steps are pluggable capabilities; the
//! crate ships letter counting and whole-word search as builtin tasks.
//!
//! ## Usage
//!
//! ```bash
//! gristmill letter-count input.txt --splits 4
//! gristmill word-find input.txt cat --splits 4
//! ```
//!
//! ## Modules
//!
//! - `engine` - Orchestration core: partitioning, worker lifecycle, the
//!   transform/aggregate phase barrier, and failure containment
//! - `tasks` - Builtin transform/aggregate capabilities

pub mod engine;
pub mod tasks;
