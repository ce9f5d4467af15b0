//! Shared types and capability contracts for pipeline jobs

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs::File;

/// Immutable description of one pipeline job
///
/// Owned by the caller and never mutated by the engine. The context `C`
/// is shared read-only by every transform invocation.
pub struct JobSpec<C> {
    /// Input data file to partition
    pub input_path: PathBuf,
    /// Number of splits, and therefore of parallel transform workers
    pub split_count: usize,
    /// Directory the split, intermediate, and result artifacts land in.
    /// Artifact names are index-only, so concurrent jobs sharing a
    /// directory will collide.
    pub working_dir: PathBuf,
    /// Transform capability applied to each split
    pub transform: Arc<dyn Transform<C>>,
    /// Aggregate capability applied across all intermediate artifacts
    pub aggregate: Arc<dyn Aggregate>,
    /// Opaque user context forwarded unchanged to every transform
    pub context: Arc<C>,
}

impl<C> JobSpec<C> {
    /// Create a job spec with artifacts rooted in the current directory
    pub fn new(
        input_path: impl Into<PathBuf>,
        split_count: usize,
        transform: Arc<dyn Transform<C>>,
        aggregate: Arc<dyn Aggregate>,
        context: C,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            split_count,
            working_dir: PathBuf::from("."),
            transform,
            aggregate,
            context: Arc::new(context),
        }
    }

    /// Root the job's artifacts in a different directory
    pub fn with_working_dir(mut self, working_dir: impl Into<PathBuf>) -> Self {
        self.working_dir = working_dir.into();
        self
    }
}

/// Read-only view over one split plus the job-wide shared context
///
/// Created immediately before the transform capability runs and owned
/// exclusively by that worker until it exits.
pub struct DataSplit<C> {
    /// Split artifact opened read-only, positioned at the start
    pub file: File,
    /// Shared user context
    pub context: Arc<C>,
}

/// Record of the workers a job spawned and how long it took
///
/// Created empty by the caller and populated incrementally while the job
/// runs: transform worker ids land in spawn order at spawn time, before
/// the workers have necessarily finished.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobResult {
    /// One id per transform worker, in spawn (= split index) order
    pub transform_workers: Vec<String>,
    /// Id of the single aggregate worker
    pub aggregate_worker: Option<String>,
    /// Wall-clock time for the whole job, in microseconds
    pub processing_time_us: u64,
}

impl JobResult {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Transform capability: one split in, one intermediate artifact out
#[async_trait]
pub trait Transform<C>: Send + Sync {
    /// Consume the split fully and emit zero or more records to the
    /// intermediate artifact. Implementations must not touch anything
    /// besides the two handles and the shared context.
    async fn apply(&self, split: &mut DataSplit<C>, output: &mut File) -> anyhow::Result<()>;
}

/// Aggregate capability: many intermediate artifacts in, one result out
#[async_trait]
pub trait Aggregate: Send + Sync {
    /// Merge records from every intermediate artifact into the result
    /// artifact. `inputs` holds one handle per split, in split order.
    /// Implementations must rewind each handle before reading it, since
    /// an earlier phase may have left the position past the start.
    async fn apply(&self, inputs: &mut [File], output: &mut File) -> anyhow::Result<()>;
}
