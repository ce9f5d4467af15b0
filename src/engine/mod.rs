//! Orchestration core for split/transform/aggregate jobs
//!
//! A job runs in three phases over a shared working directory. The
//! partitioner divides the input into record-aligned split artifacts.
//! One transform worker per split then runs concurrently, each producing
//! an intermediate artifact. Once every transform worker has been
//! observed, a single aggregate worker merges the intermediates into the
//! result artifact.
//!
//! Failure containment follows the phase structure: setup problems
//! (unreadable input, bad split count) abort the job with an
//! [`EngineError`] before any worker exists, while a failing worker is
//! reported as one diagnostic and never disturbs its siblings or the
//! rest of the pipeline. Artifacts are never deleted; retention is
//! intentional.

pub mod artifact;
mod errors;
mod split;
mod types;
mod worker;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use uuid::Uuid;

pub use errors::{EngineError, EngineResult, WorkerError};
pub use types::{Aggregate, DataSplit, JobResult, JobSpec, Transform};

/// Run one pipeline job to completion
///
/// `result` is populated incrementally while the job runs: every
/// transform worker id is recorded at spawn time in split-index order,
/// the aggregate worker id when the aggregate stage starts, and the
/// elapsed time just before returning.
///
/// Returns an error only for setup-class failures; once workers have
/// been spawned the call always completes, though the result artifact
/// may be incomplete if a transform or the aggregate worker failed.
pub async fn run<C>(spec: &JobSpec<C>, result: &mut JobResult) -> EngineResult<()>
where
    C: Send + Sync + 'static,
{
    let started = Instant::now();

    if spec.split_count == 0 {
        return Err(EngineError::InvalidSplitCount {
            count: spec.split_count,
        });
    }

    split::partition(&spec.input_path, &spec.working_dir, spec.split_count).await?;

    let job_id = Uuid::new_v4();
    info!(
        "job {} partitioned {} into {} splits",
        job_id,
        spec.input_path.display(),
        spec.split_count
    );

    let mut handles = Vec::with_capacity(spec.split_count);
    for index in 0..spec.split_count {
        let worker_id = format!("{job_id}-transform-{index}");
        result.transform_workers.push(worker_id.clone());

        let split_path = artifact::split_path(&spec.working_dir, index);
        let intermediate_path = artifact::intermediate_path(&spec.working_dir, index);
        let capability = Arc::clone(&spec.transform);
        let context = Arc::clone(&spec.context);
        handles.push(tokio::spawn(async move {
            worker::transform(split_path, intermediate_path, capability, context).await
        }));
        debug!("spawned transform worker {}", worker_id);
    }

    // Observe transform workers strictly in spawn order, not completion
    // order. The aggregate stage must not start until every one of them
    // has terminated and been waited on.
    for (index, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(Ok(())) => debug!("transform worker {} completed", index),
            Ok(Err(err)) => warn!("transform worker {} failed: {}", index, err),
            Err(err) => warn!("transform worker {} panicked: {}", index, err),
        }
    }

    let aggregate_id = format!("{job_id}-aggregate");
    result.aggregate_worker = Some(aggregate_id.clone());

    let intermediate_paths: Vec<PathBuf> = (0..spec.split_count)
        .map(|index| artifact::intermediate_path(&spec.working_dir, index))
        .collect();
    let result_path = artifact::result_path(&spec.working_dir);
    let capability = Arc::clone(&spec.aggregate);
    let handle = tokio::spawn(async move {
        worker::aggregate(intermediate_paths, result_path, capability).await
    });
    debug!("spawned aggregate worker {}", aggregate_id);

    match handle.await {
        Ok(Ok(())) => debug!("aggregate worker completed"),
        Ok(Err(err)) => warn!("aggregate worker failed: {}", err),
        Err(err) => warn!("aggregate worker panicked: {}", err),
    }

    result.processing_time_us = started.elapsed().as_micros() as u64;
    Ok(())
}
