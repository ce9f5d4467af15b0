//! Worker task bodies for the transform and aggregate stages
//!
//! Each worker owns its file handles outright and reports its outcome as
//! a single `Result` collected by the coordinator. Handles are released
//! when the worker returns, success or failure.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use super::errors::WorkerError;
use super::types::{Aggregate, DataSplit, Transform};

/// Body of one transform worker
///
/// Opens the split read-only, creates (truncating) the intermediate
/// artifact, and hands both to the transform capability. The artifact
/// exists on disk, empty, before the capability runs.
pub(crate) async fn transform<C>(
    split_path: PathBuf,
    intermediate_path: PathBuf,
    capability: Arc<dyn Transform<C>>,
    context: Arc<C>,
) -> Result<(), WorkerError>
where
    C: Send + Sync + 'static,
{
    let file = File::open(&split_path)
        .await
        .map_err(|source| WorkerError::SplitUnreadable {
            path: split_path.clone(),
            source,
        })?;
    let mut split = DataSplit { file, context };

    let mut intermediate =
        File::create(&intermediate_path)
            .await
            .map_err(|source| WorkerError::IntermediateCreateFailed {
                path: intermediate_path.clone(),
                source,
            })?;

    capability
        .apply(&mut split, &mut intermediate)
        .await
        .map_err(WorkerError::TransformFailed)?;

    intermediate
        .flush()
        .await
        .map_err(|source| WorkerError::ArtifactWriteFailed {
            path: intermediate_path,
            source,
        })?;

    Ok(())
}

/// Body of the single aggregate worker
///
/// Opens every intermediate artifact read-only in split order, creates
/// (truncating) the result artifact, and hands the lot to the aggregate
/// capability. A missing intermediate artifact fails this worker; that
/// is how an upstream transform failure surfaces downstream.
pub(crate) async fn aggregate(
    intermediate_paths: Vec<PathBuf>,
    result_path: PathBuf,
    capability: Arc<dyn Aggregate>,
) -> Result<(), WorkerError> {
    let mut inputs = Vec::with_capacity(intermediate_paths.len());
    for path in intermediate_paths {
        let file = File::open(&path)
            .await
            .map_err(|source| WorkerError::IntermediateUnreadable {
                path: path.clone(),
                source,
            })?;
        inputs.push(file);
    }

    let mut output = File::create(&result_path)
        .await
        .map_err(|source| WorkerError::ResultCreateFailed {
            path: result_path.clone(),
            source,
        })?;

    capability
        .apply(&mut inputs, &mut output)
        .await
        .map_err(WorkerError::AggregateFailed)?;

    output
        .flush()
        .await
        .map_err(|source| WorkerError::ArtifactWriteFailed {
            path: result_path,
            source,
        })?;

    Ok(())
}
