//! Structured error types for pipeline jobs
//!
//! Failures fall into two classes with different propagation rules:
//! setup-class errors abort the whole job before any worker observes
//! them, while execution-class errors stay confined to the worker that
//! produced them and surface only as diagnostics.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Setup-class failures
///
/// Any of these aborts the job before the transform stage starts; no
/// worker has been spawned and the pipeline produces no result artifact.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("split count must be at least 1, got {count}")]
    InvalidSplitCount { count: usize },

    #[error("unable to open input file {path}")]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read input file {path}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create split artifact {path}")]
    SplitCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write split artifact {path}")]
    SplitWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Execution-class failures
///
/// Each variant describes why a single worker stopped. The coordinator
/// logs the failure against the worker's index and keeps going; sibling
/// workers and the rest of the pipeline are unaffected.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("unable to open split artifact {path}")]
    SplitUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to create intermediate artifact {path}")]
    IntermediateCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to open intermediate artifact {path}")]
    IntermediateUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to create result artifact {path}")]
    ResultCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write artifact {path}")]
    ArtifactWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("transform capability failed: {0}")]
    TransformFailed(#[source] anyhow::Error),

    #[error("aggregate capability failed: {0}")]
    AggregateFailed(#[source] anyhow::Error),
}
