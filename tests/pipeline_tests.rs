//! End-to-end behavior of the pipeline engine

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use gristmill::engine::{self, Aggregate, DataSplit, EngineError, JobResult, JobSpec, Transform};
use gristmill::tasks::{
    LetterCountAggregate, LetterCountTransform, WordFindAggregate, WordFindTransform,
};

async fn write_input(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("input.txt");
    tokio::fs::write(&path, contents).await.unwrap();
    path
}

async fn read_artifact(dir: &TempDir, name: &str) -> String {
    tokio::fs::read_to_string(dir.path().join(name)).await.unwrap()
}

/// Copies its split verbatim into the intermediate artifact
struct PassThroughTransform;

#[async_trait]
impl Transform<()> for PassThroughTransform {
    async fn apply(&self, split: &mut DataSplit<()>, output: &mut File) -> anyhow::Result<()> {
        let mut data = Vec::new();
        split.file.read_to_end(&mut data).await?;
        output.write_all(&data).await?;
        Ok(())
    }
}

/// Fails on splits containing the poison marker, copies the rest
struct FailOnMarkerTransform;

#[async_trait]
impl Transform<()> for FailOnMarkerTransform {
    async fn apply(&self, split: &mut DataSplit<()>, output: &mut File) -> anyhow::Result<()> {
        let mut text = String::new();
        split.file.read_to_string(&mut text).await?;
        if text.contains("BOOM") {
            anyhow::bail!("refusing marked split");
        }
        output.write_all(text.as_bytes()).await?;
        Ok(())
    }
}

struct FailingAggregate;

#[async_trait]
impl Aggregate for FailingAggregate {
    async fn apply(&self, _inputs: &mut [File], _output: &mut File) -> anyhow::Result<()> {
        anyhow::bail!("aggregate refused to merge");
    }
}

/// Shared instrumentation for observing phase ordering
#[derive(Default)]
struct Probe {
    transform_done: Mutex<Vec<Instant>>,
    aggregate_started: Mutex<Option<Instant>>,
}

/// Sleeps according to the digit in its split, so completion order
/// differs from spawn order
struct StaggeredTransform {
    probe: Arc<Probe>,
}

#[async_trait]
impl Transform<()> for StaggeredTransform {
    async fn apply(&self, split: &mut DataSplit<()>, _output: &mut File) -> anyhow::Result<()> {
        let mut text = String::new();
        split.file.read_to_string(&mut text).await?;
        let weight: u64 = text.trim().parse().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(weight * 30)).await;
        self.probe.transform_done.lock().unwrap().push(Instant::now());
        Ok(())
    }
}

struct ObservingAggregate {
    probe: Arc<Probe>,
}

#[async_trait]
impl Aggregate for ObservingAggregate {
    async fn apply(&self, _inputs: &mut [File], _output: &mut File) -> anyhow::Result<()> {
        *self.probe.aggregate_started.lock().unwrap() = Some(Instant::now());
        Ok(())
    }
}

struct SleepingTransform {
    delay: Duration,
}

#[async_trait]
impl Transform<()> for SleepingTransform {
    async fn apply(&self, split: &mut DataSplit<()>, _output: &mut File) -> anyhow::Result<()> {
        let mut data = Vec::new();
        split.file.read_to_end(&mut data).await?;
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

#[tokio::test]
async fn records_one_distinct_worker_id_per_split_in_index_order() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "a\nb\nc\nd\n").await;
    let spec = JobSpec::new(
        input,
        4,
        Arc::new(PassThroughTransform),
        Arc::new(WordFindAggregate),
        (),
    )
    .with_working_dir(dir.path());
    let mut result = JobResult::new();

    engine::run(&spec, &mut result).await.unwrap();

    assert_eq!(result.transform_workers.len(), 4);
    let unique: HashSet<_> = result.transform_workers.iter().collect();
    assert_eq!(unique.len(), 4);
    for (index, id) in result.transform_workers.iter().enumerate() {
        assert!(
            id.ends_with(&format!("-transform-{index}")),
            "worker id {id} out of place at {index}"
        );
    }
    assert!(result.aggregate_worker.is_some());
}

#[tokio::test]
async fn failed_transform_worker_does_not_disturb_its_siblings() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "aaaa\nBOOM\ncccc\n").await;
    let spec = JobSpec::new(
        input,
        3,
        Arc::new(FailOnMarkerTransform),
        Arc::new(WordFindAggregate),
        (),
    )
    .with_working_dir(dir.path());
    let mut result = JobResult::new();

    engine::run(&spec, &mut result).await.unwrap();

    // All three workers were spawned and recorded despite the failure in
    // the middle one.
    assert_eq!(result.transform_workers.len(), 3);
    // The failing worker created its artifact before the transform ran,
    // but wrote nothing into it.
    assert_eq!(read_artifact(&dir, "mr-0.itm").await, "aaaa\n");
    assert_eq!(read_artifact(&dir, "mr-1.itm").await, "");
    assert_eq!(read_artifact(&dir, "mr-2.itm").await, "cccc\n");
    assert_eq!(read_artifact(&dir, "mr.rst").await, "aaaa\ncccc\n");
}

#[tokio::test]
async fn aggregate_failure_is_not_fatal_to_the_job() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "x\ny\n").await;
    let spec = JobSpec::new(
        input,
        2,
        Arc::new(PassThroughTransform),
        Arc::new(FailingAggregate),
        (),
    )
    .with_working_dir(dir.path());
    let mut result = JobResult::new();

    engine::run(&spec, &mut result).await.unwrap();

    assert!(result.aggregate_worker.is_some());
    // The result artifact was created (truncating) before the capability
    // failed, and is left on disk.
    assert_eq!(read_artifact(&dir, "mr.rst").await, "");
}

#[tokio::test]
async fn aggregate_starts_only_after_every_transform_worker_finished() {
    let dir = TempDir::new().unwrap();
    // Worker 0 sleeps longest, worker 1 shortest: completion order is
    // the reverse of spawn order.
    let input = write_input(&dir, "3\n1\n2\n").await;
    let probe = Arc::new(Probe::default());
    let spec = JobSpec::new(
        input,
        3,
        Arc::new(StaggeredTransform {
            probe: Arc::clone(&probe),
        }),
        Arc::new(ObservingAggregate {
            probe: Arc::clone(&probe),
        }),
        (),
    )
    .with_working_dir(dir.path());
    let mut result = JobResult::new();

    engine::run(&spec, &mut result).await.unwrap();

    let transform_done = probe.transform_done.lock().unwrap();
    let aggregate_started = probe.aggregate_started.lock().unwrap().unwrap();
    assert_eq!(transform_done.len(), 3);
    for done in transform_done.iter() {
        assert!(
            *done <= aggregate_started,
            "aggregate worker started before a transform worker finished"
        );
    }
}

#[tokio::test]
async fn processing_time_grows_with_worker_delay() {
    async fn timed_run(delay: Duration) -> u64 {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, "a\nb\n").await;
        let spec = JobSpec::new(
            input,
            2,
            Arc::new(SleepingTransform { delay }),
            Arc::new(WordFindAggregate),
            (),
        )
        .with_working_dir(dir.path());
        let mut result = JobResult::new();
        engine::run(&spec, &mut result).await.unwrap();
        result.processing_time_us
    }

    let fast = timed_run(Duration::ZERO).await;
    let slow = timed_run(Duration::from_millis(250)).await;

    assert!(slow >= 250_000);
    assert!(slow > fast);
}

#[tokio::test]
async fn letter_count_end_to_end() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "AAAB\nBBCC\n").await;
    let spec = JobSpec::new(
        input,
        2,
        Arc::new(LetterCountTransform),
        Arc::new(LetterCountAggregate),
        (),
    )
    .with_working_dir(dir.path());
    let mut result = JobResult::new();

    engine::run(&spec, &mut result).await.unwrap();

    assert_eq!(read_artifact(&dir, "split-0").await, "AAAB\n");
    assert_eq!(read_artifact(&dir, "split-1").await, "BBCC\n");
    assert_eq!(read_artifact(&dir, "mr-0.itm").await, "A 3\nB 1\n");
    assert_eq!(read_artifact(&dir, "mr-1.itm").await, "B 2\nC 2\n");
    assert_eq!(read_artifact(&dir, "mr.rst").await, "A 3\nB 3\nC 2\n");
}

#[tokio::test]
async fn word_find_end_to_end_matches_whole_tokens_only() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "the cat sat\nconcatenate\n").await;
    let spec = JobSpec::new(
        input,
        2,
        Arc::new(WordFindTransform),
        Arc::new(WordFindAggregate),
        "cat".to_string(),
    )
    .with_working_dir(dir.path());
    let mut result = JobResult::new();

    engine::run(&spec, &mut result).await.unwrap();

    assert_eq!(read_artifact(&dir, "mr.rst").await, "the cat sat\n");
}

#[tokio::test]
async fn single_split_collapses_to_a_direct_transform() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "AAAB\nBBCC\n").await;
    let spec = JobSpec::new(
        input,
        1,
        Arc::new(LetterCountTransform),
        Arc::new(LetterCountAggregate),
        (),
    )
    .with_working_dir(dir.path());
    let mut result = JobResult::new();

    engine::run(&spec, &mut result).await.unwrap();

    assert_eq!(result.transform_workers.len(), 1);
    assert_eq!(read_artifact(&dir, "split-0").await, "AAAB\nBBCC\n");
    assert_eq!(read_artifact(&dir, "mr-0.itm").await, "A 3\nB 3\nC 2\n");
    assert_eq!(read_artifact(&dir, "mr.rst").await, "A 3\nB 3\nC 2\n");
}

#[tokio::test]
async fn missing_input_aborts_before_creating_any_artifact() {
    let dir = TempDir::new().unwrap();
    let spec = JobSpec::new(
        dir.path().join("absent.txt"),
        2,
        Arc::new(PassThroughTransform),
        Arc::new(WordFindAggregate),
        (),
    )
    .with_working_dir(dir.path());
    let mut result = JobResult::new();

    let err = engine::run(&spec, &mut result).await.unwrap_err();

    assert!(matches!(err, EngineError::InputUnreadable { .. }));
    assert!(result.transform_workers.is_empty());
    assert!(result.aggregate_worker.is_none());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn zero_split_count_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "x\n").await;
    let spec = JobSpec::new(
        input,
        0,
        Arc::new(PassThroughTransform),
        Arc::new(WordFindAggregate),
        (),
    )
    .with_working_dir(dir.path());
    let mut result = JobResult::new();

    let err = engine::run(&spec, &mut result).await.unwrap_err();

    assert!(matches!(err, EngineError::InvalidSplitCount { count: 0 }));
}
