//! Whole-word line search
//!
//! The transform's context is the word to search for. Every line of the
//! split containing the word as a whole token is emitted once. A match
//! must be preceded by the start of the line or a space, and followed by
//! a space, comma, period, or the end of the line, so `cat` does not
//! match inside `concatenate`. The aggregate concatenates the
//! intermediate artifacts in split order.

use std::io::SeekFrom;

use anyhow::Context;
use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, AsyncWriteExt, BufReader};

use crate::engine::{Aggregate, DataSplit, Transform};

/// Emit lines of one split containing the context word
#[derive(Debug, Default, Clone, Copy)]
pub struct WordFindTransform;

#[async_trait]
impl Transform<String> for WordFindTransform {
    async fn apply(&self, split: &mut DataSplit<String>, output: &mut File) -> anyhow::Result<()> {
        let word = split.context.as_str();
        let mut lines = BufReader::new(&mut split.file).lines();

        while let Some(line) = lines.next_line().await.context("reading split")? {
            if line_contains_word(&line, word) {
                output
                    .write_all(line.as_bytes())
                    .await
                    .context("writing intermediate artifact")?;
                output
                    .write_all(b"\n")
                    .await
                    .context("writing intermediate artifact")?;
            }
        }
        Ok(())
    }
}

/// Concatenate per-split matches into the result artifact
#[derive(Debug, Default, Clone, Copy)]
pub struct WordFindAggregate;

#[async_trait]
impl Aggregate for WordFindAggregate {
    async fn apply(&self, inputs: &mut [File], output: &mut File) -> anyhow::Result<()> {
        for input in inputs.iter_mut() {
            input
                .seek(SeekFrom::Start(0))
                .await
                .context("rewinding intermediate artifact")?;
            tokio::io::copy(input, &mut *output)
                .await
                .context("copying intermediate artifact")?;
        }
        Ok(())
    }
}

/// Whole-token search: the match may not run into adjacent word characters
fn line_contains_word(line: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let bytes = line.as_bytes();
    let mut from = 0;
    while let Some(found) = line[from..].find(word) {
        let at = from + found;
        let end = at + word.len();
        let boundary_before = at == 0 || bytes[at - 1] == b' ';
        let boundary_after = end == bytes.len() || matches!(bytes[end], b' ' | b',' | b'.');
        if boundary_before && boundary_after {
            return true;
        }
        from = end;
    }
    false
}
