//! Letter frequency counting
//!
//! The transform counts ASCII letters in its split, case-insensitively,
//! and emits one `"{letter} {count}"` record per letter seen, uppercase,
//! in alphabetical order. The aggregate sums the per-split counts and
//! emits the merged table in the same format.

use std::io::SeekFrom;

use anyhow::Context;
use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::engine::{Aggregate, DataSplit, Transform};

const ALPHABET_LEN: usize = 26;

/// Count letters in one split
#[derive(Debug, Default, Clone, Copy)]
pub struct LetterCountTransform;

#[async_trait]
impl Transform<()> for LetterCountTransform {
    async fn apply(&self, split: &mut DataSplit<()>, output: &mut File) -> anyhow::Result<()> {
        let mut data = Vec::new();
        split
            .file
            .read_to_end(&mut data)
            .await
            .context("reading split")?;

        let mut counts = [0u64; ALPHABET_LEN];
        for byte in data {
            if byte.is_ascii_alphabetic() {
                counts[(byte.to_ascii_uppercase() - b'A') as usize] += 1;
            }
        }

        output
            .write_all(format_counts(&counts).as_bytes())
            .await
            .context("writing intermediate artifact")?;
        Ok(())
    }
}

/// Merge per-split letter counts into one table
#[derive(Debug, Default, Clone, Copy)]
pub struct LetterCountAggregate;

#[async_trait]
impl Aggregate for LetterCountAggregate {
    async fn apply(&self, inputs: &mut [File], output: &mut File) -> anyhow::Result<()> {
        let mut totals = [0u64; ALPHABET_LEN];

        for input in inputs.iter_mut() {
            input
                .seek(SeekFrom::Start(0))
                .await
                .context("rewinding intermediate artifact")?;
            let mut text = String::new();
            input
                .read_to_string(&mut text)
                .await
                .context("reading intermediate artifact")?;

            for line in text.lines() {
                let mut parts = line.split_whitespace();
                let (Some(letter), Some(count)) = (parts.next(), parts.next()) else {
                    continue;
                };
                // Malformed records are skipped, not fatal.
                let Some(index) = letter_index(letter) else {
                    continue;
                };
                let Ok(count) = count.parse::<u64>() else {
                    continue;
                };
                totals[index] += count;
            }
        }

        output
            .write_all(format_counts(&totals).as_bytes())
            .await
            .context("writing result artifact")?;
        Ok(())
    }
}

fn letter_index(token: &str) -> Option<usize> {
    let mut chars = token.chars();
    let letter = chars.next()?;
    if chars.next().is_some() || !letter.is_ascii_uppercase() {
        return None;
    }
    Some((letter as u8 - b'A') as usize)
}

fn format_counts(counts: &[u64; ALPHABET_LEN]) -> String {
    let mut out = String::new();
    for (index, count) in counts.iter().enumerate() {
        if *count > 0 {
            out.push_str(&format!("{} {}\n", (b'A' + index as u8) as char, count));
        }
    }
    out
}
