//! Persistent, append-only journal of recorded samples.
//!
//! The store itself never touches disk. A session opened with a journal
//! writes every accepted sample through it and replays it on startup.

use crate::core::{MetricSample, ValidationError};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal IO failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("journal line {line} is corrupt: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("journal line {line} holds an invalid sample: {source}")]
    Invalid {
        line: usize,
        #[source]
        source: ValidationError,
    },

    #[error("could not encode sample: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Storage backend for recorded samples.
pub trait SampleJournal: Send + Sync {
    /// Durably append one sample.
    fn append(&mut self, sample: &MetricSample) -> Result<(), JournalError>;

    /// Read back every sample in the order it was appended.
    fn load(&self) -> Result<Vec<MetricSample>, JournalError>;
}

/// JSON Lines file, one sample per line.
#[derive(Debug, Clone)]
pub struct JsonlJournal {
    path: PathBuf,
}

impl JsonlJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SampleJournal for JsonlJournal {
    fn append(&mut self, sample: &MetricSample) -> Result<(), JournalError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let line = serde_json::to_string(sample).map_err(JournalError::Encode)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    fn load(&self) -> Result<Vec<MetricSample>, JournalError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                let sample: MetricSample =
                    serde_json::from_str(line).map_err(|source| JournalError::Corrupt {
                        line: index + 1,
                        source,
                    })?;
                sample.validate().map_err(|source| JournalError::Invalid {
                    line: index + 1,
                    source,
                })?;
                Ok(sample)
            })
            .collect()
    }
}

/// In-memory journal, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryJournal {
    samples: Vec<MetricSample>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_samples(samples: Vec<MetricSample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl SampleJournal for MemoryJournal {
    fn append(&mut self, sample: &MetricSample) -> Result<(), JournalError> {
        self.samples.push(sample.clone());
        Ok(())
    }

    fn load(&self) -> Result<Vec<MetricSample>, JournalError> {
        Ok(self.samples.clone())
    }
}
