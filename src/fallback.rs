//! Static pool of pre-written articles used when generation fails.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use crate::article::{Draft, ValidationError, WordRange};
use crate::topics::days_since_epoch;

#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("failed to read fallback pool {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("fallback pool is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("fallback pool contains no articles")]
    Empty,
    #[error("fallback entry {index} ('{title}') is invalid: {source}")]
    InvalidEntry {
        index: usize,
        title: String,
        #[source]
        source: ValidationError,
    },
}

/// A non-empty, validated set of drafts.
#[derive(Debug, Clone)]
pub struct FallbackPool {
    entries: Vec<Draft>,
}

impl FallbackPool {
    pub fn load<P: AsRef<Path>>(path: P, words: WordRange) -> Result<Self, FallbackError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| FallbackError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content, words)
    }

    /// Parse a pool from JSON (useful for testing)
    pub fn from_json(content: &str, words: WordRange) -> Result<Self, FallbackError> {
        let entries: Vec<Draft> = serde_json::from_str(content)?;
        Self::new(entries, words)
    }

    pub fn new(entries: Vec<Draft>, words: WordRange) -> Result<Self, FallbackError> {
        if entries.is_empty() {
            return Err(FallbackError::Empty);
        }
        for (index, entry) in entries.iter().enumerate() {
            entry.validate(words).map_err(|source| FallbackError::InvalidEntry {
                index,
                title: entry.title.clone(),
                source,
            })?;
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Choose an entry for `topic` on `date`.
    ///
    /// Entries whose category matches the topic (ignoring case) are preferred;
    /// without a match the whole pool is used. The index is the topic's
    /// character checksum plus the rotation day, so a given topic and date
    /// always yield the same entry and consecutive days cycle through the
    /// candidates.
    pub fn select(&self, topic: &str, date: NaiveDate) -> &Draft {
        let wanted = topic.trim().to_lowercase();
        let matching: Vec<&Draft> = self
            .entries
            .iter()
            .filter(|e| e.category.trim().to_lowercase() == wanted)
            .collect();
        let candidates: Vec<&Draft> = if matching.is_empty() {
            self.entries.iter().collect()
        } else {
            matching
        };

        let checksum: i64 = topic.chars().map(|c| i64::from(u32::from(c))).sum();
        let index = (checksum + days_since_epoch(date)).rem_euclid(candidates.len() as i64) as usize;
        candidates[index]
    }
}
