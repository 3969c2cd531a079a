//! Shared Word Frequency Table
//!
//! The only shared mutable state in the process. Backfill, the live stream, the
//! snapshot loop and HTTP readers all go through this type; nobody touches the
//! map directly.
//!
//! ## Locking
//! - Every increment takes the write lock for a single map operation.
//! - `snapshot` holds the read lock while copying, so a snapshot never mixes
//!   states from before and after a concurrent increment.

use super::types::WordValues;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
pub struct FrequencyTable {
    counts: RwLock<HashMap<String, u64>>,
}

impl FrequencyTable {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Adds one occurrence of `word`, creating the entry at 1.
    pub fn increment(&self, word: &str) {
        let mut counts = self.write();
        match counts.get_mut(word) {
            Some(count) => *count += 1,
            None => {
                counts.insert(word.to_string(), 1);
            }
        }
    }

    /// Increments each token in turn. The lock is released between tokens.
    pub fn increment_all<I, S>(&self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for token in tokens {
            self.increment(token.as_ref());
        }
    }

    pub fn count(&self, word: &str) -> u64 {
        self.read().get(word).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn snapshot(&self) -> WordValues {
        let counts = self.read();
        WordValues {
            words: counts
                .iter()
                .map(|(word, count)| (word.clone(), *count))
                .collect(),
        }
    }

    /// Replaces the whole table with a previously taken snapshot.
    pub fn restore(&self, values: WordValues) {
        let mut counts = self.write();
        *counts = values.words.into_iter().collect();
        tracing::debug!("Frequency table restored with {} words", counts.len());
    }

    // A panic elsewhere can't leave a count half-written, so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, u64>> {
        self.counts.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, u64>> {
        self.counts.write().unwrap_or_else(PoisonError::into_inner)
    }
}
