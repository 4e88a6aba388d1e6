//! Random practice words
//!
//! Words are drawn from a system dictionary (one word per line), falling
//! back to a small built-in list when none is installed.

use std::path::Path;
use std::sync::Arc;

use rand::seq::SliceRandom;

const FALLBACK_WORDS: &[&str] = &[
    "about", "above", "across", "after", "again", "against", "almost", "alone", "along",
    "always", "among", "animal", "answer", "around", "because", "before", "began", "behind",
    "being", "below", "between", "birds", "black", "books", "bring", "brought", "build",
    "called", "carry", "change", "children", "city", "close", "color", "could", "country",
    "different", "earth", "enough", "every", "example", "family", "father", "field", "first",
    "follow", "found", "friend", "great", "group", "happen", "heard", "house", "important",
    "island", "keep", "kind", "language", "large", "learn", "letter", "light", "little",
    "mountain", "mother", "music", "never", "night", "number", "often", "paper", "people",
    "picture", "place", "plant", "question", "quickly", "river", "school", "second", "sentence",
    "should", "story", "study", "something", "sometimes", "thought", "together", "under",
    "until", "water", "where", "while", "without", "world", "write", "young",
];

/// Uniform sampler over a fixed word list
#[derive(Debug, Clone)]
pub struct WordSampler {
    words: Arc<[String]>,
}

impl WordSampler {
    /// Build from an explicit list, dropping anything that is not a plain
    /// alphabetic word
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty() && w.chars().all(char::is_alphabetic))
            .collect();

        Self {
            words: words.into(),
        }
    }

    pub fn fallback() -> Self {
        Self::from_words(FALLBACK_WORDS)
    }

    /// Load a dictionary file, using the built-in list if it is missing or
    /// contains no usable words
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        match std::fs::read(path) {
            Ok(bytes) => {
                let sampler = Self::from_words(String::from_utf8_lossy(&bytes).lines());
                if sampler.is_empty() {
                    tracing::warn!(path = %path.display(), "Dictionary has no usable words, using built-in list");
                    Self::fallback()
                } else {
                    tracing::info!(path = %path.display(), words = sampler.len(), "Loaded dictionary");
                    sampler
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "Dictionary unavailable ({}), using built-in list", e);
                Self::fallback()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Draw `count` words uniformly, with replacement
    pub fn sample(&self, count: usize) -> Vec<String> {
        let mut rng = rand::thread_rng();
        (0..count)
            .filter_map(|_| self.words.choose(&mut rng).cloned())
            .collect()
    }
}
