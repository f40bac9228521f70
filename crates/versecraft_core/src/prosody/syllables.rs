//! Syllable estimation for single words and whole lines.
//!
//! # Responsibility
//! - Count syllables via dictionary lookup with a vowel-run fallback.
//!
//! # Invariants
//! - Pure and deterministic: identical input always yields identical output.
//! - Words absent from the dictionary count one syllable per maximal run of
//!   `a e i o u y`.
//! - Empty input counts zero.

use crate::prosody::dictionary::PronouncingDictionary;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").expect("valid word regex"));
static VOWEL_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[aeiouy]+").expect("valid vowel run regex"));

/// Dictionary-backed syllable estimator.
///
/// Cheap to clone; the dictionary is shared.
#[derive(Debug, Clone)]
pub struct SyllableEstimator {
    dictionary: Arc<PronouncingDictionary>,
}

impl Default for SyllableEstimator {
    fn default() -> Self {
        Self::new(PronouncingDictionary::seed())
    }
}

impl SyllableEstimator {
    pub fn new(dictionary: PronouncingDictionary) -> Self {
        Self {
            dictionary: Arc::new(dictionary),
        }
    }

    /// Estimator with no dictionary; every word uses the vowel-run count.
    pub fn fallback_only() -> Self {
        Self::new(PronouncingDictionary::empty())
    }

    /// Syllables in one word.
    pub fn estimate(&self, word: &str) -> u32 {
        let folded = word.to_lowercase();
        self.dictionary
            .syllables(&folded)
            .unwrap_or_else(|| count_vowel_runs(&folded))
    }

    /// Sum of word estimates over a tokenized line.
    pub fn estimate_line(&self, line: &str) -> u32 {
        tokenize(line).map(|word| self.estimate(&word)).sum()
    }
}

/// Case-folded words of `line`, split on word boundaries.
pub fn tokenize(line: &str) -> impl Iterator<Item = String> + '_ {
    WORD_RE
        .find_iter(line)
        .map(|word| word.as_str().to_lowercase())
}

fn count_vowel_runs(word: &str) -> u32 {
    u32::try_from(VOWEL_RUN_RE.find_iter(word).count()).unwrap_or(u32::MAX)
}
