//! Pronouncing dictionary in CMU text format.
//!
//! # Responsibility
//! - Parse `WORD  PH1 PH2 ...` entries, including `WORD(N)` variants.
//! - Answer per-word syllable counts.
//!
//! # Invariants
//! - Keys are lowercase.
//! - A pronunciation's syllable count is the number of phonemes carrying a
//!   stress digit; across variants the maximum wins.

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const SEED_DICTIONARY: &str = include_str!("cmudict_seed.txt");
const COMMENT_PREFIX: &str = ";;;";

/// Dictionary load/parse errors.
#[derive(Debug)]
pub enum DictionaryError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Entry without any phoneme, or with an empty word.
    Malformed { line: usize, content: String },
}

impl Display for DictionaryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(
                f,
                "failed to read pronouncing dictionary `{}`: {source}",
                path.display()
            ),
            Self::Malformed { line, content } => {
                write!(f, "malformed dictionary entry at line {line}: `{content}`")
            }
        }
    }
}

impl Error for DictionaryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Malformed { .. } => None,
        }
    }
}

/// Word -> maximum syllable count lookup table.
#[derive(Debug, Clone, Default)]
pub struct PronouncingDictionary {
    syllables: HashMap<String, u32>,
}

impl PronouncingDictionary {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Dictionary embedded in the binary.
    pub fn seed() -> Self {
        let mut dictionary = Self::empty();
        // Seed well-formedness is covered by `seed_parses_without_malformed_rows`.
        let entries = SEED_DICTIONARY
            .lines()
            .filter_map(|line| parse_entry(line).ok().flatten());
        for (word, count) in entries {
            dictionary.insert(word, count);
        }
        dictionary
    }

    /// Parses CMU-format text.
    pub fn parse(text: &str) -> Result<Self, DictionaryError> {
        let mut dictionary = Self::empty();
        dictionary.merge_text(text)?;
        Ok(dictionary)
    }

    /// Reads and merges a CMU-format file over the current entries.
    pub fn merge_file(&mut self, path: impl AsRef<Path>) -> Result<(), DictionaryError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| DictionaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        // cmudict releases are latin-1 in places; lossy decoding keeps ASCII
        // entries intact.
        let text = String::from_utf8_lossy(&bytes);
        self.merge_text(&text)
    }

    fn merge_text(&mut self, text: &str) -> Result<(), DictionaryError> {
        for (index, line) in text.lines().enumerate() {
            let entry = parse_entry(line).map_err(|()| DictionaryError::Malformed {
                line: index + 1,
                content: line.trim().to_string(),
            })?;
            if let Some((word, count)) = entry {
                self.insert(word, count);
            }
        }
        Ok(())
    }

    fn insert(&mut self, word: String, count: u32) {
        let slot = self.syllables.entry(word).or_insert(count);
        *slot = (*slot).max(count);
    }

    /// Maximum syllable count across known pronunciations of `word`.
    pub fn syllables(&self, word: &str) -> Option<u32> {
        self.syllables.get(word.to_lowercase().as_str()).copied()
    }

    pub fn len(&self) -> usize {
        self.syllables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.syllables.is_empty()
    }
}

/// Returns `Ok(None)` for blank and comment lines.
fn parse_entry(line: &str) -> Result<Option<(String, u32)>, ()> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
        return Ok(None);
    }

    let mut tokens = trimmed.split_whitespace();
    let raw_word = tokens.next().ok_or(())?;
    let word = strip_variant_suffix(raw_word).to_lowercase();
    if word.is_empty() {
        return Err(());
    }

    let mut phonemes = 0_u32;
    let mut stressed = 0_u32;
    for phoneme in tokens {
        if phoneme.starts_with('#') {
            break;
        }
        phonemes += 1;
        if phoneme.ends_with(|ch: char| ch.is_ascii_digit()) {
            stressed += 1;
        }
    }
    if phonemes == 0 {
        return Err(());
    }

    Ok(Some((word, stressed)))
}

/// `WORD(2)` -> `WORD`.
fn strip_variant_suffix(word: &str) -> &str {
    match word.find('(') {
        Some(index) if word.ends_with(')') => &word[..index],
        _ => word,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_parses_without_malformed_rows() {
        PronouncingDictionary::parse(SEED_DICTIONARY).expect("seed must be well formed");
        assert!(PronouncingDictionary::seed().len() > 100);
    }

    #[test]
    fn counts_stress_digits() {
        let dictionary = PronouncingDictionary::parse("SILENCE  S AY1 L AH0 N S\n").unwrap();
        assert_eq!(dictionary.syllables("silence"), Some(2));
        assert_eq!(dictionary.syllables("SILENCE"), Some(2));
    }

    #[test]
    fn variants_keep_the_maximum() {
        let text = "EVERY  EH1 V R IY0\nEVERY(1)  EH1 V ER0 IY0\n";
        let dictionary = PronouncingDictionary::parse(text).unwrap();
        assert_eq!(dictionary.syllables("every"), Some(3));
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let text = ";;; header\n\nPOND  P AA1 N D\n";
        let dictionary = PronouncingDictionary::parse(text).unwrap();
        assert_eq!(dictionary.len(), 1);
    }

    #[test]
    fn entry_without_phonemes_is_malformed() {
        let err = PronouncingDictionary::parse("POND  P AA1 N D\nBROKEN\n").unwrap_err();
        match err {
            DictionaryError::Malformed { line, content } => {
                assert_eq!(line, 2);
                assert_eq!(content, "BROKEN");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn merge_file_overrides_and_extends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extra.dict");
        std::fs::write(&path, "ZEPHYR  Z EH1 F ER0\n").unwrap();

        let mut dictionary = PronouncingDictionary::seed();
        dictionary.merge_file(&path).unwrap();
        assert_eq!(dictionary.syllables("zephyr"), Some(2));
        assert_eq!(dictionary.syllables("pond"), Some(1));
    }

    #[test]
    fn missing_file_reports_path() {
        let mut dictionary = PronouncingDictionary::empty();
        let err = dictionary.merge_file("/nonexistent/versecraft.dict").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/versecraft.dict"));
    }
}
