//! Dictionary management for spelling correction.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use crate::analysis::char_filter::contraction::ContractionCharFilter;
use crate::analysis::token_filter::abbreviation::AbbreviationFilter;
use crate::error::{EmogifError, Result};

/// English `word frequency` table compiled into the binary.
const BUILTIN_WORDS: &str = include_str!("english_words.txt");

static ENGLISH: LazyLock<SpellingDictionary> = LazyLock::new(|| {
    let mut dictionary = SpellingDictionary::new();
    let entries = BUILTIN_WORDS
        .lines()
        .filter_map(|line| parse_line(line).ok().flatten());
    for (word, frequency) in entries {
        dictionary.add_word(word, frequency);
    }
    BuiltinDictionary::add_expansion_words(&mut dictionary);
    dictionary
});

/// Parse one `word [frequency]` line. `Ok(None)` for blank and comment lines.
fn parse_line(line: &str) -> std::result::Result<Option<(&str, u32)>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut parts = line.split_whitespace();
    let word = parts.next().unwrap_or_default();
    let frequency = match parts.next() {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|e| format!("invalid frequency '{raw}': {e}"))?,
        None => 1,
    };
    Ok(Some((word, frequency)))
}

/// A dictionary of known words and their frequencies.
#[derive(Debug, Clone, Default)]
pub struct SpellingDictionary {
    words: HashMap<String, u32>,
    /// Length of the longest word, in characters.
    max_word_len: usize,
}

impl SpellingDictionary {
    /// Create a new empty dictionary.
    pub fn new() -> Self {
        SpellingDictionary::default()
    }

    /// Add a word with the given frequency, replacing any previous frequency.
    pub fn add_word(&mut self, word: &str, frequency: u32) {
        let normalized = word.to_lowercase();
        self.max_word_len = self.max_word_len.max(normalized.chars().count());
        self.words.insert(normalized, frequency);
    }

    /// Add a word unless it is already known.
    pub fn add_if_absent(&mut self, word: &str, frequency: u32) {
        if !self.contains(word) {
            self.add_word(word, frequency);
        }
    }

    /// Check if a word exists in the dictionary.
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains_key(word)
    }

    /// Get the frequency of a word (0 when unknown).
    pub fn frequency(&self, word: &str) -> u32 {
        self.words.get(word).copied().unwrap_or(0)
    }

    /// Get the number of unique words.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Length of the longest known word, in characters.
    pub fn max_word_len(&self) -> usize {
        self.max_word_len
    }

    /// Iterate over all words and their frequencies.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.words.iter().map(|(word, freq)| (word.as_str(), *freq))
    }

    /// Parse a frequency table with `word frequency` per line.
    ///
    /// Lines with a single word get frequency 1. Blank lines and lines
    /// starting with `#` are ignored. `origin` names the source in errors.
    pub fn from_frequency_text(text: &str, origin: &str) -> Result<Self> {
        let mut dictionary = SpellingDictionary::new();
        for (line_no, line) in text.lines().enumerate() {
            let entry = parse_line(line)
                .map_err(|e| EmogifError::config(format!("{origin}:{}: {e}", line_no + 1)))?;
            if let Some((word, frequency)) = entry {
                dictionary.add_word(word, frequency);
            }
        }
        Ok(dictionary)
    }

    /// Load a frequency file, see [`SpellingDictionary::from_frequency_text`].
    pub fn load_from_frequency_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::from_frequency_text(&text, &path.display().to_string())
    }

    /// CRC32 over every word and frequency in word order. Two dictionaries
    /// with the same entries have the same checksum.
    pub fn checksum(&self) -> u32 {
        let mut entries: Vec<(&str, u32)> = self.iter().collect();
        entries.sort_unstable();

        let mut hasher = crc32fast::Hasher::new();
        for (word, frequency) in entries {
            hasher.update(word.as_bytes());
            hasher.update(&[0]);
            hasher.update(&frequency.to_le_bytes());
        }
        hasher.finalize()
    }
}

/// The built-in English dictionary.
pub struct BuiltinDictionary;

impl BuiltinDictionary {
    /// The embedded frequency table plus every word produced by
    /// abbreviation and contraction expansion, so expanded text is never
    /// "corrected".
    pub fn english() -> SpellingDictionary {
        ENGLISH.clone()
    }

    /// Add expansion words to a dictionary with frequency 1 if missing.
    pub fn add_expansion_words(dictionary: &mut SpellingDictionary) {
        for word in AbbreviationFilter::expansion_words().chain(ContractionCharFilter::expansion_words())
        {
            dictionary.add_if_absent(word, 1);
        }
    }
}
