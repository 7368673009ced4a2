//! Spelling corrector used by the normalizer.
//!
//! A word the dictionary does not know is replaced by the closest known word:
//! smallest edit distance first, then the more frequent word, then the
//! lexicographically smaller one. When no word lies within `max_distance`
//! the original word is kept.
//!
//! Tokens reach the corrector before stemming, but normalized text fed back
//! in is already stemmed. A word is therefore also known when it is the
//! Porter stem of a dictionary word, or stems to one; `happi` and `worri`
//! stay as they are.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

use crate::analysis::token_filter::stem::{PorterStemmer, Stemmer};
use crate::error::Result;
use crate::spelling::dictionary::{BuiltinDictionary, SpellingDictionary};
use crate::spelling::levenshtein::damerau_levenshtein_threshold;

/// Configuration for the spelling corrector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectorConfig {
    /// Whether spelling correction runs at all.
    pub enabled: bool,
    /// Maximum edit distance for candidates.
    pub max_distance: usize,
    /// Optional `word frequency` file replacing the built-in word list.
    pub dictionary_path: Option<String>,
}

const DEFAULT_MAX_DISTANCE: usize = 2;

impl Default for CorrectorConfig {
    fn default() -> Self {
        CorrectorConfig {
            enabled: true,
            max_distance: DEFAULT_MAX_DISTANCE,
            dictionary_path: None,
        }
    }
}

impl CorrectorConfig {
    /// The dictionary this configuration selects: the file at
    /// `dictionary_path` or the built-in list, plus expansion words.
    pub fn load_dictionary(&self) -> Result<SpellingDictionary> {
        match &self.dictionary_path {
            Some(path) => {
                let mut dictionary = SpellingDictionary::load_from_frequency_file(Path::new(path))?;
                BuiltinDictionary::add_expansion_words(&mut dictionary);
                Ok(dictionary)
            }
            None => Ok(BuiltinDictionary::english()),
        }
    }
}

static DEFAULT_CORRECTOR: LazyLock<Arc<SpellingCorrector>> =
    LazyLock::new(|| Arc::new(SpellingCorrector::new()));

/// Spelling corrector over a fixed dictionary.
#[derive(Debug, Clone)]
pub struct SpellingCorrector {
    dictionary: SpellingDictionary,
    /// Dictionary words grouped by character length.
    by_length: BTreeMap<usize, Vec<(String, u32)>>,
    /// Porter stems of all dictionary words.
    stems: HashSet<String>,
    stemmer: PorterStemmer,
    checksum: u32,
    max_distance: usize,
}

impl SpellingCorrector {
    /// Create a corrector over the built-in English dictionary.
    pub fn new() -> Self {
        Self::with_dictionary(BuiltinDictionary::english(), DEFAULT_MAX_DISTANCE)
    }

    /// Create a corrector over a custom dictionary.
    pub fn with_dictionary(dictionary: SpellingDictionary, max_distance: usize) -> Self {
        let stemmer = PorterStemmer::new();
        let mut by_length: BTreeMap<usize, Vec<(String, u32)>> = BTreeMap::new();
        let mut stems = HashSet::with_capacity(dictionary.word_count());
        for (word, frequency) in dictionary.iter() {
            by_length
                .entry(word.chars().count())
                .or_default()
                .push((word.to_string(), frequency));
            stems.insert(stemmer.stem(word));
        }

        SpellingCorrector {
            checksum: dictionary.checksum(),
            dictionary,
            by_length,
            stems,
            stemmer,
            max_distance,
        }
    }

    /// Build a corrector from configuration.
    pub fn from_config(config: &CorrectorConfig) -> Result<Self> {
        Ok(Self::with_dictionary(config.load_dictionary()?, config.max_distance))
    }

    /// Like [`SpellingCorrector::from_config`], but the default configuration
    /// shares one process-wide corrector.
    pub fn shared(config: &CorrectorConfig) -> Result<Arc<Self>> {
        if config.dictionary_path.is_none() && config.max_distance == DEFAULT_MAX_DISTANCE {
            return Ok(Arc::clone(&DEFAULT_CORRECTOR));
        }
        Ok(Arc::new(Self::from_config(config)?))
    }

    /// Whether a word is known: a dictionary word, the stem of one, or a
    /// word stemming to the stem of one.
    pub fn is_known(&self, word: &str) -> bool {
        self.dictionary.contains(word)
            || self.stems.contains(word)
            || self.stems.contains(&self.stemmer.stem(word))
    }

    /// Whether a word is subject to correction at all.
    ///
    /// Numeric tokens, multi-word entries and words far longer than any
    /// dictionary word are never checked.
    fn is_checkable(&self, word: &str) -> bool {
        !word.is_empty()
            && !word.chars().any(char::is_whitespace)
            && !word.chars().all(|c| c.is_ascii_digit())
            && word.chars().count() <= self.dictionary.max_word_len() + self.max_distance
    }

    /// Best correction for an unknown word, or `None` when the word is known,
    /// not checkable, or has no candidate within the distance limit.
    pub fn correction(&self, word: &str) -> Option<String> {
        if !self.is_checkable(word) || self.is_known(word) {
            return None;
        }

        let len = word.chars().count();
        let lo = len.saturating_sub(self.max_distance);
        let hi = len + self.max_distance;

        self.by_length
            .range(lo..=hi)
            .flat_map(|(_, words)| words.iter())
            .filter_map(|(candidate, frequency)| {
                damerau_levenshtein_threshold(word, candidate, self.max_distance)
                    .map(|distance| (distance, Reverse(*frequency), candidate))
            })
            .min()
            .map(|(_, _, candidate)| candidate.clone())
    }

    /// Correct a word, falling back to the word itself.
    pub fn correct(&self, word: &str) -> String {
        self.correction(word).unwrap_or_else(|| word.to_string())
    }

    /// The dictionary backing this corrector.
    pub fn dictionary(&self) -> &SpellingDictionary {
        &self.dictionary
    }

    /// [`SpellingDictionary::checksum`] of the backing dictionary.
    pub fn checksum(&self) -> u32 {
        self.checksum
    }
}

impl Default for SpellingCorrector {
    fn default() -> Self {
        Self::new()
    }
}
