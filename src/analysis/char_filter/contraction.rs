//! Contraction expansion.
//!
//! The table holds the apostrophe forms and, because punctuation is stripped
//! before this filter runs in the normalizer, the apostrophe-free spellings
//! that are not ordinary English words on their own (`dont`, `cant`, `im`).
//! Ambiguous spellings such as `well`, `were`, `its`, `ill`, `hell`, `wed`,
//! `id` and `lets` are left alone. Common slang contractions are expanded too.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::CharFilter;

/// Contraction table, keyed by lowercase surface form.
pub const CONTRACTIONS: &[(&str, &str)] = &[
    ("ain't", "are not"),
    ("aren't", "are not"),
    ("can't", "can not"),
    ("can't've", "can not have"),
    ("could've", "could have"),
    ("couldn't", "could not"),
    ("didn't", "did not"),
    ("doesn't", "does not"),
    ("don't", "do not"),
    ("hadn't", "had not"),
    ("hasn't", "has not"),
    ("haven't", "have not"),
    ("he'd", "he would"),
    ("he'll", "he will"),
    ("he's", "he is"),
    ("how'd", "how did"),
    ("how'll", "how will"),
    ("how's", "how is"),
    ("i'd", "i would"),
    ("i'll", "i will"),
    ("i'm", "i am"),
    ("i've", "i have"),
    ("isn't", "is not"),
    ("it'd", "it would"),
    ("it'll", "it will"),
    ("it's", "it is"),
    ("let's", "let us"),
    ("ma'am", "madam"),
    ("might've", "might have"),
    ("mightn't", "might not"),
    ("must've", "must have"),
    ("mustn't", "must not"),
    ("needn't", "need not"),
    ("o'clock", "of the clock"),
    ("shan't", "shall not"),
    ("she'd", "she would"),
    ("she'll", "she will"),
    ("she's", "she is"),
    ("should've", "should have"),
    ("shouldn't", "should not"),
    ("that'd", "that would"),
    ("that's", "that is"),
    ("there'd", "there would"),
    ("there's", "there is"),
    ("they'd", "they would"),
    ("they'll", "they will"),
    ("they're", "they are"),
    ("they've", "they have"),
    ("wasn't", "was not"),
    ("we'd", "we would"),
    ("we'll", "we will"),
    ("we're", "we are"),
    ("we've", "we have"),
    ("weren't", "were not"),
    ("what'll", "what will"),
    ("what're", "what are"),
    ("what's", "what is"),
    ("what've", "what have"),
    ("when's", "when is"),
    ("where'd", "where did"),
    ("where's", "where is"),
    ("who'd", "who would"),
    ("who'll", "who will"),
    ("who's", "who is"),
    ("who've", "who have"),
    ("why's", "why is"),
    ("won't", "will not"),
    ("would've", "would have"),
    ("wouldn't", "would not"),
    ("y'all", "you all"),
    ("you'd", "you would"),
    ("you'll", "you will"),
    ("you're", "you are"),
    ("you've", "you have"),
    // apostrophe-free spellings
    ("aint", "are not"),
    ("arent", "are not"),
    ("cant", "can not"),
    ("couldve", "could have"),
    ("couldnt", "could not"),
    ("didnt", "did not"),
    ("doesnt", "does not"),
    ("dont", "do not"),
    ("hadnt", "had not"),
    ("hasnt", "has not"),
    ("havent", "have not"),
    ("hes", "he is"),
    ("im", "i am"),
    ("isnt", "is not"),
    ("ive", "i have"),
    ("mightve", "might have"),
    ("mustve", "must have"),
    ("mustnt", "must not"),
    ("shouldve", "should have"),
    ("shouldnt", "should not"),
    ("thats", "that is"),
    ("theres", "there is"),
    ("theyd", "they would"),
    ("theyll", "they will"),
    ("theyre", "they are"),
    ("theyve", "they have"),
    ("wasnt", "was not"),
    ("werent", "were not"),
    ("weve", "we have"),
    ("whats", "what is"),
    ("wont", "will not"),
    ("wouldve", "would have"),
    ("wouldnt", "would not"),
    ("yall", "you all"),
    ("youd", "you would"),
    ("youll", "you will"),
    ("youre", "you are"),
    ("youve", "you have"),
    // slang
    ("gimme", "give me"),
    ("gonna", "going to"),
    ("gotta", "got to"),
    ("lemme", "let me"),
    ("wanna", "want to"),
    ("dunno", "do not know"),
    ("kinda", "kind of"),
    ("sorta", "sort of"),
    ("outta", "out of"),
    ("tryna", "trying to"),
    ("coulda", "could have"),
    ("shoulda", "should have"),
    ("woulda", "would have"),
];

static CONTRACTION_MAP: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| CONTRACTIONS.iter().copied().collect());

/// Built once: longest keys first so `can't've` wins over `can't`.
static CONTRACTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let mut keys: Vec<&str> = CONTRACTIONS.iter().map(|(key, _)| *key).collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    let alternation = keys
        .iter()
        .map(|key| regex::escape(key))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b"))
        .expect("escaped contraction keys form a valid pattern")
});

/// Expands contractions found at word boundaries.
#[derive(Clone, Debug, Default)]
pub struct ContractionCharFilter;

impl ContractionCharFilter {
    pub fn new() -> Self {
        ContractionCharFilter
    }

    /// Look up the expansion of a single contraction.
    pub fn expansion(word: &str) -> Option<&'static str> {
        CONTRACTION_MAP.get(word).copied()
    }

    /// Every word produced by some expansion.
    pub fn expansion_words() -> impl Iterator<Item = &'static str> {
        CONTRACTIONS
            .iter()
            .flat_map(|(_, expansion)| expansion.split_whitespace())
    }
}

impl CharFilter for ContractionCharFilter {
    fn filter(&self, input: &str) -> String {
        CONTRACTION_PATTERN
            .replace_all(input, |caps: &Captures| {
                let matched = &caps[0];
                Self::expansion(matched).unwrap_or(matched).to_string()
            })
            .into_owned()
    }

    fn name(&self) -> &'static str {
        "contraction"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apostrophe_free_forms() {
        let filter = ContractionCharFilter::new();
        assert_eq!(filter.filter("i cant believe it"), "i can not believe it");
        assert_eq!(filter.filter("im sure you dont"), "i am sure you do not");
        assert_eq!(filter.filter("gonna wanna"), "going to want to");
    }

    #[test]
    fn test_apostrophe_forms() {
        let filter = ContractionCharFilter::new();
        assert_eq!(filter.filter("i can't've"), "i can not have");
        assert_eq!(filter.filter("they're here"), "they are here");
    }

    #[test]
    fn test_ambiguous_words_untouched() {
        let filter = ContractionCharFilter::new();
        let input = "well we were ill and its hell";
        assert_eq!(filter.filter(input), input);
    }

    #[test]
    fn test_word_boundaries() {
        let filter = ContractionCharFilter::new();
        assert_eq!(filter.filter("imagine"), "imagine");
        assert_eq!(filter.filter("dontcha"), "dontcha");
    }
}
