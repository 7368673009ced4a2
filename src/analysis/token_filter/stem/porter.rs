//! Porter stemming algorithm.
//!
//! The 1980 algorithm: suffix stripping in five steps, each gated on the
//! measure `m` of the remaining stem (the number of vowel-consonant runs).
//! Only the longest matching suffix of a rule group is considered; if its
//! condition fails the group leaves the word alone.
//!
//! # Examples
//!
//! ```
//! use emogif::analysis::token_filter::stem::Stemmer;
//! use emogif::analysis::token_filter::stem::porter::PorterStemmer;
//!
//! let stemmer = PorterStemmer::new();
//!
//! assert_eq!(stemmer.stem("running"), "run");
//! assert_eq!(stemmer.stem("happy"), "happi");
//! assert_eq!(stemmer.stem("generalization"), "gener");
//! ```

use crate::analysis::token_filter::stem::Stemmer;

const STEP2_RULES: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("abli", "able"),
    ("alli", "al"),
    ("entli", "ent"),
    ("eli", "e"),
    ("ousli", "ous"),
    ("ization", "ize"),
    ("ation", "ate"),
    ("ator", "ate"),
    ("alism", "al"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("biliti", "ble"),
];

const STEP3_RULES: &[(&str, &str)] = &[
    ("icate", "ic"),
    ("ative", ""),
    ("alize", "al"),
    ("iciti", "ic"),
    ("ical", "ic"),
    ("ful", ""),
    ("ness", ""),
];

const STEP4_SUFFIXES: &[&str] = &[
    "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ion", "ou",
    "ism", "ate", "iti", "ous", "ive", "ize",
];

/// Porter stemmer for lowercase English words.
#[derive(Debug, Clone, Copy, Default)]
pub struct PorterStemmer;

impl PorterStemmer {
    /// Create a new Porter stemmer.
    pub fn new() -> Self {
        PorterStemmer
    }

    /// Whether the byte at `i` is a consonant in the Porter sense.
    fn is_consonant(word: &[u8], i: usize) -> bool {
        match word[i] {
            b'a' | b'e' | b'i' | b'o' | b'u' => false,
            b'y' => i == 0 || !Self::is_consonant(word, i - 1),
            _ => true,
        }
    }

    /// The number of vowel-consonant sequences in `word`.
    fn measure(word: &[u8]) -> usize {
        let n = word.len();
        let mut i = 0;
        let mut m = 0;

        while i < n && Self::is_consonant(word, i) {
            i += 1;
        }
        while i < n {
            while i < n && !Self::is_consonant(word, i) {
                i += 1;
            }
            if i >= n {
                break;
            }
            m += 1;
            while i < n && Self::is_consonant(word, i) {
                i += 1;
            }
        }

        m
    }

    fn contains_vowel(word: &[u8]) -> bool {
        (0..word.len()).any(|i| !Self::is_consonant(word, i))
    }

    fn ends_double_consonant(word: &[u8]) -> bool {
        let n = word.len();
        n >= 2 && word[n - 1] == word[n - 2] && Self::is_consonant(word, n - 1)
    }

    /// consonant-vowel-consonant ending, where the last consonant is not w, x or y.
    fn ends_cvc(word: &[u8]) -> bool {
        let n = word.len();
        n >= 3
            && Self::is_consonant(word, n - 3)
            && !Self::is_consonant(word, n - 2)
            && Self::is_consonant(word, n - 1)
            && !matches!(word[n - 1], b'w' | b'x' | b'y')
    }

    fn replace_suffix(word: &mut Vec<u8>, suffix_len: usize, replacement: &str) {
        word.truncate(word.len() - suffix_len);
        word.extend_from_slice(replacement.as_bytes());
    }

    fn step1a(word: &mut Vec<u8>) {
        if word.ends_with(b"sses") {
            Self::replace_suffix(word, 4, "ss");
        } else if word.ends_with(b"ies") {
            Self::replace_suffix(word, 3, "i");
        } else if word.ends_with(b"ss") {
        } else if word.ends_with(b"s") {
            word.pop();
        }
    }

    fn step1b(word: &mut Vec<u8>) {
        if word.ends_with(b"eed") {
            if Self::measure(&word[..word.len() - 3]) > 0 {
                word.pop();
            }
            return;
        }

        let suffix_len = if word.ends_with(b"ed") {
            2
        } else if word.ends_with(b"ing") {
            3
        } else {
            return;
        };
        if !Self::contains_vowel(&word[..word.len() - suffix_len]) {
            return;
        }
        word.truncate(word.len() - suffix_len);

        if word.ends_with(b"at") || word.ends_with(b"bl") || word.ends_with(b"iz") {
            word.push(b'e');
        } else if Self::ends_double_consonant(word)
            && !matches!(word.last(), Some(b'l' | b's' | b'z'))
        {
            word.pop();
        } else if Self::measure(word) == 1 && Self::ends_cvc(word) {
            word.push(b'e');
        }
    }

    fn step1c(word: &mut Vec<u8>) {
        if word.ends_with(b"y") && Self::contains_vowel(&word[..word.len() - 1]) {
            let last = word.len() - 1;
            word[last] = b'i';
        }
    }

    /// Apply the first rule whose suffix matches, if the stem measure exceeds `min_measure`.
    fn apply_rules(word: &mut Vec<u8>, rules: &[(&str, &str)], min_measure: usize) {
        if let Some((suffix, replacement)) = rules
            .iter()
            .find(|(suffix, _)| word.ends_with(suffix.as_bytes()))
        {
            if Self::measure(&word[..word.len() - suffix.len()]) > min_measure {
                Self::replace_suffix(word, suffix.len(), replacement);
            }
        }
    }

    fn step4(word: &mut Vec<u8>) {
        let Some(suffix) = STEP4_SUFFIXES
            .iter()
            .filter(|suffix| word.ends_with(suffix.as_bytes()))
            .max_by_key(|suffix| suffix.len())
        else {
            return;
        };

        let stem = &word[..word.len() - suffix.len()];
        if Self::measure(stem) <= 1 {
            return;
        }
        if *suffix == "ion" && !matches!(stem.last(), Some(b's' | b't')) {
            return;
        }
        word.truncate(stem.len());
    }

    fn step5(word: &mut Vec<u8>) {
        if word.ends_with(b"e") {
            let stem = &word[..word.len() - 1];
            let m = Self::measure(stem);
            if m > 1 || (m == 1 && !Self::ends_cvc(stem)) {
                word.pop();
            }
        }

        if word.ends_with(b"ll") && Self::measure(word) > 1 {
            word.pop();
        }
    }
}

impl Stemmer for PorterStemmer {
    fn stem(&self, word: &str) -> String {
        if word.len() <= 2 || !word.is_ascii() {
            return word.to_string();
        }

        let mut bytes = word.to_ascii_lowercase().into_bytes();
        Self::step1a(&mut bytes);
        Self::step1b(&mut bytes);
        Self::step1c(&mut bytes);
        Self::apply_rules(&mut bytes, STEP2_RULES, 0);
        Self::apply_rules(&mut bytes, STEP3_RULES, 0);
        Self::step4(&mut bytes);
        Self::step5(&mut bytes);

        // only ASCII bytes were removed or appended
        String::from_utf8(bytes).unwrap_or_else(|_| word.to_string())
    }

    fn name(&self) -> &'static str {
        "porter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_stems(pairs: &[(&str, &str)]) {
        let stemmer = PorterStemmer::new();
        for (word, expected) in pairs {
            assert_eq!(stemmer.stem(word), *expected, "stem({word})");
        }
    }

    #[test]
    fn test_step1() {
        assert_stems(&[
            ("caresses", "caress"),
            ("ponies", "poni"),
            ("ties", "ti"),
            ("caress", "caress"),
            ("cats", "cat"),
            ("feed", "feed"),
            ("agreed", "agre"),
            ("plastered", "plaster"),
            ("motoring", "motor"),
            ("sing", "sing"),
            ("conflated", "conflat"),
            ("hopping", "hop"),
            ("filing", "file"),
            ("happy", "happi"),
            ("sky", "sky"),
        ]);
    }

    #[test]
    fn test_later_steps() {
        assert_stems(&[
            ("relational", "relat"),
            ("conditional", "condit"),
            ("rational", "ration"),
            ("generalization", "gener"),
            ("hopeful", "hope"),
            ("goodness", "good"),
            ("adjustment", "adjust"),
            ("adoption", "adopt"),
            ("controll", "control"),
            ("roll", "roll"),
            ("believe", "believ"),
            ("laughing", "laugh"),
        ]);
    }

    #[test]
    fn test_short_and_non_ascii_words_unchanged() {
        assert_stems(&[("is", "is"), ("a", "a"), ("caf\u{e9}s", "caf\u{e9}s")]);
    }

    #[test]
    fn test_measure() {
        assert_eq!(PorterStemmer::measure(b"tree"), 0);
        assert_eq!(PorterStemmer::measure(b"trees"), 1);
        assert_eq!(PorterStemmer::measure(b"trouble"), 1);
        assert_eq!(PorterStemmer::measure(b"troubles"), 2);
        assert_eq!(PorterStemmer::measure(b"private"), 2);
    }

    #[test]
    fn test_stemmed_output_is_stable_for_common_stems() {
        let stemmer = PorterStemmer::new();
        for word in ["run", "happi", "sad", "laugh", "angri"] {
            assert_eq!(stemmer.stem(word), word);
        }
    }
}
