//! The closed set of emotions the classifier predicts.
//!
//! Source datasets label their rows with a wider vocabulary (`joy`, `worry`,
//! `hate`, ...). [`canonicalize`] folds those synonyms into one of the six
//! canonical tags and rejects everything else.
//!
//! # Examples
//!
//! ```
//! use emogif::emotion::{Emotion, canonicalize};
//!
//! assert_eq!(canonicalize("joy"), Some(Emotion::Happy));
//! assert_eq!(canonicalize("Worry"), Some(Emotion::Sad));
//! assert_eq!(canonicalize("boredom"), None);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::EmogifError;

/// A canonical emotion tag.
///
/// Variants are declared in the alphabetical order of their tags, so the
/// derived ordering matches the order used by the label encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Anger,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
}

impl Emotion {
    /// Every canonical emotion, in the order the product lists them.
    pub const ALL: [Emotion; 6] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Anger,
        Emotion::Fear,
        Emotion::Disgust,
        Emotion::Surprise,
    ];

    /// The lowercase tag of this emotion.
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Anger => "anger",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Surprise => "surprise",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = EmogifError;

    /// Parse an exact canonical tag. Synonyms are not accepted here; use
    /// [`canonicalize`] for raw dataset labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Emotion::ALL
            .iter()
            .copied()
            .find(|emotion| emotion.as_str() == s)
            .ok_or_else(|| EmogifError::invalid_label(s))
    }
}

/// Raw dataset labels that fold into a canonical emotion.
pub const LABEL_SYNONYMS: &[(&str, Emotion)] = &[
    ("sadness", Emotion::Sad),
    ("worry", Emotion::Sad),
    ("happiness", Emotion::Happy),
    ("enthusiasm", Emotion::Happy),
    ("fun", Emotion::Happy),
    ("joy", Emotion::Happy),
    ("love", Emotion::Happy),
    ("hate", Emotion::Disgust),
];

static LABEL_TABLE: LazyLock<HashMap<&'static str, Emotion>> = LazyLock::new(|| {
    Emotion::ALL
        .iter()
        .map(|emotion| (emotion.as_str(), *emotion))
        .chain(LABEL_SYNONYMS.iter().copied())
        .collect()
});

/// Map a raw dataset label to its canonical emotion.
///
/// The label is trimmed and lowercased first. Returns `None` for labels that
/// are neither canonical nor a known synonym; such rows are dropped during
/// ingestion.
pub fn canonicalize(raw: &str) -> Option<Emotion> {
    let key = raw.trim().to_lowercase();
    LABEL_TABLE.get(key.as_str()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_tags_map_to_themselves() {
        for emotion in Emotion::ALL {
            assert_eq!(canonicalize(emotion.as_str()), Some(emotion));
        }
    }

    #[test]
    fn test_synonyms() {
        for raw in ["joy", "love", "fun", "enthusiasm", "happiness"] {
            assert_eq!(canonicalize(raw), Some(Emotion::Happy), "{raw}");
        }
        assert_eq!(canonicalize("sadness"), Some(Emotion::Sad));
        assert_eq!(canonicalize("worry"), Some(Emotion::Sad));
        assert_eq!(canonicalize("hate"), Some(Emotion::Disgust));
    }

    #[test]
    fn test_case_and_whitespace_are_ignored() {
        assert_eq!(canonicalize("  JOY "), Some(Emotion::Happy));
        assert_eq!(canonicalize("Surprise"), Some(Emotion::Surprise));
    }

    #[test]
    fn test_unknown_labels_are_invalid() {
        for raw in ["neutral", "boredom", "relief", "empty", ""] {
            assert_eq!(canonicalize(raw), None, "{raw}");
        }
    }

    #[test]
    fn test_from_str_and_display() {
        assert_eq!("fear".parse::<Emotion>().unwrap(), Emotion::Fear);
        assert!("joy".parse::<Emotion>().is_err());
        assert_eq!(Emotion::Disgust.to_string(), "disgust");
    }

    #[test]
    fn test_ordering_matches_tag_order() {
        let mut by_tag = Emotion::ALL.to_vec();
        by_tag.sort_by_key(|e| e.as_str());
        let mut by_ord = Emotion::ALL.to_vec();
        by_ord.sort();
        assert_eq!(by_tag, by_ord);
    }
}
