//! Labeled datasets: ingestion of delimited sources and the train/test split.
//!
//! Rows move through three shapes. [`RawSample`] is what a source file holds,
//! [`LabeledSample`] carries a canonical [`Emotion`], and [`NormalizedSample`]
//! carries the normalizer's tokens in place of the text.

use serde::{Deserialize, Serialize};

use crate::emotion::Emotion;

pub mod ingest;
pub mod split;

pub use ingest::{ColumnSpec, DatasetIngestor, DatasetSource, IngestReport};
pub use split::{split, split_with_rng};

/// A row as read from a source, before label canonicalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSample {
    pub text: String,
    pub emotion_raw: String,
}

/// A row whose label has been folded into a canonical emotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledSample {
    pub text: String,
    pub emotion: Emotion,
}

impl LabeledSample {
    pub fn new<S: Into<String>>(text: S, emotion: Emotion) -> Self {
        LabeledSample {
            text: text.into(),
            emotion,
        }
    }
}

/// A row after normalization. `tokens` may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedSample {
    pub tokens: Vec<String>,
    pub emotion: Emotion,
}

impl NormalizedSample {
    pub fn new(tokens: Vec<String>, emotion: Emotion) -> Self {
        NormalizedSample { tokens, emotion }
    }
}
