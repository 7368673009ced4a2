//! Label encoder mapping emotions to dense class codes.

use serde::{Deserialize, Serialize};

use crate::emotion::Emotion;
use crate::error::{EmogifError, Result};

/// Maps the emotions seen in training to codes `0..k`, in tag order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<Emotion>,
}

impl LabelEncoder {
    pub fn new() -> Self {
        LabelEncoder::default()
    }

    /// Fit from the labels of a training set.
    pub fn fit<I: IntoIterator<Item = Emotion>>(labels: I) -> Result<Self> {
        let mut classes: Vec<Emotion> = labels.into_iter().collect();
        classes.sort();
        classes.dedup();
        if classes.is_empty() {
            return Err(EmogifError::model("cannot fit a label encoder without labels"));
        }
        Ok(LabelEncoder { classes })
    }

    pub fn encode(&self, emotion: Emotion) -> Result<usize> {
        self.classes
            .binary_search(&emotion)
            .map_err(|_| EmogifError::invalid_label(format!("{emotion} was not seen in training")))
    }

    pub fn encode_all(&self, emotions: &[Emotion]) -> Result<Vec<usize>> {
        emotions.iter().map(|e| self.encode(*e)).collect()
    }

    pub fn decode(&self, code: usize) -> Result<Emotion> {
        self.classes.get(code).copied().ok_or_else(|| {
            EmogifError::invalid_label(format!(
                "class code {code} is out of range for {} classes",
                self.classes.len()
            ))
        })
    }

    pub fn classes(&self) -> &[Emotion] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}
