//! Training and scoring of the complete emotion model.

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::analysis::normalizer::NormalizerSettings;
use crate::dataset::NormalizedSample;
use crate::emotion::Emotion;
use crate::error::{EmogifError, Result};
use crate::ml::label_encoder::LabelEncoder;
use crate::ml::pipeline::{EmotionPipeline, PipelineParams};
use crate::ml::search::{RandomizedSearch, SearchConfig};

/// Facts recorded about a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub created_at: DateTime<Utc>,
    /// Crate version that produced the model.
    pub version: String,
    /// Accuracy on the held-out testing set, once scored.
    pub test_score: Option<f64>,
    /// Mean cross-validated accuracy of the chosen configuration.
    pub best_cv_score: f64,
    pub best_params: PipelineParams,
    pub training_samples: usize,
    pub testing_samples: usize,
}

/// An immutable trained model: pipeline, label encoder, normalizer settings
/// and metadata. Shared behind an `Arc` once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    pub metadata: ModelMetadata,
    pub normalizer: NormalizerSettings,
    /// Checksum of the spelling dictionary used in training, if any.
    pub dictionary_checksum: Option<u32>,
    pub pipeline: EmotionPipeline,
    pub labels: LabelEncoder,
}

impl TrainedModel {
    /// Classify already normalized tokens.
    pub fn predict_tokens(&self, tokens: &[String]) -> Result<Emotion> {
        let code = self.pipeline.predict(tokens)?;
        self.labels.decode(code)
    }

    /// Accuracy on normalized samples.
    pub fn score(&self, samples: &[NormalizedSample]) -> Result<f64> {
        if samples.is_empty() {
            return Err(EmogifError::model("the testing set is empty"));
        }
        let documents: Vec<Vec<String>> = samples.iter().map(|s| s.tokens.clone()).collect();
        let expected: Vec<usize> = samples
            .iter()
            .map(|s| self.labels.encode(s.emotion))
            .collect::<Result<_>>()?;
        self.pipeline.score(&documents, &expected)
    }
}

/// Runs the hyperparameter search and assembles the [`TrainedModel`].
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    search: SearchConfig,
    normalizer: NormalizerSettings,
    dictionary_checksum: Option<u32>,
}

impl ModelTrainer {
    pub fn new(search: SearchConfig, normalizer: NormalizerSettings) -> Self {
        ModelTrainer {
            search,
            normalizer,
            dictionary_checksum: None,
        }
    }

    /// Record the checksum of the spelling dictionary the training data was
    /// normalized with.
    pub fn with_dictionary_checksum(mut self, checksum: Option<u32>) -> Self {
        self.dictionary_checksum = checksum;
        self
    }

    /// Train on normalized samples. Labels are encoded with `labels`, which
    /// must have been fitted on the same training set.
    pub fn train(&self, training: &[NormalizedSample], labels: &LabelEncoder) -> Result<TrainedModel> {
        if training.is_empty() {
            return Err(EmogifError::model("the training set is empty"));
        }

        let documents: Vec<Vec<String>> = training.iter().map(|s| s.tokens.clone()).collect();
        let codes: Vec<usize> = training
            .iter()
            .map(|s| labels.encode(s.emotion))
            .collect::<Result<_>>()?;

        let outcome = RandomizedSearch::new(self.search.clone()).fit(
            &documents,
            &codes,
            labels.n_classes(),
        )?;
        info!(
            "Selected candidate {} of {} (cv accuracy {:.4})",
            outcome.best_index + 1,
            outcome.candidates.len(),
            outcome.best_score
        );

        Ok(TrainedModel {
            metadata: ModelMetadata {
                created_at: Utc::now(),
                version: crate::VERSION.to_string(),
                test_score: None,
                best_cv_score: outcome.best_score,
                best_params: outcome.best.params().clone(),
                training_samples: training.len(),
                testing_samples: 0,
            },
            normalizer: self.normalizer.clone(),
            dictionary_checksum: self.dictionary_checksum,
            pipeline: outcome.best,
            labels: labels.clone(),
        })
    }

    /// Score a model on the testing set and record the result in its metadata.
    pub fn score(model: &mut TrainedModel, testing: &[NormalizedSample]) -> Result<f64> {
        let score = model.score(testing)?;
        model.metadata.test_score = Some(score);
        model.metadata.testing_samples = testing.len();
        Ok(score)
    }
}
