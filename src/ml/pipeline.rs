//! Vectorizer and ensemble fitted as one unit.

use serde::{Deserialize, Serialize};

use crate::error::{EmogifError, Result};
use crate::ml::logistic::LogisticParams;
use crate::ml::stacking::StackingClassifier;
use crate::ml::svm::SvcParams;
use crate::ml::tfidf::TfIdfVectorizer;
use crate::ml::{Classifier, accuracy};

/// Hyperparameters of one pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineParams {
    pub logistic: LogisticParams,
    pub svm: SvcParams,
    /// Folds used for the stacking meta features.
    pub stacking_cv: usize,
}

/// TF-IDF vectorizer followed by the stacked ensemble. Operates on token
/// lists and class codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionPipeline {
    params: PipelineParams,
    vectorizer: TfIdfVectorizer,
    classifier: StackingClassifier,
}

impl EmotionPipeline {
    pub fn new(params: PipelineParams) -> Self {
        let classifier = StackingClassifier::new(
            params.logistic.clone(),
            params.svm.clone(),
            params.stacking_cv,
        );
        EmotionPipeline {
            params,
            vectorizer: TfIdfVectorizer::new(),
            classifier,
        }
    }

    /// Reassemble a pipeline from fitted parts.
    pub fn from_parts(
        params: PipelineParams,
        vectorizer: TfIdfVectorizer,
        classifier: StackingClassifier,
    ) -> Self {
        EmotionPipeline {
            params,
            vectorizer,
            classifier,
        }
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    pub fn vectorizer(&self) -> &TfIdfVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &StackingClassifier {
        &self.classifier
    }

    /// Fit the vectorizer and the ensemble on tokenized documents.
    pub fn fit(&mut self, documents: &[Vec<String>], labels: &[usize], n_classes: usize) -> Result<()> {
        if documents.len() != labels.len() {
            return Err(EmogifError::model(format!(
                "{} documents but {} labels",
                documents.len(),
                labels.len()
            )));
        }
        let features = self.vectorizer.fit_transform(documents)?;
        self.classifier.fit(&features, labels, n_classes)
    }

    pub fn predict(&self, tokens: &[String]) -> Result<usize> {
        let features = self.vectorizer.transform(tokens)?;
        self.classifier.predict(&features)
    }

    pub fn predict_batch(&self, documents: &[Vec<String>]) -> Result<Vec<usize>> {
        let features = self.vectorizer.transform_batch(documents)?;
        self.classifier.predict_batch(&features)
    }

    /// Mean accuracy on the given documents.
    pub fn score(&self, documents: &[Vec<String>], labels: &[usize]) -> Result<f64> {
        if documents.is_empty() {
            return Err(EmogifError::model("cannot score on an empty set"));
        }
        let predicted = self.predict_batch(documents)?;
        Ok(accuracy(&predicted, labels))
    }

    pub fn is_fitted(&self) -> bool {
        self.vectorizer.is_fitted() && self.classifier.is_fitted()
    }
}
