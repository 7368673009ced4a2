//! Machine learning for emotion classification.
//!
//! The trained pipeline is a TF-IDF vectorizer followed by a stacked
//! ensemble: a logistic classifier and a kernel SVC whose outputs feed a
//! logistic meta-classifier. [`trainer::ModelTrainer`] drives randomized
//! hyperparameter search over the ensemble and returns a
//! [`trainer::TrainedModel`].
//!
//! Everything below [`pipeline`] works on integer class codes; the
//! [`label_encoder::LabelEncoder`] maps them to and from [`Emotion`]s.
//!
//! [`Emotion`]: crate::emotion::Emotion

pub mod label_encoder;
pub mod logistic;
pub mod model_selection;
pub mod pipeline;
pub mod search;
pub mod sparse;
pub mod stacking;
pub mod svm;
pub mod tfidf;
pub mod trainer;

use crate::error::Result;
use crate::ml::sparse::SparseVector;

/// A classifier over sparse feature vectors and dense class codes.
pub trait Classifier: Send + Sync {
    /// Fit on `features` with class codes `labels`, each `< n_classes`.
    fn fit(&mut self, features: &[SparseVector], labels: &[usize], n_classes: usize)
    -> Result<()>;

    /// Predict the class code of one sample.
    fn predict(&self, features: &SparseVector) -> Result<usize>;

    /// Predict the class codes of many samples.
    fn predict_batch(&self, features: &[SparseVector]) -> Result<Vec<usize>> {
        features.iter().map(|x| self.predict(x)).collect()
    }

    /// Whether `fit` has completed.
    fn is_fitted(&self) -> bool;
}

/// Fraction of predictions equal to the expected codes.
pub fn accuracy(predicted: &[usize], expected: &[usize]) -> f64 {
    if expected.is_empty() {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(expected)
        .filter(|(p, e)| p == e)
        .count();
    correct as f64 / expected.len() as f64
}
