//! Single-text emotion prediction against the installed model.
//!
//! The predictor starts empty and answers [`EmogifError::NotReady`] until a
//! model is installed. Installed models are never mutated; concurrent
//! callers share one `Arc` under a read lock.

use std::sync::Arc;

use log::{debug, info};
use parking_lot::RwLock;

use crate::analysis::normalizer::TextNormalizer;
use crate::emotion::Emotion;
use crate::error::{EmogifError, Result};
use crate::ml::trainer::TrainedModel;

struct Installed {
    model: Arc<TrainedModel>,
    normalizer: Arc<TextNormalizer>,
}

/// Thread-safe emotion predictor.
#[derive(Default)]
pub struct Predictor {
    installed: RwLock<Option<Installed>>,
}

impl Predictor {
    pub fn new() -> Self {
        Predictor::default()
    }

    /// Create a predictor with a model already installed.
    pub fn with_model(model: Arc<TrainedModel>) -> Result<Self> {
        let predictor = Predictor::new();
        predictor.install(model)?;
        Ok(predictor)
    }

    /// Install a model, replacing any previous one. The normalizer is rebuilt
    /// from the settings stored with the model and must load the same
    /// spelling dictionary the model was trained with.
    pub fn install(&self, model: Arc<TrainedModel>) -> Result<()> {
        let normalizer = Arc::new(TextNormalizer::with_settings(model.normalizer.clone())?);
        let checksum = normalizer.dictionary_checksum();
        if checksum != model.dictionary_checksum {
            return Err(EmogifError::model(format!(
                "spelling dictionary {} differs from the one the model was trained with \
                 (checksum {checksum:x?}, expected {:x?}); retrain the model",
                model
                    .normalizer
                    .spelling
                    .dictionary_path
                    .as_deref()
                    .unwrap_or("<built-in>"),
                model.dictionary_checksum
            )));
        }
        info!(
            "Installed model created at {} (test score {:?})",
            model.metadata.created_at, model.metadata.test_score
        );
        *self.installed.write() = Some(Installed { model, normalizer });
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.installed.read().is_some()
    }

    /// The installed model, if any.
    pub fn model(&self) -> Option<Arc<TrainedModel>> {
        self.installed.read().as_ref().map(|i| Arc::clone(&i.model))
    }

    /// Classify raw text.
    pub fn predict(&self, text: &str) -> Result<Emotion> {
        let (model, normalizer) = {
            let guard = self.installed.read();
            let installed = guard
                .as_ref()
                .ok_or_else(|| EmogifError::not_ready("no model has been loaded or trained"))?;
            (Arc::clone(&installed.model), Arc::clone(&installed.normalizer))
        };

        let tokens = normalizer.normalize(text)?;
        let emotion = model.predict_tokens(&tokens)?;
        debug!("Predicted {emotion} for tokens {tokens:?}");
        Ok(emotion)
    }
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_before_install() {
        let predictor = Predictor::new();
        assert!(!predictor.is_ready());
        assert!(predictor.model().is_none());
        assert!(matches!(
            predictor.predict("hello"),
            Err(EmogifError::NotReady(_))
        ));
    }
}
