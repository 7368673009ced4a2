//! Load-or-train orchestration.
//!
//! At start-up the engine loads the model file if one exists. Otherwise it
//! runs the full training job under the training lock:
//!
//! 1. ingest the sources and split them (or reuse the preprocessed cache),
//! 2. normalize both halves and cache them,
//! 3. search hyperparameters and fit the ensemble,
//! 4. score on the testing half and save the model.
//!
//! A process that finds the lock held waits for it and then loads whatever
//! the holder wrote.

use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::analysis::normalizer::TextNormalizer;
use crate::config::EmogifConfig;
use crate::dataset::{DatasetIngestor, split};
use crate::error::{EmogifError, Result};
use crate::ml::label_encoder::LabelEncoder;
use crate::ml::trainer::{ModelTrainer, TrainedModel};
use crate::predictor::Predictor;
use crate::storage::lock::TrainingLock;
use crate::storage::{PreprocessedData, load_model, save_model};

/// Where the model returned by [`Engine::load_or_train`] came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelSource {
    /// Read from the model file.
    Loaded,
    /// Written by another process while this one waited for the lock.
    LoadedAfterWait,
    /// Trained by this process.
    Trained,
}

/// A model ready for prediction.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub model: Arc<TrainedModel>,
    pub source: ModelSource,
}

/// Training and loading driver.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EmogifConfig,
}

impl Engine {
    pub fn new(config: EmogifConfig) -> Result<Self> {
        config.validate_for_inference()?;
        Ok(Engine { config })
    }

    pub fn config(&self) -> &EmogifConfig {
        &self.config
    }

    fn model_path(&self) -> &Path {
        &self.config.model_path
    }

    /// Load the model file without ever training.
    pub fn load(&self) -> Result<Arc<TrainedModel>> {
        Ok(Arc::new(load_model(self.model_path())?))
    }

    /// Load the model, or train one when none exists. `force` trains even
    /// when a model file is present.
    pub fn load_or_train(&self, force: bool) -> Result<LoadOutcome> {
        if !force {
            if let Some(model) = self.try_load()? {
                return Ok(LoadOutcome {
                    model,
                    source: ModelSource::Loaded,
                });
            }
        }

        self.config.validate()?;

        loop {
            if let Some(outcome) = self.try_train_exclusive(force)? {
                return Ok(outcome);
            }

            TrainingLock::wait_for_release(self.model_path(), &self.config.lock)?;
            if force {
                continue;
            }
            if let Some(model) = self.try_load()? {
                return Ok(LoadOutcome {
                    model,
                    source: ModelSource::LoadedAfterWait,
                });
            }
            warn!("The other training run left no model behind; training here");
        }
    }

    /// Take the training lock once and, holding it, produce a model.
    ///
    /// Unless `force` is set, a model written by another process between the
    /// caller's first look and the lock acquisition is loaded instead of
    /// trained over. `Ok(None)` means the lock is held elsewhere.
    pub fn try_train_exclusive(&self, force: bool) -> Result<Option<LoadOutcome>> {
        let Some(lock) = TrainingLock::try_acquire(self.model_path())? else {
            return Ok(None);
        };

        if !force {
            if let Some(model) = self.try_load()? {
                debug!("Model appeared before the lock was taken; not retraining");
                return Ok(Some(LoadOutcome {
                    model,
                    source: ModelSource::LoadedAfterWait,
                }));
            }
        }

        let model = self.train()?;
        save_model(&model, self.model_path())?;
        drop(lock);
        Ok(Some(LoadOutcome {
            model: Arc::new(model),
            source: ModelSource::Trained,
        }))
    }

    /// `Ok(None)` when there is nothing usable to load and training should
    /// run.
    fn try_load(&self) -> Result<Option<Arc<TrainedModel>>> {
        match load_model(self.model_path()) {
            Ok(model) => Ok(Some(Arc::new(model))),
            Err(EmogifError::ArtifactNotFound(path)) => {
                info!("No model at {}; training a new one", path.display());
                Ok(None)
            }
            Err(err @ EmogifError::CorruptArtifact { .. }) => {
                if self.config.retrain_on_corrupt {
                    warn!("{err}; retraining");
                    Ok(None)
                } else {
                    Err(err)
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Ingest, split, normalize and cache the datasets.
    pub fn preprocess(&self) -> Result<PreprocessedData> {
        if self.config.reuse_preprocessed {
            match PreprocessedData::load(&self.config.preprocessed_path) {
                Ok(data) => {
                    info!(
                        "Reusing preprocessed data from {} ({} training, {} testing rows)",
                        self.config.preprocessed_path.display(),
                        data.training.len(),
                        data.testing.len()
                    );
                    return Ok(data);
                }
                Err(e) => warn!("Cannot reuse preprocessed data: {e}"),
            }
        }

        info!("Preparing dataset.");
        self.config.validate_datasets()?;
        let rows = DatasetIngestor::new(self.config.datasets.clone(), self.config.columns.clone())
            .ingest()?;
        let total = rows.len();
        let (training, testing) = split(rows, self.config.training_fraction)?;
        info!(
            "Split {total} rows into {} training and {} testing rows",
            training.len(),
            testing.len()
        );
        info!("Finished preparing dataset.");

        info!("Preprocessing dataset.");
        let normalizer = TextNormalizer::with_settings(self.config.normalizer.clone())?;
        let training = normalizer.normalize_column(training)?;
        let testing = normalizer.normalize_column(testing)?;
        let labels = LabelEncoder::fit(training.iter().map(|s| s.emotion))?;
        let data = PreprocessedData {
            training,
            testing,
            labels,
        };
        data.save(&self.config.preprocessed_path)?;
        info!("Finished preprocessing dataset.");

        Ok(data)
    }

    /// Run the full training job and return the scored model. Does not
    /// write the model file.
    pub fn train(&self) -> Result<TrainedModel> {
        let data = self.preprocess()?;

        info!("Training model.");
        let trainer = ModelTrainer::new(self.config.search.clone(), self.config.normalizer.clone())
            .with_dictionary_checksum(self.config.normalizer.dictionary_checksum()?);
        let mut model = trainer.train(&data.training, &data.labels)?;
        info!("Finished training model.");

        if data.testing.is_empty() {
            warn!("The testing set is empty; the model is not scored");
        } else {
            info!("Scoring model.");
            let score = ModelTrainer::score(&mut model, &data.testing)?;
            info!("Finished scoring model.");
            info!("Model score: {score:.4}");
        }

        Ok(model)
    }

    /// Load or train, then wrap the model in a predictor.
    pub fn predictor(&self) -> Result<Predictor> {
        let outcome = self.load_or_train(false)?;
        Predictor::with_model(outcome.model)
    }
}
