//! Process configuration.
//!
//! Configuration is read once from an optional JSON file; every field has a
//! default, so an empty object (or no file at all) is a valid configuration.
//! Command line flags and environment variables override individual fields
//! before [`EmogifConfig::validate`] runs.
//!
//! ```json
//! {
//!   "datasets": [{ "path": "dataset/emotions.csv", "delimiter": ";" }],
//!   "model_path": "model/stack_model.bin",
//!   "search": { "n_iter": 4, "cv": 5, "seed": 7 }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::analysis::normalizer::NormalizerSettings;
use crate::dataset::{ColumnSpec, DatasetSource};
use crate::error::{EmogifError, Result};
use crate::media::giphy::GiphyConfig;
use crate::ml::search::SearchConfig;
use crate::storage::lock::LockConfig;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmogifConfig {
    /// Labeled sources, read in this order.
    pub datasets: Vec<DatasetSource>,
    pub columns: ColumnSpec,
    /// Share of the shuffled table used for training.
    pub training_fraction: f64,
    pub model_path: PathBuf,
    pub preprocessed_path: PathBuf,
    /// Reuse the preprocessed cache instead of re-ingesting the sources.
    pub reuse_preprocessed: bool,
    /// Retrain instead of failing when the model file is corrupt.
    pub retrain_on_corrupt: bool,
    pub normalizer: NormalizerSettings,
    pub search: SearchConfig,
    pub lock: LockConfig,
    pub media: GiphyConfig,
}

impl Default for EmogifConfig {
    fn default() -> Self {
        EmogifConfig {
            datasets: vec![
                DatasetSource::new("dataset/emotions.csv", ';'),
                DatasetSource::new("dataset/tweet_emotions.csv", ','),
            ],
            columns: ColumnSpec::default(),
            training_fraction: 0.8,
            model_path: PathBuf::from("model/stack_model.bin"),
            preprocessed_path: PathBuf::from("parsed_data/data.bin"),
            reuse_preprocessed: false,
            retrain_on_corrupt: false,
            normalizer: NormalizerSettings::default(),
            search: SearchConfig::default(),
            lock: LockConfig::default(),
            media: GiphyConfig::default(),
        }
    }
}

impl EmogifConfig {
    /// Read a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            EmogifError::config(format!("cannot read config {}: {e}", path.display()))
        })?;
        let config: EmogifConfig = serde_json::from_str(&text)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Read `path` if given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(EmogifConfig::default()),
        }
    }

    /// Checks that only concern the model file and prediction.
    pub fn validate_for_inference(&self) -> Result<()> {
        if self.model_path.as_os_str().is_empty() {
            return Err(EmogifError::config("model_path must not be empty"));
        }
        Ok(())
    }

    /// Full validation for a run that may need to train.
    pub fn validate(&self) -> Result<()> {
        self.validate_for_inference()?;
        if self.datasets.is_empty() {
            return Err(EmogifError::config("at least one dataset source is required"));
        }
        if !(0.0..=1.0).contains(&self.training_fraction) {
            return Err(EmogifError::config(format!(
                "training_fraction must be within [0, 1], got {}",
                self.training_fraction
            )));
        }
        if self.columns.text.is_empty() || self.columns.label.is_empty() {
            return Err(EmogifError::config("column names must not be empty"));
        }
        if self.preprocessed_path.as_os_str().is_empty() {
            return Err(EmogifError::config("preprocessed_path must not be empty"));
        }
        self.search.validate()
    }

    /// Check that every dataset file exists. Only needed when the sources
    /// will actually be read.
    pub fn validate_datasets(&self) -> Result<()> {
        for source in &self.datasets {
            if !source.path.is_file() {
                return Err(EmogifError::config(format!(
                    "dataset file {} does not exist",
                    source.path.display()
                )));
            }
            if !source.delimiter.is_ascii() {
                return Err(EmogifError::config(format!(
                    "delimiter {:?} of {} is not a single-byte character",
                    source.delimiter,
                    source.path.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = EmogifConfig::default();
        assert_eq!(config.datasets.len(), 2);
        assert_eq!(config.datasets[0].delimiter, ';');
        assert_eq!(config.columns.text, "content");
        assert_eq!(config.columns.label, "emotion");
        assert_eq!(config.training_fraction, 0.8);
        assert_eq!(config.search.n_iter, 10);
        assert_eq!(config.search.cv, 7);
        assert_eq!(config.search.stacking_cv, 5);
        assert!(config.normalizer.spelling.enabled);
        assert!(!config.normalizer.split_expansions);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "model_path": "m.bin", "search": {{ "n_iter": 3, "seed": 9 }},
                 "normalizer": {{ "split_expansions": true }} }}"#
        )
        .unwrap();

        let config = EmogifConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.model_path, PathBuf::from("m.bin"));
        assert_eq!(config.search.n_iter, 3);
        assert_eq!(config.search.seed, Some(9));
        assert_eq!(config.search.cv, 7);
        assert!(config.normalizer.split_expansions);
        assert!(config.normalizer.spelling.enabled);
        assert_eq!(config.datasets.len(), 2);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = EmogifConfig {
            training_fraction: 1.2,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.training_fraction = 0.8;
        config.datasets.clear();
        assert!(config.validate().is_err());

        let config = EmogifConfig {
            model_path: PathBuf::new(),
            ..Default::default()
        };
        assert!(config.validate_for_inference().is_err());

        let config = EmogifConfig {
            datasets: vec![DatasetSource::new("/nonexistent/data.csv", ',')],
            ..Default::default()
        };
        assert!(config.validate_datasets().is_err());
    }

    #[test]
    fn test_bad_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            EmogifConfig::load(Some(file.path())),
            Err(EmogifError::Json(_))
        ));
    }
}
