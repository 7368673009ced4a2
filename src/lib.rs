//! # emogif
//!
//! Emotion classification for short chat messages, answered with a GIF.
//!
//! ## Features
//!
//! - Text normalization: markup and contraction cleanup, stop words,
//!   chat abbreviations, spelling correction and Porter stemming
//! - TF-IDF features over normalized tokens
//! - Stacked ensemble of logistic regression and a kernel SVC, tuned by
//!   randomized search with stratified cross-validation
//! - Checksummed, tagged model artifacts with single-writer training
//! - Giphy lookup for the predicted emotion

pub mod analysis;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod emotion;
pub mod engine;
pub mod error;
pub mod media;
pub mod ml;
pub mod predictor;
pub mod spelling;
pub mod storage;

pub mod prelude {
    pub use crate::analysis::normalizer::{NormalizerSettings, TextNormalizer};
    pub use crate::config::EmogifConfig;
    pub use crate::emotion::Emotion;
    pub use crate::engine::{Engine, LoadOutcome, ModelSource};
    pub use crate::error::{EmogifError, Result};
    pub use crate::media::MediaSearch;
    pub use crate::predictor::Predictor;
}

/// Crate version, recorded in every model artifact.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
