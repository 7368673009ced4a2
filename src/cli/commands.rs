//! Command implementations for the emogif CLI.

use std::path::PathBuf;
use std::time::Instant;

use log::debug;

use crate::analysis::normalizer::TextNormalizer;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::EmogifConfig;
use crate::engine::{Engine, ModelSource};
use crate::error::{EmogifError, Result};
use crate::media::MediaSearch;
use crate::media::giphy::GiphyClient;

/// Execute a CLI command.
pub fn execute_command(args: EmogifArgs) -> Result<()> {
    let config = EmogifConfig::load(args.config.as_deref())?;
    match &args.command {
        Command::Train(train_args) => train(train_args, config, &args),
        Command::Predict(predict_args) => predict(predict_args, config, &args),
        Command::Chat(chat_args) => chat(chat_args, config, &args),
        Command::Normalize(normalize_args) => normalize(normalize_args, config, &args),
    }
}

fn with_model_path(mut config: EmogifConfig, model_path: &Option<PathBuf>) -> EmogifConfig {
    if let Some(path) = model_path {
        config.model_path = path.clone();
    }
    config
}

/// Load or train the model and report how it was obtained.
fn train(args: &TrainArgs, config: EmogifConfig, cli_args: &EmogifArgs) -> Result<()> {
    let config = with_model_path(config, &args.model_path);
    let engine = Engine::new(config)?;

    let start = Instant::now();
    let outcome = engine.load_or_train(args.force)?;
    let metadata = &outcome.model.metadata;

    let result = TrainResult {
        model_path: engine.config().model_path.display().to_string(),
        source: match outcome.source {
            ModelSource::Loaded => "loaded",
            ModelSource::LoadedAfterWait => "loaded_after_wait",
            ModelSource::Trained => "trained",
        }
        .to_string(),
        test_score: metadata.test_score,
        best_cv_score: metadata.best_cv_score,
        training_samples: metadata.training_samples,
        testing_samples: metadata.testing_samples,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    output_result("Model ready", &result, cli_args)
}

/// Classify a text with an existing model.
fn predict(args: &PredictArgs, config: EmogifConfig, cli_args: &EmogifArgs) -> Result<()> {
    let config = with_model_path(config, &args.model_path);
    let engine = Engine::new(config)?;
    let predictor = crate::predictor::Predictor::with_model(engine.load()?)?;

    let emotion = predictor.predict(&args.text)?;
    let result = PredictionResult {
        text: args.text.clone(),
        emotion: emotion.to_string(),
    };

    output_result("Prediction", &result, cli_args)
}

/// Predict the emotion of a message and answer with a GIF.
fn chat(args: &ChatArgs, config: EmogifConfig, cli_args: &EmogifArgs) -> Result<()> {
    let mut config = with_model_path(config, &args.model_path);
    if args.api_key.is_some() {
        config.media.api_key = args.api_key.clone();
    }
    let client = GiphyClient::new(config.media.clone())?;
    let engine = Engine::new(config)?;
    let predictor = engine.predictor()?;

    let emotion = predictor.predict(&args.message)?;
    debug!("Predicted `{emotion}`; asking {}", client.name());

    let gif_url = client
        .lookup_emotion(emotion)?
        .ok_or_else(|| EmogifError::media("Error communicating with Giphy server."))?;

    let result = ChatResult {
        message: args.message.clone(),
        emotion: emotion.to_string(),
        gif_url,
    };

    output_result("Chat reply", &result, cli_args)
}

/// Show what the normalizer makes of a text.
fn normalize(args: &NormalizeArgs, config: EmogifConfig, cli_args: &EmogifArgs) -> Result<()> {
    let mut settings = config.normalizer;
    if args.split_expansions {
        settings.split_expansions = true;
    }
    if args.no_spelling {
        settings.spelling.enabled = false;
    }

    let normalizer = TextNormalizer::with_settings(settings)?;
    let tokens = normalizer.normalize(&args.text)?;
    let result = NormalizationResult {
        text: args.text.clone(),
        normalized: tokens.join(" "),
        tokens,
    };

    output_result("Normalized text", &result, cli_args)
}
