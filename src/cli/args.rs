//! Command line argument parsing for the emogif CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// emogif - guess the emotion of a message and answer with a GIF
#[derive(Parser, Debug, Clone)]
#[command(name = "emogif")]
#[command(about = "Emotion classification for chat messages, answered with a matching GIF")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct EmogifArgs {
    /// Verbosity level (repeat for more: -v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl EmogifArgs {
    /// Effective verbosity: 0 quiet, 1 default, one more per `-v`.
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose.saturating_add(1)
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Load the model, training it first if needed
    Train(TrainArgs),

    /// Predict the emotion of a text
    Predict(PredictArgs),

    /// Predict the emotion of a message and find a matching GIF
    Chat(ChatArgs),

    /// Show the normalized form of a text
    Normalize(NormalizeArgs),
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Path of the model file
    #[arg(long, env = "MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Train even when a model file exists
    #[arg(long)]
    pub force: bool,
}

/// Arguments for prediction
#[derive(Parser, Debug, Clone)]
pub struct PredictArgs {
    /// Text to classify
    pub text: String,

    /// Path of the model file
    #[arg(long, env = "MODEL_PATH")]
    pub model_path: Option<PathBuf>,
}

/// Arguments for the chat command
#[derive(Parser, Debug, Clone)]
pub struct ChatArgs {
    /// Chat message
    pub message: String,

    /// Path of the model file
    #[arg(long, env = "MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Giphy API key
    #[arg(long, env = "GIPHY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

/// Arguments for normalization
#[derive(Parser, Debug, Clone)]
pub struct NormalizeArgs {
    /// Text to normalize
    pub text: String,

    /// Split multi-word abbreviation expansions into separate tokens
    #[arg(long)]
    pub split_expansions: bool,

    /// Disable spelling correction
    #[arg(long)]
    pub no_spelling: bool,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_command() {
        let args = EmogifArgs::try_parse_from([
            "emogif",
            "predict",
            "I am so happy today",
            "--model-path",
            "/tmp/model.bin",
        ])
        .unwrap();

        if let Command::Predict(predict_args) = args.command {
            assert_eq!(predict_args.text, "I am so happy today");
            assert_eq!(predict_args.model_path, Some(PathBuf::from("/tmp/model.bin")));
        } else {
            panic!("Expected Predict command");
        }
    }

    #[test]
    fn test_train_command() {
        let args = EmogifArgs::try_parse_from(["emogif", "train", "--force"]).unwrap();
        if let Command::Train(train_args) = args.command {
            assert!(train_args.force);
        } else {
            panic!("Expected Train command");
        }
    }

    #[test]
    fn test_chat_command() {
        let args =
            EmogifArgs::try_parse_from(["emogif", "chat", "lol that is great", "--api-key", "k"])
                .unwrap();
        if let Command::Chat(chat_args) = args.command {
            assert_eq!(chat_args.message, "lol that is great");
            assert_eq!(chat_args.api_key.as_deref(), Some("k"));
        } else {
            panic!("Expected Chat command");
        }
    }

    #[test]
    fn test_global_config_flag() {
        let args =
            EmogifArgs::try_parse_from(["emogif", "normalize", "hi", "--config", "emogif.json"])
                .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("emogif.json")));
    }

    #[test]
    fn test_verbosity_levels() {
        let args = EmogifArgs::try_parse_from(["emogif", "normalize", "x"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        let args = EmogifArgs::try_parse_from(["emogif", "-v", "normalize", "x"]).unwrap();
        assert_eq!(args.verbosity(), 2);

        let args = EmogifArgs::try_parse_from(["emogif", "-vv", "normalize", "x"]).unwrap();
        assert_eq!(args.verbosity(), 3);

        let args = EmogifArgs::try_parse_from(["emogif", "-q", "-vv", "normalize", "x"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_output_format() {
        let args =
            EmogifArgs::try_parse_from(["emogif", "--format", "json", "normalize", "x"]).unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);
        assert!(EmogifArgs::try_parse_from(["emogif", "--format", "yaml", "normalize", "x"]).is_err());
    }

    #[test]
    fn test_missing_subcommand() {
        assert!(EmogifArgs::try_parse_from(["emogif"]).is_err());
    }
}
