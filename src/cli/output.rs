//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{EmogifArgs, OutputFormat};
use crate::error::Result;

/// Result of the train command.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainResult {
    pub model_path: String,
    /// `loaded`, `loaded_after_wait` or `trained`.
    pub source: String,
    pub test_score: Option<f64>,
    pub best_cv_score: f64,
    pub training_samples: usize,
    pub testing_samples: usize,
    pub duration_ms: u64,
}

/// Result of the predict command.
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResult {
    pub text: String,
    pub emotion: String,
}

/// Result of the chat command.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResult {
    pub message: String,
    pub emotion: String,
    pub gif_url: String,
}

/// Result of the normalize command.
#[derive(Debug, Serialize, Deserialize)]
pub struct NormalizationResult {
    pub text: String,
    pub tokens: Vec<String>,
    pub normalized: String,
}

/// Print a command result in the selected format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &EmogifArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

fn output_human<T: Serialize>(message: &str, result: &T, args: &EmogifArgs) -> Result<()> {
    if args.verbosity() > 1 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;
    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                println!("{key}: {}", format_value(&val));
            }
        }
        other => println!("{}", format_value(&other)),
    }
    Ok(())
}

fn output_json<T: Serialize>(result: &T, args: &EmogifArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Render one JSON value on a single line.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{f:.4}"),
            _ => n.to_string(),
        },
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => "-".to_string(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(format_value)
            .collect::<Vec<_>>()
            .join(" "),
        serde_json::Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!("happy")), "happy");
        assert_eq!(format_value(&json!(0.123456)), "0.1235");
        assert_eq!(format_value(&json!(42)), "42");
        assert_eq!(format_value(&json!(null)), "-");
        assert_eq!(format_value(&json!(["believ", "visit"])), "believ visit");
    }

    #[test]
    fn test_results_serialize() {
        let result = ChatResult {
            message: "lol".to_string(),
            emotion: "fun".to_string(),
            gif_url: "https://giphy.com/embed/abc".to_string(),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["emotion"], "fun");
        assert_eq!(value["gif_url"], "https://giphy.com/embed/abc");
    }
}
