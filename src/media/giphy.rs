//! Giphy random-GIF client.
//!
//! Calls `GET {endpoint}?api_key=..&tag=..&rating=..` and returns
//! `data.embed_url`. Giphy answers an unknown tag with an empty `data`
//! array, which maps to `Ok(None)` like any non-success status.

use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::{EmogifError, Result};
use crate::media::MediaSearch;

/// Default random-GIF endpoint.
pub const GIPHY_RANDOM_ENDPOINT: &str = "https://api.giphy.com/v1/gifs/random";

/// Giphy client settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GiphyConfig {
    pub endpoint: String,
    /// Content rating filter.
    pub rating: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GiphyConfig {
    fn default() -> Self {
        GiphyConfig {
            endpoint: GIPHY_RANDOM_ENDPOINT.to_string(),
            rating: "g".to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl std::fmt::Debug for GiphyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GiphyConfig")
            .field("endpoint", &self.endpoint)
            .field("rating", &self.rating)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Response of the random endpoint. `data` is an object on success and an
/// empty array when nothing matched.
#[derive(Debug, Deserialize)]
struct RandomResponse {
    #[serde(default)]
    data: serde_json::Value,
}

impl RandomResponse {
    fn embed_url(&self) -> Option<String> {
        self.data
            .get("embed_url")
            .and_then(|url| url.as_str())
            .filter(|url| !url.is_empty())
            .map(str::to_string)
    }
}

/// Blocking Giphy client.
pub struct GiphyClient {
    client: Client,
    config: GiphyConfig,
    api_key: String,
}

impl std::fmt::Debug for GiphyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GiphyClient")
            .field("endpoint", &self.config.endpoint)
            .field("rating", &self.config.rating)
            .finish()
    }
}

impl GiphyClient {
    /// Create a client. Fails when no API key is configured.
    pub fn new(config: GiphyConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                EmogifError::config("a Giphy API key is required (--api-key or GIPHY_API_KEY)")
            })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmogifError::media(format!("Failed to create HTTP client: {e}")))?;
        Ok(GiphyClient {
            client,
            config,
            api_key,
        })
    }

    pub fn config(&self) -> &GiphyConfig {
        &self.config
    }
}

impl MediaSearch for GiphyClient {
    fn lookup(&self, tag: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("tag", tag),
                ("rating", self.config.rating.as_str()),
            ])
            .send()
            .map_err(|e| EmogifError::media(format!("Giphy request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Giphy answered {status} for tag `{tag}`");
            return Ok(None);
        }

        let body: RandomResponse = response
            .json()
            .map_err(|e| EmogifError::media(format!("Failed to parse Giphy response: {e}")))?;
        let url = body.embed_url();
        debug!("Giphy lookup for `{tag}`: {url:?}");
        Ok(url)
    }

    fn name(&self) -> &'static str {
        "giphy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_url_extraction() {
        let found: RandomResponse = serde_json::from_str(
            r#"{"data": {"id": "abc", "embed_url": "https://giphy.com/embed/abc"}, "meta": {"status": 200}}"#,
        )
        .unwrap();
        assert_eq!(
            found.embed_url().as_deref(),
            Some("https://giphy.com/embed/abc")
        );

        let empty: RandomResponse =
            serde_json::from_str(r#"{"data": [], "meta": {"status": 200}}"#).unwrap();
        assert_eq!(empty.embed_url(), None);

        let missing: RandomResponse = serde_json::from_str(r#"{"meta": {}}"#).unwrap();
        assert_eq!(missing.embed_url(), None);
    }

    #[test]
    fn test_api_key_required() {
        assert!(matches!(
            GiphyClient::new(GiphyConfig::default()),
            Err(EmogifError::Config(_))
        ));
        let config = GiphyConfig {
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        let client = GiphyClient::new(config).unwrap();
        assert_eq!(client.name(), "giphy");
        assert!(!format!("{:?}", client.config()).contains("\"key\""));
    }
}
