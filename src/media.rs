//! Image search for a predicted emotion.

pub mod giphy;

use crate::emotion::Emotion;
use crate::error::Result;

/// A service that finds an embeddable image for a tag.
pub trait MediaSearch: Send + Sync {
    /// Look up one image for `tag`. `Ok(None)` means nothing was found.
    fn lookup(&self, tag: &str) -> Result<Option<String>>;

    /// Look up an image for an emotion by its tag.
    fn lookup_emotion(&self, emotion: Emotion) -> Result<Option<String>> {
        self.lookup(emotion.as_str())
    }

    fn name(&self) -> &'static str;
}
