//! The text normalizer: raw chat text in, canonical stemmed tokens out.
//!
//! Stages, in order:
//!
//! ```text
//! lowercase → strip markup → strip punctuation → expand contractions
//!   → collapse whitespace → tokenize → keep alphanumeric → drop stop words
//!   → expand abbreviations → correct spelling → stem
//! ```
//!
//! Reordering any two stages changes the output; for example contractions
//! are expanded after punctuation stripping, so the contraction table has to
//! know apostrophe-free spellings such as `cant`.
//!
//! # Examples
//!
//! ```
//! use emogif::analysis::normalizer::TextNormalizer;
//!
//! let normalizer = TextNormalizer::new().unwrap();
//! let text = normalizer.normalize_text("I can't believe this!! visit http://x.com @bob lol").unwrap();
//! assert_eq!(text, "believ visit laughing out loud");
//! ```

use std::sync::Arc;

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::Analyzer;
use crate::analysis::analyzer::pipeline::PipelineAnalyzer;
use crate::analysis::char_filter::contraction::ContractionCharFilter;
use crate::analysis::char_filter::lowercase::LowercaseCharFilter;
use crate::analysis::char_filter::pattern_replace::PatternReplaceCharFilter;
use crate::analysis::token_filter::abbreviation::AbbreviationFilter;
use crate::analysis::token_filter::alphanumeric::AlphanumericFilter;
use crate::analysis::token_filter::spelling::SpellingFilter;
use crate::analysis::token_filter::stem::StemFilter;
use crate::analysis::token_filter::stop::StopFilter;
use crate::analysis::tokenizer::regex::RegexTokenizer;
use crate::dataset::{LabeledSample, NormalizedSample};
use crate::error::Result;
use crate::spelling::corrector::{CorrectorConfig, SpellingCorrector};

/// Settings that change normalizer output. Stored with trained models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NormalizerSettings {
    /// Split multi-word abbreviation expansions into separate tokens.
    pub split_expansions: bool,
    /// Spelling correction settings.
    pub spelling: CorrectorConfig,
}

impl NormalizerSettings {
    /// Checksum of the spelling dictionary these settings select, `None`
    /// when spelling correction is off.
    pub fn dictionary_checksum(&self) -> Result<Option<u32>> {
        if !self.spelling.enabled {
            return Ok(None);
        }
        Ok(Some(SpellingCorrector::shared(&self.spelling)?.checksum()))
    }
}

/// Deterministic text normalizer shared by training and prediction.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    analyzer: PipelineAnalyzer,
    settings: NormalizerSettings,
    corrector: Option<Arc<SpellingCorrector>>,
}

impl TextNormalizer {
    /// Create a normalizer with default settings.
    pub fn new() -> Result<Self> {
        Self::with_settings(NormalizerSettings::default())
    }

    /// Create a normalizer, loading the spelling dictionary the settings name.
    pub fn with_settings(settings: NormalizerSettings) -> Result<Self> {
        let corrector = if settings.spelling.enabled {
            Some(SpellingCorrector::shared(&settings.spelling)?)
        } else {
            None
        };
        Self::build(settings, corrector)
    }

    /// Create a normalizer around an already built corrector.
    pub fn with_corrector(
        settings: NormalizerSettings,
        corrector: Arc<SpellingCorrector>,
    ) -> Result<Self> {
        let corrector = settings.spelling.enabled.then_some(corrector);
        Self::build(settings, corrector)
    }

    fn build(
        settings: NormalizerSettings,
        corrector: Option<Arc<SpellingCorrector>>,
    ) -> Result<Self> {
        let mut analyzer = PipelineAnalyzer::new(Arc::new(RegexTokenizer::new()?))
            .with_name("emotion_normalizer")
            .add_char_filter(Arc::new(LowercaseCharFilter::new()));
        for markup in PatternReplaceCharFilter::markup()? {
            analyzer = analyzer.add_char_filter(Arc::new(markup));
        }
        analyzer = analyzer
            .add_char_filter(Arc::new(PatternReplaceCharFilter::punctuation()?))
            .add_char_filter(Arc::new(ContractionCharFilter::new()))
            .add_char_filter(Arc::new(PatternReplaceCharFilter::whitespace()?))
            .add_filter(Arc::new(AlphanumericFilter::new()))
            .add_filter(Arc::new(StopFilter::new()))
            .add_filter(Arc::new(
                AbbreviationFilter::new().split_expansions(settings.split_expansions),
            ));
        if let Some(corrector) = &corrector {
            analyzer = analyzer.add_filter(Arc::new(SpellingFilter::new(Arc::clone(corrector))));
        }
        analyzer = analyzer.add_filter(Arc::new(StemFilter::new()));

        debug!("Normalizer stages: {:?}", analyzer.stage_names());

        Ok(TextNormalizer {
            analyzer,
            settings,
            corrector,
        })
    }

    /// Normalize text into its token sequence.
    pub fn normalize(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.analyzer.analyze(text)?.map(|token| token.text).collect())
    }

    /// Normalize text and join the tokens with single spaces.
    pub fn normalize_text(&self, text: &str) -> Result<String> {
        Ok(self.normalize(text)?.join(" "))
    }

    /// Normalize the text of every row in parallel. Output order matches
    /// input order; rows whose text normalizes to nothing keep an empty
    /// token list.
    pub fn normalize_column(&self, rows: Vec<LabeledSample>) -> Result<Vec<NormalizedSample>> {
        rows.into_par_iter()
            .map(|row| {
                Ok(NormalizedSample {
                    tokens: self.normalize(&row.text)?,
                    emotion: row.emotion,
                })
            })
            .collect()
    }

    /// The settings this normalizer was built with.
    pub fn settings(&self) -> &NormalizerSettings {
        &self.settings
    }

    /// Checksum of the spelling dictionary in use, `None` without spelling
    /// correction.
    pub fn dictionary_checksum(&self) -> Option<u32> {
        self.corrector.as_ref().map(|corrector| corrector.checksum())
    }
}
