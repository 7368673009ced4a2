//! Text analysis for emotion classification.
//!
//! Analysis follows the classic char filter → tokenizer → token filter
//! layout. [`normalizer::TextNormalizer`] wires the concrete stages together
//! in the order training and prediction both rely on.

pub mod analyzer;
pub mod char_filter;
pub mod normalizer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;
