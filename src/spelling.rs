//! Spelling correction for normalized chat text.
//!
//! Chat messages are full of typos; correcting them before stemming lets
//! `beleive` and `believe` share a feature.

pub mod corrector;
pub mod dictionary;
pub mod levenshtein;
