//! Token filters transform the token stream produced by a tokenizer.
//!
//! # Available Filters
//!
//! - [`alphanumeric::AlphanumericFilter`] - Drops tokens that are not purely alphanumeric
//! - [`stop::StopFilter`] - Removes stop words
//! - [`abbreviation::AbbreviationFilter`] - Expands chat abbreviations
//! - [`spelling::SpellingFilter`] - Replaces unknown words with the closest known word
//! - [`stem::StemFilter`] - Reduces words to their stem form
//!
//! # Filter Chaining
//!
//! ```text
//! Tokenizer → Alphanumeric → Stop Words → Abbreviations → Spelling → Stemmer
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for filters that transform token streams.
///
/// # Examples
///
/// ```
/// use emogif::analysis::token::{Token, TokenStream};
/// use emogif::analysis::token_filter::Filter;
/// use emogif::error::Result;
///
/// struct ReverseFilter;
///
/// impl Filter for ReverseFilter {
///     fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
///         let reversed: Vec<Token> = tokens
///             .map(|mut t| {
///                 t.text = t.text.chars().rev().collect();
///                 t
///             })
///             .collect();
///         Ok(Box::new(reversed.into_iter()))
///     }
///
///     fn name(&self) -> &'static str {
///         "reverse"
///     }
/// }
/// ```
pub trait Filter: Send + Sync {
    /// Apply this filter to a token stream.
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    /// Get the name of this filter (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod abbreviation;
pub mod alphanumeric;
pub mod spelling;
pub mod stem;
pub mod stop;
