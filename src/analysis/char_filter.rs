//! Char filters applied to the raw text before tokenization.
//!
//! # Available Filters
//!
//! - [`lowercase::LowercaseCharFilter`] - Lowercases the whole input
//! - [`pattern_replace::PatternReplaceCharFilter`] - Regex-based replacement
//! - [`contraction::ContractionCharFilter`] - Expands English contractions
//!
//! # Examples
//!
//! ```
//! use emogif::analysis::char_filter::CharFilter;
//! use emogif::analysis::char_filter::pattern_replace::PatternReplaceCharFilter;
//!
//! let filter = PatternReplaceCharFilter::new(r"@\S+", "").unwrap();
//! assert_eq!(filter.filter("hi @bob"), "hi ");
//! ```

/// Trait for character filters that transform text before tokenization.
pub trait CharFilter: Send + Sync {
    /// Apply this filter to the input text and return the filtered text.
    fn filter(&self, input: &str) -> String;

    /// Get the name of this char filter.
    fn name(&self) -> &'static str;
}

pub mod contraction;
pub mod lowercase;
pub mod pattern_replace;
