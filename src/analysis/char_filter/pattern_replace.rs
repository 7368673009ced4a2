use regex::Regex;

use super::CharFilter;
use crate::error::{EmogifError, Result};

/// Noise stripped from chat text, applied in this order: HTML-like tags,
/// URLs, mentions, entity runs, non-ASCII characters.
pub const MARKUP_PATTERNS: &[&str] = &[
    r"<.*?>",
    r"https?://\S+|www\.\S+",
    r"@\S+",
    r"&\S+",
    r"[^\x00-\x7f]",
];

/// Punctuation and special characters removed after markup stripping.
/// `<`, `>` and digits are deliberately absent.
pub const PUNCTUATION_PATTERN: &str = r#"[\]!"$%&'()*+,./:;=#@?\[\\^_`{|}~-]+"#;

/// Runs of whitespace, collapsed to a single space.
pub const WHITESPACE_PATTERN: &str = r"\s+";

/// A char filter that replaces every match of a regex pattern.
pub struct PatternReplaceCharFilter {
    pattern: Regex,
    replacement: String,
}

impl PatternReplaceCharFilter {
    /// Create a new pattern replace char filter.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)
                .map_err(|e| EmogifError::analysis(format!("Invalid regex pattern: {e}")))?,
            replacement: replacement.to_string(),
        })
    }

    /// Filters that delete the markup patterns, in application order.
    pub fn markup() -> Result<Vec<Self>> {
        MARKUP_PATTERNS
            .iter()
            .map(|pattern| Self::new(pattern, ""))
            .collect()
    }

    /// Filter that deletes punctuation runs.
    pub fn punctuation() -> Result<Self> {
        Self::new(PUNCTUATION_PATTERN, "")
    }

    /// Filter that collapses whitespace runs to one space.
    pub fn whitespace() -> Result<Self> {
        Self::new(WHITESPACE_PATTERN, " ")
    }

    /// The regex source of this filter.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl CharFilter for PatternReplaceCharFilter {
    fn filter(&self, input: &str) -> String {
        self.pattern
            .replace_all(input, regex::NoExpand(&self.replacement))
            .into_owned()
    }

    fn name(&self) -> &'static str {
        "pattern_replace"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_markup(input: &str) -> String {
        PatternReplaceCharFilter::markup()
            .unwrap()
            .iter()
            .fold(input.to_string(), |text, filter| filter.filter(&text))
    }

    #[test]
    fn test_pattern_replace() {
        let filter = PatternReplaceCharFilter::new(r"(\d+)", "NUM").unwrap();
        assert_eq!(filter.filter("Year 2024"), "Year NUM");
    }

    #[test]
    fn test_markup_removal() {
        assert_eq!(strip_markup("<b>hi</b> there"), "hi there");
        assert_eq!(strip_markup("see http://x.com now"), "see  now");
        assert_eq!(strip_markup("see www.example.org"), "see ");
        assert_eq!(strip_markup("yo @bob and @alice!"), "yo  and ");
        assert_eq!(strip_markup("fish &amp; chips"), "fish  chips");
        assert_eq!(strip_markup("caf\u{e9} time"), "caf time");
    }

    #[test]
    fn test_punctuation_keeps_angle_brackets_and_digits() {
        let filter = PatternReplaceCharFilter::punctuation().unwrap();
        assert_eq!(filter.filter("can't!! stop... 24/7"), "cant stop 247");
        assert_eq!(filter.filter("a < b > c"), "a < b > c");
        assert_eq!(filter.filter(r#"[x]{y}\z^_`|~"#), "xyz");
    }

    #[test]
    fn test_whitespace_collapse() {
        let filter = PatternReplaceCharFilter::whitespace().unwrap();
        assert_eq!(filter.filter("a \t\n  b"), "a b");
    }
}
