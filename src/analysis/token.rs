//! Token types for text analysis.
//!
//! A [`Token`] is the unit that flows between the tokenizer and the token
//! filters of the normalization pipeline. Positions are assigned by the
//! tokenizer and are not renumbered when filters drop tokens.
//!
//! # Examples
//!
//! ```
//! use emogif::analysis::token::Token;
//!
//! let token = Token::new("hello", 0);
//! assert_eq!(token.text, "hello");
//! assert_eq!(token.position, 0);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single unit of text after tokenization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The token's text content.
    pub text: String,

    /// Position in the token stream (0-based).
    pub position: usize,

    /// Byte offset of the token start in the filtered text.
    pub start_offset: usize,

    /// Byte offset just past the token end in the filtered text.
    pub end_offset: usize,
}

impl Token {
    /// Create a new token at the given position.
    pub fn new<S: Into<String>>(text: S, position: usize) -> Self {
        let text = text.into();
        let end_offset = text.len();
        Token {
            text,
            position,
            start_offset: 0,
            end_offset,
        }
    }

    /// Create a new token with explicit byte offsets.
    pub fn with_offsets<S: Into<String>>(
        text: S,
        position: usize,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset,
            end_offset,
        }
    }

    /// Replace the text, keeping position and offsets.
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = text.into();
        self
    }

    /// Whether every character is alphanumeric (and there is at least one).
    pub fn is_alphanumeric(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(char::is_alphanumeric)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A stream of tokens passed between pipeline stages.
pub type TokenStream = Box<dyn Iterator<Item = Token> + Send>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_creation() {
        let token = Token::with_offsets("world", 1, 6, 11);
        assert_eq!(token.text, "world");
        assert_eq!(token.start_offset, 6);
        assert_eq!(token.end_offset, 11);
        assert_eq!(token.to_string(), "world");
    }

    #[test]
    fn test_is_alphanumeric() {
        assert!(Token::new("abc123", 0).is_alphanumeric());
        assert!(!Token::new("!!", 0).is_alphanumeric());
        assert!(!Token::new("a_b", 0).is_alphanumeric());
        assert!(!Token::new("", 0).is_alphanumeric());
    }

    #[test]
    fn test_with_text_keeps_position() {
        let token = Token::new("running", 3).with_text("run");
        assert_eq!(token.text, "run");
        assert_eq!(token.position, 3);
    }
}
