use std::sync::Arc;

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::token_filter::Filter;
use crate::error::Result;
use crate::spelling::corrector::SpellingCorrector;

/// Replaces words unknown to the dictionary with their best correction.
///
/// A word without any candidate is kept as is.
#[derive(Clone, Debug)]
pub struct SpellingFilter {
    corrector: Arc<SpellingCorrector>,
}

impl SpellingFilter {
    pub fn new(corrector: Arc<SpellingCorrector>) -> Self {
        SpellingFilter { corrector }
    }
}

impl Filter for SpellingFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let corrected: Vec<Token> = tokens
            .map(|token| match self.corrector.correction(&token.text) {
                Some(correction) => token.with_text(correction),
                None => token,
            })
            .collect();
        Ok(Box::new(corrected.into_iter()))
    }

    fn name(&self) -> &'static str {
        "spelling"
    }
}
