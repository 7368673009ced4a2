//! TF-IDF vectorizer over pre-tokenized documents.
//!
//! Documents arrive as token lists from the normalizer, so there is no
//! tokenization or lowercasing here. English stop words are removed once
//! more (the wider scikit-learn list), terms are indexed in alphabetical
//! order and weighted as
//!
//! ```text
//! tf(t, d) * (ln((1 + n) / (1 + df(t))) + 1)
//! ```
//!
//! with raw counts for `tf`. Every row is scaled to unit L2 norm.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::analysis::token_filter::stop::SKLEARN_ENGLISH_STOP_WORDS_SET;
use crate::error::{EmogifError, Result};
use crate::ml::sparse::SparseVector;

/// TF-IDF vectorizer for token lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
    /// Term -> column, columns assigned in alphabetical term order.
    vocabulary: BTreeMap<String, u32>,
    /// Inverse document frequency per column.
    idf: Vec<f64>,
    /// Number of documents seen by `fit`.
    n_documents: usize,
}

impl TfIdfVectorizer {
    pub fn new() -> Self {
        TfIdfVectorizer::default()
    }

    fn keeps(token: &str) -> bool {
        !SKLEARN_ENGLISH_STOP_WORDS_SET.contains(token)
    }

    /// Learn the vocabulary and document frequencies.
    ///
    /// Fails when no document contains a term outside the stop list.
    pub fn fit<D: AsRef<[String]>>(&mut self, documents: &[D]) -> Result<()> {
        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for document in documents {
            let unique: BTreeSet<&str> = document
                .as_ref()
                .iter()
                .map(String::as_str)
                .filter(|t| Self::keeps(t))
                .collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        if document_frequency.is_empty() {
            return Err(EmogifError::model(
                "empty vocabulary; documents contain only stop words",
            ));
        }

        let n = documents.len() as f64;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(document_frequency.len());
        for (column, (term, df)) in document_frequency.into_iter().enumerate() {
            vocabulary.insert(term.to_string(), column as u32);
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
        }

        self.vocabulary = vocabulary;
        self.idf = idf;
        self.n_documents = documents.len();
        Ok(())
    }

    /// Vectorize one document. Terms outside the vocabulary are ignored.
    pub fn transform(&self, tokens: &[String]) -> Result<SparseVector> {
        if !self.is_fitted() {
            return Err(EmogifError::model("vectorizer is not fitted"));
        }

        let mut counts: HashMap<u32, f64> = HashMap::new();
        for token in tokens {
            if let Some(&column) = self.vocabulary.get(token) {
                *counts.entry(column).or_insert(0.0) += 1.0;
            }
        }

        let mut vector = SparseVector::from_pairs(
            counts
                .into_iter()
                .map(|(column, count)| (column, count * self.idf[column as usize]))
                .collect(),
        );
        vector.l2_normalize();
        Ok(vector)
    }

    /// Vectorize many documents.
    pub fn transform_batch<D: AsRef<[String]>>(&self, documents: &[D]) -> Result<Vec<SparseVector>> {
        documents
            .iter()
            .map(|document| self.transform(document.as_ref()))
            .collect()
    }

    /// `fit` followed by `transform_batch`.
    pub fn fit_transform<D: AsRef<[String]>>(&mut self, documents: &[D]) -> Result<Vec<SparseVector>> {
        self.fit(documents)?;
        self.transform_batch(documents)
    }

    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    /// Get the size of the vocabulary.
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Column of a term, if it is in the vocabulary.
    pub fn column(&self, term: &str) -> Option<u32> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn n_documents(&self) -> usize {
        self.n_documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(raw: &[&str]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|d| d.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_vocabulary_is_alphabetical_without_stop_words() {
        let documents = docs(&["happi dog the", "sad cat", "dog cat amongst"]);
        let mut vectorizer = TfIdfVectorizer::new();
        vectorizer.fit(&documents).unwrap();

        assert_eq!(vectorizer.vocabulary_size(), 4);
        assert_eq!(vectorizer.column("cat"), Some(0));
        assert_eq!(vectorizer.column("dog"), Some(1));
        assert_eq!(vectorizer.column("happi"), Some(2));
        assert_eq!(vectorizer.column("sad"), Some(3));
        assert_eq!(vectorizer.column("the"), None);
        assert_eq!(vectorizer.column("amongst"), None);
    }

    #[test]
    fn test_smoothed_idf_and_l2_rows() {
        let documents = docs(&["a1 b1", "a1", "a1 a1 c1"]);
        let mut vectorizer = TfIdfVectorizer::new();
        let rows = vectorizer.fit_transform(&documents).unwrap();

        // df(a1) = 3, df(b1) = 1 with n = 3
        let idf_a = (4.0f64 / 4.0).ln() + 1.0;
        let idf_b = (4.0f64 / 2.0).ln() + 1.0;
        assert!((vectorizer.idf()[0] - idf_a).abs() < 1e-12);
        assert!((vectorizer.idf()[1] - idf_b).abs() < 1e-12);

        for row in &rows {
            assert!((row.squared_norm() - 1.0).abs() < 1e-12);
        }
        assert_eq!(rows[1].indices(), &[0]);

        // raw counts: a1 appears twice in the third document
        let third = rows[2].to_dense(3);
        let idf_c = (4.0f64 / 2.0).ln() + 1.0;
        let expected_ratio = (2.0 * idf_a) / idf_c;
        assert!((third[0] / third[2] - expected_ratio).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_terms_are_ignored() {
        let mut vectorizer = TfIdfVectorizer::new();
        vectorizer.fit(&docs(&["happi", "sad"])).unwrap();
        let row = vectorizer
            .transform(&["unseen".to_string(), "sad".to_string()])
            .unwrap();
        assert_eq!(row.indices(), &[1]);
        assert!(vectorizer.transform(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_empty_vocabulary() {
        let mut vectorizer = TfIdfVectorizer::new();
        assert!(vectorizer.fit(&docs(&["the", "", "amongst"])).is_err());
        assert!(vectorizer.transform(&["x".to_string()]).is_err());
    }
}
