//! TF-IDF feature vectorizer
//!
//! Fitted once on the training partition during preprocessing, persisted
//! as an opaque JSON blob, and reloaded at serve time. `transform` takes
//! `&self`: a fitted vectorizer can never be mutated by later use, so the
//! training/test partitions are guaranteed to see the same vocabulary.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::platform::ObjectStore;

/// Maximum vocabulary size. Transform output dimension equals the number
/// of terms actually selected (corpora smaller than this yield fewer).
pub const MAX_FEATURES: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Fit a vectorizer on a corpus of cleaned documents.
    ///
    /// Vocabulary is the top `max_features` tokens by corpus frequency,
    /// ties broken alphabetically; indices are assigned alphabetically
    /// over the selected terms. IDF is smoothed:
    /// `ln((1 + n) / (1 + df)) + 1`.
    pub fn fit(docs: &[String], max_features: usize) -> Self {
        let mut corpus_tf: HashMap<String, u64> = HashMap::new();
        let mut df: HashMap<String, u64> = HashMap::new();

        for doc in docs {
            let tokens = tokenize(doc);
            for token in &tokens {
                *corpus_tf.entry(token.clone()).or_insert(0) += 1;
            }
            let unique: HashSet<&String> = tokens.iter().collect();
            for token in unique {
                *df.entry(token.clone()).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, u64)> = corpus_tf.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(max_features);

        let mut selected: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        selected.sort();

        let n = docs.len() as f64;
        let mut vocabulary = HashMap::with_capacity(selected.len());
        let mut idf = Vec::with_capacity(selected.len());
        for (index, term) in selected.into_iter().enumerate() {
            let term_df = df.get(&term).copied().unwrap_or(0) as f64;
            idf.push(((1.0 + n) / (1.0 + term_df)).ln() + 1.0);
            vocabulary.insert(term, index);
        }

        Self { vocabulary, idf }
    }

    /// Transform text into an L2-normalized TF-IDF vector.
    ///
    /// Empty or whitespace-only text yields the zero vector; that is
    /// accepted behavior, not an error.
    pub fn transform(&self, text: &str) -> Vec<f64> {
        let mut features = vec![0.0; self.idf.len()];
        for token in tokenize(text) {
            if let Some(&index) = self.vocabulary.get(&token) {
                features[index] += 1.0;
            }
        }
        for (index, value) in features.iter_mut().enumerate() {
            *value *= self.idf[index];
        }
        let norm = features.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in &mut features {
                *value /= norm;
            }
        }
        features
    }

    /// Transform output dimension.
    pub fn dimension(&self) -> usize {
        self.idf.len()
    }

    pub fn to_json(&self) -> Result<Vec<u8>, AppError> {
        serde_json::to_vec(self)
            .map_err(|e| AppError::Dataset(format!("failed to serialize vectorizer: {}", e)))
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, AppError> {
        serde_json::from_slice(bytes)
            .map_err(|e| AppError::Dataset(format!("failed to deserialize vectorizer: {}", e)))
    }
}

/// Fetch and deserialize the persisted vectorizer. Called exactly once at
/// server startup; any failure here aborts the process before it serves.
pub async fn load_from_store(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
) -> Result<TfidfVectorizer, AppError> {
    store.head_bucket(bucket).await?;
    store.head_object(bucket, key).await?;
    let bytes = store.get_object(bucket, key).await?;
    let vectorizer = TfidfVectorizer::from_json(&bytes)?;
    tracing::info!(
        "Loaded vectorizer from s3://{}/{} ({} features)",
        bucket,
        key,
        vectorizer.dimension()
    );
    Ok(vectorizer)
}

/// Lowercased alphanumeric runs of at least two characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(|t| t.to_lowercase())
        .collect()
}

/// Encode a feature vector as a single-row, header-less delimited record.
pub fn csv_row(features: &[f64]) -> String {
    features
        .iter()
        .map(|v| format!("{:.6}", v))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "produk ini bagus sekali".to_string(),
            "produk jelek kecewa".to_string(),
            "bagus dan murah".to_string(),
        ]
    }

    #[test]
    fn fit_selects_top_terms_with_alphabetical_ties() {
        let vectorizer = TfidfVectorizer::fit(&corpus(), 3);
        assert_eq!(vectorizer.dimension(), 3);
        // "produk" and "bagus" appear twice; the third slot goes to the
        // alphabetically-first of the single-occurrence terms.
        let mut terms: Vec<&String> = vectorizer.vocabulary.keys().collect();
        terms.sort();
        assert_eq!(terms, vec!["bagus", "dan", "produk"]);
    }

    #[test]
    fn transform_is_l2_normalized() {
        let vectorizer = TfidfVectorizer::fit(&corpus(), MAX_FEATURES);
        let features = vectorizer.transform("produk bagus");
        let norm: f64 = features.iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_text_yields_zero_vector() {
        let vectorizer = TfidfVectorizer::fit(&corpus(), MAX_FEATURES);
        for text in ["", "   ", "\t\n"] {
            let features = vectorizer.transform(text);
            assert_eq!(features.len(), vectorizer.dimension());
            assert!(features.iter().all(|v| *v == 0.0));
        }
    }

    #[test]
    fn unknown_tokens_are_ignored() {
        let vectorizer = TfidfVectorizer::fit(&corpus(), MAX_FEATURES);
        let zero = vectorizer.transform("zzz qqq www");
        assert!(zero.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn transform_does_not_mutate_fitted_state() {
        let vectorizer = TfidfVectorizer::fit(&corpus(), MAX_FEATURES);
        let before = vectorizer.transform("produk ini bagus sekali");
        // "Transforming the test partition" a few times...
        for _ in 0..5 {
            vectorizer.transform("kiriman lambat kecewa berat");
        }
        let after = vectorizer.transform("produk ini bagus sekali");
        assert_eq!(before, after);
    }

    #[test]
    fn persisted_vectorizer_round_trips() {
        let vectorizer = TfidfVectorizer::fit(&corpus(), MAX_FEATURES);
        let blob = vectorizer.to_json().unwrap();
        let reloaded = TfidfVectorizer::from_json(&blob).unwrap();
        assert_eq!(reloaded, vectorizer);
        let text = "produk bagus murah";
        assert_eq!(reloaded.transform(text), vectorizer.transform(text));
    }

    #[test]
    fn tokenize_drops_single_characters_and_punctuation() {
        assert_eq!(
            tokenize("A b! produk-nya OK 99"),
            vec!["produk", "nya", "ok", "99"]
        );
    }

    #[test]
    fn csv_row_is_headerless_fixed_precision() {
        assert_eq!(csv_row(&[1.0, 0.0, 0.25]), "1.000000,0.000000,0.250000");
        assert_eq!(csv_row(&[]), "");
    }
}
