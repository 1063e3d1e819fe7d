//! Multinomial naive Bayes over token counts.
//!
//! Pure Rust fit + inference, no external ML crate — state is plain serde
//! data so model snapshots persist as JSON. This module is the classifier
//! seam: swapping in a different estimator touches nothing outside it.

use crate::OdsError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Trained classifier state. Immutable once fitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultinomialNb {
    pub alpha: f64,
    /// Ascending; positions index into the per-class vectors below.
    pub classes: Vec<u32>,
    pub class_log_prior: Vec<f64>,
    /// token → per-class smoothed log likelihood.
    pub feature_log_prob: HashMap<String, Vec<f64>>,
}

impl MultinomialNb {
    /// Full fit from scratch — no warm start, no incremental update.
    /// `docs` are stemmed token sequences, one per label.
    pub fn fit(docs: &[Vec<String>], labels: &[u32], alpha: f64) -> Result<MultinomialNb, OdsError> {
        if docs.len() != labels.len() {
            return Err(OdsError::Training(format!(
                "documents and labels disagree: {} vs {}",
                docs.len(),
                labels.len()
            )));
        }
        if docs.is_empty() {
            return Err(OdsError::Training("corpus is empty".into()));
        }

        let mut classes: Vec<u32> = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();
        let class_index: HashMap<u32, usize> =
            classes.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        let n_classes = classes.len();

        let mut token_counts: HashMap<String, Vec<f64>> = HashMap::new();
        let mut class_token_totals = vec![0.0; n_classes];
        let mut class_doc_counts = vec![0.0; n_classes];

        for (doc, label) in docs.iter().zip(labels) {
            let ci = class_index[label];
            class_doc_counts[ci] += 1.0;
            for token in doc {
                token_counts
                    .entry(token.clone())
                    .or_insert_with(|| vec![0.0; n_classes])[ci] += 1.0;
                class_token_totals[ci] += 1.0;
            }
        }

        if token_counts.is_empty() {
            return Err(OdsError::Training(
                "empty vocabulary: no tokens survive normalization".into(),
            ));
        }

        let vocab_size = token_counts.len() as f64;
        let total_docs = docs.len() as f64;
        let class_log_prior = class_doc_counts
            .iter()
            .map(|&n| (n / total_docs).ln())
            .collect();

        let feature_log_prob = token_counts
            .into_iter()
            .map(|(token, counts)| {
                let probs = counts
                    .iter()
                    .enumerate()
                    .map(|(ci, &c)| {
                        ((c + alpha) / (class_token_totals[ci] + alpha * vocab_size)).ln()
                    })
                    .collect();
                (token, probs)
            })
            .collect();

        Ok(MultinomialNb {
            alpha,
            classes,
            class_log_prior,
            feature_log_prob,
        })
    }

    /// Argmax class with its normalized posterior as confidence.
    ///
    /// Total for any token sequence: out-of-vocabulary tokens are skipped,
    /// and an empty or fully-unknown document degrades to the class priors.
    pub fn predict(&self, tokens: &[String]) -> Result<(u32, f64), OdsError> {
        let mut scores = self.class_log_prior.clone();
        for token in tokens {
            if let Some(log_probs) = self.feature_log_prob.get(token) {
                for (score, lp) in scores.iter_mut().zip(log_probs) {
                    *score += lp;
                }
            }
        }

        // first maximum wins, so ties resolve to the smallest class label
        let mut best: Option<(usize, f64)> = None;
        for (i, &s) in scores.iter().enumerate() {
            match best {
                Some((_, bs)) if s <= bs => {}
                _ => best = Some((i, s)),
            }
        }
        let Some((best_idx, best_score)) = best else {
            return Err(OdsError::Prediction("model has no classes".into()));
        };

        // log-sum-exp for a stable posterior
        let sum_exp: f64 = scores.iter().map(|&s| (s - best_score).exp()).sum();
        Ok((self.classes[best_idx], 1.0 / sum_exp))
    }

    pub fn vocabulary_size(&self) -> usize {
        self.feature_log_prob.len()
    }

    /// Internal consistency of deserialized state: every per-class vector
    /// must line up with the class list.
    pub fn is_coherent(&self) -> bool {
        !self.classes.is_empty()
            && self.class_log_prior.len() == self.classes.len()
            && self
                .feature_log_prob
                .values()
                .all(|v| v.len() == self.classes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    /// Three docs, two classes, alpha 1: small enough to check by hand.
    /// counts: agua c6=2 c7=0, rio c6=1 c7=0, sol c6=0 c7=1;
    /// class totals 3 and 1, vocabulary size 3.
    fn tiny_model() -> MultinomialNb {
        let docs = vec![doc(&["agua"]), doc(&["agua", "rio"]), doc(&["sol"])];
        MultinomialNb::fit(&docs, &[6, 6, 7], 1.0).unwrap()
    }

    #[test]
    fn fit_computes_smoothed_likelihoods() {
        let m = tiny_model();
        assert_eq!(m.classes, vec![6, 7]);
        assert_eq!(m.vocabulary_size(), 3);

        // prior: 2 of 3 docs are class 6
        assert!((m.class_log_prior[0] - (2.0f64 / 3.0).ln()).abs() < 1e-12);
        // agua in class 6: (2+1)/(3+3) = 1/2
        assert!((m.feature_log_prob["agua"][0] - 0.5f64.ln()).abs() < 1e-12);
        // agua in class 7: (0+1)/(1+3) = 1/4
        assert!((m.feature_log_prob["agua"][1] - 0.25f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn predict_posterior_by_hand() {
        let m = tiny_model();
        // P(6|agua) ∝ 2/3 * 1/2 = 1/3; P(7|agua) ∝ 1/3 * 1/4 = 1/12
        // posterior for 6 = (1/3) / (1/3 + 1/12) = 0.8
        let (label, confidence) = m.predict(&doc(&["agua"])).unwrap();
        assert_eq!(label, 6);
        assert!((confidence - 0.8).abs() < 1e-12);

        // P(6|sol) ∝ 2/3 * 1/6 = 1/9; P(7|sol) ∝ 1/3 * 1/2 = 1/6 → 7 wins at 0.6
        let (label, confidence) = m.predict(&doc(&["sol"])).unwrap();
        assert_eq!(label, 7);
        assert!((confidence - 0.6).abs() < 1e-12);
    }

    #[test]
    fn empty_and_unknown_documents_fall_back_to_priors() {
        let m = tiny_model();
        let (label, confidence) = m.predict(&[]).unwrap();
        assert_eq!(label, 6);
        assert!((confidence - 2.0 / 3.0).abs() < 1e-12);

        let (label2, confidence2) = m.predict(&doc(&["desconocido"])).unwrap();
        assert_eq!(label2, label);
        assert!((confidence2 - confidence).abs() < 1e-12);
    }

    #[test]
    fn single_class_is_always_certain() {
        let m = MultinomialNb::fit(&[doc(&["agua"])], &[6], 1.0).unwrap();
        let (label, confidence) = m.predict(&doc(&["sol"])).unwrap();
        assert_eq!(label, 6);
        assert!((confidence - 1.0).abs() < 1e-12);
    }

    #[test]
    fn fit_rejects_degenerate_corpora() {
        assert!(matches!(
            MultinomialNb::fit(&[], &[], 1.0),
            Err(OdsError::Training(_))
        ));
        assert!(matches!(
            MultinomialNb::fit(&[doc(&["a"])], &[1, 2], 1.0),
            Err(OdsError::Training(_))
        ));
        // docs present but nothing survives normalization
        let err = MultinomialNb::fit(&[vec![], vec![]], &[1, 2], 1.0).unwrap_err();
        assert!(matches!(&err, OdsError::Training(msg) if msg.contains("empty vocabulary")));
    }

    #[test]
    fn coherence_check_catches_truncated_state() {
        let mut m = tiny_model();
        assert!(m.is_coherent());
        m.class_log_prior.pop();
        assert!(!m.is_coherent());
    }
}
