//! Deterministic Spanish text normalization.
//!
//! Six fixed steps: segment, lowercase, spell out digit tokens, strip
//! punctuation, fold to ASCII, drop stopwords. The order is part of the
//! model contract — a snapshot trained with one pipeline must normalize
//! predict-time input identically, across process restarts.

use crate::config::OdstagConfig;
use crate::numword;
use crate::stopwords;
use crate::{OdsError, corpus};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Spanish,
}

impl Language {
    pub fn stemmer(self) -> rust_stemmers::Stemmer {
        match self {
            Language::Spanish => {
                rust_stemmers::Stemmer::create(rust_stemmers::Algorithm::Spanish)
            }
        }
    }
}

/// Embedded in every model snapshot so retrained and reloaded models
/// normalize exactly like the run that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    pub language: Language,
    #[serde(default)]
    pub extra_stopwords: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        NormalizerConfig {
            language: Language::Spanish,
            extra_stopwords: Vec::new(),
        }
    }
}

/// Anything that is not a Unicode word character.
static PUNCT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w]").expect("punct pattern"));

pub struct TextNormalizer {
    config: NormalizerConfig,
    stopwords: HashSet<String>,
}

impl TextNormalizer {
    /// Stopword entries are folded through the same lowercase/ASCII steps
    /// as tokens: by the time stopwords are matched, every token is folded,
    /// so the set must be too.
    pub fn new(config: NormalizerConfig) -> Self {
        let mut set = HashSet::new();
        let builtin = stopwords::builtin(config.language).iter().copied();
        let extra = config.extra_stopwords.iter().map(String::as_str);
        for word in builtin.chain(extra) {
            let folded = ascii_fold(&word.to_lowercase());
            if !folded.is_empty() {
                set.insert(folded);
            }
        }
        TextNormalizer {
            config,
            stopwords: set,
        }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Run the full pipeline. Empty input and input that reduces to nothing
    /// both yield an empty token sequence, never an error.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        for word in text.unicode_words() {
            let lower = word.to_lowercase();
            // Pure-digit tokens expand to their spelled-out cardinal; a
            // multi-word spelling contributes one token per word.
            let expanded = match numword::spell_digit_token(&lower) {
                Some(words) => words,
                None => vec![lower],
            };
            for token in expanded {
                let stripped = PUNCT.replace_all(&token, "");
                let folded = ascii_fold(&stripped);
                if folded.is_empty() || self.stopwords.contains(&folded) {
                    continue;
                }
                out.push(folded);
            }
        }
        out
    }
}

/// NFKD-decompose and keep only ASCII: "educación" → "educacion",
/// non-Latin scripts vanish.
fn ascii_fold(token: &str) -> String {
    token.nfkd().filter(char::is_ascii).collect()
}

/// Snowball-stem a normalized token sequence. Applied at vectorization time
/// (train and predict alike), never inside `normalize`, so stored corpora
/// stay unstemmed.
pub fn stem_tokens(language: Language, tokens: &[String]) -> Vec<String> {
    stem_with(&language.stemmer(), tokens)
}

/// Same, reusing a caller-held stemmer across many documents.
pub fn stem_with(stemmer: &rust_stemmers::Stemmer, tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .map(|t| stemmer.stem(t).into_owned())
        .collect()
}

/// `normalize` subcommand: print the token sequence for each input text.
pub fn handle_normalize(config: &OdstagConfig, file: Option<&Path>) -> Result<(), OdsError> {
    let raw = corpus::read_batch_source(file)?;
    let texts = corpus::texts_from_json(&raw)?;

    let normalizer = TextNormalizer::new(crate::config::resolve_normalizer_config(config));
    let tokenized: Vec<Vec<String>> = texts.iter().map(|t| normalizer.normalize(t)).collect();

    println!("{}", serde_json::to_string(&tokenized)?);
    eprintln!("odstag: normalized {} text(s)", tokenized.len());
    Ok(())
}
