//! Vocabulary loading and phrase matching over tokenized text.
//!
//! Text and vocabulary phrases are split by the same tokenizer, and a phrase
//! matches only where its whole token sequence appears in the text. This keeps
//! `"climate"` from matching inside `"climatetech"` and lets punctuation act as
//! a boundary (`"climate,"` still counts as `"climate"`).
//!
//! Matching is case-sensitive. Overlapping matches of different terms are all
//! reported, so `"climate change"` in the text counts for both `"climate"` and
//! `"climate change"` when both are in the vocabulary.

use crate::error::{CountError, Result};
use crate::models::TermCounts;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, instrument};

/// A run of word characters, or one punctuation/symbol character.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{L}\p{N}\p{M}_]+|[^\s\p{L}\p{N}\p{M}_]").expect("token pattern is valid")
});

/// Split `text` into tokens, discarding whitespace.
pub fn tokenize(text: &str) -> Vec<&str> {
    TOKEN_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// The fixed, ordered, duplicate-free set of phrases counted in every article.
#[derive(Debug, Clone, PartialEq)]
pub struct TermVocabulary {
    terms: Vec<String>,
}

impl TermVocabulary {
    /// Trim each phrase, skip blanks, keep the first occurrence of duplicates.
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .unique()
            .collect();
        Self { terms }
    }

    /// Read a one-phrase-per-line vocabulary file.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CountError::Config(format!("cannot read vocabulary {}: {e}", path.display()))
        })?;
        let vocabulary = Self::new(raw.lines());
        if vocabulary.is_empty() {
            return Err(CountError::Config(format!(
                "vocabulary {} contains no terms",
                path.display()
            )));
        }
        info!(terms = vocabulary.len(), "Loaded vocabulary");
        Ok(vocabulary)
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Phrase patterns indexed by their first token. Built once per run.
#[derive(Debug, Clone)]
pub struct TermMatcher {
    /// first token -> (remaining tokens, term)
    patterns: HashMap<String, Vec<(Vec<String>, String)>>,
}

impl TermMatcher {
    pub fn new(vocabulary: &TermVocabulary) -> Self {
        let mut patterns: HashMap<String, Vec<(Vec<String>, String)>> = HashMap::new();
        let mut seen: Vec<Vec<String>> = Vec::new();

        for term in vocabulary.terms() {
            let tokens: Vec<String> = tokenize(term).into_iter().map(str::to_string).collect();
            let Some((first, rest)) = tokens.split_first() else {
                continue;
            };
            // Two terms that tokenize identically match the same spans; the first one owns them.
            if seen.contains(&tokens) {
                debug!(%term, "Term duplicates an earlier pattern; skipping");
                continue;
            }
            seen.push(tokens.clone());
            patterns
                .entry(first.clone())
                .or_default()
                .push((rest.to_vec(), term.clone()));
        }

        Self { patterns }
    }

    /// Every occurrence of every vocabulary phrase in `text`, in text order.
    pub fn find_matches(&self, text: &str) -> Vec<String> {
        let tokens = tokenize(text);
        let mut matches = Vec::new();

        for (i, token) in tokens.iter().enumerate() {
            let Some(candidates) = self.patterns.get(*token) else {
                continue;
            };
            let after = &tokens[i + 1..];
            for (rest, term) in candidates {
                if rest.len() <= after.len() && rest.iter().zip(after).all(|(p, t)| p == t) {
                    matches.push(term.clone());
                }
            }
        }

        matches
    }
}

/// One entry per distinct vocabulary term, counting how often it appears in `matches`.
///
/// Strings in `matches` that are not vocabulary terms are ignored.
pub fn count(vocabulary: &TermVocabulary, matches: &[String]) -> TermCounts {
    let mut counts: TermCounts = vocabulary.terms().iter().map(|t| (t.clone(), 0)).collect();
    for m in matches {
        if let Some(n) = counts.get_mut(m) {
            *n += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vocab(terms: &[&str]) -> TermVocabulary {
        TermVocabulary::new(terms.iter().copied())
    }

    #[test]
    fn test_tokenize_splits_words_and_punctuation() {
        assert_eq!(
            tokenize("Climate-change, it's   real."),
            vec!["Climate", "-", "change", ",", "it", "'", "s", "real", "."]
        );
        assert!(tokenize("   \n\t").is_empty());
    }

    #[test]
    fn test_tokenize_keeps_unicode_words() {
        assert_eq!(tokenize("réchauffement CO₂"), vec!["réchauffement", "CO₂"]);
    }

    #[test]
    fn test_vocabulary_trims_and_dedupes_in_order() {
        let v = vocab(&["  warming ", "climate", "", "warming", "climate change"]);
        assert_eq!(v.terms(), &["warming", "climate", "climate change"]);
    }

    #[test]
    fn test_vocabulary_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "climate\nglobal warming\n\nclimate\n").unwrap();
        let v = TermVocabulary::load(file.path()).unwrap();
        assert_eq!(v.terms(), &["climate", "global warming"]);
    }

    #[test]
    fn test_vocabulary_load_errors() {
        let missing = TermVocabulary::load(Path::new("/nonexistent/terms.txt"));
        assert!(matches!(missing, Err(CountError::Config(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "\n   \n").unwrap();
        assert!(matches!(
            TermVocabulary::load(file.path()),
            Err(CountError::Config(_))
        ));
    }

    #[test]
    fn test_matches_whole_tokens_only() {
        let m = TermMatcher::new(&vocab(&["climate"]));
        let found = m.find_matches("climate, climatetech and Climate and climate.");
        assert_eq!(found, vec!["climate", "climate"]);
    }

    #[test]
    fn test_matches_multi_token_phrases_and_overlaps() {
        let v = vocab(&["climate", "climate change", "change"]);
        let m = TermMatcher::new(&v);
        let found = m.find_matches("Is climate change real? The climate\nchange debate.");
        assert_eq!(
            found,
            vec![
                "climate",
                "climate change",
                "change",
                "climate",
                "climate change",
                "change"
            ]
        );
    }

    #[test]
    fn test_phrase_does_not_match_partial_sequence() {
        let m = TermMatcher::new(&vocab(&["sea level rise"]));
        assert!(m.find_matches("the sea level is rising").is_empty());
        assert!(m.find_matches("sea level").is_empty());
        assert_eq!(m.find_matches("sea level rise."), vec!["sea level rise"]);
    }

    #[test]
    fn test_punctuated_terms() {
        let m = TermMatcher::new(&vocab(&["CO2", "net-zero"]));
        let found = m.find_matches("Cutting CO2 to reach net-zero, not net zero.");
        assert_eq!(found, vec!["CO2", "net-zero"]);
    }

    #[test]
    fn test_identically_tokenized_terms_share_one_pattern() {
        let v = vocab(&["climate change", "climate  change"]);
        let m = TermMatcher::new(&v);
        assert_eq!(m.find_matches("climate change"), vec!["climate change"]);
    }

    #[test]
    fn test_count_example() {
        let v = vocab(&["climate", "warming"]);
        let counts = count(&v, &["climate".to_string(), "climate".to_string()]);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["climate"], 2);
        assert_eq!(counts["warming"], 0);
    }

    #[test]
    fn test_count_has_every_term_and_sums_to_matches() {
        let v = vocab(&["a", "b", "c", "a"]);
        let matches: Vec<String> = ["a", "c", "a", "c", "c"].iter().map(|s| s.to_string()).collect();
        let counts = count(&v, &matches);
        assert_eq!(counts.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(counts.values().sum::<usize>(), matches.len());
    }

    #[test]
    fn test_count_ignores_unknown_matches() {
        let v = vocab(&["climate"]);
        let counts = count(&v, &["weather".to_string()]);
        assert_eq!(counts["climate"], 0);
        assert_eq!(counts.len(), 1);
    }

    #[test]
    fn test_count_with_no_matches() {
        let v = vocab(&["x", "y"]);
        let counts = count(&v, &[]);
        assert!(counts.values().all(|&n| n == 0));
        assert_eq!(counts.len(), 2);
    }
}
