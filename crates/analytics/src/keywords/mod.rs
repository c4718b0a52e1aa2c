//! Named-entity-aware key-phrase extraction.
//!
//! Candidate n-grams from the normalized body are ranked against the
//! document embedding and selected with maximal marginal relevance, so
//! the final list balances relevance with diversity. Captured entities
//! survive normalization untouched and are restored to their original
//! surface form at the end.

mod entities;
mod lemma;

pub use entities::{extract_entities, surface_map, Entity, EntityKind};
pub use lemma::lemmatize;

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::embedding::{cosine, SharedEmbedder};
use crate::text::{split_sentences, token_windows};

/// Punctuation preserved during normalization.
const KEPT_PUNCTUATION: [char; 7] = ['$', '%', '\'', '(', ')', '-', '.'];

/// Sentences dropped from the end of each article (disclaimer tails).
const TRAILING_SENTENCES: usize = 3;

const STOP_WORDS: [&str; 79] = [
    "a", "about", "above", "after", "again", "all", "an", "and", "any", "are", "as", "at", "be",
    "because", "been", "before", "being", "below", "between", "both", "but", "by", "could", "did",
    "do", "does", "down", "during", "each", "few", "for", "from", "further", "had", "has", "have",
    "he", "her", "here", "his", "how", "i", "if", "in", "into", "is", "it", "its", "just", "more",
    "most", "no", "not", "now", "of", "on", "once", "only", "or", "other", "our", "out", "over",
    "own", "said", "same", "she", "so", "some", "such", "than", "that", "the", "their", "then",
    "there", "they", "this", "to",
];

/// Extraction parameters.
#[derive(Debug, Clone)]
pub struct KeywordConfig {
    /// Phrases returned.
    pub top_n: usize,
    /// Candidate pool fed to MMR.
    pub pool_size: usize,
    /// MMR diversity weight in [0, 1].
    pub diversity: f64,
    /// Longest n-gram considered.
    pub max_ngram: usize,
    /// Token count above which the body is chunked.
    pub chunk_tokens: usize,
    /// Tokens shared between neighbouring chunks.
    pub chunk_overlap: usize,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            pool_size: 60,
            diversity: 0.5,
            max_ngram: 3,
            chunk_tokens: 500,
            chunk_overlap: 50,
        }
    }
}

/// A scored key phrase.
#[derive(Debug, Clone, Serialize)]
pub struct Keyword {
    pub phrase: String,
    pub score: f64,
}

/// Key-phrase extractor sharing the process embedder.
pub struct KeywordExtractor {
    embedder: SharedEmbedder,
    config: KeywordConfig,
}

impl KeywordExtractor {
    /// Creates a new extractor.
    #[must_use]
    pub fn new(embedder: SharedEmbedder, config: KeywordConfig) -> Self {
        Self { embedder, config }
    }

    /// Extracts up to `top_n` key phrases from an article body.
    ///
    /// `body_tokens` is the caller's tokenization of the same body (the
    /// reference count shared with the summarizer); it decides whether
    /// the chunked path runs.
    #[must_use]
    pub fn extract(&self, body: &str, body_tokens: &[String]) -> Vec<Keyword> {
        let entities = extract_entities(body);
        let surfaces = surface_map(&entities);
        let entity_tokens: HashSet<&str> = surfaces.keys().map(String::as_str).collect();

        let trimmed = trim_disclaimer(body);
        let normalized = normalize_tokens(&trimmed, &entity_tokens);

        let mut keywords = if body_tokens.len() > self.config.chunk_tokens {
            self.extract_chunked(&normalized)
        } else {
            self.extract_from_tokens(&normalized)
        };

        restore_surfaces(&mut keywords, &surfaces);
        keywords
    }

    fn extract_chunked(&self, tokens: &[String]) -> Vec<Keyword> {
        let windows = token_windows(tokens, self.config.chunk_tokens, self.config.chunk_overlap);

        let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
        for window in &windows {
            for keyword in self.extract_from_tokens(window) {
                let slot = sums.entry(keyword.phrase).or_insert((0.0, 0));
                slot.0 += keyword.score;
                slot.1 += 1;
            }
        }

        let mut merged: Vec<Keyword> = sums
            .into_iter()
            .map(|(phrase, (sum, count))| Keyword {
                phrase,
                score: sum / count as f64,
            })
            .collect();
        sort_keywords(&mut merged);
        merged.truncate(self.config.top_n);
        merged
    }

    fn extract_from_tokens(&self, tokens: &[String]) -> Vec<Keyword> {
        let candidates = candidate_phrases(tokens, self.config.max_ngram, self.config.pool_size);
        if candidates.is_empty() {
            return Vec::new();
        }

        let document = self.embedder.embed(&tokens.join(" "));
        let vectors: Vec<Vec<f32>> = candidates
            .iter()
            .map(|phrase| self.embedder.embed(phrase))
            .collect();
        let relevance: Vec<f64> = vectors
            .iter()
            .map(|v| f64::from(cosine(v, &document)).clamp(0.0, 1.0))
            .collect();

        let selected = mmr_select(
            &vectors,
            &relevance,
            self.config.top_n,
            self.config.diversity,
        );

        let mut keywords: Vec<Keyword> = selected
            .into_iter()
            .map(|i| Keyword {
                phrase: candidates[i].clone(),
                score: relevance[i],
            })
            .collect();
        sort_keywords(&mut keywords);
        keywords
    }
}

/// Drops the trailing disclaimer sentences when the article is long
/// enough to have any.
#[must_use]
pub fn trim_disclaimer(body: &str) -> String {
    let sentences = split_sentences(body);
    if sentences.len() > TRAILING_SENTENCES {
        sentences[..sentences.len() - TRAILING_SENTENCES].join(" ")
    } else {
        body.to_string()
    }
}

/// Normalizes text for candidate generation.
///
/// Lowercases, strips punctuation except `$ % ' ( ) -`, lemmatizes
/// alphabetic tokens, and passes entity tokens through unchanged.
#[must_use]
pub fn normalize_tokens(text: &str, entity_tokens: &HashSet<&str>) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|raw| {
            let lowered: String = raw
                .to_lowercase()
                .chars()
                .filter(|c| c.is_alphanumeric() || KEPT_PUNCTUATION.contains(c))
                .collect();
            let token = lowered.trim_matches('.').to_string();
            if token.is_empty() {
                return None;
            }
            if entity_tokens.contains(token.as_str()) {
                return Some(token);
            }
            if token.chars().all(char::is_alphabetic) {
                return Some(lemmatize(&token));
            }
            Some(token)
        })
        .collect()
}

/// Builds the candidate pool: unique n-grams without stop-word edges,
/// ranked by frequency.
fn candidate_phrases(tokens: &[String], max_ngram: usize, pool_size: usize) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for n in 1..=max_ngram {
        for gram in tokens.windows(n) {
            if !valid_candidate(gram) {
                continue;
            }
            *counts.entry(gram.join(" ")).or_insert(0) += 1;
        }
    }

    let mut pool: Vec<(String, usize)> = counts.into_iter().collect();
    pool.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    pool.truncate(pool_size);
    pool.into_iter().map(|(phrase, _)| phrase).collect()
}

fn valid_candidate(gram: &[String]) -> bool {
    let edge_stop = |t: &String| STOP_WORDS.contains(&t.as_str());
    if gram.first().is_some_and(edge_stop) || gram.last().is_some_and(edge_stop) {
        return false;
    }
    gram.iter().all(|t| t.chars().any(char::is_alphanumeric))
}

/// Maximal marginal relevance selection.
///
/// Greedy: each round picks the candidate maximizing
/// `(1 - diversity) * relevance - diversity * max_similarity_to_selected`.
fn mmr_select(
    vectors: &[Vec<f32>],
    relevance: &[f64],
    top_n: usize,
    diversity: f64,
) -> Vec<usize> {
    let n = vectors.len();
    let mut selected: Vec<usize> = Vec::with_capacity(top_n.min(n));
    let mut remaining: Vec<usize> = (0..n).collect();

    while selected.len() < top_n && !remaining.is_empty() {
        let mut best = remaining[0];
        let mut best_score = f64::NEG_INFINITY;

        for &i in &remaining {
            let redundancy = selected
                .iter()
                .map(|&s| f64::from(cosine(&vectors[i], &vectors[s])))
                .fold(0.0f64, f64::max);
            let score = if selected.is_empty() {
                relevance[i]
            } else {
                (1.0 - diversity) * relevance[i] - diversity * redundancy
            };
            if score > best_score {
                best_score = score;
                best = i;
            }
        }

        selected.push(best);
        remaining.retain(|&i| i != best);
    }
    selected
}

fn restore_surfaces(keywords: &mut [Keyword], surfaces: &HashMap<String, String>) {
    for keyword in keywords.iter_mut() {
        keyword.phrase = keyword
            .phrase
            .split(' ')
            .map(|token| {
                surfaces
                    .get(token)
                    .map_or_else(|| token.to_string(), String::clone)
            })
            .collect::<Vec<String>>()
            .join(" ");
    }
}

fn sort_keywords(keywords: &mut [Keyword]) {
    keywords.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.phrase.cmp(&b.phrase))
    });
}
