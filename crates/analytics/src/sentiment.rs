//! Per-article and weekly sentiment aggregation.
//!
//! Scores come from the Loughran–McDonald lexicon: a token with a
//! positive weight contributes to the positive tally, one with a negative
//! weight to the negative tally, and a token can contribute to both. The
//! article mean is `(pos_sum - neg_sum) / (pos_cnt + neg_cnt)`, zero when
//! nothing matches.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use advisor_data::models::ArticleRecord;
use advisor_data::repositories::ArticleRepository;
use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::lexicon::{LexiconCache, LexiconEntry};

/// Match counts and weight sums for one article body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ArticleSentiment {
    pub positive_count: usize,
    pub negative_count: usize,
    pub positive_sum: f64,
    pub negative_sum: f64,
}

impl ArticleSentiment {
    /// Mean score; zero when no token matched.
    #[must_use]
    pub fn mean(&self) -> f64 {
        let matches = self.positive_count + self.negative_count;
        if matches == 0 {
            0.0
        } else {
            (self.positive_sum - self.negative_sum) / matches as f64
        }
    }
}

/// An article with its sentiment score, ready for ranking.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredArticle {
    pub ticker: String,
    pub sector: String,
    pub title: Option<String>,
    pub body: String,
    pub date: NaiveDate,
    pub week_start: NaiveDate,
    pub score: f64,
    pub positive_count: usize,
    pub negative_count: usize,
}

/// One week bucket with its mean score and top-3 articles.
///
/// This is the single weekly contract: callers that only need the scalar
/// read `mean` and ignore `top3`.
#[derive(Debug, Clone, Serialize)]
pub struct WeeklySentiment {
    pub week: NaiveDate,
    pub mean: f64,
    pub top3: Vec<ScoredArticle>,
}

/// Sentiment scorer over the lexicon cache and article store.
pub struct SentimentScorer {
    lexicon: Arc<LexiconCache>,
    articles: ArticleRepository,
}

impl SentimentScorer {
    /// Creates a new scorer.
    #[must_use]
    pub fn new(lexicon: Arc<LexiconCache>, articles: ArticleRepository) -> Self {
        Self { lexicon, articles }
    }

    /// Scores one article body; returns the mean score.
    pub async fn score_article(&self, body: &str) -> f64 {
        self.analyze_article(body).await.mean()
    }

    /// Scores one article body with full match detail.
    pub async fn analyze_article(&self, body: &str) -> ArticleSentiment {
        let map = self.lexicon.entries().await;
        let sentiment = score_tokens(&map, body);
        if sentiment.positive_count + sentiment.negative_count == 0 {
            warn!("article matched no lexicon tokens, scoring 0");
        }
        sentiment
    }

    /// Weekly sentiment for a ticker over `[start, end]`.
    ///
    /// Buckets articles into Sunday-anchored weeks and returns, per week,
    /// the arithmetic mean of article scores and the top three articles
    /// (score descending, positive-count descending, earlier date first).
    ///
    /// # Errors
    /// Returns an error if the article store is unavailable after retry.
    pub async fn weekly_sentiment(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WeeklySentiment>> {
        let records = self.articles.by_ticker(ticker, start, end).await?;
        let map = self.lexicon.entries().await;
        Ok(aggregate_weekly(&records, &map))
    }
}

/// Tokenizes a body for lexicon matching and tallies matches.
///
/// Uppercases, replaces non-alphanumeric characters with spaces, splits
/// on whitespace, and looks each token up in the map.
#[must_use]
pub fn score_tokens(map: &HashMap<String, LexiconEntry>, body: &str) -> ArticleSentiment {
    let cleaned: String = body
        .to_uppercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut sentiment = ArticleSentiment::default();
    for token in cleaned.split_whitespace() {
        let Some(entry) = map.get(token) else {
            continue;
        };
        if entry.positive > 0.0 {
            sentiment.positive_count += 1;
            sentiment.positive_sum += entry.positive;
        }
        if entry.negative > 0.0 {
            sentiment.negative_count += 1;
            sentiment.negative_sum += entry.negative;
        }
    }
    sentiment
}

/// Groups scored articles into week buckets with means and top-3 ranking.
#[must_use]
pub fn aggregate_weekly(
    records: &[ArticleRecord],
    map: &HashMap<String, LexiconEntry>,
) -> Vec<WeeklySentiment> {
    let mut buckets: BTreeMap<NaiveDate, Vec<ScoredArticle>> = BTreeMap::new();

    for record in records {
        let sentiment = score_tokens(map, &record.body);
        buckets
            .entry(record.week_start)
            .or_default()
            .push(ScoredArticle {
                ticker: record.ticker.clone(),
                sector: record.sector.clone(),
                title: record.title.clone(),
                body: record.body.clone(),
                date: record.date,
                week_start: record.week_start,
                score: sentiment.mean(),
                positive_count: sentiment.positive_count,
                negative_count: sentiment.negative_count,
            });
    }

    buckets
        .into_iter()
        .map(|(week, scored)| {
            let mean = scored.iter().map(|a| a.score).sum::<f64>() / scored.len() as f64;
            WeeklySentiment {
                week,
                mean,
                top3: top3_of_week(scored),
            }
        })
        .collect()
}

/// Ranks one week's articles and keeps the top three.
#[must_use]
pub fn top3_of_week(mut scored: Vec<ScoredArticle>) -> Vec<ScoredArticle> {
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.positive_count.cmp(&a.positive_count))
            .then(a.date.cmp(&b.date))
    });
    scored.truncate(3);
    scored
}
