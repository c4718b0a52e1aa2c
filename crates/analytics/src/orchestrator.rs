//! Weekly analytics orchestrator.
//!
//! Composes the calendar, article gateway, selector, scorer, keyword
//! extractor, and summarizer behind the three analytics entry points.
//! Within one request the selector runs first (where it applies), then
//! sentiment, then keywords and summary, which share the body
//! tokenization. Sub-failures degrade single fields; only store outages
//! and caller mistakes surface as errors.

use advisor_core::{parse_date, week_start, AdvisorError, AnalyticsConfig};
use advisor_data::models::ArticleRecord;
use advisor_data::repositories::ArticleRepository;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::keywords::{Keyword, KeywordExtractor};
use crate::sentiment::{ScoredArticle, SentimentScorer};
use crate::summarize::Summarizer;
use crate::text::tokenize;
use crate::top3::Top3Selector;

/// Keywords kept on the wire-facing record.
const KEYWORDS_PER_ARTICLE: usize = 5;

/// Stock entry point input.
#[derive(Debug, Clone, Deserialize)]
pub struct StockWeeklyRequest {
    pub ticker: String,
    pub start: String,
    pub end: String,
}

/// Industry entry point input.
#[derive(Debug, Clone, Deserialize)]
pub struct IndustryWeeklyRequest {
    pub sector: String,
    pub date: String,
}

/// Market entry point input.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketWeeklyRequest {
    pub date: String,
}

/// A representative article with its enrichments.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedArticle {
    pub ticker: String,
    pub sector: String,
    pub title: Option<String>,
    pub body: String,
    pub date: NaiveDate,
    pub week_start: NaiveDate,
    pub score: f64,
    pub keywords: Vec<Keyword>,
    pub summary: String,
}

/// One week's analytics response.
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyReport {
    pub week: NaiveDate,
    pub top3_articles: Vec<EnrichedArticle>,
}

/// The weekly analytics pipeline.
pub struct WeeklyAnalytics {
    articles: ArticleRepository,
    scorer: SentimentScorer,
    selector: Top3Selector,
    keywords: KeywordExtractor,
    summarizer: Summarizer,
    max_articles_per_week: usize,
}

impl WeeklyAnalytics {
    /// Wires the pipeline together.
    #[must_use]
    pub fn new(
        articles: ArticleRepository,
        scorer: SentimentScorer,
        selector: Top3Selector,
        keywords: KeywordExtractor,
        summarizer: Summarizer,
        config: &AnalyticsConfig,
    ) -> Self {
        Self {
            articles,
            scorer,
            selector,
            keywords,
            summarizer,
            max_articles_per_week: config.max_articles_per_week,
        }
    }

    /// Weekly top-3 reports for one ticker over a date range.
    ///
    /// Each week's articles are ranked by sentiment; the top three are
    /// enriched with keywords and a summary.
    ///
    /// # Errors
    /// Returns a client error for malformed dates, a server error when
    /// the article store stays unavailable after retry.
    pub async fn stock_weekly(
        &self,
        request: &StockWeeklyRequest,
    ) -> Result<Vec<WeeklyReport>, AdvisorError> {
        let start = parse_date(&request.start)?;
        let end = parse_date(&request.end)?;

        let weeks = self
            .scorer
            .weekly_sentiment(&request.ticker, start, end)
            .await
            .map_err(store_error)?;

        let mut reports = Vec::with_capacity(weeks.len());
        for weekly in weeks {
            let mut top3_articles = Vec::with_capacity(weekly.top3.len());
            for scored in weekly.top3 {
                top3_articles.push(self.enrich_scored(scored).await);
            }
            reports.push(WeeklyReport {
                week: weekly.week,
                top3_articles,
            });
        }
        info!(
            ticker = request.ticker,
            weeks = reports.len(),
            "stock weekly analytics complete"
        );
        Ok(reports)
    }

    /// Top-3 report for one sector in the week containing `date`.
    ///
    /// # Errors
    /// Returns a client error for malformed dates, unknown sectors, or a
    /// week over the article cap; a server error for store outages.
    pub async fn industry_weekly(
        &self,
        request: &IndustryWeeklyRequest,
    ) -> Result<WeeklyReport, AdvisorError> {
        let date = parse_date(&request.date)?;
        let week = week_start(date);

        let known = self
            .articles
            .sector_exists(&request.sector)
            .await
            .map_err(store_error)?;
        if !known {
            return Err(AdvisorError::UnknownSector(request.sector.clone()));
        }

        self.check_cap(week, Some(&request.sector)).await?;

        let records = self
            .articles
            .by_sector_week(&request.sector, week)
            .await
            .map_err(store_error)?;

        self.cluster_and_enrich(week, &records).await
    }

    /// Top-3 report across the whole market for the week containing `date`.
    ///
    /// # Errors
    /// Returns a client error for malformed dates or a week over the
    /// article cap; a server error for store outages.
    pub async fn market_weekly(
        &self,
        request: &MarketWeeklyRequest,
    ) -> Result<WeeklyReport, AdvisorError> {
        let date = parse_date(&request.date)?;
        let week = week_start(date);

        self.check_cap(week, None).await?;

        let records = self.articles.by_week(week).await.map_err(store_error)?;
        self.cluster_and_enrich(week, &records).await
    }

    async fn check_cap(&self, week: NaiveDate, sector: Option<&str>) -> Result<(), AdvisorError> {
        let count = self
            .articles
            .count_by_week(week, sector)
            .await
            .map_err(store_error)?;

        if count as usize > self.max_articles_per_week {
            warn!(%week, count, "week over article cap, rejecting request");
            return Err(AdvisorError::TooManyArticles {
                week: week.format("%Y-%m-%d").to_string(),
                count: count as usize,
                cap: self.max_articles_per_week,
            });
        }
        Ok(())
    }

    /// Selector first, then per-article sentiment, keywords, summary.
    async fn cluster_and_enrich(
        &self,
        week: NaiveDate,
        records: &[ArticleRecord],
    ) -> Result<WeeklyReport, AdvisorError> {
        let selected = self.selector.select(records);

        let mut top3_articles = Vec::with_capacity(selected.len());
        for record in selected {
            let score = self.scorer.score_article(&record.body).await;
            top3_articles.push(self.enrich_record(record, score).await);
        }

        Ok(WeeklyReport {
            week,
            top3_articles,
        })
    }

    async fn enrich_record(&self, record: &ArticleRecord, score: f64) -> EnrichedArticle {
        let tokens = tokenize(&record.body);
        let mut keywords = self.keywords.extract(&record.body, &tokens);
        keywords.truncate(KEYWORDS_PER_ARTICLE);
        let summary = self.summarizer.summarize(&record.body, &tokens).await;

        EnrichedArticle {
            ticker: record.ticker.clone(),
            sector: record.sector.clone(),
            title: record.title.clone(),
            body: record.body.clone(),
            date: record.date,
            week_start: record.week_start,
            score,
            keywords,
            summary,
        }
    }

    async fn enrich_scored(&self, scored: ScoredArticle) -> EnrichedArticle {
        let tokens = tokenize(&scored.body);
        let mut keywords = self.keywords.extract(&scored.body, &tokens);
        keywords.truncate(KEYWORDS_PER_ARTICLE);
        let summary = self.summarizer.summarize(&scored.body, &tokens).await;

        EnrichedArticle {
            ticker: scored.ticker,
            sector: scored.sector,
            title: scored.title,
            body: scored.body,
            date: scored.date,
            week_start: scored.week_start,
            score: scored.score,
            keywords,
            summary,
        }
    }
}

fn store_error(err: anyhow::Error) -> AdvisorError {
    AdvisorError::StoreUnavailable(format!("{err:#}"))
}
