//! Article store gateway.
//!
//! Read-only access to the `articles` relation, indexed by ticker, sector,
//! and Sunday-anchored week bucket. Results are sorted descending by date
//! within a bucket. Each query retries once before surfacing an error;
//! an empty result set is returned as an empty vector with a warning.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::warn;

use crate::models::ArticleRecord;

const ARTICLE_COLUMNS: &str = "ticker, sector, title, body, date, week_start";

/// Repository for article read queries.
#[derive(Debug, Clone)]
pub struct ArticleRepository {
    pool: PgPool,
}

impl ArticleRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Queries articles for a ticker within a date range, newest first.
    ///
    /// # Errors
    /// Returns an error if the store is unavailable after one retry.
    pub async fn by_ticker(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ArticleRecord>> {
        let records = match self.fetch_by_ticker(ticker, start, end).await {
            Ok(records) => records,
            Err(err) => {
                warn!(ticker, %err, "article query failed, retrying once");
                self.fetch_by_ticker(ticker, start, end)
                    .await
                    .context("article store unavailable after retry")?
            }
        };

        if records.is_empty() {
            warn!(ticker, %start, %end, "no articles in queried interval");
        }
        Ok(records)
    }

    /// Queries articles for a sector within one week bucket, newest first.
    ///
    /// # Errors
    /// Returns an error if the store is unavailable after one retry.
    pub async fn by_sector_week(
        &self,
        sector: &str,
        week_start: NaiveDate,
    ) -> Result<Vec<ArticleRecord>> {
        let records = match self.fetch_by_sector_week(sector, week_start).await {
            Ok(records) => records,
            Err(err) => {
                warn!(sector, %err, "article query failed, retrying once");
                self.fetch_by_sector_week(sector, week_start)
                    .await
                    .context("article store unavailable after retry")?
            }
        };

        if records.is_empty() {
            warn!(sector, %week_start, "no articles in queried week");
        }
        Ok(records)
    }

    /// Queries all articles within one week bucket, newest first.
    ///
    /// # Errors
    /// Returns an error if the store is unavailable after one retry.
    pub async fn by_week(&self, week_start: NaiveDate) -> Result<Vec<ArticleRecord>> {
        let records = match self.fetch_by_week(week_start).await {
            Ok(records) => records,
            Err(err) => {
                warn!(%err, "article query failed, retrying once");
                self.fetch_by_week(week_start)
                    .await
                    .context("article store unavailable after retry")?
            }
        };

        if records.is_empty() {
            warn!(%week_start, "no articles in queried week");
        }
        Ok(records)
    }

    /// Counts articles in one week bucket, optionally restricted to a sector.
    ///
    /// Used to enforce the per-week cardinality cap before loading bodies.
    ///
    /// # Errors
    /// Returns an error if the store is unavailable after one retry.
    pub async fn count_by_week(
        &self,
        week_start: NaiveDate,
        sector: Option<&str>,
    ) -> Result<i64> {
        match self.fetch_count_by_week(week_start, sector).await {
            Ok(count) => Ok(count),
            Err(err) => {
                warn!(%err, "article count failed, retrying once");
                self.fetch_count_by_week(week_start, sector)
                    .await
                    .context("article store unavailable after retry")
            }
        }
    }

    /// Returns true when any article carries the given sector label.
    ///
    /// # Errors
    /// Returns an error if the store is unavailable after one retry.
    pub async fn sector_exists(&self, sector: &str) -> Result<bool> {
        match self.fetch_sector_exists(sector).await {
            Ok(exists) => Ok(exists),
            Err(err) => {
                warn!(sector, %err, "sector lookup failed, retrying once");
                self.fetch_sector_exists(sector)
                    .await
                    .context("article store unavailable after retry")
            }
        }
    }

    async fn fetch_by_ticker(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> sqlx::Result<Vec<ArticleRecord>> {
        sqlx::query_as::<_, ArticleRecord>(&format!(
            r#"
            SELECT {ARTICLE_COLUMNS}
            FROM articles
            WHERE ticker = $1 AND date >= $2 AND date <= $3
            ORDER BY date DESC
            "#,
        ))
        .bind(ticker)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
    }

    async fn fetch_by_sector_week(
        &self,
        sector: &str,
        week_start: NaiveDate,
    ) -> sqlx::Result<Vec<ArticleRecord>> {
        sqlx::query_as::<_, ArticleRecord>(&format!(
            r#"
            SELECT {ARTICLE_COLUMNS}
            FROM articles
            WHERE sector = $1 AND week_start = $2
            ORDER BY date DESC
            "#,
        ))
        .bind(sector)
        .bind(week_start)
        .fetch_all(&self.pool)
        .await
    }

    async fn fetch_by_week(&self, week_start: NaiveDate) -> sqlx::Result<Vec<ArticleRecord>> {
        sqlx::query_as::<_, ArticleRecord>(&format!(
            r#"
            SELECT {ARTICLE_COLUMNS}
            FROM articles
            WHERE week_start = $1
            ORDER BY date DESC
            "#,
        ))
        .bind(week_start)
        .fetch_all(&self.pool)
        .await
    }

    async fn fetch_count_by_week(
        &self,
        week_start: NaiveDate,
        sector: Option<&str>,
    ) -> sqlx::Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM articles
            WHERE week_start = $1 AND ($2::text IS NULL OR sector = $2)
            "#,
        )
        .bind(week_start)
        .bind(sector)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn fetch_sector_exists(&self, sector: &str) -> sqlx::Result<bool> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(SELECT 1 FROM articles WHERE sector = $1)
            "#,
        )
        .bind(sector)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_struct_size() {
        assert!(std::mem::size_of::<ArticleRepository>() > 0);
    }

    #[test]
    fn column_list_covers_record_fields() {
        // The SELECT list must stay in sync with ArticleRecord's FromRow
        // fields; a drift fails every query at runtime.
        for column in ["ticker", "sector", "title", "body", "date", "week_start"] {
            assert!(ARTICLE_COLUMNS.contains(column), "missing column {column}");
        }
    }
}
