//! Benchmark index gateway.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::warn;

use crate::models::IndexRecord;

/// Repository for benchmark index closes.
#[derive(Debug, Clone)]
pub struct IndexRepository {
    pool: PgPool,
}

impl IndexRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Queries benchmark closes within a date range, oldest first.
    ///
    /// # Errors
    /// Returns an error if the store is unavailable after one retry.
    pub async fn closes(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<IndexRecord>> {
        match self.fetch_closes(start, end).await {
            Ok(records) => Ok(records),
            Err(err) => {
                warn!(%err, "index query failed, retrying once");
                self.fetch_closes(start, end)
                    .await
                    .context("index store unavailable after retry")
            }
        }
    }

    async fn fetch_closes(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> sqlx::Result<Vec<IndexRecord>> {
        sqlx::query_as::<_, IndexRecord>(
            r#"
            SELECT date, sp500, nasdaq, dow
            FROM index_prices
            WHERE date >= $1 AND date <= $2
            ORDER BY date ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
    }
}
