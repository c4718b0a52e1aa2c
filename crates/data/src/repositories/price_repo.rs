//! Price store gateway.
//!
//! Daily OHLCV rows live in three shard tables partitioned by the first
//! character of the ticker (A–D, E–M, N–Z). The shard is resolved before
//! the query; table names come from a fixed set, never from user input.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::warn;

use crate::models::{shard_table, PriceRecord};

/// Repository for daily price history.
#[derive(Debug, Clone)]
pub struct PriceRepository {
    pool: PgPool,
}

impl PriceRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Queries the full daily history for a ticker, oldest first.
    ///
    /// # Errors
    /// Returns an error if the store is unavailable after one retry.
    pub async fn daily_history(&self, ticker: &str) -> Result<Vec<PriceRecord>> {
        match self.fetch_daily_history(ticker).await {
            Ok(records) => Ok(records),
            Err(err) => {
                warn!(ticker, %err, "price query failed, retrying once");
                self.fetch_daily_history(ticker)
                    .await
                    .context("price store unavailable after retry")
            }
        }
    }

    /// Queries daily rows for a ticker up to and including `end`, oldest first.
    ///
    /// # Errors
    /// Returns an error if the store is unavailable after one retry.
    pub async fn daily_history_until(
        &self,
        ticker: &str,
        end: NaiveDate,
    ) -> Result<Vec<PriceRecord>> {
        match self.fetch_daily_history_until(ticker, end).await {
            Ok(records) => Ok(records),
            Err(err) => {
                warn!(ticker, %err, "price query failed, retrying once");
                self.fetch_daily_history_until(ticker, end)
                    .await
                    .context("price store unavailable after retry")
            }
        }
    }

    async fn fetch_daily_history(&self, ticker: &str) -> sqlx::Result<Vec<PriceRecord>> {
        let table = shard_table(ticker);
        sqlx::query_as::<_, PriceRecord>(&format!(
            r#"
            SELECT ticker, date, open, high, low, close, adj_close, volume
            FROM {table}
            WHERE ticker = $1
            ORDER BY date ASC
            "#,
        ))
        .bind(ticker)
        .fetch_all(&self.pool)
        .await
    }

    async fn fetch_daily_history_until(
        &self,
        ticker: &str,
        end: NaiveDate,
    ) -> sqlx::Result<Vec<PriceRecord>> {
        let table = shard_table(ticker);
        sqlx::query_as::<_, PriceRecord>(&format!(
            r#"
            SELECT ticker, date, open, high, low, close, adj_close, volume
            FROM {table}
            WHERE ticker = $1 AND date <= $2
            ORDER BY date ASC
            "#,
        ))
        .bind(ticker)
        .bind(end)
        .fetch_all(&self.pool)
        .await
    }
}
