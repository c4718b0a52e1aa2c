//! Loughran–McDonald master table gateway.
//!
//! Queried only when the lexicon snapshot is missing or expired; the hot
//! path reads the in-memory cache owned by the analytics crate.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::warn;

use crate::models::LexiconRow;

/// Repository for the external lexicon source.
#[derive(Debug, Clone)]
pub struct LexiconSourceRepository {
    pool: PgPool,
}

impl LexiconSourceRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches the entire master table.
    ///
    /// # Errors
    /// Returns an error if the store is unavailable after one retry.
    pub async fn fetch_all(&self) -> Result<Vec<LexiconRow>> {
        match self.fetch().await {
            Ok(rows) => Ok(rows),
            Err(err) => {
                warn!(%err, "lexicon query failed, retrying once");
                self.fetch()
                    .await
                    .context("lexicon store unavailable after retry")
            }
        }
    }

    async fn fetch(&self) -> sqlx::Result<Vec<LexiconRow>> {
        sqlx::query_as::<_, LexiconRow>(
            r#"
            SELECT word, positive, negative, uncertainty, litigious, constraining
            FROM lm_master
            ORDER BY word
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }
}
