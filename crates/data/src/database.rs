use anyhow::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::repositories::{
    ArticleRepository, IndexRepository, LexiconSourceRepository, PriceRepository,
};

/// Connection handle factory for the read stores.
///
/// Repositories share one pool; each request borrows a connection for the
/// duration of its queries. All access is read-only, so no transactions
/// are taken.
pub struct DatabaseClient {
    pool: PgPool,
}

impl DatabaseClient {
    /// Creates a new database client connected to the specified `PostgreSQL` database.
    ///
    /// # Errors
    /// Returns an error if the database connection cannot be established.
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }

    /// Builds the article repository.
    #[must_use]
    pub fn articles(&self) -> ArticleRepository {
        ArticleRepository::new(self.pool.clone())
    }

    /// Builds the price repository.
    #[must_use]
    pub fn prices(&self) -> PriceRepository {
        PriceRepository::new(self.pool.clone())
    }

    /// Builds the benchmark index repository.
    #[must_use]
    pub fn indexes(&self) -> IndexRepository {
        IndexRepository::new(self.pool.clone())
    }

    /// Builds the lexicon source repository.
    #[must_use]
    pub fn lexicon_source(&self) -> LexiconSourceRepository {
        LexiconSourceRepository::new(self.pool.clone())
    }
}
