//! Daily price bar model and shard routing.
//!
//! The price store is partitioned into three shard tables by the first
//! character of the ticker: A–D, E–M, N–Z.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A daily OHLCV row from one of the price shard tables.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PriceRecord {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub adj_close: Decimal,
    pub volume: Decimal,
}

impl PriceRecord {
    /// Adjusted close as `f64` for the feature pipeline.
    #[must_use]
    pub fn adj_close_f64(&self) -> f64 {
        f64::try_from(self.adj_close).unwrap_or(f64::NAN)
    }
}

/// Resolves the shard table holding rows for `ticker`.
///
/// Tickers not starting with an ASCII letter fall into the last shard.
#[must_use]
pub fn shard_table(ticker: &str) -> &'static str {
    match ticker.chars().next().map(|c| c.to_ascii_uppercase()) {
        Some('A'..='D') => "prices_a_d",
        Some('E'..='M') => "prices_e_m",
        _ => "prices_n_z",
    }
}
