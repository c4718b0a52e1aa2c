//! Benchmark index closes.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Daily benchmark closes keyed by date.
///
/// Consumed by the external performance-comparison collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IndexRecord {
    pub date: NaiveDate,
    pub sp500: Decimal,
    pub nasdaq: Decimal,
    pub dow: Decimal,
}
