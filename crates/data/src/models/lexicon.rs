//! Loughran–McDonald master table row.

use serde::{Deserialize, Serialize};

/// One word of the external Loughran–McDonald master table.
///
/// Uncertainty, litigious, and constraining weights are carried for
/// completeness but not consumed by the sentiment scorer.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LexiconRow {
    pub word: String,
    pub positive: f64,
    pub negative: f64,
    pub uncertainty: f64,
    pub litigious: f64,
    pub constraining: f64,
}
