//! News article data model.
//!
//! Articles are a read model: rows are written by an external ingestion
//! collaborator and only queried here. An article is identified by
//! (ticker, date); `week_start` is always the Sunday on or before `date`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A news article row from the article store.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ArticleRecord {
    /// Ticker the article is attached to.
    pub ticker: String,
    /// Industry sector of the ticker. Constant per ticker within the store.
    pub sector: String,
    /// Headline. Absent for wire snippets without a title.
    pub title: Option<String>,
    /// Full article body, UTF-8.
    pub body: String,
    /// Publication date.
    pub date: NaiveDate,
    /// Sunday-anchored week bucket of `date`.
    pub week_start: NaiveDate,
}

impl ArticleRecord {
    /// Returns true when the article carries a non-empty title.
    ///
    /// The top-3 selector clusters on titles, so untitled articles are
    /// excluded from clustering input.
    #[must_use]
    pub fn is_titled(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// Returns the title or an empty string.
    #[must_use]
    pub fn title_text(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(title: Option<&str>) -> ArticleRecord {
        ArticleRecord {
            ticker: "AAPL".to_string(),
            sector: "Technology".to_string(),
            title: title.map(String::from),
            body: "Apple shipped a new device.".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 4).unwrap(),
            week_start: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        }
    }

    #[test]
    fn titled_article_detected() {
        assert!(sample(Some("Apple ships")).is_titled());
        assert!(!sample(None).is_titled());
        assert!(!sample(Some("   ")).is_titled());
    }

    #[test]
    fn title_text_defaults_to_empty() {
        assert_eq!(sample(None).title_text(), "");
        assert_eq!(sample(Some("Apple ships")).title_text(), "Apple ships");
    }

    #[test]
    fn serialization_roundtrip() {
        let record = sample(Some("Apple ships"));
        let json = serde_json::to_string(&record).unwrap();
        let back: ArticleRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(back.ticker, record.ticker);
        assert_eq!(back.week_start, record.week_start);
    }
}
