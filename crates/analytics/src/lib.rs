pub mod cluster;
pub mod embedding;
pub mod inference;
pub mod keywords;
pub mod lexicon;
pub mod orchestrator;
pub mod sentiment;
pub mod summarize;
pub mod text;
pub mod top3;

pub use cluster::{dbscan, medoid, ClusterAssignment, DbscanConfig};
pub use embedding::{Embedder, HashedNgramEmbedder, SharedEmbedder};
pub use inference::InferenceClient;
pub use keywords::{Keyword, KeywordConfig, KeywordExtractor};
pub use lexicon::{CacheInfo, CacheMetadata, LexiconCache, LexiconEntry};
pub use orchestrator::{
    EnrichedArticle, IndustryWeeklyRequest, MarketWeeklyRequest, StockWeeklyRequest,
    WeeklyAnalytics, WeeklyReport,
};
pub use sentiment::{ArticleSentiment, ScoredArticle, SentimentScorer, WeeklySentiment};
pub use summarize::{AbstractiveModel, LengthClass, ModelRegistry, Summarizer};
pub use top3::{Top3Config, Top3Selector};
