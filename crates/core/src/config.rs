use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub lexicon: LexiconConfig,
    pub inference: InferenceConfig,
    pub llm: LlmConfig,
    pub analytics: AnalyticsConfig,
    pub predictor: PredictorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Loughran–McDonald lexicon cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiconConfig {
    /// Directory holding the gzipped snapshot and its metadata file.
    pub cache_dir: String,
    /// Snapshot age after which a rebuild is forced.
    pub ttl_hours: i64,
}

/// Remote summarization inference endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Chat completion endpoint for narrative generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Hard cap on articles loaded for one week bucket.
    pub max_articles_per_week: usize,
    /// Seed for the selector's degraded-mode fill. None draws from entropy.
    pub selector_seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Seed for the balanced random forest.
    pub seed: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/advisor".to_string(),
                max_connections: 10,
            },
            lexicon: LexiconConfig {
                cache_dir: "cache".to_string(),
                ttl_hours: 168,
            },
            inference: InferenceConfig {
                base_url: "http://localhost:8501".to_string(),
                timeout_secs: 60,
            },
            llm: LlmConfig {
                base_url: "http://localhost:8502".to_string(),
                model: "advisor-chat".to_string(),
                timeout_secs: 30,
            },
            analytics: AnalyticsConfig {
                max_articles_per_week: 2000,
                selector_seed: None,
            },
            predictor: PredictorConfig { seed: 42 },
        }
    }
}
