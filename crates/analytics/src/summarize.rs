//! Length-routed summarization.
//!
//! Inputs are classified by token count and dispatched to the model
//! registered for that class: short inputs pass through unchanged,
//! medium and long inputs go to abstractive models with proportional
//! length bounds, and very long inputs are summarized chunk-by-chunk and
//! then merged with one more pass. Every failure degrades to the leading
//! sentences; the summarizer never fails the request.
//!
//! The short passthrough performs no truncation, so callers must not
//! assume the output fits any model's context window.

use std::sync::Arc;

use advisor_core::InferenceConfig;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::warn;

use crate::inference::InferenceClient;
use crate::text::{split_sentences, token_windows};

/// Token-count routing classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthClass {
    /// <= 200 tokens: returned unchanged.
    Short,
    /// 201..=700 tokens.
    Medium,
    /// 701..=1000 tokens.
    Long,
    /// > 1000 tokens: chunk-then-merge.
    VeryLong,
}

impl LengthClass {
    /// Classifies an input by its reference token count.
    #[must_use]
    pub fn classify(tokens: usize) -> Self {
        match tokens {
            0..=200 => Self::Short,
            201..=700 => Self::Medium,
            701..=1000 => Self::Long,
            _ => Self::VeryLong,
        }
    }
}

/// Chunk window for very long inputs, in tokens.
const CHUNK_WINDOW: usize = 1000;
/// Length bounds for per-chunk and merge passes.
const CHUNK_MIN_LEN: usize = 75;
const CHUNK_MAX_LEN: usize = 200;
/// Fallback keeps the leading sentences.
const FALLBACK_SENTENCES: usize = 3;

/// A summarization model behind the common capability.
#[async_trait]
pub trait AbstractiveModel: Send + Sync {
    /// Model identifier for logging.
    fn name(&self) -> &str;

    /// Summarizes `text` into `min_len..=max_len` tokens.
    async fn summarize(&self, text: &str, min_len: usize, max_len: usize) -> Result<String>;
}

/// Remote model bound to one model id on the inference service.
pub struct RemoteModel {
    client: Arc<InferenceClient>,
    model_id: String,
}

#[async_trait]
impl AbstractiveModel for RemoteModel {
    fn name(&self) -> &str {
        &self.model_id
    }

    async fn summarize(&self, text: &str, min_len: usize, max_len: usize) -> Result<String> {
        self.client
            .summarize(&self.model_id, text, min_len, max_len)
            .await
    }
}

/// Registry mapping length classes to model implementations.
pub struct ModelRegistry {
    medium: Arc<dyn AbstractiveModel>,
    long: Arc<dyn AbstractiveModel>,
    very_long: Arc<dyn AbstractiveModel>,
}

impl ModelRegistry {
    /// Builds the registry from explicit models.
    #[must_use]
    pub fn new(
        medium: Arc<dyn AbstractiveModel>,
        long: Arc<dyn AbstractiveModel>,
        very_long: Arc<dyn AbstractiveModel>,
    ) -> Self {
        Self {
            medium,
            long,
            very_long,
        }
    }

    /// Builds the registry against the remote inference service.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn remote(config: &InferenceConfig) -> Result<Self> {
        let client = Arc::new(InferenceClient::new(config)?);
        Ok(Self::new(
            Arc::new(RemoteModel {
                client: Arc::clone(&client),
                model_id: "summary-base".to_string(),
            }),
            Arc::new(RemoteModel {
                client: Arc::clone(&client),
                model_id: "summary-large".to_string(),
            }),
            Arc::new(RemoteModel {
                client,
                model_id: "summary-longform".to_string(),
            }),
        ))
    }

    /// Model registered for a class; `Short` has none.
    #[must_use]
    pub fn model_for(&self, class: LengthClass) -> Option<&Arc<dyn AbstractiveModel>> {
        match class {
            LengthClass::Short => None,
            LengthClass::Medium => Some(&self.medium),
            LengthClass::Long => Some(&self.long),
            LengthClass::VeryLong => Some(&self.very_long),
        }
    }
}

/// Length-routed summarizer with lazy model loading.
pub struct Summarizer {
    config: InferenceConfig,
    registry: OnceCell<Option<ModelRegistry>>,
}

impl Summarizer {
    /// Creates a summarizer; models are loaded on first use.
    #[must_use]
    pub fn new(config: InferenceConfig) -> Self {
        Self {
            config,
            registry: OnceCell::new(),
        }
    }

    /// Creates a summarizer with a pre-built registry.
    #[must_use]
    pub fn with_registry(config: InferenceConfig, registry: ModelRegistry) -> Self {
        Self {
            config,
            registry: OnceCell::new_with(Some(Some(registry))),
        }
    }

    /// Summarizes a body, never failing.
    ///
    /// `tokens` is the caller's tokenization of the same body (shared
    /// with the keyword extractor).
    pub async fn summarize(&self, body: &str, tokens: &[String]) -> String {
        let class = LengthClass::classify(tokens.len());
        if class == LengthClass::Short {
            return body.to_string();
        }

        let registry = self
            .registry
            .get_or_init(|| async {
                match ModelRegistry::remote(&self.config) {
                    Ok(registry) => Some(registry),
                    Err(err) => {
                        warn!(%err, "summarization models unavailable");
                        None
                    }
                }
            })
            .await;

        let Some(registry) = registry else {
            return fallback_summary(body);
        };

        let result = match class {
            LengthClass::Short => Ok(body.to_string()),
            LengthClass::Medium => {
                let max_len = (tokens.len() * 20 / 100).max(50);
                registry.medium.summarize(body, 50, max_len).await
            }
            LengthClass::Long => {
                let max_len = (tokens.len() * 15 / 100).max(75);
                registry.long.summarize(body, 50, max_len).await
            }
            LengthClass::VeryLong => summarize_chunked(registry.very_long.as_ref(), tokens).await,
        };

        match result {
            Ok(summary) => summary,
            Err(err) => {
                warn!(%err, "summarization failed, falling back to leading sentences");
                fallback_summary(body)
            }
        }
    }
}

/// Chunk-then-merge pass for very long inputs.
async fn summarize_chunked(model: &dyn AbstractiveModel, tokens: &[String]) -> Result<String> {
    let mut partials = Vec::new();
    for window in token_windows(tokens, CHUNK_WINDOW, 0) {
        let chunk = window.join(" ");
        partials.push(
            model
                .summarize(&chunk, CHUNK_MIN_LEN, CHUNK_MAX_LEN)
                .await?,
        );
    }

    let merged = partials.join(" ");
    model
        .summarize(&merged, CHUNK_MIN_LEN, CHUNK_MAX_LEN)
        .await
}

/// Leading sentences of the body, used when models are unavailable.
#[must_use]
pub fn fallback_summary(body: &str) -> String {
    let sentences = split_sentences(body);
    sentences
        .into_iter()
        .take(FALLBACK_SENTENCES)
        .collect::<Vec<String>>()
        .join(" ")
}
