//! Remote inference client.
//!
//! The abstractive summarization models run behind an inference service;
//! this client speaks its JSON contract. Model weights, batching, and
//! device placement are the service's concern.

use std::time::Duration;

use advisor_core::InferenceConfig;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct SummarizeRequest<'a> {
    model: &'a str,
    input: &'a str,
    min_length: usize,
    max_length: usize,
}

#[derive(Debug, Deserialize)]
struct SummarizeResponse {
    summary: String,
}

/// HTTP client for the summarization endpoint.
pub struct InferenceClient {
    http: Client,
    base_url: String,
}

impl InferenceClient {
    /// Creates a client for the configured endpoint.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("building inference HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Requests a summary from a named model.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    pub async fn summarize(
        &self,
        model: &str,
        input: &str,
        min_length: usize,
        max_length: usize,
    ) -> Result<String> {
        let request = SummarizeRequest {
            model,
            input,
            min_length,
            max_length,
        };

        let response = self
            .http
            .post(format!("{}/v1/summarize", self.base_url))
            .json(&request)
            .send()
            .await
            .context("inference request failed")?;

        anyhow::ensure!(
            response.status().is_success(),
            "inference endpoint returned {}",
            response.status()
        );

        let body: SummarizeResponse = response
            .json()
            .await
            .context("parsing inference response")?;
        Ok(body.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let config = InferenceConfig {
            base_url: "http://localhost:8501/".to_string(),
            timeout_secs: 5,
        };
        let client = InferenceClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:8501");
    }
}
