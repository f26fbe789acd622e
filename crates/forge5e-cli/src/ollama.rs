//! Text generation through an Ollama server.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use forge5e_core::generation::{GenerationError, TextGenerator};

const BACKEND: &str = "ollama";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Calls `POST <url>` with a non-streaming generate request and returns the
/// `response` field.
pub struct OllamaTextGenerator {
    client: Client,
    url: String,
    model: String,
}

impl OllamaTextGenerator {
    pub fn new(url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OllamaTextGenerator {
    fn name(&self) -> &str {
        BACKEND
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let backend_error = |message: String| GenerationError::Backend {
            backend: BACKEND.to_owned(),
            message,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| backend_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(backend_error(format!("HTTP {status}: {body}")));
        }

        let parsed: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| GenerationError::InvalidResponse {
                    backend: BACKEND.to_owned(),
                    message: e.to_string(),
                })?;
        Ok(parsed.response)
    }
}
