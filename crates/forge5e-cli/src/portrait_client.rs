//! Portrait generation through a diffusion HTTP server.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use forge5e_core::generation::{GenerationError, ImageGenerator};

const BACKEND: &str = "portrait-server";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Serialize)]
pub struct ImageParams {
    pub steps: u32,
    pub guidance: f32,
    pub seed: u64,
    pub width: u32,
    pub height: u32,
}

impl Default for ImageParams {
    fn default() -> Self {
        Self {
            steps: 4,
            guidance: 0.0,
            seed: 0,
            width: 512,
            height: 512,
        }
    }
}

#[derive(Serialize)]
struct PortraitRequest<'a> {
    prompt: &'a str,
    #[serde(flatten)]
    params: &'a ImageParams,
}

/// POSTs the prompt and sampling parameters; the response body is the
/// image.
pub struct HttpImageGenerator {
    client: Client,
    url: String,
    params: ImageParams,
}

impl HttpImageGenerator {
    pub fn new(url: impl Into<String>, params: ImageParams) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
            params,
        })
    }
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    fn name(&self) -> &str {
        BACKEND
    }

    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, GenerationError> {
        let backend_error = |message: String| GenerationError::Backend {
            backend: BACKEND.to_owned(),
            message,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&PortraitRequest {
                prompt,
                params: &self.params,
            })
            .send()
            .await
            .map_err(|e| backend_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(backend_error(format!("HTTP {status}: {body}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| backend_error(e.to_string()))?;
        if bytes.is_empty() {
            return Err(GenerationError::InvalidResponse {
                backend: BACKEND.to_owned(),
                message: "empty image body".to_owned(),
            });
        }
        Ok(bytes.to_vec())
    }
}
