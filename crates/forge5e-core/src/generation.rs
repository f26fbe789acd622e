//! Narrative and image generation capabilities.
//!
//! Concrete backends (a local LLM server, a diffusion server) live outside
//! this crate. Both traits are object-safe so backends can be shared as
//! `Arc<dyn TextGenerator>` / `Arc<dyn ImageGenerator>`.

use async_trait::async_trait;
use thiserror::Error;

/// A generation backend failed to produce output.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The backend could not be reached or returned an error status.
    #[error("{backend} request failed: {message}")]
    Backend { backend: String, message: String },

    /// The backend answered but the payload was unusable.
    #[error("{backend} returned an invalid response: {message}")]
    InvalidResponse { backend: String, message: String },
}

/// Produces text from a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short backend name for logs and errors (e.g. `"ollama"`).
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Produces image bytes (PNG) from a prompt.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, GenerationError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn TextGenerator, _: &dyn ImageGenerator) {}
};
