//! Provider-agnostic generation trait

use anyhow::Result;
use async_trait::async_trait;

/// A remote service that turns a prompt into text using a named model.
///
/// Any failure (transport, auth, quota, unknown model) is an `Err`; a success
/// carries the raw model text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Human-readable provider name (e.g. "google")
    fn provider_name(&self) -> &str;

    /// Generate a completion for `prompt` with the model `model`
    async fn generate(&self, model: &str, prompt: &str) -> Result<String>;
}
