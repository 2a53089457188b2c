//! Chat completion boundary

mod gemini;

use async_trait::async_trait;

pub use gemini::GeminiClient;

use crate::Result;

/// A remote language model answering one prompt at a time
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Complete `prompt`, returning the raw response text
    async fn complete(&self, prompt: &str) -> Result<String>;
}
