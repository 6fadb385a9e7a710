use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::errors::ServiceError;

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Chat completion; returns the first choice's message content.
    async fn chat(&self, request: ChatRequest) -> Result<String, ServiceError>;
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// One vector per input, in input order.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ServiceError>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        if vectors.is_empty() {
            return Err(ServiceError::fatal("Embedding response contained no vectors"));
        }
        Ok(vectors.swap_remove(0))
    }
}
