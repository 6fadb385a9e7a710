//! VectorStore trait — abstract interface over the managed search index.
//!
//! The ingestion job writes through it and the query service reads through
//! it. The production implementation is `AzureSearchStore`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::ServiceError;

/// A chunk of source text ready to be embedded and indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    pub content: String,
    /// Carried over from the source record (`source`, `row`).
    pub metadata: Value,
}

/// One hit from a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub content: String,
    pub metadata: Value,
    /// Relevance score (higher = better).
    pub score: f64,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Embed and upload the chunks. Returns the ids assigned to them.
    async fn add_documents(&self, chunks: &[TextChunk]) -> Result<Vec<String>, ServiceError>;

    /// Top `k` chunks for `query`, sorted by descending score.
    async fn similarity_search(&self, query: &str, k: usize)
        -> Result<Vec<ScoredChunk>, ServiceError>;
}

/// Sorts hits best-first. The service already ranks them, but the order is
/// not part of its contract.
pub fn sort_by_score(results: &mut [ScoredChunk]) {
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(content: &str, score: f64) -> ScoredChunk {
        ScoredChunk {
            content: content.to_string(),
            metadata: Value::Null,
            score,
        }
    }

    #[test]
    fn sort_by_score_puts_best_first() {
        let mut results = vec![hit("b", 0.4), hit("a", 0.9), hit("c", 0.1)];
        sort_by_score(&mut results);
        let order: Vec<&str> = results.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }
}
