//! Retrieval-then-generation pipeline behind `POST /ask`.
//!
//! Neither step fails the request: search problems become the context text
//! and generation problems become the answer text.

use std::sync::Arc;

use super::store::VectorStore;
use crate::core::config::GenerationSettings;
use crate::core::text::preview;
use crate::llm::{ChatMessage, ChatProvider, ChatRequest};

pub const NO_RESULTS_CONTEXT: &str = "No relevant documents found";

#[derive(Clone)]
pub struct RagPipeline {
    store: Arc<dyn VectorStore>,
    chat: Arc<dyn ChatProvider>,
    top_k: usize,
    generation: GenerationSettings,
}

impl RagPipeline {
    pub fn new(
        store: Arc<dyn VectorStore>,
        chat: Arc<dyn ChatProvider>,
        top_k: usize,
        generation: GenerationSettings,
    ) -> Self {
        Self {
            store,
            chat,
            top_k,
            generation,
        }
    }

    pub async fn answer(&self, query: &str) -> String {
        let context = self.search(query).await;
        self.assistant(query, &context).await
    }

    /// Text of the best-ranked chunk for `query`.
    ///
    /// A failed search yields `"Search error: ..."` as the context, which is
    /// then handed to the model like any retrieved text.
    pub async fn search(&self, query: &str) -> String {
        match self.store.similarity_search(query, self.top_k).await {
            Ok(results) => match results.into_iter().next() {
                Some(top) => {
                    tracing::info!(score = top.score, "Search result: {}...", preview(&top.content, 100));
                    top.content
                }
                None => NO_RESULTS_CONTEXT.to_string(),
            },
            Err(err) => {
                tracing::warn!(kind = ?err.kind, "Search error: {}", err);
                format!("Search error: {}", err)
            }
        }
    }

    pub async fn assistant(&self, query: &str, context: &str) -> String {
        let request = ChatRequest::new(self.prompt(query, context)).with_generation(&self.generation);

        match self.chat.chat(request).await {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(provider = self.chat.name(), kind = ?err.kind, "Chat error: {}", err);
                format!("Error generating response: {}", err)
            }
        }
    }

    /// System framing, the user's question, then the retrieved context as a
    /// prior assistant turn.
    fn prompt(&self, query: &str, context: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.generation.system_prompt.clone()),
            ChatMessage::user(query),
            ChatMessage::assistant(context),
        ]
    }
}
