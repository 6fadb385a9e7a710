pub mod azure_openai;
pub mod provider;
pub mod types;

pub use azure_openai::AzureOpenAiClient;
pub use provider::{ChatProvider, EmbeddingProvider};
pub use types::{ChatMessage, ChatRequest};
