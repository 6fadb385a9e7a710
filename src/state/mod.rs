pub mod error;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::config::Settings;
use crate::llm::{AzureOpenAiClient, ChatProvider};
use crate::rag::{AzureSearchStore, RagPipeline, VectorStore};

use error::InitializationError;

/// Application state shared across all routes.
///
/// Built once at startup from validated settings; handlers never read the
/// environment.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub pipeline: RagPipeline,
    pub started_at: DateTime<Utc>,
}

/// Remote clients shared by the query service and the ingestion job.
pub struct Clients {
    pub openai: Arc<AzureOpenAiClient>,
    pub search: Arc<AzureSearchStore>,
}

impl Clients {
    pub fn build(settings: &Settings) -> Result<Self, InitializationError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("wine-rag/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(InitializationError::HttpClient)?;

        let openai = Arc::new(AzureOpenAiClient::new(&settings.openai, http.clone()));
        let search = Arc::new(AzureSearchStore::new(
            &settings.search,
            http,
            openai.clone(),
        ));

        Ok(Self { openai, search })
    }
}

impl AppState {
    pub fn initialize(settings: Settings) -> Result<Arc<Self>, InitializationError> {
        let clients = Clients::build(&settings)?;
        tracing::info!(
            index = %settings.search.index_name,
            chat_deployment = %settings.openai.chat_deployment,
            "Clients initialized"
        );
        Ok(Self::with_clients(settings, clients.search, clients.openai))
    }

    /// Assembles state around caller-provided store and chat implementations.
    pub fn with_clients(
        settings: Settings,
        store: Arc<dyn VectorStore>,
        chat: Arc<dyn ChatProvider>,
    ) -> Arc<Self> {
        let pipeline = RagPipeline::new(
            store,
            chat,
            settings.search.top_k,
            settings.generation.clone(),
        );

        Arc::new(AppState {
            settings: Arc::new(settings),
            pipeline,
            started_at: Utc::now(),
        })
    }
}
