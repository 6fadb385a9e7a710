//! Typed configuration shared by the query service and the ingestion job.
//!
//! Built once at start-up by [`ConfigService`](super::ConfigService) and
//! handed to the clients that need it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub openai: OpenAiSettings,
    pub search: SearchSettings,
    pub ingest: IngestSettings,
    pub generation: GenerationSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    pub api_base: String,
    pub api_key: String,
    pub api_version: String,
    pub embedding_deployment: String,
    pub chat_deployment: String,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            api_key: String::new(),
            api_version: defaults::OPENAI_API_VERSION.to_string(),
            embedding_deployment: defaults::EMBEDDING_DEPLOYMENT.to_string(),
            chat_deployment: defaults::CHAT_DEPLOYMENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Full endpoint URL or the bare service name.
    pub service: String,
    pub api_key: String,
    pub index_name: String,
    pub api_version: String,
    pub top_k: usize,
    pub embedding_dimensions: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            service: String::new(),
            api_key: String::new(),
            index_name: String::new(),
            api_version: defaults::SEARCH_API_VERSION.to_string(),
            top_k: defaults::SEARCH_TOP_K,
            embedding_dimensions: defaults::EMBEDDING_DIMENSIONS,
        }
    }
}

impl SearchSettings {
    /// `https://<name>.search.windows.net` for a bare service name, the value
    /// itself (without trailing slash) when it already is a URL.
    pub fn endpoint(&self) -> String {
        let service = self.service.trim();
        if service.starts_with("http://") || service.starts_with("https://") {
            service.trim_end_matches('/').to_string()
        } else {
            format!("https://{}.search.windows.net", service)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub max_documents: usize,
    pub chunk_size: usize,
    pub request_delay_secs: f64,
    pub rate_limit_cooldown_secs: f64,
    pub error_cooldown_secs: f64,
    pub verification_query: String,
    pub csv_candidates: Vec<String>,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            max_documents: defaults::MAX_DOCUMENTS,
            chunk_size: defaults::CHUNK_SIZE,
            request_delay_secs: defaults::REQUEST_DELAY_SECS,
            rate_limit_cooldown_secs: defaults::RATE_LIMIT_COOLDOWN_SECS,
            error_cooldown_secs: defaults::ERROR_COOLDOWN_SECS,
            verification_query: defaults::VERIFICATION_QUERY.to_string(),
            csv_candidates: defaults::csv_candidates(),
        }
    }
}

impl IngestSettings {
    pub fn request_delay(&self) -> Duration {
        Duration::from_secs_f64(self.request_delay_secs)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.rate_limit_cooldown_secs)
    }

    pub fn error_cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.error_cooldown_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub max_tokens: u32,
    pub temperature: f64,
    pub system_prompt: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_tokens: defaults::MAX_TOKENS,
            temperature: defaults::TEMPERATURE,
            system_prompt: defaults::SYSTEM_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_accepts_name_or_url() {
        let mut search = SearchSettings {
            service: "wine-search".to_string(),
            ..Default::default()
        };
        assert_eq!(search.endpoint(), "https://wine-search.search.windows.net");

        search.service = "https://wine-search.search.windows.net/".to_string();
        assert_eq!(search.endpoint(), "https://wine-search.search.windows.net");
    }

    #[test]
    fn ingest_defaults_match_free_tier_budget() {
        let ingest = IngestSettings::default();
        assert_eq!(ingest.max_documents, 10);
        assert_eq!(ingest.chunk_size, 800);
        assert_eq!(ingest.request_delay(), Duration::from_secs(4));
        assert_eq!(ingest.rate_limit_cooldown(), Duration::from_secs(60));
        assert_eq!(ingest.error_cooldown(), Duration::from_secs(10));
    }
}
