//! Azure Cognitive Search backed vector store.
//!
//! Documents are embedded through an [`EmbeddingProvider`] and stored with the
//! fields `id`, `content`, `content_vector` and `metadata` (JSON string).
//! Ids are random, so indexing the same text twice stores it twice.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::store::{sort_by_score, ScoredChunk, TextChunk, VectorStore};
use crate::core::config::SearchSettings;
use crate::core::errors::{classify_status, ServiceError};
use crate::llm::EmbeddingProvider;

const SERVICE: &str = "Azure Cognitive Search";
const VECTOR_FIELD: &str = "content_vector";
const VECTOR_PROFILE: &str = "default-profile";
const VECTOR_ALGORITHM: &str = "default-hnsw";

pub struct AzureSearchStore {
    endpoint: String,
    index_name: String,
    api_key: String,
    api_version: String,
    dimensions: usize,
    client: Client,
    embeddings: Arc<dyn EmbeddingProvider>,
}

impl AzureSearchStore {
    pub fn new(
        settings: &SearchSettings,
        client: Client,
        embeddings: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            endpoint: settings.endpoint(),
            index_name: settings.index_name.clone(),
            api_key: settings.api_key.clone(),
            api_version: settings.api_version.clone(),
            dimensions: settings.embedding_dimensions,
            client,
            embeddings,
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    fn index_url(&self, suffix: &str) -> String {
        format!(
            "{}/indexes/{}{}?api-version={}",
            self.endpoint,
            urlencoding::encode(&self.index_name),
            suffix,
            urlencoding::encode(&self.api_version)
        )
    }

    /// Creates the index when it does not exist yet. Returns `true` when it
    /// was created.
    pub async fn ensure_index(&self) -> Result<bool, ServiceError> {
        let url = self.index_url("");
        let res = self
            .client
            .get(&url)
            .header("api-key", &self.api_key)
            .send()
            .await?;

        if res.status().is_success() {
            tracing::debug!(index = %self.index_name, "Search index already exists");
            return Ok(false);
        }
        if res.status() != StatusCode::NOT_FOUND {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ServiceError::from_status(SERVICE, status, &text));
        }

        tracing::info!(index = %self.index_name, "Creating search index");
        let res = self
            .client
            .put(&url)
            .header("api-key", &self.api_key)
            .json(&index_definition(&self.index_name, self.dimensions))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ServiceError::from_status(SERVICE, status, &text));
        }
        Ok(true)
    }

    async fn post(&self, suffix: &str, body: &Value) -> Result<reqwest::Response, ServiceError> {
        let res = self
            .client
            .post(self.index_url(suffix))
            .header("api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ServiceError::from_status(SERVICE, status, &text));
        }
        Ok(res)
    }
}

fn index_definition(index_name: &str, dimensions: usize) -> Value {
    json!({
        "name": index_name,
        "fields": [
            { "name": "id", "type": "Edm.String", "key": true, "filterable": true },
            { "name": "content", "type": "Edm.String", "searchable": true },
            {
                "name": VECTOR_FIELD,
                "type": "Collection(Edm.Single)",
                "searchable": true,
                "dimensions": dimensions,
                "vectorSearchProfile": VECTOR_PROFILE
            },
            { "name": "metadata", "type": "Edm.String", "searchable": true }
        ],
        "vectorSearch": {
            "algorithms": [{
                "name": VECTOR_ALGORITHM,
                "kind": "hnsw",
                "hnswParameters": { "metric": "cosine", "m": 4, "efConstruction": 400, "efSearch": 500 }
            }],
            "profiles": [{ "name": VECTOR_PROFILE, "algorithm": VECTOR_ALGORITHM }]
        }
    })
}

fn upload_body(chunks: &[TextChunk], vectors: Vec<Vec<f32>>, ids: &[String]) -> Value {
    let docs: Vec<Value> = chunks
        .iter()
        .zip(vectors)
        .zip(ids)
        .map(|((chunk, vector), id)| {
            json!({
                "@search.action": "upload",
                "id": id,
                "content": chunk.content,
                VECTOR_FIELD: vector,
                "metadata": chunk.metadata.to_string(),
            })
        })
        .collect();
    json!({ "value": docs })
}

fn search_body(vector: Vec<f32>, k: usize) -> Value {
    json!({
        "select": "id,content,metadata",
        "top": k,
        "vectorQueries": [{
            "kind": "vector",
            "vector": vector,
            "fields": VECTOR_FIELD,
            "k": k
        }]
    })
}

#[derive(Deserialize)]
struct IndexingResponse {
    #[serde(default)]
    value: Vec<IndexingResult>,
}

#[derive(Deserialize)]
struct IndexingResult {
    key: String,
    status: bool,
    #[serde(rename = "errorMessage", default)]
    error_message: Option<String>,
    #[serde(rename = "statusCode", default)]
    status_code: u16,
}

/// A 207 reply succeeds at the HTTP level while individual documents fail.
fn check_indexing(response: IndexingResponse) -> Result<(), ServiceError> {
    match response.value.into_iter().find(|item| !item.status) {
        None => Ok(()),
        Some(item) => {
            let message = item.error_message.unwrap_or_default();
            Err(ServiceError::new(
                classify_status(item.status_code, &message),
                format!(
                    "{} rejected document {} ({}): {}",
                    SERVICE, item.key, item.status_code, message
                ),
            ))
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(rename = "@search.score", default)]
    score: f64,
    #[serde(default)]
    content: String,
    #[serde(default)]
    metadata: Option<String>,
}

fn into_scored(response: SearchResponse) -> Vec<ScoredChunk> {
    let mut results: Vec<ScoredChunk> = response
        .value
        .into_iter()
        .map(|hit| ScoredChunk {
            content: hit.content,
            metadata: hit
                .metadata
                .and_then(|raw| serde_json::from_str(&raw).ok())
                .unwrap_or(Value::Null),
            score: hit.score,
        })
        .collect();
    sort_by_score(&mut results);
    results
}

#[async_trait]
impl VectorStore for AzureSearchStore {
    async fn add_documents(&self, chunks: &[TextChunk]) -> Result<Vec<String>, ServiceError> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embeddings.embed(&texts).await?;
        let ids: Vec<String> = chunks.iter().map(|_| Uuid::new_v4().to_string()).collect();

        let res = self
            .post("/docs/index", &upload_body(chunks, vectors, &ids))
            .await?;
        let payload: IndexingResponse = res.json().await?;
        check_indexing(payload)?;

        Ok(ids)
    }

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>, ServiceError> {
        let vector = self.embeddings.embed_query(query).await?;
        let res = self.post("/docs/search", &search_body(vector, k)).await?;
        let payload: SearchResponse = res.json().await?;
        Ok(into_scored(payload))
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use tokio::net::TcpListener;

    use super::*;
    use crate::core::errors::ErrorKind;

    struct FixedEmbeddings;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbeddings {
        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
            Ok(inputs.iter().map(|_| vec![0.1, 0.2]).collect())
        }
    }

    /// Serves `status` with `body` for every request; returns the base URL.
    async fn serve_status(status: StatusCode, body: &'static str) -> String {
        let app = Router::new().fallback(move || async move { (status, body) });
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn store_at(endpoint: &str) -> AzureSearchStore {
        let settings = SearchSettings {
            service: endpoint.to_string(),
            api_key: "key".to_string(),
            index_name: "wine-demo".to_string(),
            ..Default::default()
        };
        AzureSearchStore::new(&settings, Client::new(), Arc::new(FixedEmbeddings))
    }

    fn wine_chunk() -> TextChunk {
        TextChunk {
            content: "name: Rioja Reserva\nrating: 92".to_string(),
            metadata: json!({ "source": "wine-ratings.csv", "row": 0 }),
        }
    }

    #[tokio::test]
    async fn throttled_upload_is_rate_limited() {
        let endpoint = serve_status(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"code":"429","message":"Too many requests"}}"#,
        )
        .await;

        let err = store_at(&endpoint)
            .add_documents(&[wine_chunk()])
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::RateLimited);
        assert!(err.message.contains("429"));
    }

    #[tokio::test]
    async fn server_error_upload_is_transient() {
        let endpoint = serve_status(StatusCode::SERVICE_UNAVAILABLE, "busy").await;

        let err = store_at(&endpoint)
            .add_documents(&[wine_chunk()])
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Transient);
    }

    #[tokio::test]
    async fn rejected_key_is_fatal() {
        let endpoint = serve_status(StatusCode::FORBIDDEN, "Invalid api-key").await;

        let err = store_at(&endpoint)
            .similarity_search("best wine", 1)
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Fatal);
    }

    #[tokio::test]
    async fn unreachable_service_is_transient() {
        let err = store_at("http://127.0.0.1:1")
            .add_documents(&[wine_chunk()])
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Transient);
    }

    #[test]
    fn index_definition_declares_vector_field() {
        let def = index_definition("wine-demo", 1536);

        assert_eq!(def["name"], "wine-demo");
        let vector = &def["fields"][2];
        assert_eq!(vector["name"], "content_vector");
        assert_eq!(vector["dimensions"], 1536);
        assert_eq!(vector["vectorSearchProfile"], def["vectorSearch"]["profiles"][0]["name"]);
    }

    #[test]
    fn upload_body_serializes_metadata_as_string() {
        let chunks = vec![TextChunk {
            content: "name: Rioja".to_string(),
            metadata: json!({ "source": "wine-ratings.csv", "row": 3 }),
        }];

        let body = upload_body(&chunks, vec![vec![0.5, 0.25]], &["id-1".to_string()]);
        let doc = &body["value"][0];

        assert_eq!(doc["@search.action"], "upload");
        assert_eq!(doc["id"], "id-1");
        assert_eq!(doc["content_vector"], json!([0.5, 0.25]));
        let metadata: Value = serde_json::from_str(doc["metadata"].as_str().unwrap()).unwrap();
        assert_eq!(metadata["row"], 3);
    }

    #[test]
    fn search_body_requests_k_neighbors() {
        let body = search_body(vec![1.0], 5);
        assert_eq!(body["top"], 5);
        assert_eq!(body["vectorQueries"][0]["k"], 5);
        assert_eq!(body["vectorQueries"][0]["fields"], "content_vector");
    }

    #[test]
    fn partial_indexing_failure_is_classified() {
        let response: IndexingResponse = serde_json::from_value(json!({
            "value": [
                { "key": "a", "status": true, "statusCode": 201 },
                { "key": "b", "status": false, "statusCode": 503, "errorMessage": "Service busy" }
            ]
        }))
        .unwrap();

        let err = check_indexing(response).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transient);
        assert!(err.message.contains("document b"));
    }

    #[test]
    fn search_hits_are_ranked_and_metadata_parsed() {
        let response: SearchResponse = serde_json::from_value(json!({
            "value": [
                { "@search.score": 0.61, "id": "1", "content": "second", "metadata": "{\"row\":1}" },
                { "@search.score": 0.83, "id": "2", "content": "first", "metadata": "not json" }
            ]
        }))
        .unwrap();

        let results = into_scored(response);

        assert_eq!(results[0].content, "first");
        assert_eq!(results[0].metadata, Value::Null);
        assert_eq!(results[1].metadata["row"], 1);
    }
}
