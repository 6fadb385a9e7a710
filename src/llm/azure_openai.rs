use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::provider::{ChatProvider, EmbeddingProvider};
use super::types::ChatRequest;
use crate::core::config::OpenAiSettings;
use crate::core::errors::ServiceError;

const SERVICE: &str = "Azure OpenAI";

/// Azure OpenAI client for one chat deployment and one embedding deployment.
#[derive(Clone)]
pub struct AzureOpenAiClient {
    base_url: String,
    api_key: String,
    api_version: String,
    chat_deployment: String,
    embedding_deployment: String,
    client: Client,
}

impl AzureOpenAiClient {
    pub fn new(settings: &OpenAiSettings, client: Client) -> Self {
        Self {
            base_url: settings.api_base.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            api_version: settings.api_version.clone(),
            chat_deployment: settings.chat_deployment.clone(),
            embedding_deployment: settings.embedding_deployment.clone(),
            client,
        }
    }

    fn deployment_url(&self, deployment: &str, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.base_url,
            urlencoding::encode(deployment),
            operation,
            urlencoding::encode(&self.api_version)
        )
    }

    async fn post(&self, url: &str, body: &Value) -> Result<reqwest::Response, ServiceError> {
        let res = self
            .client
            .post(url)
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

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

fn chat_body(request: &ChatRequest) -> Value {
    let mut body = json!({ "messages": request.messages });

    if let Some(obj) = body.as_object_mut() {
        if let Some(t) = request.temperature {
            obj.insert("temperature".to_string(), json!(t));
        }
        if let Some(t) = request.max_tokens {
            obj.insert("max_tokens".to_string(), json!(t));
        }
    }

    body
}

fn first_choice_content(payload: ChatCompletionResponse) -> Result<String, ServiceError> {
    payload
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| ServiceError::fatal("Chat completion returned no choices"))
}

fn ordered_embeddings(mut payload: EmbeddingResponse) -> Vec<Vec<f32>> {
    payload.data.sort_by_key(|item| item.index);
    payload.data.into_iter().map(|item| item.embedding).collect()
}

#[async_trait]
impl ChatProvider for AzureOpenAiClient {
    fn name(&self) -> &str {
        "azure-openai"
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ServiceError> {
        let url = self.deployment_url(&self.chat_deployment, "chat/completions");
        let res = self.post(&url, &chat_body(&request)).await?;
        let payload: ChatCompletionResponse = res.json().await?;
        first_choice_content(payload)
    }
}

#[async_trait]
impl EmbeddingProvider for AzureOpenAiClient {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        let url = self.deployment_url(&self.embedding_deployment, "embeddings");
        let res = self.post(&url, &json!({ "input": inputs })).await?;
        let payload: EmbeddingResponse = res.json().await?;

        let embeddings = ordered_embeddings(payload);
        if embeddings.len() != inputs.len() {
            return Err(ServiceError::fatal(format!(
                "Expected {} embeddings, got {}",
                inputs.len(),
                embeddings.len()
            )));
        }
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use reqwest::StatusCode;
    use tokio::net::TcpListener;

    use super::*;
    use crate::core::errors::ErrorKind;
    use crate::llm::types::ChatMessage;

    async fn serve_status(status: StatusCode, body: &'static str) -> String {
        let app = Router::new().fallback(move || async move { (status, body) });
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_at(api_base: &str) -> AzureOpenAiClient {
        let settings = OpenAiSettings {
            api_base: api_base.to_string(),
            api_key: "key".to_string(),
            ..Default::default()
        };
        AzureOpenAiClient::new(&settings, Client::new())
    }

    #[tokio::test]
    async fn throttled_embedding_is_rate_limited() {
        let base = serve_status(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"code":"429","message":"Requests to the Embeddings_Create Operation have exceeded call rate limit"}}"#,
        )
        .await;

        let err = client_at(&base)
            .embed(&["name: Malbec".to_string()])
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::RateLimited);
    }

    #[tokio::test]
    async fn chat_server_error_is_transient() {
        let base = serve_status(StatusCode::INTERNAL_SERVER_ERROR, "upstream failure").await;

        let err = client_at(&base)
            .chat(ChatRequest::new(vec![ChatMessage::user("a red for lamb")]))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Transient);
    }

    fn client() -> AzureOpenAiClient {
        let settings = OpenAiSettings {
            api_base: "https://wine.openai.azure.com/".to_string(),
            api_key: "key".to_string(),
            ..Default::default()
        };
        AzureOpenAiClient::new(&settings, Client::new())
    }

    #[test]
    fn deployment_url_targets_named_deployment() {
        let url = client().deployment_url("demo-alfredo", "chat/completions");
        assert_eq!(
            url,
            "https://wine.openai.azure.com/openai/deployments/demo-alfredo/chat/completions?api-version=2023-05-15"
        );
    }

    #[test]
    fn chat_body_carries_sampling_options() {
        let request = ChatRequest {
            messages: vec![ChatMessage::user("red or white?")],
            temperature: Some(0.7),
            max_tokens: Some(500),
        };

        let body = chat_body(&request);

        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "red or white?");
        assert_eq!(body["temperature"], 0.7);
        assert_eq!(body["max_tokens"], 500);
    }

    #[test]
    fn first_choice_content_requires_a_choice() {
        let payload: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [
                { "message": { "role": "assistant", "content": "Try a Rioja." } },
                { "message": { "role": "assistant", "content": "ignored" } }
            ]
        }))
        .unwrap();
        assert_eq!(first_choice_content(payload).unwrap(), "Try a Rioja.");

        let empty: ChatCompletionResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
        let err = first_choice_content(empty).unwrap_err();
        assert_eq!(err.kind, crate::core::errors::ErrorKind::Fatal);
    }

    #[test]
    fn embeddings_are_returned_in_input_order() {
        let payload: EmbeddingResponse = serde_json::from_value(json!({
            "data": [
                { "index": 1, "embedding": [0.0, 1.0] },
                { "index": 0, "embedding": [1.0, 0.0] }
            ]
        }))
        .unwrap();

        assert_eq!(ordered_embeddings(payload), vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }
}
