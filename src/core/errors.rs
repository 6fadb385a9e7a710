use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// How a failed call to a remote service should be treated by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The provider rejected the call because of its request-rate ceiling.
    RateLimited,
    /// Network trouble or a 5xx; the same call may succeed later.
    Transient,
    /// The request itself is wrong (bad key, missing deployment, bad payload).
    Fatal,
}

/// Error returned by the embedding, search and chat clients.
///
/// The `kind` is decided here, at the service boundary, from the HTTP status
/// and the provider's error body. Callers branch on it instead of inspecting
/// the message.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ServiceError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transient, message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Fatal, message)
    }

    /// Builds an error from a non-success HTTP response.
    pub fn from_status(service: &str, status: reqwest::StatusCode, body: &str) -> Self {
        Self::new(
            classify_status(status.as_u16(), body),
            format!("{} returned {}: {}", service, status, body.trim()),
        )
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind == ErrorKind::RateLimited
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if let Some(status) = err.status() {
            classify_status(status.as_u16(), "")
        } else if err.is_decode() || err.is_builder() {
            ErrorKind::Fatal
        } else {
            ErrorKind::Transient
        };
        Self::new(kind, err.to_string())
    }
}

/// Azure reports throttling as 429, but some gateways wrap it in other
/// statuses with a "rate limit" message in the body.
pub fn classify_status(status: u16, body: &str) -> ErrorKind {
    if status == 429 || mentions_rate_limit(body) {
        ErrorKind::RateLimited
    } else if status == 408 || status >= 500 {
        ErrorKind::Transient
    } else {
        ErrorKind::Fatal
    }
}

fn mentions_rate_limit(text: &str) -> bool {
    text.to_lowercase().contains("rate limit")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Invalid config at '{path}': {reason}")]
    Invalid { path: String, reason: String },
    #[error("Missing required setting {0}")]
    Missing(&'static str),
    #[error("Failed to decode settings: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn invalid(path: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by HTTP handlers.
///
/// The query API reports failures in-band: the status stays 200 and the body
/// carries `{error, type}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "InvalidRequest",
            ApiError::Internal(_) => "InternalError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let message = match &self {
            ApiError::InvalidRequest(msg) | ApiError::Internal(msg) => msg.clone(),
        };

        let body = Json(json!({ "error": message, "type": self.type_name() }));
        (StatusCode::OK, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_status_detects_rate_limits() {
        assert_eq!(classify_status(429, ""), ErrorKind::RateLimited);
        assert_eq!(
            classify_status(403, "Requests have exceeded the Rate Limit of your tier"),
            ErrorKind::RateLimited
        );
    }

    #[test]
    fn classify_status_splits_transient_and_fatal() {
        assert_eq!(classify_status(503, "busy"), ErrorKind::Transient);
        assert_eq!(classify_status(408, ""), ErrorKind::Transient);
        assert_eq!(classify_status(401, "bad key"), ErrorKind::Fatal);
        assert_eq!(classify_status(404, "DeploymentNotFound"), ErrorKind::Fatal);
    }

    #[test]
    fn from_status_keeps_body_in_message() {
        let err = ServiceError::from_status(
            "Azure OpenAI",
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            "{\"error\":\"slow down\"}\n",
        );
        assert!(err.is_rate_limited());
        assert!(err.message.contains("429"));
        assert!(err.message.ends_with("slow down\"}"));
    }

    #[test]
    fn api_error_type_names() {
        assert_eq!(ApiError::InvalidRequest("x".into()).type_name(), "InvalidRequest");
        assert_eq!(ApiError::internal("boom").type_name(), "InternalError");
    }
}
