use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
