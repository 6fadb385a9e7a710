use thiserror::Error;

use crate::core::errors::{ConfigError, ServiceError};
use crate::rag::LoaderError;
use crate::state::error::InitializationError;

/// Failures that stop the ingestion job before any upload.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Initialization(#[from] InitializationError),

    #[error("Failed to prepare search index: {0}")]
    Index(#[source] ServiceError),

    #[error("CSV {0} produced no chunks")]
    NoChunks(String),
}
