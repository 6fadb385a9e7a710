//! RAG (Retrieval-Augmented Generation) module.
//!
//! This module provides:
//! - `loader` / `chunking`: CSV rows to bounded text chunks
//! - `VectorStore`: the index abstraction, backed by `AzureSearchStore`
//! - `RagPipeline`: search then generate, used by the query service

pub mod azure_search;
pub mod chunking;
pub mod loader;
pub mod pipeline;
pub mod store;

pub use azure_search::AzureSearchStore;
pub use chunking::CharacterSplitter;
pub use loader::{load_csv, locate_csv, LoaderError, SourceRecord};
pub use pipeline::{RagPipeline, NO_RESULTS_CONTEXT};
pub use store::{ScoredChunk, TextChunk, VectorStore};
