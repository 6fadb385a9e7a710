//! Offline ingestion: CSV rows become chunks that are embedded and uploaded
//! to the search index one request at a time.

pub mod error;
pub mod job;
pub mod report;
pub mod source;

pub use error::IngestError;
pub use job::{select_documents, IngestOptions, IngestionJob};
pub use report::{IngestReport, Verification};
pub use source::{prepare_chunks, PreparedBatch};
