use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::report::{IngestReport, Verification};
use crate::core::config::IngestSettings;
use crate::core::errors::ServiceError;
use crate::core::text::preview;
use crate::rag::{SourceRecord, TextChunk, VectorStore};

const ERROR_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub max_documents: usize,
    pub request_delay: Duration,
    pub rate_limit_cooldown: Duration,
    pub error_cooldown: Duration,
    pub verification_query: String,
}

impl From<&IngestSettings> for IngestOptions {
    fn from(settings: &IngestSettings) -> Self {
        Self {
            max_documents: settings.max_documents,
            request_delay: settings.request_delay(),
            rate_limit_cooldown: settings.rate_limit_cooldown(),
            error_cooldown: settings.error_cooldown(),
            verification_query: settings.verification_query.clone(),
        }
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self::from(&IngestSettings::default())
    }
}

/// Keeps the first `max_documents` records.
pub fn select_documents(mut records: Vec<SourceRecord>, max_documents: usize) -> Vec<SourceRecord> {
    records.truncate(max_documents);
    records
}

/// Uploads chunks one at a time with fixed pauses between requests.
///
/// A failed chunk is counted and skipped; the run never aborts on it.
pub struct IngestionJob {
    store: Arc<dyn VectorStore>,
    options: IngestOptions,
}

impl IngestionJob {
    pub fn new(store: Arc<dyn VectorStore>, options: IngestOptions) -> Self {
        Self { store, options }
    }

    /// Lower bound on the run time when every upload succeeds.
    pub fn estimated_duration(&self, chunk_count: usize) -> Duration {
        self.options.request_delay * chunk_count as u32
    }

    pub async fn run(&self, chunks: &[TextChunk], cancel: &CancellationToken) -> IngestReport {
        let total = chunks.len();
        let mut report = IngestReport::new(total);

        for (i, chunk) in chunks.iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let chunk_num = i + 1;
            tracing::info!(chunk = chunk_num, total, "Uploading chunk");

            let pause = match self.store.add_documents(std::slice::from_ref(chunk)).await {
                Ok(_) => {
                    report.successful += 1;
                    tracing::info!(chunk = chunk_num, total, "Chunk uploaded");
                    (chunk_num < total).then_some(self.options.request_delay)
                }
                Err(err) => {
                    report.failed += 1;
                    let message = err.to_string();
                    tracing::warn!(
                        chunk = chunk_num,
                        total,
                        kind = ?err.kind,
                        "Chunk failed: {}...",
                        preview(&message, ERROR_PREVIEW_CHARS)
                    );
                    Some(self.cooldown_for(&err))
                }
            };

            if let Some(duration) = pause {
                if !self.pause(duration, cancel, &mut report).await {
                    report.cancelled = true;
                    break;
                }
            }
        }
        // An interrupt during the final upload leaves nothing to skip but
        // still counts as a cancelled run.
        report.cancelled |= cancel.is_cancelled();

        if report.cancelled {
            tracing::warn!(
                successful = report.successful,
                failed = report.failed,
                "Ingestion cancelled"
            );
        }

        report.verification = self.verify(report.successful).await;
        report
    }

    fn cooldown_for(&self, err: &ServiceError) -> Duration {
        if err.is_rate_limited() {
            tracing::warn!(
                "Rate limit hit; waiting {:?} before the next chunk",
                self.options.rate_limit_cooldown
            );
            return self.options.rate_limit_cooldown;
        }
        self.options.error_cooldown
    }

    /// Sleeps unless cancelled first. Returns `false` on cancellation.
    async fn pause(
        &self,
        duration: Duration,
        cancel: &CancellationToken,
        report: &mut IngestReport,
    ) -> bool {
        tracing::debug!("Waiting {:?}", duration);
        let started = Instant::now();
        let completed = tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        };
        report.slept += started.elapsed();
        completed
    }

    async fn verify(&self, successful: usize) -> Verification {
        if successful == 0 {
            return Verification::Skipped;
        }

        let query = &self.options.verification_query;
        match self.store.similarity_search(query, 1).await {
            Ok(results) => match results.into_iter().next() {
                Some(top) => {
                    let preview = preview(&top.content, ERROR_PREVIEW_CHARS).to_string();
                    tracing::info!(relevance = top.score, "Verification hit: {}...", preview);
                    Verification::Found {
                        preview,
                        score: top.score,
                    }
                }
                None => {
                    tracing::warn!(query = %query, "Verification search returned no results");
                    Verification::Empty
                }
            },
            Err(err) => {
                tracing::warn!("Verification search failed: {}", err);
                Verification::Failed(err.to_string())
            }
        }
    }
}
