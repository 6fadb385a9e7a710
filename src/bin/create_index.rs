//! Loads the wine ratings CSV and uploads it to the search index one chunk at
//! a time. Ctrl-C stops after the current request and still prints a report.

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use wine_rag::core::config::{AppPaths, ConfigService};
use wine_rag::core::logging;
use wine_rag::ingest::{prepare_chunks, IngestError, IngestOptions, IngestionJob, Verification};
use wine_rag::state::Clients;

const QUOTA_INCREASE_URL: &str = "https://aka.ms/oai/quotaincrease";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, "create-index.log");

    let config = ConfigService::new(paths.clone());
    let settings = config
        .load_settings()
        .map_err(IngestError::from)
        .context("Failed to load configuration")?;

    tracing::info!(
        index = %settings.search.index_name,
        service = %settings.search.endpoint(),
        "Starting ingestion"
    );

    let batch = prepare_chunks(&paths, &settings.ingest)?;

    let options = IngestOptions::from(&settings.ingest);
    let clients = Clients::build(&settings).map_err(IngestError::from)?;
    let job = IngestionJob::new(clients.search.clone(), options);

    let estimate = job.estimated_duration(batch.chunks.len());
    tracing::info!(
        "Estimated time: {:.1} minutes for {} chunks",
        estimate.as_secs_f64() / 60.0,
        batch.chunks.len()
    );

    let created = clients
        .search
        .ensure_index()
        .await
        .map_err(IngestError::Index)?;
    if created {
        tracing::info!(index = %clients.search.index_name(), "Created search index");
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; stopping after the current request");
            ctrl_c.cancel();
        }
    });

    let report = job.run(&batch.chunks, &cancel).await;
    report.log_summary();

    tracing::info!(
        target_documents = batch.documents,
        indexed_chunks = report.successful,
        index = %settings.search.index_name,
        service = %settings.search.endpoint(),
        "Index summary"
    );

    match &report.verification {
        Verification::Found { .. } => tracing::info!("Index verified with a test search"),
        Verification::Empty => tracing::warn!("Test search returned no results"),
        Verification::Failed(msg) => tracing::warn!("Test search failed: {}", msg),
        Verification::Skipped => {
            tracing::error!("No documents were indexed. Things to check:");
            tracing::error!("  1. OPENAI_API_KEY and SEARCH_API_KEY are valid");
            tracing::error!(
                "  2. The embedding deployment '{}' exists",
                settings.openai.embedding_deployment
            );
            tracing::error!(
                "  3. Quota for the embedding deployment; request more at {}",
                QUOTA_INCREASE_URL
            );
        }
    }

    if report.is_complete_success() {
        tracing::info!("All chunks indexed; the query service can be started");
    } else if report.cancelled {
        tracing::warn!(skipped = report.skipped(), "Ingestion was interrupted");
    } else if report.successful > 0 {
        tracing::warn!(failed = report.failed, "Index is usable but incomplete");
    }

    Ok(())
}
