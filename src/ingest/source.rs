use std::path::PathBuf;

use super::error::IngestError;
use super::job::select_documents;
use crate::core::config::{AppPaths, IngestSettings};
use crate::rag::loader::TextEncoding;
use crate::rag::{load_csv, locate_csv, CharacterSplitter, TextChunk};

/// Chunks ready for upload, plus what produced them.
#[derive(Debug)]
pub struct PreparedBatch {
    pub csv_path: PathBuf,
    pub encoding: TextEncoding,
    pub total_records: usize,
    pub documents: usize,
    pub chunks: Vec<TextChunk>,
}

/// Finds the CSV, keeps the first `max_documents` rows and chunks them.
pub fn prepare_chunks(paths: &AppPaths, settings: &IngestSettings) -> Result<PreparedBatch, IngestError> {
    let csv_path = locate_csv(&paths.project_root, &settings.csv_candidates)?;
    tracing::info!(path = %csv_path.display(), "Found CSV");

    let (records, encoding) = load_csv(&csv_path)?;
    if encoding == TextEncoding::Latin1 {
        tracing::warn!(path = %csv_path.display(), "CSV is not valid UTF-8; decoded as Latin-1");
    }

    let total_records = records.len();
    let documents = select_documents(records, settings.max_documents);
    tracing::info!(
        total = total_records,
        selected = documents.len(),
        "Limited to first {} documents",
        settings.max_documents
    );

    let chunks = CharacterSplitter::new(settings.chunk_size).split_documents(&documents);
    if chunks.is_empty() {
        return Err(IngestError::NoChunks(csv_path.display().to_string()));
    }
    tracing::info!(chunks = chunks.len(), "Split documents into chunks");

    Ok(PreparedBatch {
        csv_path,
        encoding,
        total_records,
        documents: documents.len(),
        chunks,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn settings() -> IngestSettings {
        IngestSettings {
            csv_candidates: vec!["missing.csv".to_string(), "data/wine-ratings.csv".to_string()],
            ..IngestSettings::default()
        }
    }

    #[test]
    fn prepares_chunks_from_first_found_candidate() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        let mut csv = String::from("name,grape,region,variety,rating,notes\n");
        for i in 0..25 {
            csv.push_str(&format!("Wine {i},Merlot,Napa,Red Wine,9{},Plum and oak\n", i % 10));
        }
        fs::write(dir.path().join("data/wine-ratings.csv"), csv).unwrap();
        let paths = AppPaths::with_root(dir.path().to_path_buf());

        let batch = prepare_chunks(&paths, &settings()).unwrap();

        assert_eq!(batch.total_records, 25);
        assert_eq!(batch.documents, 10);
        assert_eq!(batch.chunks.len(), 10);
        assert_eq!(batch.encoding, TextEncoding::Utf8);
        assert!(batch.csv_path.ends_with("data/wine-ratings.csv"));
        assert!(batch.chunks.iter().all(|c| c.content.chars().count() <= 800));
    }

    #[test]
    fn missing_csv_is_a_setup_error() {
        let dir = tempdir().unwrap();
        let paths = AppPaths::with_root(dir.path().to_path_buf());

        let err = prepare_chunks(&paths, &settings()).unwrap_err();

        assert!(matches!(err, IngestError::Loader(_)));
        assert!(err.to_string().contains("data/wine-ratings.csv"));
    }
}
