//! CSV loader: one [`SourceRecord`] per data row.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("No CSV file found; looked for: {0}")]
    NotFound(String),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub source: String,
    pub row: usize,
}

/// A CSV row rendered as `header: value` lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub page_content: String,
    pub metadata: RecordMetadata,
}

/// Returns the first candidate that exists, resolved against `root`.
pub fn locate_csv(root: &Path, candidates: &[String]) -> Result<PathBuf, LoaderError> {
    candidates
        .iter()
        .map(|candidate| {
            let path = Path::new(candidate);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                root.join(path)
            }
        })
        .find(|path| path.is_file())
        .ok_or_else(|| LoaderError::NotFound(candidates.join(", ")))
}

pub fn load_csv(path: &Path) -> Result<(Vec<SourceRecord>, TextEncoding), LoaderError> {
    let bytes = fs::read(path).map_err(|source| LoaderError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let (text, encoding) = decode(bytes);
    let records = parse_records(&text, &path.display().to_string())?;
    Ok((records, encoding))
}

/// UTF-8 when valid, otherwise Latin-1 (every byte maps to the code point of
/// the same value).
fn decode(bytes: Vec<u8>) -> (String, TextEncoding) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, TextEncoding::Utf8),
        Err(err) => {
            let text = err.into_bytes().into_iter().map(char::from).collect();
            (text, TextEncoding::Latin1)
        }
    }
}

fn parse_records(text: &str, source: &str) -> Result<Vec<SourceRecord>, LoaderError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let page_content = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                format!("{}: {}", header.trim(), record.get(idx).unwrap_or("").trim())
            })
            .collect::<Vec<_>>()
            .join("\n");

        records.push(SourceRecord {
            page_content,
            metadata: RecordMetadata {
                source: source.to_string(),
                row,
            },
        });
    }

    Ok(records)
}
